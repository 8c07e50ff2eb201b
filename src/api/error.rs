//! Error types for backend access.

use serde::Serialize;
use std::fmt;

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while talking to the backend or preparing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
  /// Network, timeout or HTTP status failure.
  ///
  /// Fetches swallow this into their state; mutations hand it to the caller.
  Transport {
    message: String,
    kind: TransportKind,
    code: String,
  },

  /// Local form validation failed. Never reaches the network.
  Validation(ValidationError),

  /// Successful response without the body a download needs.
  EmptyPayload(String),

  /// Response body did not match the expected shape.
  Decode(String),

  /// Saving a downloaded file failed.
  Io(String),

  /// The server answered 2xx but flagged the operation as failed.
  Rejected(String),
}

/// Classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransportKind {
  Network,
  Timeout,
  Status(u16),
}

impl Error {
  pub fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
    let code = match kind {
      TransportKind::Status(status) => status.to_string(),
      TransportKind::Timeout => "TIMEOUT".to_string(),
      TransportKind::Network => "NETWORK".to_string(),
    };
    Error::Transport {
      message: message.into(),
      kind,
      code,
    }
  }

  /// Short name of the failure class, surfaced as `ErrorInfo::kind`.
  pub fn kind_name(&self) -> &'static str {
    match self {
      Error::Transport {
        kind: TransportKind::Timeout,
        ..
      } => "TimeoutError",
      Error::Transport {
        kind: TransportKind::Status(_),
        ..
      } => "HttpError",
      Error::Transport { .. } => "NetworkError",
      Error::Validation(_) => "ValidationError",
      Error::EmptyPayload(_) => "EmptyPayloadError",
      Error::Decode(_) => "DecodeError",
      Error::Io(_) => "IoError",
      Error::Rejected(_) => "RejectedError",
    }
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::Transport { message, .. } => write!(f, "{}", message),
      Error::Validation(e) => write!(f, "{}", e),
      Error::EmptyPayload(what) => write!(f, "Le fichier reçu est vide ({})", what),
      Error::Decode(msg) => write!(f, "Réponse inattendue du serveur: {}", msg),
      Error::Io(msg) => write!(f, "{}", msg),
      Error::Rejected(msg) => write!(f, "{}", msg),
    }
  }
}

impl std::error::Error for Error {}

impl From<ValidationError> for Error {
  fn from(e: ValidationError) -> Self {
    Error::Validation(e)
  }
}

impl From<reqwest::Error> for Error {
  fn from(e: reqwest::Error) -> Self {
    if e.is_timeout() {
      return Error::transport(TransportKind::Timeout, format!("Délai dépassé: {}", e));
    }
    if let Some(status) = e.status() {
      return Error::transport(TransportKind::Status(status.as_u16()), e.to_string());
    }
    if e.is_decode() {
      return Error::Decode(e.to_string());
    }
    Error::transport(TransportKind::Network, e.to_string())
  }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self {
    Error::Decode(e.to_string())
  }
}

/// One or more form fields failed local checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
  pub fields: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
  pub field: &'static str,
  pub message: String,
}

impl ValidationError {
  pub fn new() -> Self {
    Self { fields: Vec::new() }
  }

  pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
    self.fields.push(FieldError {
      field,
      message: message.into(),
    });
  }

  /// `Ok(())` when nothing was recorded.
  pub fn into_result(self) -> std::result::Result<(), ValidationError> {
    if self.fields.is_empty() {
      Ok(())
    } else {
      Err(self)
    }
  }
}

impl Default for ValidationError {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parts: Vec<String> = self
      .fields
      .iter()
      .map(|e| format!("{}: {}", e.field, e.message))
      .collect();
    write!(f, "{}", parts.join(", "))
  }
}

impl std::error::Error for ValidationError {}

/// Plain error description handed to views.
///
/// Nothing past the fetch boundary sees a raw `Error`; this is what gets
/// stored in fetch state and shown in modals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
  pub message: String,
  pub kind: String,
  pub code: String,
}

impl From<&Error> for ErrorInfo {
  fn from(e: &Error) -> Self {
    let code = match e {
      Error::Transport { code, .. } => code.clone(),
      _ => "UNKNOWN".to_string(),
    };
    ErrorInfo {
      message: e.to_string(),
      kind: e.kind_name().to_string(),
      code,
    }
  }
}

impl From<Error> for ErrorInfo {
  fn from(e: Error) -> Self {
    ErrorInfo::from(&e)
  }
}

impl fmt::Display for ErrorInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} [{}]", self.message, self.code)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_error_info() {
    let err = Error::transport(TransportKind::Status(404), "Not Found");
    let info = ErrorInfo::from(&err);
    assert_eq!(info.code, "404");
    assert_eq!(info.kind, "HttpError");
    assert_eq!(info.message, "Not Found");
  }

  #[test]
  fn test_timeout_classification() {
    let err = Error::transport(TransportKind::Timeout, "too slow");
    assert_eq!(err.kind_name(), "TimeoutError");
    assert_eq!(ErrorInfo::from(err).code, "TIMEOUT");
  }

  #[test]
  fn test_non_transport_code_is_unknown() {
    let info = ErrorInfo::from(Error::Decode("bad json".to_string()));
    assert_eq!(info.code, "UNKNOWN");
    assert_eq!(info.kind, "DecodeError");
  }

  #[test]
  fn test_validation_error_collects_fields() {
    let mut v = ValidationError::new();
    assert!(v.clone().into_result().is_ok());

    v.push("titre", "obligatoire");
    v.push("classe_id", "obligatoire");
    let err = v.into_result().unwrap_err();
    assert_eq!(err.fields.len(), 2);
    assert_eq!(err.to_string(), "titre: obligatoire, classe_id: obligatoire");
  }
}
