//! Write operations against the backend.
//!
//! Each function issues exactly one request and returns the server's answer
//! or the transport error. Nothing here retries, touches the cache or shows
//! anything to the user; the caller decides what a failure means.

use chrono::Utc;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;

use super::client::ApiClient;
use super::download::store_download;
use super::error::{Error, Result, ValidationError};
use super::urls::Endpoint;

/// Body returned by write endpoints.
///
/// The backend is inconsistent: some routes answer `{success, message, data}`,
/// some the saved object, some plain text. Anything that is not the envelope
/// lands in `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerResponse {
  #[serde(default = "default_success")]
  pub success: bool,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub data: Value,
}

fn default_success() -> bool {
  true
}

impl ServerResponse {
  pub fn from_value(value: Value) -> Self {
    let is_envelope = value
      .as_object()
      .map(|o| ["success", "message", "data"].iter().any(|k| o.contains_key(*k)))
      .unwrap_or(false);

    if is_envelope {
      if let Ok(resp) = serde_json::from_value::<ServerResponse>(value.clone()) {
        return resp;
      }
    }

    match value {
      Value::String(message) => ServerResponse {
        success: true,
        message: Some(message),
        data: Value::Null,
      },
      data => ServerResponse {
        success: true,
        message: None,
        data,
      },
    }
  }

  /// Server message, or `fallback` when it sent none.
  pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
    self
      .message
      .as_deref()
      .filter(|m| !m.trim().is_empty())
      .unwrap_or(fallback)
  }

  /// Message to show on success; `success: false` becomes [`Error::Rejected`].
  pub fn into_message(self, fallback: &str) -> Result<String> {
    if self.success {
      Ok(self.message_or(fallback).to_string())
    } else {
      Err(Error::Rejected(self.message_or("Opération refusée par le serveur").to_string()))
    }
  }
}

/// Outcome of a file-producing mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedFile {
  pub path: PathBuf,
  pub size: usize,
}

async fn send(
  client: &ApiClient,
  method: Method,
  endpoint: Endpoint,
  body: Option<Value>,
) -> Result<ServerResponse> {
  let value = client.send_json(method, &endpoint, body.as_ref()).await?;
  Ok(ServerResponse::from_value(value))
}

// ============================================================================
// Profiles
// ============================================================================

pub async fn deactivate_profile(client: &ApiClient, profile_id: i64) -> Result<ServerResponse> {
  info!(profile_id, "deactivating profile");
  send(
    client,
    Method::POST,
    Endpoint::DeactivateProfile { profile_id },
    None,
  )
  .await
}

// ============================================================================
// Enrollment surveys
// ============================================================================

/// Decision recorded on an enrollment survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurveyStatus {
  Validee,
  Refusee,
}

pub async fn set_survey_status(
  client: &ApiClient,
  inscription_id: i64,
  status: SurveyStatus,
) -> Result<ServerResponse> {
  info!(inscription_id, ?status, "updating survey status");
  send(
    client,
    Method::PUT,
    Endpoint::SurveyStatus { inscription_id },
    Some(json!({ "statut": status })),
  )
  .await
}

pub async fn validate_survey(client: &ApiClient, inscription_id: i64) -> Result<ServerResponse> {
  set_survey_status(client, inscription_id, SurveyStatus::Validee).await
}

pub async fn reject_survey(client: &ApiClient, inscription_id: i64) -> Result<ServerResponse> {
  set_survey_status(client, inscription_id, SurveyStatus::Refusee).await
}

/// Export the survey list; saved as `enquetes_<school>_<epochMillis>.<ext>`.
pub async fn export_surveys(
  client: &ApiClient,
  school_id: i64,
  year_id: i64,
  dir: &Path,
) -> Result<SavedFile> {
  let body = json!({ "ecoleId": school_id, "anneeId": year_id });
  let download = client.download(&Endpoint::SurveyExport, &body).await?;
  let stem = format!("enquetes_{}_{}", school_id, Utc::now().timestamp_millis());
  let size = download.bytes.len();
  let path = store_download(dir.to_path_buf(), stem, download).await?;
  info!(path = %path.display(), size, "survey export saved");
  Ok(SavedFile { path, size })
}

// ============================================================================
// Quizzes
// ============================================================================

/// Quiz form contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizDraft {
  #[serde(rename = "quizlibelle")]
  pub title: String,
  #[serde(rename = "matiereId")]
  pub subject_id: i64,
  #[serde(rename = "classeId")]
  pub class_id: i64,
  #[serde(rename = "ecoleId")]
  pub school_id: i64,
}

impl QuizDraft {
  pub fn validate(&self) -> std::result::Result<(), ValidationError> {
    let mut errors = ValidationError::new();
    if self.title.trim().is_empty() {
      errors.push("titre", "Le titre est obligatoire");
    }
    if self.subject_id <= 0 {
      errors.push("matiere", "Sélectionnez une matière");
    }
    if self.class_id <= 0 {
      errors.push("classe", "Sélectionnez une classe");
    }
    errors.into_result()
  }
}

pub async fn create_quiz(client: &ApiClient, draft: &QuizDraft) -> Result<ServerResponse> {
  draft.validate()?;
  info!(title = %draft.title, "creating quiz");
  send(
    client,
    Method::POST,
    Endpoint::Quizzes,
    Some(serde_json::to_value(draft)?),
  )
  .await
}

pub async fn update_quiz(
  client: &ApiClient,
  quiz_id: i64,
  draft: &QuizDraft,
) -> Result<ServerResponse> {
  draft.validate()?;
  info!(quiz_id, "updating quiz");
  send(
    client,
    Method::PUT,
    Endpoint::Quiz { quiz_id },
    Some(serde_json::to_value(draft)?),
  )
  .await
}

pub async fn delete_quiz(client: &ApiClient, quiz_id: i64) -> Result<ServerResponse> {
  info!(quiz_id, "deleting quiz");
  send(client, Method::DELETE, Endpoint::Quiz { quiz_id }, None).await
}

// ============================================================================
// Affectations
// ============================================================================

/// Class/teacher affectation form contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffectationDraft {
  #[serde(rename = "classeId")]
  pub class_id: i64,
  #[serde(rename = "personnelId")]
  pub teacher_id: i64,
  #[serde(rename = "matiereId")]
  pub subject_id: Option<i64>,
  #[serde(rename = "anneeId")]
  pub year_id: i64,
}

impl AffectationDraft {
  pub fn validate(&self) -> std::result::Result<(), ValidationError> {
    let mut errors = ValidationError::new();
    if self.class_id <= 0 {
      errors.push("classe", "Sélectionnez une classe");
    }
    if self.teacher_id <= 0 {
      errors.push("enseignant", "Sélectionnez un enseignant");
    }
    if self.year_id <= 0 {
      errors.push("annee", "Année scolaire manquante");
    }
    errors.into_result()
  }
}

pub async fn create_affectation(
  client: &ApiClient,
  draft: &AffectationDraft,
) -> Result<ServerResponse> {
  draft.validate()?;
  info!(class_id = draft.class_id, teacher_id = draft.teacher_id, "creating affectation");
  send(
    client,
    Method::POST,
    Endpoint::Affectations,
    Some(serde_json::to_value(draft)?),
  )
  .await
}

pub async fn update_affectation(
  client: &ApiClient,
  affectation_id: i64,
  draft: &AffectationDraft,
) -> Result<ServerResponse> {
  draft.validate()?;
  info!(affectation_id, "updating affectation");
  send(
    client,
    Method::PUT,
    Endpoint::Affectation { affectation_id },
    Some(serde_json::to_value(draft)?),
  )
  .await
}

pub async fn delete_affectation(client: &ApiClient, affectation_id: i64) -> Result<ServerResponse> {
  info!(affectation_id, "deleting affectation");
  send(
    client,
    Method::DELETE,
    Endpoint::Affectation { affectation_id },
    None,
  )
  .await
}

// ============================================================================
// Work certificates
// ============================================================================

/// Generate a work certificate; saved as `certificat-travail-<personnel>-<year>.<ext>`.
pub async fn generate_work_certificate(
  client: &ApiClient,
  personnel_id: i64,
  year_id: i64,
  dir: &Path,
) -> Result<SavedFile> {
  let endpoint = Endpoint::WorkCertificate {
    personnel_id,
    year_id,
  };
  let download = client
    .download(&endpoint, &json!({ "personnelId": personnel_id, "anneeId": year_id }))
    .await?;
  let stem = format!("certificat-travail-{}-{}", personnel_id, year_id);
  let size = download.bytes.len();
  let path = store_download(dir.to_path_buf(), stem, download).await?;
  info!(path = %path.display(), size, "work certificate saved");
  Ok(SavedFile { path, size })
}
