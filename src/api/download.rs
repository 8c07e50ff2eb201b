//! Binary downloads: extension inference and scoped file writing.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::error::{Error, Result};

/// Raw body of a file-producing response.
#[derive(Debug, Clone)]
pub struct Download {
  pub bytes: Vec<u8>,
  pub content_type: Option<String>,
}

impl Download {
  /// File extension inferred from the `Content-Type` header
  pub fn extension(&self) -> &'static str {
    extension_for(self.content_type.as_deref().unwrap_or(""))
  }

  /// Fail with `EmptyPayload` for a zero-byte body
  pub fn ensure_not_empty(&self, what: &str) -> Result<()> {
    if self.bytes.is_empty() {
      return Err(Error::EmptyPayload(what.to_string()));
    }
    Ok(())
  }
}

/// Map a content type to the extension the saved file gets.
pub fn extension_for(content_type: &str) -> &'static str {
  let ct = content_type.to_ascii_lowercase();
  if ct.contains("pdf") {
    "pdf"
  } else if ct.contains("spreadsheetml") {
    "xlsx"
  } else if ct.contains("ms-excel") {
    "xls"
  } else if ct.contains("excel") {
    "xlsx"
  } else if ct.contains("wordprocessingml") {
    "docx"
  } else if ct.contains("msword") {
    "doc"
  } else if ct.contains("word") {
    "docx"
  } else if ct.contains("csv") {
    "csv"
  } else {
    "bin"
  }
}

/// A download target that is only visible once committed.
///
/// Bytes are written to `<name>.part`; `commit` renames it to the final
/// name. If the guard is dropped first (any error path), the partial file is
/// removed.
#[derive(Debug)]
pub struct PendingFile {
  part_path: PathBuf,
  final_path: PathBuf,
  committed: bool,
}

impl PendingFile {
  pub fn create(dir: &Path, file_name: &str) -> Result<Self> {
    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
    let final_path = dir.join(file_name);
    let part_path = dir.join(format!("{}.part", file_name));
    fs::File::create(&part_path).map_err(|e| io_error(&part_path, e))?;
    debug!(path = %part_path.display(), "pending download created");
    Ok(Self {
      part_path,
      final_path,
      committed: false,
    })
  }

  pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
    let mut file = fs::OpenOptions::new()
      .append(true)
      .open(&self.part_path)
      .map_err(|e| io_error(&self.part_path, e))?;
    file
      .write_all(bytes)
      .and_then(|_| file.sync_all())
      .map_err(|e| io_error(&self.part_path, e))
  }

  pub fn commit(mut self) -> Result<PathBuf> {
    fs::rename(&self.part_path, &self.final_path).map_err(|e| io_error(&self.final_path, e))?;
    self.committed = true;
    Ok(self.final_path.clone())
  }
}

impl Drop for PendingFile {
  fn drop(&mut self) {
    if self.committed {
      return;
    }
    if let Err(e) = fs::remove_file(&self.part_path) {
      if e.kind() != std::io::ErrorKind::NotFound {
        warn!(path = %self.part_path.display(), error = %e, "failed to remove partial download");
      }
    }
  }
}

/// Write a download to `dir/<stem>.<ext>` through a [`PendingFile`].
pub fn save_download(dir: &Path, stem: &str, download: &Download) -> Result<PathBuf> {
  download.ensure_not_empty(stem)?;
  let file_name = format!("{}.{}", stem, download.extension());
  let mut pending = PendingFile::create(dir, &file_name)?;
  pending.write_all(&download.bytes)?;
  pending.commit()
}

/// [`save_download`] on the blocking pool, off the async workers.
pub async fn store_download(dir: PathBuf, stem: String, download: Download) -> Result<PathBuf> {
  tokio::task::spawn_blocking(move || save_download(&dir, &stem, &download))
    .await
    .map_err(|e| Error::Io(format!("Écriture interrompue: {}", e)))?
}

fn io_error(path: &Path, e: std::io::Error) -> Error {
  Error::Io(format!("Impossible d'écrire {}: {}", path.display(), e))
}
