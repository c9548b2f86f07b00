//! Artifact discovery and upload.

use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use tracing::info;
use walkdir::WalkDir;

use super::ServiceError;

const ARTIFACT_SUFFIXES: &[&str] = &[".tar.bz2", ".conda"];

/// A built package file and the platform subdir it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
  pub subdir: String,
  pub path: PathBuf,
}

impl Artifact {
  pub fn file_name(&self) -> String {
    self
      .path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }
}

/// Every artifact directly under `<build_dir>/<subdir>/`, sorted.
pub fn collect_artifacts(build_dir: &Path) -> Result<Vec<Artifact>, ServiceError> {
  let mut artifacts = Vec::new();
  for entry in WalkDir::new(build_dir).min_depth(2).max_depth(2).sort_by_file_name() {
    let entry = entry.map_err(|e| ServiceError::Io {
      path: build_dir.to_path_buf(),
      source: e.into(),
    })?;
    let name = entry.file_name().to_string_lossy();
    if !entry.file_type().is_file() || !ARTIFACT_SUFFIXES.iter().any(|s| name.ends_with(s)) {
      continue;
    }
    let Some(subdir) = entry.path().parent().and_then(Path::file_name) else {
      continue;
    };
    artifacts.push(Artifact {
      subdir: subdir.to_string_lossy().into_owned(),
      path: entry.path().to_path_buf(),
    });
  }
  Ok(artifacts)
}

pub trait Uploader: Send + Sync {
  /// Upload one artifact and return where it went.
  fn upload(&self, artifact: &Artifact) -> Result<String, ServiceError>;
}

/// PUTs artifacts to `{base_url}/{subdir}/{file}`.
#[derive(Debug, Clone)]
pub struct HttpUploader {
  client: Client,
  base_url: String,
  token: Option<String>,
}

impl HttpUploader {
  pub fn new(client: Client, base_url: impl Into<String>, token: Option<String>) -> Self {
    Self {
      client,
      base_url: base_url.into().trim_end_matches('/').to_string(),
      token,
    }
  }
}

impl Uploader for HttpUploader {
  fn upload(&self, artifact: &Artifact) -> Result<String, ServiceError> {
    let url = format!("{}/{}/{}", self.base_url, artifact.subdir, artifact.file_name());
    let body = std::fs::read(&artifact.path).map_err(ServiceError::io(&artifact.path))?;
    info!(url, bytes = body.len(), "uploading");

    let mut request = self.client.put(&url).body(body);
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }
    let response = request.send().map_err(|e| ServiceError::Http {
      url: url.clone(),
      message: e.to_string(),
    })?;

    if !response.status().is_success() {
      return Err(ServiceError::Status {
        url,
        status: response.status().as_u16(),
      });
    }
    Ok(url)
  }
}
