//! Implementation of the `feedstocks publish` command.

use std::path::Path;

use anyhow::{Context, Result, bail};

use feedstocks_lib::services::HttpUploader;
use feedstocks_lib::sources::http::build_client;

use super::Global;
use crate::output::{print_error, print_info, print_json, print_success};

pub fn cmd_publish(global: &Global, dir: &Path, to: &str, upload_token: Option<String>) -> Result<()> {
  let orchestrator = global.orchestrator()?;
  let client = build_client(orchestrator.config().timeout()?)?;
  let uploader = HttpUploader::new(client, to, upload_token);

  let report = orchestrator
    .publish(dir, &uploader)
    .with_context(|| format!("Failed to publish the artifacts in {}", dir.display()))?;

  if global.format.is_json() {
    print_json(&report)?;
  } else {
    if report.uploaded.is_empty() && report.failed.is_empty() {
      print_info("No artifacts to upload");
    }
    for url in &report.uploaded {
      print_success(url);
    }
    for (file, error) in &report.failed {
      print_error(&format!("{file}: {error}"));
    }
  }

  if !report.failed.is_empty() {
    bail!("{} artifact(s) failed to upload", report.failed.len());
  }
  Ok(())
}
