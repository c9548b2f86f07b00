//! Web listing of a package's published files.
//!
//! The listing updates sooner than the binary index, but it is scraped HTML:
//! finding the version-qualified identifier is evidence of publication, not
//! finding it proves nothing.

use reqwest::blocking::Client;

use super::http::{expand, get_optional, text};
use super::{ListingSource, SourceError};

#[derive(Debug, Clone)]
pub struct HttpListingSource {
  client: Client,
  url_template: String,
  channel: String,
}

impl HttpListingSource {
  pub fn new(client: Client, url_template: impl Into<String>, channel: impl Into<String>) -> Self {
    Self {
      client,
      url_template: url_template.into(),
      channel: channel.into(),
    }
  }
}

impl ListingSource for HttpListingSource {
  fn fetch_listing(&self, package: &str) -> Result<String, SourceError> {
    let url = expand(&self.url_template, package, &self.channel);
    match get_optional(&self.client, &url)? {
      Some(response) => text(response, &url),
      None => Ok(String::new()),
    }
  }
}

/// Whether a listing page mentions an artifact of `package` at `version`.
///
/// Artifact filenames look like `{name}-{version}-{build}.conda`, so the
/// trailing dash keeps `1.0` from matching `1.0.1`.
pub fn is_listed(page: &str, package: &str, version: &str) -> bool {
  page.contains(&format!("{package}-{version}-"))
}
