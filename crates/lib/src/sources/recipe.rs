//! Recipe source backed by the raw feedstock files on the code host.

use reqwest::blocking::Client;
use tracing::debug;

use super::http::{expand, get_optional, text};
use super::{RecipeSource, SourceError};

/// Fetches `meta.yaml` from a URL template containing `{package}`.
#[derive(Debug, Clone)]
pub struct HttpRecipeSource {
  client: Client,
  url_template: String,
}

impl HttpRecipeSource {
  pub fn new(client: Client, url_template: impl Into<String>) -> Self {
    Self {
      client,
      url_template: url_template.into(),
    }
  }

  pub fn url_for(&self, package: &str) -> String {
    expand(&self.url_template, package, "")
  }
}

impl RecipeSource for HttpRecipeSource {
  fn fetch_recipe(&self, package: &str) -> Result<Option<String>, SourceError> {
    let url = self.url_for(package);
    match get_optional(&self.client, &url)? {
      Some(response) => text(response, &url).map(Some),
      None => {
        debug!(package, url, "no recipe upstream");
        Ok(None)
      }
    }
  }
}
