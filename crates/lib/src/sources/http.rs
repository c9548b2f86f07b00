//! Shared HTTP plumbing for the adapters.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use tracing::debug;

use super::SourceError;

const USER_AGENT: &str = concat!("feedstocks/", env!("CARGO_PKG_VERSION"));

/// Build the blocking client shared by every adapter in a run.
pub fn build_client(timeout: Duration) -> Result<Client, SourceError> {
  Client::builder()
    .user_agent(USER_AGENT)
    .timeout(timeout)
    .build()
    .map_err(|e| SourceError::Client(e.to_string()))
}

/// Substitute `{package}` and `{channel}` placeholders in a URL template.
pub fn expand(template: &str, package: &str, channel: &str) -> String {
  template.replace("{package}", package).replace("{channel}", channel)
}

/// GET a URL. `Ok(None)` means the server answered 404.
pub fn get_optional(client: &Client, url: &str) -> Result<Option<Response>, SourceError> {
  debug!(url, "GET");
  let response = client.get(url).send().map_err(|e| SourceError::Transport {
    url: url.to_string(),
    message: e.to_string(),
  })?;

  match response.status() {
    StatusCode::NOT_FOUND => Ok(None),
    status if status.is_success() => Ok(Some(response)),
    status => Err(SourceError::Status {
      url: url.to_string(),
      status: status.as_u16(),
    }),
  }
}

/// Read a response body as text.
pub fn text(response: Response, url: &str) -> Result<String, SourceError> {
  response.text().map_err(|e| SourceError::Decode {
    url: url.to_string(),
    message: e.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn expand_replaces_all_placeholders() {
    assert_eq!(
      expand("https://host/{channel}/{package}/files?p={package}", "foo", "conda-forge"),
      "https://host/conda-forge/foo/files?p=foo"
    );
  }

  #[test]
  fn get_optional_maps_statuses() {
    let mut server = mockito::Server::new();
    let _ok = server.mock("GET", "/ok").with_status(200).with_body("yes").create();
    let _missing = server.mock("GET", "/missing").with_status(404).create();
    let _broken = server.mock("GET", "/broken").with_status(503).create();

    let client = build_client(Duration::from_secs(5)).unwrap();

    let url = format!("{}/ok", server.url());
    let response = get_optional(&client, &url).unwrap().unwrap();
    assert_eq!(text(response, &url).unwrap(), "yes");

    assert!(get_optional(&client, &format!("{}/missing", server.url())).unwrap().is_none());

    let broken = format!("{}/broken", server.url());
    assert_eq!(
      get_optional(&client, &broken).unwrap_err(),
      SourceError::Status {
        url: broken.clone(),
        status: 503
      }
    );
  }

  #[test]
  fn connection_failure_is_transport_error() {
    let client = build_client(Duration::from_secs(1)).unwrap();
    let result = get_optional(&client, "http://127.0.0.1:1/unreachable");
    assert!(matches!(result, Err(SourceError::Transport { .. })));
  }
}
