//! Fork management over the GitHub REST API.

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::info;

use super::ServiceError;

pub trait ForkService: Send + Sync {
  /// Make sure `user` has a fork of `owner/repo`, creating it if needed.
  fn ensure_fork(&self, user: &str, owner: &str, repo: &str) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone)]
pub struct GitHub {
  client: Client,
  api: String,
  token: String,
}

#[derive(Debug, Deserialize)]
struct User {
  login: String,
}

impl GitHub {
  pub fn new(client: Client, api: impl Into<String>, token: impl Into<String>) -> Self {
    Self {
      client,
      api: api.into().trim_end_matches('/').to_string(),
      token: token.into(),
    }
  }

  fn authed(&self, request: RequestBuilder) -> RequestBuilder {
    request
      .bearer_auth(&self.token)
      .header("Accept", "application/vnd.github+json")
  }

  fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, ServiceError> {
    self.authed(request).send().map_err(|e| ServiceError::Http {
      url: url.to_string(),
      message: e.to_string(),
    })
  }

  /// Login of the token's owner.
  pub fn login(&self) -> Result<String, ServiceError> {
    let url = format!("{}/user", self.api);
    let response = self.send(self.client.get(&url), &url)?;
    let response = check(response, &url)?;
    let user: User = response.json().map_err(|e| ServiceError::Http {
      url,
      message: e.to_string(),
    })?;
    Ok(user.login)
  }

  fn repo_exists(&self, full_name: &str) -> Result<bool, ServiceError> {
    let url = format!("{}/repos/{full_name}", self.api);
    let response = self.send(self.client.get(&url), &url)?;
    if response.status() == StatusCode::NOT_FOUND {
      return Ok(false);
    }
    check(response, &url).map(|_| true)
  }
}

fn check(response: Response, url: &str) -> Result<Response, ServiceError> {
  if response.status().is_success() {
    Ok(response)
  } else {
    Err(ServiceError::Status {
      url: url.to_string(),
      status: response.status().as_u16(),
    })
  }
}

impl ForkService for GitHub {
  fn ensure_fork(&self, user: &str, owner: &str, repo: &str) -> Result<(), ServiceError> {
    let login = self.login()?;
    if login != user {
      return Err(ServiceError::UserMismatch {
        expected: user.to_string(),
        actual: login,
      });
    }

    if self.repo_exists(&format!("{user}/{repo}"))? {
      return Ok(());
    }

    info!(owner, repo, user, "creating fork");
    let url = format!("{}/repos/{owner}/{repo}/forks", self.api);
    let response = self.send(self.client.post(&url), &url)?;
    // Forking is asynchronous on GitHub's side; 202 means it was accepted.
    check(response, &url).map(drop)
  }
}
