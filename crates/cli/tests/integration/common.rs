//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use mockito::{Mock, Server, ServerGuard};
use tempfile::TempDir;

/// A recipe as grayskull writes it, with extra run requirements.
pub fn recipe(name: &str, version: &str, run: &[&str]) -> String {
  let mut text = format!(
    "{{% set name = \"{name}\" %}}\n{{% set version = \"{version}\" %}}\n\npackage:\n  name: {{{{ name }}}}\n  version: {{{{ version }}}}\n\nrequirements:\n  host:\n    - pip\n    - python\n  run:\n    - python\n"
  );
  for spec in run {
    text.push_str(&format!("    - {spec}\n"));
  }
  text
}

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding `feedstocks.yml` and a
/// mock server standing in for the recipe host, the package listing and the
/// channel index.
pub struct TestEnv {
  pub temp: TempDir,
  pub server: ServerGuard,
  pub config_path: PathBuf,
  mocks: Vec<Mock>,
}

impl TestEnv {
  /// Create an environment whose config desires `entries`.
  pub fn new(entries: &[&str]) -> Self {
    let temp = TempDir::new().unwrap();
    let server = Server::new();
    let config_path = temp.path().join("feedstocks.yml");

    let mut config = String::from("github_user: octocat\n");
    config.push_str(if entries.is_empty() { "feedstocks: []\n" } else { "feedstocks:\n" });
    for entry in entries {
      config.push_str(&format!("  - {entry}\n"));
    }
    config.push_str(&format!(
      "channel_url: {url}/channel\nsubdirs: [noarch]\nrecipe_url: {url}/recipes/{{package}}/meta.yaml\nlisting_url: {url}/listing/{{package}}\nworkdir: {workdir}\ntimeout: 5s\n",
      url = server.url(),
      workdir = temp.path().join("data").display(),
    ));
    std::fs::write(&config_path, config).unwrap();

    Self {
      temp,
      server,
      config_path,
      mocks: Vec::new(),
    }
  }

  /// Serve a recipe for `name`, or a 404 when `text` is `None`.
  pub fn recipe(&mut self, name: &str, text: Option<String>) {
    let path = format!("/recipes/{name}/meta.yaml");
    let mock = match text {
      Some(text) => self.server.mock("GET", path.as_str()).with_body(text).create(),
      None => self.server.mock("GET", path.as_str()).with_status(404).create(),
    };
    self.mocks.push(mock);
  }

  /// Serve a listing page for `name`, or a 404 when `files` is empty.
  pub fn listing(&mut self, name: &str, files: &[&str]) {
    let path = format!("/listing/{name}");
    let mock = if files.is_empty() {
      self.server.mock("GET", path.as_str()).with_status(404).create()
    } else {
      self.server.mock("GET", path.as_str()).with_body(files.join("\n")).create()
    };
    self.mocks.push(mock);
  }

  /// Serve a plain JSON index holding `(name, version)` artifacts.
  pub fn index(&mut self, artifacts: &[(&str, &str)]) {
    let packages: serde_json::Map<String, serde_json::Value> = artifacts
      .iter()
      .map(|(name, version)| {
        (
          format!("{name}-{version}-pyh_0.tar.bz2"),
          serde_json::json!({ "name": name, "version": version, "build": "pyh_0", "build_number": 0 }),
        )
      })
      .collect();
    let body = serde_json::json!({ "packages": packages }).to_string();
    let mock = self
      .server
      .mock("GET", "/channel/noarch/repodata.json.zst")
      .with_body(body)
      .create();
    self.mocks.push(mock);
  }

  /// Write `meta.yaml` under `recipes/<folder>`.
  pub fn write_recipe(&self, folder: &str, text: &str) {
    let dir = self.recipes_dir().join(folder);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("meta.yaml"), text).unwrap();
  }

  pub fn recipes_dir(&self) -> PathBuf {
    self.temp.path().join("recipes")
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  /// Get a pre-configured Command for the feedstocks binary.
  ///
  /// Points `--config` at the environment's file and isolates the user
  /// config dir and credentials.
  pub fn feedstocks_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("feedstocks");
    cmd.current_dir(self.path());
    cmd.arg("--config").arg(&self.config_path);
    cmd.env("XDG_CONFIG_HOME", self.path());
    cmd.env("APPDATA", self.path());
    cmd.env_remove("GITHUB_TOKEN");
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
