use predicates::prelude::*;

use super::common::{TestEnv, recipe};

#[test]
fn build_dry_run_accepts_channels() {
  let env = TestEnv::new(&[]);
  env.write_recipe("lib", &recipe("lib", "1.0", &[]));
  env.write_recipe("app", &recipe("app", "1.0", &["lib"]));

  env
    .feedstocks_cmd()
    .args(["build", "--dry-run", "--channel", "extra", "--channel", "other", "--no-test"])
    .arg(env.recipes_dir())
    .assert()
    .success()
    .stdout(predicate::str::contains("  1. lib\n  2. app\n"));
}

#[test]
fn build_dry_run_json() {
  let env = TestEnv::new(&[]);
  env.write_recipe("lib", &recipe("lib", "1.0", &[]));

  let output = env
    .feedstocks_cmd()
    .args(["--format", "json", "build", "--dry-run", "--channel", "extra"])
    .arg(env.recipes_dir())
    .output()
    .unwrap();
  assert!(output.status.success());

  let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(plan["waves"], serde_json::json!([["lib"]]));
}

#[test]
fn publish_uploads_artifacts() {
  let mut env = TestEnv::new(&[]);
  let noarch = env.recipes_dir().join("build").join("noarch");
  std::fs::create_dir_all(&noarch).unwrap();
  std::fs::write(noarch.join("lib-1.0-pyh_0.conda"), "artifact").unwrap();

  let upload = env
    .server
    .mock("PUT", "/upload/noarch/lib-1.0-pyh_0.conda")
    .match_header("authorization", "Bearer s3cret")
    .with_status(201)
    .create();
  let to = format!("{}/upload", env.server.url());

  env
    .feedstocks_cmd()
    .args(["publish", "--to", to.as_str(), "--upload-token", "s3cret"])
    .arg(env.recipes_dir())
    .env_remove("FEEDSTOCKS_UPLOAD_TOKEN")
    .assert()
    .success()
    .stdout(predicate::str::contains("lib-1.0-pyh_0.conda"));

  upload.assert();
}

#[test]
fn publish_reports_rejected_uploads() {
  let mut env = TestEnv::new(&[]);
  let noarch = env.recipes_dir().join("build").join("noarch");
  std::fs::create_dir_all(&noarch).unwrap();
  std::fs::write(noarch.join("lib-1.0-pyh_0.conda"), "artifact").unwrap();

  let _conflict = env
    .server
    .mock("PUT", "/upload/noarch/lib-1.0-pyh_0.conda")
    .with_status(409)
    .create();
  let to = format!("{}/upload", env.server.url());

  env
    .feedstocks_cmd()
    .args(["publish", "--to", to.as_str()])
    .arg(env.recipes_dir())
    .env_remove("FEEDSTOCKS_UPLOAD_TOKEN")
    .assert()
    .failure()
    .stderr(predicate::str::contains("409"));
}
