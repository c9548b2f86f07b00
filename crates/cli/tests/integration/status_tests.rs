use predicates::prelude::*;

use super::common::{TestEnv, recipe};

fn fleet() -> TestEnv {
  let mut env = TestEnv::new(&["alpha@1.0", "beta@2.0", "gamma@1.0"]);
  env.index(&[("pip", "24.0"), ("alpha", "1.0")]);

  env.recipe("alpha", Some(recipe("alpha", "1.0", &[])));
  env.listing("alpha", &["noarch/alpha-1.0-pyh_0.tar.bz2"]);

  env.recipe("beta", Some(recipe("beta", "1.0", &[])));

  env.recipe("gamma", None);
  env
}

#[test]
fn status_classifies_each_package() {
  let env = fleet();

  env
    .feedstocks_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("alpha"))
    .stdout(predicate::str::contains("up to date"))
    .stdout(predicate::str::contains("stale recipe (declares 1.0)"))
    .stdout(predicate::str::contains("missing recipe"));
}

#[test]
fn status_json_output_is_valid() {
  let env = fleet();

  let output = env
    .feedstocks_cmd()
    .args(["status", "--format", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let reports = reports.as_array().unwrap();
  assert_eq!(reports.len(), 3);
  assert_eq!(reports[0]["package"], "alpha");
  assert_eq!(reports[0]["state"], "up_to_date");
  assert_eq!(reports[1]["state"], "stale_recipe");
  assert_eq!(reports[1]["declared"], "1.0");
  assert_eq!(reports[2]["state"], "missing_recipe");
}

#[test]
fn status_fails_without_index() {
  let mut env = TestEnv::new(&["alpha@1.0"]);
  env.recipe("alpha", Some(recipe("alpha", "1.0", &[])));

  env
    .feedstocks_cmd()
    .arg("status")
    .assert()
    .failure()
    .stderr(predicate::str::contains("channel index"));
}
