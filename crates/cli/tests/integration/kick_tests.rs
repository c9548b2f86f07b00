use predicates::prelude::*;

use super::common::{TestEnv, recipe};

#[test]
fn dry_run_lists_pending_packages() {
  let mut env = TestEnv::new(&["alpha@1.0", "beta@1.0"]);
  env.index(&[("pip", "24.0"), ("beta", "1.0")]);
  env.recipe("alpha", Some(recipe("alpha", "1.0", &[])));
  env.listing("alpha", &[]);
  env.recipe("beta", Some(recipe("beta", "1.0", &[])));
  env.listing("beta", &["noarch/beta-1.0-pyh_0.tar.bz2"]);

  env
    .feedstocks_cmd()
    .args(["kick", "--dry-run"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Dry run"))
    .stdout(predicate::str::contains("Would kick alpha"))
    .stdout(predicate::str::contains("beta").not());
}

#[test]
fn named_package_that_is_not_kickable_is_reported() {
  let mut env = TestEnv::new(&["alpha@1.0"]);
  env.index(&[("pip", "24.0")]);
  env.recipe("alpha", None);

  env
    .feedstocks_cmd()
    .args(["kick", "--dry-run", "alpha"])
    .assert()
    .success()
    .stderr(predicate::str::contains("alpha is not kickable: missing recipe"));
}

#[test]
fn unknown_package_fails() {
  let env = TestEnv::new(&["alpha@1.0"]);

  env
    .feedstocks_cmd()
    .args(["kick", "--dry-run", "omega"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("omega"));
}
