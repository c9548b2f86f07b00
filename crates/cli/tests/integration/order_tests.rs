use predicates::prelude::*;

use super::common::{TestEnv, recipe};

#[test]
fn order_follows_dependencies() {
  let env = TestEnv::new(&[]);
  env.write_recipe("app", &recipe("app", "1.0", &["lib >=1.0"]));
  env.write_recipe("lib", &recipe("lib", "1.0", &["core"]));
  env.write_recipe("core", &recipe("core", "1.0", &["numpy"]));

  env
    .feedstocks_cmd()
    .arg("order")
    .arg(env.recipes_dir())
    .assert()
    .success()
    .stdout(predicate::str::contains("  1. core\n  2. lib\n  3. app\n"))
    .stdout(predicate::str::contains("Waves:"));
}

#[test]
fn order_json_output_is_valid() {
  let env = TestEnv::new(&[]);
  env.write_recipe("a", &recipe("a", "1.0", &[]));
  env.write_recipe("b", &recipe("b", "1.0", &[]));

  let output = env
    .feedstocks_cmd()
    .args(["order", "--format", "json"])
    .arg(env.recipes_dir())
    .output()
    .unwrap();
  assert!(output.status.success());

  let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(plan["recipes"].as_array().unwrap().len(), 2);
  assert_eq!(plan["waves"], serde_json::json!([["a", "b"]]));
}

#[test]
fn order_reports_cycles() {
  let env = TestEnv::new(&[]);
  env.write_recipe("p", &recipe("p", "1.0", &["q"]));
  env.write_recipe("q", &recipe("q", "1.0", &["p"]));

  env
    .feedstocks_cmd()
    .arg("order")
    .arg(env.recipes_dir())
    .assert()
    .failure()
    .stderr(predicate::str::contains("dependency cycle"));
}

#[test]
fn build_dry_run_prints_the_plan() {
  let env = TestEnv::new(&[]);
  env.write_recipe("lib", &recipe("lib", "1.0", &[]));
  env.write_recipe("app", &recipe("app", "1.0", &["lib"]));

  env
    .feedstocks_cmd()
    .args(["build", "--dry-run"])
    .arg(env.recipes_dir())
    .assert()
    .success()
    .stdout(predicate::str::contains("Dry run"))
    .stdout(predicate::str::contains("  1. lib\n  2. app\n"));
}

#[cfg(unix)]
#[test]
fn generate_with_prefix() {
  use std::os::unix::fs::PermissionsExt;

  let mut env = TestEnv::new(&["alpha@1.0"]);
  env.recipe("alpha", None);
  let grayskull = env.path().join("grayskull.sh");
  std::fs::write(
    &grayskull,
    "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then echo 2.7.3; exit 0; fi\nmkdir -p \"$4/alpha\"\nprintf '{%% set version = \"1.0\" %%}\\npackage:\\n  name: alpha\\n' > \"$4/alpha/meta.yaml\"\n",
  )
  .unwrap();
  std::fs::set_permissions(&grayskull, std::fs::Permissions::from_mode(0o755)).unwrap();
  let mut config = std::fs::read_to_string(&env.config_path).unwrap();
  config.push_str(&format!("grayskull_bin: {}\n", grayskull.display()));
  std::fs::write(&env.config_path, config).unwrap();

  env
    .feedstocks_cmd()
    .args(["--prefix", "fx-", "generate"])
    .arg(env.recipes_dir())
    .assert()
    .success();

  let text = std::fs::read_to_string(env.recipes_dir().join("fx-alpha").join("meta.yaml")).unwrap();
  assert!(text.contains("  name: fx-alpha"));
}
