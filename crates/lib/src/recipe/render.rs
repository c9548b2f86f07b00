//! Recipe template rendering.
//!
//! Recipes use conda-build's Jinja dialect. Rendering here only needs to be
//! good enough to read the `package` and `requirements` sections, so the
//! conda-build helper functions are replaced with stubs and unknown
//! variables render as empty strings.

use std::collections::BTreeMap;

use minijinja::value::{Rest, Value};
use minijinja::{Environment, UndefinedBehavior, context};

use super::RecipeError;

/// Render a recipe template to plain YAML text.
pub fn render(text: &str) -> Result<String, RecipeError> {
  let env = environment();
  Ok(env.render_str(text, context! {})?)
}

fn environment() -> Environment<'static> {
  let mut env = Environment::new();
  env.set_undefined_behavior(UndefinedBehavior::Chainable);
  env.set_keep_trailing_newline(true);

  // Same stub names conda-build uses when no variant config is loaded.
  env.add_function("compiler", |language: String| format!("{language}_compiler_stub"));
  env.add_function("stdlib", |language: String| format!("{language}_stdlib_stub"));
  env.add_function("cdt", |name: String| format!("{name}-cdt-stub"));
  env.add_function("pin_compatible", first_argument);
  env.add_function("pin_subpackage", first_argument);
  // Data loaders read files next to the recipe, which are never available here.
  for loader in ["load_setup_py_data", "load_file_data", "load_file_regex", "load_str_data"] {
    env.add_function(loader, empty_data);
  }
  env
}

/// Whether a requirement name was produced by one of the stubbed helpers.
pub fn is_helper_stub(name: &str) -> bool {
  STUB_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

const STUB_SUFFIXES: &[&str] = &["_compiler_stub", "_stdlib_stub", "-cdt-stub"];

fn empty_data(_args: Rest<Value>) -> Value {
  Value::from_serialize(BTreeMap::<String, String>::new())
}

fn first_argument(args: Rest<Value>) -> String {
  args.first().map(|value| value.to_string()).unwrap_or_default()
}
