pub const APP_NAME: &str = "feedstocks";
pub const CONFIG_FILENAME: &str = "feedstocks.yml";
pub const RECIPE_FILENAME: &str = "meta.yaml";

/// Directory inside a recipes directory that holds build output.
pub const BUILD_DIRNAME: &str = "build";

pub const DEFAULT_CHANNEL: &str = "conda-forge";
pub const DEFAULT_CHANNEL_URL: &str = "https://conda.anaconda.org/{channel}";
pub const DEFAULT_RECIPE_URL: &str =
  "https://raw.githubusercontent.com/conda-forge/{package}-feedstock/main/recipe/meta.yaml";
pub const DEFAULT_LISTING_URL: &str = "https://anaconda.org/{channel}/{package}/files";
pub const DEFAULT_SUBDIRS: &[&str] = &["noarch", "linux-64"];
pub const DEFAULT_RUNTIME: &str = "python";

pub const DEFAULT_UPSTREAM_OWNER: &str = "conda-forge";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_CLONE_URL: &str = "git@github.com:{user}/{repo}.git";
pub const DEFAULT_UPSTREAM_URL: &str = "https://github.com/{owner}/{repo}.git";
pub const DEFAULT_WORKDIR: &str = "data";
pub const DEFAULT_TIMEOUT: &str = "30s";
pub const DEFAULT_JOBS: usize = 8;

pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const STAGED_RECIPES_REPO: &str = "staged-recipes";
/// Under the workdir; holds direct clones of upstream feedstocks, apart from fork clones.
pub const UPSTREAM_CHECKOUTS_DIRNAME: &str = "upstream";

/// Branch names longer than this fall back to `add-<n>-packages`.
pub const MAX_BRANCH_NAME_LEN: usize = 30;
