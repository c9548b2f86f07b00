//! Binary package index (`repodata.json`).
//!
//! The index is the channel's authoritative list of artifacts, but it can lag
//! publication by minutes to hours. It is fetched once per channel per run.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufReader, Read};

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::{expand, get_optional};
use super::{IndexSource, SourceError};

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// One artifact entry of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
  pub name: String,
  pub version: String,
  #[serde(default)]
  pub build: String,
  #[serde(default)]
  pub build_number: u64,
  #[serde(default)]
  pub depends: Vec<String>,
  #[serde(default)]
  pub subdir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RepoData {
  #[serde(default)]
  packages: BTreeMap<String, IndexRecord>,
  #[serde(default, rename = "packages.conda")]
  packages_conda: BTreeMap<String, IndexRecord>,
}

/// Artifacts of a channel keyed by filename, with a name lookup.
#[derive(Debug, Clone, Default)]
pub struct ChannelIndex {
  artifacts: BTreeMap<String, IndexRecord>,
  by_name: BTreeMap<String, BTreeSet<String>>,
}

impl ChannelIndex {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, filename: impl Into<String>, record: IndexRecord) {
    let filename = filename.into();
    self
      .by_name
      .entry(record.name.clone())
      .or_default()
      .insert(filename.clone());
    self.artifacts.insert(filename, record);
  }

  pub fn len(&self) -> usize {
    self.artifacts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.artifacts.is_empty()
  }

  pub fn get(&self, filename: &str) -> Option<&IndexRecord> {
    self.artifacts.get(filename)
  }

  /// Whether any artifact of the package exists, at any version.
  pub fn contains_name(&self, name: &str) -> bool {
    self.by_name.contains_key(name)
  }

  /// Whether an artifact for exactly `(name, version)` exists.
  pub fn has_version(&self, name: &str, version: &str) -> bool {
    self.artifacts_for(name).any(|(_, record)| record.version == version)
  }

  /// Every artifact of a package as `(filename, record)`.
  pub fn artifacts_for<'a>(&'a self, name: &str) -> impl Iterator<Item = (&'a str, &'a IndexRecord)> + 'a {
    self
      .by_name
      .get(name)
      .into_iter()
      .flatten()
      .filter_map(|filename| self.artifacts.get_key_value(filename))
      .map(|(filename, record)| (filename.as_str(), record))
  }

  fn merge(&mut self, repodata: RepoData) {
    for (filename, record) in repodata.packages.into_iter().chain(repodata.packages_conda) {
      self.insert(filename, record);
    }
  }
}

impl FromIterator<(String, IndexRecord)> for ChannelIndex {
  fn from_iter<T: IntoIterator<Item = (String, IndexRecord)>>(iter: T) -> Self {
    let mut index = Self::new();
    for (filename, record) in iter {
      index.insert(filename, record);
    }
    index
  }
}

/// Parse a `repodata.json` body, zstd-compressed or not.
pub fn decode_repodata(bytes: &[u8]) -> Result<ChannelIndex, String> {
  let mut index = ChannelIndex::new();
  index.merge(read_repodata(bytes)?);
  Ok(index)
}

fn read_repodata(bytes: &[u8]) -> Result<RepoData, String> {
  let reader: Box<dyn Read + '_> = if bytes.starts_with(&ZSTD_MAGIC) {
    Box::new(zstd::Decoder::new(bytes).map_err(|e| e.to_string())?)
  } else {
    Box::new(bytes)
  };
  serde_json::from_reader(BufReader::new(reader)).map_err(|e| e.to_string())
}

/// Fetches `{channel_url}/{subdir}/repodata.json.zst` for each subdir.
#[derive(Debug, Clone)]
pub struct HttpIndexSource {
  client: Client,
  channel_url: String,
  subdirs: Vec<String>,
}

impl HttpIndexSource {
  /// `channel_url` may contain a `{channel}` placeholder.
  pub fn new(client: Client, channel_url: impl Into<String>, subdirs: Vec<String>) -> Self {
    Self {
      client,
      channel_url: channel_url.into(),
      subdirs,
    }
  }

  fn fetch_subdir(&self, base: &str, subdir: &str) -> Result<RepoData, SourceError> {
    let url = format!("{}/{subdir}/repodata.json.zst", base.trim_end_matches('/'));
    let response = get_optional(&self.client, &url)?.ok_or_else(|| SourceError::Status {
      url: url.clone(),
      status: 404,
    })?;

    let bytes = response.bytes().map_err(|e| SourceError::Transport {
      url: url.clone(),
      message: e.to_string(),
    })?;
    debug!(url, bytes = bytes.len(), "downloaded repodata");

    read_repodata(&bytes).map_err(|message| SourceError::Decode { url, message })
  }
}

impl IndexSource for HttpIndexSource {
  fn fetch_index(&self, channel: &str) -> Result<ChannelIndex, SourceError> {
    let base = expand(&self.channel_url, "", channel);
    let mut index = ChannelIndex::new();
    for subdir in &self.subdirs {
      index.merge(self.fetch_subdir(&base, subdir)?);
    }
    info!(channel, artifacts = index.len(), "loaded channel index");
    Ok(index)
  }
}
