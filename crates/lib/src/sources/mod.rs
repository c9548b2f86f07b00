//! Version source adapters.
//!
//! Three independent, partially stale views of the world:
//!
//! - [`recipe`] - the recipe hosted in each package's feedstock
//! - [`index`] - the channel's binary package index (may lag publication)
//! - [`listing`] - the web page listing a package's published files
//!
//! Adapters only fetch and parse. Deciding what the answers mean is the
//! reconciler's job.

pub mod http;
pub mod index;
pub mod listing;
pub mod recipe;

use thiserror::Error;

pub use index::{ChannelIndex, HttpIndexSource, IndexRecord};
pub use listing::{HttpListingSource, is_listed};
pub use recipe::HttpRecipeSource;

/// Errors that can occur while talking to a source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
  /// The request never produced a response.
  #[error("request to {url} failed: {message}")]
  Transport { url: String, message: String },

  /// The server answered with an unexpected status.
  #[error("{url} returned HTTP {status}")]
  Status { url: String, status: u16 },

  /// The response body could not be decoded.
  #[error("failed to decode response from {url}: {message}")]
  Decode { url: String, message: String },

  /// The HTTP client could not be constructed.
  #[error("failed to create HTTP client: {0}")]
  Client(String),
}

/// Where recipes are hosted.
pub trait RecipeSource: Send + Sync {
  /// Fetch the recipe text for a package, or `None` if no recipe exists.
  ///
  /// Any failure other than "not found" is an error, never `None`.
  fn fetch_recipe(&self, package: &str) -> Result<Option<String>, SourceError>;
}

/// The binary package index of a channel.
pub trait IndexSource: Send + Sync {
  /// Fetch the full index for a channel. Called once per channel per run.
  fn fetch_index(&self, channel: &str) -> Result<ChannelIndex, SourceError>;
}

/// The web listing of a package's published files.
pub trait ListingSource: Send + Sync {
  /// Fetch the raw listing page. A missing page is an empty listing.
  fn fetch_listing(&self, package: &str) -> Result<String, SourceError>;
}
