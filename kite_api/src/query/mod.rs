//! Query builders for the historical endpoint.

mod historical;
pub use self::historical::HistoricalQuery;

use url::Url;

/// Trait implemented by query builders. Provides URL serialization.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;
}
