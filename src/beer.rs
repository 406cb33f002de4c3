//! URL-keyed counting cellar.
//!
//! A [`BeerCellar`] files a [`Barrel`] under every URL path. Counting a hit
//! on one page and aggregating from any prefix gives the total for that
//! prefix's whole subtree, e.g. every beer mentioned under `/reviews/`.
//!
//! ```rust
//! use std::collections::HashSet;
//! use cellar::{BeerCellar, Dweller};
//!
//! let mut cellar = BeerCellar::default();
//! cellar.get("http://pub.example/reviews/ale").unwrap().add(2);
//! cellar.get("http://pub.example/reviews/stout/imperial").unwrap().add(3);
//!
//! let reviews = cellar.get("/reviews/").unwrap().node();
//! let total = cellar.get_down(reviews, &HashSet::new()).unwrap();
//! assert_eq!(total.count, 5);
//! ```

use std::collections::HashMap;

use crate::cellar::Cellar;
use crate::dweller::Dweller;
use crate::node::NodeId;
use crate::parser::UrlParser;

/// Cellar keyed by URL path, holding [`Barrel`]s.
pub type BeerCellar = Cellar<UrlParser, Barrel>;

/// Per-URL counts: how many beers were seen on the page and how often each
/// subresource was found there.
///
/// Aggregation sums `count` and merges `subresource_counts` key by key, so
/// it is associative and commutative and subtree totals do not depend on
/// visiting order. All sums saturate at `u64::MAX` instead of overflowing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Barrel {
    node: Option<NodeId>,
    pub count: u64,
    /// Subresource URL -> number of times it was found.
    pub subresource_counts: HashMap<String, u64>,
}

impl Barrel {
    #[inline]
    pub fn add(&mut self, n: u64) {
        self.count = self.count.saturating_add(n);
    }

    pub fn add_subresource(&mut self, url: impl Into<String>, n: u64) {
        let slot = self.subresource_counts.entry(url.into()).or_insert(0);
        *slot = slot.saturating_add(n);
    }

    /// Count for one subresource, zero when never seen.
    pub fn subresource(&self, url: &str) -> u64 {
        self.subresource_counts.get(url).copied().unwrap_or(0)
    }
}

impl Dweller for Barrel {
    type Config = ();

    fn new(node: Option<NodeId>, _config: &()) -> Self {
        Self {
            node,
            ..Self::default()
        }
    }

    #[inline]
    fn node(&self) -> Option<NodeId> {
        self.node
    }

    fn aggregate(&self, other: &Self) -> Self {
        Self {
            node: None,
            count: self.count.saturating_add(other.count),
            subresource_counts: merge_counts(&self.subresource_counts, &other.subresource_counts),
        }
    }
}

/// Key-wise saturating sum of two count maps. A key in only one map carries
/// over as is.
pub fn merge_counts(a: &HashMap<String, u64>, b: &HashMap<String, u64>) -> HashMap<String, u64> {
    let mut merged = a.clone();
    for (key, n) in b {
        let slot = merged.entry(key.clone()).or_insert(0);
        *slot = slot.saturating_add(*n);
    }
    merged
}
