//! # cellar
//!
//! A hierarchical aggregation tree. Keys are parsed into paths, every node
//! on a path can hold a value (a *dweller*), and the dwellers of a whole
//! subtree can be aggregated, optionally skipping chosen branches.
//!
//! The tree is generic over two strategies chosen at construction:
//!
//! - a [`Parser`] that turns keys into path segments, and
//! - a [`Dweller`] type that knows how to aggregate with its own kind.
//!
//! [`BeerCellar`] is the stock specialization: URL paths as keys and
//! [`Barrel`] counters as dwellers.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashSet;
//! use cellar::{Cellar, CellarDweller, Dweller, WholeKey};
//!
//! let mut cellar: Cellar<WholeKey<&str>, CellarDweller<u32>> = Cellar::new(WholeKey::new());
//! cellar.get(&"ipa").unwrap().push(1);
//! cellar.get(&"lager").unwrap().push(2);
//!
//! let root = cellar.root();
//! let all = cellar.get_down(Some(root), &HashSet::new()).unwrap();
//! assert_eq!(all.elements, vec![1, 2]);
//! assert_eq!(all.node(), None);
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod beer;
pub mod cellar;
pub mod dweller;
pub mod error;
pub mod node;
pub mod parser;
pub mod shared;

pub use beer::{merge_counts, Barrel, BeerCellar};
pub use cellar::{Cellar, Config};
pub use dweller::{CellarDweller, Dweller};
pub use error::{CellarError, Result};
pub use node::{Node, NodeId};
pub use parser::{split_path, FnParser, Parser, Segments, UrlParser, WholeKey, INLINE_SEGMENTS};
pub use shared::SharedCellar;

#[cfg(test)]
mod proptests;
