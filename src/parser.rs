//! Key parsing strategies.
//!
//! A parser turns an external key into the ordered segments that lead from
//! the root of a cellar to the key's node. Segments are plain values, so a
//! parser cannot hand the cellar a missing segment; keys it cannot handle
//! are rejected with [`CellarError::InvalidKey`] before the tree is touched.

use std::fmt;
use std::marker::PhantomData;

use smallvec::{smallvec, SmallVec};
use url::Url;

use crate::error::{CellarError, Result};

/// Number of segments kept inline before a parsed path spills to the heap.
pub const INLINE_SEGMENTS: usize = 8;

/// Parsed path from the root to a node.
pub type Segments<S> = SmallVec<[S; INLINE_SEGMENTS]>;

/// Strategy mapping a key to the segments of its path.
pub trait Parser {
    type Key: ?Sized;
    type Segment: Ord + Clone;

    fn parse(&self, key: &Self::Key) -> Result<Segments<Self::Segment>>;
}

/// Treats the whole key as one segment, giving a flat one-level cellar.
pub struct WholeKey<K>(PhantomData<fn(&K)>);

impl<K> WholeKey<K> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<K> Default for WholeKey<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for WholeKey<K> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for WholeKey<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WholeKey")
    }
}

impl<K: Ord + Clone> Parser for WholeKey<K> {
    type Key = K;
    type Segment = K;

    #[inline]
    fn parse(&self, key: &K) -> Result<Segments<K>> {
        Ok(smallvec![key.clone()])
    }
}

/// Parser backed by a closure.
///
/// ```rust
/// use cellar::{CellarDweller, Cellar, FnParser, Segments};
///
/// let by_char = FnParser::new(|key: &str| -> cellar::Result<Segments<char>> {
///     Ok(key.chars().collect())
/// });
/// let mut c: Cellar<_, CellarDweller<u32>> = Cellar::new(by_char);
/// c.get("ab").unwrap().push(1);
/// assert!(c.peek("a").unwrap().is_none());
/// ```
pub struct FnParser<F, K: ?Sized, S> {
    f: F,
    _marker: PhantomData<fn(&K) -> S>,
}

impl<F, K: ?Sized, S> FnParser<F, K, S>
where
    F: Fn(&K) -> Result<Segments<S>>,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F, K: ?Sized, S> Parser for FnParser<F, K, S>
where
    F: Fn(&K) -> Result<Segments<S>>,
    S: Ord + Clone,
{
    type Key = K;
    type Segment = S;

    #[inline]
    fn parse(&self, key: &K) -> Result<Segments<S>> {
        (self.f)(key)
    }
}

// =============================================================================
// URL paths
// =============================================================================

const DEFAULT_BASE: &str = "http://localhost/";

/// Splits the path of a URL into its non-empty segments.
///
/// Scheme, host, query and fragment are ignored, so `http://a.com/x/y`,
/// `https://b.org/x/y?q=1` and `/x/y/` all land on the same node. Relative
/// references are resolved against a base URL first; the `url` crate also
/// resolves `.` and `..` segments while doing so. Segments keep their
/// percent-encoding as written.
#[derive(Clone, Debug)]
pub struct UrlParser {
    base: Url,
}

impl UrlParser {
    pub fn new() -> Self {
        // Constant input, cannot fail.
        let base = Url::parse(DEFAULT_BASE).expect("default base URL must parse");
        Self { base }
    }

    /// Resolve relative references against `base` instead of the default.
    pub fn with_base(base: Url) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

impl Default for UrlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for UrlParser {
    type Key = str;
    type Segment = String;

    fn parse(&self, key: &str) -> Result<Segments<String>> {
        let url = Url::options()
            .base_url(Some(&self.base))
            .parse(key)
            .map_err(|e| CellarError::invalid_key(key, e))?;
        Ok(split_path(url.path()))
    }
}

/// Maximal runs of non-`/` characters, in order.
pub fn split_path(path: &str) -> Segments<String> {
    path.split('/')
        .filter(|piece| !piece.is_empty())
        .map(str::to_owned)
        .collect()
}
