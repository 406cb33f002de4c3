//! A cellar behind one lock.
//!
//! Lookups create nodes and dwellers, so every operation needs exclusive
//! access. There is no reader/writer split: the whole cellar sits behind a
//! single [`Mutex`].

use parking_lot::{Mutex, MutexGuard};

use crate::cellar::Cellar;
use crate::dweller::Dweller;
use crate::parser::Parser;

/// Thread-safe wrapper around a [`Cellar`].
pub struct SharedCellar<P: Parser, D: Dweller> {
    inner: Mutex<Cellar<P, D>>,
}

impl<P: Parser, D: Dweller> SharedCellar<P, D> {
    pub fn new(cellar: Cellar<P, D>) -> Self {
        Self {
            inner: Mutex::new(cellar),
        }
    }

    /// Lock the cellar for any sequence of operations.
    pub fn lock(&self) -> MutexGuard<'_, Cellar<P, D>> {
        self.inner.lock()
    }

    /// Run `f` with the cellar locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut Cellar<P, D>) -> R) -> R {
        let mut cellar = self.inner.lock();
        f(&mut cellar)
    }

    pub fn into_inner(self) -> Cellar<P, D> {
        self.inner.into_inner()
    }
}

impl<P: Parser, D: Dweller> From<Cellar<P, D>> for SharedCellar<P, D> {
    fn from(cellar: Cellar<P, D>) -> Self {
        Self::new(cellar)
    }
}

impl<P, D> Default for SharedCellar<P, D>
where
    P: Parser + Default,
    D: Dweller,
    D::Config: Default,
{
    fn default() -> Self {
        Self::new(Cellar::default())
    }
}
