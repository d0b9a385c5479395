//! Tracking of session tokens issued during a test run
//!
//! Repeated logins must each yield a fresh token. A [`SeenTokens`] set is
//! created per run and handed to every test that logs in; clones share the
//! same set. Both `clear` and `insert` take the lock, so repeated or
//! parallel tests cannot interleave a reset with an insert.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::common::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct SeenTokens {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl SeenTokens {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // A panicking test must not take every later test down with it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget every token seen so far
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Record a token; `false` if it had already been seen
    pub fn insert(&self, token: impl Into<String>) -> bool {
        self.lock().insert(token.into())
    }

    /// Record a token, failing with [`Error::DuplicateToken`] on reuse
    pub fn insert_unique(&self, token: &str) -> Result<()> {
        if self.insert(token) {
            Ok(())
        } else {
            Err(Error::DuplicateToken(token.to_string()))
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.lock().contains(token)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
