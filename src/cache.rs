// SPDX-License-Identifier: MPL-2.0

//! Cache suggestions that have already been retrieved.

use std::error::Error;
use std::hash::BuildHasherDefault;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use dashmap::DashMap;
use rustc_hash::FxHasher;

use crate::module::Module;
use crate::suggest::{ExactContent, Provider};

/// Suggestion of one content, filled at most once.
#[derive(Default)]
struct Slot {
    suggestion: OnceLock<Option<Module>>,
    /// Held by the caller asking the remote.
    fetching: Mutex<()>,
}

impl Slot {
    fn known(&self) -> Option<Option<Module>> {
        self.suggestion.get().cloned()
    }
}

/// A [Provider] wrapper remembering the suggestions of another provider.
///
/// Each content is asked to the wrapped provider at most once,
/// even when several threads ask for it at the same time:
/// the first caller computes the suggestion while the others wait for it.
/// Callers asking for other contents never wait.
/// Errors are not remembered, the next call asks again.
pub struct CachingProvider<P: Provider> {
    remote: P,
    slots: DashMap<ExactContent, Arc<Slot>, BuildHasherDefault<FxHasher>>,
}

impl<P: Provider> CachingProvider<P> {
    /// Wrap a provider with an empty cache.
    pub fn new(remote: P) -> Self {
        Self {
            remote,
            slots: DashMap::default(),
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.remote
    }

    /// Number of contents whose suggestion is known.
    ///
    /// Suggestions still being retrieved are not counted.
    pub fn cached(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().suggestion.get().is_some())
            .count()
    }

    /// The slot of a content, created on first use.
    /// No lock of the map outlives this call.
    fn slot(&self, content: &ExactContent) -> Arc<Slot> {
        if let Some(slot) = self.slots.get(content) {
            return Arc::clone(&slot);
        }
        Arc::clone(&self.slots.entry(content.clone()).or_default())
    }
}

impl<P: Provider> Provider for CachingProvider<P> {
    fn name(&self) -> &str {
        self.remote.name()
    }

    fn suggest(
        &self,
        content: &ExactContent,
    ) -> Result<Option<Module>, Box<dyn Error + Send + Sync>> {
        let slot = self.slot(content);
        if let Some(suggestion) = slot.known() {
            log::trace!("cache hit for {} in {}", content, self.remote.name());
            return Ok(suggestion);
        }
        let _fetching = slot.fetching.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have filled the slot while we waited.
        if let Some(suggestion) = slot.known() {
            log::trace!("cache hit for {} in {}", content, self.remote.name());
            return Ok(suggestion);
        }
        let suggestion = self.remote.suggest(content)?;
        // Only the holder of `fetching` sets the slot, so this cannot fail.
        let _ = slot.suggestion.set(suggestion.clone());
        Ok(suggestion)
    }
}

// TESTS #######################################################################
