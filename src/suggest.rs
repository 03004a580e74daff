// SPDX-License-Identifier: MPL-2.0

//! Suggestion of a module for content deployed at an exact version.
//!
//! Every [Provider] is asked for the content, suggestions at the wrong
//! version are discarded, and the cheapest remaining suggestion wins.
//! When several suggestions share the lowest cost, the one coming from
//! the provider listed first wins, so the outcome only depends on
//! the order in which providers are given.

use std::cmp::Reverse;
use std::error::Error;
use std::fmt;
use std::hash::BuildHasherDefault;

use priority_queue::PriorityQueue;
use rustc_hash::FxHasher;
use version_range::Version;

use crate::error::ResolveError;
use crate::module::Module;
use crate::type_aliases::Map;

/// Content wanted at one exact version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExactContent {
    symbolic_name: String,
    version: Version,
}

impl ExactContent {
    /// Content `symbolic_name` at exactly `version`.
    pub fn new(symbolic_name: impl Into<String>, version: impl Into<Version>) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            version: version.into(),
        }
    }

    /// Symbolic name.
    pub fn symbolic_name(&self) -> &str {
        &self.symbolic_name
    }

    /// Version.
    pub fn version(&self) -> &Version {
        &self.version
    }
}

impl fmt::Display for ExactContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.symbolic_name, self.version)
    }
}

/// A repository able to suggest modules for some content.
///
/// The preference weight of a suggestion is the
/// [cost](Module::cost) of the returned module.
pub trait Provider: Send + Sync {
    /// Name of the provider, used in diagnostics and as repository name.
    fn name(&self) -> &str;

    /// Suggest a module for the content, if this provider knows one.
    fn suggest(
        &self,
        content: &ExactContent,
    ) -> Result<Option<Module>, Box<dyn Error + Send + Sync>>;
}

/// Select the cheapest module offered by the providers for the exact content.
///
/// Ties on cost go to the provider appearing first in `providers`.
pub fn suggest(content: &ExactContent, providers: &[&dyn Provider]) -> Result<Module, ResolveError> {
    let mut suggestions: Vec<Module> = Vec::with_capacity(providers.len());
    let mut ranking: PriorityQueue<usize, Reverse<(i64, usize)>, BuildHasherDefault<FxHasher>> =
        PriorityQueue::with_default_hasher();
    for (index, provider) in providers.iter().enumerate() {
        let suggestion = provider.suggest(content).map_err(|source| {
            ResolveError::ErrorRetrievingSuggestion {
                provider: provider.name().to_string(),
                content: content.clone(),
                source,
            }
        })?;
        let Some(module) = suggestion else {
            continue;
        };
        if module.symbolic_name() != content.symbolic_name() || module.version() != content.version() {
            log::debug!(
                "{} suggested {} for {}, discarded",
                provider.name(),
                module,
                content
            );
            continue;
        }
        log::trace!("{} suggests {} at cost {}", provider.name(), module, module.cost());
        ranking.push(suggestions.len(), Reverse((module.cost(), index)));
        suggestions.push(module);
    }
    match ranking.pop() {
        Some((best, Reverse((cost, index)))) => {
            log::debug!(
                "picked {} from {} at cost {}",
                content,
                providers[index].name(),
                cost
            );
            Ok(suggestions.swap_remove(best))
        }
        None => Err(ResolveError::UnresolvedContent {
            content: content.clone(),
        }),
    }
}

/// A basic implementation of [Provider] holding modules in memory.
///
/// Every module added is tagged with the cost and the name of this provider.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OfflineProvider {
    name: String,
    cost: i64,
    modules: Map<String, Map<Version, Module>>,
}

impl OfflineProvider {
    /// Creates an empty provider with the given name and cost.
    pub fn new(name: impl Into<String>, cost: i64) -> Self {
        Self {
            name: name.into(),
            cost,
            modules: Map::default(),
        }
    }

    /// Registers a module. A module with the same name and version is replaced.
    pub fn add(&mut self, module: Module) {
        let module = module.with_cost(self.cost).in_repository(self.name.clone());
        self.modules
            .entry(module.symbolic_name().to_string())
            .or_default()
            .insert(module.version().clone(), module);
    }

    /// Cost stamped on the modules of this provider.
    pub fn cost(&self) -> i64 {
        self.cost
    }

    /// Lists the versions known for a symbolic name, lowest first.
    pub fn versions(&self, symbolic_name: &str) -> Vec<&Version> {
        let mut versions: Vec<&Version> = self
            .modules
            .get(symbolic_name)
            .map(|by_version| by_version.keys().collect())
            .unwrap_or_default();
        versions.sort();
        versions
    }
}

impl Provider for OfflineProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn suggest(
        &self,
        content: &ExactContent,
    ) -> Result<Option<Module>, Box<dyn Error + Send + Sync>> {
        Ok(self
            .modules
            .get(content.symbolic_name())
            .and_then(|by_version| by_version.get(content.version()))
            .cloned())
    }
}

// TESTS #######################################################################

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str, cost: i64, modules: &[(&str, Version)]) -> OfflineProvider {
        let mut provider = OfflineProvider::new(name, cost);
        for (symbolic_name, version) in modules {
            provider.add(Module::new(*symbolic_name, version.clone()));
        }
        provider
    }

    #[test]
    fn offline_provider_stamps_cost_and_repository() {
        let p = provider("local", 3, &[("a", Version::new(1, 0, 0))]);
        let module = p
            .suggest(&ExactContent::new("a", Version::new(1, 0, 0)))
            .unwrap()
            .unwrap();
        assert_eq!(module.cost(), 3);
        assert_eq!(module.id().repository(), "local");
        assert_eq!(
            p.suggest(&ExactContent::new("a", Version::new(2, 0, 0))).unwrap(),
            None
        );
    }

    #[test]
    fn versions_are_sorted() {
        let p = provider(
            "local",
            0,
            &[
                ("a", Version::new(2, 0, 0)),
                ("a", Version::new(1, 0, 0)),
                ("a", Version::new(1, 5, 0)),
            ],
        );
        assert_eq!(
            p.versions("a"),
            [&Version::new(1, 0, 0), &Version::new(1, 5, 0), &Version::new(2, 0, 0)]
        );
        assert!(p.versions("b").is_empty());
    }

    #[test]
    fn cheapest_wins() {
        let expensive = provider("remote", 10, &[("a", Version::new(1, 0, 0))]);
        let cheap = provider("local", 1, &[("a", Version::new(1, 0, 0))]);
        let module = suggest(
            &ExactContent::new("a", Version::new(1, 0, 0)),
            &[&expensive, &cheap],
        )
        .unwrap();
        assert_eq!(module.id().repository(), "local");
    }
}
