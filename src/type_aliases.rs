// SPDX-License-Identifier: MPL-2.0

//! Publicly exported type aliases.

use indexmap::IndexMap;

use crate::capability::Requirement;
use crate::module::Module;

/// Map implementation used by the library.
pub type Map<K, V> = rustc_hash::FxHashMap<K, V>;

/// Set implementation used by the library.
pub type Set<V> = rustc_hash::FxHashSet<V>;

/// The module bound to each mandatory requirement of a successful resolution,
/// in the order the requirements were encountered.
pub type ResolutionResult = IndexMap<Requirement, Module>;
