// SPDX-License-Identifier: MPL-2.0

//! Reduction of an over-approximate candidate set.
//!
//! Matching pulls in every module that could satisfy some mandatory requirement,
//! and remembers which requirements each one satisfies: its reasons.
//! Among modules sharing a symbolic name, a candidate whose reasons are
//! strictly included in those of another candidate brings nothing
//! the other does not, so it is dropped.
//! When two candidates have exactly the same reasons, the higher version is kept.
//!
//! What remains for a symbolic name is one candidate per maximal reason set.
//! The result does not depend on the order of the input.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use indexmap::IndexMap;
use version_range::Version;

use crate::capability::Requirement;
use crate::module::{Module, ModuleId};

/// A module pulled into a resolution, with the mandatory requirements it satisfies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    module: Module,
    reasons: BTreeSet<Requirement>,
}

impl Candidate {
    /// Build a candidate. Optional requirements are not reasons and are ignored.
    pub fn new(module: Module, reasons: impl IntoIterator<Item = Requirement>) -> Self {
        Self {
            module,
            reasons: reasons.into_iter().filter(|r| !r.is_optional()).collect(),
        }
    }

    pub(crate) fn add_reason(&mut self, requirement: Requirement) {
        if !requirement.is_optional() {
            self.reasons.insert(requirement);
        }
    }

    /// The candidate module.
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// The mandatory requirements the module satisfies.
    pub fn reasons(&self) -> &BTreeSet<Requirement> {
        &self.reasons
    }

    /// Unwrap the module.
    pub fn into_module(self) -> Module {
        self.module
    }
}

/// Minimize a set of candidates.
///
/// Entries for the same module identity are merged first, their reasons unioned.
/// The output is sorted by symbolic name, then version, then repository.
pub fn reduce(candidates: impl IntoIterator<Item = Candidate>) -> Vec<Candidate> {
    let mut by_id: IndexMap<ModuleId, Candidate> = IndexMap::new();
    for candidate in candidates {
        match by_id.get_mut(candidate.module.id()) {
            Some(known) => known.reasons.extend(candidate.reasons),
            None => {
                by_id.insert(candidate.module.id().clone(), candidate);
            }
        }
    }

    let mut groups: IndexMap<String, Vec<Candidate>> = IndexMap::new();
    for (_, candidate) in by_id {
        groups
            .entry(candidate.module.symbolic_name().to_string())
            .or_default()
            .push(candidate);
    }

    let mut reduced: Vec<Candidate> = groups
        .into_iter()
        .flat_map(|(name, group)| {
            let before = group.len();
            let kept = reduce_group(group);
            if kept.len() < before {
                log::debug!("{}: kept {} of {} candidates", name, kept.len(), before);
            }
            kept
        })
        .collect();
    reduced.sort_by(|a, b| a.module.id().cmp(b.module.id()));
    reduced
}

/// Reduce candidates sharing one symbolic name to a fixed point.
fn reduce_group(mut group: Vec<Candidate>) -> Vec<Candidate> {
    if group.len() < 2 {
        return group;
    }
    if group.iter().any(|c| !c.reasons.is_empty()) {
        group.retain(|c| {
            if c.reasons.is_empty() {
                log::trace!("dropping {}: no mandatory reason", c.module);
            }
            !c.reasons.is_empty()
        });
    }
    while let Some(redundant) = find_redundant(&group) {
        let dropped = group.swap_remove(redundant);
        log::trace!("dropping redundant {}", dropped.module);
    }
    group
}

/// Index of a candidate superseded by another one of the group.
fn find_redundant(group: &[Candidate]) -> Option<usize> {
    group.iter().enumerate().find_map(|(i, a)| {
        group
            .iter()
            .enumerate()
            .any(|(j, b)| i != j && supersedes(b, a))
            .then_some(i)
    })
}

/// Does `b` make `a` redundant.
fn supersedes(b: &Candidate, a: &Candidate) -> bool {
    if a.reasons == b.reasons {
        tie_break_key(b) > tie_break_key(a)
    } else {
        a.reasons.is_subset(&b.reasons)
    }
}

/// Among equal reason sets the highest version wins,
/// then the lexicographically smallest repository.
fn tie_break_key(c: &Candidate) -> (&Version, Reverse<&str>) {
    (c.module.version(), Reverse(c.module.id().repository()))
}

// TESTS #######################################################################

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(name: &str) -> Requirement {
        Requirement::package(name, version_range::VersionRange::full())
    }

    fn candidate(version: Version, reasons: &[&str]) -> Candidate {
        Candidate::new(
            Module::new("com.acme.test", version),
            reasons.iter().map(|r| reason(r)),
        )
    }

    #[test]
    fn optional_requirements_are_not_reasons() {
        let c = Candidate::new(
            Module::new("a", Version::new(1, 0, 0)),
            [reason("x"), reason("y").with_optional(true)],
        );
        assert_eq!(c.reasons().len(), 1);
    }

    #[test]
    fn duplicate_ids_are_merged() {
        let reduced = reduce([
            candidate(Version::new(1, 0, 0), &["a"]),
            candidate(Version::new(1, 0, 0), &["b"]),
            candidate(Version::new(2, 0, 0), &["a", "b"]),
        ]);
        // After merging, 1.0.0 and 2.0.0 have equal reasons.
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].module().version(), &Version::new(2, 0, 0));
    }

    #[test]
    fn equal_versions_prefer_smallest_repository() {
        let reduced = reduce([
            Candidate::new(
                Module::new("a", Version::new(1, 0, 0)).in_repository("remote"),
                [reason("x")],
            ),
            Candidate::new(
                Module::new("a", Version::new(1, 0, 0)).in_repository("local"),
                [reason("x")],
            ),
        ]);
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].module().id().repository(), "local");
    }

    #[test]
    fn groups_are_independent() {
        let reduced = reduce([
            Candidate::new(Module::new("a", Version::new(1, 0, 0)), [reason("x")]),
            Candidate::new(Module::new("b", Version::new(1, 0, 0)), [reason("x"), reason("y")]),
        ]);
        assert_eq!(reduced.len(), 2);
    }

    #[test]
    fn cascade_to_fixed_point() {
        let reduced = reduce([
            candidate(Version::new(1, 0, 0), &["a"]),
            candidate(Version::new(0, 5, 0), &["a", "b"]),
            candidate(Version::new(0, 1, 0), &["a", "b", "c"]),
        ]);
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].module().version(), &Version::new(0, 1, 0));
    }
}
