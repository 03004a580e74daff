// SPDX-License-Identifier: MPL-2.0

//! Merging of two requirements on the same target into a narrower one.

use crate::capability::{AttributeValue, Requirement, VERSION_ATTRIBUTE};

/// Merge two requirements into one that only capabilities
/// satisfying both can match.
///
/// Returns `None` when the requirements are not compatible:
/// they live in different namespaces, their attributes other than
/// the version differ, or their version ranges do not overlap.
///
/// The merged requirement is optional only if both inputs are.
pub fn merge(r1: &Requirement, r2: &Requirement) -> Option<Requirement> {
    if r1.namespace() != r2.namespace() {
        return None;
    }
    let mut attributes = r1.attributes_without_version();
    if attributes != r2.attributes_without_version() {
        log::debug!("cannot merge {} with {}: attributes differ", r1, r2);
        return None;
    }
    let range = match (r1.version_range(), r2.version_range()) {
        (Some(a), Some(b)) => match a.intersect(&b) {
            Some(range) => Some(range),
            None => {
                log::debug!("cannot merge {} with {}: no common version", r1, r2);
                return None;
            }
        },
        (Some(range), None) | (None, Some(range)) => Some(range),
        (None, None) => None,
    };
    if let Some(range) = range {
        attributes.insert(VERSION_ATTRIBUTE.to_string(), AttributeValue::Range(range));
    }
    Some(Requirement::from_parts(
        r1.namespace(),
        attributes,
        r1.is_optional() && r2.is_optional(),
    ))
}

// TESTS #######################################################################
