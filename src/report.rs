// SPDX-License-Identifier: MPL-2.0

//! Build a report as clear as possible as to why
//! an application could not be resolved.

use std::fmt;

use indexmap::IndexMap;

use crate::capability::{AttributeValue, Requirement, VERSION_ATTRIBUTE};
use crate::module::ModuleId;

/// A mandatory requirement no candidate module could satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Unsatisfied {
    /// The requirement left without provider.
    pub requirement: Requirement,
    /// Module declaring the requirement,
    /// `None` when it comes from the application content itself.
    pub required_by: Option<ModuleId>,
}

/// Reporter trait.
pub trait Reporter {
    /// Output type of the report.
    type Output;

    /// Generate a report from the unsatisfied requirements
    /// of a failed resolution.
    fn report(unsatisfied: &[Unsatisfied]) -> Self::Output;
}

/// Default reporter able to generate an explanation as a [String],
/// with one line per unsatisfied requirement.
pub struct DefaultStringReporter;

impl DefaultStringReporter {
    fn string_requirement(requirement: &Requirement) -> String {
        let mut line = format!(
            "{} {}",
            requirement.namespace(),
            requirement.name().unwrap_or("*")
        );
        let name_attribute = requirement.namespace().name_attribute();
        let custom: Vec<String> = requirement
            .attributes()
            .iter()
            .filter(|(key, _)| key.as_str() != name_attribute && key.as_str() != VERSION_ATTRIBUTE)
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        if let Some(range) = requirement.version_range() {
            line.push_str(&format!(" {}", range));
        } else if let Some(value) = requirement.attributes().get(VERSION_ATTRIBUTE) {
            // Unversioned namespaces still compare it like any attribute.
            line.push_str(&format!(" {}", Self::string_value(value)));
        }
        if !custom.is_empty() {
            line.push_str(&format!(" with attributes {{{}}}", custom.join(", ")));
        }
        line
    }

    fn string_value(value: &AttributeValue) -> String {
        match value {
            AttributeValue::String(s) => format!("\"{}\"", s),
            other => other.to_string(),
        }
    }

    fn string_required_by(required_by: &[Option<&ModuleId>]) -> String {
        required_by
            .iter()
            .map(|id| match id {
                Some(id) => id.to_string(),
                None => "the application".to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Reporter for DefaultStringReporter {
    type Output = String;

    fn report(unsatisfied: &[Unsatisfied]) -> Self::Output {
        let mut grouped: IndexMap<&Requirement, Vec<Option<&ModuleId>>> = IndexMap::new();
        for u in unsatisfied {
            let by = grouped.entry(&u.requirement).or_default();
            if !by.contains(&u.required_by.as_ref()) {
                by.push(u.required_by.as_ref());
            }
        }
        grouped
            .iter()
            .map(|(requirement, required_by)| {
                format!(
                    "unable to resolve {} required by {}",
                    Self::string_requirement(requirement),
                    Self::string_required_by(required_by)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Unsatisfied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            DefaultStringReporter::report(std::slice::from_ref(self))
        )
    }
}

// TESTS #######################################################################
