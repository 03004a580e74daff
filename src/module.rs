// SPDX-License-Identifier: MPL-2.0

//! Modules are the deployable units being resolved.

use std::fmt;

use version_range::{Version, VersionRange};

use crate::capability::{Capability, Requirement};

/// Identity of a module: its symbolic name, its version,
/// and the repository providing it, since two repositories
/// may offer physically distinct artifacts for the same name and version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleId {
    symbolic_name: String,
    version: Version,
    #[cfg_attr(feature = "serde", serde(default))]
    repository: String,
}

impl ModuleId {
    /// Identity of a module from an unnamed repository.
    pub fn new(symbolic_name: impl Into<String>, version: impl Into<Version>) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            version: version.into(),
            repository: String::new(),
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

    /// Name of the providing repository, empty if unknown.
    pub fn repository(&self) -> &str {
        &self.repository
    }
}

/// A versioned module with what it provides and what it needs.
///
/// Every module implicitly provides a
/// [ModuleIdentity](crate::capability::Namespace::ModuleIdentity) capability
/// for its own symbolic name and version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Module {
    id: ModuleId,
    #[cfg_attr(feature = "serde", serde(default))]
    capabilities: Vec<Capability>,
    #[cfg_attr(feature = "serde", serde(default))]
    requirements: Vec<Requirement>,
    #[cfg_attr(feature = "serde", serde(default))]
    cost: i64,
}

impl Module {
    /// Module without capabilities nor requirements.
    pub fn new(symbolic_name: impl Into<String>, version: impl Into<Version>) -> Self {
        Self {
            id: ModuleId::new(symbolic_name, version),
            capabilities: Vec::new(),
            requirements: Vec::new(),
            cost: 0,
        }
    }

    /// Add a capability.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Add a requirement.
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Set the preference weight, lower is preferred.
    pub fn with_cost(mut self, cost: i64) -> Self {
        self.cost = cost;
        self
    }

    /// Record the repository providing this module.
    pub fn in_repository(mut self, repository: impl Into<String>) -> Self {
        self.id.repository = repository.into();
        self
    }

    /// Identity of the module.
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    /// Symbolic name.
    pub fn symbolic_name(&self) -> &str {
        &self.id.symbolic_name
    }

    /// Version.
    pub fn version(&self) -> &Version {
        &self.id.version
    }

    /// Declared capabilities, the implicit identity capability excluded.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Declared requirements.
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Preference weight assigned by the providing repository.
    pub fn cost(&self) -> i64 {
        self.cost
    }

    /// The capability stating the identity of this module.
    pub fn identity_capability(&self) -> Capability {
        Capability::module_identity(self.id.symbolic_name.clone(), self.id.version.clone())
    }

    /// Whether one of the capabilities of this module satisfies the requirement.
    pub fn provides(&self, requirement: &Requirement) -> bool {
        requirement.matches(&self.identity_capability())
            || self.capabilities.iter().any(|c| requirement.matches(c))
    }
}

/// One entry of the content of an application:
/// a module symbolic name and the range of acceptable versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Content {
    symbolic_name: String,
    range: VersionRange,
}

impl Content {
    /// Content entry.
    pub fn new(symbolic_name: impl Into<String>, range: VersionRange) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            range,
        }
    }

    /// Symbolic name.
    pub fn symbolic_name(&self) -> &str {
        &self.symbolic_name
    }

    /// Acceptable versions.
    pub fn range(&self) -> &VersionRange {
        &self.range
    }

    /// The mandatory requirement on a module this entry stands for.
    pub fn requirement(&self) -> Requirement {
        Requirement::module(self.symbolic_name.clone(), self.range.clone())
    }
}

// REPORT ######################################################################

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.symbolic_name, self.version)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

// TESTS #######################################################################
