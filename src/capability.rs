// SPDX-License-Identifier: MPL-2.0

//! Capabilities and requirements.
//!
//! A [Capability] is an attributed fact a module offers,
//! such as "exports package `com.acme.foo` at version 1.2.0".
//! A [Requirement] is an attributed constraint a module needs satisfied,
//! such as "imports package `com.acme.foo` in `[1.0.0,2.0.0)`".
//!
//! Both live in a [Namespace], and the namespace decides how the
//! `version` attribute is compared: by range containment for packages
//! and module identities, by plain equality for services.

use std::collections::BTreeMap;
use std::fmt;

use version_range::{Version, VersionRange};

/// Attribute holding the version of a capability,
/// or the accepted versions of a requirement.
pub const VERSION_ATTRIBUTE: &str = "version";

/// Capability directive listing the attributes
/// a requirement must explicitly mention in order to match.
pub const MANDATORY_DIRECTIVE: &str = "mandatory";

/// Attributes of a capability or a requirement, by name.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// The kind of fact a capability states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Namespace {
    /// A java-style package exported by a module.
    Package,
    /// A service published by a module.
    Service,
    /// The symbolic name and version of the module itself.
    ModuleIdentity,
}

impl Namespace {
    /// Attribute naming the package, service or module.
    pub fn name_attribute(self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Service => "service",
            Self::ModuleIdentity => "symbolic-name",
        }
    }

    /// Whether the `version` attribute is matched by range containment.
    /// Otherwise it is compared like every other attribute.
    pub fn is_versioned(self) -> bool {
        match self {
            Self::Package | Self::ModuleIdentity => true,
            Self::Service => false,
        }
    }

    /// Does the offered attribute value satisfy the wanted one.
    fn satisfies(self, key: &str, wanted: &AttributeValue, offered: &AttributeValue) -> bool {
        if key == VERSION_ATTRIBUTE && self.is_versioned() {
            match (wanted.as_range(), offered) {
                (Some(range), AttributeValue::Version(version)) => range.contains(version),
                _ => wanted == offered,
            }
        } else {
            wanted == offered
        }
    }
}

/// Value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeValue {
    /// Plain string.
    String(String),
    /// Integer.
    Long(i64),
    /// A single version. On a requirement it means "this version or later".
    Version(Version),
    /// Range of accepted versions.
    Range(VersionRange),
}

impl AttributeValue {
    /// The range of versions this value accepts, if it is a version constraint.
    pub fn as_range(&self) -> Option<VersionRange> {
        match self {
            Self::Version(version) => Some(VersionRange::at_least(version.clone())),
            Self::Range(range) => Some(range.clone()),
            Self::String(_) | Self::Long(_) => None,
        }
    }

    /// The string, if the value is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        Self::Long(n)
    }
}

impl From<Version> for AttributeValue {
    fn from(version: Version) -> Self {
        Self::Version(version)
    }
}

impl From<VersionRange> for AttributeValue {
    fn from(range: VersionRange) -> Self {
        Self::Range(range)
    }
}

/// An attributed fact a module offers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Capability {
    namespace: Namespace,
    #[cfg_attr(feature = "serde", serde(default))]
    attributes: Attributes,
    #[cfg_attr(feature = "serde", serde(default))]
    directives: BTreeMap<String, String>,
}

impl Capability {
    /// Capability in a namespace, identified by its name attribute.
    pub fn new(namespace: Namespace, name: impl Into<String>) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert(
            namespace.name_attribute().to_string(),
            AttributeValue::String(name.into()),
        );
        Self {
            namespace,
            attributes,
            directives: BTreeMap::new(),
        }
    }

    /// An exported package.
    pub fn package(name: impl Into<String>, version: impl Into<Version>) -> Self {
        Self::new(Namespace::Package, name)
            .with_attribute(VERSION_ATTRIBUTE, AttributeValue::Version(version.into()))
    }

    /// A published service.
    pub fn service(name: impl Into<String>) -> Self {
        Self::new(Namespace::Service, name)
    }

    /// The identity of a module.
    pub fn module_identity(symbolic_name: impl Into<String>, version: impl Into<Version>) -> Self {
        Self::new(Namespace::ModuleIdentity, symbolic_name)
            .with_attribute(VERSION_ATTRIBUTE, AttributeValue::Version(version.into()))
    }

    /// Add or replace an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add or replace a directive.
    pub fn with_directive(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.directives.insert(key.into(), value.into());
        self
    }

    /// Namespace of this capability.
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// All attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Directive value, if present.
    pub fn directive(&self, key: &str) -> Option<&str> {
        self.directives.get(key).map(String::as_str)
    }

    /// Name of the package, service or module.
    pub fn name(&self) -> Option<&str> {
        self.attributes
            .get(self.namespace.name_attribute())
            .and_then(AttributeValue::as_str)
    }

    /// Names listed by the comma-separated `mandatory` directive.
    pub fn mandatory_attributes(&self) -> impl Iterator<Item = &str> {
        self.directive(MANDATORY_DIRECTIVE)
            .into_iter()
            .flat_map(|names| names.split(','))
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Check that every attribute named by the capability `mandatory` directive
/// is a key of the requirement attributes.
/// A capability without that directive has no mandatory attribute.
pub fn mandatory_present(requirement_attributes: &Attributes, capability: &Capability) -> bool {
    capability
        .mandatory_attributes()
        .all(|name| requirement_attributes.contains_key(name))
}

/// An attributed constraint a module needs satisfied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Requirement {
    namespace: Namespace,
    #[cfg_attr(feature = "serde", serde(default))]
    attributes: Attributes,
    #[cfg_attr(feature = "serde", serde(default))]
    optional: bool,
}

impl Requirement {
    /// Mandatory requirement in a namespace, targeting the given name.
    pub fn new(namespace: Namespace, name: impl Into<String>) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert(
            namespace.name_attribute().to_string(),
            AttributeValue::String(name.into()),
        );
        Self::from_parts(namespace, attributes, false)
    }

    /// Requirement from its raw parts.
    pub fn from_parts(namespace: Namespace, attributes: Attributes, optional: bool) -> Self {
        Self {
            namespace,
            attributes,
            optional,
        }
    }

    /// Import of a package within a range of versions.
    pub fn package(name: impl Into<String>, range: VersionRange) -> Self {
        Self::new(Namespace::Package, name).with_attribute(VERSION_ATTRIBUTE, range)
    }

    /// Reference to a service.
    pub fn service(name: impl Into<String>) -> Self {
        Self::new(Namespace::Service, name)
    }

    /// Dependency on a module within a range of versions.
    pub fn module(symbolic_name: impl Into<String>, range: VersionRange) -> Self {
        Self::new(Namespace::ModuleIdentity, symbolic_name).with_attribute(VERSION_ATTRIBUTE, range)
    }

    /// Add or replace an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Mark the requirement optional or mandatory.
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Namespace of this requirement.
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// All attributes, the version constraint included.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Optional requirements are never reasons for keeping a module.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Name of the targeted package, service or module.
    pub fn name(&self) -> Option<&str> {
        self.attributes
            .get(self.namespace.name_attribute())
            .and_then(AttributeValue::as_str)
    }

    /// Accepted versions, when the namespace is versioned and a constraint is present.
    pub fn version_range(&self) -> Option<VersionRange> {
        if !self.namespace.is_versioned() {
            return None;
        }
        self.attributes
            .get(VERSION_ATTRIBUTE)
            .and_then(AttributeValue::as_range)
    }

    /// Attributes other than the version constraint.
    pub(crate) fn attributes_without_version(&self) -> Attributes {
        let mut attributes = self.attributes.clone();
        if self.namespace.is_versioned() {
            attributes.remove(VERSION_ATTRIBUTE);
        }
        attributes
    }

    /// A requirement matches a capability of the same namespace when every one of its
    /// attributes is satisfied by the capability, and the capability mandatory
    /// attributes are all mentioned by the requirement.
    pub fn matches(&self, capability: &Capability) -> bool {
        self.namespace == capability.namespace
            && self.attributes.iter().all(|(key, wanted)| {
                capability
                    .attributes
                    .get(key)
                    .is_some_and(|offered| self.namespace.satisfies(key, wanted, offered))
            })
            && mandatory_present(&self.attributes, capability)
    }
}

// REPORT ######################################################################

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package => write!(f, "package"),
            Self::Service => write!(f, "service"),
            Self::ModuleIdentity => write!(f, "module"),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Long(n) => write!(f, "{}", n),
            Self::Version(v) => write!(f, "{}", v),
            Self::Range(r) => write!(f, "{}", r),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.namespace, self.name().unwrap_or("*"))?;
        if let Some(range) = self.version_range() {
            write!(f, " {}", range)?;
        }
        if self.optional {
            write!(f, " (optional)")?;
        }
        Ok(())
    }
}

// TESTS #######################################################################
