// SPDX-License-Identifier: MPL-2.0

//! This crate contains the version and version interval types used by bundle manifests.
//!
//! A [`Version`] is a `major.minor.micro.qualifier` tuple. The three numeric parts compare
//! numerically and the qualifier compares lexically, only when the numeric parts are equal.
//!
//! A [`VersionRange`] is a single contiguous interval of versions with an inclusive or exclusive
//! floor and an optional inclusive or exclusive ceiling. A missing ceiling means "floor or later".
//! Ranges are written the way bundle manifests write them:
//!  - `1.2` is every version `>= 1.2.0`
//!  - `[1.0,2.0)` is every version `>= 1.0.0` and `< 2.0.0`
//!  - `(1.0,2.0]` is every version `> 1.0.0` and `<= 2.0.0`
//!  - `[1.0.0,1.0.0]` is exactly `1.0.0`
//!
//! Two ranges can be intersected with [`VersionRange::intersect`]. An empty intersection is not an
//! error: it simply means the two ranges have no version in common, and is reported as [`None`].
//!
//! ## Optional features
//!
//! * `serde`: serialization and deserialization of both types as their display strings.
//! * `proptest`: exports proptest strategies for [`Version`] and [`VersionRange`].

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

#[cfg(any(feature = "proptest", test))]
use proptest::prelude::*;
use thiserror::Error;

/// Error creating a [`Version`] from a [`String`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    /// A version needs at least a major number.
    #[error("version string is empty")]
    Empty,
    /// Wrapper around [ParseIntError](core::num::ParseIntError).
    #[error("cannot parse '{version_part}' in '{full_version}' as a number: {parse_error}")]
    ParseIntError {
        /// Version that was being parsed.
        full_version: String,
        /// The part where parsing failed.
        version_part: String,
        /// The underlying integer parsing error.
        parse_error: String,
    },
    /// Qualifiers are restricted to ASCII letters, digits, `_` and `-`.
    #[error("invalid qualifier '{qualifier}' in '{full_version}'")]
    InvalidQualifier {
        /// Version that was being parsed.
        full_version: String,
        /// The offending qualifier.
        qualifier: String,
    },
}

/// Error creating a [`VersionRange`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionRangeError {
    /// The floor is above the ceiling, or they are equal with an exclusive bound.
    #[error("version range {range} contains no version")]
    Empty {
        /// Rendering of the rejected bounds.
        range: String,
    },
    /// The range is not written in the `[a,b)` or bare version syntax.
    #[error("invalid version range syntax '{0}'")]
    InvalidSyntax(String),
    /// An exact version was required but the range admits more than one version.
    #[error("version range '{0}' is not an exact version")]
    NotExact(String),
    /// One of the bounds is not a valid version.
    #[error(transparent)]
    Version(#[from] VersionParseError),
}

// VERSION #####################################################################

/// Version of a module: `major.minor.micro.qualifier`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    major: u64,
    minor: u64,
    micro: u64,
    qualifier: String,
}

impl Version {
    /// Create a version with an empty qualifier.
    pub fn new(major: u64, minor: u64, micro: u64) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    /// Create a version with a qualifier.
    pub fn with_qualifier(major: u64, minor: u64, micro: u64, qualifier: impl Into<String>) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: qualifier.into(),
        }
    }

    /// Version 0.0.0, the lowest version.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Major number.
    pub fn major(&self) -> u64 {
        self.major
    }

    /// Minor number.
    pub fn minor(&self) -> u64 {
        self.minor
    }

    /// Micro number.
    pub fn micro(&self) -> u64 {
        self.micro
    }

    /// Qualifier, empty when absent.
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let full_version = s.trim();
        if full_version.is_empty() {
            return Err(VersionParseError::Empty);
        }
        let parse_number = |part: Option<&str>| match part {
            None => Ok(0),
            Some(part) => part
                .parse::<u64>()
                .map_err(|e| VersionParseError::ParseIntError {
                    full_version: full_version.to_string(),
                    version_part: part.to_string(),
                    parse_error: e.to_string(),
                }),
        };

        let mut parts = full_version.splitn(4, '.');
        let major = parse_number(parts.next())?;
        let minor = parse_number(parts.next())?;
        let micro = parse_number(parts.next())?;
        let qualifier = parts.next().unwrap_or_default();
        if !qualifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(VersionParseError::InvalidQualifier {
                full_version: full_version.to_string(),
                qualifier: qualifier.to_string(),
            });
        }
        Ok(Self::with_qualifier(major, minor, micro, qualifier))
    }
}

// Convert a tuple (major, minor, micro) into a version.
impl From<(u64, u64, u64)> for Version {
    fn from((major, minor, micro): (u64, u64, u64)) -> Self {
        Self::new(major, minor, micro)
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

// VERSION RANGE ###############################################################

/// A contiguous interval of versions.
///
/// The interval is never empty: constructors reject a floor above the ceiling,
/// as well as equal bounds where one side is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionRange {
    floor: Version,
    floor_inclusive: bool,
    /// `None` is +∞.
    ceiling: Option<Version>,
    ceiling_inclusive: bool,
}

impl VersionRange {
    /// Interval from its bounds.
    /// An unbounded ceiling is never inclusive, whatever `ceiling_inclusive` says.
    pub fn new(
        floor: Version,
        floor_inclusive: bool,
        ceiling: Option<Version>,
        ceiling_inclusive: bool,
    ) -> Result<Self, VersionRangeError> {
        let ceiling_inclusive = ceiling_inclusive && ceiling.is_some();
        if !valid_interval(&floor, floor_inclusive, ceiling.as_ref(), ceiling_inclusive) {
            let range = Self {
                floor,
                floor_inclusive,
                ceiling,
                ceiling_inclusive,
            };
            return Err(VersionRangeError::Empty {
                range: range.to_string(),
            });
        }
        Ok(Self {
            floor,
            floor_inclusive,
            ceiling,
            ceiling_inclusive,
        })
    }

    /// Every version higher or equal to `v`.
    pub fn at_least(v: impl Into<Version>) -> Self {
        Self {
            floor: v.into(),
            floor_inclusive: true,
            ceiling: None,
            ceiling_inclusive: false,
        }
    }

    /// Every version, that is `>= 0.0.0`.
    pub fn full() -> Self {
        Self::at_least(Version::zero())
    }

    /// Exactly the version `v`.
    pub fn exact(v: impl Into<Version>) -> Self {
        let v = v.into();
        Self {
            floor: v.clone(),
            floor_inclusive: true,
            ceiling: Some(v),
            ceiling_inclusive: true,
        }
    }

    /// Versions greater or equal to `v1` but less than `v2`.
    pub fn between(
        v1: impl Into<Version>,
        v2: impl Into<Version>,
    ) -> Result<Self, VersionRangeError> {
        Self::new(v1.into(), true, Some(v2.into()), false)
    }

    /// Parse a range where a bare version means that version exactly.
    /// Bracketed ranges are accepted only if they denote a single version.
    pub fn parse_exact(s: &str) -> Result<Self, VersionRangeError> {
        let trimmed = strip_quotes(s);
        if trimmed.starts_with(['[', '(']) {
            let range: Self = trimmed.parse()?;
            if range.is_exact() {
                Ok(range)
            } else {
                Err(VersionRangeError::NotExact(trimmed.to_string()))
            }
        } else {
            Ok(Self::exact(trimmed.parse::<Version>()?))
        }
    }

    /// Lower bound.
    pub fn floor(&self) -> &Version {
        &self.floor
    }

    /// Whether the lower bound itself is in the range.
    pub fn is_floor_inclusive(&self) -> bool {
        self.floor_inclusive
    }

    /// Upper bound, [None] when the range is open-ended.
    pub fn ceiling(&self) -> Option<&Version> {
        self.ceiling.as_ref()
    }

    /// Whether the upper bound itself is in the range.
    pub fn is_ceiling_inclusive(&self) -> bool {
        self.ceiling_inclusive
    }

    /// If the range admits a single version.
    pub fn is_exact(&self) -> bool {
        self.floor_inclusive && self.ceiling_inclusive && self.ceiling.as_ref() == Some(&self.floor)
    }

    /// Returns true if the range contains the version.
    pub fn contains(&self, version: &Version) -> bool {
        let above_floor = match version.cmp(&self.floor) {
            Ordering::Greater => true,
            Ordering::Equal => self.floor_inclusive,
            Ordering::Less => false,
        };
        above_floor
            && match &self.ceiling {
                None => true,
                Some(ceiling) => match version.cmp(ceiling) {
                    Ordering::Less => true,
                    Ordering::Equal => self.ceiling_inclusive,
                    Ordering::Greater => false,
                },
            }
    }

    /// Computes the versions that are in both ranges.
    ///
    /// The floor is the larger of the two floors and the ceiling the smaller of the two ceilings.
    /// When two bounds are equal, the result is inclusive only if both were.
    /// Returns [None] when the ranges do not overlap.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let (floor, floor_inclusive) = match self.floor.cmp(&other.floor) {
            Ordering::Greater => (&self.floor, self.floor_inclusive),
            Ordering::Less => (&other.floor, other.floor_inclusive),
            Ordering::Equal => (&self.floor, self.floor_inclusive && other.floor_inclusive),
        };
        let (ceiling, ceiling_inclusive) = match (&self.ceiling, &other.ceiling) {
            (None, None) => (None, false),
            (Some(c), None) => (Some(c), self.ceiling_inclusive),
            (None, Some(c)) => (Some(c), other.ceiling_inclusive),
            (Some(left), Some(right)) => match left.cmp(right) {
                Ordering::Less => (Some(left), self.ceiling_inclusive),
                Ordering::Greater => (Some(right), other.ceiling_inclusive),
                Ordering::Equal => (
                    Some(left),
                    self.ceiling_inclusive && other.ceiling_inclusive,
                ),
            },
        };
        if !valid_interval(floor, floor_inclusive, ceiling, ceiling_inclusive) {
            return None;
        }
        Some(Self {
            floor: floor.clone(),
            floor_inclusive,
            ceiling: ceiling.cloned(),
            ceiling_inclusive,
        })
    }
}

/// A valid interval is one where at least one version fits between floor and ceiling.
fn valid_interval(
    floor: &Version,
    floor_inclusive: bool,
    ceiling: Option<&Version>,
    ceiling_inclusive: bool,
) -> bool {
    match ceiling {
        None => true,
        Some(ceiling) => match floor.cmp(ceiling) {
            Ordering::Less => true,
            Ordering::Equal => floor_inclusive && ceiling_inclusive,
            Ordering::Greater => false,
        },
    }
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
        .trim()
}

impl FromStr for VersionRange {
    type Err = VersionRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = strip_quotes(s);
        if s.is_empty() {
            return Ok(Self::full());
        }
        let floor_inclusive = match s.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => return Ok(Self::at_least(s.parse::<Version>()?)),
        };
        let ceiling_inclusive = match s.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(VersionRangeError::InvalidSyntax(s.to_string())),
        };
        let inner = &s[1..s.len() - 1];
        let Some((floor, ceiling)) = inner.split_once(',') else {
            return Err(VersionRangeError::InvalidSyntax(s.to_string()));
        };
        let floor = floor.parse::<Version>()?;
        let ceiling = match ceiling.trim() {
            "∞" | "*" => None,
            c => Some(c.parse::<Version>()?),
        };
        Self::new(floor, floor_inclusive, ceiling, ceiling_inclusive)
    }
}

// REPORT ######################################################################

impl Display for VersionRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match (&self.ceiling, self.floor_inclusive) {
            (None, true) => write!(f, "{}", self.floor),
            (None, false) => write!(f, "({},∞)", self.floor),
            (Some(ceiling), _) => write!(
                f,
                "{}{},{}{}",
                if self.floor_inclusive { '[' } else { '(' },
                self.floor,
                ceiling,
                if self.ceiling_inclusive { ']' } else { ')' },
            ),
        }
    }
}

// SERIALIZATION ###############################################################

#[cfg(feature = "serde")]
impl serde::Serialize for Version {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Version {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for VersionRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for VersionRange {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Generate small versions so that generated ranges overlap often.
#[cfg(any(feature = "proptest", test))]
pub fn version_strategy() -> impl Strategy<Value = Version> {
    (0u64..4, 0u64..3, 0u64..3, prop::option::of("[a-c]{1,2}")).prop_map(
        |(major, minor, micro, qualifier)| {
            Version::with_qualifier(major, minor, micro, qualifier.unwrap_or_default())
        },
    )
}

/// Generate valid version ranges, with random inclusivity and open-ended ceilings.
#[cfg(any(feature = "proptest", test))]
pub fn proptest_strategy() -> impl Strategy<Value = VersionRange> {
    (
        version_strategy(),
        any::<bool>(),
        prop::option::of(version_strategy()),
        any::<bool>(),
    )
        .prop_filter_map(
            "empty interval",
            |(floor, floor_inclusive, ceiling, ceiling_inclusive)| {
                let (floor, ceiling) = match ceiling {
                    Some(c) if c < floor => (c, Some(floor)),
                    c => (floor, c),
                };
                VersionRange::new(floor, floor_inclusive, ceiling, ceiling_inclusive).ok()
            },
        )
}
