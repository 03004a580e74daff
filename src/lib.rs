// SPDX-License-Identifier: MPL-2.0

//! Resolution of composite applications made of versioned modules.
//!
//! Modules declare capabilities (what they provide) and requirements
//! (what they need, as attributed and versioned constraints).
//! Given the content of an application, this crate finds a consistent
//! and minimal set of modules satisfying every mandatory requirement.
//!
//! # Capabilities and requirements
//!
//! A [Capability](capability::Capability) lives in a
//! [Namespace](capability::Namespace): an exported package, a published service,
//! or the identity of a module. A [Requirement](capability::Requirement)
//! matches a capability of the same namespace when all of its attributes are
//! satisfied. The `version` attribute of packages and module identities is
//! matched by range containment, every other attribute by equality.
//! A capability may also list, in its `mandatory` directive, attributes that
//! a requirement must mention to match it.
//!
//! Requirements marked optional are matched too, but never count as a reason
//! for keeping a module over another one.
//!
//! # Basic example
//!
//! Let's imagine an application made of a single web module,
//! which imports the logging API exported by some other module.
//!
//! - `app` contains `web` in any 1.x version
//! - `web` 1.0.0 imports package `com.acme.log` at least 2.0
//! - `log-impl` 2.1.0 exports `com.acme.log` 2.1.0
//!
//! ```
//! # use bundle_resolver::capability::{Capability, Requirement};
//! # use bundle_resolver::module::Module;
//! # use bundle_resolver::resolver::{Application, ApplicationResolver, OfflineMetadata, ResolutionContext};
//! # use bundle_resolver::{Version, VersionRange};
//! let mut metadata = OfflineMetadata::new();
//! metadata.add(
//!     Module::new("web", Version::new(1, 0, 0))
//!         .with_requirement(Requirement::package("com.acme.log", VersionRange::at_least(Version::new(2, 0, 0)))),
//! );
//! metadata.add(
//!     Module::new("log-impl", Version::new(2, 1, 0))
//!         .with_capability(Capability::package("com.acme.log", Version::new(2, 1, 0))),
//! );
//!
//! let app = Application::new("app", Version::new(1, 0, 0))
//!     .with_content("web", "[1.0,2.0)".parse().unwrap());
//! let resolver = ApplicationResolver::new(metadata);
//! let resolution = resolver
//!     .resolve(&app, &ResolutionContext::for_application(&app))
//!     .unwrap();
//! assert_eq!(resolution.modules.len(), 2);
//! ```
//!
//! # Metadata and providers
//!
//! The [MetadataSource](resolver::MetadataSource) trait supplies already parsed
//! modules, either by symbolic name and version range or by capability.
//! Content already deployed at an exact version is instead asked to the
//! [Providers](suggest::Provider) of the
//! [ResolutionContext](resolver::ResolutionContext), and the cheapest
//! suggestion wins. Both come with in-memory implementations,
//! [OfflineMetadata](resolver::OfflineMetadata) and
//! [OfflineProvider](suggest::OfflineProvider).
//! Providers doing expensive lookups can be wrapped in a
//! [CachingProvider](cache::CachingProvider).
//!
//! # Reduction
//!
//! Matching is over-approximate: every module able to satisfy a requirement
//! becomes a candidate. The [reduce](reduce::reduce) step then keeps, for each
//! symbolic name, only the candidates whose set of satisfied requirements is
//! not included in the one of another candidate.
//!
//! # Error reporting
//!
//! When some mandatory requirements cannot be satisfied, resolution returns
//! [ResolveError::UnsatisfiableRequirement](error::ResolveError::UnsatisfiableRequirement).
//! The [Reporter](report::Reporter) trait turns the unsatisfied requirements
//! into a report, and [DefaultStringReporter](report::DefaultStringReporter)
//! produces one line per requirement:
//! ```txt
//! unable to resolve package com.acme.log 2.0.0 required by web 1.0.0
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod capability;
pub mod error;
pub mod merge;
pub mod module;
pub mod reduce;
pub mod report;
pub mod resolver;
pub mod suggest;
pub mod type_aliases;

pub use version_range::{Version, VersionRange};
