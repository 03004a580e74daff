// SPDX-License-Identifier: MPL-2.0

//! Handling resolution errors.

use thiserror::Error;
use version_range::Version;

use crate::capability::Requirement;
use crate::report::{DefaultStringReporter, Reporter, Unsatisfied};
use crate::suggest::ExactContent;

/// Errors that may occur while resolving an application.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No provider offers the exact version of some deployed content.
    #[error("no provider offers {content}")]
    UnresolvedContent {
        /// Content that was asked for.
        content: ExactContent,
    },

    /// Some mandatory requirements have no matching capability
    /// among the modules kept in the resolution.
    #[error("unable to resolve the application:\n{}", DefaultStringReporter::report(.0))]
    UnsatisfiableRequirement(Vec<Unsatisfied>),

    /// Two requirements on the same target cannot be combined,
    /// because their attributes differ or their versions do not overlap.
    #[error("requirements {first} and {second} are not compatible")]
    MergeFailure {
        /// First requirement.
        first: Requirement,
        /// Second requirement.
        second: Requirement,
    },

    /// The resolution succeeded but nothing remains to deploy.
    #[error("nothing to deploy for application {application} {version}")]
    EmptyDeployment {
        /// Application symbolic name.
        application: String,
        /// Application version.
        version: Version,
    },

    /// Error arising when a [Provider](crate::suggest::Provider)
    /// returned an error in the method `suggest`.
    #[error("retrieving a suggestion for {content} from {provider} failed")]
    ErrorRetrievingSuggestion {
        /// Name of the failing provider.
        provider: String,
        /// Content for which we wanted a suggestion.
        content: ExactContent,
        /// Error raised by the implementer of `Provider`.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error arising when the [MetadataSource](crate::resolver::MetadataSource)
    /// failed to list the modules matching a requirement.
    #[error("retrieving modules for {requirement} failed")]
    ErrorRetrievingModules {
        /// Requirement we were looking providers for.
        requirement: Requirement,
        /// Error raised by the implementer of `MetadataSource`.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
