// SPDX-License-Identifier: MPL-2.0

//! Resolution of a whole application.
//!
//! An [ApplicationResolver] goes through the following phases:
//!
//! 1. Gathering: the application content turns into requirements,
//!    requirements on the same module are merged, deployed content is
//!    looked up through the providers of the [ResolutionContext],
//!    and every [PlaceholderSupplier] adds its placeholder modules.
//! 2. Matching: starting from the application requirements, each requirement
//!    is matched against the [MetadataSource] and the extra modules.
//!    Every match becomes a candidate and the requirements of new candidates
//!    are matched in turn.
//! 3. Reducing: the candidates are [reduced](crate::reduce::reduce),
//!    modules no longer reachable from the application are dropped,
//!    and each mandatory requirement is bound to one kept module.
//!
//! Placeholders take part in matching but are never deployed.

use std::collections::VecDeque;
use std::error::Error;
use std::fmt;

use indexmap::map::Entry;
use indexmap::IndexMap;
use version_range::{Version, VersionRange};

use crate::capability::{Namespace, Requirement};
use crate::error::ResolveError;
use crate::merge::merge;
use crate::module::{Content, Module, ModuleId};
use crate::reduce::{reduce, Candidate};
use crate::report::Unsatisfied;
use crate::suggest::{suggest, ExactContent, Provider};
use crate::type_aliases::{Map, ResolutionResult, Set};

/// Source of already parsed module descriptors.
pub trait MetadataSource {
    /// Modules named `symbolic_name` with a version in `range`.
    fn modules(
        &self,
        symbolic_name: &str,
        range: &VersionRange,
    ) -> Result<Vec<Module>, Box<dyn Error + Send + Sync>>;

    /// Modules with a capability matching the requirement.
    fn providers_of(
        &self,
        requirement: &Requirement,
    ) -> Result<Vec<Module>, Box<dyn Error + Send + Sync>>;
}

/// A basic implementation of [MetadataSource] holding modules in memory.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OfflineMetadata {
    modules: Map<String, Vec<Module>>,
}

impl OfflineMetadata {
    /// Creates an empty metadata source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module. A module with the same identity is replaced.
    pub fn add(&mut self, module: Module) {
        let same_name = self
            .modules
            .entry(module.symbolic_name().to_string())
            .or_default();
        same_name.retain(|m| m.id() != module.id());
        same_name.push(module);
        same_name.sort_by(|a, b| a.id().cmp(b.id()));
    }

    /// Number of modules known.
    pub fn len(&self) -> usize {
        self.modules.values().map(Vec::len).sum()
    }

    /// Whether no module is known.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetadataSource for OfflineMetadata {
    fn modules(
        &self,
        symbolic_name: &str,
        range: &VersionRange,
    ) -> Result<Vec<Module>, Box<dyn Error + Send + Sync>> {
        Ok(self
            .modules
            .get(symbolic_name)
            .map(|same_name| {
                same_name
                    .iter()
                    .filter(|m| range.contains(m.version()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn providers_of(
        &self,
        requirement: &Requirement,
    ) -> Result<Vec<Module>, Box<dyn Error + Send + Sync>> {
        let mut found: Vec<Module> = self
            .modules
            .values()
            .flatten()
            .filter(|m| m.provides(requirement))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(found)
    }
}

/// Everything a resolution depends on besides the application itself.
#[derive(Clone)]
pub struct ResolutionContext<'a> {
    application: String,
    version: Version,
    providers: Vec<&'a dyn Provider>,
}

impl<'a> ResolutionContext<'a> {
    /// Context for resolving `application` at `version`, without providers.
    pub fn new(application: impl Into<String>, version: impl Into<Version>) -> Self {
        Self {
            application: application.into(),
            version: version.into(),
            providers: Vec::new(),
        }
    }

    /// Context for resolving the given application.
    pub fn for_application(application: &Application) -> Self {
        Self::new(application.symbolic_name(), application.version().clone())
    }

    /// Add a provider, queried after the ones already present.
    pub fn with_provider(mut self, provider: &'a dyn Provider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Symbolic name of the application being resolved.
    pub fn application(&self) -> &str {
        &self.application
    }

    /// Version of the application being resolved.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Providers in the order they are queried.
    pub fn providers(&self) -> &[&'a dyn Provider] {
        &self.providers
    }
}

/// Pre-resolution hook adding modules that only exist to satisfy requirements,
/// typically capabilities offered by the platform itself.
pub trait PlaceholderSupplier: Send + Sync {
    /// Push the placeholder modules for this resolution.
    fn collect_placeholders(&self, context: &ResolutionContext<'_>, placeholders: &mut Vec<Module>);
}

/// A composite application to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Application {
    symbolic_name: String,
    version: Version,
    #[cfg_attr(feature = "serde", serde(default))]
    content: Vec<Content>,
    #[cfg_attr(feature = "serde", serde(default))]
    use_content: Vec<Content>,
    #[cfg_attr(feature = "serde", serde(default))]
    deployed: Vec<ExactContent>,
}

impl Application {
    /// Application without content.
    pub fn new(symbolic_name: impl Into<String>, version: impl Into<Version>) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            version: version.into(),
            content: Vec::new(),
            use_content: Vec::new(),
            deployed: Vec::new(),
        }
    }

    /// Add a module that is part of the application.
    pub fn with_content(mut self, symbolic_name: impl Into<String>, range: VersionRange) -> Self {
        self.content.push(Content::new(symbolic_name, range));
        self
    }

    /// Add a module the application may use if something needs it.
    pub fn with_use_content(mut self, symbolic_name: impl Into<String>, range: VersionRange) -> Self {
        self.use_content.push(Content::new(symbolic_name, range));
        self
    }

    /// Pin content already deployed at an exact version.
    pub fn with_deployed(mut self, content: ExactContent) -> Self {
        self.deployed.push(content);
        self
    }

    /// Symbolic name.
    pub fn symbolic_name(&self) -> &str {
        &self.symbolic_name
    }

    /// Version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Content modules.
    pub fn content(&self) -> &[Content] {
        &self.content
    }

    /// Modules used only if needed.
    pub fn use_content(&self) -> &[Content] {
        &self.use_content
    }

    /// Content pinned at exact versions.
    pub fn deployed(&self) -> &[ExactContent] {
        &self.deployed
    }
}

/// Tuning of the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResolverOptions {
    /// Keep modules only pulled in by optional requirements.
    pub return_optional_modules: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            return_optional_modules: true,
        }
    }
}

/// Steps of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Turning the application into requirements and extra modules.
    Gathering,
    /// Finding every candidate module.
    Matching,
    /// Minimizing the candidates and binding requirements.
    Reducing,
    /// The resolution succeeded.
    Resolved,
    /// The resolution failed.
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gathering => "gathering",
            Self::Matching => "matching",
            Self::Reducing => "reducing",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The module chosen for every mandatory requirement
    /// of the application and of the deployed modules.
    /// Placeholders may appear here.
    pub bindings: ResolutionResult,
    /// The modules to deploy, placeholders excluded, sorted by identity.
    pub modules: Vec<Module>,
}

impl Resolution {
    /// Whether a module with that identity is deployed.
    pub fn deploys(&self, id: &ModuleId) -> bool {
        self.modules.iter().any(|m| m.id() == id)
    }
}

/// Modules gathered before matching, besides those of the metadata source.
struct Gathered {
    requirements: Vec<Requirement>,
    extra: Vec<Module>,
    placeholders: Set<ModuleId>,
}

/// Candidates found by matching.
struct Matched {
    candidates: Vec<Candidate>,
    /// For each requester, the modules matched by each of its requirements.
    /// `None` is the application.
    links: IndexMap<Option<ModuleId>, Vec<(Requirement, Vec<ModuleId>)>>,
    unsatisfied: Vec<Unsatisfied>,
}

/// Resolves applications against a [MetadataSource].
///
/// The resolver holds no state across calls,
/// so one instance can resolve several applications concurrently.
pub struct ApplicationResolver<M: MetadataSource> {
    metadata: M,
    hooks: Vec<Box<dyn PlaceholderSupplier>>,
    options: ResolverOptions,
}

impl<M: MetadataSource> ApplicationResolver<M> {
    /// Resolver with default options and no placeholder supplier.
    pub fn new(metadata: M) -> Self {
        Self {
            metadata,
            hooks: Vec::new(),
            options: ResolverOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Register a pre-resolution hook.
    pub fn with_placeholder_supplier(mut self, supplier: impl PlaceholderSupplier + 'static) -> Self {
        self.hooks.push(Box::new(supplier));
        self
    }

    /// The metadata source.
    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    /// Current options.
    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Resolve an application.
    ///
    /// Fails on the first error met:
    /// deployed content no provider offers, requirements that cannot be merged,
    /// mandatory requirements of kept modules left unsatisfied,
    /// or nothing left to deploy.
    pub fn resolve(
        &self,
        application: &Application,
        context: &ResolutionContext<'_>,
    ) -> Result<Resolution, ResolveError> {
        let result = self.run(application, context);
        match &result {
            Ok(resolution) => log::info!(
                "{} {}: {} ({} modules)",
                application.symbolic_name(),
                application.version(),
                Phase::Resolved,
                resolution.modules.len()
            ),
            Err(err) => log::info!(
                "{} {}: {}: {}",
                application.symbolic_name(),
                application.version(),
                Phase::Failed,
                err
            ),
        }
        result
    }

    fn run(
        &self,
        application: &Application,
        context: &ResolutionContext<'_>,
    ) -> Result<Resolution, ResolveError> {
        let enter = |phase: Phase| {
            log::info!(
                "{} {}: {}",
                application.symbolic_name(),
                application.version(),
                phase
            )
        };

        enter(Phase::Gathering);
        let gathered = self.gather(application, context)?;

        enter(Phase::Matching);
        let matched = self.match_requirements(&gathered)?;
        log::debug!("{} candidates", matched.candidates.len());

        enter(Phase::Reducing);
        self.reduce_and_bind(application, gathered, matched)
    }

    fn gather(
        &self,
        application: &Application,
        context: &ResolutionContext<'_>,
    ) -> Result<Gathered, ResolveError> {
        let mut extra = Vec::new();
        let mut wanted: Vec<Requirement> = application
            .content()
            .iter()
            .map(Content::requirement)
            .chain(
                application
                    .use_content()
                    .iter()
                    .map(|c| c.requirement().with_optional(true)),
            )
            .collect();
        for content in application.deployed() {
            let module = suggest(content, context.providers())?;
            wanted.push(Requirement::module(
                content.symbolic_name(),
                VersionRange::exact(content.version().clone()),
            ));
            extra.push(module);
        }

        let mut by_name: IndexMap<String, Requirement> = IndexMap::new();
        for requirement in wanted {
            let name = requirement.name().unwrap_or_default().to_string();
            match by_name.entry(name) {
                Entry::Vacant(entry) => {
                    entry.insert(requirement);
                }
                Entry::Occupied(mut entry) => match merge(entry.get(), &requirement) {
                    Some(merged) => {
                        log::trace!("merged {} and {} into {}", entry.get(), requirement, merged);
                        entry.insert(merged);
                    }
                    None => {
                        return Err(ResolveError::MergeFailure {
                            first: entry.get().clone(),
                            second: requirement,
                        })
                    }
                },
            }
        }

        let mut placeholders = Vec::new();
        for hook in &self.hooks {
            hook.collect_placeholders(context, &mut placeholders);
        }
        log::debug!("{} placeholder modules", placeholders.len());
        let placeholder_ids = placeholders.iter().map(|m| m.id().clone()).collect();
        extra.extend(placeholders);

        Ok(Gathered {
            requirements: by_name.into_values().collect(),
            extra,
            placeholders: placeholder_ids,
        })
    }

    fn match_requirements(&self, gathered: &Gathered) -> Result<Matched, ResolveError> {
        let mut queue: VecDeque<(Option<ModuleId>, Requirement)> = gathered
            .requirements
            .iter()
            .map(|r| (None, r.clone()))
            .collect();
        let mut seen: Set<(Option<ModuleId>, Requirement)> = Set::default();
        let mut memo: Map<Requirement, Vec<Module>> = Map::default();
        let mut candidates: IndexMap<ModuleId, Candidate> = IndexMap::new();
        let mut links: IndexMap<Option<ModuleId>, Vec<(Requirement, Vec<ModuleId>)>> =
            IndexMap::new();
        links.insert(None, Vec::new());
        let mut unsatisfied = Vec::new();

        while let Some((requester, requirement)) = queue.pop_front() {
            if !seen.insert((requester.clone(), requirement.clone())) {
                continue;
            }
            let matching = self.matching(&requirement, &gathered.extra, &mut memo)?;
            if matching.is_empty() && !requirement.is_optional() {
                log::debug!("nothing provides {}", requirement);
                unsatisfied.push(Unsatisfied {
                    requirement: requirement.clone(),
                    required_by: requester.clone(),
                });
            }
            let mut matched_ids = Vec::with_capacity(matching.len());
            for module in matching {
                let id = module.id().clone();
                matched_ids.push(id.clone());
                match candidates.get_mut(&id) {
                    Some(candidate) => candidate.add_reason(requirement.clone()),
                    None => {
                        log::trace!("{} is a candidate for {}", module, requirement);
                        for r in module.requirements() {
                            queue.push_back((Some(id.clone()), r.clone()));
                        }
                        links.entry(Some(id.clone())).or_default();
                        candidates.insert(id, Candidate::new(module, [requirement.clone()]));
                    }
                }
            }
            links
                .entry(requester)
                .or_default()
                .push((requirement, matched_ids));
        }

        Ok(Matched {
            candidates: candidates.into_values().collect(),
            links,
            unsatisfied,
        })
    }

    /// Modules matching a requirement.
    /// Extra modules shadow metadata modules with the same name and version.
    fn matching(
        &self,
        requirement: &Requirement,
        extra: &[Module],
        memo: &mut Map<Requirement, Vec<Module>>,
    ) -> Result<Vec<Module>, ResolveError> {
        if let Some(found) = memo.get(requirement) {
            return Ok(found.clone());
        }
        let from_metadata = match (requirement.namespace(), requirement.name()) {
            (Namespace::ModuleIdentity, Some(name)) => {
                let range = requirement.version_range().unwrap_or_else(VersionRange::full);
                self.metadata.modules(name, &range).map(|modules| {
                    modules
                        .into_iter()
                        .filter(|m| m.provides(requirement))
                        .collect::<Vec<_>>()
                })
            }
            _ => self.metadata.providers_of(requirement),
        }
        .map_err(|source| ResolveError::ErrorRetrievingModules {
            requirement: requirement.clone(),
            source,
        })?;

        let shadowed = |m: &Module| {
            extra
                .iter()
                .any(|e| e.symbolic_name() == m.symbolic_name() && e.version() == m.version())
        };
        let mut ids: Set<ModuleId> = Set::default();
        let found: Vec<Module> = extra
            .iter()
            .filter(|m| m.provides(requirement))
            .cloned()
            .chain(from_metadata.into_iter().filter(|m| !shadowed(m)))
            .filter(|m| ids.insert(m.id().clone()))
            .collect();
        memo.insert(requirement.clone(), found.clone());
        Ok(found)
    }

    fn reduce_and_bind(
        &self,
        application: &Application,
        gathered: Gathered,
        matched: Matched,
    ) -> Result<Resolution, ResolveError> {
        let Matched {
            mut candidates,
            links,
            unsatisfied,
        } = matched;
        if !self.options.return_optional_modules {
            candidates.retain(|c| {
                if c.reasons().is_empty() {
                    log::trace!("dropping optional {}", c.module());
                }
                !c.reasons().is_empty()
            });
        }
        let kept: IndexMap<ModuleId, Module> = reduce(candidates)
            .into_iter()
            .map(|c| (c.module().id().clone(), c.into_module()))
            .collect();

        // Keep what the application still reaches through kept modules.
        let mut live: Set<Option<ModuleId>> = Set::default();
        let mut frontier: Vec<Option<ModuleId>> = vec![None];
        live.insert(None);
        while let Some(requester) = frontier.pop() {
            let Some(requirements) = links.get(&requester) else {
                continue;
            };
            for (_, matched_ids) in requirements {
                for id in matched_ids {
                    let next = Some(id.clone());
                    if kept.contains_key(id) && !live.contains(&next) {
                        live.insert(next.clone());
                        frontier.push(next);
                    }
                }
            }
        }
        let unreachable = kept.len() + 1 - live.len();
        if unreachable > 0 {
            log::debug!("dropping {} modules no longer required", unreachable);
        }

        let mut fatal: Vec<Unsatisfied> = unsatisfied
            .into_iter()
            .filter(|u| live.contains(&u.required_by))
            .collect();

        let mut bindings = ResolutionResult::new();
        for (requester, requirements) in &links {
            if !live.contains(requester) {
                continue;
            }
            for (requirement, matched_ids) in requirements {
                if requirement.is_optional() || bindings.contains_key(requirement) {
                    continue;
                }
                let best = matched_ids
                    .iter()
                    .filter_map(|id| kept.get(id))
                    .max_by(|a, b| {
                        a.version()
                            .cmp(b.version())
                            .then_with(|| b.id().repository().cmp(a.id().repository()))
                    });
                match best {
                    Some(module) => {
                        bindings.insert(requirement.clone(), module.clone());
                    }
                    None if !matched_ids.is_empty() => fatal.push(Unsatisfied {
                        requirement: requirement.clone(),
                        required_by: requester.clone(),
                    }),
                    // Already recorded while matching.
                    None => {}
                }
            }
        }
        if !fatal.is_empty() {
            return Err(ResolveError::UnsatisfiableRequirement(fatal));
        }

        let modules: Vec<Module> = kept
            .into_iter()
            .filter(|(id, _)| live.contains(&Some(id.clone())))
            .filter(|(id, _)| !gathered.placeholders.contains(id))
            .map(|(_, module)| module)
            .collect();
        if modules.is_empty() {
            return Err(ResolveError::EmptyDeployment {
                application: application.symbolic_name().to_string(),
                version: application.version().clone(),
            });
        }
        Ok(Resolution { bindings, modules })
    }
}

// TESTS #######################################################################
