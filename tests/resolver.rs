// SPDX-License-Identifier: MPL-2.0

use bundle_resolver::capability::{Capability, Namespace, Requirement, MANDATORY_DIRECTIVE};
use bundle_resolver::error::ResolveError;
use bundle_resolver::module::{Module, ModuleId};
use bundle_resolver::resolver::{
    Application, ApplicationResolver, OfflineMetadata, PlaceholderSupplier, ResolutionContext,
    ResolverOptions,
};
use bundle_resolver::suggest::{ExactContent, OfflineProvider};
use bundle_resolver::{Version, VersionRange};

fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn range(s: &str) -> VersionRange {
    s.parse().unwrap()
}

fn v(major: u64, minor: u64, micro: u64) -> Version {
    Version::new(major, minor, micro)
}

/// A web module using a logging API and a service, with two API implementations.
fn metadata() -> OfflineMetadata {
    let mut metadata = OfflineMetadata::new();
    metadata.add(
        Module::new("web", v(1, 0, 0))
            .with_requirement(Requirement::package("com.acme.log", range("[2.0,3.0)")))
            .with_requirement(Requirement::service("com.acme.Store")),
    );
    metadata.add(
        Module::new("web", v(1, 1, 0))
            .with_requirement(Requirement::package("com.acme.log", range("[2.0,3.0)")))
            .with_requirement(Requirement::service("com.acme.Store")),
    );
    metadata.add(
        Module::new("log-impl", v(2, 1, 0))
            .with_capability(Capability::package("com.acme.log", v(2, 1, 0))),
    );
    metadata.add(
        Module::new("log-impl", v(2, 5, 0))
            .with_capability(Capability::package("com.acme.log", v(2, 5, 0))),
    );
    metadata.add(
        Module::new("log-legacy", v(1, 0, 0))
            .with_capability(Capability::package("com.acme.log", v(1, 9, 0))),
    );
    metadata.add(
        Module::new("store", v(1, 0, 0)).with_capability(Capability::service("com.acme.Store")),
    );
    metadata
}

fn ids(modules: &[Module]) -> Vec<String> {
    modules.iter().map(|m| m.id().to_string()).collect()
}

#[test]
fn resolves_application_end_to_end() {
    init_log();
    let app = Application::new("shop", v(1, 0, 0)).with_content("web", range("[1.0,2.0)"));
    let resolution = ApplicationResolver::new(metadata())
        .resolve(&app, &ResolutionContext::for_application(&app))
        .unwrap();
    assert_eq!(ids(&resolution.modules), ["log-impl 2.5.0", "store 1.0.0", "web 1.1.0"]);

    let web = Requirement::module("web", range("[1.0,2.0)"));
    assert_eq!(resolution.bindings[&web].version(), &v(1, 1, 0));
    let log = Requirement::package("com.acme.log", range("[2.0,3.0)"));
    assert_eq!(resolution.bindings[&log].symbolic_name(), "log-impl");
    assert_eq!(resolution.bindings.len(), 3);
}

/// Offers the store service as if the platform provided it.
struct PlatformServices;

impl PlaceholderSupplier for PlatformServices {
    fn collect_placeholders(&self, context: &ResolutionContext<'_>, placeholders: &mut Vec<Module>) {
        assert_eq!(context.application(), "shop");
        placeholders.push(
            Module::new("platform", v(0, 0, 0))
                .with_capability(Capability::service("com.acme.Store"))
                .with_capability(Capability::service("com.acme.Clock")),
        );
    }
}

#[test]
fn placeholders_are_matched_but_not_deployed() {
    init_log();
    let mut metadata = metadata();
    metadata.add(
        Module::new("clocked", v(1, 0, 0)).with_requirement(Requirement::service("com.acme.Clock")),
    );
    let app = Application::new("shop", v(1, 0, 0))
        .with_content("web", range("[1.0,2.0)"))
        .with_content("clocked", VersionRange::full());
    let resolver = ApplicationResolver::new(metadata).with_placeholder_supplier(PlatformServices);
    let resolution = resolver
        .resolve(&app, &ResolutionContext::for_application(&app))
        .unwrap();
    assert!(!resolution.deploys(&ModuleId::new("platform", v(0, 0, 0))));
    assert!(resolution.deploys(&ModuleId::new("clocked", v(1, 0, 0))));
    let clock = Requirement::service("com.acme.Clock");
    assert_eq!(resolution.bindings[&clock].symbolic_name(), "platform");
}

#[test]
fn missing_capability_is_unsatisfiable() {
    init_log();
    let mut metadata = OfflineMetadata::new();
    metadata.add(
        Module::new("web", v(1, 0, 0))
            .with_requirement(Requirement::package("com.acme.log", range("[2.0,3.0)")))
            .with_requirement(Requirement::package("com.acme.opt", VersionRange::full()).with_optional(true)),
    );
    metadata.add(
        Module::new("log-legacy", v(1, 0, 0))
            .with_capability(Capability::package("com.acme.log", v(1, 9, 0))),
    );
    let app = Application::new("shop", v(1, 0, 0)).with_content("web", VersionRange::full());
    let err = ApplicationResolver::new(metadata)
        .resolve(&app, &ResolutionContext::for_application(&app))
        .unwrap_err();
    match &err {
        ResolveError::UnsatisfiableRequirement(unsatisfied) => {
            assert_eq!(unsatisfied.len(), 1);
            assert_eq!(unsatisfied[0].requirement.name(), Some("com.acme.log"));
            assert_eq!(
                unsatisfied[0].required_by,
                Some(ModuleId::new("web", v(1, 0, 0)))
            );
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        err.to_string(),
        "unable to resolve the application:\n\
         unable to resolve package com.acme.log [2.0.0,3.0.0) required by web 1.0.0"
    );
}

#[test]
fn unsatisfied_requirements_of_dropped_modules_are_ignored() {
    init_log();
    let mut metadata = OfflineMetadata::new();
    metadata.add(
        Module::new("web", v(1, 0, 0))
            .with_requirement(Requirement::package("com.acme.gone", VersionRange::full())),
    );
    metadata.add(Module::new("web", v(2, 0, 0)));
    let app = Application::new("shop", v(1, 0, 0)).with_content("web", VersionRange::full());
    let resolution = ApplicationResolver::new(metadata)
        .resolve(&app, &ResolutionContext::for_application(&app))
        .unwrap();
    assert_eq!(ids(&resolution.modules), ["web 2.0.0"]);
}

#[test]
fn mandatory_attributes_are_honoured() {
    init_log();
    let mut metadata = OfflineMetadata::new();
    metadata.add(
        Module::new("client", v(1, 0, 0))
            .with_requirement(Requirement::package("com.acme.bar", range("1.0"))),
    );
    metadata.add(
        Module::new("bar", v(1, 0, 0)).with_capability(
            Capability::package("com.acme.bar", v(1, 0, 0))
                .with_attribute("company", "dodo")
                .with_directive(MANDATORY_DIRECTIVE, "company"),
        ),
    );
    let app = Application::new("shop", v(1, 0, 0)).with_content("client", VersionRange::full());
    let resolver = ApplicationResolver::new(metadata);
    let err = resolver
        .resolve(&app, &ResolutionContext::for_application(&app))
        .unwrap_err();
    assert!(matches!(err, ResolveError::UnsatisfiableRequirement(_)));
}

#[test]
fn conflicting_content_fails_to_merge() {
    init_log();
    let app = Application::new("shop", v(1, 0, 0))
        .with_content("web", range("[1.0,1.1)"))
        .with_use_content("web", range("[1.1,2.0)"));
    let err = ApplicationResolver::new(metadata())
        .resolve(&app, &ResolutionContext::for_application(&app))
        .unwrap_err();
    match err {
        ResolveError::MergeFailure { first, second } => {
            assert_eq!(first.name(), Some("web"));
            assert!(second.is_optional());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn use_content_is_only_pulled_when_needed() {
    init_log();
    let app = Application::new("shop", v(1, 0, 0))
        .with_content("web", range("[1.0,1.1)"))
        .with_use_content("log-impl", range("[2.0,2.2)"));
    let resolution = ApplicationResolver::new(metadata())
        .resolve(&app, &ResolutionContext::for_application(&app))
        .unwrap();
    // Both log-impl versions end up with the same reasons, the highest wins.
    assert_eq!(ids(&resolution.modules), ["log-impl 2.5.0", "store 1.0.0", "web 1.0.0"]);

    let app = Application::new("shop", v(1, 0, 0))
        .with_content("store", VersionRange::full())
        .with_use_content("log-legacy", VersionRange::full());
    let resolver = ApplicationResolver::new(metadata());
    let resolution = resolver
        .resolve(&app, &ResolutionContext::for_application(&app))
        .unwrap();
    assert_eq!(ids(&resolution.modules), ["log-legacy 1.0.0", "store 1.0.0"]);

    let resolver = resolver.with_options(ResolverOptions {
        return_optional_modules: false,
    });
    let resolution = resolver
        .resolve(&app, &ResolutionContext::for_application(&app))
        .unwrap();
    assert_eq!(ids(&resolution.modules), ["store 1.0.0"]);
}

#[test]
fn deployed_content_comes_from_cheapest_provider() {
    init_log();
    let mut global = OfflineProvider::new("global", 10);
    let mut local = OfflineProvider::new("local", 1);
    let web = Module::new("web", v(1, 0, 0))
        .with_requirement(Requirement::package("com.acme.log", range("[2.0,3.0)")))
        .with_requirement(Requirement::service("com.acme.Store"));
    global.add(web.clone());
    local.add(web);

    let app = Application::new("shop", v(1, 0, 0))
        .with_content("web", range("[1.0,2.0)"))
        .with_deployed(ExactContent::new("web", v(1, 0, 0)));
    let context = ResolutionContext::for_application(&app)
        .with_provider(&global)
        .with_provider(&local);
    let resolution = ApplicationResolver::new(metadata())
        .resolve(&app, &context)
        .unwrap();
    let deployed: Vec<&ModuleId> = resolution
        .modules
        .iter()
        .filter(|m| m.symbolic_name() == "web")
        .map(Module::id)
        .collect();
    assert_eq!(deployed.len(), 1);
    assert_eq!(deployed[0].version(), &v(1, 0, 0));
    assert_eq!(deployed[0].repository(), "local");
}

#[test]
fn deployed_content_without_provider_fails() {
    init_log();
    let app = Application::new("shop", v(1, 0, 0)).with_deployed(ExactContent::new("web", v(1, 0, 0)));
    let err = ApplicationResolver::new(metadata())
        .resolve(&app, &ResolutionContext::for_application(&app))
        .unwrap_err();
    assert!(matches!(err, ResolveError::UnresolvedContent { .. }));
    assert_eq!(err.to_string(), "no provider offers web 1.0.0");
}

#[test]
fn nothing_to_deploy() {
    init_log();
    let app = Application::new("empty", v(1, 0, 0));
    let err = ApplicationResolver::new(metadata())
        .resolve(&app, &ResolutionContext::for_application(&app))
        .unwrap_err();
    assert!(matches!(err, ResolveError::EmptyDeployment { .. }));

    // Only placeholders satisfy the content.
    let app = Application::new("shop", v(1, 0, 0)).with_content("platform", VersionRange::full());
    let resolver = ApplicationResolver::new(OfflineMetadata::new()).with_placeholder_supplier(PlatformServices);
    let err = resolver
        .resolve(&app, &ResolutionContext::for_application(&app))
        .unwrap_err();
    assert!(matches!(err, ResolveError::EmptyDeployment { .. }));
}

#[test]
fn services_match_without_version_range() {
    let store = Requirement::new(Namespace::Service, "com.acme.Store");
    let module = Module::new("store", v(1, 0, 0)).with_capability(Capability::service("com.acme.Store"));
    assert!(module.provides(&store));
}

#[test]
fn independent_resolutions_run_concurrently() {
    init_log();
    let resolver = ApplicationResolver::new(metadata());
    let apps: Vec<Application> = (0..8)
        .map(|i| {
            let app = Application::new(format!("shop-{}", i), v(1, 0, i));
            if i % 2 == 0 {
                app.with_content("web", range("[1.0,1.1)"))
            } else {
                app.with_content("web", range("[1.1,2.0)"))
            }
        })
        .collect();
    std::thread::scope(|s| {
        for (i, app) in apps.iter().enumerate() {
            let resolver = &resolver;
            s.spawn(move || {
                let resolution = resolver
                    .resolve(app, &ResolutionContext::for_application(app))
                    .unwrap();
                let expected = if i % 2 == 0 { v(1, 0, 0) } else { v(1, 1, 0) };
                assert!(resolution.deploys(&ModuleId::new("web", expected)));
                assert_eq!(resolution.modules.len(), 3);
            });
        }
    });
}
