#![no_main]

//! Fuzz target for concurrent planning against one shared planner
//!
//! Several threads plan the same containers through an `Arc<Planner>` and
//! must agree on every diagnostic and plan size. Binding tables built by
//! one thread must be the ones every other thread sees.

use arbitrary::Arbitrary;
use dependency_planner::EntityId;
use dependency_planner::prelude::*;
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use std::thread;

const SERVICES: u8 = 12;

fn service(index: u8) -> String {
    format!("S{}", index % SERVICES)
}

#[derive(Debug, Arbitrary)]
struct FuzzService {
    dependencies: Vec<u8>,
    async_init: bool,
}

#[derive(Debug, Arbitrary)]
struct FuzzContainer {
    registered: Vec<u8>,
    imports_shared: bool,
    roots: Vec<(u8, bool)>,
}

#[derive(Debug, Arbitrary)]
struct Input {
    services: Vec<FuzzService>,
    shared: Vec<u8>,
    containers: Vec<FuzzContainer>,
    threads: u8,
}

fn build(input: Input) -> (TypeCatalog, DeclarationSet, Vec<EntityId>) {
    let mut catalog = TypeCatalog::new();
    for (index, fuzz) in input.services.into_iter().take(SERVICES as usize).enumerate() {
        let mut info = TypeInfo::class(service(index as u8))
            .constructor(fuzz.dependencies.into_iter().take(3).map(|d| Parameter::required(service(d))));
        if fuzz.async_init {
            info = info.requires_async_initialization();
        }
        catalog.insert(info);
    }

    let mut shared = Entity::module("Shared");
    for (index, ty) in input.shared.into_iter().take(6).enumerate() {
        let scope = if index % 2 == 0 {
            Scope::SingleInstance
        } else {
            Scope::InstancePerResolution
        };
        shared = shared.register(RegisterDeclaration::new(service(ty)).scope(scope));
    }

    let mut declarations = DeclarationSet::new().with(shared);
    let mut containers = Vec::new();
    for (index, fuzz) in input.containers.into_iter().take(4).enumerate() {
        let id = format!("App{index}");
        let mut container = Entity::container(id.as_str());
        for ty in fuzz.registered.into_iter().take(8) {
            container = container.register(RegisterDeclaration::new(service(ty)));
        }
        if fuzz.imports_shared {
            container = container.import("Shared");
        }
        for (root, is_async) in fuzz.roots.into_iter().take(4) {
            container = if is_async {
                container.resolves_async(service(root))
            } else {
                container.resolves(service(root))
            };
        }
        declarations.insert(container);
        containers.push(EntityId::from(id));
    }

    (catalog, declarations, containers)
}

/// What one thread observed for one container.
fn summarize(plan: &ContainerPlan) -> Vec<(Vec<Diagnostic>, Option<usize>)> {
    plan.resolutions()
        .iter()
        .map(|resolution| {
            (
                resolution.diagnostics().to_vec(),
                resolution.plan().map(ResolutionPlan::len),
            )
        })
        .collect()
}

fuzz_target!(|input: Input| {
    let threads = (input.threads % 4 + 2) as usize;
    let (catalog, declarations, containers) = build(input);
    if containers.is_empty() {
        return;
    }

    let planner = Arc::new(Planner::new(catalog, declarations));
    let containers = Arc::new(containers);

    let handles: Vec<_> = (0..threads)
        .map(|offset| {
            let planner = Arc::clone(&planner);
            let containers = Arc::clone(&containers);
            thread::spawn(move || {
                // Each thread starts at a different container to race the cache
                let count = containers.len();
                let mut observed = vec![Vec::new(); count];
                for step in 0..count {
                    let index = (offset + step) % count;
                    if let Ok(plan) = planner.plan_container(&containers[index]) {
                        observed[index] = summarize(&plan);
                    }
                }
                observed
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("planning thread panicked"))
        .collect();

    for other in &results[1..] {
        assert_eq!(&results[0], other);
    }

    for id in containers.iter() {
        let first = planner.bindings(id).expect("container table");
        let second = planner.bindings(id).expect("container table");
        assert!(Arc::ptr_eq(&first, &second));
    }
});
