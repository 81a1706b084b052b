#![no_main]

//! Fuzz target for planning arbitrary declaration graphs
//!
//! Builds a random type catalog and random containers and modules (cyclic
//! imports, cyclic dependencies, delegates and arrays included) and checks
//! that planning terminates and every plan is well formed.

use arbitrary::Arbitrary;
use dependency_planner::prelude::*;
use dependency_planner::PlanEdge;
use libfuzzer_sys::fuzz_target;

const TYPES: u8 = 16;
const ENTITIES: u8 = 6;

fn ty(index: u8) -> String {
    format!("T{}", index % TYPES)
}

fn entity(index: u8) -> String {
    format!("E{}", index % ENTITIES)
}

fn scope(value: u8) -> Scope {
    match value % 3 {
        0 => Scope::InstancePerDependency,
        1 => Scope::InstancePerResolution,
        _ => Scope::SingleInstance,
    }
}

#[derive(Debug, Arbitrary)]
enum FuzzKind {
    Class,
    Struct,
    Interface,
    Delegate {
        returns: u8,
        parameters: Vec<(u8, bool)>,
        is_async: bool,
    },
    Array {
        element: u8,
    },
    Factory {
        target: u8,
        is_async: bool,
    },
    Error,
}

#[derive(Debug, Arbitrary)]
struct FuzzType {
    kind: FuzzKind,
    supertypes: Vec<u8>,
    /// (type, optional)
    parameters: Vec<(u8, bool)>,
    async_init: bool,
    internal: bool,
}

#[derive(Debug, Arbitrary)]
enum FuzzDeclaration {
    Register { ty: u8, targets: Vec<u8>, scope: u8 },
    FactoryMethod { returns: u8, parameters: Vec<u8>, scope: u8, is_async: bool },
    Decorator { ty: u8, decorated: u8 },
    DecoratorMethod { decorated: u8, parameters: Vec<u8> },
    Provider { ty: u8, is_async: bool },
    Import { module: u8, exclusions: Vec<u8> },
}

#[derive(Debug, Arbitrary)]
struct FuzzEntity {
    is_container: bool,
    declarations: Vec<FuzzDeclaration>,
    roots: Vec<(u8, bool)>,
}

#[derive(Debug, Arbitrary)]
struct Scenario {
    types: Vec<FuzzType>,
    entities: Vec<FuzzEntity>,
    max_depth: u8,
}

fn catalog(types: Vec<FuzzType>) -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    for (index, fuzz) in types.into_iter().take(TYPES as usize).enumerate() {
        let key = ty(index as u8);
        let mut info = match fuzz.kind {
            FuzzKind::Class => TypeInfo::class(key),
            FuzzKind::Struct => TypeInfo::structure(key),
            FuzzKind::Interface => TypeInfo::interface(key),
            FuzzKind::Delegate {
                returns,
                parameters,
                is_async,
            } => {
                let mut signature = DelegateSignature::returning(ty(returns));
                for (parameter, by_ref) in parameters.into_iter().take(4) {
                    signature = signature.param(if by_ref {
                        DelegateParam::by_ref(ty(parameter))
                    } else {
                        DelegateParam::new(ty(parameter))
                    });
                }
                if is_async {
                    signature = signature.asynchronous();
                }
                TypeInfo::delegate(key, signature)
            }
            FuzzKind::Array { element } => TypeInfo::array(key, ty(element)),
            FuzzKind::Factory { target, is_async: false } => TypeInfo::factory(key, ty(target)),
            FuzzKind::Factory { target, is_async: true } => TypeInfo::async_factory(key, ty(target)),
            FuzzKind::Error => TypeInfo::error(key),
        };
        if !fuzz.parameters.is_empty() {
            info = info.constructor(fuzz.parameters.into_iter().take(4).map(|(p, optional)| {
                if optional {
                    Parameter::optional(ty(p))
                } else {
                    Parameter::required(ty(p))
                }
            }));
        }
        for supertype in fuzz.supertypes.into_iter().take(3) {
            info = info.implements(ty(supertype));
        }
        if fuzz.async_init {
            info = info.requires_async_initialization();
        }
        if fuzz.internal {
            info = info.internal();
        }
        catalog.insert(info);
    }
    catalog
}

fn declarations(entities: Vec<FuzzEntity>) -> DeclarationSet {
    let mut set = DeclarationSet::new();
    for (index, fuzz) in entities.into_iter().take(ENTITIES as usize).enumerate() {
        let id = entity(index as u8);
        let mut declared = if fuzz.is_container {
            Entity::container(id)
        } else {
            Entity::module(id)
        };
        for declaration in fuzz.declarations.into_iter().take(24) {
            declared = match declaration {
                FuzzDeclaration::Register { ty: t, targets, scope: s } => {
                    let mut register = RegisterDeclaration::new(ty(t)).scope(scope(s));
                    for target in targets.into_iter().take(3) {
                        register = register.as_type(ty(target));
                    }
                    declared.register(register)
                }
                FuzzDeclaration::FactoryMethod {
                    returns,
                    parameters,
                    scope: s,
                    is_async,
                } => {
                    let mut method = FactoryMethodDeclaration::new("create", ty(returns)).scope(scope(s));
                    for parameter in parameters.into_iter().take(4) {
                        method = method.param(Parameter::required(ty(parameter)));
                    }
                    if is_async {
                        method = method.asynchronous();
                    }
                    declared.factory_method(method)
                }
                FuzzDeclaration::Decorator { ty: t, decorated } => {
                    declared.decorator(DecoratorDeclaration::new(ty(t), ty(decorated)))
                }
                FuzzDeclaration::DecoratorMethod {
                    decorated,
                    parameters,
                } => {
                    let mut method = DecoratorMethodDeclaration::new("decorate", ty(decorated));
                    for parameter in parameters.into_iter().take(4) {
                        method = method.param(Parameter::required(ty(parameter)));
                    }
                    declared.decorator_method(method)
                }
                FuzzDeclaration::Provider { ty: t, is_async } => {
                    let provider = ProviderDeclaration::new("provide", ty(t));
                    declared.provider(if is_async { provider.asynchronous() } else { provider })
                }
                FuzzDeclaration::Import { module, exclusions } => {
                    let mut import = ImportDeclaration::new(entity(module));
                    for excluded in exclusions.into_iter().take(3) {
                        import = import.except(ty(excluded));
                    }
                    declared.import_with(import)
                }
            };
        }
        for (root, is_async) in fuzz.roots.into_iter().take(4) {
            declared = if is_async {
                declared.resolves_async(ty(root))
            } else {
                declared.resolves(ty(root))
            };
        }
        set.insert(declared);
    }
    set
}

fuzz_target!(|scenario: Scenario| {
    let config = PlannerConfig::default().with_max_depth(scenario.max_depth as usize % 16 + 1);
    let planner = Planner::new(catalog(scenario.types), declarations(scenario.entities))
        .with_config(config);

    let Ok(plans) = planner.plan_all() else {
        return;
    };

    for container in plans {
        for resolution in container.resolutions() {
            let has_errors = resolution.errors().next().is_some();
            assert_eq!(resolution.is_resolvable(), !has_errors);

            let Some(plan) = resolution.plan() else {
                continue;
            };
            assert!(plan.root().index() < plan.len());
            for node in plan.nodes() {
                for edge in &node.dependencies {
                    if let PlanEdge::Node(id) = edge {
                        assert!(id.index() < plan.len());
                    }
                }
            }
        }
    }
});
