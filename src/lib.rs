//! # Dependency Planner - Compile-Time Dependency Injection Planning
//!
//! The planning core of a compile-time dependency injection container. A
//! host front end extracts types and declarations from user code; the
//! planner turns them into validated construction plans, or into precise
//! diagnostics explaining why a type cannot be built.
//!
//! ## Features
//!
//! - **Binding tables** - Registrations, factory methods, decorators, instance
//!   providers and module imports flattened per container, with conflict and
//!   shadowing rules
//! - **Scope chain** - Delegate parameters shadow container bindings; delegate
//!   and array types are synthesized on demand
//! - **Resolution walk** - Cycle, depth, scope and async checks over every
//!   dependency path, memoized per resolution
//! - **Diagnostics** - Every independent problem reported in one run, each
//!   with a stable code and a declaration site
//! - **Concurrent cache** - Binding tables are built once per entity and
//!   shared across threads through a `DashMap`
//! - **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use dependency_planner::prelude::*;
//!
//! let catalog = TypeCatalog::new()
//!     .with(TypeInfo::interface("IRepository"))
//!     .with(TypeInfo::class("Database").requires_async_initialization())
//!     .with(
//!         TypeInfo::class("Repository")
//!             .implements("IRepository")
//!             .constructor([Parameter::required("Database")]),
//!     );
//!
//! let declarations = DeclarationSet::new()
//!     .with(Entity::module("Infrastructure").register(
//!         RegisterDeclaration::new("Database").scope(Scope::SingleInstance),
//!     ))
//!     .with(
//!         Entity::container("App")
//!             .register(RegisterDeclaration::new("Repository").as_type("IRepository"))
//!             .import("Infrastructure")
//!             .resolves("IRepository")
//!             .resolves_async("Database"),
//!     );
//!
//! let planner = Planner::new(catalog, declarations);
//! let plan = planner.plan_container(&"App".into()).unwrap();
//!
//! // The synchronous root needs an async single instance
//! let repository = plan.resolution(&"IRepository".into()).unwrap();
//! assert!(repository.has(DiagnosticCode::RequiresAsyncResolution));
//!
//! // The async root is fine
//! let database = plan.resolution(&"Database".into()).unwrap();
//! assert!(database.is_resolvable());
//! ```
//!
//! ## Scopes
//!
//! - [`Scope::InstancePerDependency`] - a fresh instance for every consumer
//! - [`Scope::InstancePerResolution`] - shared within one resolution (default)
//! - [`Scope::SingleInstance`] - one instance per container, computed in a
//!   resolution of its own
//!
//! ## Delegates
//!
//! A delegate type `Func<P1, .., R>` is built on demand. Its parameters are
//! visible while resolving `R`, and its body is a new resolution:
//!
//! ```rust
//! use dependency_planner::prelude::*;
//!
//! let catalog = TypeCatalog::new()
//!     .with(TypeInfo::class("Request"))
//!     .with(TypeInfo::class("Handler").constructor([Parameter::required("Request")]))
//!     .with(TypeInfo::delegate(
//!         "Func<Request, Handler>",
//!         DelegateSignature::returning("Handler").param(DelegateParam::new("Request")),
//!     ));
//!
//! let declarations = DeclarationSet::new().with(
//!     Entity::container("App")
//!         .register(RegisterDeclaration::new("Handler"))
//!         .resolves("Func<Request, Handler>"),
//! );
//!
//! let planner = Planner::new(catalog, declarations);
//! let plan = planner.plan_container(&"App".into()).unwrap();
//! assert!(plan.is_buildable());
//! ```
//!
//! ## Logging
//!
//! With the `logging` feature (default) the planner emits `tracing` events
//! under the `dependency_planner` target. See [`logging`] for subscriber
//! setup.

mod chain;
mod declaration;
mod diagnostic;
mod error;
#[cfg(feature = "logging")]
pub mod logging;
mod plan;
mod planner;
mod scope;
mod source;
mod table;
mod types;
mod visitor;

pub use chain::*;
pub use declaration::*;
pub use diagnostic::*;
pub use error::*;
pub use plan::*;
pub use planner::*;
pub use scope::*;
pub use source::*;
pub use table::*;
pub use types::*;

pub(crate) use diagnostic::Diagnostics;
pub(crate) use table::TableBuilder;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        CancellationToken, ContainerPlan, DeclarationSet, DecoratorDeclaration,
        DecoratorMethodDeclaration, DelegateParam, DelegateSignature, Diagnostic, DiagnosticCode,
        Entity, FactoryMethodDeclaration, ImportDeclaration, Parameter, Planner, PlannerConfig,
        PlannerError, ProviderDeclaration, RegisterDeclaration, Resolution, ResolutionPlan,
        ResolutionRequest, Result, Scope, Severity, TypeCatalog, TypeInfo, TypeKey,
    };
}
