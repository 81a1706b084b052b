//! Instance sources
//!
//! An [`InstanceSource`] describes one way of obtaining an instance of a type.
//! The set of kinds is closed, so it is a plain enum and every consumer
//! matches on it exhaustively instead of going through a trait object.
//!
//! Sources compare and hash structurally. Two lookups that produce the same
//! source (for example the same synthesized delegate) are the same node for
//! cycle detection and memoization.

use crate::{
    Constructor, DelegateParam, Disposal, EntityId, Initialization, Parameter, ResolutionId, Scope,
    TypeKey,
};
use std::sync::Arc;

/// Constructed through a chosen constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Registration {
    /// Concrete type being constructed
    pub ty: TypeKey,
    /// Type this registration is looked up by
    pub registered_as: TypeKey,
    pub scope: Scope,
    pub initialization: Initialization,
    pub disposal: Disposal,
    pub constructor: Constructor,
}

/// Produced by calling `Create` / `CreateAsync` on a resolved factory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FactorySource {
    /// The `T` of `IFactory<T>`
    pub factory_of: TypeKey,
    /// Source of the factory instance itself
    pub factory: Arc<InstanceSource>,
    /// Scope of the produced `T`, independent of the factory's own scope
    pub scope: Scope,
    pub is_async: bool,
}

/// Produced by a method declared on a module or container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FactoryMethod {
    pub owner: EntityId,
    pub name: Arc<str>,
    pub returns: TypeKey,
    pub parameters: Vec<Parameter>,
    pub scope: Scope,
    pub is_async: bool,
}

/// What kind of code a decorator runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecoratorKind {
    /// A decorator type and its chosen constructor's parameters
    Type { ty: TypeKey },
    /// A decorator factory method
    Method { owner: EntityId, name: Arc<str> },
}

/// A decorator binding, applied to every source of `decorated`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decorator {
    pub kind: DecoratorKind,
    pub decorated: TypeKey,
    pub parameters: Vec<Parameter>,
    /// Index into `parameters` receiving the inner instance
    pub decorated_parameter: usize,
    pub is_async: bool,
    pub disposes: bool,
    /// How the container disposes the decorator's own instance
    pub disposal: Disposal,
}

/// A decorator applied to one inner source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecoratorSource {
    pub decorator: Arc<Decorator>,
    pub inner: Arc<InstanceSource>,
}

/// A delegate type the container builds on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DelegateSource {
    pub delegate: TypeKey,
    pub returns: TypeKey,
    pub parameters: Vec<DelegateParam>,
    /// Returns a task; the body may await async sources
    pub is_async: bool,
}

/// One parameter of a delegate, visible only inside that delegate's body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DelegateParameter {
    pub delegate: TypeKey,
    pub index: usize,
    pub ty: TypeKey,
    /// Resolution opened by the owning delegate
    pub owner: ResolutionId,
}

/// Every binding convertible to `element`, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArraySource {
    pub array: TypeKey,
    pub element: TypeKey,
    pub items: Vec<Arc<InstanceSource>>,
}

/// A value supplied by the container's owner at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceProvider {
    pub owner: EntityId,
    pub name: Arc<str>,
    pub ty: TypeKey,
    pub is_async: bool,
}

/// How to obtain an instance of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstanceSource {
    Registration(Registration),
    Factory(FactorySource),
    FactoryMethod(FactoryMethod),
    Decorator(DecoratorSource),
    Delegate(DelegateSource),
    DelegateParameter(DelegateParameter),
    Array(ArraySource),
    InstanceProvider(InstanceProvider),
}

/// A dependency edge of a source.
#[derive(Debug, Clone, Copy)]
pub enum Edge<'a> {
    /// Resolved by looking the parameter's type up in the scope chain
    Lookup(&'a Parameter),
    /// A fixed producer: the factory, the decorated inner source, an element
    Direct(&'a Arc<InstanceSource>),
}

impl InstanceSource {
    /// The type this source is bound to.
    pub fn of_type(&self) -> &TypeKey {
        match self {
            InstanceSource::Registration(r) => &r.registered_as,
            InstanceSource::Factory(f) => &f.factory_of,
            InstanceSource::FactoryMethod(m) => &m.returns,
            InstanceSource::Decorator(d) => &d.decorator.decorated,
            InstanceSource::Delegate(d) => &d.delegate,
            InstanceSource::DelegateParameter(p) => &p.ty,
            InstanceSource::Array(a) => &a.array,
            InstanceSource::InstanceProvider(p) => &p.ty,
        }
    }

    /// The type whose instance is actually created, before any conversion
    /// to [`of_type`](Self::of_type).
    pub fn produced_type(&self) -> &TypeKey {
        match self {
            InstanceSource::Registration(r) => &r.ty,
            InstanceSource::Decorator(d) => match &d.decorator.kind {
                DecoratorKind::Type { ty } => ty,
                DecoratorKind::Method { .. } => &d.decorator.decorated,
            },
            _ => self.of_type(),
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            InstanceSource::Registration(r) => r.scope,
            InstanceSource::Factory(f) => f.scope,
            InstanceSource::FactoryMethod(m) => m.scope,
            InstanceSource::Decorator(d) => d.inner.scope(),
            InstanceSource::Delegate(_) => Scope::InstancePerResolution,
            InstanceSource::DelegateParameter(_) => Scope::InstancePerDependency,
            InstanceSource::Array(_) => Scope::InstancePerDependency,
            InstanceSource::InstanceProvider(_) => Scope::InstancePerResolution,
        }
    }

    /// Whether obtaining this instance must be awaited.
    ///
    /// Only the source's own step counts; dependencies are checked when the
    /// walk reaches them. An instance the container must dispose
    /// asynchronously counts too. Building a delegate is always synchronous.
    pub fn is_async(&self) -> bool {
        match self {
            InstanceSource::Registration(r) => {
                r.initialization == Initialization::Async || r.disposal == Disposal::Async
            }
            InstanceSource::Factory(f) => f.is_async,
            InstanceSource::FactoryMethod(m) => m.is_async,
            InstanceSource::Decorator(d) => {
                d.decorator.is_async || d.decorator.disposal == Disposal::Async
            }
            InstanceSource::InstanceProvider(p) => p.is_async,
            InstanceSource::Delegate(_)
            | InstanceSource::DelegateParameter(_)
            | InstanceSource::Array(_) => false,
        }
    }

    /// Dependency edges in argument order.
    ///
    /// Delegates have none here: their return type is resolved in a new
    /// layer, which the resolution walk handles itself.
    pub fn edges(&self) -> Vec<Edge<'_>> {
        match self {
            InstanceSource::Registration(r) => {
                r.constructor.parameters.iter().map(Edge::Lookup).collect()
            }
            InstanceSource::Factory(f) => vec![Edge::Direct(&f.factory)],
            InstanceSource::FactoryMethod(m) => m.parameters.iter().map(Edge::Lookup).collect(),
            InstanceSource::Decorator(d) => d
                .decorator
                .parameters
                .iter()
                .enumerate()
                .map(|(index, parameter)| {
                    if index == d.decorator.decorated_parameter {
                        Edge::Direct(&d.inner)
                    } else {
                        Edge::Lookup(parameter)
                    }
                })
                .collect(),
            InstanceSource::Array(a) => a.items.iter().map(Edge::Direct).collect(),
            InstanceSource::Delegate(_)
            | InstanceSource::DelegateParameter(_)
            | InstanceSource::InstanceProvider(_) => Vec::new(),
        }
    }

    /// Short name of the variant, for log fields.
    pub fn kind_name(&self) -> &'static str {
        match self {
            InstanceSource::Registration(_) => "registration",
            InstanceSource::Factory(_) => "factory",
            InstanceSource::FactoryMethod(_) => "factory_method",
            InstanceSource::Decorator(_) => "decorator",
            InstanceSource::Delegate(_) => "delegate",
            InstanceSource::DelegateParameter(_) => "delegate_parameter",
            InstanceSource::Array(_) => "array",
            InstanceSource::InstanceProvider(_) => "instance_provider",
        }
    }
}
