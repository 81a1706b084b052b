//! Binding declarations
//!
//! Declarations are what the extraction front end hands the planner: for each
//! declaring entity (a container, or an importable module of bindings) an
//! ordered list of registrations, factory methods, decorators, instance
//! providers and imports, plus the root types a container resolves.
//!
//! # Example
//!
//! ```rust
//! use dependency_planner::{DeclarationSet, Entity, RegisterDeclaration, Scope};
//!
//! let declarations = DeclarationSet::new()
//!     .with(Entity::module("Infrastructure").register(
//!         RegisterDeclaration::new("Database").scope(Scope::SingleInstance),
//!     ))
//!     .with(
//!         Entity::container("App")
//!             .register(RegisterDeclaration::new("Repository").as_type("IRepository"))
//!             .import("Infrastructure")
//!             .resolves("IRepository"),
//!     );
//!
//! assert_eq!(declarations.containers().count(), 1);
//! ```

use crate::{Parameter, Scope, TypeKey};
use ahash::RandomState;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Name of a declaring entity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(Arc<str>);

impl EntityId {
    #[inline]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    #[inline]
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EntityId {
    #[inline]
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&EntityId> for EntityId {
    #[inline]
    fn from(id: &EntityId) -> Self {
        id.clone()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a declaration came from: its entity and its position there.
///
/// Hosts map sites back to source locations when rendering diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclarationSite {
    pub entity: EntityId,
    pub index: usize,
}

impl fmt::Display for DeclarationSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity, self.index)
    }
}

/// A root type a container must be able to produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionRequest {
    pub ty: TypeKey,
    /// Resolved through an async entry point, so async sources may be awaited
    pub is_async: bool,
}

impl ResolutionRequest {
    pub fn new(ty: impl Into<TypeKey>) -> Self {
        Self {
            ty: ty.into(),
            is_async: false,
        }
    }

    pub fn asynchronous(ty: impl Into<TypeKey>) -> Self {
        Self {
            ty: ty.into(),
            is_async: true,
        }
    }
}

/// Register a type, constructed through its constructor, under one or more
/// target types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDeclaration {
    pub ty: TypeKey,
    /// Registered-as types; empty means the type itself
    pub targets: Vec<TypeKey>,
    pub scope: Scope,
    /// Scope of the `T` synthesized when a target is an `IFactory<T>`
    pub factory_target_scope: Scope,
}

impl RegisterDeclaration {
    pub fn new(ty: impl Into<TypeKey>) -> Self {
        Self {
            ty: ty.into(),
            targets: Vec::new(),
            scope: Scope::default(),
            factory_target_scope: Scope::default(),
        }
    }

    /// Add a registered-as type.
    pub fn as_type(mut self, target: impl Into<TypeKey>) -> Self {
        self.targets.push(target.into());
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn factory_target_scope(mut self, scope: Scope) -> Self {
        self.factory_target_scope = scope;
        self
    }

    /// The types this declaration binds.
    pub fn effective_targets(&self) -> Vec<TypeKey> {
        if self.targets.is_empty() {
            vec![self.ty.clone()]
        } else {
            self.targets.clone()
        }
    }
}

/// A method on the declaring entity that produces an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryMethodDeclaration {
    pub name: Arc<str>,
    pub returns: TypeKey,
    pub parameters: Vec<Parameter>,
    pub scope: Scope,
    pub factory_target_scope: Scope,
    /// Returns a task of `returns`
    pub is_async: bool,
}

impl FactoryMethodDeclaration {
    pub fn new(name: impl Into<Arc<str>>, returns: impl Into<TypeKey>) -> Self {
        Self {
            name: name.into(),
            returns: returns.into(),
            parameters: Vec::new(),
            scope: Scope::default(),
            factory_target_scope: Scope::default(),
            is_async: false,
        }
    }

    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn factory_target_scope(mut self, scope: Scope) -> Self {
        self.factory_target_scope = scope;
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }
}

/// A decorator type wrapping every instance of `decorated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorDeclaration {
    pub ty: TypeKey,
    pub decorated: TypeKey,
    /// The decorator takes over disposal of the inner instance
    pub disposes: bool,
}

impl DecoratorDeclaration {
    pub fn new(ty: impl Into<TypeKey>, decorated: impl Into<TypeKey>) -> Self {
        Self {
            ty: ty.into(),
            decorated: decorated.into(),
            disposes: false,
        }
    }

    pub fn disposes(mut self) -> Self {
        self.disposes = true;
        self
    }
}

/// A method wrapping every instance of `decorated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorMethodDeclaration {
    pub name: Arc<str>,
    pub decorated: TypeKey,
    pub parameters: Vec<Parameter>,
    pub is_async: bool,
    pub disposes: bool,
}

impl DecoratorMethodDeclaration {
    pub fn new(name: impl Into<Arc<str>>, decorated: impl Into<TypeKey>) -> Self {
        Self {
            name: name.into(),
            decorated: decorated.into(),
            parameters: Vec::new(),
            is_async: false,
            disposes: false,
        }
    }

    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    pub fn disposes(mut self) -> Self {
        self.disposes = true;
        self
    }
}

/// A member supplying instances of `ty` at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDeclaration {
    pub name: Arc<str>,
    pub ty: TypeKey,
    pub is_async: bool,
}

impl ProviderDeclaration {
    pub fn new(name: impl Into<Arc<str>>, ty: impl Into<TypeKey>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            is_async: false,
        }
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }
}

/// Import every binding of another module, minus `exclusions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDeclaration {
    pub module: EntityId,
    pub exclusions: Vec<TypeKey>,
}

impl ImportDeclaration {
    pub fn new(module: impl Into<EntityId>) -> Self {
        Self {
            module: module.into(),
            exclusions: Vec::new(),
        }
    }

    pub fn except(mut self, ty: impl Into<TypeKey>) -> Self {
        self.exclusions.push(ty.into());
        self
    }
}

/// One declaration on an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Register(RegisterDeclaration),
    FactoryMethod(FactoryMethodDeclaration),
    Decorator(DecoratorDeclaration),
    DecoratorMethod(DecoratorMethodDeclaration),
    Provider(ProviderDeclaration),
    Import(ImportDeclaration),
}

macro_rules! impl_into_declaration {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for Declaration {
                #[inline]
                fn from(declaration: $ty) -> Self {
                    Declaration::$variant(declaration)
                }
            }
        )+
    };
}

impl_into_declaration!(
    Register(RegisterDeclaration),
    FactoryMethod(FactoryMethodDeclaration),
    Decorator(DecoratorDeclaration),
    DecoratorMethod(DecoratorMethodDeclaration),
    Provider(ProviderDeclaration),
    Import(ImportDeclaration),
);

/// Whether an entity can be resolved from or only imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Container,
    Module,
}

/// A declaring entity and everything declared on it.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    declarations: Vec<Declaration>,
    roots: Vec<ResolutionRequest>,
}

impl Entity {
    pub fn container(id: impl Into<EntityId>) -> Self {
        Self::with_kind(id, EntityKind::Container)
    }

    pub fn module(id: impl Into<EntityId>) -> Self {
        Self::with_kind(id, EntityKind::Module)
    }

    fn with_kind(id: impl Into<EntityId>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            kind,
            declarations: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Append any declaration.
    pub fn declare(mut self, declaration: impl Into<Declaration>) -> Self {
        self.declarations.push(declaration.into());
        self
    }

    pub fn register(self, declaration: RegisterDeclaration) -> Self {
        self.declare(declaration)
    }

    pub fn factory_method(self, declaration: FactoryMethodDeclaration) -> Self {
        self.declare(declaration)
    }

    pub fn decorator(self, declaration: DecoratorDeclaration) -> Self {
        self.declare(declaration)
    }

    pub fn decorator_method(self, declaration: DecoratorMethodDeclaration) -> Self {
        self.declare(declaration)
    }

    pub fn provider(self, declaration: ProviderDeclaration) -> Self {
        self.declare(declaration)
    }

    /// Import every binding of `module`.
    pub fn import(self, module: impl Into<EntityId>) -> Self {
        self.declare(ImportDeclaration::new(module))
    }

    /// Import with exclusions.
    pub fn import_with(self, declaration: ImportDeclaration) -> Self {
        self.declare(declaration)
    }

    /// Request a root type through a synchronous entry point.
    pub fn resolves(mut self, ty: impl Into<TypeKey>) -> Self {
        self.roots.push(ResolutionRequest::new(ty));
        self
    }

    /// Request a root type through an async entry point.
    pub fn resolves_async(mut self, ty: impl Into<TypeKey>) -> Self {
        self.roots.push(ResolutionRequest::asynchronous(ty));
        self
    }

    #[inline]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    #[inline]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    #[inline]
    pub fn is_container(&self) -> bool {
        self.kind == EntityKind::Container
    }

    #[inline]
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    #[inline]
    pub fn roots(&self) -> &[ResolutionRequest] {
        &self.roots
    }

    /// Site of the declaration at `index`.
    #[inline]
    pub fn site(&self, index: usize) -> DeclarationSite {
        DeclarationSite {
            entity: self.id.clone(),
            index,
        }
    }
}

/// Every entity of one compilation, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct DeclarationSet {
    entities: IndexMap<EntityId, Entity, RandomState>,
}

impl DeclarationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, replacing one with the same id.
    pub fn insert(&mut self, entity: Entity) {
        self.entities.insert(entity.id.clone(), entity);
    }

    pub fn with(mut self, entity: Entity) -> Self {
        self.insert(entity);
        self
    }

    #[inline]
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn containers(&self) -> impl Iterator<Item = &Entity> {
        self.entities().filter(|entity| entity.is_container())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_targets_default_to_self() {
        let declaration = RegisterDeclaration::new("A");
        assert_eq!(declaration.effective_targets(), vec![TypeKey::from("A")]);

        let declaration = RegisterDeclaration::new("A").as_type("IA").as_type("IB");
        assert_eq!(
            declaration.effective_targets(),
            vec![TypeKey::from("IA"), TypeKey::from("IB")]
        );
    }

    #[test]
    fn test_entity_builder_keeps_order() {
        let entity = Entity::container("C")
            .register(RegisterDeclaration::new("A"))
            .import_with(ImportDeclaration::new("M").except("B"))
            .provider(ProviderDeclaration::new("config", "Config"))
            .resolves("A")
            .resolves_async("B");

        assert!(entity.is_container());
        assert_eq!(entity.declarations().len(), 3);
        assert!(matches!(entity.declarations()[1], Declaration::Import(_)));
        assert_eq!(entity.roots().len(), 2);
        assert!(entity.roots()[1].is_async);
        assert_eq!(entity.site(2).to_string(), "C#2");
    }

    #[test]
    fn test_declaration_set_containers() {
        let set = DeclarationSet::new()
            .with(Entity::module("M"))
            .with(Entity::container("C1"))
            .with(Entity::container("C2"));

        let names: Vec<_> = set.containers().map(|c| c.id().name().to_string()).collect();
        assert_eq!(names, vec!["C1", "C2"]);
        assert_eq!(set.len(), 3);
    }
}
