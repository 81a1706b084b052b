//! Binding tables
//!
//! A [`BindingTable`] is the flattened set of bindings a container or module
//! contributes: its own registrations, factory methods, decorators and
//! instance providers plus everything its imports bring in. Tables are built
//! once per entity and cached in a [`BindingCache`].

use crate::{
    Constructor, Declaration, DeclarationSet, DeclarationSite, Decorator, DecoratorDeclaration,
    DecoratorKind, DecoratorMethodDeclaration, Diagnostic, DiagnosticKind, Diagnostics, Disposal,
    Entity, EntityId, FactoryMethod, FactoryMethodDeclaration, FactorySource, ImportDeclaration,
    Initialization, InstanceProvider, InstanceSource, Parameter, ProviderDeclaration,
    RegisterDeclaration, Registration, Scope, TypeCatalog, TypeInfo, TypeKey, TypeKind,
};
use ahash::RandomState;
use dashmap::DashMap;
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// A source bound to a type, and the declaration that bound it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub source: Arc<InstanceSource>,
    pub site: DeclarationSite,
}

/// A decorator bound to the type it wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorBinding {
    pub decorator: Arc<Decorator>,
    pub site: DeclarationSite,
}

/// Flattened bindings of one declaring entity.
#[derive(Debug)]
pub struct BindingTable {
    entity: EntityId,
    bindings: IndexMap<TypeKey, Binding, RandomState>,
    decorators: IndexMap<TypeKey, Vec<DecoratorBinding>, RandomState>,
    providers: IndexMap<TypeKey, Vec<Binding>, RandomState>,
    diagnostics: Vec<Diagnostic>,
    /// False when an import was cut short by recursion
    complete: bool,
}

impl BindingTable {
    #[inline]
    pub fn entity(&self) -> &EntityId {
        &self.entity
    }

    /// The binding for `ty`, if one survived table construction.
    #[inline]
    pub fn get(&self, ty: &TypeKey) -> Option<&Binding> {
        self.bindings.get(ty)
    }

    #[inline]
    pub fn contains(&self, ty: &TypeKey) -> bool {
        self.bindings.contains_key(ty)
    }

    /// Every binding: direct ones in declaration order, then imported ones.
    pub fn bindings(&self) -> impl Iterator<Item = (&TypeKey, &Binding)> {
        self.bindings.iter()
    }

    /// Decorators of `ty`, innermost first.
    pub fn decorators_for(&self, ty: &TypeKey) -> &[DecoratorBinding] {
        self.decorators.get(ty).map_or(&[], Vec::as_slice)
    }

    pub fn decorators(&self) -> impl Iterator<Item = (&TypeKey, &[DecoratorBinding])> {
        self.decorators.iter().map(|(ty, list)| (ty, list.as_slice()))
    }

    /// Instance providers of `ty`.
    pub fn providers_for(&self, ty: &TypeKey) -> &[Binding] {
        self.providers.get(ty).map_or(&[], Vec::as_slice)
    }

    /// Whether the declaration behind `binding` is also bound as `ty`.
    pub fn binds_as(&self, ty: &TypeKey, binding: &Binding) -> bool {
        let same = |other: &Binding| {
            other.site == binding.site
                && other.source.produced_type() == binding.source.produced_type()
        };
        self.providers_for(ty).iter().any(same) || self.get(ty).is_some_and(same)
    }

    pub fn providers(&self) -> impl Iterator<Item = (&TypeKey, &[Binding])> {
        self.providers.iter().map(|(ty, list)| (ty, list.as_slice()))
    }

    /// Problems found while building this table and the tables it imports.
    #[inline]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[inline]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

// =============================================================================
// Cache
// =============================================================================

/// Concurrent per-entity cache of built tables.
///
/// Tables are computed outside the map and inserted with `entry().or_insert`,
/// so two threads racing on the same entity agree on whichever table landed
/// first and no shard lock is held while a table recurses into its imports.
pub struct BindingCache {
    tables: DashMap<EntityId, Arc<BindingTable>, RandomState>,
}

impl BindingCache {
    #[inline]
    pub fn new() -> Self {
        Self {
            tables: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
        }
    }

    #[inline]
    pub fn get(&self, entity: &EntityId) -> Option<Arc<BindingTable>> {
        self.tables.get(entity).map(|table| Arc::clone(table.value()))
    }

    /// Insert unless present; returns the table that is cached afterwards.
    pub(crate) fn insert(&self, entity: EntityId, table: Arc<BindingTable>) -> Arc<BindingTable> {
        Arc::clone(self.tables.entry(entity).or_insert(table).value())
    }

    #[inline]
    pub fn contains(&self, entity: &EntityId) -> bool {
        self.tables.contains_key(entity)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

}

impl Default for BindingCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BindingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingCache")
            .field("tables", &self.tables.len())
            .finish()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds binding tables, consulting and filling a cache.
pub(crate) struct TableBuilder<'a> {
    catalog: &'a TypeCatalog,
    declarations: &'a DeclarationSet,
    cache: &'a BindingCache,
}

/// Bindings collected from one entity's own declarations.
#[derive(Default)]
struct Direct {
    bindings: IndexMap<TypeKey, Binding, RandomState>,
    /// `T` of every bound `IFactory<T>`, added after all declarations
    synthesized: Vec<(TypeKey, Binding)>,
    decorators: Vec<(TypeKey, DecoratorBinding)>,
    providers: IndexMap<TypeKey, Vec<Binding>, RandomState>,
}

impl Direct {
    fn bind(&mut self, ty: TypeKey, binding: Binding, diagnostics: &mut Diagnostics) {
        if self.bindings.contains_key(&ty) {
            diagnostics.report(
                Diagnostic::new(DiagnosticKind::DuplicateRegistration { ty }).at(binding.site),
            );
        } else {
            self.bindings.insert(ty, binding);
        }
    }
}

/// Winner of an imported target, kept until a conflicting import shows up.
struct Imported {
    binding: Binding,
    import: DeclarationSite,
    module: EntityId,
}

impl<'a> TableBuilder<'a> {
    pub(crate) fn new(
        catalog: &'a TypeCatalog,
        declarations: &'a DeclarationSet,
        cache: &'a BindingCache,
    ) -> Self {
        Self {
            catalog,
            declarations,
            cache,
        }
    }

    /// Table for `entity`, or `None` if no such entity is declared.
    pub(crate) fn build(&self, entity: &EntityId) -> Option<Arc<BindingTable>> {
        self.table(entity, &mut Vec::new())
    }

    fn table(&self, entity: &EntityId, stack: &mut Vec<EntityId>) -> Option<Arc<BindingTable>> {
        if let Some(table) = self.cache.get(entity) {
            #[cfg(feature = "logging")]
            trace!(
                target: "dependency_planner",
                entity = entity.name(),
                "Binding table served from cache"
            );
            return Some(table);
        }

        let declared = self.declarations.get(entity)?;
        stack.push(entity.clone());
        let table = Arc::new(self.compute(declared, stack));
        stack.pop();

        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_planner",
            entity = entity.name(),
            bindings = table.len(),
            diagnostics = table.diagnostics().len(),
            complete = table.complete,
            "Built binding table"
        );

        if table.complete {
            Some(self.cache.insert(entity.clone(), table))
        } else {
            Some(table)
        }
    }

    fn compute(&self, entity: &Entity, stack: &mut Vec<EntityId>) -> BindingTable {
        let mut diagnostics = Diagnostics::new();
        let mut direct = Direct::default();
        let mut imports = Vec::new();

        for (index, declaration) in entity.declarations().iter().enumerate() {
            let site = entity.site(index);
            match declaration {
                Declaration::Register(d) => {
                    self.register(d, site, &mut direct, &mut diagnostics)
                }
                Declaration::FactoryMethod(d) => {
                    self.factory_method(entity.id(), d, site, &mut direct, &mut diagnostics)
                }
                Declaration::Decorator(d) => {
                    self.decorator(d, site, &mut direct, &mut diagnostics)
                }
                Declaration::DecoratorMethod(d) => {
                    self.decorator_method(entity.id(), d, site, &mut direct, &mut diagnostics)
                }
                Declaration::Provider(d) => {
                    self.provider(entity.id(), d, site, &mut direct, &mut diagnostics)
                }
                Declaration::Import(d) => imports.push((site, d)),
            }
        }

        for (ty, binding) in std::mem::take(&mut direct.synthesized) {
            direct.bind(ty, binding, &mut diagnostics);
        }

        let mut table = BindingTable {
            entity: entity.id().clone(),
            bindings: direct.bindings,
            decorators: IndexMap::default(),
            providers: direct.providers,
            diagnostics: Vec::new(),
            complete: true,
        };

        let imported_decorators = self.merge_imports(&mut table, &imports, stack, &mut diagnostics);

        for (ty, decorator) in imported_decorators.into_iter().chain(direct.decorators) {
            table.decorators.entry(ty).or_default().push(decorator);
        }

        table.diagnostics = diagnostics.into_vec();
        table
    }

    // -------------------------------------------------------------------------
    // Direct declarations
    // -------------------------------------------------------------------------

    /// Catalog entry for a type that may be bound, reporting why not otherwise.
    fn registerable(
        &self,
        ty: &TypeKey,
        site: &DeclarationSite,
        diagnostics: &mut Diagnostics,
    ) -> Option<&'a TypeInfo> {
        let info = match self.catalog.get(ty) {
            Some(info) if info.is_registerable() => info,
            _ => {
                diagnostics.report(
                    Diagnostic::new(DiagnosticKind::InvalidType { ty: ty.clone() }).at(site.clone()),
                );
                return None;
            }
        };
        if !info.is_public() {
            diagnostics.report(
                Diagnostic::new(DiagnosticKind::TypeNotPublic { ty: ty.clone() }).at(site.clone()),
            );
            return None;
        }
        Some(info)
    }

    /// Pick the constructor a registration builds through.
    ///
    /// With several public constructors, the single one taking parameters
    /// wins. If all of them are parameterless the first is used.
    fn select_constructor(
        &self,
        info: &'a TypeInfo,
        site: &DeclarationSite,
        diagnostics: &mut Diagnostics,
    ) -> Option<&'a Constructor> {
        let public: Vec<&Constructor> = info.constructors().iter().filter(|c| c.is_public).collect();
        match public.as_slice() {
            [] => {
                diagnostics.report(
                    Diagnostic::new(DiagnosticKind::NoConstructor {
                        ty: info.key().clone(),
                    })
                    .at(site.clone()),
                );
                None
            }
            [only] => Some(*only),
            candidates => {
                let mut with_parameters = candidates.iter().filter(|c| !c.is_default());
                match (with_parameters.next(), with_parameters.next()) {
                    (Some(chosen), None) => Some(*chosen),
                    (Some(_), Some(_)) => {
                        diagnostics.report(
                            Diagnostic::new(DiagnosticKind::MultipleConstructors {
                                ty: info.key().clone(),
                            })
                            .at(site.clone()),
                        );
                        None
                    }
                    (None, _) => {
                        #[cfg(feature = "logging")]
                        debug!(
                            target: "dependency_planner",
                            ty = info.key().name(),
                            candidates = candidates.len(),
                            "Several parameterless constructors; using the first"
                        );
                        Some(candidates[0])
                    }
                }
            }
        }
    }

    fn reject_struct_singleton(
        &self,
        ty: &TypeKey,
        scope: Scope,
        site: &DeclarationSite,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        if scope == Scope::SingleInstance && self.catalog.is_value_type(ty) {
            diagnostics.report(
                Diagnostic::new(DiagnosticKind::StructSingleInstance { ty: ty.clone() })
                    .at(site.clone()),
            );
            return true;
        }
        false
    }

    /// If `target` is a factory type, queue a binding for the type it creates.
    fn bind_factory_target(
        &self,
        target: &TypeKey,
        factory: &Arc<InstanceSource>,
        scope: Scope,
        site: &DeclarationSite,
        direct: &mut Direct,
        diagnostics: &mut Diagnostics,
    ) {
        let Some(TypeKind::Factory {
            target: created,
            is_async,
        }) = self.catalog.kind(target)
        else {
            return;
        };
        if self.registerable(created, site, diagnostics).is_none()
            || self.reject_struct_singleton(created, scope, site, diagnostics)
        {
            return;
        }
        let source = InstanceSource::Factory(FactorySource {
            factory_of: created.clone(),
            factory: Arc::clone(factory),
            scope,
            is_async: *is_async,
        });
        direct.synthesized.push((
            created.clone(),
            Binding {
                source: Arc::new(source),
                site: site.clone(),
            },
        ));
    }

    fn register(
        &self,
        declaration: &RegisterDeclaration,
        site: DeclarationSite,
        direct: &mut Direct,
        diagnostics: &mut Diagnostics,
    ) {
        let Some(info) = self.registerable(&declaration.ty, &site, diagnostics) else {
            return;
        };
        let Some(constructor) = self.select_constructor(info, &site, diagnostics) else {
            return;
        };
        if self.reject_struct_singleton(&declaration.ty, declaration.scope, &site, diagnostics) {
            return;
        }

        for target in declaration.effective_targets() {
            if target != declaration.ty {
                if self.registerable(&target, &site, diagnostics).is_none() {
                    continue;
                }
                if !self.catalog.is_convertible(&declaration.ty, &target) {
                    diagnostics.report(
                        Diagnostic::new(DiagnosticKind::NoSuitableConversion {
                            from: declaration.ty.clone(),
                            to: target,
                        })
                        .at(site.clone()),
                    );
                    continue;
                }
            }

            let source = Arc::new(InstanceSource::Registration(Registration {
                ty: declaration.ty.clone(),
                registered_as: target.clone(),
                scope: declaration.scope,
                initialization: info.initialization(),
                disposal: info.disposal(),
                constructor: constructor.clone(),
            }));
            self.bind_factory_target(
                &target,
                &source,
                declaration.factory_target_scope,
                &site,
                direct,
                diagnostics,
            );
            direct.bind(
                target,
                Binding {
                    source,
                    site: site.clone(),
                },
                diagnostics,
            );
        }
    }

    fn factory_method(
        &self,
        owner: &EntityId,
        declaration: &FactoryMethodDeclaration,
        site: DeclarationSite,
        direct: &mut Direct,
        diagnostics: &mut Diagnostics,
    ) {
        let returns = &declaration.returns;
        if self.registerable(returns, &site, diagnostics).is_none()
            || self.reject_struct_singleton(returns, declaration.scope, &site, diagnostics)
        {
            return;
        }

        let source = Arc::new(InstanceSource::FactoryMethod(FactoryMethod {
            owner: owner.clone(),
            name: Arc::clone(&declaration.name),
            returns: returns.clone(),
            parameters: declaration.parameters.clone(),
            scope: declaration.scope,
            is_async: declaration.is_async,
        }));
        self.bind_factory_target(
            returns,
            &source,
            declaration.factory_target_scope,
            &site,
            direct,
            diagnostics,
        );
        direct.bind(returns.clone(), Binding { source, site }, diagnostics);
    }

    fn decorated_parameter(
        &self,
        name: &str,
        decorated: &TypeKey,
        parameters: &[Parameter],
        site: &DeclarationSite,
        diagnostics: &mut Diagnostics,
    ) -> Option<usize> {
        let index = parameters.iter().position(|p| &p.ty == decorated);
        if index.is_none() {
            diagnostics.report(
                Diagnostic::new(DiagnosticKind::InvalidDecorator {
                    decorator: Arc::from(name),
                    decorated: decorated.clone(),
                })
                .at(site.clone()),
            );
        }
        index
    }

    fn decorator(
        &self,
        declaration: &DecoratorDeclaration,
        site: DeclarationSite,
        direct: &mut Direct,
        diagnostics: &mut Diagnostics,
    ) {
        let Some(info) = self.registerable(&declaration.ty, &site, diagnostics) else {
            return;
        };
        if self.registerable(&declaration.decorated, &site, diagnostics).is_none() {
            return;
        }
        let Some(constructor) = self.select_constructor(info, &site, diagnostics) else {
            return;
        };
        let Some(decorated_parameter) = self.decorated_parameter(
            declaration.ty.name(),
            &declaration.decorated,
            &constructor.parameters,
            &site,
            diagnostics,
        ) else {
            return;
        };
        if !self.catalog.is_convertible(&declaration.ty, &declaration.decorated) {
            diagnostics.report(
                Diagnostic::new(DiagnosticKind::NoSuitableConversion {
                    from: declaration.ty.clone(),
                    to: declaration.decorated.clone(),
                })
                .at(site),
            );
            return;
        }

        let decorator = Decorator {
            kind: DecoratorKind::Type {
                ty: declaration.ty.clone(),
            },
            decorated: declaration.decorated.clone(),
            parameters: constructor.parameters.clone(),
            decorated_parameter,
            is_async: info.initialization() == Initialization::Async,
            disposes: declaration.disposes,
            disposal: info.disposal(),
        };
        direct.decorators.push((
            declaration.decorated.clone(),
            DecoratorBinding {
                decorator: Arc::new(decorator),
                site,
            },
        ));
    }

    fn decorator_method(
        &self,
        owner: &EntityId,
        declaration: &DecoratorMethodDeclaration,
        site: DeclarationSite,
        direct: &mut Direct,
        diagnostics: &mut Diagnostics,
    ) {
        let Some(decorated) = self.registerable(&declaration.decorated, &site, diagnostics) else {
            return;
        };
        // The returned instance is only the container's to dispose when flagged
        let disposal = if declaration.disposes {
            decorated.disposal()
        } else {
            Disposal::None
        };
        let Some(decorated_parameter) = self.decorated_parameter(
            &declaration.name,
            &declaration.decorated,
            &declaration.parameters,
            &site,
            diagnostics,
        ) else {
            return;
        };

        let decorator = Decorator {
            kind: DecoratorKind::Method {
                owner: owner.clone(),
                name: Arc::clone(&declaration.name),
            },
            decorated: declaration.decorated.clone(),
            parameters: declaration.parameters.clone(),
            decorated_parameter,
            is_async: declaration.is_async,
            disposes: declaration.disposes,
            disposal,
        };
        direct.decorators.push((
            declaration.decorated.clone(),
            DecoratorBinding {
                decorator: Arc::new(decorator),
                site,
            },
        ));
    }

    fn provider(
        &self,
        owner: &EntityId,
        declaration: &ProviderDeclaration,
        site: DeclarationSite,
        direct: &mut Direct,
        diagnostics: &mut Diagnostics,
    ) {
        if self.registerable(&declaration.ty, &site, diagnostics).is_none() {
            return;
        }
        let source = InstanceSource::InstanceProvider(InstanceProvider {
            owner: owner.clone(),
            name: Arc::clone(&declaration.name),
            ty: declaration.ty.clone(),
            is_async: declaration.is_async,
        });
        direct
            .providers
            .entry(declaration.ty.clone())
            .or_default()
            .push(Binding {
                source: Arc::new(source),
                site,
            });
    }

    // -------------------------------------------------------------------------
    // Imports
    // -------------------------------------------------------------------------

    /// Add imported bindings not shadowed by direct ones; returns imported
    /// decorators in import order.
    fn merge_imports(
        &self,
        table: &mut BindingTable,
        imports: &[(DeclarationSite, &ImportDeclaration)],
        stack: &mut Vec<EntityId>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<(TypeKey, DecoratorBinding)> {
        let mut merged: IndexMap<TypeKey, Imported, RandomState> = IndexMap::default();
        let mut contested: IndexMap<TypeKey, IndexSet<DeclarationSite>, RandomState> =
            IndexMap::default();
        let mut decorators = Vec::new();
        let mut decorator_sites: IndexSet<DeclarationSite, RandomState> = IndexSet::default();

        for (site, import) in imports {
            if stack.contains(&import.module) {
                diagnostics.report(
                    Diagnostic::new(DiagnosticKind::RecursiveImport {
                        module: import.module.clone(),
                    })
                    .at(site.clone()),
                );
                table.complete = false;
                continue;
            }
            let Some(imported) = self.table(&import.module, stack) else {
                diagnostics.report(
                    Diagnostic::new(DiagnosticKind::UnknownImport {
                        module: import.module.clone(),
                    })
                    .at(site.clone()),
                );
                continue;
            };

            table.complete &= imported.complete;
            diagnostics.extend(imported.diagnostics());

            for (ty, binding) in imported.bindings() {
                if import.exclusions.contains(ty) || table.bindings.contains_key(ty) {
                    continue;
                }
                if let Some(reported) = contested.get_mut(ty) {
                    if reported.insert(site.clone()) {
                        diagnostics.report(conflict(ty, &import.module, site));
                    }
                    continue;
                }
                match merged.get(ty) {
                    None => {
                        merged.insert(
                            ty.clone(),
                            Imported {
                                binding: binding.clone(),
                                import: site.clone(),
                                module: import.module.clone(),
                            },
                        );
                    }
                    // Same binding reached through two paths
                    Some(existing) if &existing.binding == binding => {}
                    Some(_) => {
                        let Some(existing) = merged.shift_remove(ty) else {
                            continue;
                        };
                        diagnostics.report(conflict(ty, &existing.module, &existing.import));
                        diagnostics.report(conflict(ty, &import.module, site));
                        let sites = contested.entry(ty.clone()).or_default();
                        sites.insert(existing.import);
                        sites.insert(site.clone());
                    }
                }
            }

            for (ty, list) in imported.decorators() {
                if import.exclusions.contains(ty) {
                    continue;
                }
                for decorator in list {
                    if decorator_sites.insert(decorator.site.clone()) {
                        decorators.push((ty.clone(), decorator.clone()));
                    }
                }
            }
        }

        for (ty, imported) in merged {
            table.bindings.insert(ty, imported.binding);
        }
        decorators
    }
}

fn conflict(ty: &TypeKey, module: &EntityId, site: &DeclarationSite) -> Diagnostic {
    #[cfg(feature = "logging")]
    debug!(
        target: "dependency_planner",
        ty = ty.name(),
        module = module.name(),
        "Conflicting import"
    );

    Diagnostic::new(DiagnosticKind::ConflictingImport {
        ty: ty.clone(),
        module: module.clone(),
    })
    .at(site.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiagnosticCode, ImportDeclaration, Parameter, TypeInfo};

    fn build(catalog: &TypeCatalog, declarations: &DeclarationSet, entity: &str) -> Arc<BindingTable> {
        let cache = BindingCache::new();
        TableBuilder::new(catalog, declarations, &cache)
            .build(&entity.into())
            .expect("entity is declared")
    }

    fn codes(table: &BindingTable) -> Vec<DiagnosticCode> {
        table.diagnostics().iter().map(Diagnostic::code).collect()
    }

    fn catalog() -> TypeCatalog {
        TypeCatalog::new()
            .with(TypeInfo::interface("IService"))
            .with(TypeInfo::class("A").implements("IService"))
            .with(TypeInfo::class("B").implements("IService"))
            .with(TypeInfo::class("C"))
            .with(TypeInfo::structure("Point"))
    }

    #[test]
    fn test_register_under_several_targets() {
        let catalog = catalog();
        let declarations = DeclarationSet::new().with(
            Entity::container("App").register(RegisterDeclaration::new("A").as_type("A").as_type("IService")),
        );
        let table = build(&catalog, &declarations, "App");

        assert_eq!(table.len(), 2);
        let binding = table.get(&"IService".into()).unwrap();
        assert_eq!(binding.source.produced_type(), &TypeKey::from("A"));
        assert_eq!(binding.site.to_string(), "App#0");
        assert!(table.diagnostics().is_empty());
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let catalog = catalog();
        let declarations = DeclarationSet::new().with(
            Entity::container("App")
                .register(RegisterDeclaration::new("A").as_type("IService"))
                .register(RegisterDeclaration::new("B").as_type("IService")),
        );
        let table = build(&catalog, &declarations, "App");

        assert_eq!(codes(&table), vec![DiagnosticCode::DuplicateRegistration]);
        assert_eq!(
            table.diagnostics()[0].site().map(|s| s.index),
            Some(1)
        );
        let binding = table.get(&"IService".into()).unwrap();
        assert_eq!(binding.source.produced_type(), &TypeKey::from("A"));
    }

    #[test]
    fn test_registration_validation() {
        let catalog = catalog()
            .with(TypeInfo::class("Hidden").internal())
            .with(TypeInfo::class("Sealed").without_constructors())
            .with(
                TypeInfo::class("Busy")
                    .constructor([Parameter::required("A")])
                    .with_constructor(Constructor::new([Parameter::required("B")])),
            )
            .with(TypeInfo::error("Broken"));
        let declarations = DeclarationSet::new().with(
            Entity::container("App")
                .register(RegisterDeclaration::new("Hidden"))
                .register(RegisterDeclaration::new("Sealed"))
                .register(RegisterDeclaration::new("Busy"))
                .register(RegisterDeclaration::new("Broken"))
                .register(RegisterDeclaration::new("C").as_type("IService"))
                .register(RegisterDeclaration::new("Point").scope(Scope::SingleInstance)),
        );
        let table = build(&catalog, &declarations, "App");

        assert_eq!(
            codes(&table),
            vec![
                DiagnosticCode::TypeNotPublic,
                DiagnosticCode::NoConstructor,
                DiagnosticCode::MultipleConstructors,
                DiagnosticCode::InvalidType,
                DiagnosticCode::NoSuitableConversion,
                DiagnosticCode::StructSingleInstance,
            ]
        );
        assert!(table.is_empty());
    }

    #[test]
    fn test_constructor_with_parameters_preferred() {
        let catalog = TypeCatalog::new().with(TypeInfo::class("C")).with(
            TypeInfo::class("A")
                .constructor(Vec::new())
                .with_constructor(Constructor::new([Parameter::required("C")])),
        );
        let declarations =
            DeclarationSet::new().with(Entity::container("App").register(RegisterDeclaration::new("A")));
        let table = build(&catalog, &declarations, "App");

        let binding = table.get(&"A".into()).unwrap();
        let InstanceSource::Registration(registration) = binding.source.as_ref() else {
            panic!("expected a registration");
        };
        assert_eq!(registration.constructor.parameters.len(), 1);
    }

    #[test]
    fn test_factory_target_is_synthesized() {
        let catalog = catalog()
            .with(TypeInfo::factory("IFactory<C>", "C"))
            .with(TypeInfo::class("CFactory").implements("IFactory<C>"));
        let declarations = DeclarationSet::new().with(
            Entity::container("App").register(
                RegisterDeclaration::new("CFactory")
                    .as_type("IFactory<C>")
                    .factory_target_scope(Scope::InstancePerDependency),
            ),
        );
        let table = build(&catalog, &declarations, "App");

        let binding = table.get(&"C".into()).unwrap();
        let InstanceSource::Factory(factory) = binding.source.as_ref() else {
            panic!("expected a factory source");
        };
        assert_eq!(factory.scope, Scope::InstancePerDependency);
        assert_eq!(factory.factory.of_type(), &TypeKey::from("IFactory<C>"));
    }

    #[test]
    fn test_factory_target_conflicts_with_direct_binding() {
        let catalog = catalog()
            .with(TypeInfo::factory("IFactory<C>", "C"))
            .with(TypeInfo::class("CFactory").implements("IFactory<C>"));
        let declarations = DeclarationSet::new().with(
            Entity::container("App")
                .register(RegisterDeclaration::new("CFactory").as_type("IFactory<C>"))
                .register(RegisterDeclaration::new("C")),
        );
        let table = build(&catalog, &declarations, "App");

        assert_eq!(codes(&table), vec![DiagnosticCode::DuplicateRegistration]);
        assert!(matches!(
            table.get(&"C".into()).unwrap().source.as_ref(),
            InstanceSource::Registration(_)
        ));
    }

    #[test]
    fn test_direct_binding_shadows_import() {
        let catalog = catalog();
        let declarations = DeclarationSet::new()
            .with(Entity::module("M").register(RegisterDeclaration::new("B").as_type("IService")))
            .with(
                Entity::container("App")
                    .register(RegisterDeclaration::new("A").as_type("IService"))
                    .import("M"),
            );
        let table = build(&catalog, &declarations, "App");

        assert!(table.diagnostics().is_empty());
        let binding = table.get(&"IService".into()).unwrap();
        assert_eq!(binding.source.produced_type(), &TypeKey::from("A"));
    }

    #[test]
    fn test_conflicting_imports_drop_the_target() {
        let catalog = catalog();
        let declarations = DeclarationSet::new()
            .with(Entity::module("M1").register(RegisterDeclaration::new("A").as_type("IService")))
            .with(Entity::module("M2").register(RegisterDeclaration::new("B").as_type("IService")))
            .with(Entity::container("App").import("M1").import("M2"));
        let table = build(&catalog, &declarations, "App");

        assert!(!table.contains(&"IService".into()));
        assert_eq!(
            codes(&table),
            vec![DiagnosticCode::ConflictingImport, DiagnosticCode::ConflictingImport]
        );
        let sites: Vec<_> = table
            .diagnostics()
            .iter()
            .filter_map(|d| d.site().map(|s| s.index))
            .collect();
        assert_eq!(sites, vec![0, 1]);
    }

    #[test]
    fn test_exclusion_resolves_conflict() {
        let catalog = catalog();
        let declarations = DeclarationSet::new()
            .with(Entity::module("M1").register(RegisterDeclaration::new("A").as_type("IService")))
            .with(Entity::module("M2").register(RegisterDeclaration::new("B").as_type("IService")))
            .with(
                Entity::container("App")
                    .import("M1")
                    .import_with(ImportDeclaration::new("M2").except("IService")),
            );
        let table = build(&catalog, &declarations, "App");

        assert!(table.diagnostics().is_empty());
        let binding = table.get(&"IService".into()).unwrap();
        assert_eq!(binding.source.produced_type(), &TypeKey::from("A"));
    }

    #[test]
    fn test_diamond_import_is_not_a_conflict() {
        let catalog = catalog();
        let declarations = DeclarationSet::new()
            .with(Entity::module("Base").register(RegisterDeclaration::new("C")))
            .with(Entity::module("Left").import("Base"))
            .with(Entity::module("Right").import("Base"))
            .with(Entity::container("App").import("Left").import("Right"));
        let table = build(&catalog, &declarations, "App");

        assert!(table.diagnostics().is_empty());
        assert!(table.contains(&"C".into()));
    }

    #[test]
    fn test_recursive_import_is_reported_and_not_cached() {
        let catalog = catalog();
        let declarations = DeclarationSet::new()
            .with(Entity::module("M1").register(RegisterDeclaration::new("A")).import("M2"))
            .with(Entity::module("M2").register(RegisterDeclaration::new("C")).import("M1"));
        let cache = BindingCache::new();
        let table = TableBuilder::new(&catalog, &declarations, &cache)
            .build(&"M1".into())
            .unwrap();

        assert!(!table.is_complete());
        assert!(table.contains(&"C".into()));
        assert!(codes(&table).contains(&DiagnosticCode::RecursiveImport));
        assert!(!cache.contains(&"M1".into()));
    }

    #[test]
    fn test_unknown_import() {
        let catalog = catalog();
        let declarations = DeclarationSet::new().with(Entity::container("App").import("Missing"));
        let table = build(&catalog, &declarations, "App");
        assert_eq!(codes(&table), vec![DiagnosticCode::UnknownImport]);
    }

    #[test]
    fn test_decorators_imported_first() {
        let catalog = catalog()
            .with(
                TypeInfo::class("Logged")
                    .implements("IService")
                    .constructor([Parameter::required("IService")]),
            )
            .with(
                TypeInfo::class("Timed")
                    .implements("IService")
                    .constructor([Parameter::required("IService")]),
            );
        let declarations = DeclarationSet::new()
            .with(Entity::module("M").decorator(DecoratorDeclaration::new("Logged", "IService")))
            .with(
                Entity::container("App")
                    .decorator(DecoratorDeclaration::new("Timed", "IService"))
                    .import("M"),
            );
        let table = build(&catalog, &declarations, "App");

        let order: Vec<_> = table
            .decorators_for(&"IService".into())
            .iter()
            .map(|d| d.site.entity.name().to_string())
            .collect();
        assert_eq!(order, vec!["M", "App"]);
    }

    #[test]
    fn test_decorator_without_decorated_parameter() {
        let catalog = catalog().with(TypeInfo::class("Wrapper").implements("IService"));
        let declarations = DeclarationSet::new().with(
            Entity::container("App")
                .decorator(DecoratorDeclaration::new("Wrapper", "IService"))
                .decorator_method(DecoratorMethodDeclaration::new("wrap", "IService")),
        );
        let table = build(&catalog, &declarations, "App");
        assert_eq!(
            codes(&table),
            vec![DiagnosticCode::InvalidDecorator, DiagnosticCode::InvalidDecorator]
        );
    }

    #[test]
    fn test_providers_are_kept_apart() {
        let catalog = catalog();
        let declarations = DeclarationSet::new().with(
            Entity::container("App")
                .provider(ProviderDeclaration::new("first", "C"))
                .provider(ProviderDeclaration::new("second", "C")),
        );
        let table = build(&catalog, &declarations, "App");

        assert!(table.is_empty());
        assert_eq!(table.providers_for(&"C".into()).len(), 2);
    }

    #[test]
    fn test_cache_is_idempotent() {
        let catalog = catalog();
        let declarations =
            DeclarationSet::new().with(Entity::container("App").register(RegisterDeclaration::new("C")));
        let cache = BindingCache::new();
        let builder = TableBuilder::new(&catalog, &declarations, &cache);

        let first = builder.build(&"App".into()).unwrap();
        let second = builder.build(&"App".into()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(builder.build(&"Nope".into()).is_none());
    }
}
