//! Scope chain
//!
//! Lookups walk a stack of layers from the innermost outwards. The outermost
//! layer is always the container's binding table; every delegate being built
//! pushes a layer holding its parameters. Layers live on the stack of the
//! resolution walk and link to their parent by reference.

use crate::{
    ArraySource, BindingTable, DeclarationSite, DecoratorSource, DelegateParameter,
    DelegateSource, InstanceSource, ResolutionId, TypeCatalog, TypeKey, TypeKind,
};
use ahash::RandomState;
use indexmap::IndexSet;
use std::sync::Arc;

/// Outcome of looking a type up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Arc<InstanceSource>),
    Missing,
    /// More than one source at the same layer; carries the count
    Ambiguous(usize),
}

#[derive(Debug, Clone, Copy)]
enum Layer<'a> {
    Container,
    Delegate {
        delegate: &'a DelegateSource,
        owner: ResolutionId,
    },
}

/// One layer of the chain and a link to the layer enclosing it.
#[derive(Debug, Clone, Copy)]
pub struct ScopeChain<'a> {
    catalog: &'a TypeCatalog,
    table: &'a BindingTable,
    layer: Layer<'a>,
    parent: Option<&'a ScopeChain<'a>>,
}

impl<'a> ScopeChain<'a> {
    /// Chain with only the container layer.
    pub fn new(catalog: &'a TypeCatalog, table: &'a BindingTable) -> Self {
        Self {
            catalog,
            table,
            layer: Layer::Container,
            parent: None,
        }
    }

    /// Push a delegate's parameters on top of `parent`.
    pub fn delegate(
        parent: &'a ScopeChain<'a>,
        delegate: &'a DelegateSource,
        owner: ResolutionId,
    ) -> Self {
        Self {
            catalog: parent.catalog,
            table: parent.table,
            layer: Layer::Delegate { delegate, owner },
            parent: Some(parent),
        }
    }

    /// The container layer, with every delegate layer stripped.
    pub fn root(&self) -> &ScopeChain<'a> {
        let mut current = self;
        while let Some(parent) = current.parent {
            current = parent;
        }
        current
    }

    /// Number of delegate layers above the container.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let Some(parent) = current.parent {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Find the source for `ty`, innermost layer first.
    ///
    /// Delegate and array types nobody bound are synthesized. Every source
    /// except a delegate parameter is wrapped in the decorators of `ty`.
    pub fn lookup(&self, ty: &TypeKey) -> Lookup {
        let mut current = Some(self);
        while let Some(chain) = current {
            match chain.find_in_layer(ty) {
                Lookup::Missing => current = chain.parent,
                found => return found,
            }
        }
        self.synthesize(ty)
    }

    fn find_in_layer(&self, ty: &TypeKey) -> Lookup {
        match self.layer {
            Layer::Delegate { delegate, owner } => {
                let mut matching = delegate
                    .parameters
                    .iter()
                    .enumerate()
                    .filter(|(_, parameter)| &parameter.ty == ty);
                match (matching.next(), matching.count()) {
                    (None, _) => Lookup::Missing,
                    (Some((index, _)), 0) => {
                        Lookup::Found(Arc::new(InstanceSource::DelegateParameter(
                            DelegateParameter {
                                delegate: delegate.delegate.clone(),
                                index,
                                ty: ty.clone(),
                                owner,
                            },
                        )))
                    }
                    (Some(_), rest) => Lookup::Ambiguous(rest + 1),
                }
            }
            Layer::Container => match self.table.providers_for(ty) {
                [] => match self.table.get(ty) {
                    Some(binding) => Lookup::Found(self.decorate(ty, Arc::clone(&binding.source))),
                    None => Lookup::Missing,
                },
                [provider] => Lookup::Found(self.decorate(ty, Arc::clone(&provider.source))),
                providers => Lookup::Ambiguous(providers.len()),
            },
        }
    }

    fn synthesize(&self, ty: &TypeKey) -> Lookup {
        let source = match self.catalog.kind(ty) {
            Some(TypeKind::Delegate(signature)) => InstanceSource::Delegate(DelegateSource {
                delegate: ty.clone(),
                returns: signature.returns.clone(),
                parameters: signature.parameters.clone(),
                is_async: signature.is_async,
            }),
            Some(TypeKind::Array { element }) => InstanceSource::Array(ArraySource {
                array: ty.clone(),
                element: element.clone(),
                items: self.collect(element),
            }),
            _ => return Lookup::Missing,
        };
        Lookup::Found(self.decorate(ty, Arc::new(source)))
    }

    /// Wrap `source` in the decorators of `ty`, innermost first.
    fn decorate(&self, ty: &TypeKey, source: Arc<InstanceSource>) -> Arc<InstanceSource> {
        self.table
            .decorators_for(ty)
            .iter()
            .fold(source, |inner, binding| {
                Arc::new(InstanceSource::Decorator(DecoratorSource {
                    decorator: Arc::clone(&binding.decorator),
                    inner,
                }))
            })
    }

    /// Every source whose type converts to `element`.
    ///
    /// Delegate parameters come first, innermost delegate first, then the
    /// container's providers and bindings in declaration order. A declaration
    /// bound under several matching types contributes one item, decorated as
    /// `element` when it is bound as `element` too.
    fn collect(&self, element: &TypeKey) -> Vec<Arc<InstanceSource>> {
        let mut items = Vec::new();
        let mut seen: IndexSet<(DeclarationSite, TypeKey), RandomState> = IndexSet::default();

        let mut current = Some(self);
        while let Some(chain) = current {
            match chain.layer {
                Layer::Delegate { delegate, owner } => {
                    for (index, parameter) in delegate.parameters.iter().enumerate() {
                        if self.catalog.is_convertible(&parameter.ty, element) {
                            items.push(Arc::new(InstanceSource::DelegateParameter(
                                DelegateParameter {
                                    delegate: delegate.delegate.clone(),
                                    index,
                                    ty: parameter.ty.clone(),
                                    owner,
                                },
                            )));
                        }
                    }
                }
                Layer::Container => {
                    let table = self.table;
                    let providers = table
                        .providers()
                        .flat_map(|(ty, list)| list.iter().map(move |binding| (ty, binding)));
                    let bindings = table
                        .bindings()
                        .filter(|(ty, _)| table.providers_for(ty).is_empty());
                    for (ty, binding) in providers.chain(bindings) {
                        if !self.catalog.is_convertible(ty, element) {
                            continue;
                        }
                        let key = (binding.site.clone(), binding.source.produced_type().clone());
                        if seen.insert(key) {
                            let decorated_as = if table.binds_as(element, binding) {
                                element
                            } else {
                                ty
                            };
                            items.push(self.decorate(decorated_as, Arc::clone(&binding.source)));
                        }
                    }
                }
            }
            current = chain.parent;
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        BindingCache, DeclarationSet, DecoratorDeclaration, DelegateParam, DelegateSignature,
        Entity, Parameter, ProviderDeclaration, RegisterDeclaration, TableBuilder, TypeInfo,
    };

    fn catalog() -> TypeCatalog {
        TypeCatalog::new()
            .with(TypeInfo::interface("IService"))
            .with(TypeInfo::class("A").implements("IService"))
            .with(TypeInfo::class("B").implements("IService"))
            .with(TypeInfo::class("C"))
            .with(TypeInfo::array("IService[]", "IService"))
            .with(TypeInfo::array("C[]", "C"))
            .with(TypeInfo::delegate(
                "Func<C, A>",
                DelegateSignature::returning("A").param(DelegateParam::new("C")),
            ))
            .with(
                TypeInfo::class("Logged")
                    .implements("IService")
                    .constructor([Parameter::required("IService")]),
            )
    }

    fn build_table(catalog: &TypeCatalog, container: Entity) -> Arc<BindingTable> {
        let id = container.id().clone();
        let declarations = DeclarationSet::new().with(container);
        let cache = BindingCache::new();
        TableBuilder::new(catalog, &declarations, &cache)
            .build(&id)
            .unwrap()
    }

    fn produced(source: &InstanceSource) -> &str {
        source.produced_type().name()
    }

    #[test]
    fn test_lookup_in_container() {
        let catalog = catalog();
        let table = build_table(&catalog, Entity::container("App").register(RegisterDeclaration::new("C")));
        let chain = ScopeChain::new(&catalog, &table);

        assert!(matches!(chain.lookup(&"C".into()), Lookup::Found(s) if produced(&s) == "C"));
        assert_eq!(chain.lookup(&"A".into()), Lookup::Missing);
        assert_eq!(chain.depth(), 0);
    }

    #[test]
    fn test_delegate_parameter_shadows_container() {
        let catalog = catalog();
        let table = build_table(&catalog, Entity::container("App").register(RegisterDeclaration::new("C")));
        let root = ScopeChain::new(&catalog, &table);
        let delegate = DelegateSource {
            delegate: "Func<C, A>".into(),
            returns: "A".into(),
            parameters: vec![DelegateParam::new("C")],
            is_async: false,
        };
        let chain = ScopeChain::delegate(&root, &delegate, ResolutionId(1));

        let Lookup::Found(source) = chain.lookup(&"C".into()) else {
            panic!("expected the delegate parameter");
        };
        assert!(matches!(
            source.as_ref(),
            InstanceSource::DelegateParameter(p) if p.index == 0 && p.owner == ResolutionId(1)
        ));
        assert_eq!(chain.depth(), 1);
        assert_eq!(chain.root().depth(), 0);
    }

    #[test]
    fn test_duplicate_delegate_parameters_are_ambiguous() {
        let catalog = catalog();
        let table = build_table(&catalog, Entity::container("App"));
        let root = ScopeChain::new(&catalog, &table);
        let delegate = DelegateSource {
            delegate: "Func<C, C, A>".into(),
            returns: "A".into(),
            parameters: vec![DelegateParam::new("C"), DelegateParam::new("C")],
            is_async: false,
        };
        let chain = ScopeChain::delegate(&root, &delegate, ResolutionId(1));
        assert_eq!(chain.lookup(&"C".into()), Lookup::Ambiguous(2));
    }

    #[test]
    fn test_providers_take_precedence() {
        let catalog = catalog();
        let table = build_table(
            &catalog,
            Entity::container("App")
                .register(RegisterDeclaration::new("C"))
                .provider(ProviderDeclaration::new("config", "C")),
        );
        let chain = ScopeChain::new(&catalog, &table);
        assert!(matches!(
            chain.lookup(&"C".into()),
            Lookup::Found(s) if matches!(s.as_ref(), InstanceSource::InstanceProvider(_))
        ));

        let table = build_table(
            &catalog,
            Entity::container("App")
                .provider(ProviderDeclaration::new("first", "C"))
                .provider(ProviderDeclaration::new("second", "C")),
        );
        let chain = ScopeChain::new(&catalog, &table);
        assert_eq!(chain.lookup(&"C".into()), Lookup::Ambiguous(2));
    }

    #[test]
    fn test_delegate_is_synthesized() {
        let catalog = catalog();
        let table = build_table(&catalog, Entity::container("App"));
        let chain = ScopeChain::new(&catalog, &table);

        let Lookup::Found(source) = chain.lookup(&"Func<C, A>".into()) else {
            panic!("expected a synthesized delegate");
        };
        let InstanceSource::Delegate(delegate) = source.as_ref() else {
            panic!("expected a delegate source");
        };
        assert_eq!(delegate.returns, TypeKey::from("A"));
        assert_eq!(delegate.parameters.len(), 1);
    }

    #[test]
    fn test_array_collects_convertible_bindings_once() {
        let catalog = catalog();
        let table = build_table(
            &catalog,
            Entity::container("App")
                .register(RegisterDeclaration::new("A").as_type("A").as_type("IService"))
                .register(RegisterDeclaration::new("B").as_type("IService"))
                .register(RegisterDeclaration::new("C")),
        );
        let chain = ScopeChain::new(&catalog, &table);

        let Lookup::Found(source) = chain.lookup(&"IService[]".into()) else {
            panic!("expected a synthesized array");
        };
        let InstanceSource::Array(array) = source.as_ref() else {
            panic!("expected an array source");
        };
        let items: Vec<_> = array.items.iter().map(|item| produced(item)).collect();
        assert_eq!(items, vec!["A", "B"]);
    }

    #[test]
    fn test_empty_array_is_still_synthesized() {
        let catalog = catalog();
        let table = build_table(&catalog, Entity::container("App"));
        let chain = ScopeChain::new(&catalog, &table);
        assert!(matches!(
            chain.lookup(&"C[]".into()),
            Lookup::Found(s) if matches!(s.as_ref(), InstanceSource::Array(a) if a.items.is_empty())
        ));
    }

    #[test]
    fn test_decorators_wrap_bindings_but_not_parameters() {
        let catalog = catalog();
        let table = build_table(
            &catalog,
            Entity::container("App")
                .register(RegisterDeclaration::new("A").as_type("IService"))
                .decorator(DecoratorDeclaration::new("Logged", "IService")),
        );
        let root = ScopeChain::new(&catalog, &table);

        let Lookup::Found(source) = root.lookup(&"IService".into()) else {
            panic!("expected a decorated source");
        };
        let InstanceSource::Decorator(decorated) = source.as_ref() else {
            panic!("expected a decorator");
        };
        assert_eq!(produced(&decorated.inner), "A");

        let delegate = DelegateSource {
            delegate: "Func<IService, C>".into(),
            returns: "C".into(),
            parameters: vec![DelegateParam::new("IService")],
            is_async: false,
        };
        let chain = ScopeChain::delegate(&root, &delegate, ResolutionId(1));
        assert!(matches!(
            chain.lookup(&"IService".into()),
            Lookup::Found(s) if matches!(s.as_ref(), InstanceSource::DelegateParameter(_))
        ));
    }

    #[test]
    fn test_array_items_take_element_decorators() {
        let catalog = catalog();
        let table = build_table(
            &catalog,
            Entity::container("App")
                .register(RegisterDeclaration::new("A").as_type("A").as_type("IService"))
                .decorator(DecoratorDeclaration::new("Logged", "IService")),
        );
        let chain = ScopeChain::new(&catalog, &table);

        let Lookup::Found(source) = chain.lookup(&"IService[]".into()) else {
            panic!("expected a synthesized array");
        };
        let InstanceSource::Array(array) = source.as_ref() else {
            panic!("expected an array source");
        };
        assert_eq!(array.items.len(), 1);
        let InstanceSource::Decorator(decorated) = array.items[0].as_ref() else {
            panic!("expected the item wrapped in the IService decorator");
        };
        assert_eq!(produced(&decorated.inner), "A");

        // Requested as A, the same declaration is not decorated
        assert!(matches!(
            chain.lookup(&"A".into()),
            Lookup::Found(s) if matches!(s.as_ref(), InstanceSource::Registration(_))
        ));
    }
}
