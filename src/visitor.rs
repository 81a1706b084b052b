//! Resolution walk
//!
//! Depth-first traversal from a root request through every dependency edge,
//! producing a [`ResolutionPlan`] or the diagnostics explaining why none
//! exists. The walk never stops at the first problem: each failing edge is
//! reported and the walk moves on to its siblings.
//!
//! Memoization is keyed by `(source, resolution)`. Single instances are keyed
//! by source alone and resolve their dependencies in a resolution of their
//! own, from the container layer. A delegate body is a resolution too.

use crate::{
    BindingTable, DelegateSource, Diagnostic, DiagnosticKind, Diagnostics, Edge, InstanceSource,
    Lookup, NodeId, PlanEdge, PlanNode, PlannerConfig, ResolutionId, ResolutionPlan,
    ResolutionRequest, Scope, ScopeChain, TypeCatalog, TypeKey,
};
use ahash::RandomState;
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Where the walk currently is.
struct Frame<'c> {
    chain: &'c ScopeChain<'c>,
    resolution: ResolutionId,
    /// Async sources may be awaited here
    is_async: bool,
    /// Entry point that decided `is_async`: the root or a delegate
    context: &'c TypeKey,
}

/// One walk from one root request.
pub(crate) struct ResolutionVisitor<'p> {
    config: &'p PlannerConfig,
    diagnostics: Diagnostics,
    nodes: Vec<PlanNode>,
    completed: HashMap<(Arc<InstanceSource>, ResolutionId), NodeId, RandomState>,
    single_instances: HashMap<Arc<InstanceSource>, NodeId, RandomState>,
    /// Sources on the current path, outermost first
    visiting: IndexSet<Arc<InstanceSource>, RandomState>,
    used_parameters: HashSet<(ResolutionId, usize), RandomState>,
    next_resolution: u32,
}

impl<'p> ResolutionVisitor<'p> {
    pub(crate) fn new(config: &'p PlannerConfig) -> Self {
        Self {
            config,
            diagnostics: Diagnostics::new(),
            nodes: Vec::new(),
            completed: HashMap::default(),
            single_instances: HashMap::default(),
            visiting: IndexSet::default(),
            used_parameters: HashSet::default(),
            next_resolution: ResolutionId::ROOT.id() + 1,
        }
    }

    /// Walk `request` against `table`.
    ///
    /// The plan is `None` whenever any error was reported.
    pub(crate) fn resolve(
        mut self,
        catalog: &TypeCatalog,
        table: &BindingTable,
        request: &ResolutionRequest,
    ) -> (Option<ResolutionPlan>, Vec<Diagnostic>) {
        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_planner",
            root = request.ty.name(),
            is_async = request.is_async,
            entity = table.entity().name(),
            "Resolving root type"
        );

        let chain = ScopeChain::new(catalog, table);
        let frame = Frame {
            chain: &chain,
            resolution: ResolutionId::ROOT,
            is_async: request.is_async,
            context: &request.ty,
        };
        let root = match self.visit_lookup(&frame, &request.ty, false, None) {
            Some(PlanEdge::Node(root)) => Some(root),
            _ => None,
        };

        if !self.config.report_advisories() {
            self.diagnostics.retain_errors();
        }

        let plan = match root {
            Some(root) if !self.diagnostics.has_errors() => {
                Some(ResolutionPlan::new(request.clone(), root, self.nodes))
            }
            _ => None,
        };

        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_planner",
            root = request.ty.name(),
            resolvable = plan.is_some(),
            nodes = plan.as_ref().map_or(0, ResolutionPlan::len),
            diagnostics = self.diagnostics.len(),
            "Resolution finished"
        );

        (plan, self.diagnostics.into_vec())
    }

    fn allocate_resolution(&mut self) -> ResolutionId {
        let id = ResolutionId(self.next_resolution);
        self.next_resolution += 1;
        id
    }

    fn report(&mut self, kind: DiagnosticKind) {
        self.diagnostics.report(Diagnostic::new(kind));
    }

    /// Look `ty` up from `frame` and visit what is found.
    fn visit_lookup(
        &mut self,
        frame: &Frame<'_>,
        ty: &TypeKey,
        is_optional: bool,
        consumer: Option<&TypeKey>,
    ) -> Option<PlanEdge> {
        match frame.chain.lookup(ty) {
            Lookup::Found(source) => self.visit(frame, source).map(PlanEdge::Node),
            Lookup::Missing if is_optional => {
                self.report(DiagnosticKind::OptionalParamNoSource {
                    ty: ty.clone(),
                    consumer: consumer.cloned(),
                });
                Some(PlanEdge::Default(ty.clone()))
            }
            Lookup::Missing => {
                self.report(DiagnosticKind::MissingSource {
                    ty: ty.clone(),
                    consumer: consumer.cloned(),
                });
                None
            }
            Lookup::Ambiguous(candidates) => {
                self.report(DiagnosticKind::AmbiguousSource {
                    ty: ty.clone(),
                    candidates,
                });
                None
            }
        }
    }

    fn visit(&mut self, frame: &Frame<'_>, source: Arc<InstanceSource>) -> Option<NodeId> {
        if let InstanceSource::DelegateParameter(parameter) = source.as_ref() {
            self.used_parameters.insert((parameter.owner, parameter.index));
        }

        if let Some(start) = self.visiting.get_index_of(&source) {
            let mut cycle: Vec<TypeKey> = self
                .visiting
                .iter()
                .skip(start)
                .map(|on_path| on_path.of_type().clone())
                .collect();
            cycle.push(source.of_type().clone());
            self.report(DiagnosticKind::CircularDependency {
                ty: source.of_type().clone(),
                cycle,
            });
            return None;
        }

        let scope = source.scope();
        let single = scope == Scope::SingleInstance;
        let memoized = if single {
            self.single_instances.get(&source)
        } else {
            self.completed.get(&(Arc::clone(&source), frame.resolution))
        };
        if let Some(&id) = memoized {
            if single && self.nodes[id.index()].requires_async && !frame.is_async {
                self.report(DiagnosticKind::RequiresAsyncResolution {
                    ty: source.of_type().clone(),
                    context: frame.context.clone(),
                });
            }
            return Some(id);
        }

        if self.visiting.len() >= self.config.max_depth() {
            self.report(DiagnosticKind::DependencyTreeTooDeep {
                ty: source.of_type().clone(),
                max_depth: self.config.max_depth(),
            });
            return None;
        }

        if source.is_async() && !frame.is_async {
            self.report(DiagnosticKind::RequiresAsyncResolution {
                ty: source.of_type().clone(),
                context: frame.context.clone(),
            });
        }
        if let InstanceSource::Array(array) = source.as_ref() {
            if array.items.is_empty() {
                self.report(DiagnosticKind::EmptyArraySource {
                    array: array.array.clone(),
                    element: array.element.clone(),
                });
            }
        }

        #[cfg(feature = "logging")]
        trace!(
            target: "dependency_planner",
            ty = source.of_type().name(),
            source = source.kind_name(),
            scope = scope.as_str(),
            depth = self.visiting.len(),
            "Visiting instance source"
        );

        let resolution = if single {
            self.allocate_resolution()
        } else {
            frame.resolution
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(PlanNode {
            source: Arc::clone(&source),
            resolution,
            scope,
            is_async: source.is_async(),
            requires_async: false,
            dependencies: Vec::new(),
        });

        self.visiting.insert(Arc::clone(&source));
        let (dependencies, children_async) = match source.as_ref() {
            InstanceSource::Delegate(delegate) => {
                (self.visit_delegate(frame, delegate).into_iter().collect(), false)
            }
            _ if single => {
                let own = Frame {
                    chain: frame.chain.root(),
                    resolution,
                    is_async: frame.is_async,
                    context: frame.context,
                };
                self.visit_edges(&own, &source)
            }
            _ => self.visit_edges(frame, &source),
        };
        self.visiting.pop();

        let node = &mut self.nodes[id.index()];
        node.dependencies = dependencies;
        node.requires_async = node.is_async || children_async;

        if single {
            self.single_instances.insert(source, id);
        } else {
            self.completed.insert((source, frame.resolution), id);
        }
        Some(id)
    }

    /// Visit every edge of `source`; returns the edges and whether any of
    /// them must be awaited.
    fn visit_edges(&mut self, frame: &Frame<'_>, source: &InstanceSource) -> (Vec<PlanEdge>, bool) {
        let consumer = source.of_type();
        let mut dependencies = Vec::new();
        let mut requires_async = false;

        for edge in source.edges() {
            let resolved = match edge {
                Edge::Lookup(parameter) => {
                    self.visit_lookup(frame, &parameter.ty, parameter.is_optional, Some(consumer))
                }
                Edge::Direct(inner) => self.visit(frame, Arc::clone(inner)).map(PlanEdge::Node),
            };
            if let Some(edge) = resolved {
                if let PlanEdge::Node(id) = edge {
                    requires_async |= self.nodes[id.index()].requires_async;
                }
                dependencies.push(edge);
            }
        }
        (dependencies, requires_async)
    }

    /// Check a delegate and walk its body in a new layer and resolution.
    fn visit_delegate(&mut self, frame: &Frame<'_>, delegate: &DelegateSource) -> Option<PlanEdge> {
        let mut parameter_types: HashSet<&TypeKey, RandomState> = HashSet::default();
        for parameter in &delegate.parameters {
            if parameter.by_ref {
                self.report(DiagnosticKind::DelegateParamByRef {
                    delegate: delegate.delegate.clone(),
                    parameter: parameter.ty.clone(),
                });
            }
            if !parameter_types.insert(&parameter.ty) {
                self.report(DiagnosticKind::DelegateDuplicateParamType {
                    delegate: delegate.delegate.clone(),
                    parameter: parameter.ty.clone(),
                });
            }
        }

        let owner = self.allocate_resolution();
        let chain = ScopeChain::delegate(frame.chain, delegate, owner);
        let body = Frame {
            chain: &chain,
            resolution: owner,
            is_async: delegate.is_async,
            context: &delegate.delegate,
        };

        let edge = match chain.lookup(&delegate.returns) {
            Lookup::Found(returned) => {
                match returned.as_ref() {
                    InstanceSource::DelegateParameter(parameter) => {
                        self.report(DiagnosticKind::DelegateReturnUnchanged {
                            delegate: delegate.delegate.clone(),
                            enclosing: parameter.owner != owner,
                        });
                    }
                    other if other.scope() == Scope::SingleInstance => {
                        self.report(DiagnosticKind::DelegateReturnSingleInstance {
                            delegate: delegate.delegate.clone(),
                            ty: delegate.returns.clone(),
                        });
                    }
                    _ => {}
                }
                self.visit(&body, returned).map(PlanEdge::Node)
            }
            Lookup::Missing => {
                self.report(DiagnosticKind::MissingSource {
                    ty: delegate.returns.clone(),
                    consumer: Some(delegate.delegate.clone()),
                });
                None
            }
            Lookup::Ambiguous(candidates) => {
                self.report(DiagnosticKind::AmbiguousSource {
                    ty: delegate.returns.clone(),
                    candidates,
                });
                None
            }
        };

        for (index, parameter) in delegate.parameters.iter().enumerate() {
            if !self.used_parameters.contains(&(owner, index)) {
                self.report(DiagnosticKind::DelegateUnusedParam {
                    delegate: delegate.delegate.clone(),
                    parameter: parameter.ty.clone(),
                    index,
                });
            }
        }
        edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        BindingCache, DeclarationSet, DecoratorDeclaration, DelegateParam, DelegateSignature,
        DiagnosticCode, Entity, Parameter, RegisterDeclaration, TableBuilder, TypeInfo,
    };

    fn run(
        catalog: &TypeCatalog,
        container: Entity,
        request: ResolutionRequest,
    ) -> (Option<ResolutionPlan>, Vec<Diagnostic>) {
        let id = container.id().clone();
        let declarations = DeclarationSet::new().with(container);
        let cache = BindingCache::new();
        let table = TableBuilder::new(catalog, &declarations, &cache)
            .build(&id)
            .unwrap();
        let config = PlannerConfig::default();
        ResolutionVisitor::new(&config).resolve(catalog, &table, &request)
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<DiagnosticCode> {
        diagnostics.iter().map(Diagnostic::code).collect()
    }

    #[test]
    fn test_shared_instance_within_resolution() {
        let catalog = TypeCatalog::new()
            .with(TypeInfo::class("C"))
            .with(TypeInfo::class("B").constructor([Parameter::required("C")]))
            .with(TypeInfo::class("A").constructor([Parameter::required("B"), Parameter::required("C")]));
        let (plan, diagnostics) = run(
            &catalog,
            Entity::container("App")
                .register(RegisterDeclaration::new("A"))
                .register(RegisterDeclaration::new("B"))
                .register(RegisterDeclaration::new("C")),
            ResolutionRequest::new("A"),
        );

        assert!(diagnostics.is_empty());
        let plan = plan.unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.find(&"C".into()).count(), 1);
    }

    #[test]
    fn test_per_dependency_gets_one_node_per_resolution() {
        let catalog = TypeCatalog::new()
            .with(TypeInfo::class("C"))
            .with(TypeInfo::class("A").constructor([Parameter::required("C"), Parameter::required("C")]));
        let (plan, _) = run(
            &catalog,
            Entity::container("App")
                .register(RegisterDeclaration::new("A"))
                .register(RegisterDeclaration::new("C").scope(Scope::InstancePerDependency)),
            ResolutionRequest::new("A"),
        );

        let plan = plan.unwrap();
        let root = plan.root_node();
        assert_eq!(root.dependencies, vec![PlanEdge::Node(NodeId(1)), PlanEdge::Node(NodeId(1))]);
        assert_eq!(plan.node(NodeId(1)).scope, Scope::InstancePerDependency);
    }

    #[test]
    fn test_cycle_is_reported_with_path() {
        let catalog = TypeCatalog::new()
            .with(TypeInfo::class("A").constructor([Parameter::required("B")]))
            .with(TypeInfo::class("B").constructor([Parameter::required("A")]));
        let (plan, diagnostics) = run(
            &catalog,
            Entity::container("App")
                .register(RegisterDeclaration::new("A"))
                .register(RegisterDeclaration::new("B")),
            ResolutionRequest::new("A"),
        );

        assert!(plan.is_none());
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::CircularDependency]);
        let DiagnosticKind::CircularDependency { cycle, .. } = diagnostics[0].kind() else {
            panic!("expected a cycle");
        };
        assert_eq!(cycle, &vec![TypeKey::from("A"), TypeKey::from("B"), TypeKey::from("A")]);
    }

    #[test]
    fn test_missing_dependency_names_consumer() {
        let catalog = TypeCatalog::new()
            .with(TypeInfo::class("B"))
            .with(TypeInfo::class("A").constructor([Parameter::required("B")]));
        let (plan, diagnostics) = run(
            &catalog,
            Entity::container("App").register(RegisterDeclaration::new("A")),
            ResolutionRequest::new("A"),
        );

        assert!(plan.is_none());
        assert_eq!(
            diagnostics[0].kind(),
            &DiagnosticKind::MissingSource {
                ty: "B".into(),
                consumer: Some("A".into()),
            }
        );
    }

    #[test]
    fn test_optional_parameter_uses_default() {
        let catalog = TypeCatalog::new()
            .with(TypeInfo::class("B"))
            .with(TypeInfo::class("A").constructor([Parameter::optional("B")]));
        let (plan, diagnostics) = run(
            &catalog,
            Entity::container("App").register(RegisterDeclaration::new("A")),
            ResolutionRequest::new("A"),
        );

        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::OptionalParamNoSource]);
        let plan = plan.unwrap();
        assert_eq!(plan.root_node().dependencies, vec![PlanEdge::Default("B".into())]);
    }

    #[test]
    fn test_async_source_from_sync_root() {
        let catalog = TypeCatalog::new()
            .with(TypeInfo::class("A").requires_async_initialization());
        let container = || Entity::container("App").register(RegisterDeclaration::new("A"));

        let (plan, diagnostics) = run(&catalog, container(), ResolutionRequest::new("A"));
        assert!(plan.is_none());
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::RequiresAsyncResolution]);

        let (plan, diagnostics) = run(&catalog, container(), ResolutionRequest::asynchronous("A"));
        assert!(diagnostics.is_empty());
        assert!(plan.unwrap().is_async());
    }

    #[test]
    fn test_async_disposal_from_sync_root() {
        let catalog = TypeCatalog::new()
            .with(TypeInfo::class("Conn").async_disposable())
            .with(TypeInfo::class("Repo").constructor([Parameter::required("Conn")]));
        let container = || {
            Entity::container("App")
                .register(RegisterDeclaration::new("Conn"))
                .register(RegisterDeclaration::new("Repo"))
        };

        let (plan, diagnostics) = run(&catalog, container(), ResolutionRequest::new("Repo"));
        assert!(plan.is_none());
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::RequiresAsyncResolution]);
        assert!(matches!(
            diagnostics[0].kind(),
            DiagnosticKind::RequiresAsyncResolution { ty, .. } if ty == &TypeKey::from("Conn")
        ));

        let (plan, diagnostics) = run(&catalog, container(), ResolutionRequest::asynchronous("Repo"));
        assert!(diagnostics.is_empty());
        let plan = plan.unwrap();
        assert!(plan.is_async());
        assert!(!plan.root_node().is_async);
        assert!(plan.root_node().requires_async);
    }

    #[test]
    fn test_async_disposing_decorator_from_sync_root() {
        let catalog = TypeCatalog::new()
            .with(TypeInfo::interface("IConn"))
            .with(TypeInfo::class("Conn").implements("IConn"))
            .with(
                TypeInfo::class("Pooled")
                    .implements("IConn")
                    .constructor([Parameter::required("IConn")])
                    .async_disposable(),
            );
        let container = || {
            Entity::container("App")
                .register(RegisterDeclaration::new("Conn").as_type("IConn"))
                .decorator(DecoratorDeclaration::new("Pooled", "IConn"))
        };

        let (plan, diagnostics) = run(&catalog, container(), ResolutionRequest::new("IConn"));
        assert!(plan.is_none());
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::RequiresAsyncResolution]);

        let (plan, diagnostics) = run(&catalog, container(), ResolutionRequest::asynchronous("IConn"));
        assert!(diagnostics.is_empty());
        assert!(plan.unwrap().root_node().is_async);
    }

    #[test]
    fn test_async_delegate_body_allows_async_sources() {
        let catalog = TypeCatalog::new()
            .with(TypeInfo::class("A").requires_async_initialization())
            .with(TypeInfo::delegate(
                "Func<Task<A>>",
                DelegateSignature::returning("A").asynchronous(),
            ));
        let (plan, diagnostics) = run(
            &catalog,
            Entity::container("App").register(RegisterDeclaration::new("A")),
            ResolutionRequest::new("Func<Task<A>>"),
        );

        assert!(diagnostics.is_empty());
        let plan = plan.unwrap();
        assert!(!plan.is_async());
        assert_eq!(plan.len(), 2);
        assert_ne!(plan.node(NodeId(1)).resolution, ResolutionId::ROOT);
    }

    #[test]
    fn test_delegate_parameter_use_and_warnings() {
        let catalog = TypeCatalog::new()
            .with(TypeInfo::class("C"))
            .with(TypeInfo::class("D"))
            .with(TypeInfo::class("A").constructor([Parameter::required("C")]))
            .with(TypeInfo::delegate(
                "Func<C, D, A>",
                DelegateSignature::returning("A")
                    .param(DelegateParam::new("C"))
                    .param(DelegateParam::new("D")),
            ));
        let (plan, diagnostics) = run(
            &catalog,
            Entity::container("App").register(RegisterDeclaration::new("A")),
            ResolutionRequest::new("Func<C, D, A>"),
        );

        assert!(plan.is_some());
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::DelegateUnusedParam]);
        assert_eq!(diagnostics[0].offending(), Some(&TypeKey::from("D")));
    }

    #[test]
    fn test_delegate_returning_its_parameter() {
        let catalog = TypeCatalog::new().with(TypeInfo::class("C")).with(TypeInfo::delegate(
            "Func<C, C>",
            DelegateSignature::returning("C").param(DelegateParam::new("C")),
        ));
        let (plan, diagnostics) = run(
            &catalog,
            Entity::container("App"),
            ResolutionRequest::new("Func<C, C>"),
        );

        assert!(plan.is_some());
        assert_eq!(
            diagnostics[0].kind(),
            &DiagnosticKind::DelegateReturnUnchanged {
                delegate: "Func<C, C>".into(),
                enclosing: false,
            }
        );
    }

    #[test]
    fn test_nested_delegate_returning_enclosing_parameter() {
        let catalog = TypeCatalog::new()
            .with(TypeInfo::class("C"))
            .with(TypeInfo::delegate("Func<C>", DelegateSignature::returning("C")))
            .with(TypeInfo::delegate(
                "Func<C, Func<C>>",
                DelegateSignature::returning("Func<C>").param(DelegateParam::new("C")),
            ));
        let (plan, diagnostics) = run(
            &catalog,
            Entity::container("App"),
            ResolutionRequest::new("Func<C, Func<C>>"),
        );

        assert!(plan.is_some());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].kind(),
            &DiagnosticKind::DelegateReturnUnchanged {
                delegate: "Func<C>".into(),
                enclosing: true,
            }
        );
    }

    #[test]
    fn test_delegate_parameter_checks() {
        let catalog = TypeCatalog::new().with(TypeInfo::class("A")).with(TypeInfo::delegate(
            "Func<C, C, A>",
            DelegateSignature::returning("A")
                .param(DelegateParam::by_ref("C"))
                .param(DelegateParam::new("C")),
        ));
        let (plan, diagnostics) = run(
            &catalog,
            Entity::container("App").register(RegisterDeclaration::new("A")),
            ResolutionRequest::new("Func<C, C, A>"),
        );

        assert!(plan.is_none());
        let found = codes(&diagnostics);
        assert!(found.contains(&DiagnosticCode::DelegateParamByRef));
        assert!(found.contains(&DiagnosticCode::DelegateDuplicateParamType));
    }

    #[test]
    fn test_single_instance_cannot_see_delegate_parameters() {
        let catalog = TypeCatalog::new()
            .with(TypeInfo::class("C"))
            .with(TypeInfo::class("A").constructor([Parameter::required("C")]))
            .with(TypeInfo::delegate(
                "Func<C, A>",
                DelegateSignature::returning("A").param(DelegateParam::new("C")),
            ));
        let (plan, diagnostics) = run(
            &catalog,
            Entity::container("App").register(RegisterDeclaration::new("A").scope(Scope::SingleInstance)),
            ResolutionRequest::new("Func<C, A>"),
        );

        assert!(plan.is_none());
        let found = codes(&diagnostics);
        assert!(found.contains(&DiagnosticCode::MissingSource));
        assert!(found.contains(&DiagnosticCode::DelegateReturnSingleInstance));
        assert!(found.contains(&DiagnosticCode::DelegateUnusedParam));
    }

    #[test]
    fn test_depth_limit() {
        let mut catalog = TypeCatalog::new().with(TypeInfo::class("T0"));
        let mut container = Entity::container("App").register(RegisterDeclaration::new("T0"));
        for i in 1..10 {
            catalog.insert(
                TypeInfo::class(format!("T{i}")).constructor([Parameter::required(format!("T{}", i - 1))]),
            );
            container = container.register(RegisterDeclaration::new(format!("T{i}")));
        }
        let id = container.id().clone();
        let declarations = DeclarationSet::new().with(container);
        let cache = BindingCache::new();
        let table = TableBuilder::new(&catalog, &declarations, &cache)
            .build(&id)
            .unwrap();

        let config = PlannerConfig::default().with_max_depth(5);
        let (plan, diagnostics) =
            ResolutionVisitor::new(&config).resolve(&catalog, &table, &ResolutionRequest::new("T9"));
        assert!(plan.is_none());
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::DependencyTreeTooDeep]);

        let config = PlannerConfig::default();
        let (plan, _) =
            ResolutionVisitor::new(&config).resolve(&catalog, &table, &ResolutionRequest::new("T9"));
        assert_eq!(plan.unwrap().len(), 10);
    }
}
