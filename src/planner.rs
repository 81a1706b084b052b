//! Planner facade
//!
//! The [`Planner`] owns the type catalog and the declarations of one
//! compilation, builds binding tables on demand and walks every root a
//! container requests.
//!
//! Planning one container is sequential. Different containers share nothing
//! but the table cache, so a host may plan them from several threads through
//! one `&Planner`.

use crate::visitor::ResolutionVisitor;
use crate::{
    BindingCache, BindingTable, DeclarationSet, Diagnostic, DiagnosticCode, EntityId,
    PlannerError, ResolutionPlan, ResolutionRequest, Result, Severity, TableBuilder, TypeCatalog,
    TypeKey,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "logging")]
use tracing::debug;

/// Default limit on the length of a dependency path.
pub const DEFAULT_MAX_DEPTH: usize = 200;

/// Tunables of a planning run.
///
/// # Examples
///
/// ```rust
/// use dependency_planner::PlannerConfig;
///
/// let config = PlannerConfig::default().with_max_depth(50).without_advisories();
/// assert_eq!(config.max_depth(), 50);
/// assert!(!config.report_advisories());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    max_depth: usize,
    report_advisories: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            report_advisories: true,
        }
    }
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Longest dependency path walked before reporting
    /// `dependency-tree-too-deep`.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Drop warnings and info from resolution results.
    pub fn without_advisories(mut self) -> Self {
        self.report_advisories = false;
        self
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn report_advisories(&self) -> bool {
        self.report_advisories
    }
}

/// Cooperative cancellation, checked between roots.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Result of walking one root request.
#[derive(Debug, Clone)]
pub struct Resolution {
    request: ResolutionRequest,
    plan: Option<ResolutionPlan>,
    diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    #[inline]
    pub fn request(&self) -> &ResolutionRequest {
        &self.request
    }

    /// The plan, present exactly when the walk reported no error.
    ///
    /// Only this root's own diagnostics count. Errors in the container's
    /// binding table, such as a duplicate registration, are reported on
    /// [`ContainerPlan::diagnostics`] and do not withhold this plan; check
    /// [`ContainerPlan::is_buildable`] before emitting code for the container.
    #[inline]
    pub fn plan(&self) -> Option<&ResolutionPlan> {
        self.plan.as_ref()
    }

    #[inline]
    pub fn is_resolvable(&self) -> bool {
        self.plan.is_some()
    }

    #[inline]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
    }

    /// Whether a diagnostic with `code` was reported.
    pub fn has(&self, code: DiagnosticCode) -> bool {
        self.diagnostics.iter().any(|d| d.code() == code)
    }

    pub fn into_plan(self) -> Option<ResolutionPlan> {
        self.plan
    }
}

/// Result of planning every root of one container.
#[derive(Debug, Clone)]
pub struct ContainerPlan {
    entity: EntityId,
    /// Diagnostics of the binding table
    diagnostics: Vec<Diagnostic>,
    resolutions: Vec<Resolution>,
}

impl ContainerPlan {
    #[inline]
    pub fn entity(&self) -> &EntityId {
        &self.entity
    }

    /// Problems with the container's bindings, independent of any root.
    ///
    /// These never suppress a root's [`Resolution::plan`].
    #[inline]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// One result per root, in request order.
    #[inline]
    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    pub fn resolution(&self, ty: &TypeKey) -> Option<&Resolution> {
        self.resolutions.iter().find(|r| &r.request.ty == ty)
    }

    /// Binding and resolution diagnostics together.
    pub fn all_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .chain(self.resolutions.iter().flat_map(|r| r.diagnostics.iter()))
    }

    /// Code can be generated: no errors anywhere.
    pub fn is_buildable(&self) -> bool {
        !self.all_diagnostics().any(Diagnostic::is_error)
    }
}

/// Plans containers from a type catalog and a set of declarations.
///
/// # Examples
///
/// ```rust
/// use dependency_planner::prelude::*;
///
/// let catalog = TypeCatalog::new()
///     .with(TypeInfo::interface("IClock"))
///     .with(TypeInfo::class("SystemClock").implements("IClock"))
///     .with(TypeInfo::class("Scheduler").constructor([Parameter::required("IClock")]));
///
/// let declarations = DeclarationSet::new().with(
///     Entity::container("App")
///         .register(RegisterDeclaration::new("SystemClock").as_type("IClock"))
///         .register(RegisterDeclaration::new("Scheduler"))
///         .resolves("Scheduler"),
/// );
///
/// let planner = Planner::new(catalog, declarations);
/// let plan = planner.plan_container(&"App".into()).unwrap();
/// assert!(plan.is_buildable());
/// assert_eq!(plan.resolutions()[0].plan().unwrap().len(), 2);
/// ```
pub struct Planner {
    catalog: Arc<TypeCatalog>,
    declarations: Arc<DeclarationSet>,
    cache: BindingCache,
    config: PlannerConfig,
}

impl Planner {
    pub fn new(
        catalog: impl Into<Arc<TypeCatalog>>,
        declarations: impl Into<Arc<DeclarationSet>>,
    ) -> Self {
        let planner = Self {
            catalog: catalog.into(),
            declarations: declarations.into(),
            cache: BindingCache::new(),
            config: PlannerConfig::default(),
        };

        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_planner",
            types = planner.catalog.len(),
            entities = planner.declarations.len(),
            "Creating planner"
        );

        planner
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    #[inline]
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    #[inline]
    pub fn declarations(&self) -> &DeclarationSet {
        &self.declarations
    }

    /// Tables built so far.
    #[inline]
    pub fn cache(&self) -> &BindingCache {
        &self.cache
    }

    /// The binding table of a container or module.
    pub fn bindings(&self, entity: &EntityId) -> Result<Arc<BindingTable>> {
        TableBuilder::new(&self.catalog, &self.declarations, &self.cache)
            .build(entity)
            .ok_or_else(|| PlannerError::unknown_entity(entity))
    }

    /// Walk one request against a container's bindings.
    ///
    /// The request does not need to be one of the container's declared roots.
    pub fn resolve(&self, entity: &EntityId, request: &ResolutionRequest) -> Result<Resolution> {
        let table = self.container_table(entity)?;
        Ok(self.walk(&table, request))
    }

    /// Walk every declared root of a container.
    pub fn plan_container(&self, entity: &EntityId) -> Result<ContainerPlan> {
        self.plan_container_with(entity, &CancellationToken::new())
    }

    /// Like [`plan_container`](Self::plan_container), checking `token` before
    /// each root.
    pub fn plan_container_with(
        &self,
        entity: &EntityId,
        token: &CancellationToken,
    ) -> Result<ContainerPlan> {
        let table = self.container_table(entity)?;
        let roots = self
            .declarations
            .get(entity)
            .map(|declared| declared.roots())
            .unwrap_or_default();

        let mut resolutions = Vec::with_capacity(roots.len());
        for request in roots {
            if token.is_cancelled() {
                #[cfg(feature = "logging")]
                debug!(
                    target: "dependency_planner",
                    entity = entity.name(),
                    planned = resolutions.len(),
                    "Planning cancelled"
                );
                return Err(PlannerError::Cancelled);
            }
            resolutions.push(self.walk(&table, request));
        }

        let plan = ContainerPlan {
            entity: entity.clone(),
            diagnostics: table.diagnostics().to_vec(),
            resolutions,
        };

        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_planner",
            entity = entity.name(),
            roots = plan.resolutions.len(),
            buildable = plan.is_buildable(),
            "Planned container"
        );

        Ok(plan)
    }

    /// Plan every container, in declaration order.
    pub fn plan_all(&self) -> Result<Vec<ContainerPlan>> {
        self.declarations
            .containers()
            .map(|container| self.plan_container(container.id()))
            .collect()
    }

    fn container_table(&self, entity: &EntityId) -> Result<Arc<BindingTable>> {
        let declared = self
            .declarations
            .get(entity)
            .ok_or_else(|| PlannerError::unknown_entity(entity))?;
        if !declared.is_container() {
            return Err(PlannerError::not_a_container(entity));
        }
        self.bindings(entity)
    }

    fn walk(&self, table: &BindingTable, request: &ResolutionRequest) -> Resolution {
        let (plan, diagnostics) =
            ResolutionVisitor::new(&self.config).resolve(&self.catalog, table, request);
        Resolution {
            request: request.clone(),
            plan,
            diagnostics,
        }
    }
}

impl std::fmt::Debug for Planner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planner")
            .field("types", &self.catalog.len())
            .field("entities", &self.declarations.len())
            .field("cached_tables", &self.cache.len())
            .field("config", &self.config)
            .finish()
    }
}
