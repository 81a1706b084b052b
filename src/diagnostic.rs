//! Diagnostics
//!
//! Every problem the planner finds is recorded as a [`Diagnostic`] rather than
//! returned as an error, so one run reports every independent problem. Each
//! diagnostic has a stable [`DiagnosticCode`], a [`Severity`], the types it is
//! about and, when known, the declaration site a host should point at.

use crate::{DeclarationSite, EntityId, TypeKey};
use ahash::RandomState;
use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// How serious a diagnostic is. Only errors block plan generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// Stable identifier of a diagnostic condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    ConflictingImport,
    InvalidType,
    TypeNotPublic,
    NoConstructor,
    MultipleConstructors,
    NoSuitableConversion,
    DuplicateRegistration,
    StructSingleInstance,
    InvalidDecorator,
    RecursiveImport,
    UnknownImport,
    MissingSource,
    AmbiguousSource,
    CircularDependency,
    DependencyTreeTooDeep,
    RequiresAsyncResolution,
    DelegateParamByRef,
    DelegateDuplicateParamType,
    DelegateUnusedParam,
    DelegateReturnUnchanged,
    DelegateReturnSingleInstance,
    EmptyArraySource,
    OptionalParamNoSource,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::ConflictingImport => "conflicting-import",
            DiagnosticCode::InvalidType => "invalid-type",
            DiagnosticCode::TypeNotPublic => "type-not-public",
            DiagnosticCode::NoConstructor => "no-constructor",
            DiagnosticCode::MultipleConstructors => "multiple-constructors",
            DiagnosticCode::NoSuitableConversion => "no-suitable-conversion",
            DiagnosticCode::DuplicateRegistration => "duplicate-registration",
            DiagnosticCode::StructSingleInstance => "struct-single-instance",
            DiagnosticCode::InvalidDecorator => "invalid-decorator",
            DiagnosticCode::RecursiveImport => "recursive-import",
            DiagnosticCode::UnknownImport => "unknown-import",
            DiagnosticCode::MissingSource => "missing-source",
            DiagnosticCode::AmbiguousSource => "ambiguous-source",
            DiagnosticCode::CircularDependency => "circular-dependency",
            DiagnosticCode::DependencyTreeTooDeep => "dependency-tree-too-deep",
            DiagnosticCode::RequiresAsyncResolution => "requires-async-resolution",
            DiagnosticCode::DelegateParamByRef => "delegate-param-byref",
            DiagnosticCode::DelegateDuplicateParamType => "delegate-duplicate-param-type",
            DiagnosticCode::DelegateUnusedParam => "delegate-unused-param",
            DiagnosticCode::DelegateReturnUnchanged => "delegate-return-unchanged",
            DiagnosticCode::DelegateReturnSingleInstance => "delegate-return-single-instance",
            DiagnosticCode::EmptyArraySource => "empty-array-source",
            DiagnosticCode::OptionalParamNoSource => "optional-param-no-source",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            DiagnosticCode::DelegateUnusedParam
            | DiagnosticCode::DelegateReturnUnchanged
            | DiagnosticCode::DelegateReturnSingleInstance
            | DiagnosticCode::EmptyArraySource => Severity::Warning,
            DiagnosticCode::OptionalParamNoSource => Severity::Info,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn path(cycle: &[TypeKey]) -> String {
    cycle
        .iter()
        .map(TypeKey::name)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn required_by(consumer: &Option<TypeKey>) -> String {
    match consumer {
        Some(ty) => format!(" required by {ty}"),
        None => String::new(),
    }
}

fn returned_from(enclosing: &bool) -> &'static str {
    if *enclosing {
        "a parameter of an enclosing delegate"
    } else {
        "one of its own parameters"
    }
}

/// A diagnostic condition and the data it is about.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    #[error("{ty} is bound differently by more than one import; the import of {module} is one of them")]
    ConflictingImport { ty: TypeKey, module: EntityId },

    #[error("{ty} cannot be registered: it is an error type or an open generic")]
    InvalidType { ty: TypeKey },

    #[error("{ty} is not public")]
    TypeNotPublic { ty: TypeKey },

    #[error("{ty} has no public constructor")]
    NoConstructor { ty: TypeKey },

    #[error("{ty} has more than one public constructor with parameters")]
    MultipleConstructors { ty: TypeKey },

    #[error("{from} cannot be registered as {to}: no suitable conversion")]
    NoSuitableConversion { from: TypeKey, to: TypeKey },

    #[error("{ty} is registered more than once")]
    DuplicateRegistration { ty: TypeKey },

    #[error("{ty} is a value type and cannot be a single instance")]
    StructSingleInstance { ty: TypeKey },

    #[error("decorator {decorator} has no parameter of the decorated type {decorated}")]
    InvalidDecorator {
        decorator: Arc<str>,
        decorated: TypeKey,
    },

    #[error("import of {module} recurses into itself")]
    RecursiveImport { module: EntityId },

    #[error("imported module {module} is not declared")]
    UnknownImport { module: EntityId },

    #[error("no source for {ty}{}", required_by(.consumer))]
    MissingSource {
        ty: TypeKey,
        consumer: Option<TypeKey>,
    },

    #[error("{candidates} sources for {ty} and none is preferred")]
    AmbiguousSource { ty: TypeKey, candidates: usize },

    #[error("circular dependency: {}", path(.cycle))]
    CircularDependency { ty: TypeKey, cycle: Vec<TypeKey> },

    #[error("dependency tree below {ty} is deeper than {max_depth}")]
    DependencyTreeTooDeep { ty: TypeKey, max_depth: usize },

    #[error("{ty} is async and cannot be resolved synchronously from {context}")]
    RequiresAsyncResolution { ty: TypeKey, context: TypeKey },

    #[error("delegate {delegate} takes {parameter} by reference")]
    DelegateParamByRef { delegate: TypeKey, parameter: TypeKey },

    #[error("delegate {delegate} has more than one parameter of type {parameter}")]
    DelegateDuplicateParamType { delegate: TypeKey, parameter: TypeKey },

    #[error("parameter {index} ({parameter}) of delegate {delegate} is never used")]
    DelegateUnusedParam {
        delegate: TypeKey,
        parameter: TypeKey,
        index: usize,
    },

    #[error("delegate {delegate} returns {} unchanged", returned_from(.enclosing))]
    DelegateReturnUnchanged { delegate: TypeKey, enclosing: bool },

    #[error("delegate {delegate} returns the single instance {ty}, always the same value")]
    DelegateReturnSingleInstance { delegate: TypeKey, ty: TypeKey },

    #[error("no bindings convertible to {element}; {array} will always be empty")]
    EmptyArraySource { array: TypeKey, element: TypeKey },

    #[error("no source for optional {ty}{}; the default value is used", required_by(.consumer))]
    OptionalParamNoSource {
        ty: TypeKey,
        consumer: Option<TypeKey>,
    },
}

impl DiagnosticKind {
    pub fn code(&self) -> DiagnosticCode {
        match self {
            DiagnosticKind::ConflictingImport { .. } => DiagnosticCode::ConflictingImport,
            DiagnosticKind::InvalidType { .. } => DiagnosticCode::InvalidType,
            DiagnosticKind::TypeNotPublic { .. } => DiagnosticCode::TypeNotPublic,
            DiagnosticKind::NoConstructor { .. } => DiagnosticCode::NoConstructor,
            DiagnosticKind::MultipleConstructors { .. } => DiagnosticCode::MultipleConstructors,
            DiagnosticKind::NoSuitableConversion { .. } => DiagnosticCode::NoSuitableConversion,
            DiagnosticKind::DuplicateRegistration { .. } => DiagnosticCode::DuplicateRegistration,
            DiagnosticKind::StructSingleInstance { .. } => DiagnosticCode::StructSingleInstance,
            DiagnosticKind::InvalidDecorator { .. } => DiagnosticCode::InvalidDecorator,
            DiagnosticKind::RecursiveImport { .. } => DiagnosticCode::RecursiveImport,
            DiagnosticKind::UnknownImport { .. } => DiagnosticCode::UnknownImport,
            DiagnosticKind::MissingSource { .. } => DiagnosticCode::MissingSource,
            DiagnosticKind::AmbiguousSource { .. } => DiagnosticCode::AmbiguousSource,
            DiagnosticKind::CircularDependency { .. } => DiagnosticCode::CircularDependency,
            DiagnosticKind::DependencyTreeTooDeep { .. } => DiagnosticCode::DependencyTreeTooDeep,
            DiagnosticKind::RequiresAsyncResolution { .. } => {
                DiagnosticCode::RequiresAsyncResolution
            }
            DiagnosticKind::DelegateParamByRef { .. } => DiagnosticCode::DelegateParamByRef,
            DiagnosticKind::DelegateDuplicateParamType { .. } => {
                DiagnosticCode::DelegateDuplicateParamType
            }
            DiagnosticKind::DelegateUnusedParam { .. } => DiagnosticCode::DelegateUnusedParam,
            DiagnosticKind::DelegateReturnUnchanged { .. } => {
                DiagnosticCode::DelegateReturnUnchanged
            }
            DiagnosticKind::DelegateReturnSingleInstance { .. } => {
                DiagnosticCode::DelegateReturnSingleInstance
            }
            DiagnosticKind::EmptyArraySource { .. } => DiagnosticCode::EmptyArraySource,
            DiagnosticKind::OptionalParamNoSource { .. } => DiagnosticCode::OptionalParamNoSource,
        }
    }

    /// The type the diagnostic is about.
    pub fn target(&self) -> Option<&TypeKey> {
        match self {
            DiagnosticKind::ConflictingImport { ty, .. }
            | DiagnosticKind::InvalidType { ty }
            | DiagnosticKind::TypeNotPublic { ty }
            | DiagnosticKind::NoConstructor { ty }
            | DiagnosticKind::MultipleConstructors { ty }
            | DiagnosticKind::DuplicateRegistration { ty }
            | DiagnosticKind::StructSingleInstance { ty }
            | DiagnosticKind::MissingSource { ty, .. }
            | DiagnosticKind::AmbiguousSource { ty, .. }
            | DiagnosticKind::CircularDependency { ty, .. }
            | DiagnosticKind::DependencyTreeTooDeep { ty, .. }
            | DiagnosticKind::RequiresAsyncResolution { ty, .. }
            | DiagnosticKind::OptionalParamNoSource { ty, .. } => Some(ty),
            DiagnosticKind::NoSuitableConversion { to, .. } => Some(to),
            DiagnosticKind::InvalidDecorator { decorated, .. } => Some(decorated),
            DiagnosticKind::RecursiveImport { .. } | DiagnosticKind::UnknownImport { .. } => None,
            DiagnosticKind::DelegateParamByRef { delegate, .. }
            | DiagnosticKind::DelegateDuplicateParamType { delegate, .. }
            | DiagnosticKind::DelegateUnusedParam { delegate, .. }
            | DiagnosticKind::DelegateReturnUnchanged { delegate, .. }
            | DiagnosticKind::DelegateReturnSingleInstance { delegate, .. } => Some(delegate),
            DiagnosticKind::EmptyArraySource { array, .. } => Some(array),
        }
    }

    /// The type that caused the problem, when it differs from the target.
    pub fn offending(&self) -> Option<&TypeKey> {
        match self {
            DiagnosticKind::NoSuitableConversion { from, .. } => Some(from),
            DiagnosticKind::MissingSource { consumer, .. }
            | DiagnosticKind::OptionalParamNoSource { consumer, .. } => consumer.as_ref(),
            DiagnosticKind::RequiresAsyncResolution { context, .. } => Some(context),
            DiagnosticKind::DelegateParamByRef { parameter, .. }
            | DiagnosticKind::DelegateDuplicateParamType { parameter, .. }
            | DiagnosticKind::DelegateUnusedParam { parameter, .. } => Some(parameter),
            DiagnosticKind::DelegateReturnSingleInstance { ty, .. } => Some(ty),
            DiagnosticKind::EmptyArraySource { element, .. } => Some(element),
            _ => None,
        }
    }
}

/// A reported condition, optionally tied to a declaration site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    kind: DiagnosticKind,
    site: Option<DeclarationSite>,
}

impl Diagnostic {
    #[inline]
    pub fn new(kind: DiagnosticKind) -> Self {
        Self { kind, site: None }
    }

    /// Attach the declaration site the diagnostic points at.
    #[inline]
    pub fn at(mut self, site: DeclarationSite) -> Self {
        self.site = Some(site);
        self
    }

    #[inline]
    pub fn kind(&self) -> &DiagnosticKind {
        &self.kind
    }

    #[inline]
    pub fn site(&self) -> Option<&DeclarationSite> {
        self.site.as_ref()
    }

    #[inline]
    pub fn code(&self) -> DiagnosticCode {
        self.kind.code()
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.code().severity()
    }

    #[inline]
    pub fn target(&self) -> Option<&TypeKey> {
        self.kind.target()
    }

    #[inline]
    pub fn offending(&self) -> Option<&TypeKey> {
        self.kind.offending()
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl From<DiagnosticKind> for Diagnostic {
    #[inline]
    fn from(kind: DiagnosticKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity(), self.code(), self.kind)?;
        if let Some(site) = &self.site {
            write!(f, " (at {site})")?;
        }
        Ok(())
    }
}

/// Ordered, deduplicating diagnostic accumulator.
#[derive(Debug, Clone, Default)]
pub(crate) struct Diagnostics {
    reported: IndexSet<Diagnostic, RandomState>,
}

impl Diagnostics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic; returns `false` if it was already reported.
    pub(crate) fn report(&mut self, diagnostic: impl Into<Diagnostic>) -> bool {
        self.reported.insert(diagnostic.into())
    }

    pub(crate) fn extend<'a>(&mut self, diagnostics: impl IntoIterator<Item = &'a Diagnostic>) {
        self.reported.extend(diagnostics.into_iter().cloned());
    }

    pub(crate) fn has_errors(&self) -> bool {
        self.reported.iter().any(Diagnostic::is_error)
    }

    pub(crate) fn len(&self) -> usize {
        self.reported.len()
    }

    /// Drop warnings and info.
    pub(crate) fn retain_errors(&mut self) {
        self.reported.retain(Diagnostic::is_error);
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.reported.into_iter().collect()
    }
}
