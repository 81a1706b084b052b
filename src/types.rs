//! Type catalog
//!
//! The planner never sees the host compiler's symbol model directly. Instead
//! the host describes every type it cares about as a [`TypeInfo`] and hands
//! the resulting [`TypeCatalog`] to the planner, which only ever asks it
//! questions: what kind of type is this, is it public, which constructors does
//! it have, and can a value of one type be used where another is expected.
//!
//! # Example
//!
//! ```rust
//! use dependency_planner::{Conversion, Parameter, TypeCatalog, TypeInfo};
//!
//! let catalog = TypeCatalog::new()
//!     .with(TypeInfo::interface("IRepository"))
//!     .with(TypeInfo::class("Database"))
//!     .with(
//!         TypeInfo::class("Repository")
//!             .constructor([Parameter::required("Database")])
//!             .implements("IRepository"),
//!     );
//!
//! assert_eq!(
//!     catalog.conversion(&"Repository".into(), &"IRepository".into()),
//!     Some(Conversion::ImplicitReference)
//! );
//! ```

use ahash::RandomState;
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// Name of a type as the host knows it.
///
/// Cloning is a reference-count bump, so keys are passed around freely.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Arc<str>);

impl TypeKey {
    /// Create a key from a type name.
    #[inline]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// The type name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeKey {
    #[inline]
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeKey {
    #[inline]
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&TypeKey> for TypeKey {
    #[inline]
    fn from(key: &TypeKey) -> Self {
        key.clone()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parameter of a constructor, factory method or decorator method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    /// Parameter type
    pub ty: TypeKey,
    /// Has a default value the generated code can fall back to
    pub is_optional: bool,
}

impl Parameter {
    /// A parameter that must be resolved.
    #[inline]
    pub fn required(ty: impl Into<TypeKey>) -> Self {
        Self {
            ty: ty.into(),
            is_optional: false,
        }
    }

    /// A parameter with a default value.
    #[inline]
    pub fn optional(ty: impl Into<TypeKey>) -> Self {
        Self {
            ty: ty.into(),
            is_optional: true,
        }
    }
}

/// An instance constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constructor {
    pub is_public: bool,
    pub parameters: Vec<Parameter>,
}

impl Constructor {
    /// A public constructor with the given parameters.
    pub fn new(parameters: impl IntoIterator<Item = Parameter>) -> Self {
        Self {
            is_public: true,
            parameters: parameters.into_iter().collect(),
        }
    }

    /// A public parameterless constructor.
    pub fn parameterless() -> Self {
        Self::new([])
    }

    /// Mark this constructor as not publicly accessible.
    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }

    /// A constructor without parameters.
    #[inline]
    pub fn is_default(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// A delegate parameter. Only the type and whether it is passed by reference
/// matter to the planner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DelegateParam {
    pub ty: TypeKey,
    pub by_ref: bool,
}

impl DelegateParam {
    pub fn new(ty: impl Into<TypeKey>) -> Self {
        Self {
            ty: ty.into(),
            by_ref: false,
        }
    }

    pub fn by_ref(ty: impl Into<TypeKey>) -> Self {
        Self {
            ty: ty.into(),
            by_ref: true,
        }
    }
}

/// Shape of a delegate type such as `Func<A, B>`.
///
/// For an async delegate `returns` is the awaited type, not the task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DelegateSignature {
    pub parameters: Vec<DelegateParam>,
    pub returns: TypeKey,
    pub is_async: bool,
}

impl DelegateSignature {
    /// A synchronous delegate with no parameters.
    pub fn returning(returns: impl Into<TypeKey>) -> Self {
        Self {
            parameters: Vec::new(),
            returns: returns.into(),
            is_async: false,
        }
    }

    /// Append a parameter.
    pub fn param(mut self, param: DelegateParam) -> Self {
        self.parameters.push(param);
        self
    }

    /// Mark the delegate as returning a task.
    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }
}

/// What sort of type a [`TypeInfo`] describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Delegate(DelegateSignature),
    /// Collection of every binding convertible to `element`
    Array { element: TypeKey },
    /// `IFactory<T>` / `IAsyncFactory<T>` contract
    Factory { target: TypeKey, is_async: bool },
    Nullable { underlying: TypeKey },
    /// The host failed to bind this type
    Error,
}

/// Post-construction initialization a type requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Initialization {
    #[default]
    None,
    Sync,
    Async,
}

/// How an instance of a type must be disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Disposal {
    #[default]
    None,
    Sync,
    Async,
}

/// Everything the planner needs to know about one type.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    key: TypeKey,
    kind: TypeKind,
    is_public: bool,
    is_open_generic: bool,
    constructors: Vec<Constructor>,
    /// The implicit parameterless constructor is dropped once one is declared
    implicit_constructor: bool,
    supertypes: Vec<TypeKey>,
    initialization: Initialization,
    disposal: Disposal,
}

impl TypeInfo {
    fn with_kind(key: impl Into<TypeKey>, kind: TypeKind) -> Self {
        let implicit_constructor = matches!(kind, TypeKind::Class | TypeKind::Struct);
        Self {
            key: key.into(),
            kind,
            is_public: true,
            is_open_generic: false,
            constructors: if implicit_constructor {
                vec![Constructor::parameterless()]
            } else {
                Vec::new()
            },
            implicit_constructor,
            supertypes: Vec::new(),
            initialization: Initialization::None,
            disposal: Disposal::None,
        }
    }

    /// A public class with an implicit parameterless constructor.
    pub fn class(key: impl Into<TypeKey>) -> Self {
        Self::with_kind(key, TypeKind::Class)
    }

    /// A public value type.
    pub fn structure(key: impl Into<TypeKey>) -> Self {
        Self::with_kind(key, TypeKind::Struct)
    }

    pub fn interface(key: impl Into<TypeKey>) -> Self {
        Self::with_kind(key, TypeKind::Interface)
    }

    pub fn delegate(key: impl Into<TypeKey>, signature: DelegateSignature) -> Self {
        Self::with_kind(key, TypeKind::Delegate(signature))
    }

    pub fn array(key: impl Into<TypeKey>, element: impl Into<TypeKey>) -> Self {
        Self::with_kind(
            key,
            TypeKind::Array {
                element: element.into(),
            },
        )
    }

    /// An `IFactory<T>` contract.
    pub fn factory(key: impl Into<TypeKey>, target: impl Into<TypeKey>) -> Self {
        Self::with_kind(
            key,
            TypeKind::Factory {
                target: target.into(),
                is_async: false,
            },
        )
    }

    /// An `IAsyncFactory<T>` contract.
    pub fn async_factory(key: impl Into<TypeKey>, target: impl Into<TypeKey>) -> Self {
        Self::with_kind(
            key,
            TypeKind::Factory {
                target: target.into(),
                is_async: true,
            },
        )
    }

    pub fn nullable(key: impl Into<TypeKey>, underlying: impl Into<TypeKey>) -> Self {
        Self::with_kind(
            key,
            TypeKind::Nullable {
                underlying: underlying.into(),
            },
        )
    }

    /// A type the host could not bind.
    pub fn error(key: impl Into<TypeKey>) -> Self {
        Self::with_kind(key, TypeKind::Error)
    }

    /// Declare a constructor. The first declared constructor replaces the
    /// implicit parameterless one.
    pub fn constructor(mut self, parameters: impl IntoIterator<Item = Parameter>) -> Self {
        self.push_constructor(Constructor::new(parameters));
        self
    }

    /// Declare a constructor with explicit accessibility.
    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.push_constructor(constructor);
        self
    }

    /// Remove every constructor, including the implicit one.
    pub fn without_constructors(mut self) -> Self {
        self.constructors.clear();
        self.implicit_constructor = false;
        self
    }

    fn push_constructor(&mut self, constructor: Constructor) {
        if self.implicit_constructor {
            self.constructors.clear();
            self.implicit_constructor = false;
        }
        self.constructors.push(constructor);
    }

    /// Add a direct supertype (base class or implemented interface).
    pub fn implements(mut self, supertype: impl Into<TypeKey>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn internal(mut self) -> Self {
        self.is_public = false;
        self
    }

    pub fn open_generic(mut self) -> Self {
        self.is_open_generic = true;
        self
    }

    pub fn requires_initialization(mut self) -> Self {
        self.initialization = Initialization::Sync;
        self
    }

    pub fn requires_async_initialization(mut self) -> Self {
        self.initialization = Initialization::Async;
        self
    }

    pub fn disposable(mut self) -> Self {
        self.disposal = Disposal::Sync;
        self
    }

    pub fn async_disposable(mut self) -> Self {
        self.disposal = Disposal::Async;
        self
    }

    #[inline]
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        self.is_public
    }

    #[inline]
    pub fn is_open_generic(&self) -> bool {
        self.is_open_generic
    }

    #[inline]
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    #[inline]
    pub fn supertypes(&self) -> &[TypeKey] {
        &self.supertypes
    }

    #[inline]
    pub fn initialization(&self) -> Initialization {
        self.initialization
    }

    #[inline]
    pub fn disposal(&self) -> Disposal {
        self.disposal
    }

    /// Value types cannot be shared as single instances.
    #[inline]
    pub fn is_value_type(&self) -> bool {
        matches!(self.kind, TypeKind::Struct | TypeKind::Nullable { .. })
    }

    /// Error types and open generics can never be registered.
    #[inline]
    pub fn is_registerable(&self) -> bool {
        !self.is_open_generic && self.kind != TypeKind::Error
    }
}

/// How a value of one type becomes a value of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversion {
    Identity,
    ImplicitReference,
    Boxing,
    Nullable,
}

type Closure = IndexMap<TypeKey, IndexSet<TypeKey, RandomState>, RandomState>;

/// The set of types known to the planner.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    types: IndexMap<TypeKey, TypeInfo, RandomState>,
    /// Transitive supertypes, computed on the first conversion query
    closure: OnceCell<Closure>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type, replacing any previous description with the same key.
    pub fn insert(&mut self, info: TypeInfo) {
        self.closure = OnceCell::new();
        self.types.insert(info.key.clone(), info);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, info: TypeInfo) -> Self {
        self.insert(info);
        self
    }

    #[inline]
    pub fn get(&self, key: &TypeKey) -> Option<&TypeInfo> {
        self.types.get(key)
    }

    #[inline]
    pub fn kind(&self, key: &TypeKey) -> Option<&TypeKind> {
        self.get(key).map(TypeInfo::kind)
    }

    #[inline]
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.types.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn is_value_type(&self, key: &TypeKey) -> bool {
        self.get(key).is_some_and(TypeInfo::is_value_type)
    }

    /// The conversion that applies from `from` to `to`, if any.
    ///
    /// User-defined conversions are never considered.
    pub fn conversion(&self, from: &TypeKey, to: &TypeKey) -> Option<Conversion> {
        if from == to {
            return Some(Conversion::Identity);
        }

        let from_info = self.get(from)?;

        if let Some(TypeKind::Nullable { underlying }) = self.kind(to) {
            if underlying == from && from_info.kind == TypeKind::Struct {
                return Some(Conversion::Nullable);
            }
        }

        let supertypes = self.closure().get(from)?;
        if !supertypes.contains(to) {
            return None;
        }

        match from_info.kind {
            TypeKind::Struct => Some(Conversion::Boxing),
            TypeKind::Nullable { .. } | TypeKind::Error => None,
            _ => Some(Conversion::ImplicitReference),
        }
    }

    /// Whether `from` can be used where `to` is expected.
    #[inline]
    pub fn is_convertible(&self, from: &TypeKey, to: &TypeKey) -> bool {
        self.conversion(from, to).is_some()
    }

    fn closure(&self) -> &Closure {
        self.closure.get_or_init(|| {
            let mut closure = Closure::default();
            for key in self.types.keys() {
                let mut seen = IndexSet::<TypeKey, RandomState>::default();
                let mut pending: Vec<&TypeKey> = self.types[key].supertypes.iter().collect();
                while let Some(next) = pending.pop() {
                    if next == key || !seen.insert(next.clone()) {
                        continue;
                    }
                    if let Some(info) = self.types.get(next) {
                        pending.extend(info.supertypes.iter());
                    }
                }
                closure.insert(key.clone(), seen);
            }
            closure
        })
    }
}
