//! Lifetime scopes
//!
//! A [`Scope`] decides how many instances of a binding a container creates
//! and who shares them.

use std::fmt;

/// Lifetime and sharing policy of a binding.
///
/// # Examples
///
/// ```rust
/// use dependency_planner::Scope;
///
/// assert_eq!(Scope::default(), Scope::InstancePerResolution);
/// assert!(Scope::SingleInstance.starts_resolution());
/// assert!(!Scope::InstancePerDependency.is_shared());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum Scope {
    /// A fresh instance for every usage site
    InstancePerDependency,

    /// One instance shared by every usage within one resolution
    #[default]
    InstancePerResolution,

    /// One instance for the lifetime of the container
    SingleInstance,
}

impl Scope {
    /// Whether more than one consumer may observe the same instance.
    #[inline]
    pub fn is_shared(self) -> bool {
        !matches!(self, Scope::InstancePerDependency)
    }

    /// Single instances are computed in a resolution of their own, so their
    /// dependencies never share instances with whoever needed them first.
    #[inline]
    pub fn starts_resolution(self) -> bool {
        matches!(self, Scope::SingleInstance)
    }

    /// Stable lowercase name, used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::InstancePerDependency => "instance_per_dependency",
            Scope::InstancePerResolution => "instance_per_resolution",
            Scope::SingleInstance => "single_instance",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
