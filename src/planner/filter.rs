//! Resource selection by kind and name.

use std::collections::BTreeSet;

use crate::resource::{ResourceDescriptor, ResourceKind};

/// Restricts a run to a subset of resources.
///
/// An unset criterion matches everything. When both are set a resource
/// must satisfy both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    kinds: Option<BTreeSet<ResourceKind>>,
    names: Option<BTreeSet<String>>,
}

impl ResourceFilter {
    /// A filter that selects everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts to the given kinds. An empty list leaves kinds unrestricted.
    #[must_use]
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ResourceKind>) -> Self {
        let kinds: BTreeSet<ResourceKind> = kinds.into_iter().collect();
        self.kinds = (!kinds.is_empty()).then_some(kinds);
        self
    }

    /// Restricts to the given names. An empty list leaves names unrestricted.
    #[must_use]
    pub fn with_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        self.names = (!names.is_empty()).then_some(names);
        self
    }

    /// Whether a resource with this identity is selected.
    #[must_use]
    pub fn matches(&self, kind: ResourceKind, name: &str) -> bool {
        self.kinds.as_ref().is_none_or(|kinds| kinds.contains(&kind))
            && self.names.as_ref().is_none_or(|names| names.contains(name))
    }

    /// Whether a descriptor is selected.
    #[must_use]
    pub fn selects(&self, descriptor: &ResourceDescriptor) -> bool {
        self.matches(descriptor.kind(), descriptor.name())
    }

    /// True if the filter selects everything.
    #[must_use]
    pub const fn is_unrestricted(&self) -> bool {
        self.kinds.is_none() && self.names.is_none()
    }
}
