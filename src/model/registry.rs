//! Operation registry.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use tracing::{debug, error};

use super::OperationDescriptor;
use crate::error::{OperationError, OperationResult};
use crate::services;

static BUILTIN: Lazy<OperationRegistry> = Lazy::new(|| {
    let mut registry = OperationRegistry::new();
    for descriptor in services::builtin_descriptors() {
        if let Err(e) = registry.register(descriptor) {
            error!(error = %e, "Skipping built-in operation");
        }
    }
    registry
});

/// Lookup table of operation descriptors keyed by `Service:Operation`.
///
/// ```rust
/// use aws_operations::model::OperationRegistry;
///
/// let registry = OperationRegistry::builtin();
/// let op = registry.resolve("DescribeLoadBalancers").unwrap();
/// assert_eq!(op.qualified_name(), "ELB:DescribeLoadBalancers");
/// assert!(registry.resolve("elb:describeloadbalancers").is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    operations: BTreeMap<String, OperationDescriptor>,
}

impl OperationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in service catalog.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Load descriptors from a JSON array.
    pub fn from_json_str(json: &str) -> OperationResult<Self> {
        let mut registry = Self::new();
        registry.extend_from_json(json)?;
        Ok(registry)
    }

    /// Add descriptors from a JSON array, returning how many were added.
    ///
    /// Nothing is added unless every descriptor validates.
    pub fn extend_from_json(&mut self, json: &str) -> OperationResult<usize> {
        let descriptors: Vec<OperationDescriptor> = serde_json::from_str(json)?;
        for descriptor in &descriptors {
            descriptor.validate()?;
        }

        let count = descriptors.len();
        for descriptor in descriptors {
            self.insert(descriptor);
        }
        Ok(count)
    }

    /// Register a descriptor, returning the one it replaced.
    ///
    /// # Errors
    ///
    /// [`OperationError::Configuration`] if the descriptor fails
    /// [`OperationDescriptor::validate`].
    pub fn register(&mut self, descriptor: OperationDescriptor) -> OperationResult<Option<OperationDescriptor>> {
        descriptor.validate()?;
        Ok(self.insert(descriptor))
    }

    fn insert(&mut self, descriptor: OperationDescriptor) -> Option<OperationDescriptor> {
        let key = descriptor.qualified_name();
        debug!(operation = %key, "Registering operation");
        self.operations.insert(key, descriptor)
    }

    /// Resolve `Service:Operation` or a bare operation name.
    ///
    /// Matching is case-insensitive. A bare name shared by several services
    /// must be qualified.
    pub fn resolve(&self, name: &str) -> OperationResult<&OperationDescriptor> {
        let name = name.trim();

        if name.contains(':') {
            return self
                .operations
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, descriptor)| descriptor)
                .ok_or_else(|| OperationError::UnknownOperation {
                    name: name.to_string(),
                });
        }

        let matches: Vec<&OperationDescriptor> = self
            .operations
            .values()
            .filter(|d| d.name.eq_ignore_ascii_case(name))
            .collect();

        match matches.as_slice() {
            [] => Err(OperationError::UnknownOperation {
                name: name.to_string(),
            }),
            [only] => Ok(only),
            many => Err(OperationError::AmbiguousOperation {
                name: name.to_string(),
                candidates: many.iter().map(|d| d.qualified_name()).collect(),
            }),
        }
    }

    /// All registered descriptors, ordered by qualified name.
    pub fn operations(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.operations.values()
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if no operation is registered.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
