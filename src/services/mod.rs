//! Built-in service catalog.
//!
//! Each submodule describes the operations of one AWS service as
//! [`OperationDescriptor`]s. The generic engine in [`crate::client`] runs
//! them; nothing here talks to the network.
//!
//! - **elb**: Elastic Load Balancing (Query protocol)
//! - **mediatailor**: AWS Elemental MediaTailor (REST-JSON protocol)
//!
//! More operations can be loaded at runtime with
//! [`OperationRegistry::extend_from_json`](crate::model::OperationRegistry::extend_from_json).

pub mod elb;
pub mod mediatailor;

use crate::model::OperationDescriptor;

/// Every built-in operation descriptor.
pub fn builtin_descriptors() -> Vec<OperationDescriptor> {
    let mut descriptors = elb::operations();
    descriptors.extend(mediatailor::operations());
    descriptors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Location;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_is_consistent() {
        let descriptors = builtin_descriptors();
        let names: HashSet<String> = descriptors.iter().map(|d| d.qualified_name()).collect();
        assert_eq!(names.len(), descriptors.len());

        for op in &descriptors {
            if let Err(e) = op.validate() {
                panic!("{}", e);
            }
            for spec in op.params.iter().filter(|p| p.location == Location::Path) {
                assert!(op.http.uri.contains(&format!("{{{}", spec.name)), "{} is unbound", spec.name);
            }
        }
    }
}
