//! Elastic Load Balancing (classic) operations.
//!
//! Query protocol, API version `2012-06-01`.

use crate::model::{
    ConfirmImpact, OperationDescriptor, PaginationDescriptor, ParamSpec, Protocol, ServiceDescriptor,
};

/// API version sent with every request.
pub const API_VERSION: &str = "2012-06-01";

/// The ELB service descriptor.
pub fn service() -> ServiceDescriptor {
    ServiceDescriptor::new("ELB", "elasticloadbalancing", Protocol::Query).with_api_version(API_VERSION)
}

/// All ELB operations in the catalog.
pub fn operations() -> Vec<OperationDescriptor> {
    vec![
        detach_load_balancer_from_subnets(),
        attach_load_balancer_to_subnets(),
        describe_load_balancers(),
        configure_health_check(),
        delete_load_balancer(),
    ]
}

/// Removes subnets from a load balancer; returns the remaining subnets.
pub fn detach_load_balancer_from_subnets() -> OperationDescriptor {
    OperationDescriptor::new(service(), "DetachLoadBalancerFromSubnets")
        .param(ParamSpec::string("LoadBalancerName").required())
        .param(ParamSpec::string_list("Subnets").required())
        .response_fields(["Subnets"])
        .default_selector("Subnets")
        .confirm_impact(ConfirmImpact::Medium)
}

/// Adds subnets to a load balancer; returns all attached subnets.
pub fn attach_load_balancer_to_subnets() -> OperationDescriptor {
    OperationDescriptor::new(service(), "AttachLoadBalancerToSubnets")
        .param(ParamSpec::string("LoadBalancerName").required())
        .param(ParamSpec::string_list("Subnets").required())
        .response_fields(["Subnets"])
        .default_selector("Subnets")
        .confirm_impact(ConfirmImpact::Medium)
}

/// Describes load balancers, one `Marker` page at a time.
pub fn describe_load_balancers() -> OperationDescriptor {
    OperationDescriptor::new(service(), "DescribeLoadBalancers")
        .param(ParamSpec::string_list("LoadBalancerNames"))
        .param(ParamSpec::string("Marker"))
        .param(ParamSpec::integer("PageSize"))
        .response_fields(["LoadBalancerDescriptions", "NextMarker"])
        .default_selector("LoadBalancerDescriptions")
        .paginated(PaginationDescriptor::new("Marker", "NextMarker", "LoadBalancerDescriptions").with_page_size("PageSize"))
}

/// Replaces the health check of a load balancer.
///
/// Every member of `HealthCheck` is required once the structure is supplied.
pub fn configure_health_check() -> OperationDescriptor {
    OperationDescriptor::new(service(), "ConfigureHealthCheck")
        .param(ParamSpec::string("LoadBalancerName").required())
        .param(
            ParamSpec::structure(
                "HealthCheck",
                vec![
                    ParamSpec::string("Target").required(),
                    ParamSpec::integer("Interval").required(),
                    ParamSpec::integer("Timeout").required(),
                    ParamSpec::integer("UnhealthyThreshold").required(),
                    ParamSpec::integer("HealthyThreshold").required(),
                ],
            )
            .required(),
        )
        .response_fields(["HealthCheck"])
        .default_selector("HealthCheck")
        .confirm_impact(ConfirmImpact::Medium)
}

/// Deletes a load balancer.
pub fn delete_load_balancer() -> OperationDescriptor {
    OperationDescriptor::new(service(), "DeleteLoadBalancer")
        .param(ParamSpec::string("LoadBalancerName").required())
        .default_selector("*")
        .confirm_impact(ConfirmImpact::High)
}
