//! Mock implementations for testing.
//!
//! [`MockTransport`] replays queued responses and records every request it
//! is sent, so tests can assert on call counts and on the exact tokens and
//! members each page carried.

mod transport;

pub use transport::{MockResponse, MockTransport, RecordedRequest};

/// Canned response bodies.
pub struct TestFixtures;

impl TestFixtures {
    /// A `DescribeLoadBalancers` response page.
    pub fn describe_load_balancers_xml(names: &[&str], next_marker: Option<&str>) -> String {
        let members: String = names
            .iter()
            .map(|name| {
                format!(
                    "<member><LoadBalancerName>{}</LoadBalancerName><Scheme>internet-facing</Scheme></member>",
                    name
                )
            })
            .collect();
        let marker = next_marker
            .map(|m| format!("<NextMarker>{}</NextMarker>", m))
            .unwrap_or_default();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<DescribeLoadBalancersResponse xmlns="http://elasticloadbalancing.amazonaws.com/doc/2012-06-01/">
  <DescribeLoadBalancersResult>
    <LoadBalancerDescriptions>{}</LoadBalancerDescriptions>
    {}
  </DescribeLoadBalancersResult>
  <ResponseMetadata><RequestId>83c88b9d-12b7-11e3-8b82-87b12EXAMPLE</RequestId></ResponseMetadata>
</DescribeLoadBalancersResponse>"#,
            members, marker
        )
    }

    /// A subnet-list response for attach/detach operations.
    pub fn subnets_xml(operation: &str, subnets: &[&str]) -> String {
        let members: String = subnets.iter().map(|s| format!("<member>{}</member>", s)).collect();
        format!(
            r#"<{op}Response xmlns="http://elasticloadbalancing.amazonaws.com/doc/2012-06-01/">
  <{op}Result><Subnets>{members}</Subnets></{op}Result>
  <ResponseMetadata><RequestId>07b1ecbc-1100-11e3-acaf-dd7edEXAMPLE</RequestId></ResponseMetadata>
</{op}Response>"#,
            op = operation,
            members = members
        )
    }

    /// A Query-protocol error body.
    pub fn query_error_xml(code: &str, message: &str) -> String {
        format!(
            r#"<ErrorResponse xmlns="http://elasticloadbalancing.amazonaws.com/doc/2012-06-01/">
  <Error><Type>Sender</Type><Code>{}</Code><Message>{}</Message></Error>
  <RequestId>test-request-id</RequestId>
</ErrorResponse>"#,
            code, message
        )
    }

    /// A REST-JSON list page.
    pub fn items_json(items: &[serde_json::Value], next_token: Option<&str>) -> String {
        let mut page = serde_json::json!({ "Items": items });
        if let Some(token) = next_token {
            page["NextToken"] = serde_json::Value::String(token.to_string());
        }
        page.to_string()
    }
}
