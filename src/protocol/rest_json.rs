//! AWS REST-JSON protocol.
//!
//! The URI template's `{Label}` placeholders are filled from path
//! parameters; query and header parameters go where their location says;
//! everything else forms the JSON body.

use percent_encoding::utf8_percent_encode;
use serde_json::Value;

use super::json::body_members;
use super::{scalar_to_string, GREEDY_LABEL_ENCODE_SET, URI_ENCODE_SET};
use crate::builders::BuiltRequest;
use crate::error::{OperationError, OperationResult};
use crate::http::OperationRequest;
use crate::model::{Location, OperationDescriptor};

const JSON_CONTENT_TYPE: &str = "application/json";

pub(super) fn encode(descriptor: &OperationDescriptor, request: &BuiltRequest) -> OperationResult<OperationRequest> {
    let (template, static_query) = match descriptor.http.uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (descriptor.http.uri.as_str(), None),
    };

    let path = expand_uri(template, descriptor, request)?;
    let mut out = OperationRequest::new(descriptor.http.method, path);

    if let Some(query) = static_query {
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            out = out.query(k, v);
        }
    }

    for spec in &descriptor.params {
        let Some(value) = request.member(&spec.name) else {
            continue;
        };
        match &spec.location {
            Location::Query(name) => match value {
                Value::Array(items) => {
                    for item in items {
                        out = out.query(name.as_str(), scalar_to_string(item));
                    }
                }
                Value::Object(entries) => {
                    for (k, v) in entries {
                        out = out.query(k.as_str(), scalar_to_string(v));
                    }
                }
                scalar => out = out.query(name.as_str(), scalar_to_string(scalar)),
            },
            Location::Header(name) => {
                let header_value = match value {
                    Value::Array(items) => items.iter().map(scalar_to_string).collect::<Vec<_>>().join(","),
                    scalar => scalar_to_string(scalar),
                };
                out = out.header(name, header_value)?;
            }
            Location::Path | Location::Body => {}
        }
    }

    let has_body = descriptor.params.iter().any(|p| p.location == Location::Body);
    if has_body {
        let body = serde_json::to_vec(&Value::Object(body_members(descriptor, request)))?;
        out = out.body(body, JSON_CONTENT_TYPE);
    }

    Ok(out)
}

/// Fill `{Label}` and `{Label+}` placeholders.
fn expand_uri(template: &str, descriptor: &OperationDescriptor, request: &BuiltRequest) -> OperationResult<String> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        path.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| OperationError::Configuration {
            message: format!("Unterminated label in URI template '{}'", template),
            source: None,
        })?;

        let label = &after[..end];
        let (name, greedy) = match label.strip_suffix('+') {
            Some(name) => (name, true),
            None => (label, false),
        };

        let bound = descriptor
            .params
            .iter()
            .any(|p| p.name == name && p.location == Location::Path);
        if !bound {
            return Err(OperationError::Configuration {
                message: format!("URI label '{}' of {} has no path parameter", name, descriptor.name),
                source: None,
            });
        }

        let value = request
            .member(name)
            .map(scalar_to_string)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| OperationError::missing_field(name))?;

        let set = if greedy { GREEDY_LABEL_ENCODE_SET } else { URI_ENCODE_SET };
        path.push_str(&utf8_percent_encode(&value, set).to_string());

        rest = &after[end + 1..];
    }
    path.push_str(rest);

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{Inputs, RequestBuilder};
    use crate::http::HttpMethod;
    use crate::model::{ParamSpec, Protocol, ServiceDescriptor};
    use serde_json::json;

    fn service() -> ServiceDescriptor {
        ServiceDescriptor::new("Media", "api.media", Protocol::RestJson)
    }

    #[test]
    fn test_path_query_header_and_body() {
        let op = OperationDescriptor::new(service(), "PutThing")
            .http(HttpMethod::PUT, "/things/{ThingName}/{Key+}?versioning")
            .param(ParamSpec::string("ThingName").required().in_path())
            .param(ParamSpec::string("Key").required().in_path())
            .param(ParamSpec::integer("MaxResults").in_query("maxResults"))
            .param(ParamSpec::string_list("Ids").in_query("id"))
            .param(ParamSpec::string("Token").in_header("X-Thing-Token"))
            .param(ParamSpec::string("Tier"))
            .param(ParamSpec::string_map("Tags").serialized_as("tags"));

        let inputs = Inputs::new()
            .with("ThingName", "my thing")
            .with("Key", "a/b c")
            .with("MaxResults", "10")
            .with("Ids", json!(["1", "2"]))
            .with("Token", "secret")
            .with("Tier", "BASIC")
            .with("Tags", json!({"env": "prod"}));
        let built = RequestBuilder::new(&op).build(&inputs).unwrap();

        let request = encode(&op, &built).unwrap();
        assert_eq!(request.method(), HttpMethod::PUT);
        assert_eq!(request.path(), "/things/my%20thing/a/b%20c");
        assert_eq!(
            request.query_params(),
            &[
                ("versioning".to_string(), String::new()),
                ("maxResults".to_string(), "10".to_string()),
                ("id".to_string(), "1".to_string()),
                ("id".to_string(), "2".to_string()),
            ]
        );
        assert_eq!(request.headers().get("x-thing-token").unwrap(), "secret");

        let body: Value = serde_json::from_slice(request.body_bytes().unwrap()).unwrap();
        assert_eq!(body, json!({"Tier": "BASIC", "tags": {"env": "prod"}}));
    }

    #[test]
    fn test_no_body_params_means_no_body() {
        let op = OperationDescriptor::new(service(), "DeleteThing")
            .http(HttpMethod::DELETE, "/things/{ThingName}")
            .param(ParamSpec::string("ThingName").required().in_path());
        let built = RequestBuilder::new(&op).build(&Inputs::new().with("ThingName", "t")).unwrap();

        let request = encode(&op, &built).unwrap();
        assert_eq!(request.path(), "/things/t");
        assert!(request.body_bytes().is_none());
    }

    #[test]
    fn test_unbound_label_is_configuration_error() {
        let op = OperationDescriptor::new(service(), "GetThing").http(HttpMethod::GET, "/things/{ThingName}");
        let built = RequestBuilder::new(&op).build(&Inputs::new()).unwrap();
        assert!(matches!(encode(&op, &built), Err(OperationError::Configuration { .. })));
    }

    #[test]
    fn test_missing_label_value() {
        let op = OperationDescriptor::new(service(), "GetThing")
            .http(HttpMethod::GET, "/things/{ThingName}")
            .param(ParamSpec::string("ThingName").in_path());
        let built = RequestBuilder::new(&op).build(&Inputs::new()).unwrap();
        assert!(matches!(
            encode(&op, &built),
            Err(OperationError::MissingRequiredField { field }) if field == "ThingName"
        ));
    }
}
