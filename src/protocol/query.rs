//! AWS Query protocol.
//!
//! Requests are form-encoded `POST /` bodies:
//!
//! ```text
//! Action=AttachLoadBalancerToSubnets&Version=2012-06-01
//!   &LoadBalancerName=web&Subnets.member.1=subnet-1&Subnets.member.2=subnet-2
//! ```
//!
//! Structures flatten as `Parent.Member`, lists as `Name.member.N` and maps
//! as `Name.entry.N.key` / `Name.entry.N.value`. Responses are XML wrapped in
//! `<{Action}Response><{Action}Result>`.

use percent_encoding::utf8_percent_encode;
use serde_json::{Map, Value};
use tracing::trace;

use super::{scalar_to_string, xml, URI_ENCODE_SET};
use crate::builders::BuiltRequest;
use crate::error::{service_failure, OperationResult};
use crate::http::{OperationRequest, RawResponse};
use crate::model::{OperationDescriptor, Protocol, Shape};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

pub(super) fn encode(descriptor: &OperationDescriptor, request: &BuiltRequest) -> OperationResult<OperationRequest> {
    let mut params: Vec<(String, String)> = vec![("Action".to_string(), descriptor.name.clone())];
    if let Some(version) = &descriptor.service.api_version {
        params.push(("Version".to_string(), version.clone()));
    }

    for spec in &descriptor.params {
        if let Some(value) = request.member(&spec.name) {
            flatten(&spec.shape, spec.name.clone(), value, &mut params);
        }
    }

    trace!(operation = %descriptor.name, fields = params.len(), "Encoded query request");

    let body = params
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, URI_ENCODE_SET),
                utf8_percent_encode(v, URI_ENCODE_SET)
            )
        })
        .collect::<Vec<_>>()
        .join("&");

    Ok(OperationRequest::post("/").body(body.into_bytes(), FORM_CONTENT_TYPE))
}

fn flatten(shape: &Shape, prefix: String, value: &Value, out: &mut Vec<(String, String)>) {
    match (shape, value) {
        (Shape::List(item), Value::Array(items)) => {
            if items.is_empty() {
                out.push((prefix, String::new()));
                return;
            }
            for (i, v) in items.iter().enumerate() {
                flatten(item, format!("{}.member.{}", prefix, i + 1), v, out);
            }
        }
        (Shape::Map(inner), Value::Object(entries)) => {
            for (i, (k, v)) in entries.iter().enumerate() {
                out.push((format!("{}.entry.{}.key", prefix, i + 1), k.clone()));
                flatten(inner, format!("{}.entry.{}.value", prefix, i + 1), v, out);
            }
        }
        (Shape::Structure(members), Value::Object(fields)) => {
            for member in members {
                if let Some(v) = fields.get(&member.name) {
                    flatten(&member.shape, format!("{}.{}", prefix, member.name), v, out);
                }
            }
        }
        _ => out.push((prefix, scalar_to_string(value))),
    }
}

pub(super) fn decode(descriptor: &OperationDescriptor, response: &RawResponse) -> OperationResult<Value> {
    if !response.is_success() {
        return Err(service_failure(
            response.status().as_u16(),
            response.headers(),
            response.body(),
            Protocol::Query,
        ));
    }

    let body = response.body_string()?;
    if body.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let (root, value) = xml::parse_document(body)?;
    trace!(root = %root, "Parsed query response");

    let result_key = format!("{}Result", descriptor.name);
    let result = match value {
        Value::Object(mut fields) => match fields.remove(&result_key) {
            Some(result) => result,
            None => {
                fields.remove("ResponseMetadata");
                Value::Object(fields)
            }
        },
        other => other,
    };

    Ok(match result {
        Value::Null => Value::Object(Map::new()),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{Inputs, RequestBuilder};
    use crate::model::{ParamSpec, ServiceDescriptor};
    use http::StatusCode;
    use serde_json::json;
    use std::collections::HashMap;

    fn descriptor() -> OperationDescriptor {
        let service = ServiceDescriptor::new("ELB", "elasticloadbalancing", Protocol::Query).with_api_version("2012-06-01");
        OperationDescriptor::new(service, "ConfigureThing")
            .param(ParamSpec::string("Name").required())
            .param(ParamSpec::string_list("Subnets"))
            .param(ParamSpec::string_map("Attributes"))
            .param(ParamSpec::structure(
                "Check",
                vec![ParamSpec::string("Target"), ParamSpec::integer("Interval")],
            ))
    }

    fn form(request: &OperationRequest) -> String {
        String::from_utf8(request.body_bytes().unwrap().to_vec()).unwrap()
    }

    #[test]
    fn test_encode_flattens_members() {
        let op = descriptor();
        let inputs = Inputs::new()
            .with("Name", "web lb")
            .with("Subnets", json!(["subnet-1", "subnet-2"]))
            .with("Attributes", json!({"idle": "60"}))
            .with("Check.Target", "HTTP:80/")
            .with("Check.Interval", "30");
        let built = RequestBuilder::new(&op).build(&inputs).unwrap();

        let request = encode(&op, &built).unwrap();
        assert_eq!(request.path(), "/");
        assert_eq!(request.content_type(), Some(FORM_CONTENT_TYPE));
        assert_eq!(
            form(&request),
            "Action=ConfigureThing&Version=2012-06-01&Name=web%20lb\
             &Subnets.member.1=subnet-1&Subnets.member.2=subnet-2\
             &Attributes.entry.1.key=idle&Attributes.entry.1.value=60\
             &Check.Target=HTTP%3A80%2F&Check.Interval=30"
        );
    }

    #[test]
    fn test_encode_omits_absent_members() {
        let op = descriptor();
        let built = RequestBuilder::new(&op).build(&Inputs::new().with("Name", "web")).unwrap();
        assert_eq!(
            form(&encode(&op, &built).unwrap()),
            "Action=ConfigureThing&Version=2012-06-01&Name=web"
        );
    }

    #[test]
    fn test_decode_unwraps_result() {
        let body = r#"<ConfigureThingResponse><ConfigureThingResult><Subnets><member>subnet-1</member></Subnets></ConfigureThingResult><ResponseMetadata><RequestId>r-1</RequestId></ResponseMetadata></ConfigureThingResponse>"#;
        let response = RawResponse::new(StatusCode::OK, HashMap::new(), body.as_bytes().to_vec());
        assert_eq!(decode(&descriptor(), &response).unwrap(), json!({"Subnets": ["subnet-1"]}));
    }

    #[test]
    fn test_decode_leaves_are_strings() {
        let body = r#"<ConfigureThingResponse><ConfigureThingResult><Check><Target>TCP:80</Target><Interval>30</Interval></Check></ConfigureThingResult></ConfigureThingResponse>"#;
        let response = RawResponse::new(StatusCode::OK, HashMap::new(), body.as_bytes().to_vec());
        assert_eq!(
            decode(&descriptor(), &response).unwrap(),
            json!({"Check": {"Target": "TCP:80", "Interval": "30"}})
        );
    }

    #[test]
    fn test_decode_empty_result() {
        let body = r#"<ConfigureThingResponse><ConfigureThingResult/><ResponseMetadata><RequestId>r-1</RequestId></ResponseMetadata></ConfigureThingResponse>"#;
        let response = RawResponse::new(StatusCode::OK, HashMap::new(), body.as_bytes().to_vec());
        assert_eq!(decode(&descriptor(), &response).unwrap(), json!({}));
    }

    #[test]
    fn test_decode_error_response() {
        let body = r#"<ErrorResponse><Error><Type>Sender</Type><Code>LoadBalancerNotFound</Code><Message>There is no ACTIVE Load Balancer named 'web'</Message></Error><RequestId>r-2</RequestId></ErrorResponse>"#;
        let response = RawResponse::new(StatusCode::BAD_REQUEST, HashMap::new(), body.as_bytes().to_vec());

        let err = decode(&descriptor(), &response).unwrap_err();
        assert_eq!(err.error_code(), Some("LoadBalancerNotFound"));
        assert_eq!(err.request_id(), Some("r-2"));
        assert_eq!(err.status(), Some(400));
    }
}
