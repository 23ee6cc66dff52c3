//! AWS JSON 1.1 protocol, and JSON response decoding shared with REST-JSON.

use serde_json::{Map, Value};

use super::{from_json_wire, to_json_wire};
use crate::builders::BuiltRequest;
use crate::error::{service_failure, OperationError, OperationResult};
use crate::http::{OperationRequest, RawResponse};
use crate::model::{Location, OperationDescriptor};

const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

pub(super) fn encode(descriptor: &OperationDescriptor, request: &BuiltRequest) -> OperationResult<OperationRequest> {
    let target_prefix = descriptor
        .service
        .target_prefix
        .as_deref()
        .ok_or_else(|| OperationError::Configuration {
            message: format!("Service {} has no JSON target prefix", descriptor.service.name),
            source: None,
        })?;

    let body = serde_json::to_vec(&Value::Object(body_members(descriptor, request)))?;

    Ok(OperationRequest::post("/")
        .header("X-Amz-Target", format!("{}.{}", target_prefix, descriptor.name))?
        .body(body, JSON_CONTENT_TYPE))
}

/// Body-located members keyed by their JSON wire names.
pub(super) fn body_members(descriptor: &OperationDescriptor, request: &BuiltRequest) -> Map<String, Value> {
    let mut body = Map::new();
    for spec in descriptor.params.iter().filter(|p| p.location == Location::Body) {
        if let Some(value) = request.member(&spec.name) {
            body.insert(spec.wire_name().to_string(), to_json_wire(&spec.shape, value));
        }
    }
    body
}

pub(super) fn decode(descriptor: &OperationDescriptor, response: &RawResponse) -> OperationResult<Value> {
    if !response.is_success() {
        return Err(service_failure(
            response.status().as_u16(),
            response.headers(),
            response.body(),
            descriptor.protocol(),
        ));
    }

    let body = response.body();
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    let value = serde_json::from_slice(body)?;
    Ok(from_json_wire(descriptor, value))
}
