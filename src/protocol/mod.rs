//! Wire protocols.
//!
//! Each protocol turns a [`BuiltRequest`] into an [`OperationRequest`] and a
//! [`RawResponse`] into a JSON value. Error responses become
//! [`OperationError::ServiceFailure`](crate::error::OperationError::ServiceFailure).
//!
//! | Protocol   | Request                                   | Response |
//! |------------|-------------------------------------------|----------|
//! | `Query`    | form-encoded `POST /` with `Action`       | XML      |
//! | `Json`     | `POST /` with `X-Amz-Target`              | JSON     |
//! | `RestJson` | URI labels, query, headers and JSON body  | JSON     |

mod json;
mod query;
mod rest_json;
pub mod xml;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::builders::BuiltRequest;
use crate::error::OperationResult;
use crate::http::{OperationRequest, RawResponse};
use crate::model::{OperationDescriptor, Protocol, Shape};

/// Characters left unescaped: RFC 3986 unreserved.
const UNRESERVED: AsciiSet = NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Encode set for query strings, form bodies and URI labels.
pub const URI_ENCODE_SET: &AsciiSet = &UNRESERVED;

/// Encode set for greedy (`{Label+}`) URI labels, which keep `/`.
pub const GREEDY_LABEL_ENCODE_SET: &AsciiSet = &UNRESERVED.remove(b'/');

/// Encode a built request for its operation's protocol.
pub fn encode_request(descriptor: &OperationDescriptor, request: &BuiltRequest) -> OperationResult<OperationRequest> {
    match descriptor.protocol() {
        Protocol::Query => query::encode(descriptor, request),
        Protocol::Json => json::encode(descriptor, request),
        Protocol::RestJson => rest_json::encode(descriptor, request),
    }
}

/// Decode a response for its operation's protocol.
pub fn decode_response(descriptor: &OperationDescriptor, response: &RawResponse) -> OperationResult<Value> {
    match descriptor.protocol() {
        Protocol::Query => query::decode(descriptor, response),
        Protocol::Json | Protocol::RestJson => json::decode(descriptor, response),
    }
}

/// Render a scalar for a query string, header or form field.
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Rename structure members to their JSON wire names.
pub(crate) fn to_json_wire(shape: &Shape, value: &Value) -> Value {
    match (shape, value) {
        (Shape::Structure(members), Value::Object(fields)) => {
            let mut out = Map::new();
            for member in members {
                if let Some(v) = fields.get(&member.name) {
                    out.insert(member.wire_name().to_string(), to_json_wire(&member.shape, v));
                }
            }
            Value::Object(out)
        }
        (Shape::List(item), Value::Array(items)) => {
            Value::Array(items.iter().map(|v| to_json_wire(item, v)).collect())
        }
        (Shape::Map(inner), Value::Object(entries)) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), to_json_wire(inner, v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Restore member names on top-level response fields that travel under a
/// different wire name (`tags` back to `Tags`).
pub(crate) fn from_json_wire(descriptor: &OperationDescriptor, value: Value) -> Value {
    let Value::Object(mut fields) = value else {
        return value;
    };

    for spec in &descriptor.params {
        let wire = spec.wire_name();
        if wire == spec.name
            || fields.contains_key(&spec.name)
            || !descriptor.response_fields.iter().any(|f| f == &spec.name)
        {
            continue;
        }
        if let Some(v) = fields.remove(wire) {
            fields.insert(spec.name.clone(), v);
        }
    }

    Value::Object(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParamSpec, ScalarType, ServiceDescriptor};
    use percent_encoding::utf8_percent_encode;
    use serde_json::json;

    #[test]
    fn test_encode_sets() {
        assert_eq!(utf8_percent_encode("a b/c~d", URI_ENCODE_SET).to_string(), "a%20b%2Fc~d");
        assert_eq!(utf8_percent_encode("a b/c", GREEDY_LABEL_ENCODE_SET).to_string(), "a%20b/c");
    }

    #[test]
    fn test_scalar_to_string() {
        assert_eq!(scalar_to_string(&json!("x")), "x");
        assert_eq!(scalar_to_string(&json!(30)), "30");
        assert_eq!(scalar_to_string(&json!(true)), "true");
        assert_eq!(scalar_to_string(&Value::Null), "");
    }

    #[test]
    fn test_to_json_wire_renames_members() {
        let shape = Shape::Structure(vec![
            ParamSpec::string_map("Tags").serialized_as("tags"),
            ParamSpec::new("Count", Shape::Scalar(ScalarType::Integer)),
        ]);
        let value = json!({"Tags": {"env": "prod"}, "Count": 2});
        assert_eq!(to_json_wire(&shape, &value), json!({"tags": {"env": "prod"}, "Count": 2}));
    }

    #[test]
    fn test_from_json_wire_restores_declared_fields() {
        let service = ServiceDescriptor::new("Widgets", "widgets", Protocol::RestJson);
        let descriptor = OperationDescriptor::new(service, "CreateWidget")
            .param(ParamSpec::string_map("Tags").serialized_as("tags"))
            .param(ParamSpec::string_map("Labels").serialized_as("labels"))
            .response_fields(["Name", "Tags"]);

        let decoded = from_json_wire(
            &descriptor,
            json!({"Name": "w", "tags": {"env": "prod"}, "labels": {"a": "b"}}),
        );
        // `Labels` is not a declared response field, so `labels` stays as sent.
        assert_eq!(decoded, json!({"Name": "w", "Tags": {"env": "prod"}, "labels": {"a": "b"}}));

        assert_eq!(from_json_wire(&descriptor, json!([1, 2])), json!([1, 2]));
    }
}
