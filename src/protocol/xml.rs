//! XML to JSON conversion for Query-protocol responses.
//!
//! Conversion rules:
//!
//! - An element with no children becomes its text, or `null` if empty.
//! - An element whose children are all `<member>` becomes an array.
//! - Any other element becomes an object; a child name that repeats
//!   becomes an array.
//!
//! Attributes and namespaces are dropped. All leaf values are strings.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::{OperationError, OperationResult};

#[derive(Debug, Default)]
struct Node {
    name: String,
    children: Vec<Node>,
    text: String,
}

impl Node {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    fn into_value(self) -> Value {
        if self.children.is_empty() {
            return if self.text.is_empty() {
                Value::Null
            } else {
                Value::String(self.text)
            };
        }

        if self.children.iter().all(|c| c.name == "member") {
            return Value::Array(self.children.into_iter().map(Node::into_value).collect());
        }

        let mut groups: Vec<(String, Vec<Value>)> = Vec::new();
        for child in self.children {
            let name = child.name.clone();
            let value = child.into_value();
            match groups.iter_mut().find(|(n, _)| *n == name) {
                Some((_, values)) => values.push(value),
                None => groups.push((name, vec![value])),
            }
        }

        let mut map = Map::new();
        for (name, mut values) in groups {
            let value = if values.len() == 1 {
                values.pop().unwrap_or(Value::Null)
            } else {
                Value::Array(values)
            };
            map.insert(name, value);
        }
        Value::Object(map)
    }
}

/// Parse an XML document, returning the root element name and its value.
///
/// ```rust
/// use aws_operations::protocol::xml::parse_document;
/// use serde_json::json;
///
/// let (root, value) = parse_document(
///     "<R><Subnets><member>a</member><member>b</member></Subnets></R>",
/// ).unwrap();
/// assert_eq!(root, "R");
/// assert_eq!(value, json!({"Subnets": ["a", "b"]}));
/// ```
pub fn parse_document(xml: &str) -> OperationResult<(String, Value)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                stack.push(Node::new(name));
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                attach(&mut stack, &mut root, Node::new(name));
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(xml_error)?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                let node = stack.pop().ok_or_else(|| OperationError::Serialization {
                    message: "Unbalanced XML response".to_string(),
                })?;
                attach(&mut stack, &mut root, node);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }

    let root = root.ok_or_else(|| OperationError::Serialization {
        message: "XML response has no root element".to_string(),
    })?;
    let name = root.name.clone();
    Ok((name, root.into_value()))
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => *root = Some(node),
    }
}

fn xml_error(e: impl std::fmt::Display) -> OperationError {
    OperationError::Serialization {
        message: format!("Failed to parse XML response: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_elements_and_lists() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<DescribeLoadBalancersResponse xmlns="http://elasticloadbalancing.amazonaws.com/doc/2012-06-01/">
  <DescribeLoadBalancersResult>
    <LoadBalancerDescriptions>
      <member>
        <LoadBalancerName>web</LoadBalancerName>
        <Subnets>
          <member>subnet-1</member>
        </Subnets>
        <HealthCheck>
          <Target>HTTP:80/</Target>
          <Interval>30</Interval>
        </HealthCheck>
      </member>
    </LoadBalancerDescriptions>
    <NextMarker/>
  </DescribeLoadBalancersResult>
</DescribeLoadBalancersResponse>"#;

        let (root, value) = parse_document(xml).unwrap();
        assert_eq!(root, "DescribeLoadBalancersResponse");
        assert_eq!(
            value,
            json!({
                "DescribeLoadBalancersResult": {
                    "LoadBalancerDescriptions": [{
                        "LoadBalancerName": "web",
                        "Subnets": ["subnet-1"],
                        "HealthCheck": {"Target": "HTTP:80/", "Interval": "30"}
                    }],
                    "NextMarker": null
                }
            })
        );
    }

    #[test]
    fn test_repeated_children_become_array() {
        let (_, value) = parse_document("<R><Item>a</Item><Item>b</Item><Other>c</Other></R>").unwrap();
        assert_eq!(value, json!({"Item": ["a", "b"], "Other": "c"}));
    }

    #[test]
    fn test_escaped_text_and_cdata() {
        let (_, value) = parse_document("<R><A>x &amp; y</A><B><![CDATA[<raw>]]></B></R>").unwrap();
        assert_eq!(value, json!({"A": "x & y", "B": "<raw>"}));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            parse_document("<R><A></B></R>"),
            Err(OperationError::Serialization { .. })
        ));
        assert!(matches!(parse_document(""), Err(OperationError::Serialization { .. })));
    }
}
