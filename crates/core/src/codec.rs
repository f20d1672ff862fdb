//! JSON encoding of content trees.
//!
//! This is the wire format of the Telegraph API: an array whose items are
//! strings or `{tag, attrs?, children?}` objects. Decoding is purely
//! structural; no policy is applied.

use serde_json::Value;

use crate::node::{ContentNode, json_kind};
use crate::{Result, TelegraphError};

/// Decodes a JSON array of content nodes.
///
/// # Errors
///
/// Returns [`TelegraphError::InvalidContent`] if `json` is not valid JSON,
/// is not an array, or holds an item that is not a node.
pub fn decode(json: &str) -> Result<Vec<ContentNode>> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| TelegraphError::InvalidContent(format!("not valid JSON: {}", e)))?;
    decode_value(value)
}

/// Decodes content nodes from an already parsed JSON value.
pub fn decode_value(value: Value) -> Result<Vec<ContentNode>> {
    match value {
        Value::Array(items) => items.into_iter().map(ContentNode::try_from).collect(),
        other => Err(TelegraphError::InvalidContent(format!(
            "expected an array of nodes, found {}",
            json_kind(&other)
        ))),
    }
}

/// Encodes content nodes as compact JSON.
///
/// Keys come out as `tag`, `attrs`, `children`; absent fields are omitted and
/// non-ASCII text is written literally.
pub fn encode(nodes: &[ContentNode]) -> Result<String> {
    serde_json::to_string(nodes).map_err(|e| TelegraphError::InvalidContent(e.to_string()))
}

/// Encodes content nodes as indented JSON.
pub fn encode_pretty(nodes: &[ContentNode]) -> Result<String> {
    serde_json::to_string_pretty(nodes).map_err(|e| TelegraphError::InvalidContent(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Element;
    use rstest::rstest;

    #[test]
    fn test_decode_paragraph() {
        let nodes = decode(r#"[{"tag":"p","children":["Hello, world!"]}]"#).unwrap();
        assert_eq!(nodes, vec![Element::new("p").with_child("Hello, world!").into()]);
    }

    #[test]
    fn test_encode_is_byte_identical() {
        let json = r#"[{"tag":"p","children":["Hello"]}]"#;
        assert_eq!(encode(&decode(json).unwrap()).unwrap(), json);
    }

    #[test]
    fn test_decode_keeps_attribute_order() {
        let json = r#"[{"tag":"img","attrs":{"src":"/a.png","alt":"A"}}]"#;
        assert_eq!(encode(&decode(json).unwrap()).unwrap(), json);
    }

    #[test]
    fn test_decode_does_not_apply_rules() {
        let nodes = decode(r#"[{"tag":"script","attrs":{"onload":"x()"}}]"#).unwrap();
        let element = nodes[0].as_element().unwrap();
        assert_eq!(element.tag, "script");
        assert_eq!(element.attr("onload"), Some("x()"));
    }

    #[test]
    fn test_decode_collapses_empty_fields() {
        let nodes = decode(r#"[{"tag":"hr","attrs":{},"children":[]}]"#).unwrap();
        assert_eq!(encode(&nodes).unwrap(), r#"[{"tag":"hr"}]"#);
    }

    #[test]
    fn test_encode_keeps_unicode_literal() {
        let nodes = vec![Element::new("p").with_child("Привет, мир ✓").into()];
        assert_eq!(encode(&nodes).unwrap(), r#"[{"tag":"p","children":["Привет, мир ✓"]}]"#);
    }

    #[rstest]
    #[case("{}")]
    #[case("not json")]
    #[case("invalid content")]
    #[case(r#""text""#)]
    #[case("[1]")]
    #[case(r#"[{"children":[]}]"#)]
    fn test_decode_rejects(#[case] json: &str) {
        assert!(matches!(decode(json), Err(TelegraphError::InvalidContent(_))));
    }

    #[test]
    fn test_decode_empty_array() {
        assert!(decode("[]").unwrap().is_empty());
    }
}
