//! Policy-aware conversion between HTML and Telegraph content.
//!
//! [`Converter`] owns a [`Policy`] and exposes the three conversions the API
//! client needs: HTML to nodes, nodes to HTML, and JSON to nodes.
//!
//! # Example
//!
//! ```rust
//! use telegraph_core::{Converter, TagRule};
//!
//! let mut converter = Converter::new();
//! converter
//!     .policy_mut()
//!     .set_tag_rules([("h1", TagRule::from("h3")), ("footer", TagRule::Delete)])
//!     .unwrap();
//!
//! let nodes = converter.html_to_content_tree("<h1>Title</h1><footer>Copyright</footer>").unwrap();
//! assert_eq!(converter.content_tree_to_html(&nodes).unwrap(), "<h3>Title</h3>");
//! ```

use crate::Result;
use crate::codec;
use crate::node::ContentNode;
use crate::parse::html_to_nodes;
use crate::policy::Policy;
use crate::serialize::nodes_to_html;

/// Converts between HTML fragments, content nodes and their JSON form.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    policy: Policy,
}

impl Converter {
    /// Creates a converter with an identity policy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: Policy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut Policy {
        &mut self.policy
    }

    /// Parses an HTML fragment into content nodes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TelegraphError::InvalidHtml`] if the fragment cannot be parsed.
    pub fn html_to_content_tree(&self, html: &str) -> Result<Vec<ContentNode>> {
        html_to_nodes(html, &self.policy)
    }

    /// Renders content nodes as an HTML fragment.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TelegraphError::InvalidContent`] if a tag cannot be
    /// written as markup, or if raw-text content would close its element.
    pub fn content_tree_to_html(&self, nodes: &[ContentNode]) -> Result<String> {
        nodes_to_html(nodes, &self.policy)
    }

    /// Decodes the JSON form of a content tree. No policy is applied.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TelegraphError::InvalidContent`] unless `json` is an
    /// array of nodes.
    pub fn decode_content_tree(&self, json: &str) -> Result<Vec<ContentNode>> {
        codec::decode(json)
    }

    /// Encodes content nodes into their JSON form.
    pub fn encode_content_tree(&self, nodes: &[ContentNode]) -> Result<String> {
        codec::encode(nodes)
    }

    /// Decodes a JSON content tree and renders it as HTML under the policy.
    pub fn json_to_html(&self, json: &str) -> Result<String> {
        let nodes = self.decode_content_tree(json)?;
        self.content_tree_to_html(&nodes)
    }

    /// Parses HTML under the policy and encodes the result as JSON.
    pub fn html_to_json(&self, html: &str) -> Result<String> {
        let nodes = self.html_to_content_tree(html)?;
        self.encode_content_tree(&nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Element;
    use crate::policy::TagRule;

    #[test]
    fn test_tag_replace_rules_round_trip() {
        let mut converter = Converter::new();
        converter
            .policy_mut()
            .set_tag_rules([
                ("h1", TagRule::from("h3")),
                ("div", TagRule::from("p")),
                ("span", TagRule::from("b")),
                ("footer", TagRule::Delete),
            ])
            .unwrap();

        let source = "<h1>Title</h1><div>First paragraph</div><div>Second <span>paragraph</span></div><footer>Copyright</footer>";
        let nodes = converter.html_to_content_tree(source).unwrap();
        let html = converter.content_tree_to_html(&nodes).unwrap();

        assert_eq!(html, "<h3>Title</h3><p>First paragraph</p><p>Second <b>paragraph</b></p>");
        assert!(converter.policy().has_rule("h1"));
        assert!(!converter.policy().has_rule("h2"));
        assert_eq!(converter.policy().get_rule("footer"), Some(&TagRule::Delete));
    }

    #[test]
    fn test_json_to_html() {
        let converter = Converter::new();
        let html = converter.json_to_html(r#"[{"tag":"p","children":["Hello, ",{"tag":"b","children":["world"]}]}]"#);
        assert_eq!(html.unwrap(), "<p>Hello, <b>world</b></p>");
    }

    #[test]
    fn test_html_to_json() {
        let converter = Converter::new();
        assert_eq!(converter.html_to_json("<p>Hello</p>").unwrap(), r#"[{"tag":"p","children":["Hello"]}]"#);
    }

    #[test]
    fn test_decode_ignores_policy() {
        let mut converter = Converter::new();
        converter.policy_mut().set_tag_rule("p", TagRule::Delete).unwrap();

        let nodes = converter.decode_content_tree(r#"[{"tag":"p"}]"#).unwrap();
        assert_eq!(nodes, vec![Element::new("p").into()]);
        assert_eq!(converter.content_tree_to_html(&nodes).unwrap(), "");
    }
}
