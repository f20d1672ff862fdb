//! HTML fragment parsing into content nodes.
//!
//! This module provides the [`Document`] type, which parses an HTML fragment
//! inside a minimal document shell, and [`html_to_nodes`], which walks the
//! body of that document and builds [`ContentNode`]s under a [`Policy`].
//!
//! # Example
//!
//! ```rust
//! use telegraph_core::parse::html_to_nodes;
//! use telegraph_core::{ContentNode, Policy};
//!
//! let nodes = html_to_nodes("<p>Fish &amp; chips</p>", &Policy::new()).unwrap();
//! assert_eq!(nodes[0].text_content(), "Fish & chips");
//! ```

use scraper::{ElementRef, Html, Node, Selector};
use tracing::trace;

use crate::node::{Attributes, ContentNode, Element};
use crate::policy::Policy;
use crate::{Result, TelegraphError};

/// A parsed HTML fragment.
///
/// The fragment is wrapped in a `<html><head>…</head><body>…</body></html>`
/// shell before parsing so the parser places it in the body instead of
/// inferring head content from it.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses an HTML fragment.
    ///
    /// Malformed markup is repaired the way browsers repair it; the repairs
    /// are only reported at `trace` level.
    pub fn parse_fragment(fragment: &str) -> Self {
        let source = format!(
            "<!DOCTYPE html><html lang=\"en\"><head><title>Document</title></head><body>{}</body></html>",
            fragment
        );
        let html = Html::parse_document(&source);

        if !html.errors.is_empty() {
            trace!(errors = html.errors.len(), "recovered from malformed markup");
        }

        Self { html }
    }

    /// Gets the underlying `scraper::Html` instance.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// The `<body>` element holding the fragment.
    ///
    /// # Errors
    ///
    /// Returns [`TelegraphError::InvalidHtml`] if the parsed document has no body.
    pub fn body(&self) -> Result<ElementRef<'_>> {
        let selector =
            Selector::parse("body").map_err(|e| TelegraphError::InvalidHtml(format!("Invalid selector: {}", e)))?;

        self.html
            .select(&selector)
            .next()
            .ok_or_else(|| TelegraphError::InvalidHtml("document has no body".to_string()))
    }
}

/// Converts an HTML fragment into content nodes.
///
/// Elements whose tag the policy deletes are dropped with their subtree,
/// attributes the policy rejects are dropped, and comments are skipped.
/// Text keeps its decoded characters.
///
/// # Errors
///
/// Returns [`TelegraphError::InvalidHtml`] if the fragment cannot be parsed.
pub fn html_to_nodes(html: &str, policy: &Policy) -> Result<Vec<ContentNode>> {
    let document = Document::parse_fragment(html);
    let body = document.body()?;

    Ok(convert_children(body, policy))
}

fn convert_children(parent: ElementRef<'_>, policy: &Policy) -> Vec<ContentNode> {
    parent
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(ContentNode::Text(text.to_string())),
            Node::Element(_) => ElementRef::wrap(child).and_then(|element| convert_element(element, policy)),
            _ => None,
        })
        .collect()
}

fn convert_element(element: ElementRef<'_>, policy: &Policy) -> Option<ContentNode> {
    let source_tag = element.value().name();
    let Some(tag) = policy.resolve_tag(source_tag) else {
        trace!(tag = source_tag, "dropping element and its subtree");
        return None;
    };

    let mut attrs = Attributes::new();
    for (name, value) in element.value().attrs() {
        if policy.is_attribute_allowed(name) {
            attrs.insert(name, value);
        } else {
            trace!(tag, attribute = name, "dropping attribute");
        }
    }

    let children = convert_children(element, policy);

    Some(Element::new(tag).with_attrs(attrs).with_children(children).into())
}
