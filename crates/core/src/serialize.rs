//! Content nodes back to HTML.
//!
//! The node tree is built into an `RcDom` with the policy applied, then written
//! by html5ever's serializer. Output is a bare fragment with no
//! `<html>`/`<body>` wrapper. Non-breaking spaces in text stay literal instead
//! of becoming `&nbsp;`.

use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;
use std::sync::LazyLock;

use html5ever::serialize::{AttrRef, HtmlSerializer, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::{Attribute, LocalName, QualName, ns};
use markup5ever_rcdom::{Handle, Node, NodeData, SerializableHandle};
use regex::Regex;
use tracing::trace;

use crate::node::{ContentNode, Element};
use crate::policy::Policy;
use crate::{Result, TelegraphError};

/// Elements that never take content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Elements whose content the serializer writes unescaped.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe", "noembed", "noframes", "noscript", "plaintext", "script", "style", "xmp",
];

/// Elements where the parser swallows one leading newline.
const NEWLINE_SENSITIVE_ELEMENTS: &[&str] = &["listing", "pre", "textarea"];

static TAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][^\s/<>\x00]*$").expect("tag name pattern is valid"));

static ATTRIBUTE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[^\s"'>/=\x00-\x1F\x7F]+$"#).expect("attribute name pattern is valid"));

/// Converts content nodes into an HTML fragment.
///
/// Tags are resolved through the policy first; deleted elements vanish with
/// their subtree. Attributes the policy rejects, or whose names cannot be
/// written as HTML, are left out.
///
/// # Errors
///
/// Returns [`TelegraphError::InvalidContent`] if a resolved tag is not a valid
/// tag name, or if the content of a raw-text element (`script`, `iframe`, ...)
/// contains its own closing tag.
pub fn nodes_to_html(nodes: &[ContentNode], policy: &Policy) -> Result<String> {
    let root = new_node(NodeData::Document);
    for node in nodes {
        append_node(&root, node, policy)?;
    }
    serialize_fragment(&root)
}

fn append_node(parent: &Handle, node: &ContentNode, policy: &Policy) -> Result<()> {
    match node {
        ContentNode::Text(text) => {
            append(parent, create_text(text));
            Ok(())
        }
        ContentNode::Element(element) => append_element(parent, element, policy),
    }
}

fn append_element(parent: &Handle, element: &Element, policy: &Policy) -> Result<()> {
    let Some(tag) = policy.resolve_tag(&element.tag) else {
        trace!(tag = element.tag.as_str(), "dropping element and its subtree");
        return Ok(());
    };
    if !TAG_NAME.is_match(tag) {
        return Err(TelegraphError::InvalidContent(format!("Invalid tag: {:?} is not a valid tag name", tag)));
    }

    let attrs = element
        .attrs
        .iter()
        .flat_map(|attrs| attrs.iter())
        .filter(|&(name, _)| {
            if !policy.is_attribute_allowed(name) {
                trace!(tag, attribute = name, "dropping attribute");
                false
            } else if !ATTRIBUTE_NAME.is_match(name) {
                trace!(tag, attribute = name, "dropping attribute with an unwritable name");
                false
            } else {
                true
            }
        })
        .collect::<Vec<_>>();
    let handle = create_element(tag, &attrs);
    append(parent, handle.clone());

    if VOID_ELEMENTS.contains(&tag) {
        if !element.children().is_empty() {
            trace!(tag, "dropping children of void element");
        }
        return Ok(());
    }

    if NEWLINE_SENSITIVE_ELEMENTS.contains(&tag)
        && element.children().first().and_then(ContentNode::as_text).is_some_and(|text| text.starts_with('\n'))
    {
        append(&handle, create_text("\n"));
    }
    for child in element.children() {
        append_node(&handle, child, policy)?;
    }
    Ok(())
}

fn new_node(data: NodeData) -> Handle {
    Rc::new(Node { parent: Cell::new(None), children: RefCell::new(Vec::new()), data })
}

fn create_element(tag: &str, attrs: &[(&str, &str)]) -> Handle {
    let attributes = attrs
        .iter()
        .map(|&(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.to_string().into(),
        })
        .collect();

    new_node(NodeData::Element {
        name: QualName::new(None, ns!(html), LocalName::from(tag)),
        attrs: RefCell::new(attributes),
        template_contents: Default::default(),
        mathml_annotation_xml_integration_point: false,
    })
}

fn create_text(text: &str) -> Handle {
    new_node(NodeData::Text { contents: RefCell::new(text.to_string().into()) })
}

fn append(parent: &Handle, child: Handle) {
    parent.children.borrow_mut().push(child);
}

fn serialize_fragment(root: &Handle) -> Result<String> {
    let opts = SerializeOpts { traversal_scope: TraversalScope::ChildrenOnly(None), ..Default::default() };
    let mut serializer = FragmentSerializer { inner: HtmlSerializer::new(Vec::new(), opts.clone()), raw_text: Vec::new() };

    SerializableHandle::from(root.clone())
        .serialize(&mut serializer, opts.traversal_scope)
        .map_err(|e| TelegraphError::InvalidContent(e.to_string()))?;

    String::from_utf8(serializer.inner.writer)
        .map_err(|e| TelegraphError::InvalidContent(format!("UTF-8 conversion failed: {}", e)))
}

/// html5ever's serializer with literal non-breaking spaces in text and a
/// check that raw-text content cannot end its element early.
struct FragmentSerializer {
    inner: HtmlSerializer<Vec<u8>>,
    /// One entry per open element; `Some(offset)` marks the outermost
    /// raw-text element and where its content starts in the output.
    raw_text: Vec<Option<usize>>,
}

impl Serializer for FragmentSerializer {
    fn start_elem<'a, AttrIter>(&mut self, name: QualName, attrs: AttrIter) -> io::Result<()>
    where
        AttrIter: Iterator<Item = AttrRef<'a>>,
    {
        let nested = self.raw_text.iter().any(Option::is_some);
        let raw = !nested && RAW_TEXT_ELEMENTS.contains(&&*name.local);
        self.inner.start_elem(name, attrs)?;
        self.raw_text.push(raw.then_some(self.inner.writer.len()));
        Ok(())
    }

    fn end_elem(&mut self, name: QualName) -> io::Result<()> {
        if let Some(Some(start)) = self.raw_text.pop() {
            check_raw_text(&self.inner.writer[start..], &name.local)?;
        }
        self.inner.end_elem(name)
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        let mut pieces = text.split('\u{a0}');
        if let Some(first) = pieces.next() {
            self.inner.write_text(first)?;
        }
        for piece in pieces {
            self.inner.writer.extend_from_slice("\u{a0}".as_bytes());
            self.inner.write_text(piece)?;
        }
        Ok(())
    }

    fn write_comment(&mut self, text: &str) -> io::Result<()> {
        self.inner.write_comment(text)
    }

    fn write_doctype(&mut self, name: &str) -> io::Result<()> {
        self.inner.write_doctype(name)
    }

    fn write_processing_instruction(&mut self, target: &str, data: &str) -> io::Result<()> {
        self.inner.write_processing_instruction(target, data)
    }
}

fn check_raw_text(content: &[u8], tag: &str) -> io::Result<()> {
    let closing = format!("</{}", tag);
    if content.windows(closing.len()).any(|window| window.eq_ignore_ascii_case(closing.as_bytes())) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid text: content of <{}> contains its closing tag", tag),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::TagRule;
    use rstest::rstest;

    fn render(nodes: &[ContentNode]) -> String {
        nodes_to_html(nodes, &Policy::new()).unwrap()
    }

    #[test]
    fn test_render_paragraphs_and_link() {
        let nodes: Vec<ContentNode> = vec![
            Element::new("h3").with_child("Title").into(),
            Element::new("p").with_child("First paragraph").into(),
            Element::new("p")
                .with_child("Link: ")
                .with_child(Element::new("a").with_attr("href", "https://www.google.com/").with_child("Google"))
                .into(),
        ];

        assert_eq!(
            render(&nodes),
            r#"<h3>Title</h3><p>First paragraph</p><p>Link: <a href="https://www.google.com/">Google</a></p>"#
        );
    }

    #[test]
    fn test_top_level_text() {
        assert_eq!(render(&["plain ".into(), Element::new("b").with_child("bold").into()]), "plain <b>bold</b>");
    }

    #[test]
    fn test_text_kept_readable() {
        let nodes = vec![Element::new("p").with_child("Été — “quotes” & <tags>\u{a0}!").into()];
        assert_eq!(render(&nodes), "<p>Été — “quotes” &amp; &lt;tags&gt;\u{a0}!</p>");
    }

    #[test]
    fn test_attribute_escaping() {
        let nodes = vec![Element::new("a").with_attr("href", r#"/?a=1&b="2""#).into()];
        assert_eq!(render(&nodes), r#"<a href="/?a=1&amp;b=&quot;2&quot;"></a>"#);
    }

    #[rstest]
    #[case(Element::new("br"), "<br>")]
    #[case(Element::new("img").with_attr("src", "/x.png"), r#"<img src="/x.png">"#)]
    #[case(Element::new("hr"), "<hr>")]
    #[case(Element::new("br").with_child("stray"), "<br>")]
    #[case(Element::new("p"), "<p></p>")]
    fn test_void_elements(#[case] element: Element, #[case] expected: &str) {
        assert_eq!(render(&[element.into()]), expected);
    }

    #[test]
    fn test_raw_text_left_unescaped() {
        let nodes = vec![Element::new("iframe").with_child("a < b && c").into()];
        assert_eq!(render(&nodes), "<iframe>a < b && c</iframe>");
    }

    #[rstest]
    #[case(Element::new("iframe").with_child("</iframe><script>alert(1)</script>"))]
    #[case(Element::new("noscript").with_child("x</NoScript ><img src=x>"))]
    #[case(Element::new("script").with_child("a</script>b"))]
    #[case(Element::new("xmp").with_child("</xmp"))]
    #[case(Element::new("iframe").with_child(Element::new("b").with_attr("title", "</iframe><script>")))]
    #[case(Element::new("iframe").with_child(Element::new("iframe")).with_child(Element::new("script")))]
    fn test_raw_text_cannot_close_its_element(#[case] element: Element) {
        let nodes = vec![element.into()];
        assert!(matches!(nodes_to_html(&nodes, &Policy::new()), Err(TelegraphError::InvalidContent(_))));
    }

    #[test]
    fn test_raw_text_mentioning_other_tags() {
        let nodes = vec![Element::new("script").with_child("if (a < b) { s = '</p>'; }").into()];
        assert_eq!(render(&nodes), "<script>if (a < b) { s = '</p>'; }</script>");
    }

    #[test]
    fn test_pre_leading_newline_preserved() {
        let nodes = vec![Element::new("pre").with_child("\nfn main() {}").into()];
        assert_eq!(render(&nodes), "<pre>\n\nfn main() {}</pre>");
    }

    #[test]
    fn test_attribute_order_preserved() {
        let nodes = vec![Element::new("img").with_attr("src", "a").with_attr("alt", "b").with_attr("title", "c").into()];
        assert_eq!(render(&nodes), r#"<img src="a" alt="b" title="c">"#);
    }

    #[test]
    fn test_rules_applied() {
        let mut policy = Policy::new();
        policy
            .set_tag_rules([("h1", TagRule::from("h3")), ("footer", TagRule::Delete)])
            .unwrap();
        policy.set_allowed_attributes(["href"]);

        let nodes: Vec<ContentNode> = vec![
            Element::new("h1").with_attr("class", "big").with_child("Title").into(),
            Element::new("footer").with_child(Element::new("p").with_child("Copyright")).into(),
            Element::new("a").with_attr("href", "/").with_attr("onclick", "x()").into(),
        ];

        assert_eq!(nodes_to_html(&nodes, &policy).unwrap(), r#"<h3>Title</h3><a href="/"></a>"#);
    }

    #[rstest]
    #[case("")]
    #[case("p p")]
    #[case("<p>")]
    #[case("1p")]
    #[case("p/")]
    fn test_invalid_tag(#[case] tag: &str) {
        let nodes = vec![Element::new(tag).with_child("x").into()];
        assert!(matches!(nodes_to_html(&nodes, &Policy::new()), Err(TelegraphError::InvalidContent(_))));
    }

    #[test]
    fn test_invalid_tag_after_rename() {
        let mut policy = Policy::new();
        policy.set_tag_rule("p", "bad tag").unwrap();

        let nodes = vec![Element::new("p").into()];
        assert!(matches!(nodes_to_html(&nodes, &policy), Err(TelegraphError::InvalidContent(_))));
    }

    #[test]
    fn test_html_attribute_names_kept() {
        let nodes = vec![
            Element::new("p")
                .with_attr("@click", "go")
                .with_attr("x{y}", "1")
                .with_attr("[foo]", "")
                .with_attr(":class", "c")
                .with_child("Go")
                .into(),
        ];
        assert_eq!(render(&nodes), r#"<p @click="go" x{y}="1" [foo]="" :class="c">Go</p>"#);
    }

    #[rstest]
    #[case("on click")]
    #[case("a=b")]
    #[case("x\"y")]
    #[case("a/b")]
    #[case("")]
    fn test_unwritable_attribute_name_dropped(#[case] name: &str) {
        let nodes = vec![Element::new("a").with_attr(name, "x").with_attr("href", "/").into()];
        assert_eq!(render(&nodes), r#"<a href="/"></a>"#);
    }

    #[test]
    fn test_invalid_nested_tag_fails_whole_call() {
        let nodes = vec![
            Element::new("p").with_child("fine").into(),
            Element::new("p").with_child(Element::new("b r")).into(),
        ];
        assert!(nodes_to_html(&nodes, &Policy::new()).is_err());
    }
}
