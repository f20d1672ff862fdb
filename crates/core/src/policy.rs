//! Tag replacement and attribute filtering rules.
//!
//! A [`Policy`] is applied in both conversion directions: while reading HTML
//! into content nodes and while writing content nodes back out as HTML.
//!
//! # Example
//!
//! ```rust
//! use telegraph_core::{Policy, TagRule};
//!
//! let mut policy = Policy::new();
//! policy
//!     .set_tag_rules([("h1", TagRule::from("h3")), ("div", "p".into()), ("iframe", TagRule::Delete)])
//!     .unwrap();
//! policy.set_allowed_attributes(["href", "src"]);
//!
//! assert_eq!(policy.resolve_tag("h1"), Some("h3"));
//! assert_eq!(policy.resolve_tag("iframe"), None);
//! assert!(policy.is_attribute_allowed("HREF"));
//! assert!(!policy.is_attribute_allowed("class"));
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::node::json_kind;
use crate::{Result, TelegraphError};

/// What to do with a tag that has a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRule {
    /// Emit the element under another tag name.
    Rename(String),
    /// Drop the element together with its whole subtree.
    Delete,
}

impl TagRule {
    /// Reads a rule from a rules-file value: a tag name, or `false` to delete.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(tag) => Ok(TagRule::Rename(tag.clone())),
            Value::Bool(false) => Ok(TagRule::Delete),
            other => Err(TelegraphError::InvalidRule(format!(
                "replacement must be a tag name or false, found {}",
                json_kind(other)
            ))),
        }
    }
}

impl From<&str> for TagRule {
    fn from(tag: &str) -> Self {
        TagRule::Rename(tag.to_string())
    }
}

impl From<String> for TagRule {
    fn from(tag: String) -> Self {
        TagRule::Rename(tag)
    }
}

/// Tag and attribute rules for one conversion session.
///
/// Tag rule keys are matched case-sensitively against tag names as they come
/// out of the parser (lower-case for HTML input). Attribute names are
/// compared lower-cased. A policy is plain data; share it read-only across
/// conversions or give each concurrent conversion its own copy.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    tag_rules: HashMap<String, TagRule>,
    allowed_attributes: Option<HashSet<String>>,
    disallowed_attributes: HashSet<String>,
}

/// On-disk form of a [`Policy`].
#[derive(Debug, Deserialize)]
struct PolicyFile {
    #[serde(default)]
    tag_rules: Map<String, Value>,
    #[serde(default)]
    allowed_attributes: Option<Vec<String>>,
    #[serde(default)]
    disallowed_attributes: Vec<String>,
}

impl Policy {
    /// Creates an identity policy: no tag rules, every attribute allowed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules matching what the Telegraph service renders.
    ///
    /// Only `href` and `src` survive, headings the service lacks are mapped
    /// onto `h3`/`h4`, `div` becomes `p`, and scripting elements are dropped.
    pub fn telegraph() -> Self {
        let mut policy = Self::new();
        for (tag, rule) in [
            ("h1", TagRule::from("h3")),
            ("h2", TagRule::from("h4")),
            ("h5", TagRule::from("h4")),
            ("h6", TagRule::from("h4")),
            ("div", TagRule::from("p")),
            ("script", TagRule::Delete),
            ("style", TagRule::Delete),
            ("noscript", TagRule::Delete),
        ] {
            policy.tag_rules.insert(tag.to_string(), rule);
        }
        policy.set_allowed_attributes(["href", "src"]);
        policy
    }

    /// Parses a policy from its JSON rules-file form.
    ///
    /// ```json
    /// {"tag_rules": {"h1": "h3", "footer": false}, "allowed_attributes": ["href", "src"]}
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: PolicyFile =
            serde_json::from_str(json).map_err(|e| TelegraphError::ConfigError(format!("invalid rules file: {}", e)))?;

        let mut policy = Self::new();
        for (tag, value) in &file.tag_rules {
            policy.set_tag_rule(tag.as_str(), TagRule::from_value(value)?)?;
        }
        if let Some(allowed) = file.allowed_attributes {
            policy.set_allowed_attributes(allowed);
        }
        policy.set_disallowed_attributes(file.disallowed_attributes);

        Ok(policy)
    }

    /// Loads a policy from a JSON rules file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TelegraphError::FileNotFound(path.to_path_buf()));
        }
        let json = fs::read_to_string(path)?;
        let policy = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), rules = policy.tag_rules.len(), "loaded tag rules");
        Ok(policy)
    }

    /// Default rules file location: `<config dir>/telegraph/rules.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("telegraph").join("rules.json"))
    }

    /// Adds or replaces the rule for `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`TelegraphError::InvalidRule`] if `tag` is empty.
    pub fn set_tag_rule(&mut self, tag: impl Into<String>, rule: impl Into<TagRule>) -> Result<&mut Self> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(TelegraphError::InvalidRule("tag must not be empty".to_string()));
        }
        self.tag_rules.insert(tag, rule.into());
        Ok(self)
    }

    /// Adds rules in iteration order.
    ///
    /// Stops at the first invalid entry; rules added before it are kept.
    pub fn set_tag_rules<I, K, R>(&mut self, rules: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, R)>,
        K: Into<String>,
        R: Into<TagRule>,
    {
        for (tag, rule) in rules {
            self.set_tag_rule(tag, rule)?;
        }
        Ok(self)
    }

    pub fn has_rule(&self, tag: &str) -> bool {
        self.tag_rules.contains_key(tag)
    }

    /// The rule for `tag`: a rename, a delete, or `None` when there is no rule.
    pub fn get_rule(&self, tag: &str) -> Option<&TagRule> {
        self.tag_rules.get(tag)
    }

    /// The tag to emit for `tag`, or `None` if the element must be dropped.
    ///
    /// A rename to an empty tag name counts as a delete.
    pub fn resolve_tag<'a>(&'a self, tag: &'a str) -> Option<&'a str> {
        match self.tag_rules.get(tag) {
            None => Some(tag),
            Some(TagRule::Rename(replacement)) if !replacement.is_empty() => Some(replacement.as_str()),
            Some(_) => None,
        }
    }

    /// Restricts attributes to the given names.
    ///
    /// Names are trimmed and lower-cased; blanks and duplicates are dropped.
    pub fn set_allowed_attributes<I, S>(&mut self, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_attributes = Some(normalize_attributes(attributes));
        self
    }

    /// Turns the allow-list off so every attribute not denied is kept.
    pub fn clear_allowed_attributes(&mut self) -> &mut Self {
        self.allowed_attributes = None;
        self
    }

    /// Attributes dropped regardless of the allow-list.
    pub fn set_disallowed_attributes<I, S>(&mut self, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.disallowed_attributes = normalize_attributes(attributes);
        self
    }

    pub fn allowed_attributes(&self) -> Option<&HashSet<String>> {
        self.allowed_attributes.as_ref()
    }

    pub fn disallowed_attributes(&self) -> &HashSet<String> {
        &self.disallowed_attributes
    }

    /// Whether an attribute survives filtering. The deny-list always wins.
    pub fn is_attribute_allowed(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        let allowed = self
            .allowed_attributes
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&name));

        allowed && !self.disallowed_attributes.contains(&name)
    }
}

fn normalize_attributes<I, S>(attributes: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    attributes
        .into_iter()
        .map(|attribute| attribute.as_ref().trim().to_lowercase())
        .filter(|attribute| !attribute.is_empty())
        .collect()
}
