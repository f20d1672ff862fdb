//! Telegraph API objects.
//!
//! Plain records mirroring <https://telegra.ph/api#Available-types>. Fields
//! the API may omit are `Option`s and are left out when serializing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::codec;
use crate::converter::Converter;
use crate::node::ContentNode;
use crate::{Result, TelegraphError};

/// A Telegraph account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account name, shown only to the account owner above the "Edit/Publish" button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    /// Default author name for new pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    /// Profile link opened when readers click the author name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
    /// Only returned by `createAccount` and `revokeAccessToken`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// One-time browser login URL, valid for 5 minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u64>,
}

impl Account {
    pub fn new(short_name: impl Into<String>) -> Self {
        Self { short_name: Some(short_name.into()), ..Default::default() }
    }

    pub fn with_author_name(mut self, author_name: impl Into<String>) -> Self {
        self.author_name = Some(author_name.into());
        self
    }

    pub fn with_author_url(mut self, author_url: impl Into<String>) -> Self {
        self.author_url = Some(author_url.into());
        self
    }

    /// Overlays the fields present in `other` onto this account.
    pub fn merge(self, other: Account) -> Account {
        Account {
            short_name: other.short_name.or(self.short_name),
            author_name: other.author_name.or(self.author_name),
            author_url: other.author_url.or(self.author_url),
            access_token: other.access_token.or(self.access_token),
            auth_url: other.auth_url.or(self.auth_url),
            page_count: other.page_count.or(self.page_count),
        }
    }
}

/// A page on Telegraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Page body. Accepts either a node array or a JSON string holding one.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_content")]
    pub content: Option<Vec<ContentNode>>,
    #[serde(default)]
    pub views: u64,
    /// Only returned when an access token is passed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_edit: Option<bool>,
}

fn deserialize_content<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<ContentNode>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(json)) => match codec::decode(&json) {
            Ok(nodes) => Ok(Some(nodes)),
            Err(err) => {
                warn!(error = %err, "ignoring undecodable page content");
                Ok(None)
            }
        },
        Some(value) => codec::decode_value(value).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Pages of an account, most recently created first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageList {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub pages: Vec<Page>,
}

/// View count of a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageViews {
    #[serde(default)]
    pub views: u64,
}

/// Time bucket for `getViews`. Leave everything unset for the total.
///
/// Each field narrows the previous one, so `month` needs `year`, `day` needs
/// `month`, and `hour` needs `day`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetViewsParams {
    /// 2000-2100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    /// 1-12.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u8>,
    /// 1-31.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u8>,
    /// 0-24.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
}

impl GetViewsParams {
    /// Checks ranges and that every field has its parent field set.
    pub fn validate(&self) -> Result<()> {
        fn check<T: PartialOrd + std::fmt::Display>(name: &str, value: Option<T>, min: T, max: T) -> Result<()> {
            match value {
                Some(value) if value < min || value > max => Err(TelegraphError::ConfigError(format!(
                    "{} must be between {} and {}, got {}",
                    name, min, max, value
                ))),
                _ => Ok(()),
            }
        }

        check("year", self.year, 2000, 2100)?;
        check("month", self.month, 1, 12)?;
        check("day", self.day, 1, 31)?;
        check("hour", self.hour, 0, 24)?;

        for (field, parent, missing) in [
            ("month", "year", self.month.is_some() && self.year.is_none()),
            ("day", "month", self.day.is_some() && self.month.is_none()),
            ("hour", "day", self.hour.is_some() && self.day.is_none()),
        ] {
            if missing {
                return Err(TelegraphError::ConfigError(format!("{} requires {}", field, parent)));
            }
        }

        Ok(())
    }
}

/// Body of a page to publish: ready-made nodes, or HTML to convert first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    Nodes(Vec<ContentNode>),
    Html(String),
}

impl PageContent {
    /// Resolves the content to nodes, parsing HTML with `converter`.
    pub fn into_nodes(self, converter: &Converter) -> Result<Vec<ContentNode>> {
        match self {
            PageContent::Nodes(nodes) => Ok(nodes),
            PageContent::Html(html) => converter.html_to_content_tree(&html),
        }
    }
}

impl From<Vec<ContentNode>> for PageContent {
    fn from(nodes: Vec<ContentNode>) -> Self {
        PageContent::Nodes(nodes)
    }
}

impl From<String> for PageContent {
    fn from(html: String) -> Self {
        PageContent::Html(html)
    }
}

impl From<&str> for PageContent {
    fn from(html: &str) -> Self {
        PageContent::Html(html.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Element;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_account_serialization_skips_missing_fields() {
        let account = Account::new("sandbox").with_author_name("Anonymous");
        assert_eq!(
            serde_json::to_value(&account).unwrap(),
            json!({"short_name": "sandbox", "author_name": "Anonymous"})
        );
    }

    #[test]
    fn test_account_merge() {
        let request = Account::new("sandbox").with_author_url("https://example.com/");
        let response: Account =
            serde_json::from_value(json!({"short_name": "sandbox", "access_token": "abc", "auth_url": "https://edit.telegra.ph/auth/x"}))
                .unwrap();

        let merged = request.merge(response);
        assert_eq!(merged.short_name.as_deref(), Some("sandbox"));
        assert_eq!(merged.author_url.as_deref(), Some("https://example.com/"));
        assert_eq!(merged.access_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_page_content_from_array() {
        let page: Page = serde_json::from_value(json!({
            "path": "Sample-Page-12-15",
            "url": "https://telegra.ph/Sample-Page-12-15",
            "title": "Sample Page",
            "description": "Hello",
            "content": [{"tag": "p", "children": ["Hello"]}],
            "views": 3
        }))
        .unwrap();

        assert_eq!(page.content, Some(vec![Element::new("p").with_child("Hello").into()]));
        assert_eq!(page.views, 3);
        assert_eq!(page.can_edit, None);
    }

    #[test]
    fn test_page_content_from_encoded_string() {
        let page: Page = serde_json::from_value(json!({
            "path": "x",
            "content": r#"[{"tag":"p","children":["Hello"]}]"#
        }))
        .unwrap();

        assert_eq!(page.content, Some(vec![Element::new("p").with_child("Hello").into()]));
    }

    #[test]
    fn test_page_content_undecodable_string_is_dropped() {
        let page: Page = serde_json::from_value(json!({"path": "x", "content": "not json"})).unwrap();
        assert_eq!(page.content, None);
        assert_eq!(page.views, 0);
    }

    #[test]
    fn test_page_content_invalid_array_fails() {
        let result: std::result::Result<Page, _> = serde_json::from_value(json!({"content": [42]}));
        assert!(result.is_err());
    }

    #[test]
    fn test_page_list() {
        let list: PageList = serde_json::from_value(json!({
            "total_count": 2,
            "pages": [{"path": "a", "title": "A"}, {"path": "b", "title": "B", "can_edit": true}]
        }))
        .unwrap();

        assert_eq!(list.total_count, 2);
        assert_eq!(list.pages[1].can_edit, Some(true));
    }

    #[rstest]
    #[case(GetViewsParams::default(), true)]
    #[case(GetViewsParams { year: Some(2024), month: Some(5), day: Some(1), hour: Some(0) }, true)]
    #[case(GetViewsParams { year: Some(1999), ..Default::default() }, false)]
    #[case(GetViewsParams { year: Some(2024), month: Some(13), ..Default::default() }, false)]
    #[case(GetViewsParams { month: Some(5), ..Default::default() }, false)]
    #[case(GetViewsParams { year: Some(2024), month: Some(5), hour: Some(3), ..Default::default() }, false)]
    fn test_views_params_validation(#[case] params: GetViewsParams, #[case] valid: bool) {
        assert_eq!(params.validate().is_ok(), valid);
    }

    #[test]
    fn test_page_content_into_nodes() {
        let converter = Converter::new();
        let nodes = PageContent::from("<p>Hi</p>").into_nodes(&converter).unwrap();
        assert_eq!(nodes, vec![Element::new("p").with_child("Hi").into()]);
    }
}
