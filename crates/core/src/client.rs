//! Async client for the Telegraph API.
//!
//! Every method is a `POST` to `{base_url}{method}[/{path}]` with a JSON
//! body, the page path being sent as one percent-encoded segment. The client's access token is added to each body; the API answers
//! with an `{ok, result, error}` envelope.
//!
//! # Example
//!
//! ```rust,no_run
//! use telegraph_core::{Account, ClientConfig, TelegraphClient};
//!
//! # async fn example() -> telegraph_core::Result<()> {
//! let client = TelegraphClient::new(ClientConfig::default())?;
//! let account = client.create_account(&Account::new("sandbox")).await?;
//!
//! let client = client.with_token(account.access_token.unwrap_or_default());
//! let page = client.create_page("Hello", "<p>Hello, <b>world</b></p>", None, None).await?;
//! println!("Published at {}", page.url);
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::debug;
use url::Url;

use crate::codec;
use crate::config::ClientConfig;
use crate::converter::Converter;
use crate::types::{Account, GetViewsParams, Page, PageContent, PageList, PageViews};
use crate::{Result, TelegraphError};

/// Fields requested by [`TelegraphClient::get_account_info`].
const ACCOUNT_INFO_FIELDS: &[&str] = &["short_name", "author_name", "author_url", "auth_url", "page_count"];

/// Response envelope shared by every API method.
#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Telegraph API client.
///
/// HTML page content is converted with the client's [`Converter`], which has
/// an identity policy unless one is supplied with
/// [`TelegraphClient::with_converter`].
#[derive(Debug)]
pub struct TelegraphClient {
    http: Client,
    base_url: Url,
    timeout: u64,
    token: Option<String>,
    converter: Converter,
    last_status: AtomicU16,
}

impl TelegraphClient {
    /// Creates a client without an access token.
    ///
    /// # Errors
    ///
    /// Returns [`TelegraphError::InvalidUrl`] if the base URL does not parse.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url).map_err(|e| TelegraphError::InvalidUrl(e.to_string()))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(&config.user_agent)
            .build()
            .map_err(TelegraphError::HttpError)?;

        Ok(Self {
            http,
            base_url,
            timeout: config.timeout,
            token: None,
            converter: Converter::new(),
            last_status: AtomicU16::new(0),
        })
    }

    /// Sets the access token used for all following requests.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.set_token(Some(token.into()));
        self
    }

    /// Uses `converter` for HTML page content.
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = converter;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// HTTP status of the most recent response, if any request completed.
    pub fn last_status(&self) -> Option<u16> {
        match self.last_status.load(Ordering::Relaxed) {
            0 => None,
            status => Some(status),
        }
    }

    /// Creates a new Telegraph account.
    ///
    /// The returned account is `account` overlaid with the server's answer,
    /// which includes `access_token` and `auth_url`.
    pub async fn create_account(&self, account: &Account) -> Result<Account> {
        let result: Account = self.call("createAccount", None, Some(to_payload(account)?)).await?;
        Ok(account.clone().merge(result))
    }

    /// Updates account information. Only the fields set in `account` change.
    pub async fn edit_account_info(&self, account: &Account) -> Result<Account> {
        self.require_token()?;
        let result: Account = self.call("editAccountInfo", None, Some(to_payload(account)?)).await?;
        Ok(account.clone().merge(result))
    }

    /// Gets information about the account.
    pub async fn get_account_info(&self) -> Result<Account> {
        self.require_token()?;
        self.call("getAccountInfo", None, Some(json!({ "fields": ACCOUNT_INFO_FIELDS })))
            .await
    }

    /// Revokes the access token and generates a new one.
    ///
    /// The client keeps using the old token; set the new one with
    /// [`TelegraphClient::set_token`].
    pub async fn revoke_access_token(&self) -> Result<Account> {
        self.require_token()?;
        self.call("revokeAccessToken", None, None).await
    }

    /// Creates a new page.
    pub async fn create_page(
        &self, title: &str, content: impl Into<PageContent>, author_name: Option<&str>, author_url: Option<&str>,
    ) -> Result<Page> {
        self.require_token()?;
        let payload = self.page_payload(title, content.into(), author_name, author_url)?;
        self.call("createPage", None, Some(payload)).await
    }

    /// Edits an existing page.
    pub async fn edit_page(
        &self, path: &str, title: &str, content: impl Into<PageContent>, author_name: Option<&str>,
        author_url: Option<&str>,
    ) -> Result<Page> {
        self.require_token()?;
        let payload = self.page_payload(title, content.into(), author_name, author_url)?;
        self.call("editPage", Some(path), Some(payload)).await
    }

    /// Gets a page with its content.
    pub async fn get_page(&self, path: &str) -> Result<Page> {
        self.call("getPage", Some(path), Some(json!({ "return_content": true })))
            .await
    }

    /// Lists the account's pages, most recently created first.
    pub async fn get_page_list(&self, offset: u32, limit: u32) -> Result<PageList> {
        self.require_token()?;
        self.call("getPageList", None, Some(json!({ "offset": offset, "limit": limit })))
            .await
    }

    /// Gets the number of views for a page, in total or for one time bucket.
    pub async fn get_views(&self, path: &str, params: Option<&GetViewsParams>) -> Result<PageViews> {
        let payload = match params {
            Some(params) => {
                params.validate()?;
                Some(to_payload(params)?)
            }
            None => None,
        };
        self.call("getViews", Some(path), payload).await
    }

    fn require_token(&self) -> Result<()> {
        if self.token.as_deref().is_none_or(str::is_empty) {
            return Err(TelegraphError::TokenNotProvided);
        }
        Ok(())
    }

    fn page_payload(
        &self, title: &str, content: PageContent, author_name: Option<&str>, author_url: Option<&str>,
    ) -> Result<Value> {
        let nodes = content.into_nodes(&self.converter)?;

        let mut payload = Map::new();
        payload.insert("title".to_string(), title.into());
        payload.insert("return_content".to_string(), true.into());
        payload.insert("content".to_string(), codec::encode(&nodes)?.into());
        if let Some(author_name) = author_name.filter(|name| !name.is_empty()) {
            payload.insert("author_name".to_string(), author_name.into());
        }
        if let Some(author_url) = author_url.filter(|url| !url.is_empty()) {
            payload.insert("author_url".to_string(), author_url.into());
        }

        Ok(Value::Object(payload))
    }

    fn endpoint(&self, method: &str, path: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| TelegraphError::InvalidUrl(format!("{} cannot be a base URL", self.base_url)))?;
            segments.pop_if_empty().push(method);
            if let Some(path) = path.map(|path| path.trim_start_matches('/')).filter(|path| !path.is_empty()) {
                segments.push(path);
            }
        }
        Ok(url)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, path: Option<&str>, payload: Option<Value>) -> Result<T> {
        let url = self.endpoint(method, path)?;

        let mut body = match payload {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(body)) => body,
            Some(_) => return Err(TelegraphError::InvalidResponse("request payload must be an object".to_string())),
        };
        body.remove("path");
        body.remove("access_token");
        if let Some(token) = &self.token {
            body.insert("access_token".to_string(), token.clone().into());
        }

        debug!(method, %url, "calling Telegraph API");

        let mut request = self.http.post(url);
        if !body.is_empty() {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() { TelegraphError::Timeout { timeout: self.timeout } } else { TelegraphError::HttpError(e) }
        })?;

        let status = response.status().as_u16();
        self.last_status.store(status, Ordering::Relaxed);

        let text = response.text().await?;
        let envelope: Envelope = serde_json::from_str(&text).unwrap_or_default();

        if !envelope.ok {
            let message = envelope
                .error
                .filter(|error| !error.is_empty())
                .unwrap_or_else(|| "Unknown Telegraph API error".to_string());
            debug!(method, status, %message, "Telegraph API call failed");
            return Err(TelegraphError::Api { message, status });
        }

        serde_json::from_value(envelope.result.unwrap_or(Value::Null))
            .map_err(|e| TelegraphError::InvalidResponse(format!("{}: {}", method, e)))
    }
}

fn to_payload<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| TelegraphError::InvalidContent(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn client() -> TelegraphClient {
        TelegraphClient::new(ClientConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ClientConfig::builder().base_url("not a url").build();
        assert!(matches!(TelegraphClient::new(config), Err(TelegraphError::InvalidUrl(_))));
    }

    #[test]
    fn test_endpoint() {
        let client = client();
        assert_eq!(
            client.endpoint("getPage", Some("Sample-Page-12-15")).unwrap().as_str(),
            "https://api.telegra.ph/getPage/Sample-Page-12-15"
        );
        assert_eq!(
            client.endpoint("createAccount", None).unwrap().as_str(),
            "https://api.telegra.ph/createAccount"
        );
    }

    #[rstest]
    #[case("a?b#c", "https://api.telegra.ph/getPage/a%3Fb%23c")]
    #[case("../getAccountInfo", "https://api.telegra.ph/getPage/..%2FgetAccountInfo")]
    #[case("/Sample/Page", "https://api.telegra.ph/getPage/Sample%2FPage")]
    #[case("100%", "https://api.telegra.ph/getPage/100%25")]
    fn test_endpoint_path_is_one_segment(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(client().endpoint("getPage", Some(path)).unwrap().as_str(), expected);
    }

    #[test]
    fn test_base_url_without_trailing_slash() {
        let config = ClientConfig::builder().base_url("http://localhost:8080/api").build();
        let client = TelegraphClient::new(config).unwrap();
        assert_eq!(
            client.endpoint("getViews", Some("x")).unwrap().as_str(),
            "http://localhost:8080/api/getViews/x"
        );
    }

    #[test]
    fn test_token_handling() {
        let mut client = client().with_token("secret");
        assert_eq!(client.token(), Some("secret"));
        client.set_token(None);
        assert_eq!(client.token(), None);
        assert!(matches!(client.require_token(), Err(TelegraphError::TokenNotProvided)));
    }

    #[test]
    fn test_empty_token_counts_as_missing() {
        let client = client().with_token("");
        assert!(client.require_token().is_err());
    }

    #[test]
    fn test_page_payload_encodes_html() {
        let client = client();
        let payload = client
            .page_payload("Title", PageContent::from("<p>Привет</p>"), Some("Author"), Some(""))
            .unwrap();

        assert_eq!(payload["title"], "Title");
        assert_eq!(payload["return_content"], true);
        assert_eq!(payload["content"], r#"[{"tag":"p","children":["Привет"]}]"#);
        assert_eq!(payload["author_name"], "Author");
        assert!(payload.get("author_url").is_none());
    }

    #[test]
    fn test_last_status_starts_empty() {
        assert_eq!(client().last_status(), None);
    }
}
