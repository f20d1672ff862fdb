#[cfg(feature = "client")]
pub mod client;
pub mod codec;
pub mod config;
pub mod converter;
pub mod error;
pub mod node;
pub mod parse;
pub mod policy;
pub mod serialize;
pub mod types;

#[cfg(feature = "client")]
pub use client::TelegraphClient;
pub use codec::{decode, decode_value, encode, encode_pretty};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL};
pub use converter::Converter;
pub use error::{Result, TelegraphError};
pub use node::{Attributes, ContentNode, Element};
#[doc(hidden)]
pub use parse::{Document, html_to_nodes};
pub use policy::{Policy, TagRule};
#[doc(hidden)]
pub use serialize::nodes_to_html;
pub use types::{Account, GetViewsParams, Page, PageContent, PageList, PageViews};
