use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use serde::Serialize;
use telegraph_core::{
    Account, ClientConfig, Converter, DEFAULT_BASE_URL, GetViewsParams, PageContent, Policy, TelegraphClient,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod echo;

use echo::{format_size, print_banner, print_detail, print_info, print_step, print_success, print_warning};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Content format on either side of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Html,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "html" | "htm" => Ok(Self::Html),
            _ => Err(format!("Invalid format: {}. Valid options: json, html", s)),
        }
    }
}

/// Publish to Telegraph and convert between HTML and Telegraph content nodes
#[derive(Parser, Debug)]
#[command(name = "telegraph")]
#[command(author = "Telegraph CLI Contributors")]
#[command(version)]
#[command(about = "Publish to Telegraph and convert HTML to Telegraph content", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Account access token
    #[arg(long, global = true, env = "TELEGRAPH_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    token: Option<String>,

    /// JSON file with tag rules and attribute lists
    #[arg(long, global = true, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Telegraph API root
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL, value_name = "URL")]
    base_url: String,

    /// HTTP timeout in seconds
    #[arg(long, global = true, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Output file (default: stdout)
    #[arg(short, long, global = true, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert HTML to content JSON, or content JSON to HTML
    Convert {
        /// HTML or JSON file, or "-" for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Target format (json, html); the input is the other one
        #[arg(long, default_value = "json", value_name = "FORMAT")]
        to: Format,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Create a new account and print it with its access token
    CreateAccount {
        #[arg(long)]
        short_name: String,
        #[arg(long)]
        author_name: Option<String>,
        #[arg(long)]
        author_url: Option<String>,
    },

    /// Update account information
    EditAccount {
        #[arg(long)]
        short_name: Option<String>,
        #[arg(long)]
        author_name: Option<String>,
        #[arg(long)]
        author_url: Option<String>,
    },

    /// Show account information
    Account,

    /// Revoke the access token and print the account with a new one
    RevokeToken,

    /// Publish a new page
    CreatePage {
        #[arg(long)]
        title: String,

        /// HTML or JSON file, or "-" for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Input format (html, json)
        #[arg(long, default_value = "html", value_name = "FORMAT")]
        from: Format,

        #[arg(long)]
        author_name: Option<String>,
        #[arg(long)]
        author_url: Option<String>,
    },

    /// Replace the title and content of an existing page
    EditPage {
        /// Page path, e.g. Sample-Page-12-15
        #[arg(value_name = "PATH")]
        path: String,

        #[arg(long)]
        title: String,

        /// HTML or JSON file, or "-" for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Input format (html, json)
        #[arg(long, default_value = "html", value_name = "FORMAT")]
        from: Format,

        #[arg(long)]
        author_name: Option<String>,
        #[arg(long)]
        author_url: Option<String>,
    },

    /// Fetch a page
    GetPage {
        #[arg(value_name = "PATH")]
        path: String,

        /// Output format (json prints the page, html only its content)
        #[arg(short, long, default_value = "json", value_name = "FORMAT")]
        format: Format,
    },

    /// List the account's pages
    ListPages {
        #[arg(long, default_value = "0")]
        offset: u32,
        #[arg(long, default_value = "50")]
        limit: u32,
    },

    /// Show view counts for a page
    Views {
        #[arg(value_name = "PATH")]
        path: String,
        #[arg(long)]
        year: Option<u16>,
        #[arg(long)]
        month: Option<u8>,
        #[arg(long)]
        day: Option<u8>,
        #[arg(long)]
        hour: Option<u8>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("telegraph_core=debug,telegraph=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Loads `--rules`, or the default rules file when it exists
fn load_policy(rules: Option<&Path>, verbose: bool) -> anyhow::Result<Policy> {
    let path = match rules {
        Some(path) => Some(path.to_path_buf()),
        None => Policy::default_path().filter(|path| path.exists()),
    };

    debug!(rules = ?path, "loading policy");

    match path {
        Some(path) => {
            if verbose {
                print_detail("Rules", &path.display().to_string());
            }
            Policy::load(&path).with_context(|| format!("Failed to load rules: {}", path.display()))
        }
        None => Ok(Policy::new()),
    }
}

fn read_input(input: &str, verbose: bool) -> anyhow::Result<String> {
    let content = if input == "-" {
        if verbose {
            print_step(1, 2, "Reading from stdin");
        }
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        if verbose {
            print_step(1, 2, &format!("Reading from file {}", input.bright_white()));
        }
        fs::read_to_string(input).with_context(|| format!("Failed to read file: {}", input))?
    };

    if verbose {
        print_detail("Size", &format_size(content.len()));
        eprintln!();
    }

    Ok(content)
}

fn read_page_content(converter: &Converter, input: &str, from: Format, verbose: bool) -> anyhow::Result<PageContent> {
    let text = read_input(input, verbose)?;
    match from {
        Format::Html => Ok(PageContent::Html(text)),
        Format::Json => Ok(PageContent::Nodes(
            converter
                .decode_content_tree(&text)
                .context("Failed to decode content JSON")?,
        )),
    }
}

fn build_client(args: &Args, converter: Converter) -> anyhow::Result<TelegraphClient> {
    let config = ClientConfig::builder()
        .base_url(&args.base_url)
        .timeout(args.timeout)
        .build();

    let mut client = TelegraphClient::new(config)
        .context("Failed to create Telegraph client")?
        .with_converter(converter);
    client.set_token(args.token.clone());

    if args.verbose {
        print_step(2, 2, &format!("Calling {}", args.base_url.bright_white().underline()));
    }

    Ok(client)
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize response")
}

async fn run(args: &Args, converter: Converter) -> anyhow::Result<String> {
    let output = match &args.command {
        Command::Convert { input, to, pretty } => {
            let text = read_input(input, args.verbose)?;
            if args.verbose {
                print_step(2, 2, &format!("Converting to {:?}", to));
            }
            match to {
                Format::Json => {
                    let nodes = converter.html_to_content_tree(&text).context("Failed to parse HTML")?;
                    let encoded = if *pretty {
                        telegraph_core::encode_pretty(&nodes)
                    } else {
                        converter.encode_content_tree(&nodes)
                    };
                    encoded.context("Failed to encode content")?
                }
                Format::Html => converter.json_to_html(&text).context("Failed to convert content JSON")?,
            }
        }
        Command::CreateAccount { short_name, author_name, author_url } => {
            let account = Account {
                short_name: Some(short_name.clone()),
                author_name: author_name.clone(),
                author_url: author_url.clone(),
                ..Default::default()
            };
            let client = build_client(args, converter)?;
            let account = client.create_account(&account).await.context("Failed to create account")?;
            print_info("Pass the access_token with --token or TELEGRAPH_TOKEN");
            to_json(&account)?
        }
        Command::EditAccount { short_name, author_name, author_url } => {
            let account = Account {
                short_name: short_name.clone(),
                author_name: author_name.clone(),
                author_url: author_url.clone(),
                ..Default::default()
            };
            let client = build_client(args, converter)?;
            to_json(&client.edit_account_info(&account).await.context("Failed to edit account")?)?
        }
        Command::Account => {
            let client = build_client(args, converter)?;
            to_json(&client.get_account_info().await.context("Failed to get account info")?)?
        }
        Command::RevokeToken => {
            let client = build_client(args, converter)?;
            let account = client.revoke_access_token().await.context("Failed to revoke access token")?;
            print_warning("The previous access token no longer works");
            to_json(&account)?
        }
        Command::CreatePage { title, input, from, author_name, author_url } => {
            let content = read_page_content(&converter, input, *from, args.verbose)?;
            let client = build_client(args, converter)?;
            let page = client
                .create_page(title, content, author_name.as_deref(), author_url.as_deref())
                .await
                .context("Failed to create page")?;
            print_success(&format!("Published at {}", page.url.bright_white()));
            to_json(&page)?
        }
        Command::EditPage { path, title, input, from, author_name, author_url } => {
            let content = read_page_content(&converter, input, *from, args.verbose)?;
            let client = build_client(args, converter)?;
            let page = client
                .edit_page(path, title, content, author_name.as_deref(), author_url.as_deref())
                .await
                .with_context(|| format!("Failed to edit page: {}", path))?;
            to_json(&page)?
        }
        Command::GetPage { path, format } => {
            let client = build_client(args, converter)?;
            let page = client
                .get_page(path)
                .await
                .with_context(|| format!("Failed to get page: {}", path))?;
            match format {
                Format::Json => to_json(&page)?,
                Format::Html => client
                    .converter()
                    .content_tree_to_html(page.content.as_deref().unwrap_or_default())
                    .context("Failed to render page content")?,
            }
        }
        Command::ListPages { offset, limit } => {
            let client = build_client(args, converter)?;
            to_json(&client.get_page_list(*offset, *limit).await.context("Failed to list pages")?)?
        }
        Command::Views { path, year, month, day, hour } => {
            let params = GetViewsParams { year: *year, month: *month, day: *day, hour: *hour };
            let params = (params != GetViewsParams::default()).then_some(params);
            let client = build_client(args, converter)?;
            let views = client
                .get_views(path, params.as_ref())
                .await
                .with_context(|| format!("Failed to get views: {}", path))?;
            to_json(&views)?
        }
    };

    Ok(output)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.verbose {
        print_banner();
    }

    let policy = load_policy(args.rules.as_deref(), args.verbose)?;
    let output = run(&args, Converter::with_policy(policy)).await?;

    match &args.output {
        Some(path) => {
            fs::write(path, &output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            println!("{}", output);
        }
    }

    Ok(())
}
