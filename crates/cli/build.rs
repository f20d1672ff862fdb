use std::{env, fs, path::PathBuf};

fn input_arg() -> clap::Arg {
    clap::arg!(<INPUT> "HTML or JSON file, or '-' for stdin")
}

fn format_arg(long: &'static str, default: &'static str) -> clap::Arg {
    clap::Arg::new(long)
        .long(long)
        .value_name("FORMAT")
        .default_value(default)
        .value_parser(["json", "html"])
}

fn value_arg(long: &'static str, value_name: &'static str, help: &'static str) -> clap::Arg {
    clap::Arg::new(long)
        .long(long)
        .value_name(value_name)
        .help(help)
}

fn author_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(value_arg("author-name", "NAME", "Author name shown below the title"))
        .arg(value_arg("author-url", "URL", "Profile link opened from the author name"))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("telegraph")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Telegraph CLI Contributors")
        .about("Publish to Telegraph and convert HTML to Telegraph content")
        .subcommand_required(true)
        .arg(clap::arg!(--token <TOKEN> "Account access token").global(true))
        .arg(
            clap::arg!(--rules <FILE> "JSON file with tag rules and attribute lists")
                .global(true)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(value_arg("base-url", "URL", "Telegraph API root").global(true))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").global(true).default_value("30"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .global(true)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging").global(true))
        .subcommand(
            clap::Command::new("convert")
                .about("Convert HTML to content JSON, or content JSON to HTML")
                .arg(input_arg())
                .arg(format_arg("to", "json"))
                .arg(clap::arg!(--pretty "Pretty-print JSON output")),
        )
        .subcommand(author_args(
            clap::Command::new("create-account")
                .about("Create a new account and print it with its access token")
                .arg(value_arg("short-name", "NAME", "Account name").required(true)),
        ))
        .subcommand(author_args(
            clap::Command::new("edit-account")
                .about("Update account information")
                .arg(value_arg("short-name", "NAME", "Account name")),
        ))
        .subcommand(clap::Command::new("account").about("Show account information"))
        .subcommand(
            clap::Command::new("revoke-token").about("Revoke the access token and print the account with a new one"),
        )
        .subcommand(author_args(
            clap::Command::new("create-page")
                .about("Publish a new page")
                .arg(clap::arg!(--title <TITLE> "Page title").required(true))
                .arg(input_arg())
                .arg(format_arg("from", "html")),
        ))
        .subcommand(author_args(
            clap::Command::new("edit-page")
                .about("Replace the title and content of an existing page")
                .arg(clap::arg!(<PATH> "Page path"))
                .arg(clap::arg!(--title <TITLE> "Page title").required(true))
                .arg(input_arg())
                .arg(format_arg("from", "html")),
        ))
        .subcommand(
            clap::Command::new("get-page")
                .about("Fetch a page")
                .arg(clap::arg!(<PATH> "Page path"))
                .arg(format_arg("format", "json").short('f')),
        )
        .subcommand(
            clap::Command::new("list-pages")
                .about("List the account's pages")
                .arg(clap::arg!(--offset <NUM> "Sequential number of the first page").default_value("0"))
                .arg(clap::arg!(--limit <NUM> "Number of pages to return").default_value("50")),
        )
        .subcommand(
            clap::Command::new("views")
                .about("Show view counts for a page")
                .arg(clap::arg!(<PATH> "Page path"))
                .arg(clap::arg!(--year <YEAR> "Year, 2000-2100"))
                .arg(clap::arg!(--month <MONTH> "Month, 1-12"))
                .arg(clap::arg!(--day <DAY> "Day, 1-31"))
                .arg(clap::arg!(--hour <HOUR> "Hour, 0-24")),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "telegraph", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "telegraph", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "telegraph", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "telegraph", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
