mod classify;
mod config;
mod dashboard;
mod error;
mod expand;
mod layout;
mod panel;
mod query;
mod style;

use anyhow::{Context, Result};
use clap::{Arg, Command, value_parser};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::dashboard::{DEFAULT_TITLE, GenerateOptions};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse CLI arguments
    let matches = Command::new("dashgen")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generates a Grafana dashboard from a CSV panel configuration")
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .help("Configuration table (CSV) with one row per panel or query")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("title")
                .long("title")
                .value_name("TITLE")
                .help("Dashboard title")
                .default_value(DEFAULT_TITLE),
        )
        .arg(
            Arg::new("styles")
                .long("styles")
                .value_name("PATH")
                .help("Optional style table keyed by Panel_Template")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("PATH")
                .help("Where to write the dashboard JSON")
                .default_value("generated_dashboard.json")
                .value_parser(value_parser!(PathBuf)),
        )
        .get_matches();

    let input = matches
        .get_one::<PathBuf>("input")
        .context("missing INPUT argument")?;
    let output = matches
        .get_one::<PathBuf>("output")
        .context("missing --output argument")?;
    let title = matches.get_one::<String>("title").map(String::as_str);

    let rows = config::load_rows(input)?;
    let style_rows = match matches.get_one::<PathBuf>("styles") {
        Some(path) => config::load_style_rows(path)?,
        None => Vec::new(),
    };

    let options = GenerateOptions::new(title);
    let dashboard = dashboard::generate(rows, &style_rows, &options)
        .with_context(|| format!("Invalid configuration in {}", input.display()))?;

    dashboard.save(output)?;
    println!("Dashboard saved to: {}", output.display());

    Ok(())
}
