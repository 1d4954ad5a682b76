//! Interactive explorer: type a saved-view query, see the parsed model and
//! the compiled statement.

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use viewquery::{CompilerConfig, ConfigError, SavedViewCompiler};

#[derive(Parser, Debug)]
#[command(name = "viewquery", version, about = "Saved-view query to SQL compiler")]
struct Cli {
    /// JSON compiler config; defaults are used if the file is missing
    #[arg(long, short, env = "VIEWQUERY_CONFIG", default_value = "viewquery.json")]
    config: PathBuf,

    /// Project id the compiled queries are scoped to
    #[arg(long, short, default_value = "demo-project")]
    scope: String,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Compile this query and exit instead of starting the REPL
    query: Option<String>,
}

/// Loads the config, falling back to defaults when it cannot be used.
fn load_config(path: &Path) -> CompilerConfig {
    match CompilerConfig::from_json_file(path) {
        Ok(config) => {
            info!(path = %path.display(), "loaded compiler config");
            config
        }
        Err(ConfigError::NotFound(_)) => {
            warn!(path = %path.display(), "no config file, using defaults");
            CompilerConfig::default()
        }
        Err(e) => {
            warn!(error = %e, "config file unusable, using defaults");
            CompilerConfig::default()
        }
    }
}

fn run_query(views: &SavedViewCompiler, scope: &str, query: &str, json: bool) -> Result<()> {
    let view = views
        .compile_view(scope, query)
        .context("query rejected")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("[filters]");
    for filter in &view.parsed.filters {
        println!("  {}", filter);
    }
    println!("[normalized]   {}", view.normalized);
    println!("[presentation] {}", view.presentation);
    println!("[sql]          {}", view.compiled.sql);
    println!("[args]         {}", serde_json::to_string(&view.compiled.args)?);
    Ok(())
}

fn print_help() {
    println!("Enter a query, e.g. status:open priority:(P0 P1) due:<today sort:priority_desc limit:10");
    println!("  :scope <id>   switch the project scope");
    println!("  :help         show this message");
    println!("  :quit         exit");
}

fn repl(views: &SavedViewCompiler, mut scope: String, json: bool) -> Result<()> {
    let mut editor = DefaultEditor::new().context("failed to start line editor")?;
    println!("viewquery v{} (scope: {})", env!("CARGO_PKG_VERSION"), scope);
    println!("Enter \":help\" for usage hints.");

    loop {
        let line = match editor.readline("viewquery> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read line"),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(trimmed);

        match trimmed {
            ":quit" | ":q" => break,
            ":help" => print_help(),
            cmd if cmd.starts_with(":scope") => match cmd.split_whitespace().nth(1) {
                Some(id) => {
                    scope = id.to_string();
                    println!("scope set to {}", scope);
                }
                None => println!("usage: :scope <id>"),
            },
            query => {
                if let Err(e) = run_query(views, &scope, query, json) {
                    eprintln!("✗ {:#}", e);
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let views = SavedViewCompiler::new(load_config(&cli.config));

    match cli.query {
        Some(query) => run_query(&views, &cli.scope, &query, cli.json),
        None => repl(&views, cli.scope, cli.json),
    }
}
