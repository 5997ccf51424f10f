use anyhow::{Context, Result};
use clap::Parser;
use markdown_remote_code_config::Config;
use markdown_remote_code_engine::{
    LocalSource, RemoteSource, RewriteOptions, Sources, io, rewrite_document,
};
use std::path::{Path, PathBuf};
use std::{env, process};

/// Fill fenced code blocks with snippets referenced by `url=` or `file=`
/// directives in their metadata.
#[derive(Debug, Parser)]
#[command(name = "markdown-remote-code", version)]
struct Cli {
    /// Markdown files to rewrite
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Config file (defaults to ~/.config/markdown-remote-code/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Value substituted for <rootDir> in directives
    #[arg(long)]
    root_dir: Option<String>,

    /// Keep the blank line produced by a source's trailing newline
    #[arg(long)]
    preserve_trailing_newline: bool,

    /// Strip indentation shared by every line of a snippet
    #[arg(long)]
    remove_redundant_indentations: bool,

    /// Let file= directives read outside the current directory
    #[arg(long)]
    allow_outside_root: bool,

    /// Write results back to the files instead of stdout
    #[arg(short, long, conflicts_with = "check")]
    in_place: bool,

    /// Exit with status 1 if any file is not up to date
    #[arg(long)]
    check: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    UpToDate,
    Stale(Vec<PathBuf>),
}

/// Merges the config file with command-line flags; flags win.
fn rewrite_options(cli: &Cli, config: &Config) -> RewriteOptions {
    RewriteOptions {
        preserve_trailing_newline: cli.preserve_trailing_newline
            || config.preserve_trailing_newline,
        remove_redundant_indentations: cli.remove_redundant_indentations
            || config.remove_redundant_indentations,
        root_dir: cli
            .root_dir
            .clone()
            .or_else(|| config.root_dir.clone())
            .unwrap_or_default(),
        ..Default::default()
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let config = Config::load_from_path(path)?;
            config.with_context(|| format!("Config file {} does not exist", path.display()))?
        }
        None => Config::load()?.unwrap_or_default(),
    };
    Ok(config)
}

/// Directory relative `file=` locators are resolved against.
fn document_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// A document whose rewrite succeeded.
struct Rendered {
    path: PathBuf,
    changed: bool,
    text: String,
}

/// Rewrites every file without emitting anything, so one failure leaves no
/// partial output behind.
async fn render_all(
    cli: &Cli,
    options: &RewriteOptions,
    allow_outside_root: bool,
) -> Result<Vec<Rendered>> {
    let root = env::current_dir().context("Unable to determine the current directory")?;
    let remote = RemoteSource::new();

    let mut rendered = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let original = io::read_document(path)?;
        let local =
            LocalSource::new(document_dir(path), &root).allow_outside_root(allow_outside_root);
        let sources = Sources::new(local, remote.clone());

        let text = rewrite_document(&original, &sources, options)
            .await
            .with_context(|| format!("Failed to rewrite {}", path.display()))?;
        rendered.push(Rendered {
            path: path.clone(),
            changed: text != original,
            text,
        });
    }
    Ok(rendered)
}

async fn run(cli: Cli) -> Result<Outcome> {
    let config = load_config(cli.config.as_deref())?;
    let options = rewrite_options(&cli, &config);
    let allow_outside_root = cli.allow_outside_root || config.allow_outside_root;

    let rendered = render_all(&cli, &options, allow_outside_root).await?;

    if cli.check {
        let stale: Vec<PathBuf> = rendered
            .into_iter()
            .filter(|doc| doc.changed)
            .map(|doc| doc.path)
            .collect();
        return Ok(if stale.is_empty() {
            Outcome::UpToDate
        } else {
            Outcome::Stale(stale)
        });
    }

    for doc in rendered {
        if !cli.in_place {
            print!("{}", doc.text);
        } else if doc.changed {
            io::write_document(&doc.path, &doc.text)?;
            log::info!("Updated {}", doc.path.display());
        } else {
            log::debug!("{} is up to date", doc.path.display());
        }
    }
    Ok(Outcome::UpToDate)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    log::debug!("{cli:?}");

    match run(cli).await {
        Ok(Outcome::UpToDate) => {}
        Ok(Outcome::Stale(paths)) => {
            for path in paths {
                eprintln!("{} is out of date", path.display());
            }
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(2);
        }
    }
}
