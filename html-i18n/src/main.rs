//! `i18n-patch`: adds localization-key attributes to an HTML file.
//!
//! ```bash
//! i18n-patch --mapping de.json --input settings.html
//! i18n-patch --mapping de.json --input settings.html --output out.html --attribute data-l10n
//! i18n-patch --mapping de.json --input settings.html --dry-run -v
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use html_i18n::{DEFAULT_ATTRIBUTE, PatchConfig, patch_document};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "i18n-patch", version, about)]
struct Cli {
    /// JSON object mapping display text to localization keys
    #[arg(long)]
    mapping: PathBuf,

    /// HTML document to patch
    #[arg(long)]
    input: PathBuf,

    /// Where to write the result (default: overwrite the input)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Attribute that carries the key
    #[arg(long, default_value = DEFAULT_ATTRIBUTE)]
    attribute: String,

    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// List unmatched texts
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cfg = PatchConfig::load(&cli.mapping, cli.attribute.as_str())
        .with_context(|| format!("loading mapping {}", cli.mapping.display()))?;
    let html = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;

    let outcome = patch_document(&html, &cfg);
    for text in &outcome.unmatched {
        info!(text = %text, "no key for text");
    }

    println!(
        "{}: annotated {}, already annotated {}, unmatched {}",
        cli.input.display(),
        outcome.annotated,
        outcome.already_annotated,
        outcome.unmatched.len()
    );

    if cli.dry_run {
        return Ok(());
    }

    let target = cli.output.as_ref().unwrap_or(&cli.input);
    if !outcome.changed() && cli.output.is_none() {
        warn!("nothing to annotate; {} left as is", target.display());
        return Ok(());
    }
    std::fs::write(target, &outcome.output)
        .with_context(|| format!("writing {}", target.display()))?;
    println!("wrote {}", target.display());
    Ok(())
}
