mod cache;
mod entry;
mod resolve;
mod scan;
mod segment;
mod types;
mod unlatexify;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use resolve::Resolver;
use types::{Resolution, ResolvedVia};

#[derive(Parser)]
#[command(name = "bbl2bib", about = "Extract a LaTeX bibliography and resolve it into a BibTeX file")]
struct Cli {
    /// LaTeX source file or directory to scan
    input: PathBuf,

    /// Output file (default: biblio.bib inside the scanned directory)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the bibliography to stdout instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// File extensions scanned in directory mode
    #[arg(long, value_delimiter = ',', default_values_t = default_extensions())]
    extensions: Vec<String>,

    /// Number of concurrent resolver workers
    #[arg(long, default_value_t = 4)]
    jobs: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Citation search endpoint
    #[arg(long, env = "BBL2BIB_SEARCH_URL", default_value = "https://search.crossref.org/dois")]
    search_url: String,

    /// Disable the on-disk lookup cache
    #[arg(long)]
    no_cache: bool,
}

fn default_extensions() -> Vec<String> {
    vec!["tex".to_string(), "bbl".to_string()]
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let raw = scan::scan_path(&cli.input, &cli.extensions)?;
    let items = segment::segment(&raw);
    if items.is_empty() {
        eprintln!("No bibliography items found under {}", cli.input.display());
    }
    let resolver = build_resolver(&cli);
    let resolutions = resolver.resolve_all(&items, cli.jobs);
    write_output(&cli, &render_bibliography(&resolutions))?;
    print_summary(&resolutions);
    Ok(())
}

fn build_resolver(cli: &Cli) -> Resolver {
    let cache = if cli.no_cache {
        None
    } else {
        match cache::LookupCache::open() {
            Ok(cache) => Some(cache),
            Err(err) => {
                eprintln!("Lookup cache unavailable: {err}");
                None
            }
        }
    };
    Resolver::new(cli.search_url.clone(), Duration::from_secs(cli.timeout), cache)
}

/// All resolved records, separated by a blank line, in source order.
fn render_bibliography(resolutions: &[Resolution]) -> String {
    let mut out = resolutions
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn write_output(cli: &Cli, output: &str) -> Result<()> {
    if cli.stdout {
        print!("{output}");
        return Ok(());
    }
    let path = output_path(cli);
    fs::write(&path, output).with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}

fn output_path(cli: &Cli) -> PathBuf {
    if let Some(out) = &cli.out {
        return out.clone();
    }
    let dir = if cli.input.is_dir() {
        cli.input.as_path()
    } else {
        cli.input.parent().unwrap_or(Path::new("."))
    };
    dir.join("biblio.bib")
}

fn print_summary(resolutions: &[Resolution]) {
    let count = |via: ResolvedVia| resolutions.iter().filter(|r| r.via == via).count();
    eprintln!(
        "{} references: {} via content negotiation, {} from search metadata, {} synthesized",
        resolutions.len(),
        count(ResolvedVia::ContentNegotiation),
        count(ResolvedVia::SearchMetadata),
        count(ResolvedVia::Synthesized),
    );
    let synthesized: Vec<&str> = resolutions
        .iter()
        .filter(|r| r.via == ResolvedVia::Synthesized)
        .map(|r| r.label.as_str())
        .collect();
    if !synthesized.is_empty() {
        eprintln!("Synthesized from raw text: {}", synthesized.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolution(label: &str, text: &str) -> Resolution {
        Resolution {
            label: label.to_string(),
            text: text.to_string(),
            via: ResolvedVia::Synthesized,
        }
    }

    #[test]
    fn records_separated_by_blank_line() {
        let rendered = render_bibliography(&[
            resolution("a", "@MISC{a,\n\tnote = {x}}"),
            resolution("b", "@MISC{b,\n\tnote = {y}}"),
        ]);
        assert_eq!(rendered, "@MISC{a,\n\tnote = {x}}\n\n@MISC{b,\n\tnote = {y}}\n");
    }

    #[test]
    fn empty_run_renders_empty() {
        assert_eq!(render_bibliography(&[]), "");
    }
}
