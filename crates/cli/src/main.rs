use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{resolve_artifacts, DataStore, StoreLoader};
use engine::{
    run_check, CheckReport, MovieCard, RecommendationService, DEFAULT_TOP_N, MAX_TOP_N, MIN_TOP_N,
};
use poster_client::{NoPosters, PosterConfig, PosterLookup, PosterResolver};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Cards per row when printing recommendations
const GRID_COLUMNS: usize = 5;
/// Most search hits printed
const SEARCH_LIMIT: usize = 20;

/// Movie Recommender - find movies similar to one you like
#[derive(Parser)]
#[command(name = "movie-recs")]
#[command(about = "Content-based movie recommender over a precomputed similarity matrix", long_about = None)]
struct Cli {
    /// Directory holding movies.{json,dat} and similarity.{json,dat}
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Catalog file (overrides the one in --data-dir)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Similarity matrix file (overrides the one in --data-dir)
    #[arg(long)]
    similarity: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend movies similar to a title
    Recommend {
        /// Exact catalog title to start from
        #[arg(long)]
        title: String,

        /// Number of recommendations (1-10)
        #[arg(long, default_value_t = DEFAULT_TOP_N as u64, value_parser = top_n_parser())]
        top_n: u64,

        /// Don't look up poster images
        #[arg(long)]
        no_posters: bool,

        /// Print the cards as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search the catalog for titles
    Search {
        /// Title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Check recommendations for every title in the catalog
    Check {
        /// Only check the first N titles
        #[arg(long)]
        sample: Option<usize>,

        /// Number of recommendations per title (1-10)
        #[arg(long, default_value_t = DEFAULT_TOP_N as u64, value_parser = top_n_parser())]
        top_n: u64,
    },
}

/// Accepts MIN_TOP_N..=MAX_TOP_N, the counts the service serves unclamped
fn top_n_parser() -> clap::builder::RangedU64ValueParser {
    clap::value_parser!(u64).range(MIN_TOP_N as u64..=MAX_TOP_N as u64)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load the catalog and matrix once; everything below shares this Arc
    let loader = build_loader(&cli)?;
    let start = Instant::now();
    let data_store = loader
        .load()
        .with_context(|| format!("Failed to load movie data from {}", loader.catalog_path().display()))?;
    eprintln!(
        "{} Loaded {} movies in {:?}",
        "✓".green(),
        data_store.len(),
        start.elapsed()
    );

    match cli.command {
        Commands::Recommend {
            title,
            top_n,
            no_posters,
            json,
        } => handle_recommend(data_store, &title, top_n as usize, !no_posters, json).await?,
        Commands::Search { title } => handle_search(&mut io::stdout().lock(), &data_store, &title)?,
        Commands::Check { sample, top_n } => handle_check(data_store, sample, top_n as usize)?,
    }

    Ok(())
}

/// Explicit artifact paths win; anything missing is looked up in --data-dir
fn build_loader(cli: &Cli) -> Result<StoreLoader> {
    if let (Some(catalog), Some(similarity)) = (&cli.catalog, &cli.similarity) {
        return Ok(StoreLoader::new(catalog.clone(), similarity.clone()));
    }

    let (catalog, similarity) = resolve_artifacts(&cli.data_dir)
        .with_context(|| format!("No movie data found in {}", cli.data_dir.display()))?;
    Ok(StoreLoader::new(
        cli.catalog.clone().unwrap_or(catalog),
        cli.similarity.clone().unwrap_or(similarity),
    ))
}

/// Handle the 'recommend' command
async fn handle_recommend(
    data_store: Arc<DataStore>,
    title: &str,
    top_n: usize,
    show_posters: bool,
    json: bool,
) -> Result<()> {
    let posters: Arc<dyn PosterLookup> = if show_posters {
        let config = PosterConfig::from_env()?;
        Arc::new(PosterResolver::new(config).context("Failed to build poster client")?)
    } else {
        Arc::new(NoPosters)
    };

    let service = RecommendationService::new(data_store, posters);
    let cards = service.get_recommendations(title, top_n, show_posters).await;

    let mut out = io::stdout().lock();
    if json {
        write_json(&mut out, &cards)
    } else {
        write_recommendations(&mut out, title, &cards, show_posters)?;
        Ok(())
    }
}

/// Cards as a pretty JSON array, nothing else
fn write_json(out: &mut impl Write, cards: &[MovieCard]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, cards)?;
    writeln!(out)?;
    Ok(())
}

fn write_recommendations(
    out: &mut impl Write,
    title: &str,
    cards: &[MovieCard],
    show_posters: bool,
) -> io::Result<()> {
    if cards.is_empty() {
        return writeln!(out, "{}", "No recommendations found. Try another movie.".yellow());
    }

    writeln!(
        out,
        "{}",
        format!("Here are {} movies similar to {}:", cards.len(), title.bold()).green()
    )?;
    write_cards(out, cards, show_posters)
}

/// Handle the 'search' command
fn handle_search(out: &mut impl Write, data_store: &DataStore, title: &str) -> io::Result<()> {
    let matches = data_store.search(title);

    writeln!(out, "{}", format!("Search results for '{}':", title).bold().blue())?;
    if matches.is_empty() {
        return writeln!(out, "  (no matching titles)");
    }

    for (_, movie) in matches.iter().take(SEARCH_LIMIT) {
        writeln!(out, "  {}: {}", movie.id.to_string().cyan(), movie.title)?;
    }
    if matches.len() > SEARCH_LIMIT {
        writeln!(out, "  ... and {} more", matches.len() - SEARCH_LIMIT)?;
    }
    Ok(())
}

/// Handle the 'check' command
fn handle_check(data_store: Arc<DataStore>, sample: Option<usize>, top_n: usize) -> Result<()> {
    let service = RecommendationService::new(data_store, Arc::new(NoPosters));

    let start = Instant::now();
    let report = run_check(service.recommender(), sample, top_n);
    info!("Check took {:?}", start.elapsed());

    write_check_report(&mut io::stdout().lock(), &report)?;
    if !report.is_ok() {
        bail!("{} recommendation checks failed", report.failures.len());
    }
    Ok(())
}

fn write_check_report(out: &mut impl Write, report: &CheckReport) -> io::Result<()> {
    writeln!(out, "\n{}", "===== TEST SUMMARY =====".bold())?;
    writeln!(out, "Movies tested: {}", report.tested)?;
    writeln!(out, "Movies with EMPTY recommendations: {}", report.empty)?;
    writeln!(out, "Movies with ERRORS: {}", report.failures.len())?;

    if report.is_ok() {
        writeln!(out, "{} No errors found in recommendation logic!", "✓".green())?;
    } else {
        writeln!(out, "\nSample errors (first 10):")?;
        for failure in report.failures.iter().take(10) {
            writeln!(out, "- For '{}': {}", failure.title, failure.reason.red())?;
        }
    }
    writeln!(out, "========================")
}

/// Print cards as a grid: GRID_COLUMNS per row, numbered across rows
fn write_cards(out: &mut impl Write, cards: &[MovieCard], show_posters: bool) -> io::Result<()> {
    for (row, chunk) in cards.chunks(GRID_COLUMNS).enumerate() {
        writeln!(out, "{}", "─".repeat(60).dimmed())?;
        for (col, card) in chunk.iter().enumerate() {
            let rank = row * GRID_COLUMNS + col + 1;
            writeln!(
                out,
                "{}. {} {}",
                rank.to_string().green(),
                card.title.bold(),
                format!("(similarity {:.3})", card.score).dimmed()
            )?;
            if show_posters {
                match &card.poster_url {
                    Some(url) => writeln!(out, "   {}", url.cyan())?,
                    None => writeln!(out, "   {}", "no poster".dimmed())?,
                }
            }
        }
    }
    writeln!(out, "{}", "─".repeat(60).dimmed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Movie, SimilarityMatrix};
    use engine::CheckFailure;

    fn plain() {
        colored::control::set_override(false);
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        plain();
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn card(movie_id: u32, title: &str, score: f32, poster_url: Option<&str>) -> MovieCard {
        MovieCard {
            movie_id,
            title: title.to_string(),
            score,
            poster_url: poster_url.map(str::to_string),
        }
    }

    fn build_test_data_store() -> DataStore {
        let movies = vec![
            Movie { id: 1, title: "Alpha".to_string() },
            Movie { id: 2, title: "Beta".to_string() },
            Movie { id: 3, title: "Alphaville".to_string() },
        ];
        let similarity = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.9, 0.2],
            vec![0.9, 1.0, 0.4],
            vec![0.2, 0.4, 1.0],
        ])
        .unwrap();
        DataStore::from_parts(movies, similarity).unwrap()
    }

    #[test]
    fn test_top_n_range_enforced() {
        for bad in ["0", "11"] {
            let parsed = Cli::try_parse_from(["movie-recs", "recommend", "--title", "Alpha", "--top-n", bad]);
            assert!(parsed.is_err(), "--top-n {} should be rejected", bad);

            let parsed = Cli::try_parse_from(["movie-recs", "check", "--top-n", bad]);
            assert!(parsed.is_err(), "check --top-n {} should be rejected", bad);
        }

        let cli = Cli::try_parse_from(["movie-recs", "recommend", "--title", "Alpha", "--top-n", "10"]).unwrap();
        assert!(matches!(cli.command, Commands::Recommend { top_n: 10, .. }));
    }

    #[test]
    fn test_top_n_defaults() {
        let cli = Cli::try_parse_from(["movie-recs", "recommend", "--title", "Alpha"]).unwrap();
        assert!(matches!(cli.command, Commands::Recommend { top_n, .. } if top_n == DEFAULT_TOP_N as u64));

        let cli = Cli::try_parse_from(["movie-recs", "check"]).unwrap();
        assert!(matches!(cli.command, Commands::Check { sample: None, top_n } if top_n == DEFAULT_TOP_N as u64));
    }

    #[test]
    fn test_json_output_is_only_json() {
        let cards = vec![card(2, "Beta", 0.9, None), card(3, "Gamma", 0.2, Some("https://img/g.jpg"))];
        let mut buf = Vec::new();
        write_json(&mut buf, &cards).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "Beta");
        assert_eq!(items[0]["poster_url"], serde_json::Value::Null);
        assert_eq!(items[1]["poster_url"], "https://img/g.jpg");
    }

    #[test]
    fn test_recommendations_text() {
        let cards = vec![card(2, "Beta", 0.9, Some("https://img/b.jpg")), card(3, "Gamma", 0.2, None)];
        let text = render(|out| write_recommendations(out, "Alpha", &cards, true));

        assert!(text.contains("Here are 2 movies similar to Alpha:"));
        assert!(text.contains("1. Beta (similarity 0.900)"));
        assert!(text.contains("2. Gamma (similarity 0.200)"));
        assert!(text.contains("https://img/b.jpg"));
        assert!(text.contains("no poster"));
    }

    #[test]
    fn test_empty_recommendations_message() {
        let text = render(|out| write_recommendations(out, "Nope", &[], false));
        assert_eq!(text.trim(), "No recommendations found. Try another movie.");
    }

    #[test]
    fn test_grid_numbers_across_rows() {
        let cards: Vec<_> = (0..7).map(|i| card(i, &format!("M{}", i), 0.5, None)).collect();
        let text = render(|out| write_cards(out, &cards, false));

        assert!(text.contains("6. M5"));
        assert!(text.contains("7. M6"));
        // One rule above each row of five, plus the closing rule
        assert_eq!(text.lines().filter(|l| l.starts_with('─')).count(), 3);
    }

    #[test]
    fn test_search_output() {
        let store = build_test_data_store();
        let text = render(|out| handle_search(out, &store, "alpha"));

        assert!(text.contains("1: Alpha"));
        assert!(text.contains("3: Alphaville"));
        assert!(!text.contains("Beta"));

        let text = render(|out| handle_search(out, &store, "zzz"));
        assert!(text.contains("(no matching titles)"));
    }

    #[test]
    fn test_check_report_text() {
        let ok = CheckReport { tested: 3, empty: 0, failures: vec![] };
        let text = render(|out| write_check_report(out, &ok));
        assert!(text.contains("Movies tested: 3"));
        assert!(text.contains("No errors found"));

        let bad = CheckReport {
            tested: 3,
            empty: 1,
            failures: vec![CheckFailure {
                title: "Alpha".to_string(),
                reason: "Recommended the query movie itself".to_string(),
            }],
        };
        let text = render(|out| write_check_report(out, &bad));
        assert!(text.contains("Movies with ERRORS: 1"));
        assert!(text.contains("- For 'Alpha': Recommended the query movie itself"));
    }

    #[test]
    fn test_check_on_clean_store_succeeds() {
        plain();
        assert!(handle_check(Arc::new(build_test_data_store()), None, 2).is_ok());
    }
}
