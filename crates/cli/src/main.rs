use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{DataIndex, MOVIES_FILE, Movie, MovieId, RATINGS_FILE};
use posters::{PosterConfig, build_fetcher};
use recommender::{AppContext, MovieRecommendation, RecommendationOrchestrator, RecommendationOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Semaphore;
use tracing::{debug, info};

const SUGGESTION_LIMIT: usize = 10;

/// ReelSimilar - "more like this" movie recommendations
#[derive(Parser)]
#[command(name = "reel-similar")]
#[command(about = "Item-based movie recommendations from user ratings", long_about = None)]
struct Cli {
    /// Directory holding movies.csv and ratings.csv
    #[arg(short, long, default_value = "data/ml-latest-small")]
    data_dir: PathBuf,

    /// Movies file (overrides --data-dir)
    #[arg(long)]
    movies: Option<PathBuf>,

    /// Ratings file (overrides --data-dir)
    #[arg(long)]
    ratings: Option<PathBuf>,

    /// Skip poster lookups and always show the placeholder
    #[arg(long)]
    no_posters: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the movies that can be selected
    Movies {
        /// Only show titles containing this text
        #[arg(long)]
        filter: Option<String>,

        /// Maximum number of titles to print
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Show movies similar to one movie
    Recommend {
        /// Exact catalog title, e.g. "Toy Story (1995)"
        #[arg(long, conflicts_with = "movie_id", required_unless_present = "movie_id")]
        title: Option<String>,

        /// Catalog movie id
        #[arg(long)]
        movie_id: Option<MovieId>,

        /// Number of similar movies to show
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Pick movies one after another and get recommendations for each
    Interactive,

    /// Measure similarity lookup latency
    Benchmark {
        /// Number of lookups to make
        #[arg(long, default_value = "1000")]
        requests: usize,

        /// Number of lookups in flight at once
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before RUST_LOG and TMDB_* are read
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let movies_path = cli.movies.clone().unwrap_or_else(|| cli.data_dir.join(MOVIES_FILE));
    let ratings_path = cli.ratings.clone().unwrap_or_else(|| cli.data_dir.join(RATINGS_FILE));

    println!(
        "Loading {} and {}...",
        movies_path.display(),
        ratings_path.display()
    );
    let start = Instant::now();
    let context = AppContext::load(movies_path, ratings_path)
        .await
        .context("Failed to initialize recommender")?;

    let (users, movies, ratings) = context.data_index().counts();
    println!(
        "{} Indexed {} movies rated {} times by {} users in {:?}",
        "✓".green(),
        context.similarity().len(),
        ratings,
        users,
        start.elapsed()
    );
    if context.similarity().len() < movies {
        println!(
            "  {} catalog movies have no ratings and cannot be recommended",
            movies - context.similarity().len()
        );
    }
    let dropped = context.data_index().dropped_ratings();
    if dropped > 0 {
        println!("  {} ratings referenced unknown movies and were dropped", dropped);
    }

    let poster_config = PosterConfig::from_env().context("Invalid poster configuration")?;
    let posters = build_fetcher(&poster_config, !cli.no_posters);
    info!(fetcher = posters.name(), "Poster fetcher ready");

    match cli.command {
        Commands::Movies { filter, limit } => handle_movies(context.data_index(), filter, limit),
        Commands::Search { title } => handle_search(context.data_index(), &title),
        Commands::Recommend {
            title,
            movie_id,
            limit,
        } => {
            let orchestrator = RecommendationOrchestrator::new(context, posters).with_limit(limit);
            handle_recommend(&orchestrator, title, movie_id).await
        }
        Commands::Interactive => {
            let orchestrator = RecommendationOrchestrator::new(context, posters);
            handle_interactive(&orchestrator).await
        }
        Commands::Benchmark {
            requests,
            concurrent,
        } => {
            let orchestrator = RecommendationOrchestrator::new(context, posters);
            handle_benchmark(orchestrator, requests, concurrent).await
        }
    }
}

/// Handle the 'movies' command
fn handle_movies(data_index: &DataIndex, filter: Option<String>, limit: usize) -> Result<()> {
    let catalog = data_index.catalog();
    let needle = filter.as_deref().map(|f| f.trim().to_lowercase());

    let selected: Vec<&Movie> = catalog
        .iter()
        .copied()
        .filter(|m| match &needle {
            Some(n) => m.title.to_lowercase().contains(n),
            None => true,
        })
        .collect();

    println!("{}", format!("{} selectable movies:", selected.len()).bold().blue());
    for movie in selected.iter().take(limit) {
        println!("  {:>6}  {}", movie.id.to_string().dimmed(), movie.title);
    }
    if selected.len() > limit {
        println!("  ... {} more (use --limit or --filter)", selected.len() - limit);
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(data_index: &DataIndex, title: &str) -> Result<()> {
    let matches = data_index.search_titles(title, 20);

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("  {}", "No matching titles".yellow());
    }
    for movie in matches {
        print_movie_line(data_index, movie);
    }
    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    orchestrator: &RecommendationOrchestrator,
    title: Option<String>,
    movie_id: Option<MovieId>,
) -> Result<()> {
    let outcome = match (title, movie_id) {
        (Some(title), _) => orchestrator.recommend_title(&title).await,
        (None, Some(movie_id)) => orchestrator.recommend_movie(movie_id).await,
        (None, None) => bail!("Either --title or --movie-id is required"),
    };

    print_outcome(orchestrator.context().data_index(), &outcome);
    Ok(())
}

/// Handle the 'interactive' command
///
/// Each line is a catalog title, a number picked from the last list of
/// suggestions, or `q` to quit.
async fn handle_interactive(orchestrator: &RecommendationOrchestrator) -> Result<()> {
    let data_index = orchestrator.context().data_index().clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut suggestions: Vec<MovieId> = Vec::new();

    println!(
        "{}",
        "Type a movie title, a suggestion number, or q to quit.".bold()
    );

    loop {
        stdout.write_all(b"\nmovie> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        let outcome = match input.parse::<usize>() {
            Ok(n) if (1..=suggestions.len()).contains(&n) => {
                orchestrator.recommend_movie(suggestions[n - 1]).await
            }
            _ => orchestrator.recommend_title(input).await,
        };

        print_outcome(&data_index, &outcome);

        if let RecommendationOutcome::NotFound { query } = &outcome {
            suggestions = data_index
                .search_titles(query, SUGGESTION_LIMIT)
                .into_iter()
                .map(|m| m.id)
                .collect();
            if !suggestions.is_empty() {
                println!("Did you mean:");
                for (i, movie_id) in suggestions.iter().enumerate() {
                    if let Some(movie) = data_index.get_movie(*movie_id) {
                        println!("  {}. {}", (i + 1).to_string().green(), movie.title);
                    }
                }
            }
        }
    }

    println!("Bye!");
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    orchestrator: RecommendationOrchestrator,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 {
        bail!("--requests must be at least 1");
    }

    let items = orchestrator.context().similarity().items().to_vec();
    if items.is_empty() {
        bail!("No movies indexed");
    }

    // Random movies from the similarity index
    let movie_ids: Vec<MovieId> = (0..requests)
        .map(|_| items[rand::random::<u32>() as usize % items.len()])
        .collect();

    let semaphore = Arc::new(Semaphore::new(concurrent.max(1)));
    let run_start = Instant::now();

    let mut handles = Vec::with_capacity(requests);
    for movie_id in movie_ids {
        let orchestrator = orchestrator.clone();
        let semaphore = semaphore.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            let start = Instant::now();
            let neighbors = orchestrator.similar_movies(movie_id);
            Ok::<_, anyhow::Error>((start.elapsed(), neighbors.len()))
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    let mut empty = 0usize;
    for handle in handles {
        let (elapsed, found) = handle.await??;
        if found == 0 {
            empty += 1;
        }
        timings.push(elapsed);
    }
    let wall_time = run_start.elapsed();
    debug!(lookups = timings.len(), "Benchmark finished");

    timings.sort();
    let total: Duration = timings.iter().sum();
    let avg_latency = total / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];

    println!("{}", "Benchmark results:".bold().blue());
    println!("Lookups: {} ({} concurrent)", requests, concurrent.max(1));
    println!("Lookups with no neighbours: {}", empty);
    println!("Total time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!(
        "Throughput: {:.2} lookups/second",
        requests as f64 / wall_time.as_secs_f64()
    );

    Ok(())
}

fn print_movie_line(data_index: &DataIndex, movie: &Movie) {
    let stats = data_index
        .get_movie_stats(movie.id)
        .map(|s| format!("avg {:.2} ({} ratings)", s.avg_rating, s.rating_count))
        .unwrap_or_else(|| "no ratings".to_string());
    println!(
        "  {:>6}  {} [{}] {}",
        movie.id.to_string().dimmed(),
        movie.title,
        format_genres(&movie.genres.iter().map(|g| g.to_string()).collect::<Vec<_>>()),
        stats.dimmed()
    );
}

fn format_genres(genres: &[String]) -> String {
    if genres.is_empty() {
        "-".to_string()
    } else {
        genres.join(", ")
    }
}

/// Print one of the three user-visible outcomes
fn print_outcome(data_index: &DataIndex, outcome: &RecommendationOutcome) {
    match outcome {
        RecommendationOutcome::NotFound { query } => {
            println!(
                "{} Movie not found: '{}'",
                "!".yellow().bold(),
                query
            );
        }
        RecommendationOutcome::NoRecommendations { movie } => {
            println!(
                "{} No recommendations for '{}': no similar movies could be ranked",
                "!".yellow().bold(),
                movie.title
            );
        }
        RecommendationOutcome::Recommendations { movie, items } => {
            println!(
                "{}",
                format!("Because you picked {}:", movie.title).bold().blue()
            );
            for (rank, item) in items.iter().enumerate() {
                print_recommendation(data_index, rank + 1, item);
            }
        }
    }
}

fn print_recommendation(data_index: &DataIndex, rank: usize, item: &MovieRecommendation) {
    let ratings = data_index
        .get_movie_stats(item.movie_id)
        .map(|s| s.rating_count)
        .unwrap_or(0);
    println!(
        "{}. {} [{}] - similarity {:.3} ({} ratings)",
        rank.to_string().green(),
        item.title.bold(),
        format_genres(&item.genres),
        item.score,
        ratings
    );
    if item.poster.is_placeholder() {
        println!("   {} {}", "[no poster]".yellow(), item.poster.url().dimmed());
    } else {
        println!("   poster: {}", item.poster.url());
    }
}
