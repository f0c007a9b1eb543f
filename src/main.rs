//! Main entry point for the podcast-catalog CLI application.

use clap::Parser;
use log::{debug, info, warn};
use podcast_catalog::api::HttpEpisodeSource;
use podcast_catalog::browser::{EpisodeBrowser, parse_episode_number};
use podcast_catalog::config::Config;
use podcast_catalog::filter::parse_filter_date;
use podcast_catalog::pagination::{PageSize, PaginationWindow};
use podcast_catalog::source::{EpisodeSource, InMemorySource};
use podcast_catalog::types::Episode;
use serde::Serialize;
use std::path::PathBuf;

/// Command-line arguments for the podcast-catalog application.
#[derive(Parser, Debug)]
#[command(
    name = "podcast-catalog",
    version,
    about = "Browse a podcast show's episode catalog",
    long_about = "Fetch, number, page, search and filter the episodes of a podcast show."
)]
struct Args {
    /// Show id on the upstream service
    show_id: String,

    /// Page to display (clamped to the available pages)
    #[arg(short, long, default_value_t = 1)]
    page: usize,

    /// Episodes per page: a number or "unlimited" (overrides config)
    #[arg(short = 's', long)]
    page_size: Option<String>,

    /// Jump to an episode number (1 is the newest episode)
    #[arg(short, long)]
    episode: Option<String>,

    /// Date filter: 30days, 90days, 1year or custom
    #[arg(short, long)]
    filter: Option<String>,

    /// Start date for a custom filter (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// End date for a custom filter (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Show the same position again with this page size
    #[arg(short, long)]
    resize_to: Option<String>,

    /// Fetch the page with a single upstream request instead of the full catalog
    #[arg(long)]
    single_request: bool,

    /// Print catalog totals instead of a page
    #[arg(short, long)]
    all: bool,

    /// Read episodes from a JSON dump instead of the upstream API
    #[arg(long)]
    from_file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(short, long)]
    json: bool,

    /// Print cache statistics after the command
    #[arg(long)]
    stats: bool,

    /// Truncate descriptions to this many characters (0 hides them)
    #[arg(short, long, default_value_t = 0)]
    description_width: usize,

    /// Write a default config file if none exists
    #[arg(long)]
    init_config: bool,

    /// Log verbosity level: 0=error, 1=warn, 2=info, 3=debug, 4=trace
    #[arg(short, long, default_value_t = 1)]
    log: u8,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_header(pagination: &PaginationWindow) {
    println!(
        "Page {} of {} (episodes {}-{} of {}, {} per page)",
        pagination.current_page,
        pagination.total_pages,
        pagination.start_index,
        pagination.end_index,
        pagination.total_items,
        pagination.page_size
    );
}

fn print_episodes(episodes: &[Episode], highlighted: Option<usize>, description_width: usize) {
    for (i, episode) in episodes.iter().enumerate() {
        let marker = if highlighted == Some(i) { ">" } else { " " };
        println!("{} {}", marker, episode.to_display());
        if description_width > 0 && !episode.description.is_empty() {
            println!("      {}", episode.truncated_description(description_width));
        }
    }
}

fn print_footer(pagination: &PaginationWindow) {
    let mut hints = Vec::new();
    if pagination.has_previous {
        hints.push(format!("--page {} for previous", pagination.current_page - 1));
    }
    if pagination.has_next {
        hints.push(format!("--page {} for next", pagination.current_page + 1));
    }
    if !hints.is_empty() {
        println!("({})", hints.join(", "));
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    debug!("Log level set to {:?}", log_level);

    if args.init_config {
        let path = Config::create_default_if_missing()?;
        info!("Config file at {}", path.display());
    }

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config: {}. Using defaults.", e);
        Config::new()
    });

    let page_size = match &args.page_size {
        Some(value) => value.parse::<PageSize>()?,
        None => config.default_page_size().unwrap_or_else(|e| {
            warn!("{}. Using 10 episodes per page.", e);
            PageSize::default()
        }),
    };

    if let Some(path) = &args.from_file {
        let source = InMemorySource::load(path)?;
        let browser = EpisodeBrowser::with_settings(source, config.fetch_settings());
        run(&browser, &args, page_size).await
    } else {
        let source = HttpEpisodeSource::from_config(&config).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });
        let browser = EpisodeBrowser::with_settings(source, config.fetch_settings());
        run(&browser, &args, page_size).await
    }
}

async fn run<S: EpisodeSource>(
    browser: &EpisodeBrowser<S>,
    args: &Args,
    page_size: PageSize,
) -> Result<(), Box<dyn std::error::Error>> {
    let show_id = args.show_id.as_str();

    if args.all {
        let catalog = browser.get_all_episodes(show_id).await?;
        if args.json {
            print_json(&catalog)?;
        } else {
            println!(
                "{} of {} episodes fetched{}",
                catalog.fetched_items,
                catalog.total_items,
                if catalog.is_complete { "" } else { " (incomplete)" }
            );
            print_episodes(&catalog.episodes, None, args.description_width);
        }
    } else if let Some(value) = &args.episode {
        let number = parse_episode_number(value)?;
        match browser.search_episode_by_number(show_id, number, page_size).await {
            Ok(outcome) if args.json => print_json(&outcome)?,
            Ok(outcome) => {
                println!(
                    "Episode #{} (found via {} search)",
                    outcome.searched_episode_number, outcome.search_method
                );
                print_header(&outcome.pagination);
                print_episodes(
                    &outcome.episodes,
                    Some(outcome.highlighted_index),
                    args.description_width,
                );
            }
            Err(failure) if args.json => {
                print_json(&failure)?;
                std::process::exit(1);
            }
            Err(failure) => {
                eprintln!("Error: {}", failure);
                std::process::exit(1);
            }
        }
    } else if let Some(kind) = &args.filter {
        let start = args.start.as_deref().map(parse_filter_date).transpose()?;
        let end = args.end.as_deref().map(parse_filter_date).transpose()?;
        match browser
            .filter_episodes_by_date(show_id, kind, start, end, args.page, page_size)
            .await
        {
            Ok(outcome) if args.json => print_json(&outcome)?,
            Ok(outcome) => {
                println!(
                    "Episodes released {} to {} ({})",
                    outcome.filter_start_date, outcome.filter_end_date, outcome.date_filter
                );
                print_header(&outcome.pagination);
                print_episodes(&outcome.episodes, None, args.description_width);
                print_footer(&outcome.pagination);
            }
            Err(failure) if args.json => {
                print_json(&failure)?;
                std::process::exit(1);
            }
            Err(failure) => {
                eprintln!("Error: {}", failure);
                std::process::exit(1);
            }
        }
    } else {
        let mut result = if args.single_request {
            browser.get_episodes_page(show_id, args.page, page_size).await?
        } else {
            browser.get_episodes_window(show_id, args.page, page_size).await?
        };

        if let Some(value) = &args.resize_to {
            let new_size = value.parse::<PageSize>()?;
            let resized = result.pagination.resized(new_size);
            debug!(
                "Resizing from {} to {} per page: page {} -> {}",
                page_size, new_size, result.pagination.current_page, resized.current_page
            );
            result = browser
                .get_episodes_window(show_id, resized.current_page, new_size)
                .await?;
        }

        if args.json {
            print_json(&result)?;
        } else {
            print_header(&result.pagination);
            print_episodes(&result.episodes, None, args.description_width);
            print_footer(&result.pagination);
        }
    }

    if args.stats {
        let stats = browser.get_performance_stats();
        if args.json {
            print_json(&stats)?;
        } else {
            println!(
                "Requests: {}, cache hits: {}, misses: {}, API calls: {}, average fetch: {:.1}ms",
                stats.total_requests,
                stats.cache_hits,
                stats.cache_misses,
                stats.total_api_calls,
                stats.average_fetch_time_ms()
            );
        }
    }

    Ok(())
}
