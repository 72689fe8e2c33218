//! Main entry point for the watch-progress CLI application.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::PathBuf;

use watch_progress::aggregate::{
    compute_all_season_progress, compute_overall_show_progress, find_next_unwatched_episode,
};
use watch_progress::classify::classify;
use watch_progress::config::Config;
use watch_progress::error::AppError;
use watch_progress::planner::{
    plan_bulk_log, plan_mark_previous_episodes, plan_mark_season_watched, plan_mark_show_watched,
    plan_unmark_season, EpisodesByShow, Plan,
};
use watch_progress::store::{Journal, Library, WatchStatus};
use watch_progress::types::{EpisodeId, EpisodeRef, SeasonNumber, ShowId, ShowMetadata};

/// Command-line arguments for the watch-progress application.
#[derive(Parser, Debug)]
#[command(
    name = "watch-progress",
    version,
    about = "Track watched episodes and show progress",
    long_about = "Mark episodes watched, journal and rate them, and see progress per season and show."
)]
struct Cli {
    /// Log verbosity level: 0=error, 1=warn, 2=info, 3=debug, 4=trace
    #[arg(short, long, default_value_t = 1, global = true)]
    log: u8,

    /// Library file (overrides config and platform default)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Directory holding <show_id>.json metadata files
    #[arg(short, long, global = true)]
    metadata_dir: Option<String>,

    /// Reference date for "aired" checks (YYYY-MM-DD, defaults to today)
    #[arg(short, long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set the watch status of an episode
    Mark {
        show: ShowId,
        episode: EpisodeRef,
        #[arg(long, value_enum, default_value_t = StatusArg::Watched)]
        status: StatusArg,
    },
    /// Clear the watch status of an episode
    Unmark { show: ShowId, episode: EpisodeRef },
    /// Write a journal entry (omit TEXT to clear it)
    Journal {
        show: ShowId,
        episode: EpisodeRef,
        text: Option<String>,
        #[arg(long)]
        mood: Option<String>,
    },
    /// Attach a note (omit TEXT to clear it)
    Note {
        show: ShowId,
        episode: EpisodeRef,
        text: Option<String>,
    },
    /// Toggle the favorite flag of an episode
    Favorite { show: ShowId, episode: EpisodeRef },
    /// Rate an episode 1-10 (0 clears)
    Rate {
        show: ShowId,
        episode: EpisodeRef,
        score: u8,
    },
    /// Rate a season 1-10 (0 clears)
    RateSeason {
        show: ShowId,
        season: SeasonNumber,
        score: u8,
    },
    /// Show per-season and overall progress
    Progress { show: ShowId },
    /// Show the next unwatched episode
    Next { show: ShowId },
    /// Show the premiere/finale label of an episode
    Tag { show: ShowId, episode: EpisodeRef },
    /// Mark every aired episode of a season watched
    MarkSeason {
        show: ShowId,
        season: SeasonNumber,
        #[arg(short, long)]
        yes: bool,
    },
    /// Mark every aired episode of a show watched
    MarkShow {
        show: ShowId,
        #[arg(short, long)]
        yes: bool,
    },
    /// Mark the unwatched episodes before EPISODE in its season
    CatchUp {
        show: ShowId,
        episode: EpisodeRef,
        #[arg(short, long)]
        yes: bool,
    },
    /// Remove every record of a season
    UnmarkSeason {
        show: ShowId,
        season: SeasonNumber,
        #[arg(short, long)]
        yes: bool,
    },
    /// Print history log entries for the given episode ids
    Log { show: ShowId, ids: Vec<EpisodeId> },
    /// Write a default config file if none exists
    InitConfig,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StatusArg {
    Watched,
    InProgress,
    NotWatched,
}

impl From<StatusArg> for WatchStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Watched => WatchStatus::Watched,
            StatusArg::InProgress => WatchStatus::InProgress,
            StatusArg::NotWatched => WatchStatus::NotWatched,
        }
    }
}

/// Print a plan and apply it when confirmed. Returns whether it was applied.
fn confirm_and_apply(plan: &Plan, library: &mut Library, confirmed: bool) -> bool {
    if plan.is_empty() {
        println!("Nothing to do.");
        return false;
    }

    let listed: Vec<String> = plan.episodes.iter().map(|ep| ep.to_string()).collect();
    println!("{:?} {} episode(s): {}", plan.action, plan.len(), listed.join(" "));

    if !confirmed {
        println!("Re-run with --yes to apply.");
        return false;
    }

    plan.apply(&mut library.progress);
    info!("Applied plan to show {}", plan.show);
    true
}

/// After the last episode of a season is marked, point out earlier gaps.
fn suggest_catch_up(library: &Library, metadata: &ShowMetadata, episode: EpisodeRef) {
    let Some(season) = metadata.season(episode.season) else {
        return;
    };
    if season.is_specials() || episode.episode != season.episode_count {
        return;
    }

    let plan = plan_mark_previous_episodes(&library.progress, metadata.id, episode.season, episode.episode);
    if !plan.is_empty() {
        println!(
            "{} earlier episode(s) of season {} are unwatched. Run `catch-up {} {}` to mark them.",
            plan.len(),
            episode.season,
            metadata.id,
            episode
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log {
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

    // Load config
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config: {}. Using defaults.", e);
        Config::new()
    });

    // Merge config with CLI args
    if let Some(dir) = &cli.metadata_dir {
        config.metadata_dir = dir.clone();
    }
    let library_path = match &cli.store {
        Some(path) => path.clone(),
        None => config.library_path()?,
    };
    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    debug!("Library at {}, today is {}", library_path.display(), today);

    let mut library = Library::load_from(&library_path)?;
    let load_metadata = |show: ShowId| ShowMetadata::load_from(&config.metadata_path(show));

    let modified = match cli.command {
        Command::Mark {
            show,
            episode,
            status,
        } => {
            library
                .progress
                .set_episode_status(show, episode, status.into());
            println!("{} {} -> {:?}", show, episode, WatchStatus::from(status));
            if matches!(status, StatusArg::Watched) {
                match load_metadata(show) {
                    Ok(metadata) => suggest_catch_up(&library, &metadata, episode),
                    Err(e) => debug!("No catch-up check: {}", e),
                }
            }
            true
        }
        Command::Unmark { show, episode } => {
            library
                .progress
                .set_episode_status(show, episode, WatchStatus::NotWatched);
            println!("{} {} -> NotWatched", show, episode);
            true
        }
        Command::Journal {
            show,
            episode,
            text,
            mood,
        } => {
            let journal = text.map(|t| Journal::new(&t, mood.as_deref()));
            library.progress.attach_journal(show, episode, journal);
            true
        }
        Command::Note {
            show,
            episode,
            text,
        } => {
            library.progress.set_note(show, episode, text);
            true
        }
        Command::Favorite { show, episode } => {
            let now = library.favorites.toggle_favorite_episode(show, episode);
            println!(
                "{} {} {}",
                show,
                episode,
                if now { "is now a favorite" } else { "is no longer a favorite" }
            );
            true
        }
        Command::Rate {
            show,
            episode,
            score,
        } => {
            library.episode_ratings.set_episode_rating(show, episode, score);
            true
        }
        Command::RateSeason {
            show,
            season,
            score,
        } => {
            library.season_ratings.set_season_rating(show, season, score);
            true
        }
        Command::Progress { show } => {
            let metadata = load_metadata(show)?;
            println!("{}", metadata.name);
            for season in compute_all_season_progress(&library.progress, &metadata, today) {
                let mark = if season.is_fully_watched() { " ✓" } else { "" };
                println!("  {}{}", season.to_display(), mark);
            }
            let overall = compute_overall_show_progress(&library.progress, &metadata, today);
            println!("Overall: {}", overall.to_display());
            false
        }
        Command::Next { show } => {
            let metadata = load_metadata(show)?;
            match find_next_unwatched_episode(&library.progress, &metadata) {
                Some(next) => {
                    let aired = metadata
                        .episode(next)
                        .is_some_and(|e| e.has_aired(today));
                    let suffix = if aired { "" } else { " (not aired yet)" };
                    println!("Next up: {}{}", next, suffix);
                }
                None => println!("All caught up."),
            }
            false
        }
        Command::Tag { show, episode } => {
            let metadata = load_metadata(show)?;
            let ep_meta = metadata
                .episode(episode)
                .ok_or_else(|| AppError::NotFound(format!("{} of show {}", episode, show)))?;
            let season = metadata.season(episode.season);
            let tag = classify(ep_meta, season, &metadata, season.and_then(|s| s.episode_list()));
            match tag {
                Some(tag) => println!("{}: {}", episode, tag.label()),
                None => println!("{}: -", episode),
            }
            false
        }
        Command::MarkSeason { show, season, yes } => {
            let metadata = load_metadata(show)?;
            let episodes = metadata
                .season(season)
                .and_then(|s| s.episode_list())
                .ok_or_else(|| {
                    AppError::NotFound(format!("episode details for season {}", season))
                })?;
            let plan = plan_mark_season_watched(show, season, episodes, today);
            confirm_and_apply(&plan, &mut library, yes || config.auto_confirm)
        }
        Command::MarkShow { show, yes } => {
            let metadata = load_metadata(show)?;
            let plan = plan_mark_show_watched(&metadata, today);
            confirm_and_apply(&plan, &mut library, yes || config.auto_confirm)
        }
        Command::CatchUp { show, episode, yes } => {
            let plan =
                plan_mark_previous_episodes(&library.progress, show, episode.season, episode.episode);
            confirm_and_apply(&plan, &mut library, yes || config.auto_confirm)
        }
        Command::UnmarkSeason { show, season, yes } => {
            let plan = plan_unmark_season(&library.progress, show, season);
            confirm_and_apply(&plan, &mut library, yes || config.auto_confirm)
        }
        Command::InitConfig => {
            let path = Config::create_default_if_missing()?;
            println!("Config at {}", path.display());
            false
        }
        Command::Log { show, ids } => {
            let metadata = load_metadata(show)?;
            let mut episodes = EpisodesByShow::new();
            let by_season = episodes.entry(show).or_default();
            for season in &metadata.seasons {
                if let Some(list) = season.episode_list() {
                    by_season.insert(season.season_number, list.to_vec());
                }
            }

            let selected: HashSet<EpisodeId> = ids.into_iter().collect();
            match plan_bulk_log(&selected, &episodes) {
                Ok(entries) => {
                    for entry in entries {
                        println!(
                            "{}\t{}\t{}",
                            entry.show,
                            EpisodeRef::new(entry.season, entry.episode),
                            entry.name
                        );
                    }
                }
                Err(AppError::EmptySelection) => println!("Nothing to do: no episodes selected."),
                Err(e) => return Err(e.into()),
            }
            false
        }
    };

    if modified {
        library.save_to(&library_path)?;
    }

    Ok(())
}
