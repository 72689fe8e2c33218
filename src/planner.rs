//! Bulk marking and logging plans.
//!
//! Planners only compute which episodes a scoped request touches. They never
//! mutate the store; the caller confirms a [`Plan`] and applies it in one
//! step with [`Plan::apply`], then persists the result as a single write.
//! An empty plan is a normal outcome, not an error.

use chrono::NaiveDate;
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::{AppError, Result};
use crate::store::{ProgressStore, WatchStatus};
use crate::types::{
    EpisodeId, EpisodeMetadata, EpisodeNumber, EpisodeRef, SeasonNumber, ShowId, ShowMetadata,
};

/// What applying a plan does to each episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    /// Upsert as watched.
    MarkWatched,
    /// Delete the episode's record.
    Unmark,
}

/// A proposed set of episode changes for one show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub show: ShowId,
    pub action: PlanAction,
    pub episodes: BTreeSet<EpisodeRef>,
}

impl Plan {
    fn new(show: ShowId, action: PlanAction) -> Self {
        Self {
            show,
            action,
            episodes: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    /// Apply every change of the plan to `store`.
    pub fn apply(&self, store: &mut ProgressStore) {
        debug!(
            "Applying {:?} to {} episodes of show {}",
            self.action,
            self.len(),
            self.show
        );
        let episodes = self.episodes.iter().copied();
        match self.action {
            PlanAction::MarkWatched => store.mark_episodes(self.show, episodes, WatchStatus::Watched),
            PlanAction::Unmark => store.remove_episodes(self.show, episodes),
        }
    }
}

/// Every aired episode of a season. Unaired episodes are never included.
pub fn plan_mark_season_watched(
    show: ShowId,
    season: SeasonNumber,
    season_episodes: &[EpisodeMetadata],
    today: NaiveDate,
) -> Plan {
    let mut plan = Plan::new(show, PlanAction::MarkWatched);
    plan.episodes.extend(
        season_episodes
            .iter()
            .filter(|e| e.has_aired(today))
            .map(|e| EpisodeRef::new(season, e.episode_number)),
    );
    debug!(
        "Show {} season {}: {} of {} episodes aired",
        show,
        season,
        plan.len(),
        season_episodes.len()
    );
    plan
}

/// Episodes `1..last_episode` of a season that are not yet watched.
///
/// Used to offer catching up the rest of a season after its last episode is
/// marked directly; `last_episode` itself is excluded.
pub fn plan_mark_previous_episodes(
    store: &ProgressStore,
    show: ShowId,
    season: SeasonNumber,
    last_episode: EpisodeNumber,
) -> Plan {
    let mut plan = Plan::new(show, PlanAction::MarkWatched);
    plan.episodes.extend(
        (1..last_episode)
            .map(|n| EpisodeRef::new(season, n))
            .filter(|ep| !store.is_watched(show, *ep)),
    );
    plan
}

/// Aired episodes across every regular season of a show.
///
/// Seasons whose episode details have not been fetched use the same
/// season-level fallback as progress: once the season has started, episodes
/// `1..=episode_count` are included.
pub fn plan_mark_show_watched(show: &ShowMetadata, today: NaiveDate) -> Plan {
    let mut plan = Plan::new(show.id, PlanAction::MarkWatched);
    for season in show.regular_seasons() {
        match season.episode_list() {
            Some(episodes) => {
                let season_plan =
                    plan_mark_season_watched(show.id, season.season_number, episodes, today);
                plan.episodes.extend(season_plan.episodes);
            }
            None if season.has_started(today) => {
                debug!(
                    "Show {} season {}: no episode details, using episode count {}",
                    show.id, season.season_number, season.episode_count
                );
                plan.episodes.extend(
                    (1..=season.episode_count).map(|n| EpisodeRef::new(season.season_number, n)),
                );
            }
            None => debug!(
                "Show {} season {}: not started, skipped",
                show.id, season.season_number
            ),
        }
    }
    plan
}

/// Every recorded episode of a season, for removal.
pub fn plan_unmark_season(store: &ProgressStore, show: ShowId, season: SeasonNumber) -> Plan {
    let mut plan = Plan::new(show, PlanAction::Unmark);
    plan.episodes
        .extend(store.season_records(show, season).into_iter().map(|(ep, _)| ep));
    plan
}

/// One line of a watch-history log write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub show: ShowId,
    pub season: SeasonNumber,
    pub episode: EpisodeNumber,
    pub name: String,
}

/// Episode metadata grouped by show, then season.
pub type EpisodesByShow = HashMap<ShowId, HashMap<SeasonNumber, Vec<EpisodeMetadata>>>;

/// Resolve selected episode ids into ordered log entries.
///
/// Entries are ordered by show, season and episode. Returns
/// [`AppError::EmptySelection`] when nothing matches, which callers should
/// treat as "nothing to do" rather than a failure.
pub fn plan_bulk_log(selected: &HashSet<EpisodeId>, episodes: &EpisodesByShow) -> Result<Vec<LogEntry>> {
    let mut entries: Vec<LogEntry> = episodes
        .iter()
        .flat_map(move |(show, seasons)| {
            seasons
                .values()
                .flatten()
                .filter(move |e| selected.contains(&e.id))
                .map(move |e| LogEntry {
                    show: *show,
                    season: e.season_number,
                    episode: e.episode_number,
                    name: e.name.clone(),
                })
        })
        .collect();

    if entries.is_empty() {
        warn!("Bulk log: none of {} selected ids matched", selected.len());
        return Err(AppError::EmptySelection);
    }

    entries.sort_by_key(|e| (e.show, e.season, e.episode));
    entries.dedup_by_key(|e| (e.show, e.season, e.episode));
    Ok(entries)
}
