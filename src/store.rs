//! Per-user watch state: progress, favorites and ratings.
//!
//! Every map here is keyed show → season → episode and is a plain value:
//! callers load a [`Library`] snapshot, run operations on it and save it
//! back. Identifiers are never validated against metadata at this layer.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{EpisodeNumber, EpisodeRef, SeasonNumber, ShowId};

/// Highest accepted rating score.
pub const MAX_RATING: u8 = 10;

/// Watch status of a single episode.
///
/// Persisted as its numeric code: 0 not watched, 1 in progress, 2 watched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum WatchStatus {
    #[default]
    NotWatched,
    /// Legacy partial state, kept for old snapshots.
    InProgress,
    Watched,
}

impl From<WatchStatus> for u8 {
    fn from(status: WatchStatus) -> Self {
        match status {
            WatchStatus::NotWatched => 0,
            WatchStatus::InProgress => 1,
            WatchStatus::Watched => 2,
        }
    }
}

impl From<u8> for WatchStatus {
    /// Unknown codes read as not watched.
    fn from(code: u8) -> Self {
        match code {
            1 => WatchStatus::InProgress,
            2 => WatchStatus::Watched,
            _ => WatchStatus::NotWatched,
        }
    }
}

/// A journal entry written about an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    pub text: String,
    #[serde(default)]
    pub mood: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Journal {
    /// Create an entry stamped with the current time.
    pub fn new(text: &str, mood: Option<&str>) -> Self {
        Self {
            text: text.to_string(),
            mood: mood.map(str::to_string),
            timestamp: Utc::now(),
        }
    }
}

/// Tracking record of one episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeProgress {
    #[serde(default)]
    pub status: WatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<Journal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl EpisodeProgress {
    /// A record that carries nothing and can be dropped.
    fn is_blank(&self) -> bool {
        self.status == WatchStatus::NotWatched && self.journal.is_none() && self.note.is_none()
    }
}

/// Nested show → season → episode map shared by the per-episode stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeMap<T> {
    shows: HashMap<ShowId, HashMap<SeasonNumber, HashMap<EpisodeNumber, T>>>,
}

impl<T> Default for EpisodeMap<T> {
    fn default() -> Self {
        Self {
            shows: HashMap::new(),
        }
    }
}

impl<T> EpisodeMap<T> {
    pub fn get(&self, show: ShowId, ep: EpisodeRef) -> Option<&T> {
        self.shows
            .get(&show)
            .and_then(|seasons| seasons.get(&ep.season))
            .and_then(|episodes| episodes.get(&ep.episode))
    }

    pub fn insert(&mut self, show: ShowId, ep: EpisodeRef, value: T) {
        self.shows
            .entry(show)
            .or_default()
            .entry(ep.season)
            .or_default()
            .insert(ep.episode, value);
    }

    /// Remove an entry, dropping season and show maps left empty.
    pub fn remove(&mut self, show: ShowId, ep: EpisodeRef) -> Option<T> {
        let seasons = self.shows.get_mut(&show)?;
        let episodes = seasons.get_mut(&ep.season)?;
        let removed = episodes.remove(&ep.episode);
        if episodes.is_empty() {
            seasons.remove(&ep.season);
        }
        if seasons.is_empty() {
            self.shows.remove(&show);
        }
        removed
    }

    /// Entries recorded for one season, sorted by episode number.
    pub fn season_entries(&self, show: ShowId, season: SeasonNumber) -> Vec<(EpisodeNumber, &T)> {
        let mut entries: Vec<(EpisodeNumber, &T)> = self
            .shows
            .get(&show)
            .and_then(|seasons| seasons.get(&season))
            .map(|episodes| episodes.iter().map(|(n, v)| (*n, v)).collect())
            .unwrap_or_default();
        entries.sort_by_key(|(n, _)| *n);
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }
}

impl<T: Default> EpisodeMap<T> {
    fn entry(&mut self, show: ShowId, ep: EpisodeRef) -> &mut T {
        self.shows
            .entry(show)
            .or_default()
            .entry(ep.season)
            .or_default()
            .entry(ep.episode)
            .or_default()
    }
}

/// Watch status and annotations per episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressStore {
    entries: EpisodeMap<EpisodeProgress>,
}

impl ProgressStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the watch status of an episode.
    ///
    /// Setting [`WatchStatus::NotWatched`] on a record with no journal or note
    /// deletes the record; reads treat a missing record as not watched.
    pub fn set_episode_status(&mut self, show: ShowId, ep: EpisodeRef, status: WatchStatus) {
        debug!("Show {} {}: status -> {:?}", show, ep, status);
        self.entries.entry(show, ep).status = status;
        self.prune(show, ep);
    }

    /// Current status; missing records read as not watched.
    pub fn status_of(&self, show: ShowId, ep: EpisodeRef) -> WatchStatus {
        self.entries
            .get(show, ep)
            .map(|p| p.status)
            .unwrap_or_default()
    }

    pub fn is_watched(&self, show: ShowId, ep: EpisodeRef) -> bool {
        self.status_of(show, ep) == WatchStatus::Watched
    }

    /// Full record of an episode, if one exists.
    pub fn get(&self, show: ShowId, ep: EpisodeRef) -> Option<&EpisodeProgress> {
        self.entries.get(show, ep)
    }

    /// Attach or clear (`None`) the journal of an episode. Status is untouched.
    pub fn attach_journal(&mut self, show: ShowId, ep: EpisodeRef, journal: Option<Journal>) {
        debug!(
            "Show {} {}: journal {}",
            show,
            ep,
            if journal.is_some() { "set" } else { "cleared" }
        );
        self.entries.entry(show, ep).journal = journal;
        self.prune(show, ep);
    }

    pub fn journal(&self, show: ShowId, ep: EpisodeRef) -> Option<&Journal> {
        self.entries.get(show, ep).and_then(|p| p.journal.as_ref())
    }

    /// Attach or clear (`None`) a free-form note. Status is untouched.
    pub fn set_note(&mut self, show: ShowId, ep: EpisodeRef, note: Option<String>) {
        self.entries.entry(show, ep).note = note;
        self.prune(show, ep);
    }

    /// Set every listed episode to `status` in one pass.
    pub fn mark_episodes<I>(&mut self, show: ShowId, episodes: I, status: WatchStatus)
    where
        I: IntoIterator<Item = EpisodeRef>,
    {
        for ep in episodes {
            self.set_episode_status(show, ep, status);
        }
    }

    /// Delete the records of every listed episode, annotations included.
    pub fn remove_episodes<I>(&mut self, show: ShowId, episodes: I)
    where
        I: IntoIterator<Item = EpisodeRef>,
    {
        for ep in episodes {
            if self.entries.remove(show, ep).is_some() {
                debug!("Show {} {}: record removed", show, ep);
            }
        }
    }

    /// Recorded episodes of one season, in episode order.
    pub fn season_records(&self, show: ShowId, season: SeasonNumber) -> Vec<(EpisodeRef, &EpisodeProgress)> {
        self.entries
            .season_entries(show, season)
            .into_iter()
            .map(|(n, p)| (EpisodeRef::new(season, n), p))
            .collect()
    }

    /// Number of watched episodes recorded for a season, regardless of metadata.
    pub fn watched_in_season(&self, show: ShowId, season: SeasonNumber) -> usize {
        self.entries
            .season_entries(show, season)
            .iter()
            .filter(|(_, p)| p.status == WatchStatus::Watched)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn prune(&mut self, show: ShowId, ep: EpisodeRef) {
        if self.entries.get(show, ep).is_some_and(EpisodeProgress::is_blank) {
            self.entries.remove(show, ep);
        }
    }
}

/// Favorite flags per episode, independent of watch status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteEpisodes {
    entries: EpisodeMap<bool>,
}

impl FavoriteEpisodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the favorite flag and return the new value.
    pub fn toggle_favorite_episode(&mut self, show: ShowId, ep: EpisodeRef) -> bool {
        let now_favorite = !self.is_favorite(show, ep);
        if now_favorite {
            self.entries.insert(show, ep, true);
        } else {
            self.entries.remove(show, ep);
        }
        now_favorite
    }

    pub fn is_favorite(&self, show: ShowId, ep: EpisodeRef) -> bool {
        self.entries.get(show, ep).copied().unwrap_or(false)
    }
}

/// Clamp a score to the accepted range.
fn clamp_rating(score: u8) -> u8 {
    if score > MAX_RATING {
        warn!("Rating {} out of range, clamped to {}", score, MAX_RATING);
        MAX_RATING
    } else {
        score
    }
}

/// 1–10 scores per episode. A score of 0 removes the rating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeRatings {
    entries: EpisodeMap<u8>,
}

impl EpisodeRatings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_episode_rating(&mut self, show: ShowId, ep: EpisodeRef, score: u8) {
        match clamp_rating(score) {
            0 => {
                self.entries.remove(show, ep);
            }
            score => self.entries.insert(show, ep, score),
        }
    }

    pub fn get(&self, show: ShowId, ep: EpisodeRef) -> Option<u8> {
        self.entries.get(show, ep).copied()
    }
}

/// 1–10 scores per season. A score of 0 removes the rating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeasonRatings {
    entries: HashMap<ShowId, HashMap<SeasonNumber, u8>>,
}

impl SeasonRatings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_season_rating(&mut self, show: ShowId, season: SeasonNumber, score: u8) {
        match clamp_rating(score) {
            0 => {
                if let Some(seasons) = self.entries.get_mut(&show) {
                    seasons.remove(&season);
                    if seasons.is_empty() {
                        self.entries.remove(&show);
                    }
                }
            }
            score => {
                self.entries.entry(show).or_default().insert(season, score);
            }
        }
    }

    pub fn get(&self, show: ShowId, season: SeasonNumber) -> Option<u8> {
        self.entries
            .get(&show)
            .and_then(|seasons| seasons.get(&season))
            .copied()
    }
}

/// Snapshot of everything a user has recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub progress: ProgressStore,
    #[serde(default)]
    pub favorites: FavoriteEpisodes,
    #[serde(default)]
    pub episode_ratings: EpisodeRatings,
    #[serde(default)]
    pub season_ratings: SeasonRatings,
}

impl Library {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the default path of the library file.
    ///
    /// Returns ~/.local/share/watch-progress/library.json on Linux,
    /// or a platform-appropriate location on other systems.
    pub fn default_path() -> std::result::Result<PathBuf, io::Error> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Could not find data directory"))?
            .join("watch-progress");

        Ok(data_dir.join("library.json"))
    }

    /// Load a library from disk.
    ///
    /// Returns an empty library if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No library at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let library: Library = serde_json::from_str(&content)?;
        Ok(library)
    }

    /// Save the library to disk, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        debug!("Library saved to {}", path.display());
        Ok(())
    }
}
