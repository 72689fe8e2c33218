//! Type definitions for the watch-progress engine.
//!
//! This module contains the identifiers used to address a single episode and
//! the read-only metadata entities supplied by the external catalog provider
//! (shows, seasons and episodes).

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::AppError;

/// Catalog identifier of a show.
pub type ShowId = u64;

/// Season number within a show. Season 0 holds specials.
pub type SeasonNumber = u32;

/// Episode number, scoped to its season and starting at 1.
pub type EpisodeNumber = u32;

/// Catalog identifier of a single episode.
pub type EpisodeId = u64;

/// Season number reserved for specials.
pub const SPECIALS_SEASON: SeasonNumber = 0;

static EPISODE_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[sS](\d{1,4})[eE](\d{1,5})|(\d{1,4})[xX](\d{1,5}))$")
        .expect("episode reference pattern is valid")
});

/// Position of an episode inside a show: `(season, episode)`.
///
/// Ordering is season first, then episode, which is the order in which
/// episodes are meant to be watched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub season: SeasonNumber,
    pub episode: EpisodeNumber,
}

impl EpisodeRef {
    pub fn new(season: SeasonNumber, episode: EpisodeNumber) -> Self {
        Self { season, episode }
    }
}

impl fmt::Display for EpisodeRef {
    /// Formats as `S01E05`.
    ///
    /// # Examples
    ///
    /// ```
    /// use watch_progress::types::EpisodeRef;
    ///
    /// assert_eq!(EpisodeRef::new(1, 5).to_string(), "S01E05");
    /// assert_eq!(EpisodeRef::new(12, 103).to_string(), "S12E103");
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}

impl FromStr for EpisodeRef {
    type Err = AppError;

    /// Parses `S01E05`, `s1e5` or `1x05`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = EPISODE_REF_RE
            .captures(s.trim())
            .ok_or_else(|| AppError::InvalidInput(format!("'{}' is not an episode reference", s)))?;

        let season = caps.get(1).or_else(|| caps.get(3));
        let episode = caps.get(2).or_else(|| caps.get(4));

        match (season, episode) {
            (Some(season), Some(episode)) => {
                let season = season
                    .as_str()
                    .parse()
                    .map_err(|_| AppError::InvalidInput(format!("bad season in '{}'", s)))?;
                let episode = episode
                    .as_str()
                    .parse()
                    .map_err(|_| AppError::InvalidInput(format!("bad episode in '{}'", s)))?;
                Ok(EpisodeRef::new(season, episode))
            }
            _ => Err(AppError::InvalidInput(format!(
                "'{}' is not an episode reference",
                s
            ))),
        }
    }
}

/// Explicit episode type flag reported by the catalog provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeType {
    SeriesFinale,
    SeasonFinale,
    MidseasonFinale,
    /// Any other value the provider sends ("standard" and friends).
    #[serde(other)]
    Standard,
}

/// Production lifecycle of a show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleStatus {
    #[serde(rename = "Returning Series", alias = "Returning")]
    Returning,
    #[serde(rename = "In Production", alias = "InProduction")]
    InProduction,
    Planned,
    Pilot,
    Ended,
    #[serde(alias = "Cancelled")]
    Canceled,
    #[serde(other)]
    Unknown,
}

impl LifecycleStatus {
    /// No further episodes are expected.
    pub fn is_concluded(&self) -> bool {
        matches!(self, LifecycleStatus::Ended | LifecycleStatus::Canceled)
    }
}

/// A single episode as described by the catalog provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    /// Provider identifier, used to match bulk selections.
    #[serde(default)]
    pub id: EpisodeId,

    pub season_number: SeasonNumber,

    pub episode_number: EpisodeNumber,

    #[serde(default)]
    pub air_date: Option<NaiveDate>,

    #[serde(default)]
    pub episode_type: Option<EpisodeType>,

    #[serde(default)]
    pub name: String,
}

impl EpisodeMetadata {
    /// Position of this episode in its show.
    pub fn episode_ref(&self) -> EpisodeRef {
        EpisodeRef::new(self.season_number, self.episode_number)
    }

    /// An episode has aired when its air date is on or before `today`.
    ///
    /// Episodes without an air date are treated as not aired.
    pub fn has_aired(&self, today: NaiveDate) -> bool {
        matches!(self.air_date, Some(date) if date <= today)
    }
}

/// A season summary as described by the catalog provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonMetadata {
    pub season_number: SeasonNumber,

    pub episode_count: u32,

    #[serde(default)]
    pub air_date: Option<NaiveDate>,

    #[serde(default)]
    pub name: String,

    /// Per-episode details, `None` when they have not been fetched.
    #[serde(default)]
    pub episodes: Option<Vec<EpisodeMetadata>>,
}

impl SeasonMetadata {
    /// Whether this is the specials season.
    pub fn is_specials(&self) -> bool {
        self.season_number == SPECIALS_SEASON
    }

    /// Season-level aired check, used when episode details are missing.
    ///
    /// A season without an air date is assumed to have started.
    pub fn has_started(&self, today: NaiveDate) -> bool {
        self.air_date.is_none_or(|date| date <= today)
    }

    /// Fetched episode details, if any.
    pub fn episode_list(&self) -> Option<&[EpisodeMetadata]> {
        self.episodes.as_deref()
    }
}

/// A show as described by the catalog provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowMetadata {
    pub id: ShowId,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub number_of_seasons: u32,

    #[serde(default = "default_status")]
    pub status: LifecycleStatus,

    #[serde(default)]
    pub seasons: Vec<SeasonMetadata>,
}

fn default_status() -> LifecycleStatus {
    LifecycleStatus::Unknown
}

impl ShowMetadata {
    /// Read show metadata from a JSON file.
    pub fn load_from(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Err(AppError::NotFound(format!(
                "no metadata at {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Look up a season by number.
    pub fn season(&self, season_number: SeasonNumber) -> Option<&SeasonMetadata> {
        self.seasons
            .iter()
            .find(|s| s.season_number == season_number)
    }

    /// Look up a single episode in the fetched season details.
    pub fn episode(&self, ep: EpisodeRef) -> Option<&EpisodeMetadata> {
        self.season(ep.season)?
            .episode_list()?
            .iter()
            .find(|e| e.episode_number == ep.episode)
    }

    /// Regular (non-special) seasons in ascending order.
    pub fn regular_seasons(&self) -> Vec<&SeasonMetadata> {
        let mut seasons: Vec<&SeasonMetadata> =
            self.seasons.iter().filter(|s| !s.is_specials()).collect();
        seasons.sort_by_key(|s| s.season_number);
        seasons
    }

    /// Highest season number of the show.
    ///
    /// The larger of `number_of_seasons` and the highest season listed in
    /// `seasons`, so a stale count never hides a newer season.
    pub fn latest_season_number(&self) -> SeasonNumber {
        self.seasons
            .iter()
            .map(|s| s.season_number)
            .max()
            .unwrap_or(SPECIALS_SEASON)
            .max(self.number_of_seasons)
    }
}
