//! Derived progress facts for seasons and shows.
//!
//! Completion is measured against aired episodes only. Specials (season 0)
//! are counted separately and never feed the main show percentage.
//!
//! When a season's episode details have not been fetched, season progress
//! falls back to the season's `episode_count`. That path cannot tell aired
//! from unaired episodes and is reported with `precise == false`.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use crate::store::ProgressStore;
use crate::types::{EpisodeRef, SeasonMetadata, SeasonNumber, ShowId, ShowMetadata, SPECIALS_SEASON};

/// Progress through a single season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeasonProgress {
    pub season_number: SeasonNumber,
    /// 0..=100, rounded.
    pub percent: u8,
    pub watched_count: u32,
    pub unwatched_count: u32,
    pub total_aired: u32,
    /// False when computed from `episode_count` instead of air dates.
    pub precise: bool,
}

impl SeasonProgress {
    /// Every aired episode is watched and at least one has aired.
    pub fn is_fully_watched(&self) -> bool {
        self.unwatched_count == 0 && self.total_aired > 0
    }

    /// Format for display.
    ///
    /// # Examples
    ///
    /// ```
    /// use watch_progress::aggregate::SeasonProgress;
    ///
    /// let progress = SeasonProgress {
    ///     season_number: 2,
    ///     percent: 50,
    ///     watched_count: 4,
    ///     unwatched_count: 4,
    ///     total_aired: 8,
    ///     precise: true,
    /// };
    /// assert_eq!(progress.to_display(), "Season 2: 4/8 (50%)");
    /// ```
    pub fn to_display(&self) -> String {
        let label = if self.season_number == SPECIALS_SEASON {
            "Specials".to_string()
        } else {
            format!("Season {}", self.season_number)
        };
        let approx = if self.precise { "" } else { " ~" };
        format!(
            "{}: {}/{} ({}%){}",
            label, self.watched_count, self.total_aired, self.percent, approx
        )
    }
}

/// Progress through a whole show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ShowProgress {
    pub watched_count: u32,
    pub total_aired_count: u32,
    pub specials_watched: u32,
    pub specials_total: u32,
}

impl ShowProgress {
    /// Main percentage, specials excluded.
    pub fn percent(&self) -> u8 {
        percent_of(self.watched_count, self.total_aired_count)
    }

    pub fn specials_percent(&self) -> u8 {
        percent_of(self.specials_watched, self.specials_total)
    }

    pub fn unwatched_count(&self) -> u32 {
        self.total_aired_count.saturating_sub(self.watched_count)
    }

    /// Every aired regular episode is watched and at least one has aired.
    pub fn is_fully_watched(&self) -> bool {
        self.unwatched_count() == 0 && self.total_aired_count > 0
    }

    /// Format for display.
    ///
    /// # Examples
    ///
    /// ```
    /// use watch_progress::aggregate::ShowProgress;
    ///
    /// let progress = ShowProgress {
    ///     watched_count: 17,
    ///     total_aired_count: 18,
    ///     specials_watched: 0,
    ///     specials_total: 0,
    /// };
    /// assert_eq!(progress.to_display(), "17/18 episodes (94%)");
    /// ```
    pub fn to_display(&self) -> String {
        let mut out = format!(
            "{}/{} episodes ({}%)",
            self.watched_count,
            self.total_aired_count,
            self.percent()
        );
        if self.specials_total > 0 {
            out.push_str(&format!(
                ", specials {}/{} ({}%)",
                self.specials_watched,
                self.specials_total,
                self.specials_percent()
            ));
        }
        out
    }
}

fn percent_of(part: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let part = u64::from(part.min(total));
    let total = u64::from(total);
    ((part * 100 + total / 2) / total) as u8
}

/// Watched and aired counts for one season.
pub fn compute_season_progress(
    store: &ProgressStore,
    show: ShowId,
    season: &SeasonMetadata,
    today: NaiveDate,
) -> SeasonProgress {
    let season_number = season.season_number;

    let (watched, total, precise) = match season.episode_list() {
        Some(episodes) => {
            let aired: Vec<EpisodeRef> = episodes
                .iter()
                .filter(|e| e.has_aired(today))
                .map(|e| EpisodeRef::new(season_number, e.episode_number))
                .collect();
            let watched = aired.iter().filter(|ep| store.is_watched(show, **ep)).count() as u32;
            (watched, aired.len() as u32, true)
        }
        None => {
            let total = if season.has_started(today) {
                season.episode_count
            } else {
                0
            };
            let watched = (1..=total)
                .filter(|n| store.is_watched(show, EpisodeRef::new(season_number, *n)))
                .count() as u32;
            debug!(
                "Show {} season {}: no episode details, using episode count {}",
                show, season_number, total
            );
            (watched, total, false)
        }
    };

    SeasonProgress {
        season_number,
        percent: percent_of(watched, total),
        watched_count: watched,
        unwatched_count: total - watched,
        total_aired: total,
        precise,
    }
}

/// Progress for every season the metadata lists, in ascending order.
///
/// Specials come first when present.
pub fn compute_all_season_progress(
    store: &ProgressStore,
    show: &ShowMetadata,
    today: NaiveDate,
) -> Vec<SeasonProgress> {
    let mut seasons: Vec<&SeasonMetadata> = show.seasons.iter().collect();
    seasons.sort_by_key(|s| s.season_number);
    seasons
        .into_iter()
        .map(|season| compute_season_progress(store, show.id, season, today))
        .collect()
}

/// Show-wide watched and aired counts, specials reported separately.
///
/// A show with no seasons yields an all-zero result.
pub fn compute_overall_show_progress(
    store: &ProgressStore,
    show: &ShowMetadata,
    today: NaiveDate,
) -> ShowProgress {
    let mut progress = ShowProgress::default();

    for season in &show.seasons {
        let season_progress = compute_season_progress(store, show.id, season, today);
        if season.is_specials() {
            progress.specials_watched += season_progress.watched_count;
            progress.specials_total += season_progress.total_aired;
        } else {
            progress.watched_count += season_progress.watched_count;
            progress.total_aired_count += season_progress.total_aired;
        }
    }

    progress
}

/// First episode, in watch order, that is not marked watched.
///
/// Seasons are scanned in ascending order with specials skipped, episodes
/// `1..=episode_count` within each. Air dates are ignored: an unaired
/// episode is a valid answer. `None` means every known episode is watched.
pub fn find_next_unwatched_episode(store: &ProgressStore, show: &ShowMetadata) -> Option<EpisodeRef> {
    show.regular_seasons()
        .into_iter()
        .flat_map(|season| {
            (1..=season.episode_count).map(move |n| EpisodeRef::new(season.season_number, n))
        })
        .find(|ep| !store.is_watched(show.id, *ep))
}

/// Whether every aired episode of a season has been watched.
pub fn is_season_fully_watched(
    store: &ProgressStore,
    show: ShowId,
    season: &SeasonMetadata,
    today: NaiveDate,
) -> bool {
    compute_season_progress(store, show, season, today).is_fully_watched()
}

/// Whether every aired regular episode of a show has been watched.
pub fn is_show_fully_watched(store: &ProgressStore, show: &ShowMetadata, today: NaiveDate) -> bool {
    compute_overall_show_progress(store, show, today).is_fully_watched()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WatchStatus;
    use crate::types::{EpisodeMetadata, LifecycleStatus};

    const SHOW: ShowId = 7;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Season whose episode `n` airs on day `n` of January 2024.
    fn season(number: u32, count: u32) -> SeasonMetadata {
        SeasonMetadata {
            season_number: number,
            episode_count: count,
            air_date: Some(date(2024, 1, 1)),
            name: String::new(),
            episodes: Some(
                (1..=count)
                    .map(|n| EpisodeMetadata {
                        id: u64::from(number * 1000 + n),
                        season_number: number,
                        episode_number: n,
                        air_date: Some(date(2024, 1, n)),
                        episode_type: None,
                        name: format!("Episode {}", n),
                    })
                    .collect(),
            ),
        }
    }

    fn show(seasons: Vec<SeasonMetadata>) -> ShowMetadata {
        ShowMetadata {
            id: SHOW,
            name: "Show".to_string(),
            number_of_seasons: seasons.iter().filter(|s| !s.is_specials()).count() as u32,
            status: LifecycleStatus::Returning,
            seasons,
        }
    }

    fn watch(store: &mut ProgressStore, season: u32, episodes: std::ops::RangeInclusive<u32>) {
        store.mark_episodes(
            SHOW,
            episodes.map(|n| EpisodeRef::new(season, n)),
            WatchStatus::Watched,
        );
    }

    #[test]
    fn test_season_progress_counts_aired_only() {
        let mut store = ProgressStore::new();
        watch(&mut store, 1, 1..=3);
        let progress = compute_season_progress(&store, SHOW, &season(1, 10), date(2024, 1, 5));

        assert_eq!(progress.total_aired, 5);
        assert_eq!(progress.watched_count, 3);
        assert_eq!(progress.unwatched_count, 2);
        assert_eq!(progress.percent, 60);
        assert!(progress.precise);
    }

    #[test]
    fn test_watched_unaired_episode_not_counted() {
        let mut store = ProgressStore::new();
        watch(&mut store, 1, 1..=6);
        let progress = compute_season_progress(&store, SHOW, &season(1, 10), date(2024, 1, 5));
        assert_eq!(progress.watched_count, 5);
        assert_eq!(progress.percent, 100);
    }

    #[test]
    fn test_unknown_air_date_excluded() {
        let mut s = season(1, 3);
        if let Some(episodes) = s.episodes.as_mut() {
            episodes[2].air_date = None;
        }
        let progress = compute_season_progress(&ProgressStore::new(), SHOW, &s, date(2030, 1, 1));
        assert_eq!(progress.total_aired, 2);
    }

    #[test]
    fn test_zero_aired_is_zero_percent_and_not_complete() {
        let progress = compute_season_progress(&ProgressStore::new(), SHOW, &season(1, 4), date(2023, 12, 1));
        assert_eq!(progress.total_aired, 0);
        assert_eq!(progress.percent, 0);
        assert!(!progress.is_fully_watched());
    }

    #[test]
    fn test_fallback_uses_episode_count() {
        let mut s = season(2, 6);
        s.episodes = None;
        let mut store = ProgressStore::new();
        watch(&mut store, 2, 1..=3);

        let progress = compute_season_progress(&store, SHOW, &s, date(2024, 6, 1));
        assert_eq!(progress.total_aired, 6);
        assert_eq!(progress.watched_count, 3);
        assert_eq!(progress.percent, 50);
        assert!(!progress.precise);
    }

    #[test]
    fn test_fallback_future_season_has_nothing_aired() {
        let mut s = season(2, 6);
        s.episodes = None;
        s.air_date = Some(date(2025, 1, 1));
        let progress = compute_season_progress(&ProgressStore::new(), SHOW, &s, date(2024, 6, 1));
        assert_eq!(progress.total_aired, 0);
    }

    #[test]
    fn test_show_progress_excludes_specials() {
        let show = show(vec![season(0, 2), season(1, 4), season(2, 4)]);
        let mut store = ProgressStore::new();
        watch(&mut store, 1, 1..=4);
        let before = compute_overall_show_progress(&store, &show, date(2024, 2, 1));

        watch(&mut store, 0, 1..=2);
        let after = compute_overall_show_progress(&store, &show, date(2024, 2, 1));

        assert_eq!(before.watched_count, after.watched_count);
        assert_eq!(before.total_aired_count, after.total_aired_count);
        assert_eq!(after.total_aired_count, 8);
        assert_eq!(after.percent(), 50);
        assert_eq!(after.specials_watched, 2);
        assert_eq!(after.specials_total, 2);
    }

    #[test]
    fn test_show_progress_display_with_specials() {
        let progress = ShowProgress {
            watched_count: 3,
            total_aired_count: 4,
            specials_watched: 1,
            specials_total: 2,
        };
        assert_eq!(progress.to_display(), "3/4 episodes (75%), specials 1/2 (50%)");
    }

    #[test]
    fn test_show_progress_with_excess_watched_does_not_underflow() {
        let progress = ShowProgress {
            watched_count: 5,
            total_aired_count: 3,
            specials_watched: 0,
            specials_total: 0,
        };
        assert_eq!(progress.unwatched_count(), 0);
        assert!(progress.is_fully_watched());
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn test_show_without_seasons_is_zeroed() {
        let progress = compute_overall_show_progress(&ProgressStore::new(), &show(vec![]), date(2024, 1, 1));
        assert_eq!(progress, ShowProgress::default());
        assert_eq!(progress.percent(), 0);
        assert!(!progress.is_fully_watched());
    }

    #[test]
    fn test_next_unwatched_skips_specials_and_orders_seasons() {
        let show = show(vec![season(2, 3), season(0, 2), season(1, 3)]);
        let mut store = ProgressStore::new();
        watch(&mut store, 1, 1..=3);
        watch(&mut store, 2, 2..=3);
        assert_eq!(find_next_unwatched_episode(&store, &show), Some(EpisodeRef::new(2, 1)));
    }

    #[test]
    fn test_next_unwatched_returns_first_gap() {
        let show = show(vec![season(1, 5)]);
        let mut store = ProgressStore::new();
        watch(&mut store, 1, 1..=2);
        watch(&mut store, 1, 4..=5);
        assert_eq!(find_next_unwatched_episode(&store, &show), Some(EpisodeRef::new(1, 3)));
    }

    #[test]
    fn test_next_unwatched_may_be_unaired() {
        let mut future = season(1, 2);
        if let Some(episodes) = future.episodes.as_mut() {
            episodes[1].air_date = Some(date(2099, 1, 1));
        }
        let show = show(vec![future]);
        let mut store = ProgressStore::new();
        watch(&mut store, 1, 1..=1);
        assert_eq!(find_next_unwatched_episode(&store, &show), Some(EpisodeRef::new(1, 2)));
    }

    #[test]
    fn test_next_unwatched_none_when_caught_up() {
        let show = show(vec![season(0, 1), season(1, 2)]);
        let mut store = ProgressStore::new();
        watch(&mut store, 1, 1..=2);
        assert_eq!(find_next_unwatched_episode(&store, &show), None);
    }

    #[test]
    fn test_in_progress_is_not_watched() {
        let show = show(vec![season(1, 2)]);
        let mut store = ProgressStore::new();
        store.set_episode_status(SHOW, EpisodeRef::new(1, 1), WatchStatus::InProgress);
        assert_eq!(find_next_unwatched_episode(&store, &show), Some(EpisodeRef::new(1, 1)));
    }

    #[test]
    fn test_fully_watched_flags() {
        let show = show(vec![season(1, 3), season(2, 3)]);
        let today = date(2024, 2, 1);
        let mut store = ProgressStore::new();
        watch(&mut store, 1, 1..=3);

        assert!(is_season_fully_watched(&store, SHOW, show.season(1).unwrap(), today));
        assert!(!is_season_fully_watched(&store, SHOW, show.season(2).unwrap(), today));
        assert!(!is_show_fully_watched(&store, &show, today));

        watch(&mut store, 2, 1..=3);
        assert!(is_show_fully_watched(&store, &show, today));
    }

    #[test]
    fn test_all_season_progress_sorted() {
        let show = show(vec![season(2, 1), season(0, 1), season(1, 1)]);
        let numbers: Vec<u32> = compute_all_season_progress(&ProgressStore::new(), &show, date(2024, 2, 1))
            .iter()
            .map(|p| p.season_number)
            .collect();
        assert_eq!(numbers, vec![0, 1, 2]);
    }
}
