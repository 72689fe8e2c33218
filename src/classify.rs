//! Premiere and finale labelling for individual episodes.
//!
//! The provider's explicit `episode_type` flag always wins. Without it,
//! premieres are detected from the episode number and finales from the
//! episode's position in its season, but only where the answer cannot change
//! later: the last episode of the latest season of a show that is still
//! airing is left untagged.

use serde::{Deserialize, Serialize};

use crate::types::{EpisodeMetadata, EpisodeType, SeasonMetadata, ShowMetadata};

/// Display label attached to notable episodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    SeriesPremiere,
    SeasonPremiere,
    SeriesFinale,
    SeasonFinale,
    MidSeasonFinale,
}

impl Tag {
    /// Human readable label.
    ///
    /// # Examples
    ///
    /// ```
    /// use watch_progress::classify::Tag;
    ///
    /// assert_eq!(Tag::MidSeasonFinale.label(), "Mid-Season Finale");
    /// ```
    pub fn label(&self) -> &'static str {
        match self {
            Tag::SeriesPremiere => "Series Premiere",
            Tag::SeasonPremiere => "Season Premiere",
            Tag::SeriesFinale => "Series Finale",
            Tag::SeasonFinale => "Season Finale",
            Tag::MidSeasonFinale => "Mid-Season Finale",
        }
    }
}

/// Label an episode as a premiere or finale.
///
/// Rules are checked in order and the first match wins:
///
/// 1. specials (or an unknown season) are never tagged
/// 2. an explicit provider `episode_type` maps straight to its tag
/// 3. episode 1 is a series premiere in season 1, a season premiere elsewhere
/// 4. the positionally last episode of a season is a series finale when the
///    season is the latest and the show has concluded, a season finale when a
///    later season exists, and untagged otherwise
pub fn classify(
    episode: &EpisodeMetadata,
    season: Option<&SeasonMetadata>,
    show: &ShowMetadata,
    episodes_in_season: Option<&[EpisodeMetadata]>,
) -> Option<Tag> {
    let season = season?;
    if season.is_specials() {
        return None;
    }

    match episode.episode_type {
        Some(EpisodeType::SeriesFinale) => return Some(Tag::SeriesFinale),
        Some(EpisodeType::SeasonFinale) => return Some(Tag::SeasonFinale),
        Some(EpisodeType::MidseasonFinale) => return Some(Tag::MidSeasonFinale),
        Some(EpisodeType::Standard) | None => {}
    }

    if episode.episode_number == 1 {
        return if season.season_number == 1 {
            Some(Tag::SeriesPremiere)
        } else {
            Some(Tag::SeasonPremiere)
        };
    }

    let episodes = episodes_in_season?;
    if episode.episode_number as usize != episodes.len() {
        return None;
    }

    let is_latest_season = season.season_number >= show.latest_season_number();
    if is_latest_season {
        if show.status.is_concluded() {
            Some(Tag::SeriesFinale)
        } else {
            None
        }
    } else {
        Some(Tag::SeasonFinale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LifecycleStatus;

    fn episode(season: u32, number: u32, episode_type: Option<EpisodeType>) -> EpisodeMetadata {
        EpisodeMetadata {
            id: (season * 100 + number) as u64,
            season_number: season,
            episode_number: number,
            air_date: None,
            episode_type,
            name: format!("Episode {}", number),
        }
    }

    fn season(number: u32, count: u32) -> SeasonMetadata {
        SeasonMetadata {
            season_number: number,
            episode_count: count,
            air_date: None,
            name: String::new(),
            episodes: Some((1..=count).map(|n| episode(number, n, None)).collect()),
        }
    }

    fn show(status: LifecycleStatus, seasons: Vec<SeasonMetadata>) -> ShowMetadata {
        ShowMetadata {
            id: 1,
            name: "Show".to_string(),
            number_of_seasons: seasons.iter().filter(|s| !s.is_specials()).count() as u32,
            status,
            seasons,
        }
    }

    fn tag_of(show: &ShowMetadata, season_number: u32, ep: &EpisodeMetadata) -> Option<Tag> {
        let season = show.season(season_number);
        classify(ep, season, show, season.and_then(|s| s.episode_list()))
    }

    #[test]
    fn test_specials_never_tagged() {
        let show = show(LifecycleStatus::Ended, vec![season(0, 2), season(1, 3)]);
        let ep = episode(0, 1, Some(EpisodeType::SeriesFinale));
        assert_eq!(tag_of(&show, 0, &ep), None);
    }

    #[test]
    fn test_unknown_season_never_tagged() {
        let show = show(LifecycleStatus::Ended, vec![season(1, 3)]);
        let ep = episode(4, 1, None);
        assert_eq!(classify(&ep, None, &show, None), None);
    }

    #[test]
    fn test_explicit_flag_beats_premiere_position() {
        let show = show(
            LifecycleStatus::Returning,
            vec![season(1, 5), season(2, 5), season(3, 5)],
        );
        let ep = episode(3, 1, Some(EpisodeType::SeasonFinale));
        assert_eq!(tag_of(&show, 3, &ep), Some(Tag::SeasonFinale));
    }

    #[test]
    fn test_series_finale_flag_mid_season() {
        let show = show(LifecycleStatus::Returning, vec![season(1, 10), season(2, 10)]);
        let ep = episode(1, 6, Some(EpisodeType::SeriesFinale));
        assert_eq!(tag_of(&show, 1, &ep), Some(Tag::SeriesFinale));
    }

    #[test]
    fn test_stale_season_count_does_not_hide_later_season() {
        let mut show = show(
            LifecycleStatus::Ended,
            vec![season(1, 2), season(2, 2), season(3, 2)],
        );
        show.number_of_seasons = 2;
        assert_eq!(tag_of(&show, 2, &episode(2, 2, None)), Some(Tag::SeasonFinale));
        assert_eq!(tag_of(&show, 3, &episode(3, 2, None)), Some(Tag::SeriesFinale));
    }

    #[test]
    fn test_midseason_finale_flag() {
        let show = show(LifecycleStatus::Returning, vec![season(1, 10)]);
        let ep = episode(1, 5, Some(EpisodeType::MidseasonFinale));
        assert_eq!(tag_of(&show, 1, &ep), Some(Tag::MidSeasonFinale));
    }

    #[test]
    fn test_standard_flag_falls_through_to_heuristics() {
        let show = show(LifecycleStatus::Returning, vec![season(1, 4), season(2, 4)]);
        let ep = episode(2, 1, Some(EpisodeType::Standard));
        assert_eq!(tag_of(&show, 2, &ep), Some(Tag::SeasonPremiere));
    }

    #[test]
    fn test_premieres() {
        let show = show(LifecycleStatus::Returning, vec![season(1, 4), season(2, 4)]);
        assert_eq!(tag_of(&show, 1, &episode(1, 1, None)), Some(Tag::SeriesPremiere));
        assert_eq!(tag_of(&show, 2, &episode(2, 1, None)), Some(Tag::SeasonPremiere));
    }

    #[test]
    fn test_past_season_last_episode_is_season_finale() {
        let show = show(LifecycleStatus::Returning, vec![season(1, 4), season(2, 4)]);
        assert_eq!(tag_of(&show, 1, &episode(1, 4, None)), Some(Tag::SeasonFinale));
    }

    #[test]
    fn test_latest_season_of_ended_show_is_series_finale() {
        let show = show(LifecycleStatus::Canceled, vec![season(1, 4), season(2, 6)]);
        assert_eq!(tag_of(&show, 2, &episode(2, 6, None)), Some(Tag::SeriesFinale));
    }

    #[test]
    fn test_latest_season_of_airing_show_is_not_guessed() {
        let show = show(LifecycleStatus::Returning, vec![season(1, 4), season(2, 6)]);
        assert_eq!(tag_of(&show, 2, &episode(2, 6, None)), None);
    }

    #[test]
    fn test_middle_episode_untagged() {
        let show = show(LifecycleStatus::Ended, vec![season(1, 4)]);
        assert_eq!(tag_of(&show, 1, &episode(1, 2, None)), None);
    }

    #[test]
    fn test_finale_heuristic_needs_episode_list() {
        let show = show(LifecycleStatus::Ended, vec![season(1, 4), season(2, 4)]);
        let ep = episode(1, 4, None);
        assert_eq!(classify(&ep, show.season(1), &show, None), None);
    }

    #[test]
    fn test_single_episode_season_is_premiere_not_finale() {
        let show = show(LifecycleStatus::Ended, vec![season(1, 1)]);
        assert_eq!(tag_of(&show, 1, &episode(1, 1, None)), Some(Tag::SeriesPremiere));
    }
}
