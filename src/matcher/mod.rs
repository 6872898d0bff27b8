use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::hash::{Fingerprint, HashToken};
use crate::store::{Song, Store};

/// A candidate alignment, before metadata has been attached.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Vote {
    song_id: u32,
    offset_delta: i64,
    count: usize,
}

/// One song's alignment in a [`MatchResult`] — the winner or a fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub song_id: u32,
    pub song_name: String,
    pub song_duration: Option<f64>,
    pub creative_id: Option<String>,
    pub file_sha1: String,
    pub confidence: usize,
    pub offset: i64,
    pub offset_seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub winner: Alignment,
    pub fallback_matches: Vec<Alignment>,
}

fn offset_seconds(offset: i64, cfg: &EngineConfig) -> f64 {
    let seconds = offset as f64 * cfg.hop() as f64 / cfg.sample_rate as f64;
    (seconds * 1e5).round() / 1e5
}

/// Looks up each query token in the index and returns the raw votes.
/// Spec.md §4.4 `find_matches`.
pub fn find_matches(
    store: &mut dyn Store,
    query_fingerprints: &[Fingerprint],
) -> Result<Vec<(u32, i64)>, EngineError> {
    if query_fingerprints.is_empty() {
        return Ok(Vec::new());
    }

    let tokens: Vec<(HashToken, usize)> = query_fingerprints
        .iter()
        .map(|fp| (fp.hash, fp.anchor_time))
        .collect();

    store.return_matches(&tokens)
}

/// Histogram-consensus alignment, spec.md §4.4. Builds
/// `C[(song_id, offset_delta)]`, finds the single maximum cell, and
/// separately tracks each song's own best `(count, offset)` —
/// independent of the global maximum (spec.md §9 redesign note: the
/// teacher's original Python only updated a song's recorded best when
/// that count happened to set a *new global* maximum, which this engine
/// does not reproduce).
pub fn align_matches(
    store: &mut dyn Store,
    votes: &[(u32, i64)],
    cfg: &EngineConfig,
) -> Result<Option<MatchResult>, EngineError> {
    if votes.is_empty() {
        return Ok(None);
    }

    let mut histogram: HashMap<(u32, i64), usize> = HashMap::new();
    let mut per_song_best: HashMap<u32, (usize, i64)> = HashMap::new();

    let mut winner: Option<Vote> = None;

    for &(song_id, offset_delta) in votes {
        let count = {
            let c = histogram.entry((song_id, offset_delta)).or_insert(0);
            *c += 1;
            *c
        };

        let best = per_song_best.entry(song_id).or_insert((0, offset_delta));
        if count > best.0 {
            *best = (count, offset_delta);
        }

        let is_new_global_max = match &winner {
            None => true,
            Some(w) => count > w.count,
        };
        if is_new_global_max {
            winner = Some(Vote {
                song_id,
                offset_delta,
                count,
            });
        }
    }

    let Some(winner) = winner else {
        return Ok(None);
    };

    let Some(song) = store.get_song_by_id(winner.song_id)? else {
        return Ok(None);
    };

    let winning_alignment = to_alignment(&song, winner.count, winner.offset_delta, cfg);

    let mut fallbacks = Vec::new();
    for (&song_id, &(count, offset_delta)) in per_song_best.iter() {
        if song_id == winner.song_id {
            continue;
        }
        if (count as f64) < 0.1 * winner.count as f64 {
            continue;
        }
        if let Some(fallback_song) = store.get_song_by_id(song_id)? {
            fallbacks.push(to_alignment(&fallback_song, count, offset_delta, cfg));
        }
    }
    fallbacks.sort_by(|a, b| b.confidence.cmp(&a.confidence));

    Ok(Some(MatchResult {
        winner: winning_alignment,
        fallback_matches: fallbacks,
    }))
}

fn to_alignment(song: &Song, count: usize, offset_delta: i64, cfg: &EngineConfig) -> Alignment {
    Alignment {
        song_id: song.song_id,
        song_name: song.song_name.clone(),
        song_duration: song.song_duration,
        creative_id: song.creative_id.clone(),
        file_sha1: song.file_sha1.clone(),
        confidence: count,
        offset: offset_delta,
        offset_seconds: offset_seconds(offset_delta, cfg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::collections::HashMap as Map;

    struct FakeStore {
        songs: Map<u32, Song>,
    }

    impl Store for FakeStore {
        fn get_songs(&mut self) -> Result<Vec<Song>, EngineError> {
            Ok(self.songs.values().cloned().collect())
        }
        fn get_song_by_id(&mut self, song_id: u32) -> Result<Option<Song>, EngineError> {
            Ok(self.songs.get(&song_id).cloned())
        }
        fn insert_song(
            &mut self,
            _: &str,
            _: &str,
            _: Option<f64>,
            _: Option<&str>,
        ) -> Result<u32, EngineError> {
            unimplemented!()
        }
        fn insert_hashes(&mut self, _: u32, _: &[(HashToken, usize)]) -> Result<(), EngineError> {
            unimplemented!()
        }
        fn set_song_fingerprinted(&mut self, _: u32) -> Result<(), EngineError> {
            unimplemented!()
        }
        fn return_matches(
            &mut self,
            _: &[(HashToken, usize)],
        ) -> Result<Vec<(u32, i64)>, EngineError> {
            unimplemented!()
        }
    }

    fn song(id: u32, name: &str) -> Song {
        Song {
            song_id: id,
            song_name: name.to_string(),
            song_duration: Some(30.0),
            creative_id: None,
            file_sha1: format!("sha-{id}"),
            fingerprinted: true,
        }
    }

    #[test]
    fn empty_votes_means_no_match() {
        let mut store = FakeStore { songs: Map::new() };
        assert_eq!(align_matches(&mut store, &[], &EngineConfig::default()).unwrap(), None);
    }

    #[test]
    fn winner_is_the_densest_offset_cell() {
        let mut songs = Map::new();
        songs.insert(1, song(1, "A"));
        songs.insert(2, song(2, "B"));
        let mut store = FakeStore { songs };

        let votes = vec![(1, 100), (1, 100), (1, 100), (2, 5)];
        let result = align_matches(&mut store, &votes, &EngineConfig::default())
            .unwrap()
            .unwrap();

        assert_eq!(result.winner.song_id, 1);
        assert_eq!(result.winner.confidence, 3);
        // song 2's one vote is well under 10% of 3 -> no fallback.
        assert!(result.fallback_matches.is_empty());
    }

    #[test]
    fn fallback_requires_at_least_ten_percent_of_winner() {
        let mut songs = Map::new();
        songs.insert(1, song(1, "A"));
        songs.insert(2, song(2, "B"));
        let mut store = FakeStore { songs };

        // winner: 10 votes at offset 0; song 2: 1 vote == 10% exactly.
        let mut votes = vec![(2, 7)];
        votes.extend(std::iter::repeat((1, 0)).take(10));
        let result = align_matches(&mut store, &votes, &EngineConfig::default())
            .unwrap()
            .unwrap();

        assert_eq!(result.winner.song_id, 1);
        assert_eq!(result.fallback_matches.len(), 1);
        assert_eq!(result.fallback_matches[0].song_id, 2);
    }

    #[test]
    fn missing_winner_song_is_no_match() {
        let mut store = FakeStore { songs: Map::new() };
        let votes = vec![(99, 0)];
        assert_eq!(
            align_matches(&mut store, &votes, &EngineConfig::default()).unwrap(),
            None
        );
    }

    #[test]
    fn per_song_best_is_independent_of_when_global_max_moved() {
        // Song 2 quietly accumulates votes at offset 9 without ever being
        // the global max; its recorded best must still be 4, not 0 or a
        // stale earlier value, per the fixed redesign semantics.
        let mut songs = Map::new();
        songs.insert(1, song(1, "A"));
        songs.insert(2, song(2, "B"));
        let mut store = FakeStore { songs };

        let votes = vec![
            (1, 0),
            (1, 0),
            (1, 0),
            (1, 0),
            (1, 0), // song 1 reaches 5 first and stays the global max
            (2, 9),
            (2, 9),
            (2, 9),
            (2, 9), // song 2 reaches 4, never overtakes song 1
        ];
        let result = align_matches(&mut store, &votes, &EngineConfig::default())
            .unwrap()
            .unwrap();

        assert_eq!(result.winner.song_id, 1);
        assert_eq!(result.winner.confidence, 5);
        let fallback = result
            .fallback_matches
            .iter()
            .find(|a| a.song_id == 2)
            .unwrap();
        assert_eq!(fallback.confidence, 4);
        assert_eq!(fallback.offset, 9);
    }
}
