use std::collections::HashMap;

use sabi::error::EngineError;
use sabi::hash::HashToken;
use sabi::store::{Song, Store};

/// An in-memory [`Store`], used by the scenario tests in place of a live
/// PostgreSQL instance (spec.md §6 "the engine consumes this; a
/// replaceable storage backend").
#[derive(Default)]
pub struct MemoryStore {
    songs: HashMap<u32, Song>,
    // hash -> Vec<(song_id, song_time)>
    hashes: HashMap<HashToken, Vec<(u32, usize)>>,
    next_id: u32,
}

impl Store for MemoryStore {
    fn get_songs(&mut self) -> Result<Vec<Song>, EngineError> {
        Ok(self.songs.values().cloned().collect())
    }

    fn get_song_by_id(&mut self, song_id: u32) -> Result<Option<Song>, EngineError> {
        Ok(self.songs.get(&song_id).cloned())
    }

    fn insert_song(
        &mut self,
        name: &str,
        file_sha1: &str,
        duration: Option<f64>,
        creative_id: Option<&str>,
    ) -> Result<u32, EngineError> {
        self.next_id += 1;
        let song_id = self.next_id;
        self.songs.insert(
            song_id,
            Song {
                song_id,
                song_name: name.to_string(),
                song_duration: duration,
                creative_id: creative_id.map(str::to_string),
                file_sha1: file_sha1.to_string(),
                fingerprinted: false,
            },
        );
        Ok(song_id)
    }

    fn insert_hashes(
        &mut self,
        song_id: u32,
        hashes: &[(HashToken, usize)],
    ) -> Result<(), EngineError> {
        for &(hash, song_time) in hashes {
            self.hashes.entry(hash).or_default().push((song_id, song_time));
        }
        Ok(())
    }

    fn set_song_fingerprinted(&mut self, song_id: u32) -> Result<(), EngineError> {
        if let Some(song) = self.songs.get_mut(&song_id) {
            song.fingerprinted = true;
        }
        Ok(())
    }

    fn return_matches(
        &mut self,
        tokens: &[(HashToken, usize)],
    ) -> Result<Vec<(u32, i64)>, EngineError> {
        let mut votes = Vec::new();
        for &(hash, anchor_time) in tokens {
            if let Some(rows) = self.hashes.get(&hash) {
                for &(song_id, song_time) in rows {
                    votes.push((song_id, song_time as i64 - anchor_time as i64));
                }
            }
        }
        Ok(votes)
    }
}
