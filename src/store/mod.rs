mod bindings;
mod postgres;
mod schema;

pub use postgres::PgStore;

use crate::error::EngineError;
use crate::hash::HashToken;

/// A song record, spec.md §3.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub song_id: u32,
    pub song_name: String,
    pub song_duration: Option<f64>,
    pub creative_id: Option<String>,
    pub file_sha1: String,
    pub fingerprinted: bool,
}

/// The storage backend's interface, spec.md §6. The engine is agnostic to
/// what backs it (spec.md §9 "dynamic dispatch to pluggable store"
/// pattern); `PgStore` is the shipped implementation.
pub trait Store {
    fn get_songs(&mut self) -> Result<Vec<Song>, EngineError>;

    fn get_song_by_id(&mut self, song_id: u32) -> Result<Option<Song>, EngineError>;

    fn insert_song(
        &mut self,
        name: &str,
        file_sha1: &str,
        duration: Option<f64>,
        creative_id: Option<&str>,
    ) -> Result<u32, EngineError>;

    fn insert_hashes(
        &mut self,
        song_id: u32,
        hashes: &[(HashToken, usize)],
    ) -> Result<(), EngineError>;

    fn set_song_fingerprinted(&mut self, song_id: u32) -> Result<(), EngineError>;

    /// Joins each `(hash_token, anchor_time)` against the index and
    /// returns `(song_id, offset_delta)` pairs, where
    /// `offset_delta = song_time - anchor_time` (spec.md §4.4 step 1).
    fn return_matches(
        &mut self,
        tokens: &[(HashToken, usize)],
    ) -> Result<Vec<(u32, i64)>, EngineError>;
}
