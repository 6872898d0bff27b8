//! Acoustic fingerprinting and matching engine: spectrogram → peak
//! picking → hashing → histogram-consensus alignment, in the spirit of
//! Shazam-style constellation fingerprinting.

pub mod config;
pub mod decode;
pub mod dsp;
pub mod error;
pub mod hash;
pub mod ingest;
pub mod matcher;
pub mod store;
pub mod visualization;

pub use config::EngineConfig;
pub use error::EngineError;

use std::collections::HashSet;
use std::path::Path;

use decode::Decoder;
use matcher::MatchResult;
use store::Store;

/// Facade wiring a [`Decoder`] and a [`Store`] to the core pipeline
/// (spec.md §2), tracking the driver's cache of already-ingested content
/// hashes (spec.md §5).
pub struct Engine<D, S> {
    pub decoder: D,
    pub store: S,
    pub config: EngineConfig,
    known_hashes: HashSet<String>,
}

impl<D: Decoder, S: Store> Engine<D, S> {
    pub fn new(decoder: D, mut store: S, config: EngineConfig) -> Result<Self, EngineError> {
        let known_hashes = store
            .get_songs()?
            .into_iter()
            .filter(|s| s.fingerprinted)
            .map(|s| s.file_sha1)
            .collect();

        Ok(Self {
            decoder,
            store,
            config,
            known_hashes,
        })
    }

    pub fn ingest_directory(&mut self, dir: &Path, extensions: &[&str]) -> Result<(usize, usize), EngineError> {
        ingest::fingerprint_directory(
            dir,
            extensions,
            &self.decoder,
            &mut self.store,
            &self.config,
            &mut self.known_hashes,
        )
    }

    pub fn ingest_file(&mut self, path: &Path, creative_id: Option<&str>) -> Result<u32, EngineError> {
        ingest::fingerprint_file(
            path,
            &self.decoder,
            &mut self.store,
            &self.config,
            &mut self.known_hashes,
            creative_id,
        )
    }

    /// Runs a full query: decode, fingerprint, look up votes, align.
    /// Empty input or zero votes yields `Ok(None)` (spec.md §7 kind 4); a
    /// genuine store failure during lookup propagates as `Err` instead of
    /// being folded into "no match".
    pub fn query_file(&mut self, path: &Path) -> Result<Option<MatchResult>, EngineError> {
        let cfg = self.config;
        let (channels, _, _) = self
            .decoder
            .read(path, cfg.fingerprint_limit_secs, cfg.sample_rate)?;
        self.query_samples(&channels, &cfg)
    }

    pub fn query_samples(
        &mut self,
        channels: &[Vec<f32>],
        cfg: &EngineConfig,
    ) -> Result<Option<MatchResult>, EngineError> {
        let hashes = ingest::fingerprint_channels(channels, cfg);
        let fingerprints: Vec<hash::Fingerprint> = hashes
            .into_iter()
            .map(|(hash, anchor_time)| hash::Fingerprint { hash, anchor_time })
            .collect();

        let votes = matcher::find_matches(&mut self.store, &fingerprints)?;
        matcher::align_matches(&mut self.store, &votes, cfg)
    }
}
