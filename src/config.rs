use std::env;

/// Engine-wide DSP and matching parameters.
///
/// All stored hashes are only comparable across ingest/query calls made
/// under the *same* `EngineConfig`; changing any field invalidates the
/// existing index (spec.md §3 invariants, §9 "global constants" pattern).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Target sample rate; queries and ingested files are resampled to this.
    pub sample_rate: u32,
    /// Window size in samples, must be a power of two.
    pub window_size: usize,
    /// Fraction of a frame shared with the next frame.
    pub overlap_ratio: f32,
    /// Absolute floor applied before the log-magnitude transform.
    pub amplitude_floor: f32,
    /// Square neighborhood radius (in cells) used by the peak picker.
    pub peak_neighborhood: usize,
    /// Peak amplitude threshold in log-magnitude units.
    pub peak_amplitude_min: f32,
    /// Max companions paired with each anchor peak.
    pub fanout: usize,
    /// Minimum time gap, in frames, between anchor and companion.
    pub min_target_zone_dist: usize,
    /// Maximum time gap, in frames, between anchor and companion.
    pub max_target_zone_dist: usize,
    /// Optional cap (seconds) on how much of a signal gets fingerprinted.
    pub fingerprint_limit_secs: Option<f32>,
}

impl EngineConfig {
    pub const fn hop(&self) -> usize {
        (self.window_size as f32 * (1.0 - self.overlap_ratio)) as usize
    }

    /// Loads overrides from the environment (via `.env`), falling back to
    /// [`Default`] for anything unset. Mirrors the teacher's `dotenvy` use
    /// in `db/connector.rs`, generalized to the whole DSP parameter set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut cfg = Self::default();

        if let Ok(v) = env::var("SABI_SAMPLE_RATE") {
            if let Ok(v) = v.parse() {
                cfg.sample_rate = v;
            }
        }
        if let Ok(v) = env::var("SABI_WINDOW_SIZE") {
            if let Ok(v) = v.parse() {
                cfg.window_size = v;
            }
        }
        if let Ok(v) = env::var("SABI_FINGERPRINT_LIMIT_SECS") {
            if let Ok(v) = v.parse() {
                cfg.fingerprint_limit_secs = Some(v);
            }
        }

        cfg
    }
}

impl Default for EngineConfig {
    /// Defaults from spec.md §6.
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            window_size: 4096,
            overlap_ratio: 0.5,
            amplitude_floor: 1e-6,
            peak_neighborhood: 20,
            peak_amplitude_min: 10.0,
            fanout: 15,
            min_target_zone_dist: 0,
            max_target_zone_dist: 200,
            fingerprint_limit_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hop_matches_spec_default() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.hop(), 2048);
    }
}
