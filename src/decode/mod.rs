mod symphonia_decoder;

pub use symphonia_decoder::SymphoniaDecoder;

use std::path::Path;

use crate::error::EngineError;

/// External collaborator (spec.md §1, §6) that turns an audio container
/// into per-channel PCM, a sample rate, and a content hash.
pub trait Decoder {
    /// Decodes `path`, returning one PCM channel per source channel (no
    /// implicit mono mixdown — spec.md §5/§8 channel-union is the
    /// engine's job, not the decoder's), resampled to `target_sample_rate`
    /// (spec.md §6: "query resampled to this"; ingest is resampled the same
    /// way so stored hashes stay comparable across files recorded at
    /// different native rates, per spec.md §3's `Fs` invariant), and a
    /// content hash of the file bytes.
    fn read(
        &self,
        path: &Path,
        limit_seconds: Option<f32>,
        target_sample_rate: u32,
    ) -> Result<(Vec<Vec<f32>>, u32, String), EngineError>;

    /// A content hash of `path`'s bytes, independent of decoding (used to
    /// skip re-ingestion without touching the codec).
    fn unique_hash(&self, path: &Path) -> Result<String, EngineError>;
}

/// Linear-interpolation resampler, grounded on the teacher's
/// `audio_processor.rs::resample_linear`. A no-op when the rates already
/// match (the common case once ingest and query agree on `Fs`).
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let new_len = (samples.len() as f64 / ratio) as usize;
    let mut resampled = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let in_idx_float = i as f64 * ratio;
        let in_idx_int = in_idx_float.floor() as usize;
        let frac = in_idx_float.fract() as f32;

        if in_idx_int + 1 < samples.len() {
            let p1 = samples[in_idx_int];
            let p2 = samples[in_idx_int + 1];
            resampled.push(p1 + frac * (p2 - p1));
        } else if in_idx_int < samples.len() {
            resampled.push(samples[in_idx_int]);
        } else {
            break;
        }
    }

    resampled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_rates_are_a_no_op() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_linear(&samples, 44_100, 44_100), samples);
    }

    #[test]
    fn downsampling_halves_the_length() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let resampled = resample_linear(&samples, 44_100, 22_050);
        assert_eq!(resampled.len(), 50);
    }

    #[test]
    fn upsampling_roughly_doubles_the_length() {
        let samples: Vec<f32> = (0..50).map(|i| i as f32).collect();
        let resampled = resample_linear(&samples, 22_050, 44_100);
        assert_eq!(resampled.len(), 100);
    }
}
