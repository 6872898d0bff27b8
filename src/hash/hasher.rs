use std::hash::Hasher;

use twox_hash::XxHash64;

use crate::config::EngineConfig;
use crate::dsp::Peak;

pub type HashToken = u64;

/// A `(hash_token, anchor_time)` pair, per spec.md §4.3. `anchor_time` is
/// the anchor peak's frame index `t_i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub hash: HashToken,
    pub anchor_time: usize,
}

/// Canonically encodes `(f1, f2, Δt)` and hashes it with a fixed seed so
/// the token is stable across ingest and query (spec.md §4.3/§8
/// determinism property).
fn hash_pair(f1: usize, f2: usize, dt: usize) -> HashToken {
    let mut bytes = [0u8; 12];
    bytes[0..4].copy_from_slice(&(f1 as u32).to_be_bytes());
    bytes[4..8].copy_from_slice(&(f2 as u32).to_be_bytes());
    bytes[8..12].copy_from_slice(&(dt as u32).to_be_bytes());

    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&bytes);
    hasher.finish()
}

/// Pairs each anchor peak with up to `cfg.fanout` companions found later
/// in time order, within `[cfg.min_target_zone_dist, cfg.max_target_zone_dist]`
/// frames, emitting one token per pair. Spec.md §4.3.
///
/// `peaks` must be sorted by time then frequency; `peaks_by_time` (peaks
/// grouped by ascending `t`) lets the companion search stop early once
/// the time window is exceeded, matching the "next peaks in time order"
/// contract without rescanning the whole peak set per anchor.
pub fn generate_hashes(peaks: &[Peak], cfg: &EngineConfig) -> Vec<Fingerprint> {
    let mut sorted = peaks.to_vec();
    sorted.sort();

    let mut fingerprints = Vec::new();

    for (i, anchor) in sorted.iter().enumerate() {
        let mut companions_used = 0usize;

        for companion in sorted[i + 1..].iter() {
            if companions_used >= cfg.fanout {
                break;
            }

            let dt = companion.t.saturating_sub(anchor.t);
            if dt < cfg.min_target_zone_dist {
                continue;
            }
            if dt > cfg.max_target_zone_dist {
                break;
            }

            let hash = hash_pair(anchor.f, companion.f, dt);
            fingerprints.push(Fingerprint {
                hash,
                anchor_time: anchor.t,
            });
            companions_used += 1;
        }
    }

    fingerprints
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_calls() {
        let peaks = vec![
            Peak { t: 0, f: 10 },
            Peak { t: 3, f: 20 },
            Peak { t: 8, f: 30 },
        ];
        let cfg = EngineConfig::default();
        let a = generate_hashes(&peaks, &cfg);
        let b = generate_hashes(&peaks, &cfg);
        assert_eq!(
            a.iter().map(|f| f.hash).collect::<Vec<_>>(),
            b.iter().map(|f| f.hash).collect::<Vec<_>>()
        );
        assert!(!a.is_empty());
    }

    #[test]
    fn respects_fanout_and_target_zone() {
        let peaks: Vec<Peak> = (0..50).map(|t| Peak { t, f: 10 }).collect();
        let cfg = EngineConfig {
            fanout: 3,
            min_target_zone_dist: 1,
            max_target_zone_dist: 5,
            ..EngineConfig::default()
        };
        let fps = generate_hashes(&peaks, &cfg);
        // anchor at t=0 should only ever pair with <= 3 companions
        let anchor_zero_count = fps.iter().filter(|f| f.anchor_time == 0).count();
        assert_eq!(anchor_zero_count, 3);
    }

    #[test]
    fn distinct_pairs_rarely_collide() {
        let peaks = vec![
            Peak { t: 0, f: 10 },
            Peak { t: 2, f: 20 },
            Peak { t: 0, f: 10 },
            Peak { t: 2, f: 99 },
        ];
        let cfg = EngineConfig::default();
        let fps = generate_hashes(&peaks, &cfg);
        let unique_hashes: std::collections::HashSet<_> = fps.iter().map(|f| f.hash).collect();
        assert!(unique_hashes.len() >= 2);
    }
}
