use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use std::f32::consts::PI;

/// A deterministic sine sweep from `start_hz` to `end_hz` over
/// `duration_secs`, standing in for a "song" in the scenario tests.
pub fn sine_sweep(sample_rate: u32, duration_secs: f32, start_hz: f32, end_hz: f32) -> Vec<f32> {
    let n = (sample_rate as f32 * duration_secs) as usize;
    let mut phase = 0.0f32;
    let mut out = Vec::with_capacity(n);

    for i in 0..n {
        let t = i as f32 / sample_rate as f32;
        let freq = start_hz + (end_hz - start_hz) * (t / duration_secs);
        phase += 2.0 * PI * freq / sample_rate as f32;
        out.push(phase.sin() * 0.8);
    }
    out
}

/// White noise, standing in for an unrelated "song" with no common
/// structure (spec.md §8 scenario 3).
pub fn white_noise(sample_rate: u32, duration_secs: f32, seed: u64) -> Vec<f32> {
    let n = (sample_rate as f32 * duration_secs) as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(-1.0f32..1.0)).collect()
}

/// Pure silence, for the no-match-floor property (spec.md §8).
pub fn silence(sample_rate: u32, duration_secs: f32) -> Vec<f32> {
    vec![0.0; (sample_rate as f32 * duration_secs) as usize]
}

pub fn excerpt(samples: &[f32], sample_rate: u32, start_secs: f32, duration_secs: f32) -> Vec<f32> {
    let start = (sample_rate as f32 * start_secs) as usize;
    let end = (start + (sample_rate as f32 * duration_secs) as usize).min(samples.len());
    samples[start.min(samples.len())..end].to_vec()
}

pub fn add_gaussian_noise(samples: &[f32], amplitude: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    samples
        .iter()
        .map(|&s| s + rng.random_range(-amplitude..amplitude))
        .collect()
}
