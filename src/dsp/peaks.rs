use crate::config::EngineConfig;
use crate::dsp::spectrogram::Spectrogram;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Peak {
    pub t: usize,
    pub f: usize,
}

/// Selects local maxima of `spec` above `cfg.peak_amplitude_min`, within a
/// `(2r+1) x (2r+1)` neighborhood, per spec.md §4.2.
///
/// A cell is a peak iff it equals the max of its neighborhood (dilation)
/// and clears the amplitude floor; plateaus are collapsed to a single
/// peak by keeping only the first cell (in raster order) that attains the
/// dilated max within its neighborhood. DC (`f == 0`) and the Nyquist bin
/// are excluded.
pub fn find_peaks(spec: &Spectrogram, cfg: &EngineConfig) -> Vec<Peak> {
    let t_count = spec.frame_count();
    let f_count = spec.bin_count();
    if t_count == 0 || f_count < 3 {
        return Vec::new();
    }

    let r = cfg.peak_neighborhood as isize;
    let mut peaks = Vec::new();

    for t in 0..t_count {
        for f in 1..f_count.saturating_sub(1) {
            let m = spec.magnitude(t, f);
            if m < cfg.peak_amplitude_min {
                continue;
            }

            let t0 = (t as isize - r).max(0) as usize;
            let t1 = ((t as isize + r) as usize).min(t_count - 1);
            let f0 = (f as isize - r).max(1) as usize;
            let f1 = ((f as isize + r) as usize).min(f_count - 2);

            let mut is_peak = true;
            'neighborhood: for nt in t0..=t1 {
                for nf in f0..=f1 {
                    if nt == t && nf == f {
                        continue;
                    }
                    let neighbor = spec.magnitude(nt, nf);
                    if neighbor > m {
                        is_peak = false;
                        break 'neighborhood;
                    }
                    // Plateau tie-break: only the first cell in raster
                    // order (smallest t, then smallest f) keeps the peak.
                    if neighbor == m && (nt, nf) < (t, f) {
                        is_peak = false;
                        break 'neighborhood;
                    }
                }
            }

            if is_peak {
                peaks.push(Peak { t, f });
            }
        }
    }

    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: Vec<Vec<f32>>) -> Spectrogram {
        Spectrogram { frames: rows, hop: 1 }
    }

    #[test]
    fn single_spike_is_the_only_peak() {
        let mut frames = vec![vec![0.0f32; 10]; 5];
        frames[2][5] = 100.0;
        let spec = grid(frames);
        let cfg = EngineConfig {
            peak_neighborhood: 2,
            peak_amplitude_min: 1.0,
            ..EngineConfig::default()
        };
        let peaks = find_peaks(&spec, &cfg);
        assert_eq!(peaks, vec![Peak { t: 2, f: 5 }]);
    }

    #[test]
    fn below_floor_is_never_a_peak() {
        let mut frames = vec![vec![0.0f32; 10]; 5];
        frames[2][5] = 5.0;
        let spec = grid(frames);
        let cfg = EngineConfig {
            peak_neighborhood: 2,
            peak_amplitude_min: 10.0,
            ..EngineConfig::default()
        };
        assert!(find_peaks(&spec, &cfg).is_empty());
    }

    #[test]
    fn plateau_yields_a_single_peak() {
        let mut frames = vec![vec![0.0f32; 10]; 5];
        frames[2][4] = 50.0;
        frames[2][5] = 50.0;
        let spec = grid(frames);
        let cfg = EngineConfig {
            peak_neighborhood: 2,
            peak_amplitude_min: 1.0,
            ..EngineConfig::default()
        };
        let peaks = find_peaks(&spec, &cfg);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0], Peak { t: 2, f: 4 });
    }
}
