use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::decode::Decoder;
use crate::dsp::{compute_spectrogram, find_peaks};
use crate::error::EngineError;
use crate::hash::{generate_hashes, HashToken};
use crate::store::Store;

/// Runs the shared spectrogram → peaks → hasher pipeline (spec.md §2)
/// over one PCM channel and returns its `(hash, anchor_time)` set.
pub fn fingerprint_channel(samples: &[f32], cfg: &EngineConfig) -> HashSet<(HashToken, usize)> {
    let spectrogram = compute_spectrogram(samples, cfg);
    let peaks = find_peaks(&spectrogram, cfg);
    generate_hashes(&peaks, cfg)
        .into_iter()
        .map(|fp| (fp.hash, fp.anchor_time))
        .collect()
}

/// Fingerprints every channel independently and unions the resulting hash
/// sets (spec.md §5, §8 channel-union-idempotence property).
pub fn fingerprint_channels(
    channels: &[Vec<f32>],
    cfg: &EngineConfig,
) -> HashSet<(HashToken, usize)> {
    channels
        .iter()
        .fold(HashSet::new(), |mut acc, channel| {
            acc.extend(fingerprint_channel(channel, cfg));
            acc
        })
}

struct WorkerResult {
    path: PathBuf,
    song_name: String,
    hashes: HashSet<(HashToken, usize)>,
    duration: Option<f64>,
    file_sha1: String,
}

fn process_one(
    path: &Path,
    decoder: &dyn Decoder,
    cfg: &EngineConfig,
) -> Result<WorkerResult, EngineError> {
    let (channels, sample_rate, file_sha1) =
        decoder.read(path, cfg.fingerprint_limit_secs, cfg.sample_rate)?;

    let hashes = fingerprint_channels(&channels, cfg);
    let duration = channels
        .first()
        .map(|c| c.len() as f64 / sample_rate as f64);

    let song_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    Ok(WorkerResult {
        path: path.to_path_buf(),
        song_name,
        hashes,
        duration,
        file_sha1,
    })
}

/// Drives batch ingestion of a directory: an embarrassingly-parallel
/// worker pool over files (spec.md §5, §9 "process pool with
/// traceback-on-error" pattern), backed by `rayon` rather than spawning
/// OS processes.
///
/// `known_hashes` is the driver's cache of already-ingested content
/// hashes (spec.md §5 "refreshed after every successful ingest"); it is
/// consulted before decoding each file and updated in this call.
pub fn fingerprint_directory(
    dir: &Path,
    extensions: &[&str],
    decoder: &dyn Decoder,
    store: &mut dyn Store,
    cfg: &EngineConfig,
    known_hashes: &mut HashSet<String>,
) -> Result<(usize, usize), EngineError> {
    let candidates = find_audio_files(dir, extensions)?;

    let mut to_process = Vec::new();
    for path in candidates {
        match decoder.unique_hash(&path) {
            Ok(hash) if known_hashes.contains(&hash) => {
                tracing::info!(path = %path.display(), "already fingerprinted, skipping");
            }
            Ok(_) => to_process.push(path),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "failed to hash file"),
        }
    }

    let results: Vec<Result<WorkerResult, (PathBuf, EngineError)>> = to_process
        .par_iter()
        .map(|path| process_one(path, decoder, cfg).map_err(|e| (path.clone(), e)))
        .collect();

    let mut ingested = 0usize;
    let mut failed = 0usize;

    for result in results {
        match result {
            Ok(worker_result) => {
                let hash_pairs: Vec<(HashToken, usize)> =
                    worker_result.hashes.into_iter().collect();

                let song_id = store.insert_song(
                    &worker_result.song_name,
                    &worker_result.file_sha1,
                    worker_result.duration,
                    None,
                )?;
                store.insert_hashes(song_id, &hash_pairs)?;
                store.set_song_fingerprinted(song_id)?;

                known_hashes.insert(worker_result.file_sha1);
                ingested += 1;
                tracing::info!(path = %worker_result.path.display(), song_id, "fingerprinted");
            }
            Err((path, e)) => {
                failed += 1;
                tracing::error!(path = %path.display(), error = %e, "fingerprinting worker failed");
            }
        }
    }

    Ok((ingested, failed))
}

/// Fingerprints and stores a single file. Unlike batch ingestion, a
/// duplicate content hash is a caller-visible error (spec.md §7 kind 2).
pub fn fingerprint_file(
    path: &Path,
    decoder: &dyn Decoder,
    store: &mut dyn Store,
    cfg: &EngineConfig,
    known_hashes: &mut HashSet<String>,
    creative_id: Option<&str>,
) -> Result<u32, EngineError> {
    let content_hash = decoder.unique_hash(path)?;
    if known_hashes.contains(&content_hash) {
        return Err(EngineError::DuplicateIngest {
            path: path.to_path_buf(),
        });
    }

    let result = process_one(path, decoder, cfg)?;
    let hash_pairs: Vec<(HashToken, usize)> = result.hashes.into_iter().collect();

    let song_id = store.insert_song(&result.song_name, &result.file_sha1, result.duration, creative_id)?;
    store.insert_hashes(song_id, &hash_pairs)?;
    store.set_song_fingerprinted(song_id)?;

    known_hashes.insert(result.file_sha1);
    Ok(song_id)
}

fn find_audio_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, EngineError> {
    let mut out = Vec::new();
    let entries = std::fs::read_dir(dir).map_err(|e| EngineError::Decode {
        path: dir.to_path_buf(),
        source: anyhow::anyhow!(e),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| EngineError::Decode {
            path: dir.to_path_buf(),
            source: anyhow::anyhow!(e),
        })?;
        let path = entry.path();

        if path.is_dir() {
            out.extend(find_audio_files(&path, extensions)?);
            continue;
        }

        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|ext| ext.eq_ignore_ascii_case(e)))
            .unwrap_or(false);

        if matches_ext {
            out.push(path);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_stereo_channels_union_to_the_mono_hash_set() {
        let cfg = EngineConfig {
            window_size: 256,
            peak_amplitude_min: -10.0,
            ..EngineConfig::default()
        };
        let samples: Vec<f32> = (0..44_100)
            .map(|i| (i as f32 * 0.05).sin())
            .collect();

        let mono = fingerprint_channel(&samples, &cfg);
        let stereo = fingerprint_channels(&[samples.clone(), samples], &cfg);

        assert_eq!(mono, stereo);
    }
}
