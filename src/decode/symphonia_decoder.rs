use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecRegistry, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::{Hint, Probe};
use symphonia::default;

use crate::decode::{resample_linear, Decoder};
use crate::error::EngineError;

/// Grounded on the teacher's `audio_processor.rs`, generalized to keep
/// every source channel separate instead of mixing down to mono, to
/// honor an optional `fingerprint_limit` in seconds (spec.md §4.1 edge
/// case), and to resample to the caller's target `Fs` (the teacher's own
/// `resample_linear`, otherwise unused) so files ingested at different
/// native sample rates still produce comparable hashes.
pub struct SymphoniaDecoder {
    codec_registry: &'static CodecRegistry,
    format_options: FormatOptions,
    metadata_options: MetadataOptions,
    probe: &'static Probe,
}

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self {
            codec_registry: default::get_codecs(),
            format_options: FormatOptions::default(),
            metadata_options: MetadataOptions::default(),
            probe: default::get_probe(),
        }
    }
}

impl Default for SymphoniaDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for SymphoniaDecoder {
    fn read(
        &self,
        path: &Path,
        limit_seconds: Option<f32>,
        target_sample_rate: u32,
    ) -> Result<(Vec<Vec<f32>>, u32, String), EngineError> {
        let file_sha1 = self.unique_hash(path)?;

        let file = File::open(path).map_err(|e| EngineError::Decode {
            path: path.to_path_buf(),
            source: anyhow::anyhow!(e),
        })?;

        let source: Box<dyn MediaSource> = Box::new(file);
        let stream = MediaSourceStream::new(source, Default::default());

        let probed = self
            .probe
            .format(
                &Hint::new(),
                stream,
                &self.format_options,
                &self.metadata_options,
            )
            .map_err(|e| EngineError::Decode {
                path: path.to_path_buf(),
                source: anyhow::anyhow!(e),
            })?;
        let mut format = probed.format;

        let track = format.tracks().first().ok_or_else(|| EngineError::Decode {
            path: path.to_path_buf(),
            source: anyhow::anyhow!("no audio track found"),
        })?;
        let codec_params = track.codec_params.clone();
        let sample_rate = codec_params.sample_rate.ok_or_else(|| EngineError::Decode {
            path: path.to_path_buf(),
            source: anyhow::anyhow!("missing sample rate"),
        })?;

        let mut decoder = self
            .codec_registry
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| EngineError::Decode {
                path: path.to_path_buf(),
                source: anyhow::anyhow!(e),
            })?;

        let mut channels: Vec<Vec<f32>> = Vec::new();
        let sample_cap = limit_seconds.map(|secs| (sample_rate as f32 * secs) as usize);

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(_)) => break,
                Err(e) => {
                    return Err(EngineError::Decode {
                        path: path.to_path_buf(),
                        source: anyhow::anyhow!(e),
                    })
                }
            };

            let decoded = decoder.decode(&packet).map_err(|e| EngineError::Decode {
                path: path.to_path_buf(),
                source: anyhow::anyhow!(e),
            })?;
            let spec = *decoded.spec();
            let num_channels = spec.channels.count();

            if channels.is_empty() {
                channels = vec![Vec::new(); num_channels];
            }

            let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);

            for frame in sample_buf.samples().chunks_exact(num_channels) {
                for (ch, &sample) in frame.iter().enumerate() {
                    channels[ch].push(sample);
                }
            }

            if let Some(cap) = sample_cap {
                if channels.first().is_some_and(|c| c.len() >= cap) {
                    break;
                }
            }
        }

        if let Some(cap) = sample_cap {
            for channel in &mut channels {
                channel.truncate(cap);
            }
        }

        if sample_rate != target_sample_rate {
            for channel in &mut channels {
                *channel = resample_linear(channel, sample_rate, target_sample_rate);
            }
        }

        Ok((channels, target_sample_rate, file_sha1))
    }

    fn unique_hash(&self, path: &Path) -> Result<String, EngineError> {
        sha256::try_digest(path).map_err(|e| EngineError::Decode {
            path: path.to_path_buf(),
            source: anyhow::anyhow!(e),
        })
    }
}
