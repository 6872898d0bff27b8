use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sabi::decode::{Decoder, SymphoniaDecoder};
use sabi::store::PgStore;
use sabi::{Engine, EngineConfig};

/// Command-line front end over the fingerprinting engine (spec.md §1
/// "out of scope" collaborator, implemented here as thin glue).
#[derive(Parser)]
#[command(name = "sabi")]
#[command(about = "Acoustic fingerprint ingestion and recognition", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fingerprint every audio file in a directory.
    Ingest {
        directory: PathBuf,
        #[arg(long, value_delimiter = ',', default_value = "wav,mp3,flac,ogg")]
        extensions: Vec<String>,
    },
    /// Fingerprint a single file; errors if it was already ingested.
    IngestFile {
        path: PathBuf,
        #[arg(long)]
        creative_id: Option<String>,
    },
    /// Identify a query clip against the indexed corpus.
    Query { path: PathBuf },
    /// Render a file's constellation map as a heatmap SVG, for eyeballing
    /// peak density while tuning `EngineConfig`.
    Visualize {
        path: PathBuf,
        #[arg(long, default_value = "heatmap.svg")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env();
    let store = PgStore::connect()?;
    let mut engine = Engine::new(SymphoniaDecoder::new(), store, config)?;

    match cli.command {
        Command::Ingest { directory, extensions } => {
            let extensions: Vec<&str> = extensions.iter().map(String::as_str).collect();
            let (ingested, failed) = engine.ingest_directory(&directory, &extensions)?;
            println!("ingested {ingested} file(s), {failed} failure(s)");
        }
        Command::IngestFile { path, creative_id } => {
            let song_id = engine.ingest_file(&path, creative_id.as_deref())?;
            println!("ingested as song_id {song_id}");
        }
        Command::Query { path } => match engine.query_file(&path)? {
            Some(result) => {
                println!(
                    "match: {} (song_id={}, confidence={}, offset={:.5}s)",
                    result.winner.song_name,
                    result.winner.song_id,
                    result.winner.confidence,
                    result.winner.offset_seconds
                );
                for fallback in &result.fallback_matches {
                    println!(
                        "  fallback: {} (confidence={})",
                        fallback.song_name, fallback.confidence
                    );
                }
            }
            None => println!("no match"),
        },
        Command::Visualize { path, output } => {
            let cfg = engine.config;
            let (channels, _, _) = engine
                .decoder
                .read(&path, cfg.fingerprint_limit_secs, cfg.sample_rate)?;
            let channel = channels.first().cloned().unwrap_or_default();
            let spectrogram = sabi::dsp::compute_spectrogram(&channel, &cfg);
            let peaks = sabi::dsp::find_peaks(&spectrogram, &cfg);

            let song_name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned());
            sabi::visualization::write_heatmap_svg(&peaks, &cfg, &output, &song_name)?;
            println!("wrote {} peak(s) to {}", peaks.len(), output.display());
        }
    }

    Ok(())
}
