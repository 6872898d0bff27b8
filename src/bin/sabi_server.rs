use std::io::Write;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::post;
use axum::Router;
use sabi::decode::SymphoniaDecoder;
use sabi::matcher::{Alignment, MatchResult};
use sabi::store::PgStore;
use sabi::{Engine, EngineConfig};
use serde::Serialize;
use tokio::sync::Mutex;

type SharedEngine = Arc<Mutex<Engine<SymphoniaDecoder, PgStore>>>;

/// Thin HTTP front end over the engine, matching spec.md §6's Result
/// object shape. Not part of the core: a convenience wrapper, the way
/// the teacher's `axum` dependency implies one was intended.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = EngineConfig::from_env();
    let store = PgStore::connect()?;
    let engine = Engine::new(SymphoniaDecoder::new(), store, config)?;
    let state: SharedEngine = Arc::new(Mutex::new(engine));

    let app = Router::new()
        .route("/query", post(query_handler))
        .route("/songs", post(ingest_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!("sabi-server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct AlignmentResponse {
    song_id: u32,
    song_name: String,
    song_duration: Option<f64>,
    creative_id: Option<String>,
    confidence: usize,
    offset: i64,
    offset_seconds: f64,
    file_sha1: String,
}

impl From<&Alignment> for AlignmentResponse {
    fn from(a: &Alignment) -> Self {
        Self {
            song_id: a.song_id,
            song_name: a.song_name.clone(),
            song_duration: a.song_duration,
            creative_id: a.creative_id.clone(),
            confidence: a.confidence,
            offset: a.offset,
            offset_seconds: a.offset_seconds,
            file_sha1: a.file_sha1.clone(),
        }
    }
}

#[derive(Serialize)]
struct QueryResponse {
    #[serde(flatten)]
    winner: AlignmentResponse,
    fallback_matches: Vec<AlignmentResponse>,
}

impl From<&MatchResult> for QueryResponse {
    fn from(m: &MatchResult) -> Self {
        Self {
            winner: (&m.winner).into(),
            fallback_matches: m.fallback_matches.iter().map(Into::into).collect(),
        }
    }
}

async fn save_upload_to_tempfile(mut multipart: Multipart) -> anyhow::Result<tempfile::NamedTempFile> {
    let field = multipart
        .next_field()
        .await?
        .ok_or_else(|| anyhow::anyhow!("missing upload field"))?;
    let bytes = field.bytes().await?;

    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(&bytes)?;
    file.flush()?;
    Ok(file)
}

async fn query_handler(
    State(engine): State<SharedEngine>,
    multipart: Multipart,
) -> impl IntoResponse {
    let file = match save_upload_to_tempfile(multipart).await {
        Ok(f) => f,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let mut engine = engine.lock().await;
    match engine.query_file(file.path()) {
        Ok(Some(result)) => Json(QueryResponse::from(&result)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "no match").into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn ingest_handler(
    State(engine): State<SharedEngine>,
    multipart: Multipart,
) -> impl IntoResponse {
    let file = match save_upload_to_tempfile(multipart).await {
        Ok(f) => f,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let mut engine = engine.lock().await;
    match engine.ingest_file(file.path(), None) {
        Ok(song_id) => Json(serde_json::json!({ "song_id": song_id })).into_response(),
        Err(e) => (StatusCode::CONFLICT, e.to_string()).into_response(),
    }
}
