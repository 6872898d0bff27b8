use std::collections::HashMap;
use std::env;
use std::time::SystemTime;

use diesel::dsl::insert_into;
use diesel::prelude::*;
use diesel::upsert::on_constraint;

use crate::error::EngineError;
use crate::hash::HashToken;
use crate::store::bindings::{FingerprintMatch, FingerprintRow, NewSong, SongRow};
use crate::store::{Song, Store};

use super::schema;

/// PostgreSQL-backed [`Store`], grounded on the teacher's `db/connector.rs`
/// and `db/bindings.rs`.
pub struct PgStore {
    conn: PgConnection,
}

impl PgStore {
    pub fn connect() -> Result<Self, EngineError> {
        dotenvy::dotenv().ok();
        let db_url = env::var("DATABASE_URL")
            .map_err(|e| EngineError::Store(anyhow::anyhow!("DATABASE_URL not set: {e}")))?;
        Self::connect_to(&db_url)
    }

    pub fn connect_to(database_url: &str) -> Result<Self, EngineError> {
        let conn = PgConnection::establish(database_url)
            .map_err(|e| EngineError::Store(anyhow::anyhow!(e)))?;
        Ok(Self { conn })
    }

    fn row_to_song(row: SongRow) -> Song {
        Song {
            song_id: row.id as u32,
            song_name: row.title,
            song_duration: row.duration,
            creative_id: row.creative_id,
            file_sha1: row.file_sha1,
            fingerprinted: row.fingerprinted,
        }
    }
}

impl Store for PgStore {
    fn get_songs(&mut self) -> Result<Vec<Song>, EngineError> {
        use schema::songs::dsl::*;

        songs
            .select(SongRow::as_select())
            .get_results(&mut self.conn)
            .map(|rows| rows.into_iter().map(Self::row_to_song).collect())
            .map_err(|e| EngineError::Store(anyhow::anyhow!(e)))
    }

    fn get_song_by_id(&mut self, song_id: u32) -> Result<Option<Song>, EngineError> {
        use schema::songs::dsl::*;

        songs
            .select(SongRow::as_select())
            .filter(id.eq(song_id as i32))
            .first(&mut self.conn)
            .optional()
            .map(|row| row.map(Self::row_to_song))
            .map_err(|e| EngineError::Store(anyhow::anyhow!(e)))
    }

    fn insert_song(
        &mut self,
        name: &str,
        file_sha1: &str,
        duration: Option<f64>,
        creative_id: Option<&str>,
    ) -> Result<u32, EngineError> {
        use schema::songs;

        let new_song = NewSong {
            title: name,
            file_sha1,
            duration,
            creative_id,
            fingerprinted: false,
            created_at: Some(SystemTime::now()),
        };

        let inserted: SongRow = insert_into(songs::table)
            .values(&new_song)
            .get_result(&mut self.conn)
            .map_err(|e| EngineError::Store(anyhow::anyhow!(e)))?;

        tracing::info!(song_id = inserted.id, title = %name, "inserted song");
        Ok(inserted.id as u32)
    }

    fn insert_hashes(
        &mut self,
        song_id: u32,
        hashes: &[(HashToken, usize)],
    ) -> Result<(), EngineError> {
        use schema::fingerprint;

        const BATCH_SIZE: usize = 15_000;

        let rows: Vec<FingerprintRow> = hashes
            .iter()
            .map(|&(hash, song_time)| FingerprintRow {
                hash: hash as i64,
                song_time: song_time as i64,
                song_id: song_id as i32,
                created_at: Some(SystemTime::now()),
            })
            .collect();

        if rows.is_empty() {
            tracing::warn!(song_id, "no hashes to write");
            return Ok(());
        }

        self.conn
            .transaction(|conn| {
                for batch in rows.chunks(BATCH_SIZE) {
                    insert_into(fingerprint::table)
                        .values(batch)
                        .on_conflict(on_constraint("fingerprint_pkey"))
                        .do_nothing()
                        .execute(conn)?;
                }
                Ok::<_, diesel::result::Error>(())
            })
            .map_err(|e| EngineError::Store(anyhow::anyhow!(e)))
    }

    fn set_song_fingerprinted(&mut self, song_id: u32) -> Result<(), EngineError> {
        use schema::songs::dsl::*;

        diesel::update(songs.filter(id.eq(song_id as i32)))
            .set(fingerprinted.eq(true))
            .execute(&mut self.conn)
            .map(|_| ())
            .map_err(|e| EngineError::Store(anyhow::anyhow!(e)))
    }

    fn return_matches(
        &mut self,
        tokens: &[(HashToken, usize)],
    ) -> Result<Vec<(u32, i64)>, EngineError> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let hashes: Vec<i64> = tokens.iter().map(|&(h, _)| h as i64).collect();
        let anchor_by_hash: HashMap<i64, Vec<usize>> =
            tokens.iter().fold(HashMap::new(), |mut map, &(h, t)| {
                map.entry(h as i64).or_default().push(t);
                map
            });

        const BATCH_SIZE: usize = 5000;

        let records: Vec<FingerprintMatch> = self
            .conn
            .transaction(|conn| {
                diesel::sql_query(
                    "CREATE TEMPORARY TABLE temp_hashes (hash BIGINT NOT NULL PRIMARY KEY) ON COMMIT DROP;",
                )
                .execute(conn)?;

                diesel::table! {
                    temp_hashes (hash) {
                        hash -> BigInt,
                    }
                }

                #[derive(Insertable)]
                #[diesel(table_name = temp_hashes)]
                struct NewHash {
                    hash: i64,
                }

                for batch in hashes.chunks(BATCH_SIZE) {
                    let new_hashes: Vec<NewHash> =
                        batch.iter().map(|&hash| NewHash { hash }).collect();
                    diesel::insert_into(temp_hashes::table)
                        .values(&new_hashes)
                        .on_conflict_do_nothing()
                        .execute(conn)?;
                }

                diesel::sql_query(
                    "SELECT f.hash, f.song_id, f.song_time \
                     FROM fingerprint AS f \
                     INNER JOIN temp_hashes AS t ON f.hash = t.hash;",
                )
                .load::<FingerprintMatch>(conn)
            })
            .map_err(|e| EngineError::Store(anyhow::anyhow!(e)))?;

        let mut votes = Vec::with_capacity(records.len());
        for rec in records {
            let Some(anchor_times) = anchor_by_hash.get(&rec.hash) else {
                continue;
            };
            for &anchor_time in anchor_times {
                let offset_delta = rec.song_time - anchor_time as i64;
                votes.push((rec.song_id as u32, offset_delta));
            }
        }

        Ok(votes)
    }
}
