use std::time::SystemTime;

use diesel::prelude::*;

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = crate::store::schema::fingerprint)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FingerprintRow {
    pub hash: i64,
    pub song_time: i64,
    pub song_id: i32,
    pub created_at: Option<SystemTime>,
}

#[derive(QueryableByName, Debug)]
pub struct FingerprintMatch {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub hash: i64,
    #[diesel(sql_type = diesel::sql_types::Integer)]
    pub song_id: i32,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub song_time: i64,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::store::schema::songs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SongRow {
    pub id: i32,
    pub title: String,
    pub file_sha1: String,
    pub duration: Option<f64>,
    pub creative_id: Option<String>,
    pub fingerprinted: bool,
    pub created_at: Option<SystemTime>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::store::schema::songs)]
pub struct NewSong<'a> {
    pub title: &'a str,
    pub file_sha1: &'a str,
    pub duration: Option<f64>,
    pub creative_id: Option<&'a str>,
    pub fingerprinted: bool,
    pub created_at: Option<SystemTime>,
}
