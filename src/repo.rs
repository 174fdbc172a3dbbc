use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel::SqliteConnection;

use crate::error::ApiError;
use crate::models::song_models::{NewSong, SongWithAlbum};
use crate::schema::{favorites, songs};

const SONG_SELECT: &str = r#"
    SELECT
        s.id,
        s.title,
        s.artist,
        s.duration,
        s.album_id,
        a.title AS album_title,
        a.release_year AS album_release_year,
        EXISTS (
            SELECT 1 FROM favorites f
            WHERE f.song_id = s.id AND f.user_id = ?
        ) AS is_favorited,
        s.created_at
    FROM songs s
    LEFT JOIN albums a ON s.album_id = a.id
"#;

pub fn insert_song(conn: &mut SqliteConnection, song: &NewSong) -> Result<i32, ApiError> {
    let id = diesel::insert_into(songs::table)
        .values(song)
        .returning(songs::id)
        .get_result::<i32>(conn)?;
    Ok(id)
}

/// Full overwrite of the mutable fields. Updating an id that does not exist
/// is reported as `NotFound` rather than silently succeeding.
pub fn update_song(conn: &mut SqliteConnection, song_id: i32, song: &NewSong) -> Result<(), ApiError> {
    let affected = diesel::update(songs::table.find(song_id))
        .set(song)
        .execute(conn)?;
    if affected == 0 {
        return Err(ApiError::NotFound("song"));
    }
    Ok(())
}

/// Removes the song and its favorites in one transaction, so a failure can
/// never leave a favorite pointing at a missing song.
pub fn delete_song(conn: &mut SqliteConnection, song_id: i32) -> Result<usize, ApiError> {
    conn.transaction(|conn| {
        diesel::delete(favorites::table.filter(favorites::song_id.eq(song_id))).execute(conn)?;
        let affected = diesel::delete(songs::table.find(song_id)).execute(conn)?;
        Ok(affected)
    })
}

/// All songs with album title/year and the favorite flag for `user_id`,
/// newest first. Without a user context the probe uses id 0, which matches
/// nothing.
pub fn list_with_favorites(
    conn: &mut SqliteConnection,
    user_id: Option<i32>,
) -> Result<Vec<SongWithAlbum>, ApiError> {
    let sql = format!("{SONG_SELECT} ORDER BY s.created_at DESC, s.id DESC");
    let rows = diesel::sql_query(sql)
        .bind::<Integer, _>(user_id.unwrap_or(0))
        .load::<SongWithAlbum>(conn)?;
    Ok(rows)
}

pub fn get_with_favorites(
    conn: &mut SqliteConnection,
    song_id: i32,
    user_id: Option<i32>,
) -> Result<SongWithAlbum, ApiError> {
    let sql = format!("{SONG_SELECT} WHERE s.id = ?");
    let mut rows = diesel::sql_query(sql)
        .bind::<Integer, _>(user_id.unwrap_or(0))
        .bind::<Integer, _>(song_id)
        .load::<SongWithAlbum>(conn)?;
    rows.pop().ok_or(ApiError::NotFound("song"))
}

pub fn song_ids_for_album(conn: &mut SqliteConnection, album_id: i32) -> Result<Vec<i32>, ApiError> {
    let ids = songs::table
        .filter(songs::album_id.eq(album_id))
        .select(songs::id)
        .load::<i32>(conn)?;
    Ok(ids)
}

pub fn delete_album_row(conn: &mut SqliteConnection, album_id: i32) -> Result<usize, ApiError> {
    use crate::schema::albums;
    let affected = diesel::delete(albums::table.find(album_id)).execute(conn)?;
    Ok(affected)
}
