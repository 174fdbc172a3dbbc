//! The only code that touches both the song table and the blob store.
//!
//! There is no transaction spanning the two, so ordering carries the
//! consistency guarantees: uploads are staged before any row is written, and
//! the blob commit happens only once the row (and its generated id) exists.
//! The worst reachable state is a row without an asset, which the update path
//! can repair. There is no per-song lock; concurrent updates of one id race
//! and the last writer wins in both stores.

use crate::db::{self, DbPool};
use crate::error::ApiError;
use crate::models::song_models::NewSong;
use crate::repo;
use crate::storage::{BlobStore, StagedBlob};

/// Create protocol: insert the row, then commit the staged payload under the
/// generated id. If the commit fails the row stays — logged here, re-upload
/// goes through [`update_song`].
pub async fn create_song(
    pool: &DbPool,
    store: &BlobStore,
    song: NewSong,
    staged: Option<StagedBlob>,
) -> Result<i32, ApiError> {
    let song_id = match db::with_conn(pool.clone(), move |conn| repo::insert_song(conn, &song)).await
    {
        Ok(id) => id,
        Err(err) => {
            if let Some(staged) = staged {
                staged.discard().await;
            }
            return Err(err);
        }
    };

    if let Some(staged) = staged {
        if let Err(err) = store.commit(staged, song_id).await {
            log::error!("song {song_id}: row created but audio commit failed: {err}");
            return Err(err);
        }
    }

    Ok(song_id)
}

/// Update protocol: overwrite the row unconditionally, then replace the asset
/// only when a new payload was uploaded. Without a payload the existing asset
/// is left untouched.
pub async fn update_song(
    pool: &DbPool,
    store: &BlobStore,
    song_id: i32,
    song: NewSong,
    staged: Option<StagedBlob>,
) -> Result<(), ApiError> {
    if let Err(err) =
        db::with_conn(pool.clone(), move |conn| repo::update_song(conn, song_id, &song)).await
    {
        if let Some(staged) = staged {
            staged.discard().await;
        }
        return Err(err);
    }

    if let Some(staged) = staged {
        if let Err(err) = store.commit(staged, song_id).await {
            log::error!("song {song_id}: metadata updated but audio commit failed: {err}");
            return Err(err);
        }
    }

    Ok(())
}

/// Delete protocol: favorites and row go first (one transaction), the asset
/// last. A failed file removal leaves only a stray file, never a dangling
/// favorite, so it is logged and swallowed.
pub async fn delete_song(pool: &DbPool, store: &BlobStore, song_id: i32) -> Result<(), ApiError> {
    db::with_conn(pool.clone(), move |conn| repo::delete_song(conn, song_id)).await?;

    if let Err(err) = store.delete(song_id).await {
        log::warn!("song {song_id}: row deleted but audio cleanup failed: {err}");
    }

    Ok(())
}

/// Deleting an album runs the full song delete protocol for every song it
/// contains — not a relational cascade — so each song's asset is removed too.
pub async fn delete_album(pool: &DbPool, store: &BlobStore, album_id: i32) -> Result<(), ApiError> {
    let song_ids =
        db::with_conn(pool.clone(), move |conn| repo::song_ids_for_album(conn, album_id)).await?;

    for song_id in song_ids {
        delete_song(pool, store, song_id).await?;
    }

    let affected =
        db::with_conn(pool.clone(), move |conn| repo::delete_album_row(conn, album_id)).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("album"));
    }
    Ok(())
}
