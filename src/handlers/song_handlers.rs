use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use tokio::io::AsyncReadExt;

use crate::db::{self, DbPool};
use crate::error::ApiError;
use crate::lifecycle;
use crate::models::song_models::{SongForm, SongListQuery};
use crate::repo;
use crate::storage::{BlobStore, StagedBlob};

const STREAM_BUF_SIZE: usize = 8192;

pub async fn list_songs(
    pool: web::Data<DbPool>,
    query: web::Query<SongListQuery>,
) -> Result<HttpResponse, ApiError> {
    let user_id = query.user_id;
    let songs = db::with_conn(pool.get_ref().clone(), move |conn| {
        repo::list_with_favorites(conn, user_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(songs))
}

pub async fn get_song(
    pool: web::Data<DbPool>,
    song_id: web::Path<i32>,
    query: web::Query<SongListQuery>,
) -> Result<HttpResponse, ApiError> {
    let song_id = song_id.into_inner();
    let user_id = query.user_id;
    let song = db::with_conn(pool.get_ref().clone(), move |conn| {
        repo::get_with_favorites(conn, song_id, user_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(song))
}

/// Serves the audio file in chunks. Once the body has started, a read error
/// can only abort the stream; the 200 status is already on the wire.
pub async fn stream_song(
    store: web::Data<BlobStore>,
    song_id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let (path, content_type) = store.resolve(song_id.into_inner()).await?;
    let mut file = tokio::fs::File::open(&path).await?;

    let stream = async_stream::stream! {
        let mut buf = [0u8; STREAM_BUF_SIZE];
        loop {
            match file.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => yield Ok::<_, std::io::Error>(web::Bytes::copy_from_slice(&buf[..n])),
                Err(err) => {
                    log::error!("audio stream for {} aborted: {err}", path.display());
                    yield Err(err);
                    break;
                }
            }
        }
    };

    Ok(HttpResponse::Ok().content_type(content_type).streaming(stream))
}

pub async fn create_song(
    pool: web::Data<DbPool>,
    store: web::Data<BlobStore>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let (form, staged) = collect_song_form(payload, &store).await?;
    let song = match form.validate() {
        Ok(song) => song,
        Err(err) => {
            if let Some(staged) = staged {
                staged.discard().await;
            }
            return Err(err);
        }
    };

    let id = lifecycle::create_song(&pool, &store, song, staged).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

pub async fn update_song(
    pool: web::Data<DbPool>,
    store: web::Data<BlobStore>,
    song_id: web::Path<i32>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let (form, staged) = collect_song_form(payload, &store).await?;
    let song = match form.validate() {
        Ok(song) => song,
        Err(err) => {
            if let Some(staged) = staged {
                staged.discard().await;
            }
            return Err(err);
        }
    };

    lifecycle::update_song(&pool, &store, song_id.into_inner(), song, staged).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn delete_song(
    pool: web::Data<DbPool>,
    store: web::Data<BlobStore>,
    song_id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    lifecycle::delete_song(&pool, &store, song_id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Walks the multipart fields, buffering text fields and staging the `file`
/// field into the blob store as its chunks arrive. On any error the staged
/// temp file is discarded before returning.
async fn collect_song_form(
    mut payload: Multipart,
    store: &BlobStore,
) -> Result<(SongForm, Option<StagedBlob>), ApiError> {
    let mut form = SongForm::default();
    let mut staged: Option<StagedBlob> = None;

    while let Some(next) = payload.next().await {
        let mut field = match next {
            Ok(field) => field,
            Err(_) => {
                discard(&mut staged).await;
                return Err(ApiError::Validation("malformed multipart payload".to_string()));
            }
        };

        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or("").to_string(),
                cd.get_filename().unwrap_or("").to_string(),
            ),
            None => continue,
        };

        if name == "file" {
            let mut blob = match store.stage(&filename).await {
                Ok(blob) => blob,
                Err(err) => {
                    discard(&mut staged).await;
                    return Err(err);
                }
            };
            while let Some(chunk) = field.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(_) => {
                        blob.discard().await;
                        discard(&mut staged).await;
                        return Err(ApiError::Validation(
                            "malformed multipart payload".to_string(),
                        ));
                    }
                };
                if let Err(err) = blob.write_chunk(&bytes).await {
                    blob.discard().await;
                    discard(&mut staged).await;
                    return Err(err.into());
                }
            }
            // A repeated file field: last upload wins, like the metadata fields.
            if let Some(old) = staged.replace(blob) {
                old.discard().await;
            }
        } else {
            let mut buf = web::BytesMut::new();
            while let Some(chunk) = field.next().await {
                match chunk {
                    Ok(bytes) => buf.extend_from_slice(&bytes),
                    Err(_) => {
                        discard(&mut staged).await;
                        return Err(ApiError::Validation(
                            "malformed multipart payload".to_string(),
                        ));
                    }
                }
            }
            let value = String::from_utf8_lossy(&buf).trim().to_string();
            match name.as_str() {
                "title" => form.title = Some(value),
                "artist" => form.artist = Some(value),
                "duration" => form.duration = if value.is_empty() { None } else { Some(value) },
                "album_id" => {
                    if value.is_empty() {
                        form.album_id = None;
                    } else {
                        match value.parse() {
                            Ok(id) => form.album_id = Some(id),
                            Err(_) => {
                                discard(&mut staged).await;
                                return Err(ApiError::Validation(
                                    "album_id must be an integer".to_string(),
                                ));
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    Ok((form, staged))
}

async fn discard(staged: &mut Option<StagedBlob>) {
    if let Some(staged) = staged.take() {
        staged.discard().await;
    }
}
