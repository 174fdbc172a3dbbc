use actix_web::{web, HttpResponse};
use diesel::prelude::*;

use crate::db::{self, DbPool};
use crate::error::ApiError;
use crate::lifecycle;
use crate::models::album_models::{Album, NewAlbum, UpdateAlbum};
use crate::schema::albums;
use crate::storage::BlobStore;

pub async fn list_albums(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let list = db::with_conn(pool.get_ref().clone(), |conn| {
        let rows = albums::table
            .select(Album::as_select())
            .order(albums::created_at.desc())
            .load::<Album>(conn)?;
        Ok(rows)
    })
    .await?;
    Ok(HttpResponse::Ok().json(list))
}

pub async fn get_album(
    pool: web::Data<DbPool>,
    album_id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let album_id = album_id.into_inner();
    let album = db::with_conn(pool.get_ref().clone(), move |conn| {
        albums::table
            .find(album_id)
            .select(Album::as_select())
            .first::<Album>(conn)
            .map_err(|err| match err {
                diesel::result::Error::NotFound => ApiError::NotFound("album"),
                other => other.into(),
            })
    })
    .await?;
    Ok(HttpResponse::Ok().json(album))
}

pub async fn create_album(
    pool: web::Data<DbPool>,
    payload: web::Json<NewAlbum>,
) -> Result<HttpResponse, ApiError> {
    let new_album = payload.into_inner();
    if new_album.title.trim().is_empty() {
        return Err(ApiError::Validation("missing title".to_string()));
    }

    let id = db::with_conn(pool.get_ref().clone(), move |conn| {
        let id = diesel::insert_into(albums::table)
            .values(&new_album)
            .returning(albums::id)
            .get_result::<i32>(conn)?;
        Ok(id)
    })
    .await?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

pub async fn update_album(
    pool: web::Data<DbPool>,
    album_id: web::Path<i32>,
    payload: web::Json<UpdateAlbum>,
) -> Result<HttpResponse, ApiError> {
    let album_id = album_id.into_inner();
    let update = payload.into_inner();
    if update.title.trim().is_empty() {
        return Err(ApiError::Validation("missing title".to_string()));
    }

    db::with_conn(pool.get_ref().clone(), move |conn| {
        let affected = diesel::update(albums::table.find(album_id))
            .set((
                albums::title.eq(update.title),
                albums::release_year.eq(update.release_year),
            ))
            .execute(conn)?;
        if affected == 0 {
            return Err(ApiError::NotFound("album"));
        }
        Ok(())
    })
    .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Cascade: every song of the album goes through the full song delete
/// protocol so its audio file is cleaned up as well.
pub async fn delete_album(
    pool: web::Data<DbPool>,
    store: web::Data<BlobStore>,
    album_id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    lifecycle::delete_album(&pool, &store, album_id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
