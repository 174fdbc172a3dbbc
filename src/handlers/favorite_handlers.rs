use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::db::{self, DbPool};
use crate::error::ApiError;
use crate::models::favorite_models::{Favorite, NewFavorite};
use crate::schema::favorites;

pub async fn list_favorites(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let list = db::with_conn(pool.get_ref().clone(), |conn| {
        let rows = favorites::table.load::<Favorite>(conn)?;
        Ok(rows)
    })
    .await?;
    Ok(HttpResponse::Ok().json(list))
}

pub async fn get_favorite(
    pool: web::Data<DbPool>,
    favorite_id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let favorite_id = favorite_id.into_inner();
    let favorite = db::with_conn(pool.get_ref().clone(), move |conn| {
        favorites::table
            .find(favorite_id)
            .first::<Favorite>(conn)
            .map_err(|err| match err {
                DieselError::NotFound => ApiError::NotFound("favorite"),
                other => other.into(),
            })
    })
    .await?;
    Ok(HttpResponse::Ok().json(favorite))
}

pub async fn add_favorite(
    pool: web::Data<DbPool>,
    payload: web::Json<NewFavorite>,
) -> Result<HttpResponse, ApiError> {
    let new_favorite = payload.into_inner();
    let id = db::with_conn(pool.get_ref().clone(), move |conn| {
        diesel::insert_into(favorites::table)
            .values(&new_favorite)
            .returning(favorites::id)
            .get_result::<i32>(conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    ApiError::Conflict("song is already a favorite".to_string())
                }
                other => other.into(),
            })
    })
    .await?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

pub async fn remove_favorite(
    pool: web::Data<DbPool>,
    favorite_id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let favorite_id = favorite_id.into_inner();
    db::with_conn(pool.get_ref().clone(), move |conn| {
        let affected =
            diesel::delete(favorites::table.find(favorite_id)).execute(conn)?;
        if affected == 0 {
            return Err(ApiError::NotFound("favorite"));
        }
        Ok(())
    })
    .await?;
    Ok(HttpResponse::NoContent().finish())
}
