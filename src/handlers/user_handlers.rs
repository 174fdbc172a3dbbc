use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::db::{self, DbPool};
use crate::error::ApiError;
use crate::models::user_models::{LoginRequest, NewUser, UpdateUser, User, UserResponse};
use crate::schema::{favorites, users};
use crate::utils::auth_utils;

pub async fn list_users(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let list = db::with_conn(pool.get_ref().clone(), |conn| {
        let rows = users::table.select(User::as_select()).load::<User>(conn)?;
        Ok(rows)
    })
    .await?;
    let list: Vec<UserResponse> = list.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(list))
}

pub async fn get_user(
    pool: web::Data<DbPool>,
    user_id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let user_id = user_id.into_inner();
    let user = db::with_conn(pool.get_ref().clone(), move |conn| {
        users::table
            .find(user_id)
            .select(User::as_select())
            .first::<User>(conn)
            .map_err(|err| match err {
                DieselError::NotFound => ApiError::NotFound("user"),
                other => other.into(),
            })
    })
    .await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

pub async fn create_user(
    pool: web::Data<DbPool>,
    payload: web::Json<NewUser>,
) -> Result<HttpResponse, ApiError> {
    let new_user = payload.into_inner();
    if new_user.name.trim().is_empty()
        || new_user.email.trim().is_empty()
        || new_user.password.is_empty()
    {
        return Err(ApiError::Validation("missing fields".to_string()));
    }

    let id = db::with_conn(pool.get_ref().clone(), move |conn| {
        diesel::insert_into(users::table)
            .values(&new_user)
            .returning(users::id)
            .get_result::<i32>(conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    ApiError::Conflict("name or email already exists".to_string())
                }
                other => other.into(),
            })
    })
    .await?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

pub async fn update_user(
    pool: web::Data<DbPool>,
    user_id: web::Path<i32>,
    payload: web::Json<UpdateUser>,
) -> Result<HttpResponse, ApiError> {
    let user_id = user_id.into_inner();
    let update = payload.into_inner();

    db::with_conn(pool.get_ref().clone(), move |conn| {
        let affected = diesel::update(users::table.find(user_id))
            .set((
                users::name.eq(update.name),
                users::email.eq(update.email),
                users::password.eq(update.password),
            ))
            .execute(conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    ApiError::Conflict("name or email already exists".to_string())
                }
                other => other.into(),
            })?;
        if affected == 0 {
            return Err(ApiError::NotFound("user"));
        }
        Ok(())
    })
    .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Removing a user also removes their favorites, in one transaction.
pub async fn delete_user(
    pool: web::Data<DbPool>,
    user_id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let user_id = user_id.into_inner();
    db::with_conn(pool.get_ref().clone(), move |conn| {
        conn.transaction(|conn| {
            diesel::delete(favorites::table.filter(favorites::user_id.eq(user_id)))
                .execute(conn)?;
            let affected = diesel::delete(users::table.find(user_id)).execute(conn)?;
            if affected == 0 {
                return Err(ApiError::NotFound("user"));
            }
            Ok(())
        })
    })
    .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn login(
    pool: web::Data<DbPool>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = payload.into_inner();
    if request.name.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::Validation("missing name or password".to_string()));
    }

    let name = request.name.clone();
    let user = db::with_conn(pool.get_ref().clone(), move |conn| {
        let user = users::table
            .filter(users::name.eq(&name))
            .select(User::as_select())
            .first::<User>(conn)
            .optional()?;
        Ok(user)
    })
    .await?;

    match user {
        Some(user) if auth_utils::verify_password(&user.password, &request.password) => {
            Ok(HttpResponse::Ok().json(UserResponse::from(user)))
        }
        _ => Ok(HttpResponse::Unauthorized()
            .json(serde_json::json!({ "error": "invalid name or password" }))),
    }
}
