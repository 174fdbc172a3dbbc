use chrono::NaiveDateTime;
use diesel::prelude::{Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};

#[derive(Queryable, Selectable, Serialize, Debug)]
#[diesel(table_name = crate::schema::albums)]
pub struct Album {
    pub id: i32,
    pub title: String,
    pub release_year: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Deserialize, Debug)]
#[diesel(table_name = crate::schema::albums)]
pub struct NewAlbum {
    pub title: String,
    pub release_year: Option<i32>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateAlbum {
    pub title: String,
    pub release_year: Option<i32>,
}
