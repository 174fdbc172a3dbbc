use chrono::NaiveDateTime;
use diesel::prelude::{AsChangeset, Insertable, QueryableByName};
use diesel::sql_types::{Bool, Integer, Nullable, Text, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Validated song metadata, ready for insert or full-overwrite update.
/// `treat_none_as_null` makes the update a replace, not a merge: clearing
/// duration or album_id really clears them.
#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::songs)]
#[diesel(treat_none_as_null = true)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub duration: Option<String>,
    pub album_id: Option<i32>,
}

/// Raw fields collected from a multipart request before validation.
#[derive(Debug, Default)]
pub struct SongForm {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub duration: Option<String>,
    pub album_id: Option<i32>,
}

impl SongForm {
    pub fn validate(self) -> Result<NewSong, ApiError> {
        let title = self
            .title
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Validation("missing title".to_string()))?;
        let artist = self
            .artist
            .filter(|a| !a.is_empty())
            .ok_or_else(|| ApiError::Validation("missing artist".to_string()))?;
        Ok(NewSong {
            title,
            artist,
            duration: self.duration,
            album_id: self.album_id,
        })
    }
}

/// Song row joined with its album and the per-user favorite flag, produced by
/// the raw-SQL list/get queries.
#[derive(QueryableByName, Serialize, Debug)]
pub struct SongWithAlbum {
    #[diesel(sql_type = Integer)]
    pub id: i32,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Text)]
    pub artist: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub duration: Option<String>,
    #[diesel(sql_type = Nullable<Integer>)]
    pub album_id: Option<i32>,
    #[diesel(sql_type = Nullable<Text>)]
    pub album_title: Option<String>,
    #[diesel(sql_type = Nullable<Integer>)]
    pub album_release_year: Option<i32>,
    #[diesel(sql_type = Bool)]
    #[serde(rename = "isFavorited")]
    pub is_favorited: bool,
    #[diesel(sql_type = Timestamp)]
    pub created_at: NaiveDateTime,
}

#[derive(Deserialize)]
pub struct SongListQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<i32>,
}
