pub mod album_models;
pub mod favorite_models;
pub mod song_models;
pub mod user_models;
