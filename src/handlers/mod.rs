pub mod album_handlers;
pub mod favorite_handlers;
pub mod song_handlers;
pub mod user_handlers;
