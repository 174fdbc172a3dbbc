pub mod album_routes;
pub mod favorite_routes;
pub mod song_routes;
pub mod user_routes;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    album_routes::configure(cfg);
    favorite_routes::configure(cfg);
    song_routes::configure(cfg);
    user_routes::configure(cfg);
}
