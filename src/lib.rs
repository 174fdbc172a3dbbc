pub mod db;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod repo;
pub mod routes;
pub mod schema;
pub mod storage;
pub mod utils;
