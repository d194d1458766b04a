pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod rest;

use auth::token::TokenKeys;
use sqlx::sqlite::SqlitePool;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub keys: TokenKeys,
}
