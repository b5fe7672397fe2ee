pub mod api;
pub mod config;
pub mod courier;
pub mod debug;
pub mod districts;
pub mod error;
pub mod leads;
pub mod models;
pub mod offline;
pub mod production;
pub mod schema;
pub mod search;
pub mod sessions;
pub mod trucks;
pub mod webhooks;

use diesel_migrations::{embed_migrations, EmbeddedMigrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
