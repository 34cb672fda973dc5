use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub mod api;
pub mod config;
pub mod ids;
pub mod reconcile;
pub mod record;
pub mod sanitize;
pub mod schema;
pub mod state;
pub mod store;
pub mod tournaments;
pub mod util_resp;
pub mod validation;

#[cfg(test)]
mod test;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
