use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

// Each supply computation makes at most two queries.
const MAX_CONNECTIONS: u32 = 4;

pub fn get_db_url_with_name(db_url: &str, name: &str) -> String {
    let separator = if db_url.contains('?') { '&' } else { '?' };
    format!("{db_url}{separator}application_name={name}")
}

pub async fn get_db_pool(db_url: &str, name: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(&get_db_url_with_name(db_url, name))
        .await
        .context("failed to connect to the explorer database")
}
