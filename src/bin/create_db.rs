//! Creates the InstaServe database on a Postgres server if it does not exist yet.
//!
//! `PG_ADMIN_CONN` is a libpq-style connection string for a maintenance database,
//! `DB_NAME` the database to create.

use tokio_postgres::NoTls;

const DEFAULT_ADMIN_CONN: &str = "host=127.0.0.1 user=postgres dbname=postgres";
const DEFAULT_DB_NAME: &str = "instaserve";

fn is_valid_database_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let conn_str = std::env::var("PG_ADMIN_CONN").unwrap_or_else(|_| DEFAULT_ADMIN_CONN.into());
    let db_name = std::env::var("DB_NAME").unwrap_or_else(|_| DEFAULT_DB_NAME.into());

    if !is_valid_database_name(&db_name) {
        log::error!("Refusing to create database: invalid name '{}'", db_name);
        return Err(format!("invalid database name '{db_name}'").into());
    }

    log::info!("Connecting to Postgres maintenance database");
    let (client, connection) = tokio_postgres::connect(&conn_str, NoTls).await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("connection error: {}", e);
        }
    });

    let existing = client
        .query_opt("SELECT 1 FROM pg_database WHERE datname = $1", &[&db_name])
        .await?;

    if existing.is_some() {
        log::info!("Database '{}' already exists", db_name);
        return Ok(());
    }

    client
        .execute(format!("CREATE DATABASE \"{}\"", db_name).as_str(), &[])
        .await?;
    log::info!(
        "Database '{}' created; run the API once to apply migrations",
        db_name
    );

    Ok(())
}
