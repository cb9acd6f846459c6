use std::{borrow::Cow, time::Duration};

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Connection, Executor, PgPool,
};

mod bookings;
mod catalog;
mod notifications;
mod payments;
mod providers;
mod reviews;
mod stats;
mod users;

pub use catalog::ServiceRemoval;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Some(Duration::from_secs(600)))
        .test_before_acquire(true)
}

impl Database {
    /// Opens the pool, creating the database first when the server reports
    /// it missing, then applies `migrations/`.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = match pool_options().connect(database_url).await {
            Ok(pool) => pool,
            Err(sqlx::Error::Database(db_err)) if db_err.code() == Some(Cow::Borrowed(UNDEFINED_DATABASE)) => {
                log::warn!("Target database does not exist yet");
                create_database_if_missing(database_url).await?;
                pool_options().connect(database_url).await?
            }
            Err(err) => return Err(err),
        };

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Pool that only connects on first use.
    #[cfg(test)]
    pub fn connect_lazy(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = pool_options().min_connections(0).connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    #[cfg(all(test, feature = "db-tests"))]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

const UNDEFINED_DATABASE: &str = "3D000";
const DUPLICATE_DATABASE: &str = "42P04";
const MAINTENANCE_DATABASE: &str = "postgres";

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Issues `CREATE DATABASE` for the database named in `database_url` through
/// the server's maintenance database. Losing a creation race is fine.
async fn create_database_if_missing(database_url: &str) -> Result<(), sqlx::Error> {
    let target: PgConnectOptions = database_url.parse()?;
    let Some(name) = target.get_database().map(str::to_owned) else {
        return Ok(());
    };
    if name.eq_ignore_ascii_case(MAINTENANCE_DATABASE) {
        return Ok(());
    }

    let mut admin =
        sqlx::postgres::PgConnection::connect_with(&target.clone().database(MAINTENANCE_DATABASE)).await?;
    let statement = format!("CREATE DATABASE {}", quote_identifier(&name));

    let outcome = match admin.execute(statement.as_str()).await {
        Ok(_) => {
            log::info!("Database {name} created");
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.code() == Some(Cow::Borrowed(DUPLICATE_DATABASE)) => {
            log::info!("Database {name} was created concurrently");
            Ok(())
        }
        Err(err) => Err(err),
    };

    admin.close().await?;
    outcome
}

#[cfg(all(test, feature = "db-tests"))]
pub(crate) mod tests;
