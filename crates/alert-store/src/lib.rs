//! SQLite persistence for the emergency alert pipeline.
//!
//! This crate provides async database operations for emergency contacts,
//! message templates, and alert history using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use alert_core::Contact;
//! use alert_store::{contact, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:alerts.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Store a contact
//!     let alice = Contact::new("Alice", "+15550001111", "Family", 1);
//!     contact::upsert_contact(db.pool(), &alice).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod alert_log;
pub mod contact;
pub mod error;
pub mod models;
pub mod template;
pub mod validation;

pub use alert_log::SqliteAlertStore;
pub use error::{DatabaseError, Result};
pub use models::{AlertRow, ContactRow, TemplateRow};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Default pool size for database connections.
const DEFAULT_POOL_SIZE: u32 = 5;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `sqlite::memory:` for an in-memory database (tests).
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, DEFAULT_POOL_SIZE).await
    }

    /// Connect with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// Call once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
