//! Database bootstrap
//!
//! - [`pool`]: PostgreSQL connection pool with health check
//! - [`migrations`]: embedded schema migrations from `migrations/`
//!
//! # Example
//!
//! ```no_run
//! use teamtask_shared::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::new(std::env::var("DATABASE_URL")?)).await?;
//! run_migrations(&pool).await?;
//! # Ok(())
//! # }
//! ```

pub mod migrations;
pub mod pool;
