//! Configuración de conexión a PostgreSQL

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Crear un pool de conexiones a la base de datos
pub async fn create_pool(database_url: Option<&str>) -> Result<PgPool> {
    let database_url = match database_url {
        Some(url) => url.to_string(),
        None => std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set in environment variables"),
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    Ok(pool)
}
