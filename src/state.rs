//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::services::location_oracle::{
    HttpLocationOracle, StoredPositionOracle, VehicleLocationOracle,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub oracle: Arc<dyn VehicleLocationOracle>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        let oracle: Arc<dyn VehicleLocationOracle> = match &config.tracking_base_url {
            Some(url) => {
                log::info!("📡 Oráculo de posición: servicio de rastreo en {}", url);
                Arc::new(HttpLocationOracle::new(url.clone()))
            }
            None => {
                log::info!("📡 Oráculo de posición: últimas posiciones almacenadas");
                Arc::new(StoredPositionOracle)
            }
        };

        Self {
            pool,
            config,
            oracle,
        }
    }
}
