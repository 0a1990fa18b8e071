use anyhow::Result;
use axum::{middleware::from_fn_with_state, response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use fleet_scheduling::config::environment::EnvironmentConfig;
use fleet_scheduling::database;
use fleet_scheduling::middleware::auth::auth_middleware;
use fleet_scheduling::middleware::cors::cors_middleware;
use fleet_scheduling::routes;
use fleet_scheduling::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚐 Fleet Scheduling - Servicio de viajes compartidos");
    info!("====================================================");

    // Inicializar base de datos
    let pool = match database::create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    let config = EnvironmentConfig::default();
    let app_state = AppState::new(pool, config.clone());

    // Rutas protegidas por el middleware de identidad
    let api = Router::new()
        .nest("/trip", routes::trip_routes::create_trip_router())
        .nest("/vehicle", routes::vehicle_routes::create_vehicle_router())
        .layer(from_fn_with_state(app_state.clone(), auth_middleware));

    let app = Router::new()
        .route("/health", get(health_endpoint))
        .nest("/api", api)
        .layer(cors_middleware())
        .with_state(app_state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🧾 Endpoints - Trip:");
    info!("   POST /api/trip - Crear viaje (con instancias programadas)");
    info!("   GET  /api/trip - Listar viajes del solicitante");
    info!("   GET  /api/trip/:id - Obtener viaje");
    info!("   POST /api/trip/:id/cancel - Cancelar viaje");
    info!("   POST /api/trip/:id/approval - Registrar decisión de aprobación");
    info!("   GET  /api/trip/:id/approval - Obtener approval del viaje");
    info!("   POST /api/trip/:id/odometer - Registrar lectura de odómetro");
    info!("   POST /api/trip/:id/assign-vehicle - Asignar vehículo");
    info!("   POST /api/trip/:id/link/:other_id - Vincular viajes compartidos");
    info!("🚐 Endpoints - Vehicle:");
    info!("   GET  /api/vehicle - Listar vehículos activos");
    info!("   POST /api/vehicle/availability - Ranking de disponibilidad");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Endpoint de health check
async fn health_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "service": "fleet-scheduling",
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
