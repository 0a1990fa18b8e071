//! Lookup de identidad
//!
//! Colaborador externo: el CRUD de usuarios y departamentos no vive en
//! este servicio, solo se consulta quién es el jefe de departamento de
//! un solicitante y la política de aprobación vigente.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::approval::ApprovalConfig;
use crate::utils::errors::{AppError, AppResult};

#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Jefe de departamento del usuario, si tiene departamento asignado
    async fn department_head_of(&self, user_id: Uuid) -> AppResult<Option<Uuid>>;
}

#[async_trait]
pub trait ApprovalConfigProvider: Send + Sync {
    /// Política de aprobación vigente
    async fn current(&self) -> AppResult<ApprovalConfig>;
}

/// Implementación sobre las tablas de usuarios/departamentos replicadas
pub struct PgIdentityLookup {
    pool: PgPool,
}

impl PgIdentityLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityLookup for PgIdentityLookup {
    async fn department_head_of(&self, user_id: Uuid) -> AppResult<Option<Uuid>> {
        let head: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT d.head_user_id
            FROM users u
            JOIN departments d ON d.id = u.department_id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error looking up department head: {}", e)))?;

        Ok(head.map(|h| h.0))
    }
}

/// Política de aprobación leída de la tabla approval_config
pub struct PgApprovalConfigProvider {
    pool: PgPool,
}

impl PgApprovalConfigProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApprovalConfigProvider for PgApprovalConfigProvider {
    async fn current(&self) -> AppResult<ApprovalConfig> {
        let config = sqlx::query_as::<_, ApprovalConfig>(
            "SELECT * FROM approval_config ORDER BY updated_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error loading approval config: {}", e)))?;

        config.ok_or_else(|| {
            AppError::Internal("No approval policy configured".to_string())
        })
    }
}
