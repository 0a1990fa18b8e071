use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::services::conflict_graph;
use crate::utils::errors::AppError;

/// Almacén de aristas del grafo de conflictos. Cada arista no dirigida
/// es UNA fila con el par en orden canónico (trip_a < trip_b): ambos
/// sentidos de la relación se escriben y se borran en una sola
/// operación, nunca en dos escrituras independientes.
pub struct ConflictRepository {
    pool: PgPool,
}

impl ConflictRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Vincula dos viajes como parte del mismo recorrido de vehículo
    pub async fn link_tx(
        &self,
        tx: &mut PgConnection,
        trip_a: Uuid,
        trip_b: Uuid,
    ) -> Result<(), AppError> {
        if trip_a == trip_b {
            return Err(AppError::BadRequest(
                "A trip cannot conflict with itself".to_string(),
            ));
        }

        let (a, b) = conflict_graph::canonical_pair(trip_a, trip_b);
        sqlx::query(
            r#"
            INSERT INTO trip_conflicts (trip_a, trip_b, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (trip_a, trip_b) DO NOTHING
            "#,
        )
        .bind(a)
        .bind(b)
        .execute(tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error linking trips: {}", e)))?;

        Ok(())
    }

    /// Elimina todas las aristas que tocan al viaje (cancelación)
    pub async fn unlink_all_tx(
        &self,
        tx: &mut PgConnection,
        trip_id: Uuid,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM trip_conflicts WHERE trip_a = $1 OR trip_b = $1")
            .bind(trip_id)
            .execute(tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error unlinking trips: {}", e)))?;

        Ok(result.rows_affected())
    }

    /// Compañeros directos de un viaje en el grafo
    pub async fn partners_of(&self, trip_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
            "SELECT trip_a, trip_b FROM trip_conflicts WHERE trip_a = $1 OR trip_b = $1",
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error listing trip partners: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|(a, b)| if a == trip_id { b } else { a })
            .collect())
    }

    /// Aristas que tocan cualquiera de los viajes dados; usado por el
    /// recorrido de componentes conexas
    pub async fn edges_touching(&self, trip_ids: &[Uuid]) -> Result<Vec<(Uuid, Uuid)>, AppError> {
        let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
            "SELECT trip_a, trip_b FROM trip_conflicts WHERE trip_a = ANY($1) OR trip_b = ANY($1)",
        )
        .bind(trip_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error listing conflict edges: {}", e)))?;

        Ok(rows)
    }

    /// Componente conexa completa del viaje: expande la frontera con
    /// consultas sucesivas hasta el cierre transitivo
    pub async fn component_of(&self, trip_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let mut known: Vec<Uuid> = vec![trip_id];
        loop {
            let edges = self.edges_touching(&known).await?;
            let component = conflict_graph::component_of(trip_id, &edges);
            if component.len() == known.len() {
                let mut ids: Vec<Uuid> = component.into_iter().collect();
                ids.sort();
                return Ok(ids);
            }
            known = component.into_iter().collect();
        }
    }
}
