//! Eventos de dominio
//!
//! Los eventos se publican fire-and-forget para que el servicio externo
//! de notificaciones los entregue; este core no espera la entrega. El
//! publisher por defecto solo los deja en el log.

use serde::Serialize;
use uuid::Uuid;

/// Eventos que este core emite hacia el exterior
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    TripCreated { trip_id: Uuid, requester_id: Uuid },
    TripConfirmed { trip_id: Uuid },
    TripApproved { trip_id: Uuid },
    TripRejected { trip_id: Uuid, reason: Option<String> },
    TripCancelled { trip_id: Uuid, reason: Option<String> },
    VehicleAssigned { trip_id: Uuid, vehicle_id: Uuid },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::TripCreated { .. } => "trip.created",
            DomainEvent::TripConfirmed { .. } => "trip.confirmed",
            DomainEvent::TripApproved { .. } => "trip.approved",
            DomainEvent::TripRejected { .. } => "trip.rejected",
            DomainEvent::TripCancelled { .. } => "trip.cancelled",
            DomainEvent::VehicleAssigned { .. } => "vehicle.assigned",
        }
    }
}

pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

/// Publisher por defecto: registra el evento y sigue
pub struct LogEventPublisher;

impl EventPublisher for LogEventPublisher {
    fn publish(&self, event: DomainEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => log::info!("📣 Evento {}: {}", event.name(), payload),
            Err(e) => log::error!("❌ Error serializando evento {}: {}", event.name(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let e = DomainEvent::TripApproved { trip_id: Uuid::new_v4() };
        assert_eq!(e.name(), "trip.approved");

        let e = DomainEvent::VehicleAssigned {
            trip_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
        };
        assert_eq!(e.name(), "vehicle.assigned");
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let e = DomainEvent::TripCancelled {
            trip_id: Uuid::nil(),
            reason: Some("no driver".to_string()),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"type\":\"trip_cancelled\""));
        assert!(json.contains("no driver"));
    }
}
