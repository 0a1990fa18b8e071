//! Grafo de conflictos entre viajes
//!
//! Relación no dirigida "estos viajes comparten un recorrido de
//! vehículo". Cada arista se persiste como una sola fila con el par
//! ordenado canónicamente, así la simetría vale por construcción y no
//! depende de dos escrituras independientes. Aquí viven las operaciones
//! puras sobre el grafo; la persistencia está en `conflict_repository`.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

/// Par canónico de una arista no dirigida: el UUID menor primero
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Componente conexa a la que pertenece `trip_id`, como recorrido BFS
/// sobre la lista de aristas. Incluye siempre al propio viaje.
pub fn component_of(trip_id: Uuid, edges: &[(Uuid, Uuid)]) -> HashSet<Uuid> {
    let mut adjacency: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (a, b) in edges {
        adjacency.entry(*a).or_default().push(*b);
        adjacency.entry(*b).or_default().push(*a);
    }

    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(trip_id);
    queue.push_back(trip_id);

    while let Some(current) = queue.pop_front() {
        if let Some(neighbors) = adjacency.get(&current) {
            for n in neighbors {
                if seen.insert(*n) {
                    queue.push_back(*n);
                }
            }
        }
    }

    seen
}

/// Datos mínimos para elegir el viaje principal de una componente
#[derive(Debug, Clone, Copy)]
pub struct TripStart {
    pub trip_id: Uuid,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
}

/// Viaje principal de una componente: el que sale primero; empates por
/// id para que la elección sea determinista. El viaje principal es el
/// dueño de la lectura de odómetro canónica de todo el recorrido.
pub fn main_trip(component: &[TripStart]) -> Option<Uuid> {
    component
        .iter()
        .min_by_key(|t| (t.start_date, t.start_time, t.trip_id))
        .map(|t| t.trip_id)
}
