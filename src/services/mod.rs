pub mod approval_service;
pub mod approval_workflow;
pub mod availability;
pub mod conflict_detector;
pub mod conflict_graph;
pub mod events;
pub mod geo;
pub mod identity;
pub mod location_oracle;
pub mod schedule_instancer;
pub mod time_window;
pub mod trip_service;
