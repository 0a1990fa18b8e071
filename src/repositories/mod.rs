pub mod approval_repository;
pub mod conflict_repository;
pub mod location_repository;
pub mod odometer_repository;
pub mod schedule_repository;
pub mod trip_repository;
pub mod user_repository;
pub mod vehicle_repository;
