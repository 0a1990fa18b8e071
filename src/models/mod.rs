pub mod approval;
pub mod location;
pub mod odometer;
pub mod schedule;
pub mod trip;
pub mod user;
pub mod vehicle;
