pub mod assistant;
pub mod clusters;
pub mod dashboard;
pub mod detail;
pub mod health;
