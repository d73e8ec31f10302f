pub mod guide_controller;
pub mod incident_controller;

pub use guide_controller::GuideController;
pub use incident_controller::IncidentController;
