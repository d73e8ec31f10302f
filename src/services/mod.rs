//! Services module
//!
//! Este módulo contiene la lógica de negocio del ciclo de vida de guías.
//! El motor de estados y las calculadoras son puros o trabajan dentro de
//! la unidad de trabajo del llamador; los servicios orquestan cada
//! operación completa (validar, escribir, confirmar, notificar).

pub mod assignment_service;
pub mod cancellation_service;
pub mod commission;
pub mod context;
pub mod courier_gateway;
pub mod guide_service;
pub mod incident_service;
pub mod lifecycle_engine;
pub mod notification_service;
pub mod penalty;

pub use assignment_service::AssignmentService;
pub use cancellation_service::CancellationService;
pub use context::ServiceContext;
pub use courier_gateway::CourierGateway;
pub use guide_service::{CreateGuide, GuideService};
pub use incident_service::{IncidentService, Resolution};
pub use notification_service::{HttpNotifier, LogNotifier, Notification, Notifier};
