//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos del núcleo de guías y las
//! entidades de referencia que el núcleo solo consulta.

pub mod cancellation;
pub mod contract;
pub mod guide;
pub mod history;
pub mod incident;
pub mod loyalty;
pub mod user;

pub use cancellation::{Cancellation, CancellationInitiator, CancellationType, NewCancellation};
pub use contract::Contract;
pub use guide::{Guide, GuideState, NewGuide};
pub use history::{HistoryEntry, NewHistoryEntry};
pub use incident::{Incident, IncidentType, NewIncident};
pub use loyalty::LoyaltyLevel;
pub use user::{Business, User, UserRole};
