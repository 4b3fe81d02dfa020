pub mod catalog;
pub mod client;
pub mod clock;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod errors;
pub mod models;
pub mod session;
pub mod ui;
pub mod variant;

pub use catalog::{GameCatalog, GameVariant};
pub use client::{ApiError, DashboardClient, GamesClient};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ClientConfig;
pub use controller::{ActionOutcome, SessionController, SessionEvent};
pub use errors::GameError;
pub use session::{GameSession, Metrics, SessionSnapshot, SessionStatus};
pub use variant::VariantKind;
