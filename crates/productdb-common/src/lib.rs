pub mod error;
pub mod notification;
pub mod settings;
pub mod status;
pub mod util;
pub mod worker;

pub use error::{error_response, ErrorDetail, ErrorResponse};
pub use notification::{MessageType, NewNotification, NotificationMessage};
pub use settings::{AppSettings, SettingsError, SettingsProvider, SettingsUpdate};
pub use status::StatusReport;
pub use worker::WorkerState;

pub mod auth;
pub mod telemetry;
