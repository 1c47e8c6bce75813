pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{ConfigError, RealtimeError, VenoError};
pub use events::{Event, EventBus};
pub use id::{new_correlation_id, new_id, AttemptId};
pub use types::Plan;

pub type Result<T> = std::result::Result<T, VenoError>;
