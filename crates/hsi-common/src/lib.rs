pub mod errors;
pub mod frame;
pub mod id;

pub use errors::{ConfigError, DeliveryError, HsiError, SourceError};
pub use frame::{Frame, Label, Payload, PayloadMode};
pub use id::{new_id, ClientId};

pub type Result<T> = std::result::Result<T, HsiError>;
