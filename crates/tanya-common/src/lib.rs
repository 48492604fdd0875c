pub mod errors;
pub mod events;
pub mod types;

pub use errors::TanyaError;
pub use events::{EventBus, SessionEvent};
pub use types::{Attachment, Message, Phase, Role};

pub type Result<T> = std::result::Result<T, TanyaError>;
