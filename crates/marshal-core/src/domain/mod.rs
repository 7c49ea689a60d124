//! Domain model (statuses, applications, messages, errors).

pub mod application;
pub mod command;
pub mod errors;
pub mod ids;
pub mod message;
pub mod status;

pub use application::{Application, EnvVar, Unit};
pub use command::RenderedCommand;
pub use errors::{DispatchError, ErrorKind};
pub use ids::MessageId;
pub use message::{ActionMessage, ActionName, Delivery};
pub use status::{Status, StatusParseError, all_started};
