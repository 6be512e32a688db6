pub mod command;
pub mod error;
pub mod http;
pub mod inbound;
pub mod outbox;
pub mod relay;
pub mod segments;

pub use command::CommandTransport;
pub use error::{RelayError, Result};
#[cfg(feature = "http-gateway")]
pub use http::HttpTransport;
pub use inbound::{InboundEvent, InboundReader};
pub use outbox::OutboxTransport;
pub use relay::{ListenerSwitch, Relay, RelayStats};
pub use segments::Reassembler;
