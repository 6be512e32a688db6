pub mod controller;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;
pub mod rules;

pub use controller::RedirectController;
pub use domain::*;
pub use engine::{ForwardEngine, ForwardFailure, ForwardOutcome};
pub use error::{CoreError, TransportError};
pub use ports::{ListenerControl, MemoryRuleStore, NoopListener, RuleStore, SmsTransport};
pub use rules::*;
