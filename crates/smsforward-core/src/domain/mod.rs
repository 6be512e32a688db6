pub mod message;
pub mod phone;
pub mod region;
pub mod rule;

pub use message::{InboundMessage, OutgoingMessage};
pub use phone::{normalize, to_unified, to_visual, PhoneNumber, UnifiedNumber, VisualNumber};
pub use region::{Region, DEFAULT_REGION};
pub use rule::{ForwardRule, Source, SourceKind, SourcePattern, RULE_ID};
