pub mod matching;
pub mod state;

pub use matching::{compose_body, decide, Decision, DiscardReason};
pub use state::RedirectState;
