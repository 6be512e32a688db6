use crate::domain::{InboundMessage, OutgoingMessage, Region, UnifiedNumber};
use crate::error::{CoreError, TransportError};
use crate::ports::{RuleStore, SmsTransport};
use crate::rules::{decide, Decision, DiscardReason};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ForwardFailure {
    #[error("could not read forwarding rule: {0}")]
    Store(String),
    #[error("could not send forwarded message: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Debug)]
pub enum ForwardOutcome {
    Forwarded(OutgoingMessage),
    Discarded(DiscardReason),
    Failed(ForwardFailure),
}

/// Applies the stored rule to inbound messages and sends the copies.
pub struct ForwardEngine<'a, S, T> {
    store: &'a S,
    transport: &'a T,
    region: Region,
    own_number: Option<UnifiedNumber>,
}

impl<'a, S, T> ForwardEngine<'a, S, T>
where
    S: RuleStore,
    T: SmsTransport,
{
    pub fn new(store: &'a S, transport: &'a T, region: Region) -> Self {
        Self {
            store,
            transport,
            region,
            own_number: None,
        }
    }

    /// Number this device sends from; messages from it are never forwarded.
    pub fn with_own_number(mut self, own_number: Option<UnifiedNumber>) -> Self {
        self.own_number = own_number;
        self
    }

    /// Reports what `handle` would do without sending anything.
    pub fn preview(&self, message: &InboundMessage) -> Result<Decision, CoreError> {
        let rule = self.store.get().map_err(CoreError::store)?;
        Ok(decide(
            message,
            rule.as_ref(),
            &self.region,
            self.own_number.as_ref(),
        ))
    }

    /// Processes one message to completion. The rule is read once; failures
    /// are returned, never retried.
    pub fn handle(&self, message: &InboundMessage) -> ForwardOutcome {
        let rule = match self.store.get() {
            Ok(rule) => rule,
            Err(err) => {
                warn!(error = %err, "rule lookup failed");
                return ForwardOutcome::Failed(ForwardFailure::Store(err.to_string()));
            }
        };

        let decision = decide(
            message,
            rule.as_ref(),
            &self.region,
            self.own_number.as_ref(),
        );
        match decision {
            Decision::Discard(reason) => {
                debug!(sender = %message.sender, reason = reason.as_str(), "message discarded");
                ForwardOutcome::Discarded(reason)
            }
            Decision::Forward(outgoing) => match self.transport.send(&outgoing) {
                Ok(()) => {
                    info!(sender = %message.sender, to = %outgoing.to, "message forwarded");
                    ForwardOutcome::Forwarded(outgoing)
                }
                Err(err) => {
                    warn!(sender = %message.sender, to = %outgoing.to, error = %err, "forward failed");
                    ForwardOutcome::Failed(ForwardFailure::Transport(err))
                }
            },
        }
    }
}
