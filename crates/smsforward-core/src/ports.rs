use crate::domain::{ForwardRule, OutgoingMessage};
use crate::error::TransportError;
use std::convert::Infallible;
use std::sync::{Mutex, PoisonError};

/// Persistence for the single forwarding rule. Implementations keep at most
/// one row; `upsert` replaces whatever is stored under the rule's id.
pub trait RuleStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get(&self) -> Result<Option<ForwardRule>, Self::Error>;
    fn upsert(&self, rule: &ForwardRule) -> Result<i64, Self::Error>;
    fn delete_by_id(&self, id: i64) -> Result<usize, Self::Error>;
    fn count(&self) -> Result<i64, Self::Error>;
}

/// Outbound send primitive.
pub trait SmsTransport {
    fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError>;
}

/// Starts and stops whatever delivers inbound messages to the engine.
pub trait ListenerControl {
    fn start_listening(&self);
    fn stop_listening(&self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl ListenerControl for NoopListener {
    fn start_listening(&self) {}
    fn stop_listening(&self) {}
}

#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rule: Mutex<Option<ForwardRule>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(rule: ForwardRule) -> Self {
        Self {
            rule: Mutex::new(Some(rule)),
        }
    }
}

impl RuleStore for MemoryRuleStore {
    type Error = Infallible;

    fn get(&self) -> Result<Option<ForwardRule>, Self::Error> {
        Ok(self
            .rule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn upsert(&self, rule: &ForwardRule) -> Result<i64, Self::Error> {
        *self.rule.lock().unwrap_or_else(PoisonError::into_inner) = Some(rule.clone());
        Ok(rule.id)
    }

    fn delete_by_id(&self, id: i64) -> Result<usize, Self::Error> {
        let mut slot = self.rule.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(rule) if rule.id == id => {
                *slot = None;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    fn count(&self) -> Result<i64, Self::Error> {
        Ok(self
            .rule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some() as i64)
    }
}
