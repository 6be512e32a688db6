use crate::error::{RelayError, Result};
use crate::inbound::InboundEvent;
use crate::segments::Reassembler;
use serde::Serialize;
use smsforward_core::{
    ForwardEngine, ForwardFailure, ForwardOutcome, InboundMessage, ListenerControl, RuleStore,
    SmsTransport,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared on/off flag for the inbound listener. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct ListenerSwitch {
    running: Arc<AtomicBool>,
}

impl ListenerSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl ListenerControl for ListenerSwitch {
    fn start_listening(&self) {
        if !self.running.swap(true, Ordering::SeqCst) {
            info!("listener started");
        }
    }

    fn stop_listening(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("listener stopped");
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelayStats {
    pub received: usize,
    pub forwarded: usize,
    pub discarded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub paused: usize,
    /// The feed failed to read and the run stopped early.
    pub interrupted: bool,
}

/// Feeds inbound events through the engine one at a time, in arrival order.
pub struct Relay<'a, S, T> {
    engine: &'a ForwardEngine<'a, S, T>,
    switch: &'a ListenerSwitch,
    reassembler: Reassembler,
}

impl<'a, S, T> Relay<'a, S, T>
where
    S: RuleStore,
    T: SmsTransport,
{
    pub fn new(engine: &'a ForwardEngine<'a, S, T>, switch: &'a ListenerSwitch) -> Self {
        Self {
            engine,
            switch,
            reassembler: Reassembler::default(),
        }
    }

    pub fn with_reassembler(mut self, reassembler: Reassembler) -> Self {
        self.reassembler = reassembler;
        self
    }

    /// Drains `events`. Lines that do not parse and malformed segments are
    /// skipped; a read error from the feed stops the run. Events arriving
    /// while the switch is off are dropped. `on_failure` is
    /// called for every message whose forward failed.
    pub fn run<I, F>(&mut self, events: I, mut on_failure: F) -> RelayStats
    where
        I: IntoIterator<Item = Result<InboundEvent>>,
        F: FnMut(&InboundMessage, &ForwardFailure),
    {
        let mut stats = RelayStats::default();
        for event in events {
            let event = match event {
                Err(RelayError::Io(err)) => {
                    error!(error = %err, "inbound feed failed");
                    stats.interrupted = true;
                    break;
                }
                event => event,
            };
            stats.received += 1;
            let event = match event {
                Ok(event) => event,
                Err(err) => {
                    warn!(error = %err, "skipping inbound event");
                    stats.skipped += 1;
                    continue;
                }
            };
            if !self.switch.is_running() {
                stats.paused += 1;
                continue;
            }
            let message = match self.reassembler.push(event) {
                Ok(Some(message)) => message,
                Ok(None) => continue,
                Err(err) => {
                    warn!(error = %err, "skipping inbound segment");
                    stats.skipped += 1;
                    continue;
                }
            };
            match self.engine.handle(&message) {
                ForwardOutcome::Forwarded(_) => stats.forwarded += 1,
                ForwardOutcome::Discarded(_) => stats.discarded += 1,
                ForwardOutcome::Failed(failure) => {
                    stats.failed += 1;
                    on_failure(&message, &failure);
                }
            }
        }
        stats
    }
}
