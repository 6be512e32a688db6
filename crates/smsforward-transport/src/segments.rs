use crate::error::{RelayError, Result};
use crate::inbound::InboundEvent;
use smsforward_core::InboundMessage;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

pub const DEFAULT_PENDING_CAPACITY: usize = 64;

#[derive(Debug)]
struct Pending {
    parts: Vec<Option<String>>,
    received: usize,
}

/// Joins multi-part messages into one logical message before matching.
/// Groups are keyed by sender and reference; once `capacity` groups are
/// pending the oldest is dropped.
#[derive(Debug)]
pub struct Reassembler {
    capacity: usize,
    pending: HashMap<(String, u32), Pending>,
    order: VecDeque<(String, u32)>,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new(DEFAULT_PENDING_CAPACITY)
    }
}

impl Reassembler {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            pending: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Returns the complete message once every part has arrived.
    pub fn push(&mut self, event: InboundEvent) -> Result<Option<InboundMessage>> {
        if !event.is_segment() {
            return Ok(Some(InboundMessage::new(event.sender, event.body)));
        }

        let total = usize::from(event.parts.unwrap_or(1));
        let reference = event.reference.ok_or_else(|| {
            RelayError::InvalidSegment(format!("segment from {} has no reference", event.sender))
        })?;
        let part = match event.part {
            Some(part) if part >= 1 && usize::from(part) <= total => usize::from(part),
            other => {
                return Err(RelayError::InvalidSegment(format!(
                    "part {other:?} out of range for {total} parts"
                )))
            }
        };

        let key = (event.sender.clone(), reference);
        if !self.pending.contains_key(&key) {
            self.evict_if_full();
            self.order.push_back(key.clone());
            self.pending.insert(
                key.clone(),
                Pending {
                    parts: vec![None; total],
                    received: 0,
                },
            );
        }

        let Some(group) = self.pending.get_mut(&key) else {
            return Ok(None);
        };
        if group.parts.len() != total {
            return Err(RelayError::InvalidSegment(format!(
                "reference {reference} from {} changed part count",
                event.sender
            )));
        }
        let slot = &mut group.parts[part - 1];
        if slot.is_none() {
            group.received += 1;
        }
        *slot = Some(event.body);

        if group.received < total {
            return Ok(None);
        }

        let group = self.pending.remove(&key);
        self.order.retain(|entry| entry != &key);
        let body: String = group
            .map(|group| group.parts.into_iter().flatten().collect())
            .unwrap_or_default();
        Ok(Some(InboundMessage::new(key.0, body)))
    }

    fn evict_if_full(&mut self) {
        while self.pending.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if self.pending.remove(&oldest).is_some() {
                debug!(sender = %oldest.0, reference = oldest.1, "dropping incomplete message");
            }
        }
    }
}
