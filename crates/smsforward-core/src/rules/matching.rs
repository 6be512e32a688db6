use crate::domain::{
    normalize, ForwardRule, InboundMessage, OutgoingMessage, PhoneNumber, Region, Source,
    UnifiedNumber,
};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    NoActiveRule,
    NoMatch,
    SenderIsDestination,
    SenderIsSelf,
}

impl DiscardReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscardReason::NoActiveRule => "no active rule",
            DiscardReason::NoMatch => "sender does not match source",
            DiscardReason::SenderIsDestination => "sender is the destination",
            DiscardReason::SenderIsSelf => "sender is this device",
        }
    }
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Forward(OutgoingMessage),
    Discard(DiscardReason),
}

/// Decides what to do with one inbound message given a rule snapshot.
pub fn decide(
    message: &InboundMessage,
    rule: Option<&ForwardRule>,
    region: &Region,
    own_number: Option<&UnifiedNumber>,
) -> Decision {
    let Some(rule) = rule.filter(|rule| rule.activated) else {
        return Decision::Discard(DiscardReason::NoActiveRule);
    };
    let (Some(source), Some(destination)) = (rule.source.as_ref(), rule.destination.as_ref())
    else {
        return Decision::Discard(DiscardReason::NoActiveRule);
    };

    let raw_sender = message.sender.trim();
    let sender = normalize(raw_sender, region).ok();
    let sender_unified = sender.as_ref().map(|number| &number.unified);

    let matched = match source {
        Source::Literal(number) => sender_unified == Some(&number.unified),
        Source::Pattern(pattern) => pattern.is_match(raw_sender),
    };
    if !matched {
        return Decision::Discard(DiscardReason::NoMatch);
    }

    if sender_unified == Some(&destination.unified) || raw_sender == destination.unified.as_str()
    {
        return Decision::Discard(DiscardReason::SenderIsDestination);
    }
    if own_number.is_some() && sender_unified == own_number {
        return Decision::Discard(DiscardReason::SenderIsSelf);
    }

    let annotation = sender
        .as_ref()
        .map(|number: &PhoneNumber| number.visual.as_str())
        .unwrap_or(raw_sender);
    Decision::Forward(OutgoingMessage {
        to: destination.unified.clone(),
        body: compose_body(annotation, &message.body),
    })
}

/// Prefixes the original body with the sender; the body itself is copied unchanged.
pub fn compose_body(sender: &str, body: &str) -> String {
    let mut out = String::with_capacity(sender.len() + body.len() + 7);
    out.push_str("From ");
    out.push_str(sender);
    out.push_str(":\n");
    out.push_str(body);
    out
}
