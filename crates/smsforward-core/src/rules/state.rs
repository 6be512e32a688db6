use crate::domain::ForwardRule;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Presentation state of the forwarding switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectState {
    /// Nothing to arm yet: no rule, or a rule missing a field.
    Disabled,
    /// Both fields set, ready to activate.
    Enabled,
    Armed,
}

impl RedirectState {
    pub fn of(rule: Option<&ForwardRule>) -> Self {
        match rule {
            None => RedirectState::Disabled,
            Some(rule) if rule.activated => RedirectState::Armed,
            Some(rule) if rule.is_complete() => RedirectState::Enabled,
            Some(_) => RedirectState::Disabled,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectState::Disabled => "disabled",
            RedirectState::Enabled => "enabled",
            RedirectState::Armed => "armed",
        }
    }
}

impl fmt::Display for RedirectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::RedirectState;
    use crate::domain::{normalize, ForwardRule, Region, Source};

    #[test]
    fn state_follows_rule_fields() {
        let region = Region::default();
        assert_eq!(RedirectState::of(None), RedirectState::Disabled);

        let mut rule = ForwardRule::new(0);
        assert_eq!(RedirectState::of(Some(&rule)), RedirectState::Disabled);

        rule.source = Some(Source::Literal(normalize("2025550143", &region).unwrap()));
        assert_eq!(RedirectState::of(Some(&rule)), RedirectState::Disabled);

        rule.destination = Some(normalize("2025550187", &region).unwrap());
        assert_eq!(RedirectState::of(Some(&rule)), RedirectState::Enabled);

        rule.activated = true;
        assert_eq!(RedirectState::of(Some(&rule)), RedirectState::Armed);
    }
}
