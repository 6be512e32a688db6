use crate::domain::phone::{PhoneNumber, UnifiedNumber};
use crate::error::CoreError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the single persisted rule.
pub const RULE_ID: i64 = 1;

/// Sender pattern used in advanced mode. Always matched against the whole
/// sender string.
#[derive(Clone)]
pub struct SourcePattern {
    raw: String,
    compiled: Regex,
}

impl SourcePattern {
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CoreError::InvalidPattern("pattern is empty".to_string()));
        }
        let compiled = Regex::new(&format!("^(?:{raw})$"))
            .map_err(|err| CoreError::InvalidPattern(err.to_string()))?;
        Ok(Self {
            raw: raw.to_string(),
            compiled,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_match(&self, sender: &str) -> bool {
        self.compiled.is_match(sender.trim())
    }
}

impl PartialEq for SourcePattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for SourcePattern {}

impl fmt::Debug for SourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SourcePattern").field(&self.raw).finish()
    }
}

impl fmt::Display for SourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for SourcePattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for SourcePattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SourcePattern::new(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Literal,
    Pattern,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Literal => "literal",
            SourceKind::Pattern => "pattern",
        }
    }
}

/// Where forwarded messages must come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Source {
    Literal(PhoneNumber),
    Pattern(SourcePattern),
}

impl Source {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Literal(_) => SourceKind::Literal,
            Source::Pattern(_) => SourceKind::Pattern,
        }
    }

    /// Machine side of the source: the unified number or the pattern text.
    pub fn unified_text(&self) -> &str {
        match self {
            Source::Literal(number) => number.unified.as_str(),
            Source::Pattern(pattern) => pattern.as_str(),
        }
    }

    /// What the user sees; a pattern is echoed as typed.
    pub fn visual_text(&self) -> &str {
        match self {
            Source::Literal(number) => number.visual.as_str(),
            Source::Pattern(pattern) => pattern.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardRule {
    pub id: i64,
    pub source: Option<Source>,
    pub destination: Option<PhoneNumber>,
    pub activated: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ForwardRule {
    pub fn new(now: i64) -> Self {
        Self {
            id: RULE_ID,
            source: None,
            destination: None,
            activated: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.source.is_some() && self.destination.is_some()
    }

    pub fn destination_unified(&self) -> Option<&UnifiedNumber> {
        self.destination.as_ref().map(|number| &number.unified)
    }

    /// Checks the preconditions for arming the rule.
    pub fn validate_for_activation(&self) -> Result<(), CoreError> {
        let source = self.source.as_ref().ok_or(CoreError::EmptySource)?;
        let destination = self
            .destination
            .as_ref()
            .ok_or(CoreError::EmptyDestination)?;

        if source.unified_text() == destination.unified.as_str() {
            return Err(CoreError::SourceEqualsDestination);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ForwardRule, Source, SourcePattern};
    use crate::domain::phone::normalize;
    use crate::domain::region::Region;
    use crate::error::CoreError;

    fn literal(raw: &str) -> Source {
        Source::Literal(normalize(raw, &Region::default()).unwrap())
    }

    #[test]
    fn pattern_matches_full_sender() {
        let pattern = SourcePattern::new(r"^\+1202.*").unwrap();
        assert!(pattern.is_match("+12025550143"));
        assert!(!pattern.is_match("+14045551234"));

        let partial = SourcePattern::new("555").unwrap();
        assert!(!partial.is_match("+12025550143"));
        let explicit = SourcePattern::new(".*555.*").unwrap();
        assert!(explicit.is_match("+12025550143"));
    }

    #[test]
    fn pattern_rejects_empty_and_invalid_regex() {
        assert!(matches!(
            SourcePattern::new("  "),
            Err(CoreError::InvalidPattern(_))
        ));
        assert!(matches!(
            SourcePattern::new("(unclosed"),
            Err(CoreError::InvalidPattern(_))
        ));
    }

    #[test]
    fn alternation_stays_anchored() {
        let pattern = SourcePattern::new("BANK|INFO").unwrap();
        assert!(pattern.is_match("BANK"));
        assert!(!pattern.is_match("MYBANK"));
    }

    #[test]
    fn activation_requires_both_fields() {
        let mut rule = ForwardRule::new(0);
        assert_eq!(rule.validate_for_activation(), Err(CoreError::EmptySource));
        rule.source = Some(literal("+12025550143"));
        assert_eq!(
            rule.validate_for_activation(),
            Err(CoreError::EmptyDestination)
        );
        rule.destination = Some(normalize("+12025550187", &Region::default()).unwrap());
        assert_eq!(rule.validate_for_activation(), Ok(()));
    }

    #[test]
    fn activation_rejects_same_number_in_other_format() {
        let mut rule = ForwardRule::new(0);
        rule.source = Some(literal("(202) 555-0143"));
        rule.destination = Some(normalize("+1 202 555 0143", &Region::default()).unwrap());
        assert_eq!(
            rule.validate_for_activation(),
            Err(CoreError::SourceEqualsDestination)
        );
    }

    #[test]
    fn source_serializes_with_kind_tag() {
        let json = serde_json::to_value(Source::Pattern(SourcePattern::new("^BANK$").unwrap()))
            .unwrap();
        assert_eq!(json["kind"], "pattern");
        assert_eq!(json["value"], "^BANK$");
    }
}
