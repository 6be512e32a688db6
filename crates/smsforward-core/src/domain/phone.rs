use crate::domain::region::Region;
use crate::error::CoreError;
use phonenumber::Mode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// E.164 form (`+<calling code><national number>`), comparable across input formats.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnifiedNumber(String);

impl UnifiedNumber {
    /// Wraps a value previously produced by [`to_unified`], e.g. when reading it back from storage.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnifiedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisualNumber(String);

impl VisualNumber {
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisualNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Both renderings of one dialable number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub unified: UnifiedNumber,
    pub visual: VisualNumber,
}

pub fn to_unified(raw: &str, region: &Region) -> Result<UnifiedNumber, CoreError> {
    Ok(unified(&parse(raw, region)?))
}

pub fn to_visual(raw: &str, region: &Region) -> Result<VisualNumber, CoreError> {
    Ok(visual(&parse(raw, region)?, region))
}

pub fn normalize(raw: &str, region: &Region) -> Result<PhoneNumber, CoreError> {
    let number = parse(raw, region)?;
    Ok(PhoneNumber {
        unified: unified(&number),
        visual: visual(&number, region),
    })
}

fn parse(raw: &str, region: &Region) -> Result<phonenumber::PhoneNumber, CoreError> {
    let trimmed = raw.trim();
    let invalid = || CoreError::InvalidNumber(trimmed.to_string());
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let number = phonenumber::parse(region.country(), trimmed).map_err(|_| invalid())?;
    // A merely possible number may print nationally as something that dials
    // elsewhere (e.g. a national part starting with the trunk or exit code).
    if !phonenumber::is_valid(&number) {
        return Err(invalid());
    }
    Ok(number)
}

fn unified(number: &phonenumber::PhoneNumber) -> UnifiedNumber {
    UnifiedNumber(number.format().mode(Mode::E164).to_string())
}

fn visual(number: &phonenumber::PhoneNumber, region: &Region) -> VisualNumber {
    let mode = if number.country().id() == region.country() {
        Mode::National
    } else {
        Mode::International
    };
    VisualNumber(number.format().mode(mode).to_string())
}
