use phonenumber::country;
use std::fmt;

/// Territory used to resolve numbers written without a country code.
///
/// Holds the ISO 3166 alpha-2 code only; dialing rules and formats come from
/// the libphonenumber metadata shipped with the `phonenumber` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    code: [u8; 2],
}

pub const DEFAULT_REGION: &str = "US";

impl Region {
    /// Looks up a region by its ISO 3166 alpha-2 code, ignoring case.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_uppercase();
        let bytes: [u8; 2] = code.as_bytes().try_into().ok()?;
        if !bytes.iter().all(u8::is_ascii_uppercase) {
            return None;
        }
        code.parse::<country::Id>().ok()?;
        Some(Self { code: bytes })
    }

    /// Extracts the territory from a POSIX locale such as `fr_FR.UTF-8` or `en-GB`.
    pub fn from_locale(locale: &str) -> Option<Self> {
        let base = locale
            .split(['.', '@'])
            .next()
            .unwrap_or_default()
            .trim();
        let (_, territory) = base.split_once(['_', '-'])?;
        Self::from_code(territory)
    }

    pub fn code(&self) -> &str {
        std::str::from_utf8(&self.code).unwrap_or_default()
    }

    pub(crate) fn country(&self) -> Option<country::Id> {
        self.code().parse().ok()
    }
}

impl Default for Region {
    fn default() -> Self {
        Self {
            code: *b"US",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
