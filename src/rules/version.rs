use std::fmt;
use std::str::FromStr;
use serde::Serialize;

/// Agent schema version a rule is qualified with, `major.minor.patch`.
///
/// Versions are matched against the schema being migrated *to*, not one
/// detected in the input: documents carry no version marker, so a rule
/// introduced in `1.4.0` runs whenever the target is `1.4.0` or newer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SchemaVersion {
    /// Newest schema the built-in migrations know about
    pub const LATEST: SchemaVersion = SchemaVersion::new(1, 36, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    /// Accepts `1.5`, `1.5.0` and `v1.5.0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let parts = digits
            .split('.')
            .map(|p| p.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| format!("invalid schema version: {}", s))?;

        match parts.as_slice() {
            [major, minor] => Ok(Self::new(*major, *minor, 0)),
            [major, minor, patch] => Ok(Self::new(*major, *minor, *patch)),
            _ => Err(format!("invalid schema version: {}", s)),
        }
    }
}
