use std::fmt;
use std::str::FromStr;

use chrono::Duration;

/// How often a digest-mode author is due for an automatic send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl DigestFrequency {
    /// Minimum elapsed time since the last send before the next one is due
    pub fn threshold(&self) -> Duration {
        match self {
            Self::Daily => Duration::hours(24),
            Self::Weekly => Duration::hours(24 * 7),
            Self::Monthly => Duration::hours(24 * 30),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl FromStr for DigestFrequency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(format!("{} is not a valid digest frequency", other)),
        }
    }
}

impl fmt::Display for DigestFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an author's newsletter goes out per-post or as a batched digest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    Immediate,
    Digest,
}

impl SendMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Immediate => "immediate",
            Self::Digest => "digest",
        }
    }
}

impl FromStr for SendMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "immediate" => Ok(Self::Immediate),
            "digest" => Ok(Self::Digest),
            other => Err(format!("{} is not a valid send mode", other)),
        }
    }
}

impl fmt::Display for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
