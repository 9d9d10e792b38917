use std::fmt;
use std::str::FromStr;

use base64::{
    alphabet,
    engine::{self, general_purpose},
    Engine as _,
};
use rand::RngCore;

use regex::Regex;

lazy_static::lazy_static! {
    // Base64 serialization engine
    static ref BASE64_ENGINE: engine::GeneralPurpose =
        engine::GeneralPurpose::new(&alphabet::URL_SAFE, general_purpose::NO_PAD);
    // Regex for checking token strings
    static ref TOKEN_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{43}$").unwrap();
}

const TOKEN_BYTES: usize = 32;

/// A single-use subscription verification token: 32 random bytes,
/// url-safe base64, unique per issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken(String);

impl VerificationToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);

        Self(BASE64_ENGINE.encode(bytes))
    }
}

impl FromStr for VerificationToken {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if !TOKEN_REGEX.is_match(value) {
            return Err("Token is of invalid format".into());
        }
        Ok(Self(value.to_string()))
    }
}

impl AsRef<str> for VerificationToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
