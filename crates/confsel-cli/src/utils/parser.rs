use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    MissingSeparator(String),

    #[error("Unsupported configuration key for --set: '{0}'")]
    UnknownKey(String),

    #[error("Invalid {expected} value for {key}: '{value}'")]
    InvalidValue {
        key: SetKey,
        value: String,
        expected: &'static str,
    },
}

/// Configuration keys that can be overridden with `--set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetKey {
    OutputFolder,
    NBest,
    Charge,
    Uhf,
    Solvent,
    Executable,
}

impl SetKey {
    pub const ALL: [SetKey; 6] = [
        SetKey::OutputFolder,
        SetKey::NBest,
        SetKey::Charge,
        SetKey::Uhf,
        SetKey::Solvent,
        SetKey::Executable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SetKey::OutputFolder => "output.folder",
            SetKey::NBest => "selection.n-best",
            SetKey::Charge => "chemistry.charge",
            SetKey::Uhf => "chemistry.uhf",
            SetKey::Solvent => "chemistry.solvent",
            SetKey::Executable => "optimizer.executable",
        }
    }
}

impl fmt::Display for SetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SetKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == key)
            .ok_or_else(|| ParseError::UnknownKey(key.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOverride {
    pub key: SetKey,
    pub value: String,
}

impl SetOverride {
    /// Parses the value as `T`, naming `expected` in the error.
    pub fn parse_value<T: FromStr>(&self, expected: &'static str) -> Result<T, ParseError> {
        self.value.trim().parse().map_err(|_| ParseError::InvalidValue {
            key: self.key,
            value: self.value.clone(),
            expected,
        })
    }
}

/// Splits a `KEY=VALUE` argument at the first `=`.
pub fn parse_set_value(raw: &str) -> Result<SetOverride, ParseError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| ParseError::MissingSeparator(raw.to_string()))?;
    Ok(SetOverride {
        key: key.parse()?,
        value: value.to_string(),
    })
}
