use std::fmt;

/// Run-local job identifier.
///
/// Allocated monotonically by the orchestrator; a value is never handed out
/// twice within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct JobId(pub u64);

impl JobId {
    pub fn new(value: u64) -> Self {
        JobId(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns the identifier that follows this one.
    pub fn next(self) -> Self {
        JobId(self.0 + 1)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier the remote service assigns to an evaluated alpha.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AlphaId(String);

impl AlphaId {
    pub fn new(raw: impl Into<String>) -> Self {
        AlphaId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for AlphaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlphaId {
    fn from(raw: &str) -> Self {
        AlphaId::new(raw)
    }
}

impl From<String> for AlphaId {
    fn from(raw: String) -> Self {
        AlphaId(raw)
    }
}

impl AsRef<str> for AlphaId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque address returned by the service when a simulation is accepted.
/// Only ever used to query that simulation's live status.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PollLocator(String);

impl PollLocator {
    pub fn new(raw: impl Into<String>) -> Self {
        PollLocator(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PollLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
