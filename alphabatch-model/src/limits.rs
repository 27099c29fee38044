use crate::error::{ModelError, Result};

/// Upper bound on simultaneously active simulations for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct MaxConcurrency(u8);

impl MaxConcurrency {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ModelError::OutOfRange {
                field: "max_concurrency",
                value: i64::from(value),
                min: i64::from(Self::MIN),
                max: i64::from(Self::MAX),
            });
        }
        Ok(MaxConcurrency(value))
    }

    pub fn get(&self) -> usize {
        usize::from(self.0)
    }
}

impl Default for MaxConcurrency {
    fn default() -> Self {
        MaxConcurrency(3)
    }
}

impl TryFrom<u8> for MaxConcurrency {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self> {
        MaxConcurrency::new(value)
    }
}

impl From<MaxConcurrency> for u8 {
    fn from(value: MaxConcurrency) -> Self {
        value.0
    }
}
