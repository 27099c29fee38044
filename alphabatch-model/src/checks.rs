use std::fmt;

/// Outcome the service reports for one named check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum CheckOutcome {
    Pass,
    Fail,
    /// Anything else the service reports (`PENDING`, `WARNING`, ...).
    Other(String),
}

/// A check reported without a result reads as an empty `Other`, which never
/// passes.
impl Default for CheckOutcome {
    fn default() -> Self {
        CheckOutcome::Other(String::new())
    }
}

impl CheckOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            CheckOutcome::Pass => "PASS",
            CheckOutcome::Fail => "FAIL",
            CheckOutcome::Other(raw) => raw,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, CheckOutcome::Pass)
    }
}

impl From<String> for CheckOutcome {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PASS" => CheckOutcome::Pass,
            "FAIL" => CheckOutcome::Fail,
            _ => CheckOutcome::Other(raw),
        }
    }
}

impl From<&str> for CheckOutcome {
    fn from(raw: &str) -> Self {
        CheckOutcome::from(raw.to_string())
    }
}

impl From<CheckOutcome> for String {
    fn from(outcome: CheckOutcome) -> Self {
        outcome.as_str().to_string()
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named pass/fail evaluation attached to a completed alpha.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckResult {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "result", default))]
    pub outcome: CheckOutcome,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: Option<f64>,
}

impl CheckResult {
    pub fn new(
        name: impl Into<String>,
        outcome: impl Into<CheckOutcome>,
        value: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            outcome: outcome.into(),
            value,
        }
    }
}

/// The checks that gate persistence. Their values are also the only ones the
/// result table keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatedCheck {
    LowSharpe,
    LowFitness,
    LowTurnover,
    HighTurnover,
    LowSubUniverseSharpe,
}

impl GatedCheck {
    pub const ALL: [GatedCheck; 5] = [
        GatedCheck::LowSharpe,
        GatedCheck::LowFitness,
        GatedCheck::LowTurnover,
        GatedCheck::HighTurnover,
        GatedCheck::LowSubUniverseSharpe,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GatedCheck::LowSharpe => "LOW_SHARPE",
            GatedCheck::LowFitness => "LOW_FITNESS",
            GatedCheck::LowTurnover => "LOW_TURNOVER",
            GatedCheck::HighTurnover => "HIGH_TURNOVER",
            GatedCheck::LowSubUniverseSharpe => "LOW_SUB_UNIVERSE_SHARPE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|check| check.name() == name)
    }
}

impl fmt::Display for GatedCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_outcomes_are_preserved() {
        let outcome = CheckOutcome::from("WARNING");
        assert_eq!(outcome, CheckOutcome::Other("WARNING".to_string()));
        assert!(!outcome.is_pass());
        assert_eq!(outcome.as_str(), "WARNING");
    }

    #[test]
    fn gated_checks_resolve_by_wire_name() {
        assert_eq!(
            GatedCheck::from_name("LOW_SUB_UNIVERSE_SHARPE"),
            Some(GatedCheck::LowSubUniverseSharpe)
        );
        assert_eq!(GatedCheck::from_name("SELF_CORRELATION"), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn check_result_reads_service_shape() {
        let raw = r#"{"name":"LOW_SHARPE","result":"PASS","limit":1.25,"value":1.61}"#;
        let check: CheckResult = serde_json::from_str(raw).unwrap();
        assert_eq!(check.name, "LOW_SHARPE");
        assert!(check.outcome.is_pass());
        assert_eq!(check.value, Some(1.61));

        let pending = r#"{"name":"SELF_CORRELATION","result":"PENDING"}"#;
        let check: CheckResult = serde_json::from_str(pending).unwrap();
        assert_eq!(check.value, None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn missing_result_reads_as_not_passing() {
        let raw = r#"{"name":"CONCENTRATED_WEIGHT","value":0.2}"#;
        let check: CheckResult = serde_json::from_str(raw).unwrap();
        assert_eq!(check.outcome, CheckOutcome::default());
        assert!(!check.outcome.is_pass());
        assert_eq!(check.value, Some(0.2));
    }
}
