//! Persistence gate for completed alphas.

use alphabatch_model::{
    AlphaResult, CheckResult, CheckValues, GatedCheck, ResultRecord,
};

/// Decision reached for one completed alpha.
#[derive(Debug, Clone, PartialEq)]
pub enum GateVerdict {
    /// Every gated check that was reported passed.
    Accepted(ResultRecord),
    /// At least one gated check did not pass; the record is not persisted.
    Rejected {
        record: ResultRecord,
        failing: Vec<String>,
    },
}

impl GateVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateVerdict::Accepted(_))
    }

    pub fn record(&self) -> &ResultRecord {
        match self {
            GateVerdict::Accepted(record) => record,
            GateVerdict::Rejected { record, .. } => record,
        }
    }
}

/// Copies the values of the gated checks. Gated checks that are absent, or
/// reported without a value, stay at zero.
pub fn extract_check_values(checks: &[CheckResult]) -> CheckValues {
    let mut values = CheckValues::default();
    for check in checks {
        if let Some(gated) = GatedCheck::from_name(&check.name) {
            values.set(gated, check.value.unwrap_or(0.0));
        }
    }
    values
}

/// Names of reported gated checks whose outcome is not `PASS`.
pub fn failing_checks(checks: &[CheckResult]) -> Vec<String> {
    checks
        .iter()
        .filter(|check| GatedCheck::from_name(&check.name).is_some())
        .filter(|check| !check.outcome.is_pass())
        .map(|check| format!("{}={}", check.name, check.outcome))
        .collect()
}

pub fn passes_gate(checks: &[CheckResult]) -> bool {
    failing_checks(checks).is_empty()
}

/// Builds the candidate record for `result` and applies the gate.
pub fn evaluate(result: &AlphaResult) -> GateVerdict {
    let record = ResultRecord {
        alpha_id: result.id.clone(),
        created_at: result.created_at.clone(),
        formula: result.formula().to_string(),
        check_values: extract_check_values(result.checks()),
        submitted: false,
    };

    let failing = failing_checks(result.checks());
    if failing.is_empty() {
        GateVerdict::Accepted(record)
    } else {
        GateVerdict::Rejected { record, failing }
    }
}
