use crate::checks::GatedCheck;
use crate::ids::AlphaId;

/// Values of the gated checks captured from a completed alpha. Checks the
/// service did not report stay at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckValues {
    pub low_sharpe: f64,
    pub low_fitness: f64,
    pub low_turnover: f64,
    pub high_turnover: f64,
    pub low_sub_universe_sharpe: f64,
}

impl CheckValues {
    pub fn get(&self, check: GatedCheck) -> f64 {
        match check {
            GatedCheck::LowSharpe => self.low_sharpe,
            GatedCheck::LowFitness => self.low_fitness,
            GatedCheck::LowTurnover => self.low_turnover,
            GatedCheck::HighTurnover => self.high_turnover,
            GatedCheck::LowSubUniverseSharpe => self.low_sub_universe_sharpe,
        }
    }

    pub fn set(&mut self, check: GatedCheck, value: f64) {
        let slot = match check {
            GatedCheck::LowSharpe => &mut self.low_sharpe,
            GatedCheck::LowFitness => &mut self.low_fitness,
            GatedCheck::LowTurnover => &mut self.low_turnover,
            GatedCheck::HighTurnover => &mut self.high_turnover,
            GatedCheck::LowSubUniverseSharpe => {
                &mut self.low_sub_universe_sharpe
            }
        };
        *slot = value;
    }
}

/// One persisted, gate-passing result.
///
/// `(alpha_id, formula)` is the uniqueness key of the result table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResultRecord {
    pub alpha_id: AlphaId,
    /// Creation timestamp exactly as the service reported it.
    pub created_at: String,
    pub formula: String,
    pub check_values: CheckValues,
    #[cfg_attr(feature = "serde", serde(default))]
    pub submitted: bool,
}

impl ResultRecord {
    pub fn key(&self) -> (&AlphaId, &str) {
        (&self.alpha_id, self.formula.as_str())
    }

    pub fn same_key(&self, other: &ResultRecord) -> bool {
        self.key() == other.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_values_round_trip_through_accessors() {
        let mut values = CheckValues::default();
        for (idx, check) in GatedCheck::ALL.into_iter().enumerate() {
            values.set(check, idx as f64 + 0.5);
        }
        assert_eq!(values.get(GatedCheck::LowSharpe), 0.5);
        assert_eq!(values.get(GatedCheck::LowSubUniverseSharpe), 4.5);
    }

    #[test]
    fn key_ignores_check_values_and_flag() {
        let a = ResultRecord {
            alpha_id: AlphaId::new("a1"),
            created_at: "2024-01-01".into(),
            formula: "rank(close)".into(),
            check_values: CheckValues::default(),
            submitted: false,
        };
        let mut b = a.clone();
        b.check_values.low_sharpe = 2.0;
        b.submitted = true;
        assert!(a.same_key(&b));

        b.formula = "rank(open)".into();
        assert!(!a.same_key(&b));
    }
}
