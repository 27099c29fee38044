/// Settings block sent with every simulation.
///
/// `truncation` is a fraction (`0.08`), not the percentage templates store.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SimulationSettings {
    pub instrument_type: String,
    pub region: String,
    pub universe: String,
    pub delay: u32,
    pub decay: u32,
    pub neutralization: String,
    pub truncation: f64,
    pub pasteurization: String,
    pub unit_handling: String,
    pub nan_handling: String,
    pub language: String,
    pub visualization: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            instrument_type: "EQUITY".to_string(),
            region: "USA".to_string(),
            universe: "TOP3000".to_string(),
            delay: 1,
            decay: 0,
            neutralization: "NONE".to_string(),
            truncation: 0.0,
            pasteurization: "ON".to_string(),
            unit_handling: "VERIFY".to_string(),
            nan_handling: "ON".to_string(),
            language: "FASTEXPR".to_string(),
            visualization: false,
        }
    }
}

/// Job-type discriminator of a simulation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum SimulationKind {
    #[default]
    Regular,
}

/// Body of a submit-simulation request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationRequest {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: SimulationKind,
    pub settings: SimulationSettings,
    /// The concrete expression body.
    pub regular: String,
}

impl SimulationRequest {
    pub fn regular(
        settings: SimulationSettings,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            kind: SimulationKind::Regular,
            settings,
            regular: expression.into(),
        }
    }

    pub fn expression(&self) -> &str {
        &self.regular
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_to_service_shape() {
        let settings = SimulationSettings {
            truncation: 0.08,
            ..SimulationSettings::default()
        };
        let request = SimulationRequest::regular(settings, "rank(close)");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["type"], "REGULAR");
        assert_eq!(value["regular"], "rank(close)");
        assert_eq!(value["settings"]["instrumentType"], "EQUITY");
        assert_eq!(value["settings"]["nanHandling"], "ON");
        assert_eq!(value["settings"]["truncation"], 0.08);
        assert_eq!(value["settings"]["visualization"], false);
    }
}
