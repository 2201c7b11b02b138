//! Soil advice from a soil test or a description of the field

use super::{
    language_clause, optional_line, require_field, require_non_empty, AdvisoryPrompt,
};
use crate::types::{InferenceError, TargetLanguage};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilAdviceRequest {
    pub soil_type: String,
    #[serde(default)]
    pub ph: Option<f64>,
    /// Soil health card levels ("low", "medium", "high") or values as text
    #[serde(default)]
    pub nitrogen: Option<String>,
    #[serde(default)]
    pub phosphorus: Option<String>,
    #[serde(default)]
    pub potassium: Option<String>,
    #[serde(default)]
    pub organic_carbon: Option<String>,
    #[serde(default)]
    pub target_crop: Option<String>,
    #[serde(default)]
    pub language: Option<TargetLanguage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilAmendment {
    pub name: String,
    pub quantity: String,
    pub timing: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilAdvice {
    pub assessment: String,
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub amendments: Vec<SoilAmendment>,
}

impl AdvisoryPrompt for SoilAdviceRequest {
    const NAME: &'static str = "soil_advice";
    type Output = SoilAdvice;

    fn validate_request(&self) -> Result<(), InferenceError> {
        require_field("soil_type", &self.soil_type)?;
        if let Some(ph) = self.ph {
            if !(0.0..=14.0).contains(&ph) {
                return Err(InferenceError::InvalidRequest(format!(
                    "ph must be between 0 and 14, got {}",
                    ph
                )));
            }
        }
        Ok(())
    }

    fn prompt(&self) -> String {
        format!(
            "You are a soil scientist writing advice for a farmer's soil health card.\n\
             Soil details:\n\
             - Soil type: {}\n\
             {}{}{}{}{}{}\
             Assess the soil, list practical recommendations, and name fertilizers or \
             amendments with quantity per acre and timing.\n\
             {}",
            self.soil_type,
            optional_line("pH", self.ph),
            optional_line("Nitrogen", self.nitrogen.as_deref()),
            optional_line("Phosphorus", self.phosphorus.as_deref()),
            optional_line("Potassium", self.potassium.as_deref()),
            optional_line("Organic carbon", self.organic_carbon.as_deref()),
            optional_line("Planned crop", self.target_crop.as_deref()),
            language_clause(self.language.as_ref()),
        )
    }

    fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "assessment": { "type": "STRING" },
                "recommendations": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" }
                },
                "amendments": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": { "type": "STRING" },
                            "quantity": { "type": "STRING" },
                            "timing": { "type": "STRING" }
                        },
                        "required": ["name", "quantity", "timing"]
                    }
                }
            },
            "required": ["assessment", "recommendations"]
        })
    }

    fn validate(output: &SoilAdvice) -> Result<(), InferenceError> {
        require_non_empty("recommendations", &output.recommendations)
    }
}
