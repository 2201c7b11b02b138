//! Irrigation schedule

use super::{
    language_clause, optional_line, require_field, require_non_empty, AdvisoryPrompt,
};
use crate::types::{InferenceError, TargetLanguage};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationScheduleRequest {
    pub crop: String,
    /// e.g. "flowering", "vegetative"
    pub growth_stage: String,
    pub soil_type: String,
    pub location: String,
    #[serde(default)]
    pub irrigation_method: Option<String>,
    /// Rainfall over the last week, millimetres
    #[serde(default)]
    pub recent_rainfall_mm: Option<f64>,
    #[serde(default)]
    pub language: Option<TargetLanguage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationEntry {
    /// "Day 1", "Monday", ...
    pub day: String,
    pub amount: String,
    pub method: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationSchedule {
    pub summary: String,
    pub entries: Vec<IrrigationEntry>,
    #[serde(default)]
    pub water_saving_tips: Vec<String>,
}

impl AdvisoryPrompt for IrrigationScheduleRequest {
    const NAME: &'static str = "irrigation_schedule";
    type Output = IrrigationSchedule;

    fn validate_request(&self) -> Result<(), InferenceError> {
        require_field("crop", &self.crop)?;
        require_field("growth_stage", &self.growth_stage)?;
        require_field("soil_type", &self.soil_type)?;
        require_field("location", &self.location)?;
        if self.recent_rainfall_mm.is_some_and(|mm| !(mm >= 0.0)) {
            return Err(InferenceError::InvalidRequest(
                "recent_rainfall_mm must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    fn prompt(&self) -> String {
        format!(
            "You are an irrigation advisor for Indian smallholder farms.\n\
             Produce a 7-day irrigation schedule for:\n\
             - Crop: {}\n\
             - Growth stage: {}\n\
             - Soil type: {}\n\
             - Location: {}\n\
             {}{}\
             Give one entry per watering day with the amount and method, a short summary, \
             and practical water-saving tips.\n\
             {}",
            self.crop,
            self.growth_stage,
            self.soil_type,
            self.location,
            optional_line("Irrigation method", self.irrigation_method.as_deref()),
            optional_line("Rainfall in the last 7 days (mm)", self.recent_rainfall_mm),
            language_clause(self.language.as_ref()),
        )
    }

    fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "summary": { "type": "STRING" },
                "entries": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "day": { "type": "STRING" },
                            "amount": { "type": "STRING" },
                            "method": { "type": "STRING" },
                            "notes": { "type": "STRING" }
                        },
                        "required": ["day", "amount", "method"]
                    }
                },
                "water_saving_tips": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" }
                }
            },
            "required": ["summary", "entries"]
        })
    }

    fn validate(output: &IrrigationSchedule) -> Result<(), InferenceError> {
        require_non_empty("entries", &output.entries)
    }
}
