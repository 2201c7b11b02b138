//! Crop suggestion

use super::{
    language_clause, optional_line, require_field, require_non_empty, AdvisoryPrompt,
};
use crate::types::{InferenceError, TargetLanguage};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropSuggestionRequest {
    /// District / state, free text
    pub location: String,
    pub soil_type: String,
    /// e.g. "Kharif", "Rabi", "Zaid"
    pub season: String,
    /// e.g. "canal", "borewell", "rainfed only"
    pub water_availability: String,
    #[serde(default)]
    pub farm_size_acres: Option<f64>,
    #[serde(default)]
    pub previous_crop: Option<String>,
    #[serde(default)]
    pub language: Option<TargetLanguage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropSuggestion {
    pub name: String,
    pub reason: String,
    pub water_requirement: String,
    pub sowing_window: String,
    #[serde(default)]
    pub duration_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropSuggestions {
    pub crops: Vec<CropSuggestion>,
}

impl AdvisoryPrompt for CropSuggestionRequest {
    const NAME: &'static str = "crop_suggestion";
    type Output = CropSuggestions;

    fn validate_request(&self) -> Result<(), InferenceError> {
        require_field("location", &self.location)?;
        require_field("soil_type", &self.soil_type)?;
        require_field("season", &self.season)?;
        require_field("water_availability", &self.water_availability)?;
        if self.farm_size_acres.is_some_and(|a| !(a > 0.0)) {
            return Err(InferenceError::InvalidRequest(
                "farm_size_acres must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn prompt(&self) -> String {
        format!(
            "You are an agricultural extension officer advising a small farmer in India.\n\
             Suggest 3 to 5 crops suited to these conditions:\n\
             - Location: {}\n\
             - Soil type: {}\n\
             - Season: {}\n\
             - Water availability: {}\n\
             {}{}\
             For each crop give the reason it fits, its water requirement and the sowing window.\n\
             {}",
            self.location,
            self.soil_type,
            self.season,
            self.water_availability,
            optional_line("Farm size (acres)", self.farm_size_acres),
            optional_line("Previous crop", self.previous_crop.as_deref()),
            language_clause(self.language.as_ref()),
        )
    }

    fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "crops": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": { "type": "STRING" },
                            "reason": { "type": "STRING" },
                            "water_requirement": { "type": "STRING" },
                            "sowing_window": { "type": "STRING" },
                            "duration_days": { "type": "INTEGER" }
                        },
                        "required": ["name", "reason", "water_requirement", "sowing_window"]
                    }
                }
            },
            "required": ["crops"]
        })
    }

    fn validate(output: &CropSuggestions) -> Result<(), InferenceError> {
        require_non_empty("crops", &output.crops)?;
        if output.crops.iter().any(|c| c.name.trim().is_empty()) {
            return Err(InferenceError::InvalidOutput("crop without a name".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CropSuggestionRequest {
        CropSuggestionRequest {
            location: "Nashik, Maharashtra".to_string(),
            soil_type: "black cotton".to_string(),
            season: "Rabi".to_string(),
            water_availability: "borewell".to_string(),
            farm_size_acres: Some(2.5),
            previous_crop: None,
            language: None,
        }
    }

    #[test]
    fn test_prompt_includes_inputs() {
        let prompt = request().prompt();
        assert!(prompt.contains("Nashik, Maharashtra"));
        assert!(prompt.contains("- Farm size (acres): 2.5"));
        assert!(!prompt.contains("Previous crop"));
    }

    #[test]
    fn test_rejects_missing_fields_and_bad_size() {
        let mut r = request();
        r.season = String::new();
        assert!(r.validate_request().is_err());

        let mut r = request();
        r.farm_size_acres = Some(0.0);
        assert!(r.validate_request().is_err());
    }

    #[test]
    fn test_empty_crop_list_invalid() {
        let output = CropSuggestions { crops: vec![] };
        assert!(matches!(
            CropSuggestionRequest::validate(&output),
            Err(InferenceError::InvalidOutput(_))
        ));
    }
}
