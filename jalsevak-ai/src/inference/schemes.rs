//! Government scheme lookup
//!
//! Scheme names, eligibility and benefits all come from the model.

use super::{
    language_clause, optional_line, require_field, require_non_empty, AdvisoryPrompt,
};
use crate::types::{InferenceError, TargetLanguage};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeLookupRequest {
    /// Indian state or union territory
    pub state: String,
    /// What the farmer needs help with ("drip irrigation subsidy", "crop insurance")
    pub need: String,
    /// e.g. "small and marginal", "tenant farmer"
    #[serde(default)]
    pub farmer_category: Option<String>,
    #[serde(default)]
    pub language: Option<TargetLanguage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeInfo {
    pub name: String,
    pub description: String,
    pub eligibility: String,
    pub benefits: String,
    pub how_to_apply: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeList {
    pub schemes: Vec<SchemeInfo>,
}

impl AdvisoryPrompt for SchemeLookupRequest {
    const NAME: &'static str = "scheme_lookup";
    type Output = SchemeList;

    fn validate_request(&self) -> Result<(), InferenceError> {
        require_field("state", &self.state)?;
        require_field("need", &self.need)
    }

    fn prompt(&self) -> String {
        format!(
            "List central and state government schemes relevant to a farmer with this need.\n\
             - State: {}\n\
             - Need: {}\n\
             {}\
             For each scheme give a description, eligibility, benefits and how to apply.\n\
             {}",
            self.state,
            self.need,
            optional_line("Farmer category", self.farmer_category.as_deref()),
            language_clause(self.language.as_ref()),
        )
    }

    fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "schemes": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": { "type": "STRING" },
                            "description": { "type": "STRING" },
                            "eligibility": { "type": "STRING" },
                            "benefits": { "type": "STRING" },
                            "how_to_apply": { "type": "STRING" }
                        },
                        "required": ["name", "description", "eligibility", "benefits", "how_to_apply"]
                    }
                }
            },
            "required": ["schemes"]
        })
    }

    fn validate(output: &SchemeList) -> Result<(), InferenceError> {
        require_non_empty("schemes", &output.schemes)
    }
}
