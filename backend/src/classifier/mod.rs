//! External species classifier adapter
//!
//! Sends one chat-completions request per invocation to an OpenAI-compatible
//! vision endpoint and turns the textual answer into a validated
//! [`Classification`]. No batching, caching, or retries happen here; retry
//! policy belongs to the caller.
mod error;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use recognition_storage::recognition::SpeciesKind;

use crate::types::ClassifierSettings;

pub use error::{ClassifierError, ClassifierResult};

/// Request timeout for classifier calls
const REQUEST_TIMEOUT_SECS: u64 = 25;

/// Maximum number of idle connections to maintain per host
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;

/// Instruction sent alongside the image. The model must answer with a bare
/// JSON object carrying exactly the contract fields; anything else fails the
/// parse step.
const IDENTIFY_PROMPT: &str = "\
Identify the plant or animal species shown in this image.

Return ONLY a valid, well-formatted JSON object with EXACTLY the following fields and NO extra text:

{
  \"type\": \"\",
  \"commonName\": \"\",
  \"scientificName\": \"\",
  \"description\": \"\",
  \"confidence\": 0.0
}

Field definitions:
- type: Must be either \"plant\" or \"animal\"
- commonName: The widely used common name of the species
- scientificName: The correct scientific (binomial) name
- description: A brief description (2-3 sentences) including key traits, natural habitat, and one interesting fact
- confidence: Your confidence level as a number between 0 and 1 (e.g., 0.95 for 95% confident)

STRICT RULES:
- Output MUST be valid JSON only.
- Do NOT include the word \"json\".
- Do NOT include explanations outside the JSON.
- Do NOT include markdown code blocks.
- Do NOT add any extra fields.
- If unsure, set confidence below 0.5 and provide best guess.";

/// A validated classification produced by the external model
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// Plant or animal
    #[serde(rename = "type")]
    pub kind: SpeciesKind,
    /// Scientific (binomial) name
    pub scientific_name: String,
    /// Common name
    pub common_name: String,
    /// Short free-text description
    pub description: String,
    /// Model confidence in [0, 1], passed through unmodified
    pub confidence: f64,
}

/// Classifies one dereferenceable image URL into a [`Classification`]
#[async_trait]
pub trait IdentifySpecies: Send + Sync {
    /// Runs exactly one external classification call for `image_url`
    async fn identify(&self, image_url: &str) -> ClassifierResult<Classification>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'static str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Classifier output before semantic validation
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClassification {
    #[serde(rename = "type")]
    kind: String,
    common_name: String,
    scientific_name: String,
    description: String,
    confidence: f64,
}

/// Species classifier backed by an OpenAI-compatible vision endpoint
pub struct SpeciesClassifier {
    http_client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl SpeciesClassifier {
    /// Creates a new classifier with a pooled HTTP client
    ///
    /// # Errors
    ///
    /// Returns `ClassifierError::Request` if the HTTP client cannot be built
    pub fn new(settings: ClassifierSettings) -> ClassifierResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .user_agent(format!("species-lens-backend/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            api_base: settings.api_base,
            api_key: settings.api_key,
            model: settings.model,
        })
    }
}

#[async_trait]
impl IdentifySpecies for SpeciesClassifier {
    async fn identify(&self, image_url: &str) -> ClassifierResult<Classification> {
        let endpoint = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: IDENTIFY_PROMPT,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: image_url },
                    },
                ],
            }],
        };

        let response = self
            .http_client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(ClassifierError::Upstream { status, body });
        }

        let chat: ChatResponse = response.json().await.map_err(ClassifierError::Request)?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ClassifierError::Parse("model response contained no choices".to_string()))?;

        parse_classification(&content)
    }
}

/// Parses the model's textual answer and validates it against the contract
///
/// JSON syntax errors and shape mismatches are parse failures; a well-shaped
/// object with out-of-contract values is a validation failure. Confidence is
/// never clamped.
fn parse_classification(content: &str) -> ClassifierResult<Classification> {
    let raw: RawClassification = serde_json::from_str(content)
        .map_err(|e| ClassifierError::Parse(e.to_string()))?;

    let kind = match raw.kind.as_str() {
        "plant" => SpeciesKind::Plant,
        "animal" => SpeciesKind::Animal,
        other => {
            return Err(ClassifierError::Validation(format!(
                "type must be \"plant\" or \"animal\", got \"{other}\""
            )))
        }
    };

    if !raw.confidence.is_finite() || !(0.0..=1.0).contains(&raw.confidence) {
        return Err(ClassifierError::Validation(format!(
            "confidence must be a number in [0, 1], got {}",
            raw.confidence
        )));
    }

    for (field, value) in [
        ("scientificName", &raw.scientific_name),
        ("commonName", &raw.common_name),
        ("description", &raw.description),
    ] {
        if value.trim().is_empty() {
            return Err(ClassifierError::Validation(format!(
                "{field} must be a non-empty string"
            )));
        }
    }

    Ok(Classification {
        kind,
        scientific_name: raw.scientific_name,
        common_name: raw.common_name,
        description: raw.description,
        confidence: raw.confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_output() -> String {
        serde_json::json!({
            "type": "plant",
            "commonName": "Damask rose",
            "scientificName": "Rosa damascena",
            "description": "A fragrant rose cultivated for rose oil.",
            "confidence": 0.87
        })
        .to_string()
    }

    #[test]
    fn test_parse_valid_output() {
        let classification = parse_classification(&valid_output()).unwrap();

        assert_eq!(classification.kind, SpeciesKind::Plant);
        assert_eq!(classification.scientific_name, "Rosa damascena");
        assert_eq!(classification.common_name, "Damask rose");
        assert_eq!(classification.confidence, 0.87);
    }

    #[test]
    fn test_confidence_passed_through_unmodified() {
        let output = valid_output().replace("0.87", "0.4999999999");
        let classification = parse_classification(&output).unwrap();

        assert_eq!(classification.confidence, 0.4999999999);
    }

    #[test]
    fn test_confidence_bounds_are_inclusive() {
        for bound in ["0.0", "1.0"] {
            let output = valid_output().replace("0.87", bound);
            assert!(parse_classification(&output).is_ok(), "confidence {bound}");
        }
    }

    #[test]
    fn test_unknown_species_type_is_validation_failure() {
        let output = valid_output().replace("plant", "fungus");

        assert!(matches!(
            parse_classification(&output),
            Err(ClassifierError::Validation(_))
        ));
    }

    #[test]
    fn test_out_of_range_confidence_is_validation_failure() {
        for bad in ["1.2", "-0.1"] {
            let output = valid_output().replace("0.87", bad);

            assert!(
                matches!(
                    parse_classification(&output),
                    Err(ClassifierError::Validation(_))
                ),
                "confidence {bad} should fail validation"
            );
        }
    }

    #[test]
    fn test_empty_strings_are_validation_failures() {
        let output = valid_output().replace("Damask rose", "");

        assert!(matches!(
            parse_classification(&output),
            Err(ClassifierError::Validation(_))
        ));
    }

    #[test]
    fn test_fenced_output_is_parse_failure() {
        let fenced = format!("```json\n{}\n```", valid_output());

        assert!(matches!(
            parse_classification(&fenced),
            Err(ClassifierError::Parse(_))
        ));
    }

    #[test]
    fn test_surrounding_prose_is_parse_failure() {
        let chatty = format!("Here is the classification: {}", valid_output());

        assert!(matches!(
            parse_classification(&chatty),
            Err(ClassifierError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_field_is_parse_failure() {
        let output = serde_json::json!({
            "type": "animal",
            "commonName": "Red fox",
            "scientificName": "Vulpes vulpes",
            "confidence": 0.9
        })
        .to_string();

        assert!(matches!(
            parse_classification(&output),
            Err(ClassifierError::Parse(_))
        ));
    }

    #[test]
    fn test_string_confidence_is_parse_failure() {
        let output = valid_output().replace("0.87", "\"0.87\"");

        assert!(matches!(
            parse_classification(&output),
            Err(ClassifierError::Parse(_))
        ));
    }
}
