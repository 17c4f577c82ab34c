//! JSON bodies exchanged with the Gemini API.

use serde::{Deserialize, Serialize};

/// Body of a `generateContent` request.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    /// Conversation turns; a single user turn here.
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// A request with one text prompt.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(text.into()),
                }],
            }],
        }
    }
}

/// One turn of content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    /// Parts of the turn.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One part of a turn. Only text parts are used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Text payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Body of a `generateContent` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    /// Candidate completions.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One candidate completion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    /// Generated content.
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts joined.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        Some(text)
    }
}

/// Body of an Imagen `predict` request.
#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest {
    /// Prompts to render.
    pub instances: Vec<PredictInstance>,
    /// Output settings.
    pub parameters: PredictParameters,
}

impl PredictRequest {
    /// One JPEG for `prompt`.
    pub fn single_image(prompt: impl Into<String>) -> Self {
        Self {
            instances: vec![PredictInstance {
                prompt: prompt.into(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                output_mime_type: "image/jpeg".to_string(),
            },
        }
    }
}

/// One prompt to render.
#[derive(Debug, Clone, Serialize)]
pub struct PredictInstance {
    /// Image description.
    pub prompt: String,
}

/// Imagen output settings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictParameters {
    /// Number of images.
    pub sample_count: u32,
    /// Output encoding.
    pub output_mime_type: String,
}

/// Body of an Imagen `predict` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictResponse {
    /// Generated images; empty when the prompt was filtered.
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

/// One generated image.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Base64 image bytes.
    #[serde(default)]
    pub bytes_base64_encoded: Option<String>,
    /// MIME type of the bytes.
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn generate_request_shape() {
        let body = serde_json::to_value(GenerateContentRequest::prompt("hello")).unwrap();
        assert_eq!(body, json!({ "contents": [{ "parts": [{ "text": "hello" }] }] }));
    }

    #[test]
    fn response_text_joins_parts() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "The Star " }, { "text": "shines." }] } }]
        }))
        .unwrap();
        assert_eq!(resp.text().as_deref(), Some("The Star shines."));
    }

    #[test]
    fn response_without_candidates() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(resp.text(), None);
    }

    #[test]
    fn predict_shapes() {
        let body = serde_json::to_value(PredictRequest::single_image("a cat")).unwrap();
        assert_eq!(
            body,
            json!({
                "instances": [{ "prompt": "a cat" }],
                "parameters": { "sampleCount": 1, "outputMimeType": "image/jpeg" }
            })
        );
        let resp: PredictResponse = serde_json::from_value(json!({
            "predictions": [{ "bytesBase64Encoded": "AAAA", "mimeType": "image/jpeg" }]
        }))
        .unwrap();
        assert_eq!(resp.predictions[0].bytes_base64_encoded.as_deref(), Some("AAAA"));
    }
}
