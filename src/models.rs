use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

// Body of POST /generate
// `secret` stays raw JSON so a malformed secret is an auth failure, not a parse error
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    pub secret: Value,
}

// Older callers pass the prompt as ?prompt=...
#[derive(Deserialize, Debug, Default)]
pub struct PromptQuery {
    pub prompt: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct GenerateResponse {
    pub generated_text: String,
}

impl GenerateRequest {
    // Two accepted shapes:
    //   {"prompt": "..", "secret": {"secret": ".."}}  (prompt may also sit in the query)
    //   ?prompt=..  with the body being the secret object itself
    // A body prompt always wins over the query one.
    pub fn from_parts(body: Value, query_prompt: Option<String>) -> Result<Self, ApiError> {
        let nested = match &body {
            Value::Object(map) => {
                map.contains_key("prompt") || map.get("secret").is_some_and(Value::is_object)
            }
            _ => {
                return Err(ApiError::InvalidRequest(
                    "request body must be a JSON object".to_string(),
                ));
            }
        };

        if !nested {
            if let Some(prompt) = query_prompt {
                return Ok(Self {
                    prompt: Some(prompt),
                    secret: body,
                });
            }
        }

        let mut request: GenerateRequest =
            serde_json::from_value(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        request.prompt = request.prompt.or(query_prompt);
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_body_keeps_its_prompt() {
        let req = GenerateRequest::from_parts(
            json!({"prompt": "body", "secret": {"secret": "s"}}),
            Some("query".to_string()),
        )
        .unwrap();

        assert_eq!(req.prompt.as_deref(), Some("body"));
        assert_eq!(req.secret, json!({"secret": "s"}));
    }

    #[test]
    fn flat_body_with_query_prompt_is_the_secret() {
        let req =
            GenerateRequest::from_parts(json!({"secret": "s"}), Some("hi".to_string())).unwrap();

        assert_eq!(req.prompt.as_deref(), Some("hi"));
        assert_eq!(req.secret, json!({"secret": "s"}));
    }

    #[test]
    fn nested_secret_takes_query_prompt_when_body_has_none() {
        let req = GenerateRequest::from_parts(
            json!({"secret": {"secret": "s"}}),
            Some("hi".to_string()),
        )
        .unwrap();

        assert_eq!(req.prompt.as_deref(), Some("hi"));
        assert_eq!(req.secret, json!({"secret": "s"}));
    }

    #[test]
    fn missing_secret_is_invalid() {
        let err = GenerateRequest::from_parts(json!({"prompt": "hi"}), None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(ref msg) if msg.contains("secret")));
    }

    #[test]
    fn non_object_body_is_invalid() {
        let err = GenerateRequest::from_parts(json!(["hi"]), Some("hi".to_string())).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }
}
