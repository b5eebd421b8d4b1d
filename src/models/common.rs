use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Response envelope used by every endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable code, e.g. `insufficient_points`
    pub code: String,
    pub message: String,
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(code: &str, message: String, details: Option<Value>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.clone()),
            error: Some(ApiError {
                code: code.to_string(),
                message,
                details,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_skips_empty_fields() {
        let body = serde_json::to_value(ApiResponse::success(5)).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], 5);
        assert!(body.get("error").is_none());
        assert!(body.get("message").is_none());
    }

    #[test]
    fn test_failure_envelope() {
        let body = serde_json::to_value(ApiResponse::failure(
            "insufficient_balance",
            "Wallet balance too low".into(),
            None,
        ))
        .unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "insufficient_balance");
        assert_eq!(body["message"], "Wallet balance too low");
        assert!(body.get("data").is_none());
    }
}
