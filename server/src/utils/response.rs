use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

/// Envelope for every successful response.
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorBody,
}

pub fn respond<T: Serialize>(status: StatusCode, data: T, message: impl Into<String>) -> Response {
    let body = ApiResponse {
        success: true,
        data,
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

pub fn success<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    respond(StatusCode::OK, data, message)
}

pub fn created<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    respond(StatusCode::CREATED, data, message)
}

pub fn error(
    code: &str,
    message: impl Into<String>,
    details: Option<Value>,
    status: StatusCode,
) -> Response {
    let body = ApiErrorResponse {
        success: false,
        error: ApiErrorBody {
            code: code.to_string(),
            message: message.into(),
            details,
        },
    };

    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_body_omits_empty_details() {
        let body = ApiErrorBody {
            code: "NOT_FOUND".to_string(),
            message: "Venue not found".to_string(),
            details: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, json!({ "code": "NOT_FOUND", "message": "Venue not found" }));
    }

    #[test]
    fn test_created_status() {
        let response = created(json!({ "id": 1 }), "Created");
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
