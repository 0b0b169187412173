//! Uniform response envelope.
//!
//! Every reply the relay sends, success or failure, uses the same JSON
//! shape and carries the same fixed CORS headers, mirroring the gateway
//! contract the webhook caller already expects.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// JSON body of a relay response.
///
/// A 200 carries its detail under `message`; every other status carries it
/// under `fault`.
#[derive(Debug, Serialize)]
pub struct ResponseBody {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

/// Response envelope returned by the relay.
///
/// The constructors make the body shape follow the status: errors always
/// carry a fault detail, successes may omit theirs.
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    body: ResponseBody,
}

impl ApiResponse {
    /// Successful response, with an optional detail message.
    pub fn ok(detail: Option<&str>) -> Self {
        Self {
            status: StatusCode::OK,
            body: ResponseBody {
                status_code: StatusCode::OK.as_u16(),
                message: detail.map(str::to_string),
                fault: None,
            },
        }
    }

    /// Failure response; the detail is mandatory.
    pub fn error(status: StatusCode, detail: &str) -> Self {
        Self {
            status,
            body: ResponseBody {
                status_code: status.as_u16(),
                message: None,
                fault: Some(detail.to_string()),
            },
        }
    }

    /// HTTP status of this response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// JSON body of this response.
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();

        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, GET"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Origin, X-Requested-With, Content-Type, Accept"),
        );

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_with_detail() {
        let response = ApiResponse::ok(Some("success"));

        assert_eq!(response.status(), StatusCode::OK);

        let body = serde_json::to_value(response.body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "statusCode": 200, "message": "success" })
        );
    }

    #[test]
    fn test_ok_without_detail() {
        let response = ApiResponse::ok(None);

        let body = serde_json::to_value(response.body()).unwrap();
        assert_eq!(body, serde_json::json!({ "statusCode": 200 }));
    }

    #[test]
    fn test_error_carries_fault() {
        let response = ApiResponse::error(StatusCode::UNAUTHORIZED, "Signature is not valid");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = serde_json::to_value(response.body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "statusCode": 401, "fault": "Signature is not valid" })
        );
    }

    #[test]
    fn test_into_response_attaches_cors_headers() {
        let response = ApiResponse::ok(Some("success")).into_response();
        let headers = response.headers();

        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "POST, GET"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
            "Origin, X-Requested-With, Content-Type, Accept"
        );
        assert_eq!(
            headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
