use reqwest::StatusCode;
use thiserror::Error;

/// Every failure of a storefront API call. The `Display` text is what the
/// screens show to the user; callers do not branch on the variant.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to reach the storefront: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("{}", status_message(.status, .body))]
    Status { status: StatusCode, body: String },
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("failed to build request: {0}")]
    Request(String),
}

fn status_message(status: &StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("request failed with status {}", status)
    } else {
        // The API answers errors as `{"message": "..."}`; fall back to raw text.
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| body.to_string())
    }
}

impl ApiError {
    pub fn message(&self) -> String {
        self.to_string()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_prefers_json_message() {
        let err = ApiError::Status {
            status: StatusCode::PRECONDITION_FAILED,
            body: r#"{"message":"cannot purchase own item"}"#.into(),
        };
        assert_eq!(err.message(), "cannot purchase own item");
    }

    #[test]
    fn status_error_uses_raw_body_or_status() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            body: "bad input".into(),
        };
        assert_eq!(err.message(), "bad input");

        let err = ApiError::Status {
            status: StatusCode::NOT_FOUND,
            body: "  ".into(),
        };
        assert_eq!(err.message(), "request failed with status 404 Not Found");
    }
}
