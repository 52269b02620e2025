use crate::config::AppMode;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use costboard_common::CostError;
use serde::Serialize;

/// JSON body of every 500 the service returns.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<chrono::NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<chrono::NaiveDate>,
}

/// Failure of an HTTP handler. Detail fields only leave the process outside
/// production mode.
#[derive(Debug)]
pub enum ApiError {
    Cost { error: CostError, mode: AppMode },
    Chart { detail: String, mode: AppMode },
}

impl ApiError {
    pub fn cost(error: CostError, mode: AppMode) -> Self {
        ApiError::Cost { error, mode }
    }

    pub fn chart(detail: impl ToString, mode: AppMode) -> Self {
        ApiError::Chart {
            detail: detail.to_string(),
            mode,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Cost { error, mode } => {
                let message = match error {
                    CostError::UpstreamUnavailable { .. } => "Failed to retrieve cost and usage data",
                    CostError::UpstreamData { .. } => "Failed to parse cost data",
                    CostError::Internal(_) => "Failed to retrieve cost data",
                };
                if mode.is_production() {
                    return ErrorBody::generic(message);
                }
                let range = error.attempted_range();
                ErrorBody {
                    error: message.to_string(),
                    exception: Some(error.to_string()),
                    start: range.map(|(start, _)| start),
                    end: range.map(|(_, end)| end),
                }
            }
            ApiError::Chart { detail, mode } => {
                let mut body = ErrorBody::generic("Failed to render chart");
                if !mode.is_production() {
                    body.exception = Some(detail.clone());
                }
                body
            }
        }
    }
}

impl ErrorBody {
    fn generic(message: &str) -> Self {
        Self {
            error: message.to_string(),
            exception: None,
            start: None,
            end: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn upstream() -> CostError {
        CostError::UpstreamUnavailable {
            message: "AccessDenied".into(),
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
        }
    }

    #[test]
    fn debug_mode_includes_detail() {
        let body = serde_json::to_value(ApiError::cost(upstream(), AppMode::Debug).body()).unwrap();
        assert_eq!(body["error"], "Failed to retrieve cost and usage data");
        assert_eq!(body["exception"], "cost API unavailable: AccessDenied");
        assert_eq!(body["start"], "2024-02-01");
        assert_eq!(body["end"], "2024-08-01");
    }

    #[test]
    fn production_mode_hides_detail() {
        let body =
            serde_json::to_value(ApiError::cost(upstream(), AppMode::Production).body()).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Failed to retrieve cost and usage data"}));
    }

    #[test]
    fn internal_errors_have_no_range() {
        let body = serde_json::to_value(
            ApiError::cost(CostError::Internal("task aborted".into()), AppMode::Debug).body(),
        )
        .unwrap();
        assert_eq!(body["error"], "Failed to retrieve cost data");
        assert!(body.get("start").is_none());
    }

    #[test]
    fn chart_failure_message() {
        let body = ApiError::chart("encoder", AppMode::Production).body();
        assert_eq!(body.error, "Failed to render chart");
        assert!(body.exception.is_none());
    }

    #[test]
    fn responds_with_500() {
        let response = ApiError::cost(upstream(), AppMode::Debug).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
