use std::fmt;

use anyhow::Error as AnyError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use tracing::error;
use vaultd_core::service::MembershipError;

#[derive(Debug, Clone, Copy)]
struct ErrorDescriptor {
    status: StatusCode,
    name: &'static str,
    error_type: &'static str,
    default_message: &'static str,
}

const BAD_REQUEST_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::BAD_REQUEST,
    name: "BAD_REQUEST",
    error_type: "BAD_REQUEST",
    default_message: "Bad request.",
};

const NOT_FOUND_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::NOT_FOUND,
    name: "NOT_FOUND",
    error_type: "RESOURCE_NOT_FOUND",
    default_message: "Resource not found.",
};

const INTERNAL_SERVER_ERROR_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::INTERNAL_SERVER_ERROR,
    name: "INTERNAL_SERVER_ERROR",
    error_type: "INTERNAL_SERVER_ERROR",
    default_message: "An internal error occurred.",
};

#[derive(Debug)]
pub struct AppError {
    descriptor: &'static ErrorDescriptor,
    name: String,
    error_type: String,
    message: String,
    data: Option<JsonValue>,
    source: Option<AnyError>,
}

impl AppError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::from_descriptor(&BAD_REQUEST_DESCRIPTOR, Some(message.into()))
    }

    pub(crate) fn internal(error: AnyError) -> Self {
        error!(?error, "internal server error");
        Self::from_descriptor(&INTERNAL_SERVER_ERROR_DESCRIPTOR, None).with_source(error)
    }

    pub(crate) fn membership_not_found(vault_id: &str, member_id: &str) -> Self {
        Self::from_descriptor(
            &NOT_FOUND_DESCRIPTOR,
            Some("user is not a member of this vault".to_owned()),
        )
        .with_name("MEMBERSHIP_NOT_FOUND")
        .with_data(json!({ "vaultId": vault_id, "memberId": member_id }))
    }

    pub(crate) fn cannot_remove_nonmember(vault_id: &str, member_id: &str) -> Self {
        Self::from_descriptor(
            &NOT_FOUND_DESCRIPTOR,
            Some("cannot remove user: user is not a member of this vault".to_owned()),
        )
        .with_name("MEMBERSHIP_NOT_FOUND")
        .with_data(json!({ "vaultId": vault_id, "memberId": member_id }))
    }

    pub(crate) fn into_payload(self) -> (StatusCode, UserFriendlyPayload) {
        let AppError {
            descriptor,
            name,
            error_type,
            message,
            data,
            source: _,
        } = self;

        let status = descriptor.status;
        let (code, reason) = code_and_reason(status);
        let payload = UserFriendlyPayload {
            status: status.as_u16(),
            code,
            reason,
            error_type,
            name,
            message,
            data,
        };

        (status, payload)
    }

    fn from_descriptor(descriptor: &'static ErrorDescriptor, message: Option<String>) -> Self {
        Self {
            descriptor,
            name: descriptor.name.to_owned(),
            error_type: descriptor.error_type.to_owned(),
            message: message.unwrap_or_else(|| descriptor.default_message.to_owned()),
            data: None,
            source: None,
        }
    }

    fn with_source(mut self, error: AnyError) -> Self {
        self.source = Some(error);
        self
    }

    pub(crate) fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub(crate) fn with_data(mut self, data: JsonValue) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<MembershipError> for AppError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::NotFound { vault, user } => Self::membership_not_found(&vault, &user),
            MembershipError::Validation(message) => Self::bad_request(message),
            MembershipError::Store(source) => Self::internal(source),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, payload) = self.into_payload();
        (status, Json(payload)).into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UserFriendlyPayload {
    pub(crate) status: u16,
    pub(crate) code: String,
    pub(crate) reason: String,
    #[serde(rename = "type")]
    pub(crate) error_type: String,
    pub(crate) name: String,
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) data: Option<JsonValue>,
}

fn code_and_reason(status: StatusCode) -> (String, String) {
    let reason = status
        .canonical_reason()
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Status {}", status.as_u16()));

    let code = reason
        .chars()
        .map(|ch| match ch {
            'a'..='z' => ch.to_ascii_uppercase(),
            'A'..='Z' | '0'..='9' => ch,
            _ => '_',
        })
        .collect::<String>();

    (code, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn http_error_payload_matches_contract() {
        let response = AppError::bad_request("user id must not be empty").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

        assert_eq!(json["status"], 400);
        assert_eq!(json["code"], "BAD_REQUEST");
        assert_eq!(json["reason"], "Bad Request");
        assert_eq!(json["type"], "BAD_REQUEST");
        assert_eq!(json["name"], "BAD_REQUEST");
        assert_eq!(json["message"], "user id must not be empty");
        assert!(json.get("data").is_none());
    }

    #[tokio::test]
    async fn membership_not_found_error_includes_domain_metadata() {
        let response = AppError::membership_not_found("vault-123", "user-456").into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

        assert_eq!(json["status"], 404);
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["reason"], "Not Found");
        assert_eq!(json["type"], "RESOURCE_NOT_FOUND");
        assert_eq!(json["name"], "MEMBERSHIP_NOT_FOUND");
        assert_eq!(json["message"], "user is not a member of this vault");

        let data = json["data"].as_object().expect("data present");
        assert_eq!(
            data.get("vaultId"),
            Some(&serde_json::Value::String("vault-123".into()))
        );
        assert_eq!(
            data.get("memberId"),
            Some(&serde_json::Value::String("user-456".into()))
        );
    }

    #[tokio::test]
    async fn remove_error_carries_its_own_message() {
        let response = AppError::cannot_remove_nonmember("v", "u").into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

        assert_eq!(
            json["message"],
            "cannot remove user: user is not a member of this vault"
        );
    }

    #[tokio::test]
    async fn membership_errors_map_to_http_statuses() {
        let not_found: AppError = MembershipError::NotFound {
            vault: "v".into(),
            user: "u".into(),
        }
        .into();
        assert_eq!(
            not_found.into_response().status(),
            StatusCode::NOT_FOUND
        );

        let validation: AppError =
            MembershipError::Validation("user id must not be empty".into()).into();
        assert_eq!(
            validation.into_response().status(),
            StatusCode::BAD_REQUEST
        );

        let store: AppError =
            MembershipError::Store(anyhow::anyhow!("backend unavailable")).into();
        assert_eq!(
            store.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
