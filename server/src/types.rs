// Request and response types for REST API handlers

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct AddMemberRequest {
    pub(crate) user: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MembershipResponse {
    pub(crate) message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
}
