//! Season DTOs.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Request body for `POST /seasons`.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSeasonRequest {
    /// Display name, e.g. `"2026 spring"`.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}
