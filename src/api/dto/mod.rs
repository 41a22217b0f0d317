//! Data Transfer Objects for REST request/response serialization.
//!
//! Field names are camelCase on the wire. Request types convert into
//! domain commands and report bad input as validation errors.

pub mod auth_dto;
pub mod common_dto;
pub mod match_dto;
pub mod season_dto;
pub mod team_dto;

pub use auth_dto::*;
pub use common_dto::*;
pub use match_dto::*;
pub use season_dto::*;
pub use team_dto::*;
