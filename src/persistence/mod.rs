//! Persistence layer: PostgreSQL storage for accounts, rosters, matches
//! and seasons.
//!
//! [`PostgresPersistence`] wraps a `sqlx::PgPool`. Its methods are split
//! by table group across the submodules; multi-row writes each run in one
//! transaction.

pub mod accounts;
pub mod matches;
pub mod models;
pub mod postgres;
pub mod seasons;
pub mod teams;

pub use accounts::{Credentials, PasswordTokenRecord, TokenPurpose};
pub use postgres::PostgresPersistence;
