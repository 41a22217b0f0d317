//! # league-gateway
//!
//! REST backend for amateur league management: team accounts with
//! rosters, matches played over four quarters plus an optional overtime,
//! seasons, and a standings table computed from finished matches.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers + extractors (api/)
//!     │
//!     ├── Auth / Team / Match / Season services (service/)
//!     ├── Standings fold, commands, read models (domain/)
//!     │
//!     └── PostgreSQL Persistence (persistence/)
//! ```
//!
//! Every multi-row write (match creation, score entry, roster update,
//! season switch, password reset) runs in a single database transaction.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
