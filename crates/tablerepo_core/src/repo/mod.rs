//! Generic repository engine and its pluggable descriptors.
//!
//! # Responsibility
//! - Define the record, filter and partial-update contracts.
//! - Turn those contracts into parameterized SQL and run it through a
//!   `ConnectionHandle`.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `InvalidUpdate`)
//!   in addition to phase-tagged database errors (`Write`, `Commit`,
//!   `Query`).
//! - Values never appear in SQL text.

pub mod error;
pub mod filter;
pub mod options;
pub mod record;
mod statement;
pub mod table_repo;
pub mod update;
