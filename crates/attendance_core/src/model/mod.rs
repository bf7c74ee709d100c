//! Domain model for identities, subjects and weekly timetable entries.
//!
//! # Responsibility
//! - Define the records exchanged between stores and the data gateway.
//! - Keep insert, patch and read shapes separate so owner attachment and
//!   partial updates stay explicit in signatures.
//!
//! # Invariants
//! - Every persisted record is identified by a gateway-assigned UUID.
//! - Timestamps are Unix epoch milliseconds.
//! - Ownership is enforced by the gateway, never by model helpers.

pub mod identity;
pub mod session;
pub mod subject;
pub mod time_of_day;
pub mod timetable;
