//! # Contracts
//!
//! Shared interface contracts between the NMEA daemon and the position scanner.
//! All business crates depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Every reading is stamped with its wall-clock time of arrival
//!   (seconds since the Unix epoch, f64), captured once per sentence
//! - The published file carries these timestamps unchanged, so the scanner
//!   can order and gate readings produced by another process

mod error;
mod field;
mod position;
mod reading;
mod source;
mod store;
mod worker;

pub use error::*;
pub use field::Field;
pub use position::*;
pub use reading::*;
pub use source::LineSource;
pub use store::PositionStore;
pub use worker::Worker;
