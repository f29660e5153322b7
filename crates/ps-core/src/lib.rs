//! ps-core: stable foundation for powersim.
//!
//! Contains:
//! - ids (network-scoped compact IDs for buses and lines)
//! - numeric (Real + tolerances + float helpers)
//! - electrical (per-unit voltage, impedance and admittance values)
//! - series (append-only time series with a pending step)
//! - error (shared error types)

pub mod electrical;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod series;

// Re-exports: nice ergonomics for downstream crates
pub use electrical::*;
pub use error::{PsError, PsResult};
pub use ids::*;
pub use numeric::*;
pub use series::{CommitMode, TimeSeries};
