//! Korean DART (Data Analysis, Retrieval and Transfer System) filings.
//!
//! Response decoding is always available so snapshots can be built from saved
//! payloads; the HTTP client needs the `dart` feature.

#[cfg(feature = "dart")]
pub mod client;
pub mod response;

#[cfg(feature = "dart")]
pub use client::*;
pub use response::*;
