//! Plate-Gate - License Plate Access Control
//!
//! Recognition-to-actuation pipeline for a single-lane vehicle barrier.
//!
//! ## Architecture (6 Components)
//!
//! 1. TextNormalizer - OCR text cleanup to canonical plate form
//! 2. PlateRegistry - Append-only durable registry of gate events
//! 3. CooldownTracker - Per-plate duplicate suppression window
//! 4. ActuatorClient - Remote barrier controller (HTTP, fire-and-forget)
//! 5. MysqlMirror - Best-effort secondary sink (optional)
//! 6. RecognitionLoop - Frame -> detect -> OCR -> toggle -> actuate
//!
//! ## Design Principles
//!
//! - The CSV registry is the single source of truth; the in-memory index
//!   never diverges from it (durable write first, index update second)
//! - Actuator and mirror failures are logged, never fatal
//! - One writer, one camera stream, one process

pub mod actuator;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod mirror;
pub mod normalizer;
pub mod pipeline;
pub mod registry;
pub mod vision;

pub use error::{Error, Result};
