//! Per-node trend computation.
//!
//! This module drops missing rows, picks one sample per year closest to a
//! target date for each grid node, regresses those samples against elapsed
//! days, and reports the change per year with its absolute correlation.

pub mod aggregate;
pub mod filter;
pub mod pipeline;
pub mod regression;
pub mod types;
pub mod utility;
pub mod yearly;
