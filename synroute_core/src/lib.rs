//! Core engine for retrosynthetic pathway search over sparse reaction networks.
//!
//! Given a catalog of reactions and compounds, the engine builds a reusable
//! combinatorial model (the [`optimize::skeleton::Skeleton`]), persists it via
//! [`io::cache::SkeletonCache`], and answers per-target queries for the
//! minimum-size reaction set that produces a target compound from an
//! organism's native compounds, with cycle elimination and equal-cost
//! alternative enumeration. Batches of (target, organism) pairs run
//! concurrently through [`dispatch::run_batch`].

pub mod catalog;
pub mod configuration;
pub mod dispatch;
pub mod io;
pub mod optimize;
mod utils;
