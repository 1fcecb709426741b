//! Module for persisting and reloading built skeletons
pub mod cache;
