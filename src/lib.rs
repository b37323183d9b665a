//! Situated Env - influence/reaction environment for multi-agent simulation
//!
//! Agents act through bodies placed in a bounded 2D world. Each tick the
//! environment collects the influences deposited on the bodies, resolves
//! conflicts, applies motions and hands fresh percepts back.

pub mod core;
pub mod environment;
pub mod geometry;
pub mod spatial;
