//! # HierLib
//!
//! Hierlib is a library for trace driven simulation of multi-level cache hierarchies
//!
//! It replays a trace of instruction fetches, loads and stores through a tree of set-associative,
//! write-allocate, write-back caches rooted at main memory, and reports every access which falls
//! through to main memory, in order. Replay is deterministic, so the same trace and configuration
//! always produce the same stream of memory events.
//!
//! Replacement policies are pluggable, and logging goes through the `log` facade so the embedding
//! program decides where diagnostics end up

/// Splits references into the per-block accesses the caches see
pub mod access;

/// Contains the cache level implementation
pub mod cache;

/// Contains definitions for the JSON configuration format, and the Nehalem preset
pub mod config;

/// Error types for parsing, configuration and simulation
pub mod error;

/// Composes cache levels into a hierarchy and routes accesses into it
pub mod hierarchy;

/// Helpers for reading trace files
pub mod io;

/// Main memory sinks, which receive everything that misses the whole hierarchy
pub mod memory;

/// Parses trace lines into references
pub mod reference;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the simulator used to replay a trace through a configured hierarchy
pub mod simulator;

#[cfg(test)]
mod test;

/// Contains utilities for running tests and benchmarks.
pub mod util;
