//! Daily single-reservoir operations model driven by layered scenario data.
//!
//! The model resolves a baseline dataset plus a chain of override scenarios
//! into one attribute map, builds immutable input series from it, and walks
//! the simulation horizon one day at a time with a priority-based allocation
//! rule. Results are written back to the scenario service as a results-class
//! scenario.

pub mod cli;
pub mod engine;
pub mod error;
pub mod inputs;
pub mod literal;
pub mod network;
pub mod resolve;
pub mod run;
pub mod save;
pub mod series;
pub mod service;
pub mod sim;
