//! Mooshak - Real-Time Micromouse Maze Simulator
//!
//! Simulates a small autonomous robot navigating a discrete maze in
//! real time, driven by an independently executing solving algorithm
//! through either a discretized command interface or a continuous
//! physical one.
//!
//! ## Multi-Threaded Architecture
//!
//! Three activities run concurrently for the lifetime of a run:
//!
//! - **Physics Thread** (~200Hz): Free-running tick loop that applies
//!   queued commands, integrates motion from measured elapsed time, and
//!   detects collisions
//! - **Algorithm Thread(s)**: The built-in solver, or the reader /
//!   worker / writer trio bridging an external algorithm process
//! - **Renderer** (external): Reads maze display state and the robot
//!   pose through the shared view and a per-tick notification hook

pub mod channel;
pub mod config;
pub mod error;
pub mod interface;
pub mod maze;
pub mod mouse;
pub mod solver;
pub mod view;
pub mod world;

pub use config::SimConfig;
pub use error::{Error, Result};
