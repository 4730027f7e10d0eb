//! Simulated table and launcher for the Reachy tic-tac-toe robot.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod recorder;
pub mod runner;
pub mod sim;
pub mod summary;

pub use runner::{PlayOptions, run};
pub use sim::{Opponent, SimTable};
pub use summary::Summary;
