#![doc = include_str!("../README.md")]

mod alloc;
mod chart;
mod config;
mod error;
mod event;
mod firefox;
mod interval;
mod plot;
mod resample;
mod table;
mod trace;
mod unsafe_cell;

pub use alloc::*;
pub use chart::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use firefox::*;
pub use interval::*;
pub use plot::*;
pub use resample::*;
pub use table::*;
pub use trace::*;
