//! Run-time observer for the 6502 interpreter.
//!
//! The interpreter invokes [`DebugState::on_instruction`] once per
//! instruction, before executing it. Depending on configuration the observer
//! prints a trace line, buffers the instruction into a bounded history, or
//! collects code/data/branch-target information for the translator —
//! partitioning execution into generations whenever self-modified code is
//! executed.

pub mod bitset;
pub mod debug;
pub mod ea;
pub mod emu;
pub mod generation;
pub mod history;
pub mod watch;

pub use bitset::BitSet;
pub use debug::DebugState;
pub use ea::operand_ea;
pub use emu::{Emu, StopReason};
pub use generation::{Generation, MemRange};
pub use history::{History, InstRecord};
pub use watch::{Watch, WatchList};
