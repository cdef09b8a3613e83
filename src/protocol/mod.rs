//! Wire protocol for Corsair Hydro H80i V2 coolers.
//!
//! This module contains the opcode table, the 64-byte frame builder, and
//! the status decoder. Nothing in here touches USB.

pub mod commands;
pub mod status;

pub use commands::*;
pub use status::*;
