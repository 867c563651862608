//! A CHIP-8 interpreter core.
//!
//! The interpreter owns the whole machine state and calls out to the host only through an
//! [`Environment`] for random bytes and framebuffer-changed notifications. The host drives
//! it: `step` runs one instruction, `tick_timers` is called at 60HZ, and key events go
//! through `set_key`/`clear_key`.
//!
//! Compatibility switches between the historical interpreters are collected in [`Quirks`].
//! The `web` module wraps an interpreter for use from JavaScript.

mod decode;
mod environment;
mod error;
mod execute;
mod framebuffer;
mod interpreter;
mod machine;
mod quirks;
mod utils;
pub mod web;

pub use decode::{decode, Instruction, Opcode, Operands};
pub use environment::{
    Environment, NullEnvironment, RngEnvironment, ThreadRngEnvironment, FALLBACK_RANDOM_BYTE,
};
pub use error::{Error, Result};
pub use framebuffer::{Framebuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use interpreter::Interpreter;
pub use machine::{
    Machine, FONT_START, KEY_COUNT, MAX_PROGRAM_SIZE, MEM_SIZE, PROGRAM_START, STACK_SIZE,
};
pub use quirks::Quirks;
