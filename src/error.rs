use thiserror::Error;

/// Conditions that abort a step or a program load.
///
/// Unknown instructions are not errors: they are logged and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("CALL at {pc:#05X} with a full call stack")]
    StackOverflow { pc: u16 },

    #[error("RET at {pc:#05X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("memory access of {len} byte(s) at {address:#06X} is out of bounds")]
    AddressOutOfRange { address: usize, len: usize },

    #[error("program is too large ({size} bytes), max size is {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("invalid key {0:#X}, keys are 0x0 through 0xF")]
    InvalidKey(u8),
}

pub type Result<T> = std::result::Result<T, Error>;
