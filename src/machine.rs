use std::fmt;
use std::fmt::Write;

use crate::error::{Error, Result};
use crate::framebuffer::Framebuffer;

pub const MEM_SIZE: usize = 4096;
pub const STACK_SIZE: usize = 16;
pub const KEY_COUNT: usize = 16;

/// Where programs are loaded and execution starts. Everything below is reserved for the
/// interpreter; we only use it to store the font sprites needed for instruction Fx29.
pub const PROGRAM_START: u16 = 0x200;
pub const MAX_PROGRAM_SIZE: usize = MEM_SIZE - PROGRAM_START as usize;

pub const FONT_START: u16 = 0x50;
pub const FONT_GLYPH_SIZE: u16 = 5;

const FONT: [u8; 5 * 16] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // '0'
    0x20, 0x60, 0x20, 0x20, 0x70, // '1'
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // '2'
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // '3'
    0x90, 0x90, 0xF0, 0x10, 0x10, // '4'
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // '5'
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // '6'
    0xF0, 0x10, 0x20, 0x40, 0x40, // '7'
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // '8'
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // '9'
    0xF0, 0x90, 0xF0, 0x90, 0x90, // 'A'
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // 'B'
    0xF0, 0x80, 0x80, 0x80, 0xF0, // 'C'
    0xE0, 0x90, 0x90, 0x90, 0xE0, // 'D'
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // 'E'
    0xF0, 0x80, 0xF0, 0x80, 0x80, // 'F'
];

/// Progress of an Fx0A instruction that waits for a key to be released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyWait {
    Idle,
    // Waiting, and no key has been released since the wait started.
    Waiting,
    Released(u8),
}

/// All mutable state of a CHIP-8 machine.
#[derive(Clone)]
pub struct Machine {
    // The address of the next instruction to execute.
    pub(crate) pc: u16,

    // Number of occupied `stack` entries. The original CHIP-8 supports up to 12 nested
    // calls. We allow up to 16.
    pub(crate) sp: usize,
    pub(crate) stack: [u16; STACK_SIZE],

    // 16 available registers named V0 through VF. VF is used as a flag in some instructions.
    pub(crate) v: [u8; 16],

    // The I register is used to address memory in some instructions.
    pub(crate) i: u16,

    // The delay timer and the sound timer count down at 60HZ when not zero. They are
    // decremented by the host, never by instruction execution.
    pub(crate) delay_timer: u8,
    pub(crate) sound_timer: u8,

    pub(crate) keys: [bool; KEY_COUNT],

    pub(crate) memory: [u8; MEM_SIZE],

    pub(crate) framebuffer: Framebuffer,

    // Set by the host once per frame, consumed by a draw when draws wait for the frame.
    pub(crate) frame_ready: bool,

    pub(crate) key_wait: KeyWait,
}

impl Machine {
    /// Construct a machine at the initial entry state: zeroed, with the font installed and
    /// the program counter at the program entry point.
    pub fn new() -> Self {
        let mut memory = [0u8; MEM_SIZE];
        let font_start = FONT_START as usize;
        memory[font_start..font_start + FONT.len()].copy_from_slice(&FONT);

        Machine {
            pc: PROGRAM_START,
            sp: 0,
            stack: [0; STACK_SIZE],
            v: [0; 16],
            i: 0,
            delay_timer: 0,
            sound_timer: 0,
            keys: [false; KEY_COUNT],
            memory,
            framebuffer: Framebuffer::new(),
            frame_ready: false,
            key_wait: KeyWait::Idle,
        }
    }

    /// Copy a program image to the entry point. Memory is left untouched if it does not fit.
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(Error::ProgramTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }

        let start = PROGRAM_START as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Checked view of `len` bytes of memory starting at `address`.
    pub(crate) fn slice(&self, address: usize, len: usize) -> Result<&[u8]> {
        match address.checked_add(len) {
            Some(end) if end <= MEM_SIZE => Ok(&self.memory[address..end]),
            _ => Err(Error::AddressOutOfRange { address, len }),
        }
    }

    /// Mutable counterpart of `slice`.
    pub(crate) fn slice_mut(&mut self, address: usize, len: usize) -> Result<&mut [u8]> {
        match address.checked_add(len) {
            Some(end) if end <= MEM_SIZE => Ok(&mut self.memory[address..end]),
            _ => Err(Error::AddressOutOfRange { address, len }),
        }
    }

    /// Address of the next instruction to execute.
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Number of return addresses on the call stack.
    pub fn sp(&self) -> usize {
        self.sp
    }

    /// The occupied part of the call stack, oldest return address first.
    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.sp]
    }

    /// Value of register V`x`. Only the low nibble of `x` is used.
    pub fn v(&self, x: usize) -> u8 {
        self.v[x & 0xF]
    }

    /// All sixteen V registers, V0 first.
    pub fn registers(&self) -> &[u8; 16] {
        &self.v
    }

    /// The I register.
    pub fn i(&self) -> u16 {
        self.i
    }

    /// Current delay timer value.
    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    /// Current sound timer value. The tone plays while it is non-zero.
    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// Pressed state of each key, indexed by key number.
    pub fn keys(&self) -> &[bool; KEY_COUNT] {
        &self.keys
    }

    /// The whole address space.
    pub fn memory(&self) -> &[u8; MEM_SIZE] {
        &self.memory
    }

    /// The display.
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Hex dump of memory from `start` to `end` inclusive, 32 bytes per line. Addresses past
    /// the end of memory are not dumped.
    pub fn hexdump(&self, start: u16, end: u16) -> String {
        const BYTES_PER_LINE: usize = 32;

        let start = start as usize;
        let end = (end as usize).min(MEM_SIZE - 1);
        let mut out = String::new();
        if start > end {
            return out;
        }

        for (line, chunk) in self.memory[start..=end].chunks(BYTES_PER_LINE).enumerate() {
            let line_start = start + line * BYTES_PER_LINE;
            let _ = write!(
                out,
                "0x{:04x}-0x{:04x}\t",
                line_start,
                line_start + BYTES_PER_LINE - 1
            );
            for byte in chunk {
                let _ = write!(out, "0x{:02x} ", byte);
            }
            out.push('\n');
        }
        out
    }
}

impl Default for Machine {
    fn default() -> Self {
        Machine::new()
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "PC={:04X} SP={:X} I={:04X} DT={:02X} ST={:02X}",
            self.pc, self.sp, self.i, self.delay_timer, self.sound_timer
        )?;
        for (idx, value) in self.v.iter().enumerate() {
            write!(f, " V{:X}={:02X}", idx, value)?;
        }

        f.write_str(" STACK=[")?;
        for (idx, address) in self.stack().iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{:04X}", address)?;
        }
        f.write_str("] KEYS=[")?;
        let held = (0..KEY_COUNT).filter(|&key| self.keys[key]);
        for (idx, key) in held.enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{:X}", key)?;
        }
        f.write_str("]")
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Machine")
            .field("pc", &self.pc)
            .field("stack", &self.stack())
            .field("v", &self.v)
            .field("i", &self.i)
            .field("delay_timer", &self.delay_timer)
            .field("sound_timer", &self.sound_timer)
            .field("keys", &self.keys)
            .field("frame_ready", &self.frame_ready)
            .field("key_wait", &self.key_wait)
            .finish()
    }
}
