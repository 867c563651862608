use log::trace;

use crate::decode::decode;
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::framebuffer::Framebuffer;
use crate::machine::{KeyWait, Machine, KEY_COUNT, MEM_SIZE};
use crate::quirks::Quirks;

/// A CHIP-8 interpreter: the machine state plus the host services it calls out to.
///
/// The host drives it by calling `step` as fast as it wants instructions to run and
/// `tick_timers` at 60HZ.
pub struct Interpreter<E: Environment> {
    pub(crate) machine: Machine,
    pub(crate) environment: E,
    pub(crate) quirks: Quirks,
}

impl<E: Environment> Interpreter<E> {
    /// Construct an interpreter at the initial entry state, with the COSMAC VIP quirks.
    ///
    /// # Examples
    ///
    /// ```
    /// use chip8_vm::{Interpreter, NullEnvironment};
    ///
    /// let mut interp = Interpreter::new(NullEnvironment);
    /// interp.load_program(&[0x60, 0x2A]).unwrap(); // LD V0, 0x2A
    /// interp.step().unwrap();
    /// assert_eq!(interp.machine().v(0), 0x2A);
    /// ```
    pub fn new(environment: E) -> Self {
        Interpreter::with_quirks(environment, Quirks::default())
    }

    /// Construct an interpreter at the initial entry state with the given quirks.
    pub fn with_quirks(environment: E, quirks: Quirks) -> Self {
        Interpreter {
            machine: Machine::new(),
            environment,
            quirks,
        }
    }

    /// Return the machine to its initial entry state. Environment and quirks are kept; the
    /// program has to be loaded again.
    pub fn reset(&mut self) {
        self.machine = Machine::new();
    }

    /// Copy a program image to the entry point. Fails without touching memory if the image
    /// is larger than program memory.
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        self.machine.load_program(program)
    }

    /// Fetch, decode and execute one instruction.
    ///
    /// On error the program counter is left pointing at the faulting instruction and no
    /// other state has been modified.
    pub fn step(&mut self) -> Result<()> {
        let pc = self.machine.pc;
        let word = self.fetch()?;
        let instruction = decode(word);

        trace!("{:#05X}: {:04X} {:?}", pc, word, instruction.opcode);

        if let Err(err) = self.execute(instruction) {
            self.machine.pc = pc;
            return Err(err);
        }
        Ok(())
    }

    /// Tick the delay and sound timers. Must be called at 60HZ.
    pub fn tick_timers(&mut self) {
        if self.machine.delay_timer > 0 {
            self.machine.delay_timer -= 1;
        }

        if self.machine.sound_timer > 0 {
            self.machine.sound_timer -= 1;
        }
    }

    /// Mark `key` as held down.
    pub fn set_key(&mut self, key: u8) -> Result<()> {
        let idx = key_index(key)?;
        self.machine.keys[idx] = true;
        Ok(())
    }

    /// Mark `key` as released.
    pub fn clear_key(&mut self, key: u8) -> Result<()> {
        let idx = key_index(key)?;
        let was_down = std::mem::replace(&mut self.machine.keys[idx], false);

        if was_down && self.machine.key_wait == KeyWait::Waiting {
            self.machine.key_wait = KeyWait::Released(key);
        }
        Ok(())
    }

    /// Signal the start of a new frame, allowing one draw when draws wait for the frame.
    pub fn signal_frame(&mut self) {
        self.machine.frame_ready = true;
    }

    /// Returns true if the host should be playing a tone.
    pub fn sound_active(&self) -> bool {
        self.machine.sound_timer > 0
    }

    /// Read-only view of the machine state.
    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// The current display contents.
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.machine.framebuffer
    }

    /// The compatibility switches this interpreter runs with.
    pub fn quirks(&self) -> &Quirks {
        &self.quirks
    }

    /// The host environment.
    pub fn environment(&self) -> &E {
        &self.environment
    }

    /// Mutable access to the host environment, e.g. to reseed or inspect it.
    pub fn environment_mut(&mut self) -> &mut E {
        &mut self.environment
    }

    /// Read the big-endian instruction word at the program counter and advance past it.
    fn fetch(&mut self) -> Result<u16> {
        let pc = self.machine.pc as usize;
        if pc + 1 >= MEM_SIZE {
            return Err(Error::AddressOutOfRange { address: pc, len: 2 });
        }

        let word = u16::from_be_bytes([self.machine.memory[pc], self.machine.memory[pc + 1]]);
        self.machine.pc += 2;
        Ok(word)
    }
}

fn key_index(key: u8) -> Result<usize> {
    let idx = key as usize;
    if idx < KEY_COUNT {
        Ok(idx)
    } else {
        Err(Error::InvalidKey(key))
    }
}
