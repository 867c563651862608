//! Browser front end: exposes an interpreter to JavaScript, which owns the canvas, the
//! keyboard and the 60HZ timer.

use rand::rngs::ThreadRng;
use rand::Rng;
use wasm_bindgen::prelude::*;

use crate::environment::Environment;
use crate::error::Error;
use crate::framebuffer::{Framebuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::interpreter::Interpreter;
use crate::machine::KEY_COUNT;
use crate::quirks::Quirks;
use crate::utils;

/// Environment for the browser: `rand` randomness and an unpacked copy of the framebuffer
/// that JavaScript reads directly out of wasm memory.
struct WebEnvironment {
    rng: ThreadRng,
    // One `bool` per pixel, row-major. A pixel is `true` if it is turned on.
    screen_buffer: [bool; SCREEN_WIDTH * SCREEN_HEIGHT],
    // Set whenever the screen buffer changes. The actual display must update and then
    // clear this flag.
    screen_dirty: bool,
}

impl WebEnvironment {
    fn new() -> Self {
        WebEnvironment {
            rng: rand::thread_rng(),
            screen_buffer: [false; SCREEN_WIDTH * SCREEN_HEIGHT],
            screen_dirty: false,
        }
    }
}

impl Environment for WebEnvironment {
    fn random_byte(&mut self) -> u8 {
        self.rng.gen::<u8>()
    }

    fn on_framebuffer_changed(&mut self, framebuffer: &Framebuffer) {
        for (idx, pixel) in self.screen_buffer.iter_mut().enumerate() {
            *pixel = framebuffer.pixel(idx % SCREEN_WIDTH, idx / SCREEN_WIDTH);
        }
        self.screen_dirty = true;
    }
}

fn to_js(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Send interpreter logs to the browser console at `level` ("error" through "trace").
#[wasm_bindgen]
pub fn init_logging(level: &str) -> Result<(), JsValue> {
    let level = level
        .parse::<log::LevelFilter>()
        .map_err(|_| JsValue::from_str("unknown log level"))?;
    utils::init_console_logger(level);
    Ok(())
}

#[wasm_bindgen]
/// Represents a CHIP-8 CPU
pub struct Cpu {
    interp: Interpreter<WebEnvironment>,
}

#[wasm_bindgen]
impl Cpu {
    /// Construct a CHIP-8 cpu at the initial entry state, with the COSMAC VIP quirks.
    pub fn new() -> Self {
        utils::set_panic_hook();

        Cpu {
            interp: Interpreter::new(WebEnvironment::new()),
        }
    }

    /// Construct a CHIP-8 cpu at the initial entry state, with rom bytes loaded at the entry
    /// point in memory.
    pub fn with_rom(rom: &[u8]) -> Result<Cpu, JsValue> {
        let mut cpu = Cpu::new();
        cpu.interp.load_program(rom).map_err(to_js)?;
        Ok(cpu)
    }

    /// Construct a CHIP-8 cpu with rom bytes loaded and each quirk chosen explicitly. See
    /// `Quirks` for what each flag does.
    pub fn with_rom_and_options(
        rom: &[u8],
        reset_flag_on_logic_ops: bool,
        shift_uses_vx_only: bool,
        jump_uses_vx_high_nibble: bool,
        clip_sprites_at_edges: bool,
        wait_for_frame_before_draw: bool,
        increment_index_on_block_transfer: bool,
        wait_for_key_release: bool,
    ) -> Result<Cpu, JsValue> {
        utils::set_panic_hook();

        let quirks = Quirks {
            reset_flag_on_logic_ops,
            shift_uses_vx_only,
            jump_uses_vx_high_nibble,
            clip_sprites_at_edges,
            wait_for_frame_before_draw,
            increment_index_on_block_transfer,
            wait_for_key_release,
        };
        let mut cpu = Cpu {
            interp: Interpreter::with_quirks(WebEnvironment::new(), quirks),
        };
        cpu.interp.load_program(rom).map_err(to_js)?;
        Ok(cpu)
    }

    /// Decode and execute one instruction. A rejected step leaves the cpu at the faulting
    /// instruction; calling `step` again fails the same way.
    /// It is the responsibility of the caller to check the `screen_dirty` flag and update the
    /// display if needed.
    pub fn step(&mut self) -> Result<(), JsValue> {
        self.interp.step().map_err(to_js)
    }

    /// Tick internal cpu timers and start a new frame. Must be called at 60HZ.
    pub fn tick_clock(&mut self) {
        self.interp.tick_timers();
        self.interp.signal_frame();
    }

    /// Get a pointer to the screen buffer memory, used from the JS side to render the screen.
    pub fn get_screen_buffer(&self) -> *const bool {
        self.interp.environment().screen_buffer.as_ptr()
    }

    /// Returns whether or not the screen dirty, and if it is, sets it to false.
    pub fn handle_screen_dirty_flag(&mut self) -> bool {
        std::mem::replace(&mut self.interp.environment_mut().screen_dirty, false)
    }

    /// Update the internal key state to the provided key state, one byte per key, non-zero
    /// meaning pressed. `new_key_state` must be of length 16.
    pub fn update_key_state(&mut self, new_key_state: &[u8]) -> Result<(), JsValue> {
        if new_key_state.len() != KEY_COUNT {
            return Err(JsValue::from_str("key state must have exactly 16 entries"));
        }

        for (key, &pressed) in new_key_state.iter().enumerate() {
            let key = key as u8;
            if pressed != 0 {
                self.interp.set_key(key).map_err(to_js)?;
            } else {
                self.interp.clear_key(key).map_err(to_js)?;
            }
        }
        Ok(())
    }

    /// Returns true if the emulator should play a tone
    pub fn should_play_tone(&self) -> bool {
        self.interp.sound_active()
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Cpu::new()
    }
}
