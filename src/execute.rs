use log::{debug, warn};

use crate::decode::{Instruction, Opcode, Operands};
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::framebuffer::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::interpreter::Interpreter;
use crate::machine::{KeyWait, FONT_GLYPH_SIZE, FONT_START, STACK_SIZE};

// Tallest sprite a Dxyn can draw.
const MAX_SPRITE_HEIGHT: usize = 15;

// Instruction implementations. Handlers run after the program counter has been advanced
// past the instruction, and must fail before modifying any state.
impl<E: Environment> Interpreter<E> {
    pub(crate) fn execute(&mut self, instruction: Instruction) -> Result<()> {
        let ops = instruction.operands;
        match instruction.opcode {
            Opcode::Sys => self.instr_0nnn(ops),
            Opcode::Cls => self.instr_00e0(),
            Opcode::Ret => self.instr_00ee()?,
            Opcode::Jp => self.instr_1nnn(ops),
            Opcode::Call => self.instr_2nnn(ops)?,
            Opcode::SeByte => self.instr_3xkk(ops),
            Opcode::SneByte => self.instr_4xkk(ops),
            Opcode::SeReg => self.instr_5xy0(ops),
            Opcode::LdByte => self.instr_6xkk(ops),
            Opcode::AddByte => self.instr_7xkk(ops),
            Opcode::LdReg => self.instr_8xy0(ops),
            Opcode::Or => self.instr_8xy1(ops),
            Opcode::And => self.instr_8xy2(ops),
            Opcode::Xor => self.instr_8xy3(ops),
            Opcode::AddReg => self.instr_8xy4(ops),
            Opcode::Sub => self.instr_8xy5(ops),
            Opcode::Shr => self.instr_8xy6(ops),
            Opcode::Subn => self.instr_8xy7(ops),
            Opcode::Shl => self.instr_8xye(ops),
            Opcode::SneReg => self.instr_9xy0(ops),
            Opcode::LdI => self.instr_annn(ops),
            Opcode::JpV0 => self.instr_bnnn(ops),
            Opcode::Rnd => self.instr_cxkk(ops),
            Opcode::Drw => self.instr_dxyn(ops)?,
            Opcode::Skp => self.instr_ex9e(ops),
            Opcode::Sknp => self.instr_exa1(ops),
            Opcode::LdVxDt => self.instr_fx07(ops),
            Opcode::LdVxK => self.instr_fx0a(ops),
            Opcode::LdDtVx => self.instr_fx15(ops),
            Opcode::LdStVx => self.instr_fx18(ops),
            Opcode::AddI => self.instr_fx1e(ops),
            Opcode::LdF => self.instr_fx29(ops),
            Opcode::LdB => self.instr_fx33(ops)?,
            Opcode::StoreRegs => self.instr_fx55(ops)?,
            Opcode::LoadRegs => self.instr_fx65(ops)?,
            Opcode::Unknown => warn!(
                "unknown instruction {:04X} at {:#05X}",
                instruction.word,
                self.current_address()
            ),
        }
        Ok(())
    }

    /// Address of the instruction being executed.
    fn current_address(&self) -> u16 {
        self.machine.pc.wrapping_sub(2)
    }

    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.machine.pc = self.machine.pc.wrapping_add(2);
        }
    }

    /// Re-present the current instruction on the next step.
    fn stall(&mut self) {
        self.machine.pc = self.current_address();
    }

    /// Execute `SYS addr` instruction
    fn instr_0nnn(&mut self, ops: Operands) {
        // Machine code routines of the host CPU can't run here.
        debug!(
            "ignoring SYS {:#05X} at {:#05X}",
            ops.nnn,
            self.current_address()
        );
    }

    /// Execute `CLS` instruction
    fn instr_00e0(&mut self) {
        self.machine.framebuffer.clear();
        self.environment
            .on_framebuffer_changed(&self.machine.framebuffer);
    }

    /// Execute `RET` instruction
    fn instr_00ee(&mut self) -> Result<()> {
        if self.machine.sp == 0 {
            return Err(Error::StackUnderflow {
                pc: self.current_address(),
            });
        }

        // Reclaim top of stack
        self.machine.sp -= 1;
        // The stored address already points past the CALL.
        self.machine.pc = self.machine.stack[self.machine.sp];
        Ok(())
    }

    /// Execute `JP addr` instruction
    fn instr_1nnn(&mut self, ops: Operands) {
        self.machine.pc = ops.nnn;
    }

    /// Execute `CALL addr` instruction
    fn instr_2nnn(&mut self, ops: Operands) -> Result<()> {
        if self.machine.sp >= STACK_SIZE {
            return Err(Error::StackOverflow {
                pc: self.current_address(),
            });
        }

        // Store the return address at the top of the call stack
        self.machine.stack[self.machine.sp] = self.machine.pc;
        self.machine.sp += 1;
        self.machine.pc = ops.nnn;
        Ok(())
    }

    /// Execute `SE Vx, byte` instruction
    fn instr_3xkk(&mut self, ops: Operands) {
        self.skip_if(self.machine.v[ops.x] == ops.kk);
    }

    /// Execute `SNE Vx, byte` instruction
    fn instr_4xkk(&mut self, ops: Operands) {
        self.skip_if(self.machine.v[ops.x] != ops.kk);
    }

    /// Execute `SE Vx, Vy` instruction
    fn instr_5xy0(&mut self, ops: Operands) {
        self.skip_if(self.machine.v[ops.x] == self.machine.v[ops.y]);
    }

    /// Execute `LD Vx, byte` instruction
    fn instr_6xkk(&mut self, ops: Operands) {
        self.machine.v[ops.x] = ops.kk;
    }

    /// Execute `ADD Vx, byte` instruction
    fn instr_7xkk(&mut self, ops: Operands) {
        let v = &mut self.machine.v;
        v[ops.x] = v[ops.x].wrapping_add(ops.kk);
    }

    /// Execute `LD Vx, Vy` instruction
    fn instr_8xy0(&mut self, ops: Operands) {
        self.machine.v[ops.x] = self.machine.v[ops.y];
    }

    /// Execute `OR Vx, Vy` instruction
    fn instr_8xy1(&mut self, ops: Operands) {
        self.machine.v[ops.x] |= self.machine.v[ops.y];
        self.reset_flag_after_logic_op();
    }

    /// Execute `AND Vx, Vy` instruction
    fn instr_8xy2(&mut self, ops: Operands) {
        self.machine.v[ops.x] &= self.machine.v[ops.y];
        self.reset_flag_after_logic_op();
    }

    /// Execute `XOR Vx, Vy` instruction
    fn instr_8xy3(&mut self, ops: Operands) {
        self.machine.v[ops.x] ^= self.machine.v[ops.y];
        self.reset_flag_after_logic_op();
    }

    fn reset_flag_after_logic_op(&mut self) {
        // The VIP interpreter ran logic ops through a routine that clobbered VF.
        if self.quirks.reset_flag_on_logic_ops {
            self.machine.v[0xF] = 0;
        }
    }

    /// Execute `ADD Vx, Vy` instruction
    fn instr_8xy4(&mut self, ops: Operands) {
        let v = &mut self.machine.v;
        let (sum, carry) = v[ops.x].overflowing_add(v[ops.y]);

        // VF acts as a carry flag and is written last, so it wins when x is F.
        v[ops.x] = sum;
        v[0xF] = carry as u8;
    }

    /// Execute `SUB Vx, Vy` instruction
    fn instr_8xy5(&mut self, ops: Operands) {
        let v = &mut self.machine.v;
        let (diff, borrow) = v[ops.x].overflowing_sub(v[ops.y]);

        // VF acts as a NOT borrow flag
        v[ops.x] = diff;
        v[0xF] = (!borrow) as u8;
    }

    /// Execute `SHR Vx, Vy` instruction
    fn instr_8xy6(&mut self, ops: Operands) {
        let source = self.shift_source(ops);
        let shifted_bit = source & 1;
        self.machine.v[ops.x] = source >> 1;
        // VF holds the LSB that was shifted out
        self.machine.v[0xF] = shifted_bit;
    }

    /// Execute `SUBN Vx, Vy` instruction
    fn instr_8xy7(&mut self, ops: Operands) {
        let v = &mut self.machine.v;
        let (diff, borrow) = v[ops.y].overflowing_sub(v[ops.x]);

        // VF acts as a NOT borrow flag
        v[ops.x] = diff;
        v[0xF] = (!borrow) as u8;
    }

    /// Execute `SHL Vx, Vy` instruction
    fn instr_8xye(&mut self, ops: Operands) {
        let source = self.shift_source(ops);
        let shifted_bit = (source >> 7) & 1;
        self.machine.v[ops.x] = source << 1;
        // VF holds the MSB that was shifted out
        self.machine.v[0xF] = shifted_bit;
    }

    /// The value a shift operates on. The original interpreter shifts Vy into Vx; CHIP-48 and
    /// later ignore Vy and shift Vx in place.
    fn shift_source(&self, ops: Operands) -> u8 {
        if self.quirks.shift_uses_vx_only {
            self.machine.v[ops.x]
        } else {
            self.machine.v[ops.y]
        }
    }

    /// Execute `SNE Vx, Vy` instruction
    fn instr_9xy0(&mut self, ops: Operands) {
        self.skip_if(self.machine.v[ops.x] != self.machine.v[ops.y]);
    }

    /// Execute `LD I, addr` instruction
    fn instr_annn(&mut self, ops: Operands) {
        self.machine.i = ops.nnn;
    }

    /// Execute `JP V0, addr` instruction
    fn instr_bnnn(&mut self, ops: Operands) {
        // CHIP-48 misread this as `JP Vx, addr`, with x taken from the address.
        let offset = if self.quirks.jump_uses_vx_high_nibble {
            self.machine.v[ops.x]
        } else {
            self.machine.v[0]
        };
        self.machine.pc = ops.nnn + offset as u16;
    }

    /// Execute `RND Vx, byte` instruction
    fn instr_cxkk(&mut self, ops: Operands) {
        self.machine.v[ops.x] = self.environment.random_byte() & ops.kk;
    }

    /// Execute `DRW Vx, Vy, nibble` instruction
    fn instr_dxyn(&mut self, ops: Operands) -> Result<()> {
        if self.quirks.wait_for_frame_before_draw && !self.machine.frame_ready {
            self.stall();
            return Ok(());
        }

        // A sprite is a bit-packed bitmap: 8 pixels wide, one byte per row, MSB leftmost.
        let height = ops.n as usize;
        let mut sprite = [0u8; MAX_SPRITE_HEIGHT];
        sprite[..height].copy_from_slice(self.machine.slice(self.machine.i as usize, height)?);

        self.machine.frame_ready = false;

        // The anchor always wraps; the rest of the sprite clips or wraps per the quirk.
        let sprite_x = self.machine.v[ops.x] as usize % SCREEN_WIDTH;
        let sprite_y = self.machine.v[ops.y] as usize % SCREEN_HEIGHT;
        let clip = self.quirks.clip_sprites_at_edges;

        let mut collision = false;
        for (row, &bits) in sprite[..height].iter().enumerate() {
            let pixel_y = sprite_y + row;
            let pixel_y = if pixel_y < SCREEN_HEIGHT {
                pixel_y
            } else if clip {
                break;
            } else {
                pixel_y % SCREEN_HEIGHT
            };

            collision |= self
                .machine
                .framebuffer
                .xor_row(sprite_x, pixel_y, bits, clip);
        }

        // When drawing sprites, VF acts as collision flag
        self.machine.v[0xF] = collision as u8;

        self.environment
            .on_framebuffer_changed(&self.machine.framebuffer);
        Ok(())
    }

    /// Execute `SKP Vx` instruction
    fn instr_ex9e(&mut self, ops: Operands) {
        let key = self.machine.v[ops.x] as usize % 16;
        self.skip_if(self.machine.keys[key]);
    }

    /// Execute `SKNP Vx` instruction
    fn instr_exa1(&mut self, ops: Operands) {
        let key = self.machine.v[ops.x] as usize % 16;
        self.skip_if(!self.machine.keys[key]);
    }

    /// Execute `LD Vx, DT` instruction
    fn instr_fx07(&mut self, ops: Operands) {
        self.machine.v[ops.x] = self.machine.delay_timer;
    }

    /// Execute `LD Vx, K` instruction
    fn instr_fx0a(&mut self, ops: Operands) {
        if self.quirks.wait_for_key_release {
            match self.machine.key_wait {
                KeyWait::Released(key) => {
                    self.machine.v[ops.x] = key;
                    self.machine.key_wait = KeyWait::Idle;
                    return;
                }
                KeyWait::Idle => self.machine.key_wait = KeyWait::Waiting,
                KeyWait::Waiting => {}
            }
        } else if let Some(key) = self.machine.keys.iter().position(|&down| down) {
            self.machine.v[ops.x] = key as u8;
            return;
        }

        // No key yet: execute this instruction again on the next step.
        self.stall();
    }

    /// Execute `LD DT, Vx` instruction
    fn instr_fx15(&mut self, ops: Operands) {
        self.machine.delay_timer = self.machine.v[ops.x];
    }

    /// Execute `LD ST, Vx` instruction
    fn instr_fx18(&mut self, ops: Operands) {
        self.machine.sound_timer = self.machine.v[ops.x];
    }

    /// Execute `ADD I, Vx` instruction
    fn instr_fx1e(&mut self, ops: Operands) {
        self.machine.i = self.machine.i.wrapping_add(self.machine.v[ops.x] as u16);
    }

    /// Execute `LD F, Vx` instruction
    fn instr_fx29(&mut self, ops: Operands) {
        let digit = self.machine.v[ops.x] as u16;
        self.machine.i = FONT_START + FONT_GLYPH_SIZE * digit;
    }

    /// Execute `LD B, Vx` instruction
    fn instr_fx33(&mut self, ops: Operands) -> Result<()> {
        let value = self.machine.v[ops.x];
        let bcd = self.machine.slice_mut(self.machine.i as usize, 3)?;
        bcd[0] = value / 100;
        bcd[1] = (value / 10) % 10;
        bcd[2] = value % 10;
        Ok(())
    }

    /// Execute `LD [I], Vx` instruction
    fn instr_fx55(&mut self, ops: Operands) -> Result<()> {
        let count = ops.x + 1;
        let registers = self.machine.v;
        self.machine
            .slice_mut(self.machine.i as usize, count)?
            .copy_from_slice(&registers[..count]);
        self.advance_index_after_block_transfer(count);
        Ok(())
    }

    /// Execute `LD Vx, [I]` instruction
    fn instr_fx65(&mut self, ops: Operands) -> Result<()> {
        let count = ops.x + 1;
        let mut values = [0u8; 16];
        values[..count].copy_from_slice(self.machine.slice(self.machine.i as usize, count)?);
        self.machine.v[..count].copy_from_slice(&values[..count]);
        self.advance_index_after_block_transfer(count);
        Ok(())
    }

    fn advance_index_after_block_transfer(&mut self, count: usize) {
        // The COSMAC VIP interpreter incremented I in the transfer loop.
        if self.quirks.increment_index_on_block_transfer {
            self.machine.i = self.machine.i.wrapping_add(count as u16);
        }
    }
}
