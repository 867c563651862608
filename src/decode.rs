/// Operand fields of an instruction word. Every handler picks the fields it needs; the
/// rest are meaningless for that instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operands {
    /// Bits 8-11, usually a register index.
    pub x: usize,
    /// Bits 4-7, usually a register index.
    pub y: usize,
    /// Bits 0-3.
    pub n: u8,
    /// Bits 0-7.
    pub kk: u8,
    /// Bits 0-11, an address.
    pub nnn: u16,
}

impl Operands {
    pub fn from_word(word: u16) -> Self {
        Operands {
            x: decode_instr_x_reg(word),
            y: decode_instr_y_reg(word),
            n: decode_instr_nibble_imm(word),
            kk: decode_instr_byte_imm(word),
            nnn: decode_instr_addr(word),
        }
    }
}

/// Instructions, named after the conventional CHIP-8 mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// `0nnn` SYS addr
    Sys,
    /// `00E0` CLS
    Cls,
    /// `00EE` RET
    Ret,
    /// `1nnn` JP addr
    Jp,
    /// `2nnn` CALL addr
    Call,
    /// `3xkk` SE Vx, byte
    SeByte,
    /// `4xkk` SNE Vx, byte
    SneByte,
    /// `5xy0` SE Vx, Vy
    SeReg,
    /// `6xkk` LD Vx, byte
    LdByte,
    /// `7xkk` ADD Vx, byte
    AddByte,
    /// `8xy0` LD Vx, Vy
    LdReg,
    /// `8xy1` OR Vx, Vy
    Or,
    /// `8xy2` AND Vx, Vy
    And,
    /// `8xy3` XOR Vx, Vy
    Xor,
    /// `8xy4` ADD Vx, Vy
    AddReg,
    /// `8xy5` SUB Vx, Vy
    Sub,
    /// `8xy6` SHR Vx, Vy
    Shr,
    /// `8xy7` SUBN Vx, Vy
    Subn,
    /// `8xyE` SHL Vx, Vy
    Shl,
    /// `9xy0` SNE Vx, Vy
    SneReg,
    /// `Annn` LD I, addr
    LdI,
    /// `Bnnn` JP V0, addr
    JpV0,
    /// `Cxkk` RND Vx, byte
    Rnd,
    /// `Dxyn` DRW Vx, Vy, nibble
    Drw,
    /// `Ex9E` SKP Vx
    Skp,
    /// `ExA1` SKNP Vx
    Sknp,
    /// `Fx07` LD Vx, DT
    LdVxDt,
    /// `Fx0A` LD Vx, K
    LdVxK,
    /// `Fx15` LD DT, Vx
    LdDtVx,
    /// `Fx18` LD ST, Vx
    LdStVx,
    /// `Fx1E` ADD I, Vx
    AddI,
    /// `Fx29` LD F, Vx
    LdF,
    /// `Fx33` LD B, Vx
    LdB,
    /// `Fx55` LD [I], Vx
    StoreRegs,
    /// `Fx65` LD Vx, [I]
    LoadRegs,
    /// Any word that matches none of the above.
    Unknown,
}

/// A decoded instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub word: u16,
    pub opcode: Opcode,
    pub operands: Operands,
}

/// Decode an instruction word. Never fails: unrecognised words decode to `Opcode::Unknown`.
pub fn decode(word: u16) -> Instruction {
    Instruction {
        word,
        opcode: decode_opcode(word),
        operands: Operands::from_word(word),
    }
}

fn decode_opcode(word: u16) -> Opcode {
    // The instruction type is determined by the most significant nibble.
    match (word & 0xF000) >> 12 {
        0x0 => match word {
            0x00E0 => Opcode::Cls,
            0x00EE => Opcode::Ret,
            _ => Opcode::Sys,
        },
        0x1 => Opcode::Jp,
        0x2 => Opcode::Call,
        0x3 => Opcode::SeByte,
        0x4 => Opcode::SneByte,
        0x5 if word & 0xF == 0 => Opcode::SeReg,
        0x6 => Opcode::LdByte,
        0x7 => Opcode::AddByte,
        // Arithmetic and logic operations: 8xyT, where the last nibble determines the
        // operation type.
        0x8 => match word & 0xF {
            0x0 => Opcode::LdReg,
            0x1 => Opcode::Or,
            0x2 => Opcode::And,
            0x3 => Opcode::Xor,
            0x4 => Opcode::AddReg,
            0x5 => Opcode::Sub,
            0x6 => Opcode::Shr,
            0x7 => Opcode::Subn,
            0xE => Opcode::Shl,
            _ => Opcode::Unknown,
        },
        0x9 if word & 0xF == 0 => Opcode::SneReg,
        0xA => Opcode::LdI,
        0xB => Opcode::JpV0,
        0xC => Opcode::Rnd,
        0xD => Opcode::Drw,
        // Keyboard flow control: ExTT, where the last byte determines the type.
        0xE => match word & 0xFF {
            0x9E => Opcode::Skp,
            0xA1 => Opcode::Sknp,
            _ => Opcode::Unknown,
        },
        // Peripheral devices and memory: FxTT, where the last byte determines the type.
        0xF => match word & 0xFF {
            0x07 => Opcode::LdVxDt,
            0x0A => Opcode::LdVxK,
            0x15 => Opcode::LdDtVx,
            0x18 => Opcode::LdStVx,
            0x1E => Opcode::AddI,
            0x29 => Opcode::LdF,
            0x33 => Opcode::LdB,
            0x55 => Opcode::StoreRegs,
            0x65 => Opcode::LoadRegs,
            _ => Opcode::Unknown,
        },
        _ => Opcode::Unknown,
    }
}

/// Decodes a memory address from a CHIP-8 instruction
fn decode_instr_addr(instr: u16) -> u16 {
    instr & 0x0FFF
}

/// Decodes the first register from a CHIP-8 instruction
fn decode_instr_x_reg(instr: u16) -> usize {
    ((instr & 0x0F00) >> 8) as usize
}

/// Decodes the second register from a CHIP-8 instruction
fn decode_instr_y_reg(instr: u16) -> usize {
    ((instr & 0x00F0) >> 4) as usize
}

/// Decodes a byte-sized immediate from a CHIP-8 instruction
fn decode_instr_byte_imm(instr: u16) -> u8 {
    (instr & 0x00FF) as u8
}

/// Decodes a nibble-sized immediate from a CHIP-8 instruction
fn decode_instr_nibble_imm(instr: u16) -> u8 {
    (instr & 0x000F) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_fields() {
        let ops = Operands::from_word(0xD12F);
        assert_eq!(ops.x, 0x1);
        assert_eq!(ops.y, 0x2);
        assert_eq!(ops.n, 0xF);
        assert_eq!(ops.kk, 0x2F);
        assert_eq!(ops.nnn, 0x12F);
    }

    #[test]
    fn zero_family() {
        assert_eq!(decode(0x00E0).opcode, Opcode::Cls);
        assert_eq!(decode(0x00EE).opcode, Opcode::Ret);
        assert_eq!(decode(0x0123).opcode, Opcode::Sys);
        assert_eq!(decode(0x0000).opcode, Opcode::Sys);
    }

    #[test]
    fn every_documented_opcode() {
        let table = [
            (0x1234, Opcode::Jp),
            (0x2345, Opcode::Call),
            (0x3A12, Opcode::SeByte),
            (0x4A12, Opcode::SneByte),
            (0x5AB0, Opcode::SeReg),
            (0x6A12, Opcode::LdByte),
            (0x7A12, Opcode::AddByte),
            (0x8AB0, Opcode::LdReg),
            (0x8AB1, Opcode::Or),
            (0x8AB2, Opcode::And),
            (0x8AB3, Opcode::Xor),
            (0x8AB4, Opcode::AddReg),
            (0x8AB5, Opcode::Sub),
            (0x8AB6, Opcode::Shr),
            (0x8AB7, Opcode::Subn),
            (0x8ABE, Opcode::Shl),
            (0x9AB0, Opcode::SneReg),
            (0xA123, Opcode::LdI),
            (0xB123, Opcode::JpV0),
            (0xCA12, Opcode::Rnd),
            (0xDAB5, Opcode::Drw),
            (0xEA9E, Opcode::Skp),
            (0xEAA1, Opcode::Sknp),
            (0xFA07, Opcode::LdVxDt),
            (0xFA0A, Opcode::LdVxK),
            (0xFA15, Opcode::LdDtVx),
            (0xFA18, Opcode::LdStVx),
            (0xFA1E, Opcode::AddI),
            (0xFA29, Opcode::LdF),
            (0xFA33, Opcode::LdB),
            (0xFA55, Opcode::StoreRegs),
            (0xFA65, Opcode::LoadRegs),
        ];

        for &(word, opcode) in table.iter() {
            assert_eq!(decode(word).opcode, opcode, "decoding {:04X}", word);
        }
    }

    #[test]
    fn unknown_patterns() {
        for &word in [0x5AB1, 0x8AB8, 0x8ABF, 0x9AB1, 0xEA9F, 0xFA00, 0xFAFF].iter() {
            assert_eq!(decode(word).opcode, Opcode::Unknown, "decoding {:04X}", word);
        }
    }

    #[test]
    fn decode_is_total() {
        for word in 0..=u16::MAX {
            let instr = decode(word);
            assert_eq!(instr.word, word);
            assert!(instr.operands.x < 16 && instr.operands.y < 16);
        }
    }
}
