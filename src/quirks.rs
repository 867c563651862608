/// Options that change how some instructions operate. Used to run programs that depend on
/// the behaviour of a particular historical interpreter.
///
/// `Quirks::default()` follows the original COSMAC VIP interpreter, except that draws do
/// not wait for a frame: that needs the host to call `Interpreter::signal_frame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    /// OR, AND and XOR (8xy1/8xy2/8xy3) reset VF to zero.
    pub reset_flag_on_logic_ops: bool,

    /// The shift instructions (8xy6/8xyE) shift Vx in place and ignore Vy. When false, Vy is
    /// copied into Vx and then shifted.
    pub shift_uses_vx_only: bool,

    /// Bnnn jumps to nnn + Vx, where x is the high nibble of nnn, instead of nnn + V0.
    pub jump_uses_vx_high_nibble: bool,

    /// Sprites that extend past the right or bottom edge are clipped. When false they wrap
    /// around to the opposite edge.
    pub clip_sprites_at_edges: bool,

    /// Dxyn draws at most once per frame and stalls until the host signals a new frame.
    pub wait_for_frame_before_draw: bool,

    /// Fx55 and Fx65 leave I pointing past the last register transferred.
    pub increment_index_on_block_transfer: bool,

    /// Fx0A completes when a key is released rather than as soon as one is held down.
    pub wait_for_key_release: bool,
}

impl Quirks {
    /// The COSMAC VIP behaviour.
    pub const fn vip() -> Self {
        Quirks {
            reset_flag_on_logic_ops: true,
            shift_uses_vx_only: false,
            jump_uses_vx_high_nibble: false,
            clip_sprites_at_edges: true,
            wait_for_frame_before_draw: false,
            increment_index_on_block_transfer: true,
            wait_for_key_release: false,
        }
    }

    /// Behaviour of the CHIP-48/SUPER-CHIP interpreters most later programs were written for.
    pub const fn modern() -> Self {
        Quirks {
            reset_flag_on_logic_ops: false,
            shift_uses_vx_only: true,
            jump_uses_vx_high_nibble: true,
            clip_sprites_at_edges: true,
            wait_for_frame_before_draw: false,
            increment_index_on_block_transfer: false,
            wait_for_key_release: false,
        }
    }
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks::vip()
    }
}
