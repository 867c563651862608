use rand::rngs::ThreadRng;
use rand::{Rng, RngCore};

use crate::framebuffer::Framebuffer;

/// Used when the host supplies no random source. Not random at all.
pub const FALLBACK_RANDOM_BYTE: u8 = 0x77;

/// Services the interpreter needs from its host.
///
/// Both calls happen synchronously on the interpreter's hot path, so they should be fast and
/// must not block.
pub trait Environment {
    /// A random byte for `Cxkk`.
    fn random_byte(&mut self) -> u8 {
        FALLBACK_RANDOM_BYTE
    }

    /// Called after the framebuffer was cleared or drawn to.
    fn on_framebuffer_changed(&mut self, _framebuffer: &Framebuffer) {}
}

impl<E: Environment + ?Sized> Environment for &mut E {
    fn random_byte(&mut self) -> u8 {
        (**self).random_byte()
    }

    fn on_framebuffer_changed(&mut self, framebuffer: &Framebuffer) {
        (**self).on_framebuffer_changed(framebuffer)
    }
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn random_byte(&mut self) -> u8 {
        (**self).random_byte()
    }

    fn on_framebuffer_changed(&mut self, framebuffer: &Framebuffer) {
        (**self).on_framebuffer_changed(framebuffer)
    }
}

/// No random source, no draw notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEnvironment;

impl Environment for NullEnvironment {}

/// Random bytes from any `rand` generator, e.g. a seeded `StdRng` for reproducible runs.
#[derive(Debug, Clone)]
pub struct RngEnvironment<R: RngCore> {
    rng: R,
}

impl<R: RngCore> RngEnvironment<R> {
    /// Draw random bytes from `rng`.
    pub fn new(rng: R) -> Self {
        RngEnvironment { rng }
    }
}

impl<R: RngCore> Environment for RngEnvironment<R> {
    fn random_byte(&mut self) -> u8 {
        self.rng.gen::<u8>()
    }
}

/// Random bytes from the thread-local generator.
pub type ThreadRngEnvironment = RngEnvironment<ThreadRng>;

impl ThreadRngEnvironment {
    /// Draw random bytes from `rand::thread_rng()`.
    pub fn thread() -> Self {
        RngEnvironment::new(rand::thread_rng())
    }
}
