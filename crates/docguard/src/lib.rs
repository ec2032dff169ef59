//! Top-level facade crate for docguard.
//!
//! Re-exports the model and the emulator so users can depend on a single crate.

pub mod core {
    pub use docguard_core::*;
}

pub mod emulator {
    pub use docguard_emulator::*;
}
