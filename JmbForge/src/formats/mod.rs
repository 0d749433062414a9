//! File format handlers
//!
//! Only the `.jmb` subtitle container lives here; the DDS payload it embeds
//! is handled by [`crate::texture`].

pub mod jmb;

pub use jmb::{JmbFile, JmbKind, read_jmb};
