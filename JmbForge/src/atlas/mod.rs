//! Glyph atlas generation
//!
//! Renders the characters of a [`CharRegistry`](crate::text::CharRegistry)
//! in code order and packs them into a texture plus glyph table.

mod config;
mod packer;
mod rasterizer;

pub use config::{AtlasConfig, FontProfiles};
pub use packer::{Atlas, pack_atlas};
pub use rasterizer::{FontRasterizer, GlyphBitmap, GlyphRasterizer};
