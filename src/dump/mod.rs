//! Shader dump ownership.
//!
//! This module provides the owning side of the shader binary dump: loading
//! and validating the raw blob, the bounded cache of decompressed shader
//! groups, and the bytecode lookup path that rendering threads hit on every
//! shader resolve.

mod cache;
mod decompress;
mod owner;

pub use cache::*;
pub use decompress::*;
pub use owner::*;
