//! Shader binary dump layout.
//!
//! This module provides types for parsing and working with the shader
//! binary dump format: the blob produced by the shader build that packs
//! compiled variant bytecode together with its metadata tables.
//!
//! # Dump Structure
//!
//! A dump consists of:
//! - A header with the format generation and a table of contents
//! - Shader class records naming each scripted shader
//! - A variant map resolving a numeric code id to a (group, index) pair
//! - Group records describing packed batches of variant bytecode,
//!   optionally compressed against a shared dictionary
//! - Global variable and interval tables (v2 and later)
//!
//! All multi-byte fields are little-endian. Structures are parsed in place
//! with zero-copy mapped views; offsets inside the buffer stand in for
//! pointers and are resolved at access time.

mod structs;
mod view;

pub use structs::*;
pub use view::*;
