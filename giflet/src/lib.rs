// lib.rs      giflet crate.
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! A GIF decoder producing fully composited frames.
//!
//! [GifDecoder] runs at most one full decode at a time.  A decode request
//! returns a future which resolves once, with every frame or one [Error].
//! The cover image and image count can be queried at any time.
//!
//! Lower-level access to the block grammar is available through
//! [Blocks] and [Frames].
#![forbid(unsafe_code)]

mod bits;
pub mod block;
mod compose;
mod cover;
mod error;
#[cfg(test)]
mod fixture;
mod lzw;
mod parse;
mod private;
mod session;

pub use crate::error::{ERROR_DOMAIN, Error, ErrorKind, Result};
pub use crate::parse::{Blocks, Frames};
pub use crate::private::{Animation, Frame, GifDecoder};
pub use crate::session::{Decode, SessionState};
