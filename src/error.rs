// Copyright (c) 2026 rezky_nightky

use std::io;

use thiserror::Error;

/// Errors surfaced to `main` before or around the render loop.
///
/// The simulations themselves never fail; everything here comes from
/// argument validation or terminal I/O.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to apply {name} {value} (min {min} max {max})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("failed to apply {name} (must be a finite number)")]
    NotFinite { name: &'static str },

    #[error("unsupported charset: {0} (see --list-charsets)")]
    UnknownCharset(String),

    #[error("invalid color: {0} (expected #rgb or #rrggbb)")]
    InvalidColor(String),

    #[error("invalid --colormode: {0} (allowed: 0,16,8/256,24/32)")]
    InvalidColorMode(u16),

    #[error("invalid pair: {0} (expected: NUM1,NUM2)")]
    InvalidPair(String),

    #[error("failed to set up logging: {0}")]
    Logger(String),
}

pub type Result<T> = std::result::Result<T, Error>;
