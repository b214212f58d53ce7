// error.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
use std::fmt;

/// Error domain reported alongside every [ErrorKind] code
///
/// [ErrorKind]: enum.ErrorKind.html
pub const ERROR_DOMAIN: &str = "GifDecoderErrorDomain";

/// Caller-facing classification of an [Error](enum.Error.html).
///
/// The integer codes are stable across releases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty input buffer.
    InvalidArgs = 0,
    /// Structurally or semantically malformed GIF.
    InvalidGifImage = 1,
    /// A decode is already in flight on this decoder.
    AlreadyProcessing = 2,
    /// Input ended while a block was being read.
    BufferingFailed = 3,
    /// Canvas or frame dimensions are zero or too large.
    InvalidResolution = 4,
    /// Deadline exceeded.
    TimedOut = 5,
}

/// Errors encountered while decoding
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Input buffer is empty.
    EmptyBuffer,
    /// [Header](block/struct.Header.html) signature is not `GIF`.
    MalformedHeader,
    /// GIF version not supported (87a or 89a only).
    UnsupportedVersion([u8; 3]),
    /// Invalid [Block](block/enum.Block.html) code (introducer).
    InvalidBlockCode(u8),
    /// [Block](block/enum.Block.html)s arranged in invalid sequence.
    InvalidBlockSequence,
    /// [GraphicControl](block/struct.GraphicControl.html) block has invalid
    /// length.
    MalformedGraphicControlExtension,
    /// Declared block length runs past the end of the buffer.
    TruncatedBlock,
    /// Fewer bits remain than a code requires.
    BitstreamExhausted,
    /// LZW minimum code size out of range.
    InvalidCodeSize(u8),
    /// LZW code refers to an uninitialized table slot.
    InvalidLzwCode(u16),
    /// Image data decoded to fewer pixels than the frame needs.
    ShortPixelData {
        /// Pixels expected (width * height)
        expected: usize,
        /// Pixels actually decoded
        decoded: usize,
    },
    /// No color table available for a frame.
    MissingColorTable,
    /// Pixel refers to a color outside of the active table.
    InvalidColorIndex(u8),
    /// Frame location / size larger than screen size.
    InvalidFrameDimensions,
    /// Trailer reached before any image.
    NoImages,
    /// Canvas or frame has zero area or exceeds the configured maximum.
    InvalidResolution(u16, u16),
    /// A decode is already in flight.
    AlreadyProcessing,
    /// Deadline exceeded.
    TimedOut,
}

/// Giflet result type
pub type Result<T> = std::result::Result<T, Error>;

impl ErrorKind {
    /// Get the stable integer code
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, fmt)
    }
}

impl Error {
    /// Classify into the caller-facing taxonomy
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            EmptyBuffer => ErrorKind::InvalidArgs,
            TruncatedBlock | BitstreamExhausted => ErrorKind::BufferingFailed,
            InvalidResolution(_, _) => ErrorKind::InvalidResolution,
            AlreadyProcessing => ErrorKind::AlreadyProcessing,
            TimedOut => ErrorKind::TimedOut,
            MalformedHeader
            | UnsupportedVersion(_)
            | InvalidBlockCode(_)
            | InvalidBlockSequence
            | MalformedGraphicControlExtension
            | InvalidCodeSize(_)
            | InvalidLzwCode(_)
            | ShortPixelData { .. }
            | MissingColorTable
            | InvalidColorIndex(_)
            | InvalidFrameDimensions
            | NoImages => ErrorKind::InvalidGifImage,
        }
    }

    /// Get the stable integer code of the error kind
    pub fn code(&self) -> i32 {
        self.kind().code()
    }

    /// Get the error domain
    pub fn domain(&self) -> &'static str {
        ERROR_DOMAIN
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnsupportedVersion(v) => {
                write!(fmt, "UnsupportedVersion({})", String::from_utf8_lossy(v))
            }
            Error::ShortPixelData { expected, decoded } => {
                write!(fmt, "ShortPixelData: {decoded} of {expected} pixels")
            }
            Error::InvalidResolution(w, h) => {
                write!(fmt, "InvalidResolution: {w}x{h}")
            }
            _ => fmt::Debug::fmt(self, fmt),
        }
    }
}

impl std::error::Error for Error {}
