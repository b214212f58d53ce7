// private.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Private module for top-level items
use crate::{
    Result,
    block::{DisposalMethod, FrameBlocks},
    cover,
    error::Error,
    parse::{Blocks, Frames},
    session::{Decode, DecodeSession, Flight, SessionState},
};
use log::warn;
use pix::{Raster, rgb::SRgba8};
use std::time::{Duration, Instant};

/// Default maximum image size, in pixels
const MAX_IMAGE_SZ: usize = 1 << 25;

/// Default maximum width or height, in pixels
const MAX_DIMENSION: u16 = 10_000;

/// Default decode deadline
const DEADLINE: Duration = Duration::from_secs(10);

/// Size limits for canvas and frames
#[derive(Clone, Copy, Debug)]
pub(crate) struct Limits {
    /// Maximum image size, in pixels
    max_image_sz: Option<usize>,
    /// Maximum width or height
    max_dimension: u16,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_image_sz: Some(MAX_IMAGE_SZ),
            max_dimension: MAX_DIMENSION,
        }
    }
}

impl Limits {
    /// Check that dimensions are non-zero and within limits
    pub fn check(&self, width: u16, height: u16) -> Result<()> {
        let sz = usize::from(width) * usize::from(height);
        if sz == 0
            || width > self.max_dimension
            || height > self.max_dimension
            || self.max_image_sz.is_some_and(|max| sz > max)
        {
            warn!("invalid resolution: {width}x{height}");
            return Err(Error::InvalidResolution(width, height));
        }
        Ok(())
    }
}

/// One fully composited frame of an animation.
pub struct Frame {
    /// Canvas-sized raster
    raster: Raster<SRgba8>,
    /// Delay time in centiseconds
    delay_time_cs: u16,
    /// Disposal method
    disposal_method: DisposalMethod,
    /// Transparent color index
    transparent_color: Option<u8>,
    /// User input flag
    user_input: bool,
}

impl Clone for Frame {
    fn clone(&self) -> Self {
        Frame {
            raster: Raster::with_raster(&self.raster),
            ..*self
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct("Frame")
            .field("width", &self.raster.width())
            .field("height", &self.raster.height())
            .field("delay_time_cs", &self.delay_time_cs)
            .field("disposal_method", &self.disposal_method)
            .field("transparent_color", &self.transparent_color)
            .field("user_input", &self.user_input)
            .finish()
    }
}

impl Frame {
    /// Create a frame from a raster and the blocks it was built from
    pub(crate) fn new(raster: Raster<SRgba8>, blocks: &FrameBlocks) -> Self {
        let control = blocks.graphic_control_ext;
        Frame {
            raster,
            delay_time_cs: blocks.delay_time_cs(),
            disposal_method: blocks.disposal_method(),
            transparent_color: blocks.transparent_color(),
            user_input: control.is_some_and(|c| c.user_input()),
        }
    }

    /// Get the raster
    pub fn raster(&self) -> &Raster<SRgba8> {
        &self.raster
    }

    /// Convert into the raster
    pub fn into_raster(self) -> Raster<SRgba8> {
        self.raster
    }

    /// Get the width (same as the canvas)
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    /// Get the height (same as the canvas)
    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// Get the delay time in centiseconds (zero if none)
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }

    /// Get the disposal method
    pub fn disposal_method(&self) -> DisposalMethod {
        self.disposal_method
    }

    /// Get the transparent color index
    pub fn transparent_color(&self) -> Option<u8> {
        self.transparent_color
    }

    /// Check whether the frame waits for user input
    pub fn user_input(&self) -> bool {
        self.user_input
    }
}

/// Result of a full decode
#[derive(Clone, Debug)]
pub struct Animation {
    width: u16,
    height: u16,
    frames: Vec<Frame>,
    loop_count: Option<u16>,
    comments: Vec<String>,
}

impl Animation {
    /// Create a new animation
    pub(crate) fn new(
        width: u16,
        height: u16,
        frames: Vec<Frame>,
        loop_count: Option<u16>,
        comments: Vec<String>,
    ) -> Self {
        Animation {
            width,
            height,
            frames,
            loop_count,
            comments,
        }
    }

    /// Get the number of frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Get the canvas size (width, height)
    pub fn canvas_size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Get the frames, in display order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Convert into the frames
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Check whether there is more than one frame
    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    /// Get the loop count (zero means loop forever)
    pub fn loop_count(&self) -> Option<u16> {
        self.loop_count
    }

    /// Get comment text
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Total duration of one loop, in centiseconds
    pub fn duration_cs(&self) -> u32 {
        self.frames.iter().map(|f| u32::from(f.delay_time_cs())).sum()
    }
}

/// GIF decoder
///
/// Allows at most one full [decode] in flight at a time; a second request
/// made while one is pending fails with `AlreadyProcessing`.  Cover and
/// count queries can run at any time.
///
/// ## Example: Decode all frames
/// ```
/// use giflet::GifDecoder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let gif = &[
/// #   0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00,
/// #   0x02, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00,
/// #   0xff, 0xff, 0xff, 0x2c, 0x00, 0x00, 0x00, 0x00,
/// #   0x02, 0x00, 0x02, 0x00, 0x00, 0x02, 0x03, 0x0c,
/// #   0x10, 0x05, 0x00, 0x3b,
/// # ][..];
/// let decoder = GifDecoder::new();
/// let animation = pollster::block_on(decoder.decode(gif, None))?;
/// assert_eq!(animation.frame_count(), 1);
/// assert_eq!(animation.canvas_size(), (2, 2));
/// # Ok(())
/// # }
/// ```
///
/// [decode]: struct.GifDecoder.html#method.decode
#[derive(Debug)]
pub struct GifDecoder {
    /// Single-flight slot
    flight: Flight,
    /// Size limits
    limits: Limits,
    /// Default deadline
    deadline: Duration,
}

impl Default for GifDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl GifDecoder {
    /// Create a new GIF decoder.
    pub fn new() -> Self {
        GifDecoder {
            flight: Flight::new(),
            limits: Limits::default(),
            deadline: DEADLINE,
        }
    }

    /// Set the maximum image size (in pixels) to allow for decoding.
    pub fn max_image_sz(mut self, max_image_sz: Option<usize>) -> Self {
        self.limits.max_image_sz = max_image_sz;
        self
    }

    /// Set the maximum width or height to allow for decoding.
    pub fn max_dimension(mut self, max_dimension: u16) -> Self {
        self.limits.max_dimension = max_dimension;
        self
    }

    /// Set the deadline used when a request does not supply one.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Get the state of the most recent decode session
    pub fn state(&self) -> SessionState {
        self.flight.state()
    }

    /// Request a full decode of all frames.
    ///
    /// The request is accepted or rejected immediately; the returned future
    /// does the work when polled and resolves with every frame or exactly
    /// one error.
    pub fn decode<'a>(&'a self, data: &'a [u8], deadline: Option<Duration>)
        -> Decode<'a>
    {
        let deadline = deadline.unwrap_or(self.deadline);
        let session = if data.is_empty() {
            Err(Error::EmptyBuffer)
        } else {
            self.flight.acquire().map(|guard| {
                let deadline = Instant::now().checked_add(deadline);
                DecodeSession::new(guard, data, self.limits, deadline)
            })
        };
        Decode::new(session)
    }

    /// Decode the first frame only.
    pub fn cover_frame(&self, data: &[u8]) -> Result<Frame> {
        cover::cover_frame(data, &self.limits)
    }

    /// Decode the first frame only, as a raster.
    pub fn cover_image(&self, data: &[u8]) -> Result<Raster<SRgba8>> {
        self.cover_frame(data).map(Frame::into_raster)
    }

    /// Count the images in a GIF without decoding pixel data.
    pub fn image_count(&self, data: &[u8]) -> Result<usize> {
        cover::image_count(data, &self.limits)
    }

    /// Convert a buffer into a block `Iterator`.
    pub fn blocks<'a>(&self, data: &'a [u8]) -> Blocks<'a> {
        Blocks::new(data)
    }

    /// Convert a buffer into a frame block `Iterator`.
    pub fn frames<'a>(&self, data: &'a [u8]) -> Frames<'a> {
        Frames::new(data)
    }
}
