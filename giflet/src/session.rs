// session.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! Single-flight decode sessions
use crate::block::{ColorTable, FrameBlocks, ImageDesc};
use crate::compose::Canvas;
use crate::error::{Error, Result};
use crate::lzw::Decompressor;
use crate::parse::Frames;
use crate::private::{Animation, Frame, Limits};
use log::{debug, warn};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::task::{Context, Poll};
use std::time::Instant;

/// State of a decode session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Ready to accept a request
    Idle = 0,
    /// Reading header and screen descriptor
    Parsing = 1,
    /// Decoding and compositing frames
    Compositing = 2,
    /// Last request completed successfully
    Completed = 3,
    /// Last request failed
    Failed = 4,
    /// Last request exceeded its deadline
    TimedOut = 5,
}

impl SessionState {
    /// Convert from the stored representation
    fn from_u8(v: u8) -> Self {
        use SessionState::*;
        match v {
            1 => Parsing,
            2 => Compositing,
            3 => Completed,
            4 => Failed,
            5 => TimedOut,
            _ => Idle,
        }
    }

    /// Check whether a session is in flight
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Parsing | SessionState::Compositing)
    }
}

/// Single-flight slot owned by a decoder
#[derive(Debug)]
pub(crate) struct Flight {
    state: AtomicU8,
}

impl Flight {
    /// Create an idle flight slot
    pub fn new() -> Self {
        Flight {
            state: AtomicU8::new(SessionState::Idle as u8),
        }
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Claim the slot, moving it to `Parsing`
    pub fn acquire(&self) -> Result<FlightGuard<'_>> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if SessionState::from_u8(current).is_active() {
                return Err(Error::AlreadyProcessing);
            }
            match self.state.compare_exchange(
                current,
                SessionState::Parsing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    debug!("session: {:?} -> Parsing", SessionState::from_u8(current));
                    return Ok(FlightGuard {
                        flight: self,
                        state: SessionState::Parsing,
                    });
                }
                Err(actual) => current = actual,
            }
        }
    }
}

/// Exclusive claim on a flight slot
///
/// Dropping an active guard returns the slot to `Idle`.
#[derive(Debug)]
pub(crate) struct FlightGuard<'a> {
    flight: &'a Flight,
    state: SessionState,
}

impl FlightGuard<'_> {
    /// Move to a new state
    fn transition(&mut self, state: SessionState) {
        if state != self.state {
            debug!("session: {:?} -> {:?}", self.state, state);
            self.state = state;
            self.flight.state.store(state as u8, Ordering::Release);
        }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.state.is_active() {
            debug!("session abandoned in {:?}", self.state);
            self.transition(SessionState::Idle);
        }
    }
}

/// Check frame size against limits and its box against the screen
pub(crate) fn check_frame(
    image_desc: &ImageDesc,
    limits: &Limits,
    screen: (u16, u16),
) -> Result<()> {
    limits.check(image_desc.width(), image_desc.height())?;
    let (width, height) = screen;
    if image_desc.columns().end > u32::from(width)
        || image_desc.rows().end > u32::from(height)
    {
        return Err(Error::InvalidFrameDimensions);
    }
    Ok(())
}

/// Decode the indexed pixels of one frame and composite it
pub(crate) fn render_frame(
    canvas: &mut Canvas,
    blocks: &FrameBlocks,
    global: Option<&ColorTable>,
    limits: &Limits,
    screen: (u16, u16),
) -> Result<Frame> {
    let image_desc = &blocks.image_desc;
    check_frame(image_desc, limits, screen)?;
    let image_data = &blocks.image_data;
    let mut dec = Decompressor::new(image_data.min_code_size())?;
    let indices = dec.decompress(image_data.data(), image_desc.image_sz())?;
    let raster = canvas.render(blocks, &indices, global)?;
    Ok(Frame::new(raster, blocks))
}

/// One full decode of a GIF buffer
///
/// Owns the canvas and color tables for its lifetime; all of it is released
/// when the session ends, whatever the outcome.
pub(crate) struct DecodeSession<'a> {
    /// Claim on the decoder's flight slot
    guard: FlightGuard<'a>,
    /// Input buffer
    data: &'a [u8],
    /// Size limits
    limits: Limits,
    /// Wall-clock deadline
    deadline: Option<Instant>,
    /// Number of frames after which the deadline is forced to pass
    #[cfg(test)]
    expire_after: Option<usize>,
}

impl<'a> DecodeSession<'a> {
    /// Create a new session
    pub fn new(
        guard: FlightGuard<'a>,
        data: &'a [u8],
        limits: Limits,
        deadline: Option<Instant>,
    ) -> Self {
        DecodeSession {
            guard,
            data,
            limits,
            deadline,
            #[cfg(test)]
            expire_after: None,
        }
    }

    /// Run the session to completion
    pub fn run(mut self) -> Result<Animation> {
        let res = self.decode();
        let state = match &res {
            Ok(_) => SessionState::Completed,
            Err(Error::TimedOut) => SessionState::TimedOut,
            Err(_) => SessionState::Failed,
        };
        if let Err(e) = &res {
            warn!("decode failed: {e}");
        }
        self.guard.transition(state);
        res
    }

    /// Check the deadline
    fn check_deadline(&self) -> Result<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::TimedOut),
            _ => Ok(()),
        }
    }

    /// Decode all frames
    fn decode(&mut self) -> Result<Animation> {
        self.check_deadline()?;
        let mut frames = Frames::new(self.data);
        let preamble = frames.preamble()?;
        let width = preamble.screen_width();
        let height = preamble.screen_height();
        self.limits.check(width, height)?;
        let global = preamble.global_color_table.as_ref();
        let mut canvas = Canvas::new(width, height, Canvas::background_color(&preamble));
        self.guard.transition(SessionState::Compositing);
        let mut out = vec![];
        loop {
            self.check_deadline()?;
            let blocks = match frames.next() {
                Some(blocks) => blocks?,
                None => break,
            };
            let frame =
                render_frame(&mut canvas, &blocks, global, &self.limits, (width, height))?;
            debug!("frame {}: delay {}", out.len(), frame.delay_time_cs());
            out.push(frame);
            #[cfg(test)]
            if self.expire_after == Some(out.len()) {
                self.deadline = Some(Instant::now());
            }
        }
        if out.is_empty() {
            return Err(Error::NoImages);
        }
        let comments = frames.comments().iter().map(|c| c.text()).collect();
        Ok(Animation::new(width, height, out, frames.loop_count(), comments))
    }
}

/// Future resolving to the result of one decode request
///
/// The single-flight slot is claimed when the request is made, not when
/// the future is first polled.  Polling runs the whole decode; dropping the
/// future un-polled abandons the request.  Resolves exactly once.
///
/// # Panics
///
/// Polling again after the future has resolved panics, as with
/// `std::future::Ready`.
pub struct Decode<'a> {
    /// Session, or the error rejecting the request
    session: Option<Result<DecodeSession<'a>>>,
}

impl<'a> Decode<'a> {
    /// Create a pending decode
    pub(crate) fn new(session: Result<DecodeSession<'a>>) -> Self {
        Decode {
            session: Some(session),
        }
    }
}

impl Future for Decode<'_> {
    type Output = Result<Animation>;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.session.take() {
            Some(Ok(session)) => Poll::Ready(session.run()),
            Some(Err(e)) => Poll::Ready(Err(e)),
            None => panic!("`Decode` polled after completion"),
        }
    }
}
