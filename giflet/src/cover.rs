// cover.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! First-frame extraction and image counting
use crate::compose::Canvas;
use crate::error::{Error, Result};
use crate::parse::Frames;
use crate::private::{Frame, Limits};
use crate::session::{check_frame, render_frame};
use log::debug;

/// Decode only the first frame of a GIF buffer.
///
/// Blocks after the first image are never read.
pub(crate) fn cover_frame(data: &[u8], limits: &Limits) -> Result<Frame> {
    if data.is_empty() {
        return Err(Error::EmptyBuffer);
    }
    let mut frames = Frames::new(data);
    let preamble = frames.preamble()?;
    let width = preamble.screen_width();
    let height = preamble.screen_height();
    limits.check(width, height)?;
    let blocks = match frames.next() {
        Some(blocks) => blocks?,
        None => return Err(Error::NoImages),
    };
    let global = preamble.global_color_table.as_ref();
    let mut canvas =
        Canvas::new(width, height, Canvas::background_color(&preamble));
    let frame = render_frame(&mut canvas, &blocks, global, limits, (width, height))?;
    debug!("cover: {} of {} bytes read", frames.consumed(), data.len());
    Ok(frame)
}

/// Count image descriptors in a GIF buffer.
///
/// The whole block structure is validated, but image data is not
/// decompressed.
pub(crate) fn image_count(data: &[u8], limits: &Limits) -> Result<usize> {
    if data.is_empty() {
        return Err(Error::EmptyBuffer);
    }
    let mut frames = Frames::new(data);
    let preamble = frames.preamble()?;
    let width = preamble.screen_width();
    let height = preamble.screen_height();
    limits.check(width, height)?;
    let mut count = 0;
    for blocks in frames {
        check_frame(&blocks?.image_desc, limits, (width, height))?;
        count += 1;
    }
    if count == 0 {
        return Err(Error::NoImages);
    }
    Ok(count)
}
