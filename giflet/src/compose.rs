// compose.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! Frame compositing onto a canvas
use crate::block::{ColorTable, DisposalMethod, FrameBlocks, ImageDesc, Preamble};
use crate::error::{Error, Result};
use log::trace;
use pix::rgb::SRgba8;
use pix::Raster;

/// Clipped rectangle on the canvas
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Rect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Rect {
    /// Clip an image descriptor to a canvas size
    fn clip(image_desc: &ImageDesc, width: u32, height: u32) -> Self {
        let cols = image_desc.columns();
        let rows = image_desc.rows();
        let x = cols.start.min(width);
        let y = rows.start.min(height);
        Rect {
            x,
            y,
            width: cols.end.min(width) - x,
            height: rows.end.min(height) - y,
        }
    }
}

/// Saved canvas region, for restore-to-previous disposal
#[derive(Debug)]
struct Snapshot {
    rect: Rect,
    pixels: Vec<SRgba8>,
}

/// Row order of an image in its data stream
///
/// Interlaced images store rows in four passes: every 8th row from 0,
/// every 8th row from 4, every 4th row from 2, then every 2nd row from 1.
fn stream_rows(height: u32, interlaced: bool) -> Box<dyn Iterator<Item = u32>> {
    if interlaced {
        Box::new(
            (0..height)
                .step_by(8)
                .chain((4..height).step_by(8))
                .chain((2..height).step_by(4))
                .chain((1..height).step_by(2)),
        )
    } else {
        Box::new(0..height)
    }
}

/// Canvas accumulating composited frames
///
/// Owns the pixel buffer for one decode, along with the snapshot needed to
/// restore a region to its state before the most recent frame.
pub struct Canvas {
    /// Canvas pixels
    raster: Raster<SRgba8>,
    /// Background color
    background: SRgba8,
    /// Region saved before the current frame
    snapshot: Option<Snapshot>,
}

impl Canvas {
    /// Create a canvas filled with the background color
    pub fn new(width: u16, height: u16, background: SRgba8) -> Self {
        let (width, height) = (u32::from(width), u32::from(height));
        let n_pixels = width as usize * height as usize;
        let raster = Raster::with_pixels(width, height, vec![background; n_pixels]);
        Canvas {
            raster,
            background,
            snapshot: None,
        }
    }

    /// Get the background color for a preamble
    ///
    /// Opaque global table entry, or transparent if there is no entry.
    pub fn background_color(preamble: &Preamble) -> SRgba8 {
        let idx = preamble.logical_screen_desc.background_color_idx();
        match preamble.global_color_table.as_ref().and_then(|t| t.rgb(idx)) {
            Some([r, g, b]) => SRgba8::new(r, g, b, 255),
            None => SRgba8::new(0u8, 0, 0, 0),
        }
    }

    /// Composite one frame of indexed pixels onto the canvas
    ///
    /// The local table takes precedence over the global table.  Pixels
    /// matching the transparent index leave the canvas untouched.
    pub fn composite(
        &mut self,
        image_desc: &ImageDesc,
        indices: &[u8],
        table: Option<&ColorTable>,
        transparent: Option<u8>,
        disposal: DisposalMethod,
    ) -> Result<()> {
        let table = table.ok_or(Error::MissingColorTable)?;
        debug_assert_eq!(indices.len(), image_desc.image_sz());
        let rect = Rect::clip(image_desc, self.raster.width(), self.raster.height());
        self.snapshot = match disposal {
            DisposalMethod::Previous => Some(self.save(rect)),
            _ => None,
        };
        let canvas_width = self.raster.width() as usize;
        let canvas_height = self.raster.height();
        let width = usize::from(image_desc.width());
        let left = usize::from(image_desc.left());
        let top = u32::from(image_desc.top());
        let pixels = self.raster.pixels_mut();
        let rows = stream_rows(u32::from(image_desc.height()), image_desc.interlaced());
        for (row, src) in rows.zip(indices.chunks_exact(width.max(1))) {
            let y = top + row;
            if y >= canvas_height {
                continue;
            }
            let start = y as usize * canvas_width;
            for (col, idx) in src.iter().enumerate() {
                if Some(*idx) == transparent {
                    continue;
                }
                let [r, g, b] = table.rgb(*idx).ok_or(Error::InvalidColorIndex(*idx))?;
                let x = left + col;
                if x < canvas_width {
                    pixels[start + x] = SRgba8::new(r, g, b, 255);
                }
            }
        }
        trace!("composited {rect:?}");
        Ok(())
    }

    /// Dispose of the frame area, preparing the canvas for the next frame
    pub fn dispose(&mut self, image_desc: &ImageDesc, disposal: DisposalMethod) {
        let rect = Rect::clip(image_desc, self.raster.width(), self.raster.height());
        match disposal {
            DisposalMethod::Background => self.fill(rect, self.background),
            DisposalMethod::Previous => {
                if let Some(snapshot) = self.snapshot.take() {
                    self.restore(snapshot);
                }
            }
            _ => {}
        }
        self.snapshot = None;
    }

    /// Composite and dispose the blocks of one frame, returning the visible
    /// canvas
    pub(crate) fn render(
        &mut self,
        blocks: &FrameBlocks,
        indices: &[u8],
        global: Option<&ColorTable>,
    ) -> Result<Raster<SRgba8>> {
        let table = blocks.local_color_table.as_ref().or(global);
        let disposal = blocks.disposal_method();
        self.composite(
            &blocks.image_desc,
            indices,
            table,
            blocks.transparent_color(),
            disposal,
        )?;
        let raster = Raster::with_raster(&self.raster);
        self.dispose(&blocks.image_desc, disposal);
        Ok(raster)
    }

    /// Save a region of the canvas
    fn save(&self, rect: Rect) -> Snapshot {
        let canvas_width = self.raster.width() as usize;
        let pixels = self.raster.pixels();
        let mut saved = Vec::with_capacity(rect.width as usize * rect.height as usize);
        for y in rect.y..rect.y + rect.height {
            let start = y as usize * canvas_width + rect.x as usize;
            saved.extend_from_slice(&pixels[start..start + rect.width as usize]);
        }
        Snapshot { rect, pixels: saved }
    }

    /// Restore a saved region
    fn restore(&mut self, snapshot: Snapshot) {
        let Snapshot { rect, pixels: saved } = snapshot;
        let canvas_width = self.raster.width() as usize;
        let pixels = self.raster.pixels_mut();
        let width = rect.width as usize;
        for (row, src) in saved.chunks_exact(width.max(1)).enumerate() {
            let start = (rect.y as usize + row) * canvas_width + rect.x as usize;
            pixels[start..start + width].copy_from_slice(src);
        }
    }

    /// Fill a region with one color
    fn fill(&mut self, rect: Rect, clr: SRgba8) {
        let canvas_width = self.raster.width() as usize;
        let pixels = self.raster.pixels_mut();
        for y in rect.y..rect.y + rect.height {
            let start = y as usize * canvas_width + rect.x as usize;
            pixels[start..start + rect.width as usize].fill(clr);
        }
    }
}
