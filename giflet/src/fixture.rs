// fixture.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! GIF byte streams for tests
use crate::block::DisposalMethod;
use crate::lzw::Compressor;

/// Captured 10x10 GIF with a 4-color global table
pub const SIMPLE_10X10: [u8; 69] = [
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x0A, 0x00,
    0x0A, 0x00, 0x91, 0x00, 0x00, 0xFF, 0xFF, 0xFF,
    0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00,
    0x00, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x2C, 0x00, 0x00, 0x00, 0x00, 0x0A, 0x00,
    0x0A, 0x00, 0x00, 0x02, 0x16, 0x8C, 0x2D, 0x99,
    0x87, 0x2A, 0x1C, 0xDC, 0x33, 0xA0, 0x02, 0x75,
    0xEC, 0x95, 0xFA, 0xA8, 0xDE, 0x60, 0x8C, 0x04,
    0x91, 0x4C, 0x01, 0x00, 0x3B,
];

/// Color indices of `SIMPLE_10X10`
pub const SIMPLE_10X10_INDICES: [u8; 100] = [
    1, 1, 1, 1, 1, 2, 2, 2, 2, 2,
    1, 1, 1, 1, 1, 2, 2, 2, 2, 2,
    1, 1, 1, 1, 1, 2, 2, 2, 2, 2,
    1, 1, 1, 0, 0, 0, 0, 2, 2, 2,
    1, 1, 1, 0, 0, 0, 0, 2, 2, 2,
    2, 2, 2, 0, 0, 0, 0, 1, 1, 1,
    2, 2, 2, 0, 0, 0, 0, 1, 1, 1,
    2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
    2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
    2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
];

/// Captured 2x2 GIF with a 2-color global table
pub const SIMPLE_2X2: [u8; 36] = [
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00,
    0x02, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00,
    0xff, 0xff, 0xff, 0x2c, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x02, 0x00, 0x00, 0x02, 0x03, 0x0c,
    0x10, 0x05, 0x00, 0x3b,
];

/// Size field of a color table with `n_bytes` of RGB data
fn table_bits(n_bytes: usize) -> u8 {
    let n = n_bytes / 3;
    assert!(n >= 2 && n <= 256 && n.is_power_of_two(), "bad table: {n}");
    n.trailing_zeros() as u8 - 1
}

/// One image (frame) of a fixture
#[derive(Clone, Debug)]
pub struct Image {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    indices: Vec<u8>,
    delay: u16,
    disposal: DisposalMethod,
    transparent: Option<u8>,
    user_input: bool,
    local_colors: Option<Vec<u8>>,
    interlaced: bool,
    sub_block_len: usize,
    min_code_size: Option<u8>,
    data: Option<Vec<u8>>,
}

impl Image {
    /// Create an image from color indices in display order
    pub fn new(width: u16, height: u16, indices: Vec<u8>) -> Self {
        assert_eq!(usize::from(width) * usize::from(height), indices.len());
        Image {
            left: 0,
            top: 0,
            width,
            height,
            indices,
            delay: 0,
            disposal: DisposalMethod::NoAction,
            transparent: None,
            user_input: false,
            local_colors: None,
            interlaced: false,
            sub_block_len: 255,
            min_code_size: None,
            data: None,
        }
    }

    pub fn at(mut self, left: u16, top: u16) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    pub fn delay(mut self, delay: u16) -> Self {
        self.delay = delay;
        self
    }

    pub fn disposal(mut self, disposal: DisposalMethod) -> Self {
        self.disposal = disposal;
        self
    }

    pub fn transparent(mut self, idx: u8) -> Self {
        self.transparent = Some(idx);
        self
    }

    pub fn user_input(mut self) -> Self {
        self.user_input = true;
        self
    }

    pub fn local_colors(mut self, colors: &[u8]) -> Self {
        self.local_colors = Some(colors.to_vec());
        self
    }

    pub fn interlaced(mut self) -> Self {
        self.interlaced = true;
        self
    }

    pub fn sub_block_len(mut self, len: usize) -> Self {
        self.sub_block_len = len;
        self
    }

    pub fn min_code_size(mut self, sz: u8) -> Self {
        self.min_code_size = Some(sz);
        self
    }

    /// Use raw (already compressed) image data
    pub fn raw_data(mut self, data: &[u8]) -> Self {
        self.data = Some(data.to_vec());
        self
    }

    fn has_control(&self) -> bool {
        self.delay > 0
            || self.disposal != DisposalMethod::NoAction
            || self.transparent.is_some()
            || self.user_input
    }

    /// Indices in stream order
    fn stream_indices(&self) -> Vec<u8> {
        if !self.interlaced {
            return self.indices.clone();
        }
        let w = usize::from(self.width);
        let h = usize::from(self.height);
        let mut out = Vec::with_capacity(self.indices.len());
        for (start, step) in [(0, 8), (4, 8), (2, 4), (1, 2)] {
            for row in (start..h).step_by(step) {
                out.extend_from_slice(&self.indices[row * w..(row + 1) * w]);
            }
        }
        out
    }

    fn write(&self, global_len: usize, out: &mut Vec<u8>) {
        if self.has_control() {
            let disposal = match self.disposal {
                DisposalMethod::NoAction => 0,
                DisposalMethod::Keep => 1,
                DisposalMethod::Background => 2,
                DisposalMethod::Previous => 3,
                DisposalMethod::Reserved(n) => n,
            };
            let flags = (disposal << 2)
                | (u8::from(self.user_input) << 1)
                | u8::from(self.transparent.is_some());
            out.extend_from_slice(&[0x21, 0xF9, 0x04, flags]);
            out.extend_from_slice(&self.delay.to_le_bytes());
            out.extend_from_slice(&[self.transparent.unwrap_or(0), 0x00]);
        }
        out.push(0x2C);
        out.extend_from_slice(&self.left.to_le_bytes());
        out.extend_from_slice(&self.top.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        let mut flags = 0;
        if self.interlaced {
            flags |= 0x40;
        }
        let mut table_len = global_len;
        if let Some(colors) = &self.local_colors {
            flags |= 0x80 | table_bits(colors.len());
            table_len = colors.len() / 3;
        }
        out.push(flags);
        if let Some(colors) = &self.local_colors {
            out.extend_from_slice(colors);
        }
        let min_code_size = self.min_code_size.unwrap_or_else(|| {
            (table_len.max(4).trailing_zeros() as u8).min(8)
        });
        out.push(min_code_size);
        let data = match &self.data {
            Some(data) => data.clone(),
            None => {
                let mut data = vec![];
                Compressor::new(min_code_size)
                    .compress(&self.stream_indices(), &mut data);
                data
            }
        };
        for chunk in data.chunks(self.sub_block_len) {
            out.push(chunk.len() as u8);
            out.extend_from_slice(chunk);
        }
        out.push(0x00);
    }
}

/// Builder for GIF byte streams
#[derive(Clone, Debug)]
pub struct GifBuilder {
    width: u16,
    height: u16,
    global_colors: Option<Vec<u8>>,
    background: u8,
    body: Vec<u8>,
}

impl GifBuilder {
    pub fn new(width: u16, height: u16) -> Self {
        GifBuilder {
            width,
            height,
            global_colors: None,
            background: 0,
            body: vec![],
        }
    }

    pub fn global_colors(mut self, colors: &[u8]) -> Self {
        self.global_colors = Some(colors.to_vec());
        self
    }

    pub fn background(mut self, idx: u8) -> Self {
        self.background = idx;
        self
    }

    pub fn loop_count(mut self, count: u16) -> Self {
        self.body.extend_from_slice(&[0x21, 0xFF, 0x0B]);
        self.body.extend_from_slice(b"NETSCAPE2.0");
        self.body.extend_from_slice(&[0x03, 0x01]);
        self.body.extend_from_slice(&count.to_le_bytes());
        self.body.push(0x00);
        self
    }

    pub fn comment(mut self, text: &str) -> Self {
        self.body.extend_from_slice(&[0x21, 0xFE]);
        for chunk in text.as_bytes().chunks(255) {
            self.body.push(chunk.len() as u8);
            self.body.extend_from_slice(chunk);
        }
        self.body.push(0x00);
        self
    }

    pub fn image(mut self, image: Image) -> Self {
        let global_len = self.global_colors.as_ref().map_or(0, |c| c.len() / 3);
        image.write(global_len, &mut self.body);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = b"GIF89a".to_vec();
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        match &self.global_colors {
            Some(colors) => {
                let bits = table_bits(colors.len());
                out.push(0x80 | (bits << 4) | bits);
            }
            None => out.push(0x00),
        }
        out.push(self.background);
        out.push(0x00);
        if let Some(colors) = &self.global_colors {
            out.extend_from_slice(colors);
        }
        out.extend_from_slice(&self.body);
        out.push(0x3B);
        out
    }
}
