// parse.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Block parsing of the GIF container grammar
use crate::block::*;
use crate::error::{Error, Result};
use log::{debug, trace};

/// An `Iterator` over every [Block](block/enum.Block.html) in a GIF buffer.
///
/// The sequence is finite and ends after the trailer or the first error.
pub struct Blocks<'a> {
    /// Input buffer
    buf: &'a [u8],
    /// Byte cursor
    pos: usize,
    /// Expected next block code and size
    expected_next: Option<(BlockCode, usize)>,
    /// Iteration finished
    done: bool,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let res = self.next_block();
        if matches!(res, Ok(Block::Trailer(_)) | Err(_)) {
            self.done = true;
        }
        Some(res)
    }
}

impl<'a> Blocks<'a> {
    /// Create a new block iterator
    pub fn new(buf: &'a [u8]) -> Self {
        use self::BlockCode::Header_;
        Blocks {
            buf,
            pos: 0,
            expected_next: Some((Header_, Header_.size())),
            done: false,
        }
    }

    /// Get the number of bytes consumed so far
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Take `sz` bytes from the buffer
    fn take(&mut self, sz: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(sz).ok_or(Error::TruncatedBlock)?;
        match self.buf.get(self.pos..end) {
            Some(b) => {
                self.pos = end;
                Ok(b)
            }
            None => Err(Error::TruncatedBlock),
        }
    }

    /// Examine buffer for block code and size.
    fn examine_buffer(&mut self) -> Result<(BlockCode, usize)> {
        if let Some(bc_sz) = self.expected_next.take() {
            return Ok(bc_sz);
        }
        let t = *self.buf.get(self.pos).ok_or(Error::TruncatedBlock)?;
        match BlockCode::from_u8(t) {
            Some(bc) => Ok((bc, bc.size())),
            None => Err(Error::InvalidBlockCode(t)),
        }
    }

    /// Get next expected block code and size
    fn expected(block: &Block) -> Option<(BlockCode, usize)> {
        use crate::block::BlockCode::*;
        match block {
            Block::Header(_) => {
                Some((LogicalScreenDesc_, LogicalScreenDesc_.size()))
            }
            Block::LogicalScreenDesc(b) => {
                let sz = b.color_table_config().size_bytes();
                if sz > 0 {
                    Some((GlobalColorTable_, sz))
                } else {
                    None
                }
            }
            Block::ImageDesc(b) => {
                let sz = b.color_table_config().size_bytes();
                if sz > 0 {
                    Some((LocalColorTable_, sz))
                } else {
                    Some((ImageData_, ImageData_.size()))
                }
            }
            Block::LocalColorTable(_) => Some((ImageData_, ImageData_.size())),
            _ => None,
        }
    }

    /// Decode the next block (including all sub-blocks).
    fn next_block(&mut self) -> Result<Block> {
        let (bc, sz) = self.examine_buffer()?;
        if bc == BlockCode::Header_ {
            return self.decode_header();
        }
        let buf = self.take(sz)?;
        debug!("  block  : {:?} {:?}", bc, sz);
        let mut block = Self::parse_block(bc, buf)?;
        if block.has_sub_blocks() {
            while self.decode_sub_block(&mut block)? {}
        }
        self.expected_next = Self::expected(&block);
        Ok(block)
    }

    /// Decode the header block
    fn decode_header(&mut self) -> Result<Block> {
        let sz = BlockCode::Header_.size();
        if self.buf.len() < sz {
            // a short buffer is only truncated if what exists could be GIF
            let n = self.buf.len().min(3);
            if self.buf[..n] != b"GIF"[..n] {
                return Err(Error::MalformedHeader);
            }
        }
        let block: Block = Header::from_buf(self.take(sz)?)?.into();
        self.expected_next = Self::expected(&block);
        Ok(block)
    }

    /// Parse a block in the buffer
    fn parse_block(bc: BlockCode, buf: &[u8]) -> Result<Block> {
        use crate::block::BlockCode::*;
        Ok(match bc {
            Header_ => Header::from_buf(buf)?.into(),
            LogicalScreenDesc_ => LogicalScreenDesc::from_buf(buf).into(),
            GlobalColorTable_ => Block::GlobalColorTable(ColorTable::with_colors(buf)),
            Extension_ => Block::parse_extension(buf),
            ImageDesc_ => ImageDesc::from_buf(buf).into(),
            LocalColorTable_ => Block::LocalColorTable(ColorTable::with_colors(buf)),
            ImageData_ => ImageData::new(buf[0]).into(),
            Trailer_ => Trailer::default().into(),
        })
    }

    /// Decode one sub-block
    ///
    /// Returns `false` on the zero-length terminator.
    fn decode_sub_block(&mut self, block: &mut Block) -> Result<bool> {
        let sz = usize::from(self.take(1)?[0]);
        if sz == 0 {
            return Ok(false);
        }
        let buf = self.take(sz)?;
        trace!("sub-block: {:?}", sz);
        use crate::block::Block::*;
        match block {
            PlainText(b) => b.add_sub_block(buf),
            GraphicControl(b) => b.parse_buf(buf)?,
            Comment(b) => b.add_comment(buf),
            Application(b) => b.add_app_data(buf),
            Unknown(b) => b.add_sub_block(buf),
            ImageData(b) => b.add_data(buf),
            _ => return Err(Error::InvalidBlockSequence),
        }
        Ok(true)
    }
}

impl Header {
    /// Decode a Header block from a buffer
    fn from_buf(buf: &[u8]) -> Result<Self> {
        if &buf[..3] == b"GIF" {
            let version = [buf[3], buf[4], buf[5]];
            match &version {
                b"87a" | b"89a" => Ok(Header::with_version(version)),
                _ => Err(Error::UnsupportedVersion(version)),
            }
        } else {
            Err(Error::MalformedHeader)
        }
    }
}

impl LogicalScreenDesc {
    /// Decode a Logical Screen Descriptor block from a buffer
    fn from_buf(buf: &[u8]) -> Self {
        let width = u16::from_le_bytes([buf[0], buf[1]]);
        let height = u16::from_le_bytes([buf[2], buf[3]]);
        LogicalScreenDesc::default()
            .with_screen_width(width)
            .with_screen_height(height)
            .with_flags(buf[4])
            .with_background_color_idx(buf[5])
            .with_pixel_aspect_ratio(buf[6])
    }
}

impl ImageDesc {
    /// Decode an Image Descriptor block from a buffer
    fn from_buf(buf: &[u8]) -> Self {
        let left = u16::from_le_bytes([buf[1], buf[2]]);
        let top = u16::from_le_bytes([buf[3], buf[4]]);
        let width = u16::from_le_bytes([buf[5], buf[6]]);
        let height = u16::from_le_bytes([buf[7], buf[8]]);
        ImageDesc::default()
            .with_left(left)
            .with_top(top)
            .with_width(width)
            .with_height(height)
            .with_flags(buf[9])
    }
}

impl Block {
    /// Parse an extension block
    fn parse_extension(buf: &[u8]) -> Self {
        use crate::block::ExtensionCode::*;
        match ExtensionCode::from(buf[1]) {
            PlainText_ => PlainText::default().into(),
            GraphicControl_ => GraphicControl::default().into(),
            Comment_ => Comment::default().into(),
            Application_ => Application::default().into(),
            Unknown_(n) => Unknown::new(n).into(),
        }
    }
}

impl GraphicControl {
    /// Parse a Graphic Control extension sub-block
    fn parse_buf(&mut self, buf: &[u8]) -> Result<()> {
        if buf.len() == 4 {
            self.set_flags(buf[0]);
            self.set_delay_time_cs(u16::from_le_bytes([buf[1], buf[2]]));
            self.set_transparent_color_idx(buf[3]);
            Ok(())
        } else {
            Err(Error::MalformedGraphicControlExtension)
        }
    }
}

/// An `Iterator` grouping blocks into [FrameBlocks].
///
/// [FrameBlocks]: block/struct.FrameBlocks.html
pub struct Frames<'a> {
    /// Block iterator
    blocks: Blocks<'a>,
    /// Header block
    header: Option<Header>,
    /// Logical screen descriptor block
    logical_screen_desc: Option<LogicalScreenDesc>,
    /// Global color table
    global_color_table: Option<ColorTable>,
    /// Pending graphic control extension
    graphic_control_ext: Option<GraphicControl>,
    /// Pending image descriptor
    image_desc: Option<ImageDesc>,
    /// Pending local color table
    local_color_table: Option<ColorTable>,
    /// Loop count from an application extension
    loop_count: Option<u16>,
    /// All comment blocks
    comments: Vec<Comment>,
    /// Number of frames produced
    n_frames: usize,
}

impl<'a> Iterator for Frames<'a> {
    type Item = Result<FrameBlocks>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(block) = self.blocks.next() {
            let res = block.and_then(|b| self.handle_block(b));
            match res {
                Ok(Some(f)) => return Some(Ok(f)),
                Ok(None) => {} // need more blocks
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

impl<'a> Frames<'a> {
    /// Create a new frame iterator
    pub fn new(buf: &'a [u8]) -> Self {
        Frames {
            blocks: Blocks::new(buf),
            header: None,
            logical_screen_desc: None,
            global_color_table: None,
            graphic_control_ext: None,
            image_desc: None,
            local_color_table: None,
            loop_count: None,
            comments: vec![],
            n_frames: 0,
        }
    }

    /// Read preamble blocks.  These are the header, logical screen
    /// descriptor and global color table at the beginning of the buffer.
    pub fn preamble(&mut self) -> Result<Preamble> {
        while !self.has_preamble() {
            match self.blocks.next() {
                Some(block) => {
                    self.handle_block(block?)?;
                }
                None => return Err(Error::TruncatedBlock),
            }
        }
        match (&self.header, &self.logical_screen_desc) {
            (Some(header), Some(logical_screen_desc)) => Ok(Preamble {
                header: header.clone(),
                logical_screen_desc: logical_screen_desc.clone(),
                global_color_table: self.global_color_table.clone(),
            }),
            _ => Err(Error::InvalidBlockSequence),
        }
    }

    /// Check if all preamble blocks have been read
    fn has_preamble(&self) -> bool {
        match &self.logical_screen_desc {
            Some(lsd) => {
                lsd.color_table_config().is_empty()
                    || self.global_color_table.is_some()
            }
            None => false,
        }
    }

    /// Get the loop count, if an application extension declared one
    pub fn loop_count(&self) -> Option<u16> {
        self.loop_count
    }

    /// Get all comments read so far
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Get the number of bytes consumed so far
    pub fn consumed(&self) -> usize {
        self.blocks.consumed()
    }

    /// Check if any frame blocks are pending
    fn has_frame(&self) -> bool {
        self.graphic_control_ext.is_some()
            || self.image_desc.is_some()
            || self.local_color_table.is_some()
    }

    /// Handle one block
    fn handle_block(&mut self, block: Block) -> Result<Option<FrameBlocks>> {
        match block {
            Block::Header(b) => self.header = Some(b),
            Block::LogicalScreenDesc(b) => self.logical_screen_desc = Some(b),
            Block::GlobalColorTable(b) => self.global_color_table = Some(b),
            Block::Application(b) => {
                if let Some(c) = b.loop_count() {
                    self.loop_count = Some(c);
                }
            }
            Block::Comment(b) => self.comments.push(b),
            Block::PlainText(_) => {
                // graphic control applies to the plain text, not an image
                if self.image_desc.is_some() {
                    return Err(Error::InvalidBlockSequence);
                }
                self.graphic_control_ext = None;
            }
            Block::Unknown(b) => debug!("unknown extension: {}", b.ext_id()),
            Block::GraphicControl(b) => {
                if self.has_frame() {
                    return Err(Error::InvalidBlockSequence);
                }
                self.graphic_control_ext = Some(b);
            }
            Block::ImageDesc(b) => {
                if self.image_desc.is_some() {
                    return Err(Error::InvalidBlockSequence);
                }
                self.image_desc = Some(b);
            }
            Block::LocalColorTable(b) => self.local_color_table = Some(b),
            Block::ImageData(image_data) => {
                let graphic_control_ext = self.graphic_control_ext.take();
                let local_color_table = self.local_color_table.take();
                return match self.image_desc.take() {
                    Some(image_desc) => {
                        self.n_frames += 1;
                        Ok(Some(FrameBlocks {
                            graphic_control_ext,
                            image_desc,
                            local_color_table,
                            image_data,
                        }))
                    }
                    None => Err(Error::InvalidBlockSequence),
                };
            }
            Block::Trailer(_) => {
                if self.has_frame() {
                    return Err(Error::InvalidBlockSequence);
                }
                if self.n_frames == 0 {
                    return Err(Error::NoImages);
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fixture::{self, GifBuilder, Image};

    #[test]
    fn captured_blocks() -> Result<()> {
        let blocks: Vec<Block> = Blocks::new(&fixture::SIMPLE_10X10)
            .collect::<Result<_>>()?;
        assert_eq!(blocks.len(), 7);
        assert!(matches!(&blocks[0], Block::Header(h) if &h.version() == b"89a"));
        match &blocks[1] {
            Block::LogicalScreenDesc(b) => {
                assert_eq!(b.screen_width(), 10);
                assert_eq!(b.screen_height(), 10);
                assert_eq!(b.color_table_config().len(), 4);
            }
            b => panic!("unexpected block {b:?}"),
        }
        assert!(matches!(&blocks[2], Block::GlobalColorTable(t) if t.len() == 4));
        assert!(matches!(&blocks[3], Block::GraphicControl(_)));
        assert!(matches!(&blocks[4], Block::ImageDesc(d) if d.image_sz() == 100));
        match &blocks[5] {
            Block::ImageData(b) => {
                assert_eq!(b.min_code_size(), 2);
                assert_eq!(b.data().len(), 22);
            }
            b => panic!("unexpected block {b:?}"),
        }
        assert!(matches!(&blocks[6], Block::Trailer(_)));
        Ok(())
    }

    #[test]
    fn invalid_signature() {
        let mut blocks = Blocks::new(b"XYZZZA\x01\x00\x01\x00\x00\x00\x00");
        assert_eq!(blocks.next(), Some(Err(Error::MalformedHeader)));
        assert_eq!(blocks.next(), None);
        let mut blocks = Blocks::new(b"XY");
        assert_eq!(blocks.next(), Some(Err(Error::MalformedHeader)));
        let mut blocks = Blocks::new(b"GI");
        assert_eq!(blocks.next(), Some(Err(Error::TruncatedBlock)));
        let mut blocks = Blocks::new(b"GIF90a");
        assert_eq!(
            blocks.next(),
            Some(Err(Error::UnsupportedVersion(*b"90a")))
        );
    }

    #[test]
    fn truncated_sub_block() {
        let gif = &fixture::SIMPLE_10X10[..50];
        let res: Result<Vec<Block>> = Blocks::new(gif).collect();
        assert_eq!(res, Err(Error::TruncatedBlock));
    }

    #[test]
    fn sub_blocks_are_concatenated() -> Result<()> {
        let gif = GifBuilder::new(4, 4)
            .global_colors(&[0, 0, 0, 255, 255, 255])
            .image(Image::new(4, 4, vec![1; 16]).sub_block_len(2))
            .build();
        let mut frames = Frames::new(&gif);
        frames.preamble()?;
        let frame = frames.next().ok_or(Error::NoImages)??;
        let mut dec = crate::lzw::Decompressor::new(
            frame.image_data.min_code_size(),
        )?;
        assert_eq!(dec.decompress(frame.image_data.data(), 16)?, vec![1; 16]);
        assert!(frames.next().is_none());
        Ok(())
    }

    #[test]
    fn extensions() -> Result<()> {
        let gif = GifBuilder::new(2, 2)
            .global_colors(&[0, 0, 0, 255, 255, 255])
            .loop_count(3)
            .comment("hello")
            .image(Image::new(2, 2, vec![0, 1, 1, 0]).delay(7))
            .comment(" world")
            .build();
        let mut frames = Frames::new(&gif);
        let preamble = frames.preamble()?;
        assert_eq!(preamble.screen_width(), 2);
        assert_eq!(preamble.global_color_table.map(|t| t.len()), Some(2));
        let all: Vec<FrameBlocks> = frames.by_ref().collect::<Result<_>>()?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].delay_time_cs(), 7);
        assert_eq!(frames.loop_count(), Some(3));
        let text: String = frames.comments().iter().map(|c| c.text()).collect();
        assert_eq!(text, "hello world");
        assert_eq!(frames.consumed(), gif.len());
        Ok(())
    }

    #[test]
    fn preamble_blocks() -> Result<()> {
        let preamble = Frames::new(&fixture::SIMPLE_2X2).preamble()?;
        let expected = Preamble {
            header: Header::with_version(*b"89a"),
            logical_screen_desc: LogicalScreenDesc::default()
                .with_screen_width(2)
                .with_screen_height(2)
                .with_flags(0x80)
                .with_background_color_idx(1),
            global_color_table: Some(ColorTable::with_colors(&[
                0, 0, 0, 0xFF, 0xFF, 0xFF,
            ])),
        };
        assert_eq!(preamble, expected);
        Ok(())
    }

    #[test]
    fn trailer_without_images() {
        let gif = GifBuilder::new(2, 2).build();
        let mut frames = Frames::new(&gif);
        assert!(frames.preamble().is_ok());
        assert_eq!(frames.next(), Some(Err(Error::NoImages)));
        assert_eq!(frames.next(), None);
    }

    #[test]
    fn missing_trailer() {
        let mut gif = GifBuilder::new(2, 2)
            .global_colors(&[0, 0, 0, 255, 255, 255])
            .image(Image::new(2, 2, vec![0, 1, 1, 0]))
            .build();
        gif.pop();
        let res: Result<Vec<FrameBlocks>> = Frames::new(&gif).collect();
        assert_eq!(res, Err(Error::TruncatedBlock));
    }

    #[test]
    fn invalid_block_code() {
        let mut gif = GifBuilder::new(2, 2).build();
        let n = gif.len();
        gif[n - 1] = 0x99;
        let res: Result<Vec<Block>> = Blocks::new(&gif).collect();
        assert_eq!(res, Err(Error::InvalidBlockCode(0x99)));
    }

    #[test]
    fn malformed_graphic_control() {
        let mut gif = GifBuilder::new(2, 2)
            .global_colors(&[0, 0, 0, 255, 255, 255])
            .image(Image::new(2, 2, vec![0, 1, 1, 0]).delay(1))
            .build();
        // graphic control follows the 6 + 7 + 6 byte preamble
        assert_eq!(&gif[19..22], &[0x21, 0xF9, 0x04]);
        gif[21] = 0x03;
        let res: Result<Vec<Block>> = Blocks::new(&gif).collect();
        assert_eq!(res, Err(Error::MalformedGraphicControlExtension));
    }

    #[test]
    fn plain_text_consumes_control() -> Result<()> {
        let gif = GifBuilder::new(2, 2)
            .global_colors(&[0, 0, 0, 255, 255, 255])
            .raw(&[0x21, 0xF9, 0x04, 0x01, 0x05, 0x00, 0x00, 0x00])
            .raw(&[0x21, 0x01, 0x0C])
            .raw(&[0, 0, 0, 0, 2, 0, 2, 0, 1, 1, 1, 0])
            .raw(&[0x02, b'h', b'i', 0x00])
            .image(Image::new(2, 2, vec![0, 1, 1, 0]))
            .build();
        let blocks: Vec<Block> = Blocks::new(&gif).collect::<Result<_>>()?;
        assert!(blocks.iter().any(|b| matches!(b, Block::PlainText(_))));
        let frames: Vec<FrameBlocks> = Frames::new(&gif).collect::<Result<_>>()?;
        assert_eq!(frames.len(), 1);
        assert!(frames[0].graphic_control_ext.is_none());
        assert_eq!(frames[0].delay_time_cs(), 0);
        Ok(())
    }
}
