// block.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Block records of the GIF container grammar
use std::ops::Range;

/// Number of channels in a color table entry
const CHANNELS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTableExistence {
    Absent,
    Present,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTableOrdering {
    NotSorted,
    Sorted,
}

/// Color table configuration from a descriptor's packed flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTableConfig {
    existence: ColorTableExistence,
    ordering: ColorTableOrdering,
    table_len: usize, // must be between 2...256
}

impl ColorTableConfig {
    /// Create a config from the 3-bit size field
    fn from_flags(existence: ColorTableExistence, ordering: ColorTableOrdering,
        size_bits: u8) -> Self
    {
        let table_len = 2 << (size_bits & 0b0111);
        ColorTableConfig { existence, ordering, table_len }
    }
    pub fn existence(&self) -> ColorTableExistence {
        self.existence
    }
    pub fn ordering(&self) -> ColorTableOrdering {
        self.ordering
    }
    /// Number of entries (zero when absent)
    pub fn len(&self) -> usize {
        match self.existence {
            ColorTableExistence::Absent => 0,
            ColorTableExistence::Present => self.table_len,
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn size_bytes(&self) -> usize {
        self.len() * CHANNELS
    }
}

/// Disposal method of a frame
///
/// Decides the canvas state seen by the next frame.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum DisposalMethod {
    /// No disposal specified
    #[default]
    NoAction,
    /// Do not dispose; leave the canvas as-is
    Keep,
    /// Restore frame area to the background color
    Background,
    /// Restore frame area to the canvas before the frame
    Previous,
    /// Reserved values (treated as `Keep`)
    Reserved(u8),
}

impl From<u8> for DisposalMethod {
    fn from(n: u8) -> Self {
        use self::DisposalMethod::*;
        match n & 0b0111 {
            0 => NoAction,
            1 => Keep,
            2 => Background,
            3 => Previous,
            _ => Reserved(n & 0b0111),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BlockCode {
    Header_,
    LogicalScreenDesc_,
    GlobalColorTable_,
    Extension_,
    ImageDesc_,
    LocalColorTable_,
    ImageData_,
    Trailer_,
}

impl BlockCode {
    pub fn from_u8(t: u8) -> Option<Self> {
        use self::BlockCode::*;
        match t {
            b',' => Some(ImageDesc_),   // (0x2C) Image separator
            b'!' => Some(Extension_),   // (0x21) Extension introducer
            b';' => Some(Trailer_),     // (0x3B) GIF trailer
            _ => None,
        }
    }
    /// Fixed size of the block (before any table or sub-blocks)
    pub fn size(&self) -> usize {
        use self::BlockCode::*;
        match self {
            Header_ => 6,
            LogicalScreenDesc_ => 7,
            ImageDesc_ => 10,
            Trailer_ => 1,
            Extension_ => 2, // +sub-blocks
            ImageData_ => 1, // +sub-blocks
            _ => 0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ExtensionCode {
    PlainText_,
    GraphicControl_,
    Comment_,
    Application_,
    Unknown_(u8),
}

impl From<u8> for ExtensionCode {
    fn from(n: u8) -> Self {
        use self::ExtensionCode::*;
        match n {
            0x01 => PlainText_,
            0xF9 => GraphicControl_,
            0xFE => Comment_,
            0xFF => Application_,
            _ => Unknown_(n),
        }
    }
}

/// Header block (signature and version)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    version: [u8; 3],
}

impl Header {
    pub fn with_version(version: [u8; 3]) -> Self {
        Header { version }
    }
    pub fn version(&self) -> [u8; 3] {
        self.version
    }
}

/// Logical Screen Descriptor block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogicalScreenDesc {
    screen_width: u16,
    screen_height: u16,
    flags: u8,
    background_color_idx: u8,   // index into global color table
    pixel_aspect_ratio: u8,
}

impl LogicalScreenDesc {
    const COLOR_TABLE_PRESENT: u8  = 0b1000_0000;
    const COLOR_RESOLUTION: u8     = 0b0111_0000;
    const COLOR_TABLE_ORDERING: u8 = 0b0000_1000;
    const COLOR_TABLE_SIZE: u8     = 0b0000_0111;

    pub fn with_screen_width(mut self, screen_width: u16) -> Self {
        self.screen_width = screen_width;
        self
    }
    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }
    pub fn with_screen_height(mut self, screen_height: u16) -> Self {
        self.screen_height = screen_height;
        self
    }
    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    fn color_table_existence(&self) -> ColorTableExistence {
        if self.flags & Self::COLOR_TABLE_PRESENT != 0 {
            ColorTableExistence::Present
        } else {
            ColorTableExistence::Absent
        }
    }
    /// Bits per primary color of the original image
    pub fn color_resolution(&self) -> u8 {
        ((self.flags & Self::COLOR_RESOLUTION) >> 4) + 1
    }
    fn color_table_ordering(&self) -> ColorTableOrdering {
        if self.flags & Self::COLOR_TABLE_ORDERING != 0 {
            ColorTableOrdering::Sorted
        } else {
            ColorTableOrdering::NotSorted
        }
    }
    pub fn color_table_config(&self) -> ColorTableConfig {
        ColorTableConfig::from_flags(
            self.color_table_existence(),
            self.color_table_ordering(),
            self.flags & Self::COLOR_TABLE_SIZE,
        )
    }
    pub fn with_background_color_idx(mut self, background_color_idx: u8)
        -> Self
    {
        self.background_color_idx = background_color_idx;
        self
    }
    pub fn background_color_idx(&self) -> u8 {
        self.background_color_idx
    }
    pub fn with_pixel_aspect_ratio(mut self, pixel_aspect_ratio: u8)
        -> Self
    {
        self.pixel_aspect_ratio = pixel_aspect_ratio;
        self
    }
    pub fn pixel_aspect_ratio(&self) -> u8 {
        self.pixel_aspect_ratio
    }
}

/// Color table (global or local)
///
/// Ordered RGB triples; the number of entries is a power of two.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorTable {
    colors: Vec<u8>,
}

impl ColorTable {
    pub fn with_colors(colors: &[u8]) -> Self {
        debug_assert_eq!(colors.len() % CHANNELS, 0);
        let colors = colors.to_vec();
        ColorTable { colors }
    }
    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.colors.len() / CHANNELS
    }
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
    /// Get raw RGB bytes
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }
    /// Look up one entry
    pub fn rgb(&self, idx: u8) -> Option<[u8; 3]> {
        let i = usize::from(idx) * CHANNELS;
        self.colors.get(i..i + CHANNELS).map(|c| [c[0], c[1], c[2]])
    }
}

/// Plain Text extension block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlainText {
    sub_blocks: Vec<Vec<u8>>,   // sequence of sub-blocks
}

impl PlainText {
    pub fn add_sub_block(&mut self, b: &[u8]) {
        self.sub_blocks.push(b.to_vec());
    }
    pub fn sub_blocks(&self) -> &[Vec<u8>] {
        &self.sub_blocks
    }
}

/// Graphic Control extension block
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphicControl {
    flags: u8,
    delay_time_cs: u16,      // delay in centiseconds (hundredths of a second)
    transparent_color_idx: u8,
}

impl GraphicControl {
    const DISPOSAL_METHOD: u8   = 0b0001_1100;
    const USER_INPUT: u8        = 0b0000_0010;
    const TRANSPARENT_COLOR: u8 = 0b0000_0001;

    pub fn set_flags(&mut self, flags: u8) {
        self.flags = flags;
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn disposal_method(&self) -> DisposalMethod {
        ((self.flags & Self::DISPOSAL_METHOD) >> 2).into()
    }
    pub fn user_input(&self) -> bool {
        (self.flags & Self::USER_INPUT) != 0
    }
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }
    pub fn set_delay_time_cs(&mut self, delay_time_cs: u16) {
        self.delay_time_cs = delay_time_cs;
    }
    /// Get the transparent color index, if the flag is set
    pub fn transparent_color(&self) -> Option<u8> {
        if (self.flags & Self::TRANSPARENT_COLOR) != 0 {
            Some(self.transparent_color_idx)
        } else {
            None
        }
    }
    pub fn set_transparent_color_idx(&mut self, transparent_color_idx: u8) {
        self.transparent_color_idx = transparent_color_idx;
    }
}

/// Comment extension block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Comment {
    comments: Vec<Vec<u8>>, // ascii only comments recommended
}

impl Comment {
    pub fn add_comment(&mut self, b: &[u8]) {
        self.comments.push(b.to_vec());
    }
    pub fn comments(&self) -> &[Vec<u8>] {
        &self.comments
    }
    /// Get comment text, joining all sub-blocks
    pub fn text(&self) -> String {
        let bytes: Vec<u8> = self.comments.concat();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Application extension block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Application {
    app_data: Vec<Vec<u8>>,     // sequence of sub-blocks
}

impl Application {
    fn is_looping(app_id: &[u8]) -> bool {
        app_id == b"NETSCAPE2.0" || app_id == b"ANIMEXTS1.0"
    }
    pub fn add_app_data(&mut self, b: &[u8]) {
        self.app_data.push(b.to_vec());
    }
    pub fn app_data(&self) -> &[Vec<u8>] {
        &self.app_data
    }
    /// Get the animation loop count (zero means loop forever)
    pub fn loop_count(&self) -> Option<u16> {
        let d = &self.app_data;
        let exists = d.len() == 2 &&            // 2 sub-blocks
                     Self::is_looping(&d[0]) && // app ID / auth code
                     d[1].len() == 3 &&         // app data sub-block length
                     d[1][0] == 1;              // sub-block ID
        if exists {
            Some(u16::from_le_bytes([d[1][1], d[1][2]]))
        } else {
            None
        }
    }
}

/// Unrecognized extension block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Unknown {
    ext_id: u8,
    sub_blocks: Vec<Vec<u8>>,
}

impl Unknown {
    pub fn new(ext_id: u8) -> Self {
        Unknown { ext_id, sub_blocks: vec![] }
    }
    pub fn ext_id(&self) -> u8 {
        self.ext_id
    }
    pub fn add_sub_block(&mut self, b: &[u8]) {
        self.sub_blocks.push(b.to_vec());
    }
    pub fn sub_blocks(&self) -> &[Vec<u8>] {
        &self.sub_blocks
    }
}

/// Image Descriptor block
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageDesc {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    flags: u8,
}

impl ImageDesc {
    const COLOR_TABLE_PRESENT: u8  = 0b1000_0000;
    const INTERLACED: u8           = 0b0100_0000;
    const COLOR_TABLE_ORDERING: u8 = 0b0010_0000;
    const COLOR_TABLE_SIZE: u8     = 0b0000_0111;

    pub fn with_left(mut self, left: u16) -> Self {
        self.left = left;
        self
    }
    pub fn left(&self) -> u16 {
        self.left
    }
    pub fn with_top(mut self, top: u16) -> Self {
        self.top = top;
        self
    }
    pub fn top(&self) -> u16 {
        self.top
    }
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }
    pub fn width(&self) -> u16 {
        self.width
    }
    pub fn with_height(mut self, height: u16) -> Self {
        self.height = height;
        self
    }
    pub fn height(&self) -> u16 {
        self.height
    }
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn interlaced(&self) -> bool {
        (self.flags & Self::INTERLACED) != 0
    }
    fn color_table_existence(&self) -> ColorTableExistence {
        if self.flags & Self::COLOR_TABLE_PRESENT != 0 {
            ColorTableExistence::Present
        } else {
            ColorTableExistence::Absent
        }
    }
    fn color_table_ordering(&self) -> ColorTableOrdering {
        if self.flags & Self::COLOR_TABLE_ORDERING != 0 {
            ColorTableOrdering::Sorted
        } else {
            ColorTableOrdering::NotSorted
        }
    }
    pub fn color_table_config(&self) -> ColorTableConfig {
        ColorTableConfig::from_flags(
            self.color_table_existence(),
            self.color_table_ordering(),
            self.flags & Self::COLOR_TABLE_SIZE,
        )
    }
    /// Number of pixels in the image
    pub fn image_sz(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
    /// Column range covered on the canvas
    pub fn columns(&self) -> Range<u32> {
        let left = u32::from(self.left);
        left..left + u32::from(self.width)
    }
    /// Row range covered on the canvas
    pub fn rows(&self) -> Range<u32> {
        let top = u32::from(self.top);
        top..top + u32::from(self.height)
    }
}

/// Image Data block
///
/// Data sub-blocks are concatenated into one LZW-coded stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageData {
    min_code_size: u8,
    data: Vec<u8>,
}

impl ImageData {
    pub fn new(min_code_size: u8) -> Self {
        ImageData { min_code_size, data: vec![] }
    }
    pub fn add_data(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }
    /// LZW minimum code size
    pub fn min_code_size(&self) -> u8 {
        self.min_code_size
    }
    /// Compressed LZW data
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Trailer block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trailer {}

/// One block of the GIF container grammar
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Header(Header),
    LogicalScreenDesc(LogicalScreenDesc),
    GlobalColorTable(ColorTable),
    PlainText(PlainText),
    GraphicControl(GraphicControl),
    Comment(Comment),
    Application(Application),
    Unknown(Unknown),
    ImageDesc(ImageDesc),
    LocalColorTable(ColorTable),
    ImageData(ImageData),
    Trailer(Trailer),
}

impl Block {
    pub fn has_sub_blocks(&self) -> bool {
        use self::Block::*;
        matches!(
            self,
            PlainText(_) | GraphicControl(_) | Comment(_) | Application(_) |
            Unknown(_) | ImageData(_)
        )
    }
}

impl From<Header> for Block {
    fn from(b: Header) -> Self {
        Block::Header(b)
    }
}

impl From<LogicalScreenDesc> for Block {
    fn from(b: LogicalScreenDesc) -> Self {
        Block::LogicalScreenDesc(b)
    }
}

impl From<PlainText> for Block {
    fn from(b: PlainText) -> Self {
        Block::PlainText(b)
    }
}

impl From<GraphicControl> for Block {
    fn from(b: GraphicControl) -> Self {
        Block::GraphicControl(b)
    }
}

impl From<Comment> for Block {
    fn from(b: Comment) -> Self {
        Block::Comment(b)
    }
}

impl From<Application> for Block {
    fn from(b: Application) -> Self {
        Block::Application(b)
    }
}

impl From<Unknown> for Block {
    fn from(b: Unknown) -> Self {
        Block::Unknown(b)
    }
}

impl From<ImageDesc> for Block {
    fn from(b: ImageDesc) -> Self {
        Block::ImageDesc(b)
    }
}

impl From<ImageData> for Block {
    fn from(b: ImageData) -> Self {
        Block::ImageData(b)
    }
}

impl From<Trailer> for Block {
    fn from(b: Trailer) -> Self {
        Block::Trailer(b)
    }
}

/// Blocks at the beginning of a file, before any frame blocks
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Preamble {
    pub header: Header,
    pub logical_screen_desc: LogicalScreenDesc,
    pub global_color_table: Option<ColorTable>,
}

impl Default for Header {
    fn default() -> Self {
        Header::with_version(*b"89a")
    }
}

impl Preamble {
    /// Get the screen width
    pub fn screen_width(&self) -> u16 {
        self.logical_screen_desc.screen_width()
    }
    /// Get the screen height
    pub fn screen_height(&self) -> u16 {
        self.logical_screen_desc.screen_height()
    }
}

/// Blocks making up one frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBlocks {
    pub graphic_control_ext: Option<GraphicControl>,
    pub image_desc: ImageDesc,
    pub local_color_table: Option<ColorTable>,
    pub image_data: ImageData,
}

impl FrameBlocks {
    /// Disposal method (none if no graphic control)
    pub fn disposal_method(&self) -> DisposalMethod {
        self.graphic_control_ext
            .map(|c| c.disposal_method())
            .unwrap_or_default()
    }
    /// Transparent color index, if any
    pub fn transparent_color(&self) -> Option<u8> {
        self.graphic_control_ext.and_then(|c| c.transparent_color())
    }
    /// Delay time in centiseconds (zero if no graphic control)
    pub fn delay_time_cs(&self) -> u16 {
        self.graphic_control_ext
            .map(|c| c.delay_time_cs())
            .unwrap_or_default()
    }
}
