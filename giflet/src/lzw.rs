// lzw.rs
//
// Copyright (c) 2020-2026  Douglas Lau
//
//! Lempel-Ziv-Welch decompression for GIF
use crate::bits::{BitReader, MAX_CODE_BITS};
use crate::error::{Error, Result};
use log::{debug, trace};
use std::ops::AddAssign;

/// Code Bits
#[derive(Clone, Copy, Debug, PartialEq)]
struct Bits(u8);

impl From<u8> for Bits {
    fn from(bits: u8) -> Self {
        Bits(bits.min(Self::MAX.0))
    }
}

impl From<Bits> for u8 {
    fn from(bits: Bits) -> Self {
        bits.0
    }
}

impl AddAssign<u8> for Bits {
    fn add_assign(&mut self, rhs: u8) {
        self.0 = (self.0 + rhs).min(Self::MAX.0)
    }
}

impl Bits {
    /// Maximum code bits allowed for GIF
    const MAX: Self = Bits(MAX_CODE_BITS);

    /// Get the number of entries
    fn entries(self) -> u16 {
        1 << (self.0 as u16)
    }
}

/// Code type
type Code = u16;

/// Node for code dictionary
trait Node {
    /// Create a new node
    fn new(next: Option<Code>, byte: u8) -> Self;

    /// Get the byte value
    fn byte(self) -> u8;
}

/// Node for Decompressor
#[derive(Clone, Copy, Debug)]
struct DNode {
    /// Next (prefix) node code
    next: Option<Code>,
    /// Byte value
    byte: u8,
}

/// Code dictionary trie
#[derive(Debug)]
struct Trie<N: Node> {
    /// Table of codes
    table: Vec<N>,
    /// Minimum code bits
    min_code_bits: u8,
}

/// LZW Data Decompressor
///
/// Clear and end codes sit at `2^min_code_bits` and `2^min_code_bits + 1`.
/// The table grows by one entry per code until the code width reaches 12
/// bits; after that, growth stops until the next clear code.
#[derive(Debug)]
pub struct Decompressor {
    /// Code dictionary
    trie: Trie<DNode>,
    /// Minimum code bits
    min_code_bits: u8,
    /// Current code bits
    code_bits: Bits,
    /// Last code
    last: Option<Code>,
}

impl Node for DNode {
    fn new(next: Option<Code>, byte: u8) -> Self {
        DNode { next, byte }
    }

    fn byte(self) -> u8 {
        self.byte
    }
}

impl<N: Node> Trie<N> {
    /// Create a new code dictionary
    fn new(min_code_bits: u8) -> Self {
        let mut trie = Trie {
            table: Vec::with_capacity(Bits::MAX.entries().into()),
            min_code_bits,
        };
        trie.reset();
        trie
    }

    /// Get the clear code
    fn clear_code(&self) -> Code {
        1 << self.min_code_bits
    }

    /// Get the end code
    fn end_code(&self) -> Code {
        self.clear_code() + 1
    }

    /// Get the next available code
    fn next_code(&self) -> Code {
        self.table.len() as Code
    }

    /// Check whether the dictionary is full
    fn is_full(&self) -> bool {
        self.table.len() >= usize::from(Bits::MAX.entries())
    }

    /// Reset the dictionary
    fn reset(&mut self) {
        self.table.clear();
        for byte in 0..self.clear_code() {
            self.push_node(None, byte as u8);
        }
        self.push_node(None, 0); // clear code
        self.push_node(None, 0); // end code
    }

    /// Push a node into the dictionary
    fn push_node(&mut self, next: Option<Code>, byte: u8) {
        self.table.push(N::new(next, byte))
    }
}

impl Trie<DNode> {
    /// Lookup the first byte of a code value
    fn lookup(&self, code: Code) -> u8 {
        debug_assert!(code < self.next_code());
        let mut node = self.table[code as usize];
        while let Some(code) = node.next {
            node = self.table[code as usize];
        }
        node.byte()
    }

    /// Decompress a code into a buffer (reversed)
    fn decompress_reversed(&self, code: Code, buffer: &mut Vec<u8>) {
        debug_assert!(code < self.next_code());
        let mut node = self.table[code as usize];
        while let Some(code) = node.next {
            buffer.push(node.byte());
            node = self.table[code as usize];
        }
        buffer.push(node.byte());
    }
}

impl Decompressor {
    /// Create a new decompressor
    ///
    /// Minimum code sizes below 2 are raised to 2.
    pub fn new(min_code_size: u8) -> Result<Self> {
        if min_code_size >= MAX_CODE_BITS {
            return Err(Error::InvalidCodeSize(min_code_size));
        }
        let min_code_bits = min_code_size.max(2);
        Ok(Decompressor {
            min_code_bits,
            trie: Trie::<DNode>::new(min_code_bits),
            code_bits: Bits::from(min_code_bits + 1),
            last: None,
        })
    }

    /// Decompress one image block into exactly `expected` indexed pixels
    ///
    /// Pixels decoded past `expected` are discarded.
    pub fn decompress(&mut self, bytes: &[u8], expected: usize)
        -> Result<Vec<u8>>
    {
        let mut reader = BitReader::new(bytes);
        let mut buffer = Vec::with_capacity(expected);
        while buffer.len() < expected {
            let code = match reader.next_code(self.code_bits.into()) {
                Ok(code) => code,
                Err(Error::BitstreamExhausted) => {
                    debug!("LZW stream ended without end code");
                    break;
                }
                Err(e) => return Err(e),
            };
            if code == self.trie.clear_code() {
                self.reset();
            } else if code == self.trie.end_code() {
                trace!("end code, {} bits unused", reader.remaining_bits());
                break;
            } else {
                self.decompress_code(code, &mut buffer)?;
            }
        }
        match buffer.len() {
            n if n < expected => Err(Error::ShortPixelData {
                expected,
                decoded: n,
            }),
            n => {
                if n > expected {
                    trace!("discarding {} extra pixels", n - expected);
                    buffer.truncate(expected);
                }
                Ok(buffer)
            }
        }
    }

    /// Reset on a clear code
    fn reset(&mut self) {
        self.trie.reset();
        self.code_bits = Bits::from(self.min_code_bits + 1);
        self.last = None;
    }

    /// Decompress one code
    fn decompress_code(
        &mut self,
        code: Code,
        buffer: &mut Vec<u8>,
    ) -> Result<()> {
        let next_code = self.trie.next_code();
        match self.last {
            None if code < self.trie.clear_code() => buffer.push(code as u8),
            Some(last) if code < next_code => {
                let start = buffer.len();
                self.trie.decompress_reversed(code, buffer);
                let byte = buffer[buffer.len() - 1];
                buffer[start..].reverse();
                self.grow(last, byte);
            }
            Some(last) if code == next_code && !self.trie.is_full() => {
                self.grow(last, self.trie.lookup(last));
                let start = buffer.len();
                self.trie.decompress_reversed(code, buffer);
                buffer[start..].reverse();
            }
            _ => return Err(Error::InvalidLzwCode(code)),
        }
        self.last = Some(code);
        Ok(())
    }

    /// Add a dictionary entry, widening codes when needed
    fn grow(&mut self, last: Code, byte: u8) {
        if !self.trie.is_full() {
            self.trie.push_node(Some(last), byte);
            if self.trie.next_code() == self.code_bits.entries() {
                self.code_bits += 1;
            }
        }
    }
}

/// Node for Compressor
#[cfg(test)]
#[derive(Clone, Copy, Debug)]
struct CNode {
    /// Next node code
    next: Option<Code>,
    /// Left node code
    left: Option<Code>,
    /// Right node code
    right: Option<Code>,
    /// Byte value
    byte: u8,
}

#[cfg(test)]
impl Node for CNode {
    fn new(next: Option<Code>, byte: u8) -> Self {
        CNode {
            next,
            left: None,
            right: None,
            byte,
        }
    }

    fn byte(self) -> u8 {
        self.byte
    }
}

#[cfg(test)]
impl CNode {
    /// Get a link code
    fn link(&self, ordering: std::cmp::Ordering) -> Option<Code> {
        use std::cmp::Ordering;
        match ordering {
            Ordering::Less => self.left,
            Ordering::Equal => self.next,
            Ordering::Greater => self.right,
        }
    }

    /// Set a link code
    fn set_link(&mut self, ordering: std::cmp::Ordering, code: Code) {
        use std::cmp::Ordering;
        match ordering {
            Ordering::Less => self.left = Some(code),
            Ordering::Equal => self.next = Some(code),
            Ordering::Greater => self.right = Some(code),
        }
    }
}

#[cfg(test)]
impl Trie<CNode> {
    /// Search and insert a node
    fn search_insert(&mut self, code: Option<Code>, byte: u8) -> Option<Code> {
        match code {
            Some(code) => self.insert(code, byte),
            None => Some(byte as Code),
        }
    }

    /// Insert a node
    fn insert(&mut self, code: Code, byte: u8) -> Option<Code> {
        use std::cmp::Ordering;
        let next_code = self.next_code();
        let mut node = &mut self.table[code as usize];
        let mut ordering = Ordering::Equal;
        while let Some(code) = node.link(ordering) {
            node = &mut self.table[code as usize];
            ordering = byte.cmp(&node.byte());
            if ordering == Ordering::Equal {
                return Some(code);
            }
        }
        node.set_link(ordering, next_code);
        self.push_node(None, byte);
        None
    }
}

/// LZW Data Compressor, used to build test fixtures
#[cfg(test)]
pub(crate) struct Compressor {
    /// Code dictionary
    trie: Trie<CNode>,
    /// Minimum code bits
    min_code_bits: u8,
    /// Current code bits
    code_bits: Bits,
    /// Current code
    code: u32,
    /// Number of bits in current code
    n_bits: u8,
}

#[cfg(test)]
impl Compressor {
    /// Create a new compressor
    pub fn new(min_code_bits: u8) -> Self {
        let trie = Trie::<CNode>::new(min_code_bits);
        let code_bits = Bits::from(min_code_bits + 1);
        Compressor {
            min_code_bits,
            trie,
            code_bits,
            code: 0,
            n_bits: 0,
        }
    }

    /// Pack a code into a buffer
    fn pack(&mut self, code: Code, buffer: &mut Vec<u8>) {
        self.code |= (code as u32) << self.n_bits;
        self.n_bits += u8::from(self.code_bits);
        while self.n_bits >= 8 {
            buffer.push(self.code as u8);
            self.code >>= 8;
            self.n_bits -= 8;
        }
    }

    /// Compress a byte buffer
    pub fn compress(&mut self, bytes: &[u8], buffer: &mut Vec<u8>) {
        self.pack(self.trie.clear_code(), buffer);
        let mut code = None;
        for byte in bytes {
            code = self.trie.search_insert(code, *byte).or_else(|| {
                if let Some(code) = code {
                    self.pack(code, buffer);
                }
                Some(*byte as Code)
            });
            let next_code = self.trie.next_code();
            if next_code > self.code_bits.entries() {
                if next_code > Bits::MAX.entries() {
                    self.pack(self.trie.clear_code(), buffer);
                    self.trie.reset();
                    self.code_bits = Bits::from(self.min_code_bits + 1);
                } else {
                    self.code_bits += 1;
                }
            }
        }
        if let Some(code) = code {
            self.pack(code, buffer);
        }
        self.pack(self.trie.end_code(), buffer);
        if self.n_bits > 0 {
            buffer.push(self.code as u8);
            self.code = 0;
            self.n_bits = 0;
        }
    }
}
