//! Bit sources for reseeding.

use std::io::{ErrorKind, Read};

use tracing::warn;

/// Unpacks a byte stream into bits, most significant bit first.
///
/// Ends at EOF. Any other read error is logged and also ends the stream.
///
/// ```ignore
/// let urandom = std::fs::File::open("/dev/urandom")?;
/// engine.randomize(ByteBits::new(std::io::BufReader::new(urandom)));
/// ```
#[derive(Debug)]
pub struct ByteBits<R> {
    reader: R,
    byte: u8,
    mask: u8,
}

impl<R: Read> ByteBits<R> {
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            byte: 0,
            mask: 0,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for ByteBits<R> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.mask == 0 {
            let mut buf = [0u8; 1];
            match self.reader.read_exact(&mut buf) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => return None,
                Err(e) => {
                    warn!("bit source failed: {e}");
                    return None;
                }
            }
            self.byte = buf[0];
            self.mask = 0x80;
        }
        let bit = self.byte & self.mask != 0;
        self.mask >>= 1;
        Some(bit)
    }
}
