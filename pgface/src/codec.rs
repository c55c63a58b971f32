//! Primitive postgres wire types.
//!
//! All integers are big-endian. Postgres uses two kinds of string:
//!
//! - `String`, a nul terminated string, see [`BufferReader::read_cstring`]
//! - `Int32` length prefixed bytes, where `-1` means `NULL`, see [`BufferReader::read_pstring`]
//!
//! <https://www.postgresql.org/docs/current/protocol-message-types.html>
use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    common::ByteStr,
    ext::{BufMutExt, UsizeExt},
};

/// Cursor based reader over a message payload.
///
/// All read operation returns [`None`] when there is not enough bytes left,
/// in which case the cursor is not advanced.
#[derive(Debug, Clone)]
pub struct BufferReader {
    buf: Bytes,
    offset: usize,
}

impl BufferReader {
    pub fn new(buf: Bytes) -> Self {
        Self { buf, offset: 0 }
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Returns the unread bytes without advancing.
    pub fn rest(&self) -> Bytes {
        self.buf.slice(self.offset..)
    }

    fn has_bytes_available(&self, n: usize) -> bool {
        self.offset + n <= self.buf.len()
    }

    fn take(&mut self, n: usize) -> Option<Bytes> {
        if !self.has_bytes_available(n) {
            return None;
        }
        let bytes = self.buf.slice(self.offset..self.offset + n);
        self.offset += n;
        Some(bytes)
    }

    pub fn read_byte(&mut self) -> Option<u8> {
        Some(self.take(1)?.get_u8())
    }

    pub fn read_char(&mut self) -> Option<char> {
        self.read_byte().map(char::from)
    }

    pub fn read_int16(&mut self) -> Option<i16> {
        Some(self.take(2)?.get_i16())
    }

    pub fn read_int32(&mut self) -> Option<i32> {
        Some(self.take(4)?.get_i32())
    }

    /// Read a nul terminated string.
    ///
    /// The nul is consumed but not included. Returns [`None`] when there is no nul ahead.
    pub fn read_cstring(&mut self) -> Option<ByteStr> {
        let end = self.buf[self.offset..].iter().position(|e| *e == b'\0')?;
        let bytes = self.buf.slice(self.offset..self.offset + end);
        self.offset += end + 1;
        Some(ByteStr::from_utf8_lossy(bytes))
    }

    /// Read `Int32` length prefixed bytes.
    ///
    /// The outer [`Option`] is availability, the inner is `NULL` (length `-1`).
    pub fn read_pbytes(&mut self) -> Option<Option<Bytes>> {
        let start = self.offset;
        let len = self.read_int32()?;
        let value = match len {
            -1 => None,
            0 => Some(Bytes::new()),
            len @ 1.. => match self.take(len as usize) {
                Some(bytes) => Some(bytes),
                None => {
                    self.offset = start;
                    return None;
                }
            },
            _ => {
                self.offset = start;
                return None;
            }
        };
        Some(value)
    }

    /// Read `Int32` length prefixed string.
    ///
    /// The outer [`Option`] is availability, the inner is `NULL` (length `-1`).
    pub fn read_pstring(&mut self) -> Option<Option<ByteStr>> {
        Some(self.read_pbytes()?.map(ByteStr::from_utf8_lossy))
    }

    pub fn read_int16_list(&mut self, count: usize) -> Option<Vec<i16>> {
        self.read_list(count, Self::read_int16)
    }

    pub fn read_int32_list(&mut self, count: usize) -> Option<Vec<i32>> {
        self.read_list(count, Self::read_int32)
    }

    pub fn read_pstring_list(&mut self, count: usize) -> Option<Vec<Option<ByteStr>>> {
        self.read_list(count, Self::read_pstring)
    }

    pub fn read_pbytes_list(&mut self, count: usize) -> Option<Vec<Option<Bytes>>> {
        self.read_list(count, Self::read_pbytes)
    }

    fn read_list<T>(&mut self, count: usize, mut f: impl FnMut(&mut Self) -> Option<T>) -> Option<Vec<T>> {
        let start = self.offset;
        let list = (0..count).map(|_| f(self)).collect::<Option<Vec<T>>>();
        if list.is_none() {
            self.offset = start;
        }
        list
    }
}

// msgtype + length
const HEADER: usize = 1 + 4;

/// Growable message writer.
///
/// Fields are appended to the body, then [`flush`][BufferWriter::flush] frames
/// the body with message type and length.
///
/// ```text
/// ┏━━━━┳━━━━━━━━━━━━━━━━━━━┳━━━━━━┓
/// ┃ Ty ┃       Length      ┃ Body ┃
/// ┣━━━━╋━━━━━━━━━━━━━━━━━━━╋━━━━━━┫
/// ┃ u8 ┃        i32        ┃ [u8] ┃
/// ┗━━━━┻━━━━━━━━━━━━━━━━━━━┻━━━━━━┛
/// ```
#[derive(Debug)]
pub struct BufferWriter {
    buf: BytesMut,
}

impl Default for BufferWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferWriter {
    const DEFAULT_CAPACITY: usize = 1024;

    pub fn new() -> Self {
        let mut buf = BytesMut::with_capacity(Self::DEFAULT_CAPACITY);
        buf.put_bytes(0, HEADER);
        Self { buf }
    }

    /// Returns the length of the body written so far.
    pub fn len(&self) -> usize {
        self.buf.len() - HEADER
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn add_byte(&mut self, byte: u8) -> &mut Self {
        self.buf.put_u8(byte);
        self
    }

    /// Write single byte `char`.
    ///
    /// # Panics
    ///
    /// Panics if `ch` is not ascii.
    pub fn add_char(&mut self, ch: char) -> &mut Self {
        assert!(ch.is_ascii(), "protocol char must be ascii: {ch:?}");
        self.buf.put_u8(ch as u8);
        self
    }

    pub fn add_int16(&mut self, value: i16) -> &mut Self {
        self.buf.put_i16(value);
        self
    }

    pub fn add_int32(&mut self, value: i32) -> &mut Self {
        self.buf.put_i32(value);
        self
    }

    pub fn add_cstring(&mut self, string: &str) -> &mut Self {
        self.buf.put_nul_string(string);
        self
    }

    /// Write `Int32` length prefixed bytes, [`None`] is written as `-1`.
    pub fn add_pbytes(&mut self, bytes: Option<&[u8]>) -> &mut Self {
        match bytes {
            Some(bytes) => {
                self.buf.put_i32(bytes.len().to_i32());
                self.buf.put_slice(bytes);
            }
            None => self.buf.put_i32(-1),
        }
        self
    }

    /// Write `Int32` length prefixed string, [`None`] is written as `-1`.
    pub fn add_pstring(&mut self, string: Option<&str>) -> &mut Self {
        self.add_pbytes(string.map(str::as_bytes))
    }

    /// Frame the written body as a message of type `msgtype`, and reset the writer.
    ///
    /// The length counts itself and the body, but not the message type.
    pub fn flush(&mut self, msgtype: u8) -> Bytes {
        let len = (self.buf.len() - 1).to_i32();
        let mut header = &mut self.buf[..HEADER];
        header.put_u8(msgtype);
        header.put_i32(len);
        self.split()
    }

    /// Returns the written body without any header, and reset the writer.
    ///
    /// Used for the few bytes sent outside of regular message, like the ssl response.
    pub fn flush_untagged(&mut self) -> Bytes {
        let mut message = self.split();
        message.advance(HEADER);
        message
    }

    fn split(&mut self) -> Bytes {
        let message = self.buf.split().freeze();
        self.buf.put_bytes(0, HEADER);
        message
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn reader(bytes: &'static [u8]) -> BufferReader {
        BufferReader::new(Bytes::from_static(bytes))
    }

    #[test]
    fn read_integers() {
        let mut r = reader(b"\x01\xff\xfe\x00\x01\x00");
        assert_eq!(r.read_byte(), Some(1));
        assert_eq!(r.read_int16(), Some(-2));
        assert_eq!(r.read_int32(), None);
        assert_eq!(r.remaining(), 3);
        assert_eq!(r.read_int16(), Some(1));
        assert_eq!(r.read_char(), Some('\0'));
        assert_eq!(r.read_byte(), None);
    }

    #[test]
    fn read_cstring() {
        let mut r = reader(b"\0foo\0bar");
        assert_eq!(r.read_cstring().unwrap(), "");
        assert_eq!(r.read_cstring().unwrap(), "foo");
        assert!(r.read_cstring().is_none());
        assert_eq!(&r.rest()[..], b"bar");
    }

    #[test]
    fn read_pstring() {
        let mut r = reader(b"\xff\xff\xff\xff\0\0\0\0\0\0\0\x03abc\0\0\0\x09short");
        assert_eq!(r.read_pstring(), Some(None));
        assert_eq!(r.read_pstring().unwrap().unwrap(), "");
        assert_eq!(r.read_pstring().unwrap().unwrap(), "abc");
        assert_eq!(r.read_pstring(), None);
        // unavailable read does not consume the length
        assert_eq!(r.remaining(), 9);
    }

    #[test]
    fn read_lists() {
        let mut r = reader(b"\0\x01\0\x02\0\0\0\x19\0\0\0\x01x\xff\xff\xff\xff");
        assert_eq!(r.read_int16_list(2), Some(vec![1, 2]));
        assert_eq!(r.read_int32_list(1), Some(vec![25]));
        let list = r.read_pstring_list(2).unwrap();
        assert_eq!(list[0].as_deref(), Some("x"));
        assert_eq!(list[1], None);
        assert_eq!(r.read_int16_list(0), Some(vec![]));
        assert_eq!(r.read_int16_list(1), None);
    }

    #[test]
    fn partial_list_is_unavailable() {
        let mut r = reader(b"\0\x01\0");
        assert_eq!(r.read_int16_list(2), None);
        assert_eq!(r.remaining(), 3);
    }

    #[test]
    fn write_and_flush() {
        let mut w = BufferWriter::new();
        w.add_int32(3);
        assert_eq!(&w.flush(b'R')[..], b"R\0\0\0\x08\0\0\0\x03");
        assert!(w.is_empty());

        w.add_cstring("SELECT rows");
        assert_eq!(&w.flush(b'C')[..], b"C\0\0\0\x10SELECT rows\0");

        assert_eq!(&w.flush(b'1')[..], b"1\0\0\0\x04");
    }

    #[test]
    fn write_pstring() {
        let mut w = BufferWriter::new();
        w.add_pstring(None).add_pstring(Some("")).add_pstring(Some("hi"));
        w.add_char('I').add_byte(0).add_int16(-1);
        assert_eq!(
            &w.flush_untagged()[..],
            b"\xff\xff\xff\xff\0\0\0\0\0\0\0\x02hiI\0\xff\xff"
        );
    }

    #[test]
    fn written_fields_read_back() {
        let mut w = BufferWriter::new();
        w.add_cstring("stmt").add_int16(2).add_int32(-7).add_pstring(Some("value"));
        let mut r = BufferReader::new(w.flush_untagged());
        assert_eq!(r.read_cstring().unwrap(), "stmt");
        assert_eq!(r.read_int16(), Some(2));
        assert_eq!(r.read_int32(), Some(-7));
        assert_eq!(r.read_pstring().unwrap().unwrap(), "value");
        assert_eq!(r.remaining(), 0);
    }
}
