//! Incremental message framing.
//!
//! Socket reads does not respect message boundary, a read may contains half a message,
//! or several messages at once. [`Framer`] accumulates chunks and extracts complete
//! messages as soon as they are available.
//!
//! ```text
//! ┏━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━━━━━━┳━━━━━━━━━┓
//! ┃ Ty, optional ┃       Length      ┃ Payload ┃
//! ┣━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━━━━━━╋━━━━━━━━━┫
//! ┃      u8      ┃        u32        ┃  [u8]   ┃
//! ┗━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━━━━━━┻━━━━━━━━━┛
//! ```
//!
//! For historical reasons, the startup message has no message type, thus the
//! framer start with zero header size, and switched to one after the handshake.
use bytes::{Buf, Bytes, BytesMut};

use crate::{common::verbose, ext::FmtExt};

/// A complete message extracted by [`Framer::read`].
pub struct Message {
    /// Message type, [`None`] for untagged message.
    pub tag: Option<u8>,
    /// Message body, excluding type and length.
    pub payload: Bytes,
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("tag", &self.tag.map(char::from))
            .field("payload", &self.payload.lossy())
            .finish()
    }
}

/// Growable byte storage with a logical length and a read cursor.
///
/// `store.len()` is the capacity, bytes in `cursor..len` are buffered but not yet read.
///
/// Extracted payloads are slices of `store`, so they are never copied.
#[derive(Debug, Default)]
pub struct Arena {
    store: Bytes,
    len: usize,
    cursor: usize,
}

impl Arena {
    /// Returns the capacity of the backing store.
    pub fn capacity(&self) -> usize {
        self.store.len()
    }

    /// Returns the number of buffered bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.len - self.cursor
    }

    fn is_exhausted(&self) -> bool {
        self.cursor == self.len
    }

    /// Use `chunk` as the backing store, discarding everything else.
    fn replace(&mut self, chunk: Bytes) {
        self.len = chunk.len();
        self.cursor = 0;
        self.store = chunk;
    }

    /// Copy `chunk` after the buffered bytes, doubling capacity until it fits.
    fn append(&mut self, chunk: &[u8]) {
        let new_len = self.len + chunk.len();

        let mut store = if new_len > self.capacity() {
            let mut capacity = self.capacity() * 2;
            while new_len >= capacity {
                capacity *= 2;
            }

            verbose!(from = self.capacity(), to = capacity, "arena grow");

            let mut store = BytesMut::zeroed(capacity);
            store[..self.len].copy_from_slice(&self.store[..self.len]);
            store
        } else {
            // reclaim the storage when no payload is still referencing it
            match std::mem::take(&mut self.store).try_into_mut() {
                Ok(store) => store,
                Err(shared) => BytesMut::from(&shared[..]),
            }
        };

        store[self.len..new_len].copy_from_slice(chunk);
        self.store = store.freeze();
        self.len = new_len;
    }
}

/// Incremental message framer.
///
/// Call [`read`][Framer::read] repeatedly after each [`add_chunk`][Framer::add_chunk]
/// until it returns [`None`], since a chunk can contains several messages.
#[derive(Debug)]
pub struct Framer {
    arena: Arena,
    header_size: usize,
    length_padding: i32,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Framer {
    /// Create new framer.
    ///
    /// `header_size` is the size of message type before the length, `length_padding`
    /// is added to every decoded length.
    ///
    /// # Panics
    ///
    /// Panics if `header_size` is larger than 1.
    pub fn new(header_size: usize, length_padding: i32) -> Self {
        assert_header_size(header_size);
        Self { arena: Arena::default(), header_size, length_padding }
    }

    pub fn header_size(&self) -> usize {
        self.header_size
    }

    /// Switch header size.
    ///
    /// # Panics
    ///
    /// Panics if `header_size` is larger than 1.
    pub fn set_header_size(&mut self, header_size: usize) {
        assert_header_size(header_size);
        self.header_size = header_size;
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Buffer new chunk of bytes.
    pub fn add_chunk(&mut self, chunk: Bytes) {
        if self.arena.is_exhausted() {
            self.arena.replace(chunk);
        } else {
            self.arena.append(&chunk);
        }
    }

    /// Extract one complete message.
    ///
    /// Returns [`None`] if more bytes is required.
    pub fn read(&mut self) -> Option<Message> {
        let Framer { arena, header_size, length_padding } = self;
        let header_size = *header_size;

        if arena.remaining() < header_size + 4 {
            return None;
        }

        let start = arena.cursor;
        let tag = (header_size == 1).then(|| arena.store[start]);

        let len_offset = start + header_size;
        let mut len_field = &arena.store[len_offset..len_offset + 4];
        let len = i64::from(len_field.get_u32()) + i64::from(*length_padding);

        // the length counts itself
        let remaining = arena.len - len_offset;
        if len > remaining as i64 {
            return None;
        }

        let payload_len = (len - 4).max(0) as usize;
        let payload_start = len_offset + 4;
        let payload = arena.store.slice(payload_start..payload_start + payload_len);
        arena.cursor = payload_start + payload_len;

        Some(Message { tag, payload })
    }
}

fn assert_header_size(header_size: usize) {
    assert!(
        header_size <= 1,
        "pre-length header of more than 1 byte is not supported, found {header_size}"
    );
}

#[cfg(test)]
mod test {
    use bytes::BufMut;

    use super::*;
    use crate::codec::BufferWriter;

    fn messages() -> Vec<(u8, Bytes)> {
        let mut w = BufferWriter::new();
        let mut messages = vec![];
        for i in 0..40u8 {
            let tag = b'A' + (i % 26);
            let mut payload = vec![];
            for j in 0..(i as usize * 7) % 53 {
                payload.push((i as usize * 31 + j) as u8);
            }
            w.add_pbytes(Some(&payload));
            messages.push((tag, w.flush_untagged()));
        }
        messages
    }

    fn encode(messages: &[(u8, Bytes)]) -> Bytes {
        let mut w = BufferWriter::new();
        let mut buf = BytesMut::new();
        for (tag, payload) in messages {
            for &b in payload.iter() {
                w.add_byte(b);
            }
            buf.put(w.flush(*tag));
        }
        buf.freeze()
    }

    fn feed_pieces(stream: &Bytes, sizes: impl Iterator<Item = usize>) -> Vec<(u8, Bytes)> {
        let mut framer = Framer::new(1, 0);
        let mut out = vec![];
        let mut offset = 0;
        for size in sizes {
            if offset == stream.len() {
                break;
            }
            let end = (offset + size).min(stream.len());
            framer.add_chunk(stream.slice(offset..end));
            offset = end;
            while let Some(Message { tag, payload }) = framer.read() {
                out.push((tag.unwrap(), payload));
            }
        }
        assert_eq!(offset, stream.len());
        out
    }

    #[test]
    fn whole_stream() {
        let messages = messages();
        let stream = encode(&messages);
        assert_eq!(feed_pieces(&stream, std::iter::once(stream.len())), messages);
    }

    #[test]
    fn one_byte_at_a_time() {
        let messages = messages();
        let stream = encode(&messages);
        assert_eq!(feed_pieces(&stream, std::iter::repeat(1)), messages);
    }

    #[test]
    fn split_at_every_boundary() {
        let messages = messages();
        let stream = encode(&messages);
        for at in 1..stream.len() {
            let sizes = [at, stream.len() - at].into_iter();
            assert_eq!(feed_pieces(&stream, sizes), messages, "split at {at}");
        }
    }

    #[test]
    fn uneven_pieces() {
        let messages = messages();
        let stream = encode(&messages);
        let pattern = [3, 1, 7, 2, 11, 5, 13, 64, 4, 9, 128, 6];
        for skip in 0..pattern.len() {
            let sizes = pattern.iter().copied().cycle().skip(skip);
            assert_eq!(feed_pieces(&stream, sizes), messages, "pattern offset {skip}");
        }
    }

    #[test]
    fn grows_without_corruption() {
        let mut w = BufferWriter::new();
        let payload = (0..5000u32).map(|e| (e % 251) as u8).collect::<Vec<_>>();
        for &b in &payload {
            w.add_byte(b);
        }
        let stream = w.flush(b'D');

        let mut framer = Framer::new(1, 0);
        framer.add_chunk(stream.slice(..3));
        let initial = framer.arena().capacity();
        assert_eq!(initial, 3);

        let mut offset = 3;
        while offset < stream.len() {
            assert!(framer.read().is_none());
            let end = (offset + 17).min(stream.len());
            framer.add_chunk(stream.slice(offset..end));
            offset = end;
        }

        assert!(framer.arena().capacity() >= initial * 1024);
        let message = framer.read().unwrap();
        assert_eq!(message.tag, Some(b'D'));
        assert_eq!(&message.payload[..], &payload[..]);
        assert!(framer.read().is_none());
        assert_eq!(framer.arena().remaining(), 0);
    }

    #[test]
    fn exhausted_arena_is_replaced() {
        let mut framer = Framer::new(1, 0);
        let chunk = Bytes::from_static(b"Z\0\0\0\x05I");
        framer.add_chunk(chunk.clone());
        let message = framer.read().unwrap();
        assert_eq!(&message.payload[..], b"I");
        // payload is a slice of the given chunk
        assert_eq!(message.payload.as_ptr(), chunk[5..].as_ptr());

        let next = Bytes::from_static(b"S\0\0\0\x04");
        framer.add_chunk(next.clone());
        assert_eq!(framer.arena().capacity(), next.len());
        assert_eq!(framer.read().unwrap().tag, Some(b'S'));
    }

    #[test]
    fn untagged_messages() {
        let mut framer = Framer::new(0, 0);
        framer.add_chunk(Bytes::from_static(b"\0\0\0\x08\x04\xd2\x16\x2f\0\0"));
        let message = framer.read().unwrap();
        assert_eq!(message.tag, None);
        assert_eq!(&message.payload[..], b"\x04\xd2\x16\x2f");
        assert!(framer.read().is_none());
        assert_eq!(framer.arena().remaining(), 2);

        framer.set_header_size(1);
        framer.add_chunk(Bytes::from_static(b"\0\0\x04"));
        let message = framer.read().unwrap();
        assert_eq!(message.tag, Some(0));
        assert!(message.payload.is_empty());
    }

    #[test]
    fn length_padding() {
        let mut framer = Framer::new(1, 4);
        // length field excludes itself
        framer.add_chunk(Bytes::from_static(b"Q\0\0\0\x02hi"));
        assert_eq!(&framer.read().unwrap().payload[..], b"hi");
    }

    #[test]
    fn short_length_yields_empty_payload() {
        let mut framer = Framer::new(1, 0);
        framer.add_chunk(Bytes::from_static(b"H\0\0\0\0S\0\0\0\x04"));
        assert!(framer.read().unwrap().payload.is_empty());
        assert_eq!(framer.read().unwrap().tag, Some(b'S'));
    }

    #[test]
    #[should_panic]
    fn header_larger_than_one() {
        Framer::new(2, 0);
    }
}
