//! Pull-based byte sources for the decoder.
//!
//! Three strategies share one contract: a fixed in-memory view, a plain
//! reader, and a seekable reader that buffers ahead and gives unconsumed
//! bytes back to the stream when it is done.

use std::io::{self, Read, Seek, SeekFrom};

use crate::BufferError;

/// Read-ahead granularity for [`SeekSource`].
const CHUNK_SIZE: usize = 256;

/// A pull-based byte source.
///
/// `pull` yields at most `len` bytes. The returned slice is only valid
/// until the next call. An empty slice signals end of input; a short slice
/// means the input ended mid-request.
pub trait ByteSource {
    fn pull(&mut self, len: usize) -> Result<&[u8], BufferError>;

    /// Number of bytes delivered to the caller so far.
    fn total_read(&self) -> usize;
}

/// Byte source over a fixed in-memory slice.
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    fn pull(&mut self, len: usize) -> Result<&[u8], BufferError> {
        let n = len.min(self.data.len() - self.pos);
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn total_read(&self) -> usize {
        self.pos
    }
}

/// Reads `want` bytes into `buf`, stopping early only at end of input.
fn fill_from<R: Read>(inner: &mut R, buf: &mut Vec<u8>, want: usize) -> Result<(), BufferError> {
    buf.resize(want, 0);
    let mut filled = 0;
    let result = loop {
        if filled == want {
            break Ok(());
        }
        match inner.read(&mut buf[filled..]) {
            Ok(0) => break Ok(()),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => break Err(BufferError::Io(e)),
        }
    };
    buf.truncate(filled);
    result
}

/// Byte source over a plain reader. Each pull fetches a fresh chunk of
/// exactly the requested size (short only at end of input).
pub struct StreamSource<R> {
    inner: R,
    chunk: Vec<u8>,
    total_read: usize,
}

impl<R: Read> StreamSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            chunk: Vec::new(),
            total_read: 0,
        }
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    fn pull(&mut self, len: usize) -> Result<&[u8], BufferError> {
        fill_from(&mut self.inner, &mut self.chunk, len)?;
        self.total_read += self.chunk.len();
        Ok(&self.chunk)
    }

    fn total_read(&self) -> usize {
        self.total_read
    }
}

/// Byte source over a seekable reader.
///
/// Fetches at least [`CHUNK_SIZE`] bytes at a time. Requests spanning the
/// buffered view copy the leftover tail plus a fresh fetch into a scratch
/// buffer that lives until the next pull. On [`rewind`](Self::rewind) (or
/// drop) the stream is seeked back past whatever was buffered but never
/// delivered, so trailing bytes stay available to the caller.
pub struct SeekSource<R: Read + Seek> {
    inner: R,
    view: Vec<u8>,
    /// Consumed prefix of `view`.
    pos: usize,
    scratch: Vec<u8>,
    total_read: usize,
    rewound: bool,
}

impl<R: Read + Seek> SeekSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            view: Vec::new(),
            pos: 0,
            scratch: Vec::new(),
            total_read: 0,
            rewound: false,
        }
    }

    /// Seeks the underlying stream back past the unconsumed buffered bytes.
    ///
    /// Idempotent. Called automatically on drop, where failures are
    /// swallowed; call explicitly to observe them.
    pub fn rewind(&mut self) -> Result<(), BufferError> {
        if !self.rewound && self.view.len() > self.pos {
            let back = (self.view.len() - self.pos) as i64;
            self.inner.seek(SeekFrom::Current(-back))?;
        }
        self.rewound = true;
        Ok(())
    }
}

impl<R: Read + Seek> ByteSource for SeekSource<R> {
    fn pull(&mut self, len: usize) -> Result<&[u8], BufferError> {
        // Previous spanning output is no longer needed.
        self.scratch = Vec::new();

        let remaining = self.view.len() - self.pos;
        if len <= remaining {
            let out = &self.view[self.pos..self.pos + len];
            self.pos += len;
            self.total_read += len;
            return Ok(out);
        }

        let mut scratch = Vec::with_capacity(len);
        scratch.extend_from_slice(&self.view[self.pos..]);
        self.total_read += remaining;
        self.pos = 0;
        fill_from(&mut self.inner, &mut self.view, CHUNK_SIZE.max(len - remaining))?;
        let take = (len - remaining).min(self.view.len());
        scratch.extend_from_slice(&self.view[..take]);
        self.pos = take;
        self.total_read += take;
        self.scratch = scratch;
        Ok(&self.scratch)
    }

    fn total_read(&self) -> usize {
        self.total_read
    }
}

impl<R: Read + Seek> Drop for SeekSource<R> {
    fn drop(&mut self) {
        let _ = self.rewind();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_slice_source_reads_and_counts() {
        let data = [1u8, 2, 3, 4, 5];
        let mut source = SliceSource::new(&data);
        assert_eq!(source.pull(2).unwrap(), &[1, 2]);
        assert_eq!(source.pull(2).unwrap(), &[3, 4]);
        assert_eq!(source.total_read(), 4);
        // Short read at the end, then empty.
        assert_eq!(source.pull(5).unwrap(), &[5]);
        assert!(source.pull(1).unwrap().is_empty());
        assert_eq!(source.total_read(), 5);
    }

    #[test]
    fn test_stream_source_exact_and_short() {
        let mut source = StreamSource::new(Cursor::new(vec![9u8, 8, 7]));
        assert_eq!(source.pull(2).unwrap(), &[9, 8]);
        assert_eq!(source.pull(4).unwrap(), &[7]);
        assert!(source.pull(1).unwrap().is_empty());
        assert_eq!(source.total_read(), 3);
    }

    #[test]
    fn test_seek_source_serves_from_buffer() {
        let data: Vec<u8> = (0..=255).collect();
        let mut source = SeekSource::new(Cursor::new(data));
        assert_eq!(source.pull(4).unwrap(), &[0, 1, 2, 3]);
        assert_eq!(source.pull(4).unwrap(), &[4, 5, 6, 7]);
        assert_eq!(source.total_read(), 8);
    }

    #[test]
    fn test_seek_source_spanning_read() {
        // 300 bytes: the first fetch buffers 256, so a read of 260 spans
        // the view boundary and goes through the scratch buffer.
        let data: Vec<u8> = (0..300u32).map(|i| (i % 251) as u8).collect();
        let mut source = SeekSource::new(Cursor::new(data.clone()));
        assert_eq!(source.pull(10).unwrap(), &data[..10]);
        assert_eq!(source.pull(260).unwrap(), &data[10..270]);
        assert_eq!(source.total_read(), 270);
    }

    #[test]
    fn test_seek_source_rewinds_unconsumed_tail() {
        let data: Vec<u8> = (0..100).collect();
        let mut cursor = Cursor::new(data);
        {
            let mut source = SeekSource::new(&mut cursor);
            // Buffers 100 bytes, delivers 10.
            assert_eq!(source.pull(10).unwrap().len(), 10);
            source.rewind().unwrap();
        }
        assert_eq!(cursor.position(), 10);
    }

    #[test]
    fn test_seek_source_rewinds_on_drop() {
        let data: Vec<u8> = (0..100).collect();
        let mut cursor = Cursor::new(data);
        {
            let mut source = SeekSource::new(&mut cursor);
            assert_eq!(source.pull(3).unwrap().len(), 3);
        }
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn test_seek_source_end_of_input() {
        let mut source = SeekSource::new(Cursor::new(vec![1u8]));
        assert_eq!(source.pull(1).unwrap(), &[1]);
        assert!(source.pull(1).unwrap().is_empty());
    }
}
