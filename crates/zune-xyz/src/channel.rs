/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */
//! Byte channels the decoder reads from and the encoder writes to
//!
//! Reading and writing are two independent capabilities, a source
//! only needs to implement [`XyzReader`] and a sink only [`XyzWriter`].
//!
//! Every [`ZByteReaderTrait`] is a source and every [`ZByteWriterTrait`]
//! is a sink, so [`ZCursor`](zune_core::bytestream::ZCursor), files wrapped in a
//! `BufReader`/`BufWriter`, `Vec<u8>` and `&mut [u8]` work out of the box.
//! [`XyzChannel`] adds a detached (null) state on top of any channel, and
//! [`ReadFn`] and [`WriteFn`] turn closures into custom transports.
//!
//! Channels are not assumed to be thread safe, a channel should only be used
//! by one decoder or encoder at a time.
use zune_core::bytestream::{ZByteIoError, ZByteReaderTrait, ZByteWriterTrait};
use zune_core::log::warn;

use crate::errors::XyzErrors;

/// The input trait the XYZ decoder reads from
pub trait XyzReader {
    /// Read bytes to fill `buf`
    ///
    /// # Returns
    /// - `Ok(usize)`: `buf` was filled completely, the value is `buf.len()`
    /// - `Err(XyzErrors::EndOfStream(n))`: the source was exhausted after
    ///    `n` bytes, those bytes are stored at the start of `buf`
    /// - `Err(XyzErrors::ReadFailed)`: any other failure
    ///
    /// An implementation must never return fewer bytes than requested
    /// without signaling why.
    fn xyz_read(&mut self, buf: &mut [u8]) -> Result<usize, XyzErrors>;

    /// Whether the channel is attached to an underlying source
    ///
    /// The decoder checks this before any I/O and reports
    /// [`XyzErrors::BadHandle`] for a detached channel
    fn is_attached(&self) -> bool {
        true
    }
}

/// The output trait the XYZ encoder writes to
pub trait XyzWriter {
    /// Write all of `buf` to the sink
    ///
    /// # Returns
    /// - `Ok(usize)`: Number of bytes written, which should be `buf.len()`
    /// - `Err(XyzErrors::WriteFailed)`: The sink failed or accepted fewer bytes
    fn xyz_write(&mut self, buf: &[u8]) -> Result<usize, XyzErrors>;

    /// Ensure bytes are written to the underlying sink
    fn xyz_flush(&mut self) -> Result<(), XyzErrors> {
        Ok(())
    }

    /// Whether the channel is attached to an underlying sink
    fn is_attached(&self) -> bool {
        true
    }
}

impl<T: ZByteReaderTrait> XyzReader for T {
    fn xyz_read(&mut self, buf: &mut [u8]) -> Result<usize, XyzErrors> {
        match ZByteReaderTrait::read_exact_bytes(self, buf) {
            Ok(()) => Ok(buf.len()),
            Err(ZByteIoError::NotEnoughBytes(_, _)) => {
                // the position is left where the read started, take what is left
                let mut rest = Vec::new();
                let found = self.read_remaining(&mut rest).map_err(read_failed)?;
                let read = found.min(rest.len()).min(buf.len());

                buf[..read].copy_from_slice(&rest[..read]);
                Err(XyzErrors::EndOfStream(read))
            }
            Err(e) => Err(read_failed(e))
        }
    }
}

impl<T: ZByteWriterTrait> XyzWriter for T {
    fn xyz_write(&mut self, buf: &[u8]) -> Result<usize, XyzErrors> {
        self.write_all_bytes(buf).map_err(write_failed)?;
        Ok(buf.len())
    }

    fn xyz_flush(&mut self) -> Result<(), XyzErrors> {
        ZByteWriterTrait::flush_bytes(self).map_err(write_failed)
    }
}

fn read_failed(err: ZByteIoError) -> XyzErrors {
    warn!("Read failed: {:?}", err);
    XyzErrors::ReadFailed
}

fn write_failed(err: ZByteIoError) -> XyzErrors {
    warn!("Write failed: {:?}", err);
    XyzErrors::WriteFailed
}

/// A channel that may be detached from its source or sink
///
/// A channel created with [`detached`](XyzChannel::detached) has no
/// underlying handle and is rejected by the decoder and encoder with
/// [`XyzErrors::BadHandle`] before any I/O happens.
///
/// # Example
/// ```
/// use zune_core::bytestream::ZCursor;
/// use zune_xyz::{XyzChannel, XyzErrors};
///
/// let source: XyzChannel<ZCursor<Vec<u8>>> = XyzChannel::detached();
/// assert_eq!(zune_xyz::decode(source).unwrap_err(), XyzErrors::BadHandle);
/// ```
pub struct XyzChannel<T> {
    inner: Option<T>
}

impl<T> XyzChannel<T> {
    pub const fn new(inner: T) -> XyzChannel<T> {
        XyzChannel { inner: Some(inner) }
    }

    /// A channel without an underlying handle
    pub const fn detached() -> XyzChannel<T> {
        XyzChannel { inner: None }
    }

    pub fn into_inner(self) -> Option<T> {
        self.inner
    }
}

impl<T> From<Option<T>> for XyzChannel<T> {
    fn from(inner: Option<T>) -> Self {
        XyzChannel { inner }
    }
}

impl<T: XyzReader> XyzReader for XyzChannel<T> {
    fn xyz_read(&mut self, buf: &mut [u8]) -> Result<usize, XyzErrors> {
        self.inner
            .as_mut()
            .ok_or(XyzErrors::BadHandle)?
            .xyz_read(buf)
    }

    fn is_attached(&self) -> bool {
        self.inner.is_some()
    }
}

impl<T: XyzWriter> XyzWriter for XyzChannel<T> {
    fn xyz_write(&mut self, buf: &[u8]) -> Result<usize, XyzErrors> {
        self.inner
            .as_mut()
            .ok_or(XyzErrors::BadHandle)?
            .xyz_write(buf)
    }

    fn xyz_flush(&mut self) -> Result<(), XyzErrors> {
        self.inner
            .as_mut()
            .ok_or(XyzErrors::BadHandle)?
            .xyz_flush()
    }

    fn is_attached(&self) -> bool {
        self.inner.is_some()
    }
}

/// A source backed by a closure
///
/// The closure follows the [`XyzReader::xyz_read`] contract.
///
/// # Example
/// ```
/// use zune_xyz::{ReadFn, XyzErrors, XyzReader};
///
/// // a transport that always fails
/// let mut source = ReadFn(|_: &mut [u8]| Err(XyzErrors::ReadFailed));
/// assert_eq!(source.xyz_read(&mut [0; 4]), Err(XyzErrors::ReadFailed));
/// ```
pub struct ReadFn<F>(pub F)
where
    F: FnMut(&mut [u8]) -> Result<usize, XyzErrors>;

impl<F> XyzReader for ReadFn<F>
where
    F: FnMut(&mut [u8]) -> Result<usize, XyzErrors>
{
    fn xyz_read(&mut self, buf: &mut [u8]) -> Result<usize, XyzErrors> {
        (self.0)(buf)
    }
}

/// A sink backed by a closure
///
/// The closure follows the [`XyzWriter::xyz_write`] contract.
pub struct WriteFn<F>(pub F)
where
    F: FnMut(&[u8]) -> Result<usize, XyzErrors>;

impl<F> XyzWriter for WriteFn<F>
where
    F: FnMut(&[u8]) -> Result<usize, XyzErrors>
{
    fn xyz_write(&mut self, buf: &[u8]) -> Result<usize, XyzErrors> {
        (self.0)(buf)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufReader, Cursor};

    use zune_core::bytestream::ZCursor;

    use crate::{XyzChannel, XyzErrors, XyzReader, XyzWriter};

    #[test]
    fn cursor_reports_end_of_stream_on_short_read() {
        let mut cursor = ZCursor::new([1_u8, 2, 3, 4, 5]);
        let mut buf = [0; 4];

        assert_eq!(cursor.xyz_read(&mut buf), Ok(4));
        assert_eq!(buf, [1, 2, 3, 4]);

        assert_eq!(cursor.xyz_read(&mut buf), Err(XyzErrors::EndOfStream(1)));
        assert_eq!(buf[0], 5);

        assert_eq!(cursor.xyz_read(&mut buf), Err(XyzErrors::EndOfStream(0)));
    }

    #[test]
    fn exact_read_does_not_signal_end() {
        let mut cursor = ZCursor::new(vec![9_u8; 8]);
        let mut buf = [0; 8];

        assert_eq!(cursor.xyz_read(&mut buf), Ok(8));
        assert_eq!(cursor.xyz_read(&mut buf), Err(XyzErrors::EndOfStream(0)));
    }

    #[test]
    fn buffered_reader_keeps_partial_bytes() {
        let mut source = BufReader::new(Cursor::new(vec![1_u8, 2, 3]));
        let mut buf = [0; 5];

        assert_eq!(source.xyz_read(&mut buf), Err(XyzErrors::EndOfStream(3)));
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    #[test]
    fn channel_wraps_sinks() {
        let mut sink = XyzChannel::new(Vec::<u8>::new());

        assert_eq!(sink.xyz_write(&[4, 5]), Ok(2));
        assert_eq!(sink.xyz_flush(), Ok(()));
        assert_eq!(sink.into_inner(), Some(vec![4, 5]));
    }

    #[test]
    fn detached_channel_is_a_bad_handle() {
        let mut source = XyzChannel::<ZCursor<Vec<u8>>>::detached();
        assert!(!XyzReader::is_attached(&source));
        assert_eq!(source.xyz_read(&mut [0; 1]), Err(XyzErrors::BadHandle));

        let mut sink = XyzChannel::<Vec<u8>>::from(None);
        assert!(!XyzWriter::is_attached(&sink));
        assert_eq!(sink.xyz_write(&[0]), Err(XyzErrors::BadHandle));
        assert_eq!(sink.xyz_flush(), Err(XyzErrors::BadHandle));
        assert_eq!(sink.into_inner(), None);
    }

    #[test]
    fn full_sink_fails_write() {
        let mut storage = [0_u8; 3];
        let mut sink = &mut storage[..];

        assert_eq!(sink.xyz_write(&[1, 2, 3, 4]), Err(XyzErrors::WriteFailed));
    }
}
