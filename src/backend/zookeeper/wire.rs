//! Minimal jute framing for the ZooKeeper client protocol.
//!
//! Every frame is a 4-byte big-endian length prefix followed by the payload.
//! Integers are big-endian, strings and buffers are length-prefixed, and a
//! negative buffer length encodes null.

use crate::error::BackendError;

pub(super) const OP_CREATE: i32 = 1;
pub(super) const OP_GET_DATA: i32 = 4;
pub(super) const OP_SET_DATA: i32 = 5;
pub(super) const OP_GET_CHILDREN: i32 = 8;

/// `world:anyone` with all permission bits.
const ACL_PERMS_ALL: i32 = 31;

#[derive(Default)]
pub(super) struct FrameWriter {
    buf: Vec<u8>,
}

impl FrameWriter {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn put_i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub(super) fn put_i64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub(super) fn put_bool(&mut self, v: bool) -> &mut Self {
        self.buf.push(u8::from(v));
        self
    }

    pub(super) fn put_buffer(&mut self, v: &[u8]) -> &mut Self {
        self.put_i32(v.len() as i32);
        self.buf.extend_from_slice(v);
        self
    }

    pub(super) fn put_string(&mut self, v: &str) -> &mut Self {
        self.put_buffer(v.as_bytes())
    }

    /// A single-entry ACL vector granting everything to `world:anyone`.
    pub(super) fn put_open_acl(&mut self) -> &mut Self {
        self.put_i32(1);
        self.put_i32(ACL_PERMS_ALL);
        self.put_string("world");
        self.put_string("anyone")
    }

    /// Prepends the length prefix and returns the wire bytes.
    pub(super) fn frame(self) -> Vec<u8> {
        let mut framed = Vec::with_capacity(4 + self.buf.len());
        framed.extend_from_slice(&(self.buf.len() as i32).to_be_bytes());
        framed.extend_from_slice(&self.buf);
        framed
    }
}

pub(super) struct FrameReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    pub(super) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], BackendError> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.buf.len());
        match end {
            Some(end) => {
                let slice = &self.buf[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(BackendError::ZkIo {
                source: std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "truncated ZooKeeper frame",
                ),
            }),
        }
    }

    pub(super) fn get_i32(&mut self) -> Result<i32, BackendError> {
        let bytes = self.take(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(super) fn get_i64(&mut self) -> Result<i64, BackendError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(i64::from_be_bytes(raw))
    }

    pub(super) fn get_buffer(&mut self) -> Result<Option<&'a [u8]>, BackendError> {
        let len = self.get_i32()?;
        if len < 0 {
            return Ok(None);
        }
        Ok(Some(self.take(len as usize)?))
    }

    pub(super) fn get_string(&mut self) -> Result<String, BackendError> {
        let bytes = self.get_buffer()?.unwrap_or_default();
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameReader, FrameWriter};

    #[test]
    fn frame_round_trip() -> Result<(), String> {
        let mut writer = FrameWriter::new();
        writer.put_i32(7).put_i64(-1).put_string("/key").put_bool(false);
        let framed = writer.frame();

        let len = i32::from_be_bytes([framed[0], framed[1], framed[2], framed[3]]) as usize;
        if len != framed.len() - 4 {
            return Err(format!("Bad length prefix {}", len));
        }
        let mut reader = FrameReader::new(&framed[4..]);
        if reader.get_i32().map_err(|err| err.to_string())? != 7 {
            return Err("i32 mismatch".to_owned());
        }
        if reader.get_i64().map_err(|err| err.to_string())? != -1 {
            return Err("i64 mismatch".to_owned());
        }
        if reader.get_string().map_err(|err| err.to_string())? != "/key" {
            return Err("string mismatch".to_owned());
        }
        Ok(())
    }

    #[test]
    fn truncated_frame_is_an_error() -> Result<(), String> {
        let mut reader = FrameReader::new(&[0, 0]);
        if reader.get_i32().is_ok() {
            return Err("Expected a truncation error".to_owned());
        }
        Ok(())
    }
}
