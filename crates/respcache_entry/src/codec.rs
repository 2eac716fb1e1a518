//! Binary record format for persisting entries.
//!
//! Layout, all integers big-endian:
//!
//! ```text
//! "RCE1" | status u16 | stored_at u64 | max_age u64
//! etag: u8 flag [u32 len, utf8] | last_modified: u8 flag [u32 len, utf8]
//! header count u32 | (u32 len, name, u32 len, value)*
//! body: u32 len, bytes
//! ```
//!
//! Every length and the header count are `u32`, so a single field (the body
//! included) is limited to 4 GiB - 1 bytes. Larger entries fail to encode
//! with [`EncodeError::TooLarge`] instead of writing a wrapped prefix.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use http::StatusCode;
use tracing::warn;

use crate::{
    entry::CacheEntry,
    error::{DecodeError, EncodeError},
    headers::Headers,
};

const MAGIC: &[u8; 4] = b"RCE1";

impl CacheEntry {
    /// Encode the entry as a self-contained record.
    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        let mut buf = BytesMut::with_capacity(64 + self.body.len());
        buf.put_slice(MAGIC);
        buf.put_u16(self.status.as_u16());
        buf.put_u64(self.stored_at);
        buf.put_u64(self.max_age);
        put_opt_str(&mut buf, self.etag.as_deref(), "etag")?;
        put_opt_str(&mut buf, self.last_modified.as_deref(), "last_modified")?;

        buf.put_u32(length_prefix(self.headers.len(), "header count")?);
        for (name, value) in self.headers.iter() {
            put_bytes(&mut buf, name.as_bytes(), "header name")?;
            put_bytes(&mut buf, value.as_bytes(), "header value")?;
        }

        put_bytes(&mut buf, &self.body, "body")?;
        Ok(buf.freeze())
    }

    /// Decode a record produced by [`CacheEntry::encode`].
    ///
    /// Any structural problem fails the whole record.
    pub fn decode(record: &[u8]) -> Result<Self, DecodeError> {
        decode_record(record).inspect_err(|err| {
            warn!(target: "respcache::codec", error = %err, len = record.len(), "Rejected cache record");
        })
    }
}

fn decode_record(mut buf: &[u8]) -> Result<CacheEntry, DecodeError> {
    ensure(buf, MAGIC.len(), "magic")?;
    if !buf.starts_with(MAGIC) {
        return Err(DecodeError::BadMagic);
    }
    buf.advance(MAGIC.len());

    let raw_status = get_u16(&mut buf, "status")?;
    let status = match StatusCode::from_u16(raw_status) {
        Ok(status) => status,
        Err(_) => return Err(DecodeError::InvalidStatus(raw_status)),
    };
    let stored_at = get_u64(&mut buf, "stored_at")?;
    let max_age = get_u64(&mut buf, "max_age")?;
    let etag = get_opt_string(&mut buf, "etag")?;
    let last_modified = get_opt_string(&mut buf, "last_modified")?;

    let count = get_u32(&mut buf, "header count")?;
    let mut headers = Headers::new();
    for _ in 0..count {
        let name = get_string(&mut buf, "header name")?;
        let value = get_string(&mut buf, "header value")?;
        headers.append(name, value);
    }

    let body = get_bytes(&mut buf, "body")?.to_vec();
    if buf.has_remaining() {
        return Err(DecodeError::TrailingBytes(buf.remaining()));
    }

    Ok(CacheEntry {
        status,
        headers,
        body,
        stored_at,
        max_age,
        etag,
        last_modified,
    })
}

fn length_prefix(len: usize, field: &'static str) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::TooLarge { field, len })
}

fn put_bytes(buf: &mut BytesMut, bytes: &[u8], field: &'static str) -> Result<(), EncodeError> {
    buf.put_u32(length_prefix(bytes.len(), field)?);
    buf.put_slice(bytes);
    Ok(())
}

fn put_opt_str(
    buf: &mut BytesMut,
    value: Option<&str>,
    field: &'static str,
) -> Result<(), EncodeError> {
    match value {
        Some(value) => {
            buf.put_u8(1);
            put_bytes(buf, value.as_bytes(), field)?;
        }
        None => buf.put_u8(0),
    }
    Ok(())
}

fn ensure(buf: &[u8], len: usize, field: &'static str) -> Result<(), DecodeError> {
    if buf.len() < len {
        return Err(DecodeError::Truncated { field });
    }
    Ok(())
}

fn get_u8(buf: &mut &[u8], field: &'static str) -> Result<u8, DecodeError> {
    ensure(buf, 1, field)?;
    Ok(buf.get_u8())
}

fn get_u16(buf: &mut &[u8], field: &'static str) -> Result<u16, DecodeError> {
    ensure(buf, 2, field)?;
    Ok(buf.get_u16())
}

fn get_u32(buf: &mut &[u8], field: &'static str) -> Result<u32, DecodeError> {
    ensure(buf, 4, field)?;
    Ok(buf.get_u32())
}

fn get_u64(buf: &mut &[u8], field: &'static str) -> Result<u64, DecodeError> {
    ensure(buf, 8, field)?;
    Ok(buf.get_u64())
}

fn get_bytes<'a>(buf: &mut &'a [u8], field: &'static str) -> Result<&'a [u8], DecodeError> {
    let len = get_u32(buf, field)? as usize;
    ensure(buf, len, field)?;
    let rest: &'a [u8] = *buf;
    let (head, tail) = rest.split_at(len);
    *buf = tail;
    Ok(head)
}

fn get_string(buf: &mut &[u8], field: &'static str) -> Result<String, DecodeError> {
    let bytes = get_bytes(buf, field)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { field })
}

fn get_opt_string(buf: &mut &[u8], field: &'static str) -> Result<Option<String>, DecodeError> {
    match get_u8(buf, field)? {
        0 => Ok(None),
        1 => get_string(buf, field).map(Some),
        value => Err(DecodeError::InvalidFlag { field, value }),
    }
}
