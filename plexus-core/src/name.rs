//! Kafka-protocol topic names.
//!
//! On the wire a Kafka string is a 16-bit big-endian length followed by
//! that many bytes, with no terminator. Strings received from the network
//! carry no NUL guarantee, so equality is always length plus content;
//! nothing in this module or its callers may rely on a terminator.

use std::fmt;

use bytes::{Buf, BufMut};

/// Maximum encodable name length; the wire length field is a signed
/// 16-bit integer.
pub const TOPIC_NAME_LEN_MAX: usize = i16::MAX as usize;

/// An owned topic name with its Kafka wire representation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TopicName(String);

impl TopicName {
    /// Creates a topic name from a UTF-8 string.
    ///
    /// # Panics
    ///
    /// Panics if the name exceeds [`TOPIC_NAME_LEN_MAX`] bytes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(
            name.len() <= TOPIC_NAME_LEN_MAX,
            "topic name exceeds wire length limit"
        );
        Self(name)
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the name is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the size of the wire encoding: the length field plus the
    /// name bytes.
    #[must_use]
    pub fn wire_size(&self) -> usize {
        2 + self.0.len()
    }

    /// Writes the wire encoding: 16-bit big-endian length, then the bytes.
    #[allow(clippy::cast_possible_truncation)] // Length bounded by TOPIC_NAME_LEN_MAX.
    #[allow(clippy::cast_possible_wrap)]
    pub fn write_wire(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.0.len() as i16);
        buf.put_slice(self.0.as_bytes());
    }

    /// Reads a wire-encoded name.
    ///
    /// Returns `None` if the buffer is too small, the length field is
    /// negative (a null string is not a topic name), or the bytes are not
    /// UTF-8.
    pub fn read_wire(buf: &mut impl Buf) -> Option<Self> {
        if buf.remaining() < 2 {
            return None;
        }
        let len = buf.get_i16();
        if len < 0 {
            return None;
        }
        #[allow(clippy::cast_sign_loss)] // Checked non-negative above.
        let len = len as usize;
        if buf.remaining() < len {
            return None;
        }
        let raw = buf.copy_to_bytes(len);
        let name = std::str::from_utf8(&raw).ok()?;
        Some(Self(name.to_owned()))
    }

    /// Compares this name against wire payload bytes (the bytes after the
    /// length field). Equality is length plus content; no terminator is
    /// assumed on either side.
    #[must_use]
    pub fn eq_wire(&self, payload: &[u8]) -> bool {
        self.0.as_bytes() == payload
    }
}

impl fmt::Debug for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "topic({:?})", self.0)
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TopicName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TopicName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;

    #[test]
    fn test_wire_roundtrip() {
        let name = TopicName::new("events");
        let mut buf = BytesMut::new();
        name.write_wire(&mut buf);

        assert_eq!(buf.len(), name.wire_size());
        assert_eq!(&buf[..2], &[0, 6]);

        let mut cursor = buf.freeze();
        let decoded = TopicName::read_wire(&mut cursor).unwrap();
        assert_eq!(decoded, name);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_read_wire_consumes_only_length() {
        // Trailing bytes after the string belong to the next field.
        let mut buf = BytesMut::new();
        TopicName::new("ab").write_wire(&mut buf);
        buf.extend_from_slice(b"junk");

        let mut cursor = buf.freeze();
        let decoded = TopicName::read_wire(&mut cursor).unwrap();
        assert_eq!(decoded.as_str(), "ab");
        assert_eq!(cursor.remaining(), 4);
    }

    #[test]
    fn test_read_wire_rejects_short_and_null() {
        let mut short: &[u8] = &[0];
        assert!(TopicName::read_wire(&mut short).is_none());

        // Negative length encodes a null string.
        let mut null: &[u8] = &[0xff, 0xff];
        assert!(TopicName::read_wire(&mut null).is_none());

        let mut truncated: &[u8] = &[0, 5, b'a', b'b'];
        assert!(TopicName::read_wire(&mut truncated).is_none());
    }

    #[test]
    fn test_eq_wire_is_length_plus_content() {
        let name = TopicName::new("topic");
        assert!(name.eq_wire(b"topic"));
        assert!(!name.eq_wire(b"topic\0"));
        assert!(!name.eq_wire(b"topi"));
        assert!(!name.eq_wire(b"topicX"));
    }

    #[test]
    fn test_display() {
        let name = TopicName::new("t");
        assert_eq!(name.to_string(), "t");
        assert_eq!(format!("{name:?}"), "topic(\"t\")");
    }
}
