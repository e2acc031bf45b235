use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Four byte tag value as stored in font data.
pub type RawTag = u32;

/// Creates a raw tag from four bytes.
pub const fn raw_tag(bytes: &[u8; 4]) -> RawTag {
    (bytes[0] as u32) << 24
        | (bytes[1] as u32) << 16
        | (bytes[2] as u32) << 8
        | bytes[3] as u32
}

/// OpenType tag: table names, script, language system and feature
/// identifiers.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Tag(pub RawTag);

impl Tag {
    pub const fn new(bytes: &[u8; 4]) -> Self {
        Self(raw_tag(bytes))
    }

    /// Creates a tag from the first four bytes of a string, padding
    /// with spaces, so `"JAN"` and `"JAN "` are the same tag.
    pub fn from_str_lossy(s: &str) -> Self {
        let mut bytes = [b' '; 4];
        for (i, b) in s.as_bytes().iter().enumerate().take(4) {
            bytes[i] = *b;
        }
        Self::new(&bytes)
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.to_bytes() {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() || s.len() > 4 || !s.is_ascii() {
            return Err(de::Error::custom(format!(
                "invalid tag {s:?}: expected one to four ASCII characters"
            )));
        }
        Ok(Tag::from_str_lossy(&s))
    }
}
