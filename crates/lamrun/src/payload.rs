//! # Payloads
//!
//! A payload is the raw request body together with a cheap guess at its shape.
//! The guess is made once, on construction, and only serves to reject
//! obviously wrong decodes early. It is not a validity check.

/// Probable shape of a raw payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadTag {
    Integer,
    /// Never produced by [`classify`]; booleans are decided at decode time.
    Boolean,
    JsonObject,
    JsonArray,
    PlainString,
}

/// Sniffs the probable shape of `raw`, ignoring surrounding ASCII whitespace.
pub fn classify(raw: &[u8]) -> PayloadTag {
    let trimmed = raw.trim_ascii();

    if is_integer(trimmed) {
        return PayloadTag::Integer;
    }

    match (trimmed.first(), trimmed.last()) {
        (Some(b'{'), Some(b'}')) => PayloadTag::JsonObject,
        (Some(b'['), Some(b']')) => PayloadTag::JsonArray,
        _ => PayloadTag::PlainString,
    }
}

fn is_integer(bytes: &[u8]) -> bool {
    let digits = bytes.strip_prefix(b"-").unwrap_or(bytes);
    !digits.is_empty() && digits.iter().all(u8::is_ascii_digit)
}

/// Raw request bytes plus their classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    bytes: Vec<u8>,
    tag: PayloadTag,
}

impl Payload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let tag = classify(&bytes);
        Self { bytes, tag }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn tag(&self) -> PayloadTag {
        self.tag
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The payload without surrounding ASCII whitespace.
    pub fn trimmed(&self) -> &[u8] {
        self.bytes.trim_ascii()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::new(text.into_bytes())
    }
}
