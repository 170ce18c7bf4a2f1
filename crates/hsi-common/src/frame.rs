//! Wire model for what the server pushes each tick.
//!
//! A run uses exactly one payload shape: structured JSON frames
//! (`{"vector": [...], "text": "..."}`) or bare `"0"`/`"1"` label tokens.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One vector + label frame. Immutable once built; encoded once per tick and
/// shared across every client write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub vector: Vec<f64>,
    #[serde(default)]
    pub text: String,
}

impl Frame {
    pub fn new(vector: Vec<f64>, text: impl Into<String>) -> Self {
        Self {
            vector,
            text: text.into(),
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode a frame received on the client side. Missing fields fall back to
    /// an empty vector / empty text.
    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            vector: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            text: "Message Sent".into(),
        }
    }
}

/// Binary threshold label emitted in hardware-driven mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Label {
    #[default]
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "1")]
    One,
}

impl Label {
    /// `One` when `reading` is strictly above `threshold`.
    pub fn from_reading(reading: i64, threshold: i64) -> Self {
        if reading > threshold {
            Label::One
        } else {
            Label::Zero
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Zero => "0",
            Label::One => "1",
        }
    }

    pub fn decode(text: &str) -> Option<Self> {
        match text.trim() {
            "0" => Some(Label::Zero),
            "1" => Some(Label::One),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which payload shape is active for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PayloadMode {
    #[default]
    Structured,
    Label,
}

/// What one tick broadcasts.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Structured(Frame),
    Label(Label),
}

impl Payload {
    pub fn mode(&self) -> PayloadMode {
        match self {
            Payload::Structured(_) => PayloadMode::Structured,
            Payload::Label(_) => PayloadMode::Label,
        }
    }

    /// Encode to the text sent on the wire.
    pub fn encode(&self) -> serde_json::Result<String> {
        match self {
            Payload::Structured(frame) => frame.encode(),
            Payload::Label(label) => Ok(label.as_str().to_string()),
        }
    }

    /// Decode wire text according to the active mode.
    pub fn decode(mode: PayloadMode, text: &str) -> Option<Self> {
        match mode {
            PayloadMode::Structured => Frame::decode(text).ok().map(Payload::Structured),
            PayloadMode::Label => Label::decode(text).map(Payload::Label),
        }
    }
}
