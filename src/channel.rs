//! Channel identity: the key a user-drawn shape is tracked under and its kind.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::UnknownKind;

/// Identifier of a channel, usually the colour label assigned to the shape
/// when the user drew it (e.g. `"red"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelKey(pub String);

impl ChannelKey {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ChannelKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Category of a channel. Decides which sink renders it and what shape its
/// data has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Mean intensity of a rectangle or ellipse over time.
    Region,
    /// Intensity profile sampled along a line.
    Line,
}

impl ChannelKind {
    /// Map a canvas shape name to a channel kind.
    ///
    /// Rectangles and ellipses are both region-intensity channels.
    pub fn from_shape(shape: &str) -> Option<Self> {
        match shape.trim().to_ascii_lowercase().as_str() {
            "rectangle" | "ellipse" | "region" => Some(ChannelKind::Region),
            "line" => Some(ChannelKind::Line),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Region => "region",
            ChannelKind::Line => "line",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelKind::from_shape(s).ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// A tracked region-of-interest or line profile.
#[derive(Debug, Clone)]
pub struct Channel {
    pub key: ChannelKey,
    pub kind: ChannelKind,
    pub created_at: DateTime<Local>,
}

impl Channel {
    pub fn new(key: ChannelKey, kind: ChannelKind) -> Self {
        Self {
            key,
            kind,
            created_at: Local::now(),
        }
    }
}
