//! Discrete labels delivered by the device classifier.
//!
//! The SDK reports labels as strings like `[ "DEBOUNCE_LDA_INEH" ]`. [`Label::parse`] accepts
//! both that raw form and the short names (`INDEX`, `INDEX_SWIPE_UP`, `SHAKE_N_THUMB`).

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::LabelError;

/// Hand-muscle activation classes that can be held, clicked or debounced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GestureClass {
    Index,
    Thumb,
    Hand,
}

impl GestureClass {
    pub const ALL: [GestureClass; 3] = [GestureClass::Index, GestureClass::Thumb, GestureClass::Hand];

    pub(crate) fn slot(self) -> usize {
        match self {
            GestureClass::Index => 0,
            GestureClass::Thumb => 1,
            GestureClass::Hand => 2,
        }
    }

    fn from_any_code(s: &str) -> Option<Self> {
        match s {
            "INDEX" | "INEH" => Some(GestureClass::Index),
            "THUMB" | "TEH" => Some(GestureClass::Thumb),
            "HAND" | "FHEH" => Some(GestureClass::Hand),
            _ => None,
        }
    }
}

impl fmt::Display for GestureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GestureClass::Index => "INDEX",
            GestureClass::Thumb => "THUMB",
            GestureClass::Hand => "HAND",
        };
        f.write_str(s)
    }
}

impl FromStr for GestureClass {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INDEX" => Ok(GestureClass::Index),
            "THUMB" => Ok(GestureClass::Thumb),
            "HAND" => Ok(GestureClass::Hand),
            other => Err(LabelError::Unknown(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtensionTag {
    None,
    Index,
    Thumb,
    Hand,
    Rest,
    Nac,
    Inactive,
    Null,
}

impl ExtensionTag {
    pub fn class(self) -> Option<GestureClass> {
        match self {
            ExtensionTag::Index => Some(GestureClass::Index),
            ExtensionTag::Thumb => Some(GestureClass::Thumb),
            ExtensionTag::Hand => Some(GestureClass::Hand),
            _ => None,
        }
    }
}

impl From<GestureClass> for ExtensionTag {
    fn from(c: GestureClass) -> Self {
        match c {
            GestureClass::Index => ExtensionTag::Index,
            GestureClass::Thumb => ExtensionTag::Thumb,
            GestureClass::Hand => ExtensionTag::Hand,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShakeTag {
    Shake,
    ShakeNIndex,
    ShakeNThumb,
    ShakeNHand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwipeDirection {
    Right,
    Left,
    Up,
    Down,
}

impl FromStr for SwipeDirection {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RIGHT" => Ok(SwipeDirection::Right),
            "LEFT" => Ok(SwipeDirection::Left),
            "UP" => Ok(SwipeDirection::Up),
            "DOWN" => Ok(SwipeDirection::Down),
            other => Err(LabelError::Unknown(other.to_string())),
        }
    }
}

/// One decoded device label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Extension(ExtensionTag),
    Swipe(GestureClass, SwipeDirection),
    Shake(ShakeTag),
}

impl Label {
    pub fn parse(raw: &str) -> Result<Self, LabelError> {
        let name = strip_wrapping(raw);
        if name.is_empty() {
            return Err(LabelError::Empty);
        }

        let ext = match name {
            "null" | "NULL" => Some(ExtensionTag::Null),
            "NONE" => Some(ExtensionTag::None),
            "DEBOUNCE_LDA_INACTIVE" | "INACTIVE" => Some(ExtensionTag::Inactive),
            "DEBOUNCE_LDA_NAC" | "NAC" => Some(ExtensionTag::Nac),
            "DEBOUNCE_LDA_REST" | "REST" => Some(ExtensionTag::Rest),
            _ => None,
        };
        if let Some(tag) = ext {
            return Ok(Label::Extension(tag));
        }

        let short = name.strip_prefix("DEBOUNCE_LDA_").unwrap_or(name);
        if let Some(class) = GestureClass::from_any_code(short) {
            return Ok(Label::Extension(class.into()));
        }

        if let Some(rest) = name.strip_prefix("SHAKE") {
            return match rest {
                "" => Ok(Label::Shake(ShakeTag::Shake)),
                _ => match rest.strip_prefix("_N_").and_then(GestureClass::from_any_code) {
                    Some(GestureClass::Index) => Ok(Label::Shake(ShakeTag::ShakeNIndex)),
                    Some(GestureClass::Thumb) => Ok(Label::Shake(ShakeTag::ShakeNThumb)),
                    Some(GestureClass::Hand) => Ok(Label::Shake(ShakeTag::ShakeNHand)),
                    None => Err(LabelError::Unknown(name.to_string())),
                },
            };
        }

        if let Some((class, dir)) = name.split_once("_SWIPE_") {
            let class =
                GestureClass::from_any_code(class).ok_or_else(|| LabelError::Unknown(name.to_string()))?;
            let dir: SwipeDirection = dir
                .parse()
                .map_err(|_| LabelError::Unknown(name.to_string()))?;
            return Ok(Label::Swipe(class, dir));
        }

        Err(LabelError::Unknown(name.to_string()))
    }
}

// `[ "X" ]` -> `X`
fn strip_wrapping(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .trim_matches('"')
        .trim()
}
