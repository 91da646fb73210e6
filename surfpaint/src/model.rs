use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) colour, each channel in [0, 1].
pub type Rgba = [f32; 4];

pub const TRANSPARENT: Rgba = [0.0, 0.0, 0.0, 0.0];

pub type LayerId = String;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    #[default]
    Normal = 0,
    Additive = 1,
    Multiply = 2,
    Screen = 3,
}

impl BlendMode {
    pub fn from_u8(v: u8) -> Option<BlendMode> {
        match v {
            0 => Some(BlendMode::Normal),
            1 => Some(BlendMode::Additive),
            2 => Some(BlendMode::Multiply),
            3 => Some(BlendMode::Screen),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Additive => "additive",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
        }
    }
}

/// Statistic a StatMap layer's scalar values represent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatType {
    T,
    Z,
    F,
    #[default]
    Generic,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionMethod {
    #[default]
    None,
    Fdr,
    Bonferroni,
    Cluster,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Base,
    Rgba,
    Data,
    TwoData,
    Label,
    StatMap,
    Outline,
}

impl LayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Base => "base",
            LayerKind::Rgba => "rgba",
            LayerKind::Data => "data",
            LayerKind::TwoData => "two_data",
            LayerKind::Label => "label",
            LayerKind::StatMap => "stat_map",
            LayerKind::Outline => "outline",
        }
    }
}

/// Category entry of a label (parcellation) table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub name: String,
    pub color: Rgba,
}
