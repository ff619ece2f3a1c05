//! Core domain types shared across the clustering pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Stable identifier for an analysis record within a single run.
///
/// Assigned by the loader in input order, starting at 1. Every derived
/// structure (feature rows, cluster labels) is keyed by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(NonZeroU32);

impl RecordId {
    /// Create a new RecordId from a non-zero value.
    pub fn new(value: NonZeroU32) -> Self {
        Self(value)
    }

    /// Create a RecordId from a u32, returning None if zero.
    pub fn from_u32(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    /// Get the inner value as u32.
    pub fn value(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cluster identifier in `[0, k)`.
///
/// Serializes as a bare integer, so maps keyed by `ClusterId` become JSON
/// objects keyed `"0"`, `"1"`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(u32);

impl ClusterId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Index into centroid and summary vectors.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for ClusterId {
    fn from(value: usize) -> Self {
        Self(value as u32)
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attributes the vision-analysis stage reports for each image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    ArchitecturalStyle,
    FuturisticElements,
    Mood,
    ColorPalette,
    DominantMaterials,
    ShortDescriptiveLabel,
}

impl Attribute {
    /// Every attribute a valid analysis must carry.
    pub const ALL: [Attribute; 6] = [
        Attribute::ArchitecturalStyle,
        Attribute::FuturisticElements,
        Attribute::Mood,
        Attribute::ColorPalette,
        Attribute::DominantMaterials,
        Attribute::ShortDescriptiveLabel,
    ];

    /// The JSON key used in the analysis payload and as feature-name prefix.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::ArchitecturalStyle => "architectural_style",
            Self::FuturisticElements => "futuristic_elements",
            Self::Mood => "mood",
            Self::ColorPalette => "color_palette",
            Self::DominantMaterials => "dominant_materials",
            Self::ShortDescriptiveLabel => "short_descriptive_label",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Typed form of the vision model's `analysis` payload.
///
/// Deserialization fails when any required key is missing or not a string.
/// Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub architectural_style: String,
    pub futuristic_elements: String,
    pub mood: String,
    pub color_palette: String,
    pub dominant_materials: String,
    pub short_descriptive_label: String,
}

impl Attributes {
    /// Raw value of one attribute.
    pub fn get(&self, attribute: Attribute) -> &str {
        match attribute {
            Attribute::ArchitecturalStyle => &self.architectural_style,
            Attribute::FuturisticElements => &self.futuristic_elements,
            Attribute::Mood => &self.mood,
            Attribute::ColorPalette => &self.color_palette,
            Attribute::DominantMaterials => &self.dominant_materials,
            Attribute::ShortDescriptiveLabel => &self.short_descriptive_label,
        }
    }
}

/// One validated per-image analysis. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRecord {
    pub id: RecordId,
    pub source_path: String,
    pub attributes: Attributes,
}

impl AnalysisRecord {
    pub fn new(id: RecordId, source_path: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id,
            source_path: source_path.into(),
            attributes,
        }
    }

    pub fn attribute(&self, attribute: Attribute) -> &str {
        self.attributes.get(attribute)
    }
}
