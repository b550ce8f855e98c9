use std::fmt;

use serde::{Deserialize, Serialize};

/// The asset categories an extraction run can produce.
///
/// Configuration sections, CLI toggles and job output paths all key off this set.
/// Variant order is the order categories are enumerated in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Cover art for music entries.
    Jackets,

    /// Other textures (avatars, map icons, name plates, ...).
    Images,

    /// Full music tracks from standalone audio banks.
    Music,

    /// Ancillary audio (system voices) from cue-indexed banks.
    Audio,
}

impl Category {
    /// All categories, in enumeration order.
    pub const ALL: [Category; 4] = [
        Category::Jackets,
        Category::Images,
        Category::Music,
        Category::Audio,
    ];

    /// The config section name for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Jackets => "jackets",
            Category::Images => "images",
            Category::Music => "music",
            Category::Audio => "audio",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
