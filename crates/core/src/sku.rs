//! SKU value type.
//!
//! A SKU is the business-facing product identifier: a short category prefix
//! followed by a zero-padded sequence number (`VC001`, `AE042`). Padding is
//! a presentation convention, not a capacity: the numeric part grows past
//! three digits once the padded space is used up (`VC1000`).

use serde::{Deserialize, Serialize};

/// Width the sequence number is padded to.
pub const SKU_PAD_WIDTH: usize = 3;

/// Business identifier of a product, unique across the whole catalog.
///
/// Constructed only through [`Sku::format`]; uniqueness is enforced by the
/// record store, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    /// Format a candidate SKU from a category prefix and a sequence number.
    pub fn format(prefix: &str, sequence: u32) -> Self {
        Self(format!("{prefix}{sequence:0width$}", width = SKU_PAD_WIDTH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this SKU carries the given category prefix.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Sku> for String {
    fn from(value: Sku) -> Self {
        value.0
    }
}
