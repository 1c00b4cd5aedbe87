//! Derived-field calculator for back check measurements
//!
//! Computes the stored socket totals and the generated deviation remark.
//! Everything here is pure; callers persist the results.
//!
//! Remark format (canonical):
//! - not measured (`sockets == 0`): empty string
//! - matches expectation: `"<Species>: Correct"`
//! - otherwise: `"<Species>: +N"` or `"<Species>: -N"` where the sign is
//!   `sockets - expected`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator placed between per-species remarks
pub const REMARK_SEPARATOR: &str = " | ";

/// Largest accepted bed, socket or seedling count
pub const MAX_COUNT: i64 = 1_000_000;

/// Nursery species measured during a back check, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Guava,
    Gesho,
    Lemon,
    Grevillea,
}

impl Species {
    /// All species in the fixed display/export order
    pub const ALL: [Species; 4] = [
        Species::Guava,
        Species::Gesho,
        Species::Lemon,
        Species::Grevillea,
    ];

    /// Display name used in remarks and form labels
    pub fn name(self) -> &'static str {
        match self {
            Species::Guava => "Guava",
            Species::Gesho => "Gesho",
            Species::Lemon => "Lemon",
            Species::Grevillea => "Grevillea",
        }
    }

    /// Amharic label shown next to the English name
    pub fn amharic(self) -> &'static str {
        match self {
            Species::Guava => "ዘይቶን",
            Species::Gesho => "ጌሾ",
            Species::Lemon => "ሎሚ",
            Species::Grevillea => "ግራቪሊያ",
        }
    }

    /// Lowercase column prefix (`guava_beds`, `total_guava_sockets`, ...)
    pub fn key(self) -> &'static str {
        match self {
            Species::Guava => "guava",
            Species::Gesho => "gesho",
            Species::Lemon => "lemon",
            Species::Grevillea => "grevillea",
        }
    }

    /// Expected socket count across one bed's width
    pub fn expected_sockets(self) -> i64 {
        match self {
            Species::Guava | Species::Lemon => 13,
            Species::Gesho | Species::Grevillea => 16,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Species {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Species::ALL
            .into_iter()
            .find(|sp| sp.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown species: {}", s))
    }
}

/// Total sockets for a species: `beds × sockets_per_bed`
///
/// Inputs above [`MAX_COUNT`] are rejected before storage; anything larger
/// saturates rather than wrapping.
pub fn total(beds: i64, sockets_per_bed: i64) -> i64 {
    beds.saturating_mul(sockets_per_bed)
}

/// Check a count against `0..=MAX_COUNT`
pub fn check_count(label: &str, count: i64) -> Result<(), String> {
    if count < 0 {
        Err(format!("{} must be non-negative", label))
    } else if count > MAX_COUNT {
        Err(format!("{} must be at most {}", label, MAX_COUNT))
    } else {
        Ok(())
    }
}

/// Deviation remark for one species
pub fn remark(species: Species, sockets_per_bed: i64) -> String {
    if sockets_per_bed == 0 {
        return String::new();
    }

    let diff = sockets_per_bed - species.expected_sockets();
    if diff == 0 {
        format!("{}: Correct", species.name())
    } else {
        format!("{}: {:+}", species.name(), diff)
    }
}

/// Join the remarks of every measured species with [`REMARK_SEPARATOR`]
///
/// Input order is preserved; unmeasured species are omitted.
pub fn combined_remark<I>(measured: I) -> String
where
    I: IntoIterator<Item = (Species, i64)>,
{
    measured
        .into_iter()
        .map(|(species, sockets)| remark(species, sockets))
        .filter(|r| !r.is_empty())
        .collect::<Vec<_>>()
        .join(REMARK_SEPARATOR)
}

/// Parse a single species remark back into `(species, sockets - expected)`
///
/// `"Guava: Correct"` yields a deviation of 0.
pub fn parse_remark(text: &str) -> Option<(Species, i64)> {
    let (name, value) = text.split_once(':')?;
    let species = name.parse::<Species>().ok()?;
    let value = value.trim();

    if value == "Correct" {
        return Some((species, 0));
    }

    // Signed form only: a bare magnitude would be ambiguous
    if !value.starts_with('+') && !value.starts_with('-') {
        return None;
    }
    let diff = value.parse::<i64>().ok()?;
    (diff != 0).then_some((species, diff))
}

/// Parse a combined remark into its per-species deviations
pub fn parse_combined_remark(text: &str) -> Option<Vec<(Species, i64)>> {
    if text.trim().is_empty() {
        return Some(Vec::new());
    }
    text.split(REMARK_SEPARATOR).map(parse_remark).collect()
}
