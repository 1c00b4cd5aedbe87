//! Record types persisted by the nursery service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::calc::{self, Species};

// ========================================
// Back checks
// ========================================

/// Nursery fence status, stored as `"Yes"` / `"No"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Fenced {
    Yes,
    #[default]
    No,
}

impl Fenced {
    pub fn as_str(self) -> &'static str {
        match self {
            Fenced::Yes => "Yes",
            Fenced::No => "No",
        }
    }
}

impl fmt::Display for Fenced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Fenced {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "1" => Ok(Fenced::Yes),
            "no" | "false" | "0" | "" => Ok(Fenced::No),
            other => Err(format!("Invalid fenced value: {}", other)),
        }
    }
}

/// Submitted bed measurement for one species
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BedMeasurement {
    /// Number of beds
    pub beds: i64,
    /// Bed length in metres
    pub length: f64,
    /// Sockets across one bed's width
    pub sockets: i64,
}

impl BedMeasurement {
    pub fn new(beds: i64, length: f64, sockets: i64) -> Self {
        Self { beds, length, sockets }
    }

    /// Reject negative or out-of-range counts and lengths
    pub fn validate(&self, species: Species) -> Result<(), String> {
        if self.length < 0.0 || !self.length.is_finite() {
            return Err(format!("{} length must be non-negative", species.name()));
        }
        calc::check_count(&format!("{} beds", species.name()), self.beds)?;
        calc::check_count(&format!("{} sockets", species.name()), self.sockets)
    }
}

/// Stored bed measurement, including the derived total
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BedRecord {
    pub beds: i64,
    pub length: f64,
    pub sockets: i64,
    pub total_sockets: i64,
}

impl From<BedMeasurement> for BedRecord {
    fn from(m: BedMeasurement) -> Self {
        Self {
            beds: m.beds,
            length: m.length,
            sockets: m.sockets,
            total_sockets: calc::total(m.beds, m.sockets),
        }
    }
}

/// Back check as submitted from the form or JSON API
///
/// Absent fields deserialize to empty strings / zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewBackCheck {
    pub woreda: String,
    pub cluster: String,
    pub kebele: String,
    pub tno_name: String,
    pub checker_fa_name: String,
    pub cbe_acc: String,
    pub checker_phone: String,
    pub fenced: Fenced,
    pub guava: BedMeasurement,
    pub gesho: BedMeasurement,
    pub lemon: BedMeasurement,
    pub grevillea: BedMeasurement,
    /// Free-text remark entered by the checker
    pub remark: Option<String>,
    /// Base64-encoded photo
    pub photo: Option<String>,
}

impl NewBackCheck {
    pub fn measurement(&self, species: Species) -> BedMeasurement {
        match species {
            Species::Guava => self.guava,
            Species::Gesho => self.gesho,
            Species::Lemon => self.lemon,
            Species::Grevillea => self.grevillea,
        }
    }

    pub fn measurement_mut(&mut self, species: Species) -> &mut BedMeasurement {
        match species {
            Species::Guava => &mut self.guava,
            Species::Gesho => &mut self.gesho,
            Species::Lemon => &mut self.lemon,
            Species::Grevillea => &mut self.grevillea,
        }
    }

    /// Generated deviation remark over all species, in display order
    pub fn auto_remark(&self) -> String {
        calc::combined_remark(
            Species::ALL
                .into_iter()
                .map(|sp| (sp, self.measurement(sp).sockets)),
        )
    }
}

/// Persisted back check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackCheck {
    pub id: i64,
    pub woreda: String,
    pub cluster: String,
    pub kebele: String,
    pub tno_name: String,
    pub checker_fa_name: String,
    pub cbe_acc: String,
    pub checker_phone: String,
    pub fenced: String,
    pub guava: BedRecord,
    pub gesho: BedRecord,
    pub lemon: BedRecord,
    pub grevillea: BedRecord,
    pub remark: Option<String>,
    pub auto_remark: Option<String>,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BackCheck {
    pub fn has_photo(&self) -> bool {
        self.photo.as_deref().is_some_and(|p| !p.is_empty())
    }
}

// ========================================
// Farmers
// ========================================

/// Tree species handed out to farmers, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeSpecies {
    Gesho,
    Giravila,
    Diceres,
    Wanza,
    Papaya,
    Moringa,
    Lemon,
    Arzelibanos,
    Guava,
}

impl TreeSpecies {
    pub const ALL: [TreeSpecies; 9] = [
        TreeSpecies::Gesho,
        TreeSpecies::Giravila,
        TreeSpecies::Diceres,
        TreeSpecies::Wanza,
        TreeSpecies::Papaya,
        TreeSpecies::Moringa,
        TreeSpecies::Lemon,
        TreeSpecies::Arzelibanos,
        TreeSpecies::Guava,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TreeSpecies::Gesho => "Gesho",
            TreeSpecies::Giravila => "Giravila",
            TreeSpecies::Diceres => "Diceres",
            TreeSpecies::Wanza => "Wanza",
            TreeSpecies::Papaya => "Papaya",
            TreeSpecies::Moringa => "Moringa",
            TreeSpecies::Lemon => "Lemon",
            TreeSpecies::Arzelibanos => "Arzelibanos",
            TreeSpecies::Guava => "Guava",
        }
    }

    pub fn amharic(self) -> &'static str {
        match self {
            TreeSpecies::Gesho => "ጌሾ",
            TreeSpecies::Giravila => "ግራቪሊያ",
            TreeSpecies::Diceres => "ዲሴረስ",
            TreeSpecies::Wanza => "ዋንዛ",
            TreeSpecies::Papaya => "ፓፓያ",
            TreeSpecies::Moringa => "ሞሪንጋ",
            TreeSpecies::Lemon => "ሎሚ",
            TreeSpecies::Arzelibanos => "አርዘ ሊባኖስ",
            TreeSpecies::Guava => "ዘይቶን",
        }
    }

    /// Column holding the distributed count (`gesho_count`, ...)
    pub fn column(self) -> &'static str {
        match self {
            TreeSpecies::Gesho => "gesho_count",
            TreeSpecies::Giravila => "giravila_count",
            TreeSpecies::Diceres => "diceres_count",
            TreeSpecies::Wanza => "wanza_count",
            TreeSpecies::Papaya => "papaya_count",
            TreeSpecies::Moringa => "moringa_count",
            TreeSpecies::Lemon => "lemon_count",
            TreeSpecies::Arzelibanos => "arzelibanos_count",
            TreeSpecies::Guava => "guava_count",
        }
    }
}

/// Seedling counts per tree species
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeCounts {
    pub gesho: i64,
    pub giravila: i64,
    pub diceres: i64,
    pub wanza: i64,
    pub papaya: i64,
    pub moringa: i64,
    pub lemon: i64,
    pub arzelibanos: i64,
    pub guava: i64,
}

impl TreeCounts {
    pub fn get(&self, species: TreeSpecies) -> i64 {
        match species {
            TreeSpecies::Gesho => self.gesho,
            TreeSpecies::Giravila => self.giravila,
            TreeSpecies::Diceres => self.diceres,
            TreeSpecies::Wanza => self.wanza,
            TreeSpecies::Papaya => self.papaya,
            TreeSpecies::Moringa => self.moringa,
            TreeSpecies::Lemon => self.lemon,
            TreeSpecies::Arzelibanos => self.arzelibanos,
            TreeSpecies::Guava => self.guava,
        }
    }

    pub fn set(&mut self, species: TreeSpecies, count: i64) {
        let slot = match species {
            TreeSpecies::Gesho => &mut self.gesho,
            TreeSpecies::Giravila => &mut self.giravila,
            TreeSpecies::Diceres => &mut self.diceres,
            TreeSpecies::Wanza => &mut self.wanza,
            TreeSpecies::Papaya => &mut self.papaya,
            TreeSpecies::Moringa => &mut self.moringa,
            TreeSpecies::Lemon => &mut self.lemon,
            TreeSpecies::Arzelibanos => &mut self.arzelibanos,
            TreeSpecies::Guava => &mut self.guava,
        };
        *slot = count;
    }

    /// Reject negative or out-of-range counts
    pub fn validate(&self) -> Result<(), String> {
        TreeSpecies::ALL
            .into_iter()
            .try_for_each(|sp| calc::check_count(&format!("{} count", sp.name()), self.get(sp)))
    }

    pub fn total(&self) -> i64 {
        TreeSpecies::ALL
            .into_iter()
            .fold(0i64, |sum, sp| sum.saturating_add(self.get(sp)))
    }
}

/// Farmer distribution record as submitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewFarmer {
    pub name: String,
    pub phone: String,
    pub woreda: String,
    pub kebele: String,
    pub officer_name: String,
    pub counts: TreeCounts,
    /// URL of the uploaded audio clip, if the upload succeeded
    pub audio_url: Option<String>,
}

/// Persisted farmer distribution record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farmer {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub woreda: String,
    pub kebele: String,
    pub officer_name: String,
    pub counts: TreeCounts,
    pub audio_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ========================================
// Locations
// ========================================

/// Administrative district
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Woreda {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Sub-district, owned by exactly one woreda
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kebele {
    pub id: i64,
    pub woreda_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
