//! Form definitions, validation and value parsing
//!
//! Both entry forms are data: a [`FormSpec`] lists sections and fields with
//! their labels, input kind and whether they are required. One renderer
//! (`ui::layout::render_form`) and one validator ([`validate`]) serve every
//! form; species sections are generated from the species tables.

use std::collections::HashMap;

use nbc_common::models::{BedMeasurement, Fenced, NewBackCheck, NewFarmer, TreeSpecies};
use nbc_common::calc::MAX_COUNT;
use nbc_common::Species;

/// Submitted form values keyed by field name
pub type FormValues = HashMap<String, String>;

/// Input control kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    /// Non-negative whole number
    Integer,
    /// Non-negative decimal (metres)
    Real,
    /// Yes/No radio pair
    YesNo,
    /// Woreda select; falls back to text when no woredas are configured
    WoredaSelect,
    /// Kebele select filled from the chosen woreda
    KebeleSelect,
    /// Image file, submitted as base64 text
    Photo,
    /// Audio clip, submitted as base64 text
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    /// Amharic label
    pub label_am: Option<String>,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            label_am: None,
            kind,
            required: false,
        }
    }

    fn am(mut self, label: &str) -> Self {
        self.label_am = Some(label.to_string());
        self
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub action: &'static str,
    pub submit_label: &'static str,
    pub sections: Vec<Section>,
}

impl FormSpec {
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields().find(|f| f.name == name)
    }
}

/// Validation failure for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

// ========================================
// Form definitions
// ========================================

/// Nursery back check form
pub fn back_check_form() -> FormSpec {
    let mut sections = vec![Section {
        title: "Location & Personnel".to_string(),
        fields: vec![
            FieldSpec::new("woreda", "Woreda", FieldKind::Text).am("ወረዳ").required(),
            FieldSpec::new("cluster", "Cluster", FieldKind::Text).am("ክላስተር"),
            FieldSpec::new("kebele", "Kebele", FieldKind::Text).am("ቀበሌ").required(),
            FieldSpec::new("tno_name", "TNO Name", FieldKind::Text).am("የTNO ስም"),
            FieldSpec::new("checker_fa_name", "FA Name", FieldKind::Text).am("የFA ስም").required(),
            FieldSpec::new("cbe_acc", "CBE ACC", FieldKind::Text).am("የCBE ሂሳብ ቁጥር"),
            FieldSpec::new("checker_phone", "Phone", FieldKind::Text).am("ስልክ"),
            FieldSpec::new("fenced", "Fenced?", FieldKind::YesNo).am("አጥር?"),
        ],
    }];

    for species in Species::ALL {
        let key = species.key();
        sections.push(Section {
            title: format!("{} ({}) - expected {} sockets", species.name(), species.amharic(), species.expected_sockets()),
            fields: vec![
                FieldSpec::new(format!("{}_beds", key), format!("{} beds #", species.name()), FieldKind::Integer),
                FieldSpec::new(format!("{}_length", key), "Length (m)", FieldKind::Real),
                FieldSpec::new(format!("{}_sockets", key), "Sockets (width)", FieldKind::Integer),
            ],
        });
    }

    sections.push(Section {
        title: "Remarks & Photo".to_string(),
        fields: vec![
            FieldSpec::new("remark", "Remark", FieldKind::TextArea).am("ማስታወሻ"),
            FieldSpec::new("photo", "Nursery photo", FieldKind::Photo).am("ፎቶ"),
        ],
    });

    FormSpec {
        id: "back_check",
        title: "Nursery Back Check Form",
        action: "/back-check",
        submit_label: "Submit Data",
        sections,
    }
}

/// Farmer seedling distribution form
pub fn farmer_form() -> FormSpec {
    let counts = TreeSpecies::ALL
        .into_iter()
        .map(|sp| FieldSpec::new(sp.column(), sp.name(), FieldKind::Integer).am(sp.amharic()))
        .collect();

    FormSpec {
        id: "farmer",
        title: "Farmer Seedling Distribution",
        action: "/farmers/new",
        submit_label: "Save Farmer",
        sections: vec![
            Section {
                title: "Farmer".to_string(),
                fields: vec![
                    FieldSpec::new("name", "Farmer Name", FieldKind::Text).am("የአርሶ አደሩ ስም").required(),
                    FieldSpec::new("phone", "Phone", FieldKind::Text).am("ስልክ"),
                    FieldSpec::new("woreda", "Woreda", FieldKind::WoredaSelect).am("ወረዳ").required(),
                    FieldSpec::new("kebele", "Kebele", FieldKind::KebeleSelect).am("ቀበሌ").required(),
                    FieldSpec::new("officer_name", "Distributing Officer", FieldKind::Text).am("አከፋፋይ"),
                ],
            },
            Section {
                title: "Seedlings Received".to_string(),
                fields: counts,
            },
            Section {
                title: "Voice Note".to_string(),
                fields: vec![FieldSpec::new("audio", "Audio clip", FieldKind::Audio).am("ድምፅ")],
            },
        ],
    }
}

// ========================================
// Validation and parsing
// ========================================

fn value<'a>(values: &'a FormValues, name: &str) -> &'a str {
    values.get(name).map(|v| v.trim()).unwrap_or("")
}

/// Check required fields and numeric inputs
pub fn validate(spec: &FormSpec, values: &FormValues) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for field in spec.fields() {
        let raw = value(values, &field.name);
        let error = |message: String| FieldError {
            field: field.name.clone(),
            message,
        };

        if field.required && raw.is_empty() {
            errors.push(error(format!("{} is required", field.label)));
            continue;
        }
        if raw.is_empty() {
            continue;
        }

        match field.kind {
            FieldKind::Integer => match raw.parse::<i64>() {
                Ok(n) if (0..=MAX_COUNT).contains(&n) => {}
                _ => errors.push(error(format!(
                    "{} must be a whole number from 0 to {}",
                    field.label, MAX_COUNT
                ))),
            },
            FieldKind::Real => match raw.parse::<f64>() {
                Ok(x) if x >= 0.0 && x.is_finite() => {}
                _ => errors.push(error(format!("{} must be a number of 0 or more", field.label))),
            },
            FieldKind::YesNo => {
                if raw.parse::<Fenced>().is_err() {
                    errors.push(error(format!("{} must be Yes or No", field.label)));
                }
            }
            _ => {}
        }
    }

    errors
}

fn int(values: &FormValues, name: &str) -> i64 {
    value(values, name).parse().unwrap_or(0)
}

fn real(values: &FormValues, name: &str) -> f64 {
    value(values, name).parse().unwrap_or(0.0)
}

fn optional(values: &FormValues, name: &str) -> Option<String> {
    Some(value(values, name).to_string()).filter(|v| !v.is_empty())
}

/// Build a back check from validated values; empty numerics are zero
pub fn parse_back_check(values: &FormValues) -> NewBackCheck {
    let mut input = NewBackCheck {
        woreda: value(values, "woreda").to_string(),
        cluster: value(values, "cluster").to_string(),
        kebele: value(values, "kebele").to_string(),
        tno_name: value(values, "tno_name").to_string(),
        checker_fa_name: value(values, "checker_fa_name").to_string(),
        cbe_acc: value(values, "cbe_acc").to_string(),
        checker_phone: value(values, "checker_phone").to_string(),
        fenced: value(values, "fenced").parse().unwrap_or_default(),
        remark: optional(values, "remark"),
        photo: optional(values, "photo"),
        ..NewBackCheck::default()
    };

    for species in Species::ALL {
        let key = species.key();
        *input.measurement_mut(species) = BedMeasurement::new(
            int(values, &format!("{}_beds", key)),
            real(values, &format!("{}_length", key)),
            int(values, &format!("{}_sockets", key)),
        );
    }

    input
}

/// Build a farmer record from validated values, plus the raw audio payload
pub fn parse_farmer(values: &FormValues) -> (NewFarmer, Option<String>) {
    let mut farmer = NewFarmer {
        name: value(values, "name").to_string(),
        phone: value(values, "phone").to_string(),
        woreda: value(values, "woreda").to_string(),
        kebele: value(values, "kebele").to_string(),
        officer_name: value(values, "officer_name").to_string(),
        ..NewFarmer::default()
    };
    for species in TreeSpecies::ALL {
        farmer.counts.set(species, int(values, species.column()));
    }

    (farmer, optional(values, "audio"))
}
