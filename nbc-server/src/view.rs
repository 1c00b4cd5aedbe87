//! Per-request view state
//!
//! Everything a page render needs about "where the user is" travels in one
//! immutable [`ViewState`] value built by the handler. Builder methods
//! consume and return a new value.

use crate::forms::{FieldError, FormValues};

/// Navigation target, used for the active tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    BackCheckForm,
    FarmerForm,
    Records,
    Farmers,
    Locations,
    Login,
}

impl Page {
    pub const NAV: [Page; 5] = [
        Page::BackCheckForm,
        Page::FarmerForm,
        Page::Records,
        Page::Farmers,
        Page::Locations,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::BackCheckForm => "Back Check",
            Page::FarmerForm => "Farmer Distribution",
            Page::Records => "Back Check Records",
            Page::Farmers => "Farmer Records",
            Page::Locations => "Woredas & Kebeles",
            Page::Login => "Login",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Page::BackCheckForm => "/back-check",
            Page::FarmerForm => "/farmers/new",
            Page::Records => "/records",
            Page::Farmers => "/farmers",
            Page::Locations => "/locations",
            Page::Login => "/login",
        }
    }

    /// Pages that need a login
    pub fn is_protected(self) -> bool {
        matches!(self, Page::Records | Page::Farmers | Page::Locations)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Warning,
    Error,
}

impl FlashKind {
    pub fn css_class(self) -> &'static str {
        match self {
            FlashKind::Success => "flash-success",
            FlashKind::Warning => "flash-warning",
            FlashKind::Error => "flash-error",
        }
    }
}

/// One-shot message shown above the page content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: FlashKind::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { kind: FlashKind::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: FlashKind::Error, message: message.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub page: Page,
    pub user: Option<String>,
    pub flashes: Vec<Flash>,
    /// Values to pre-fill the form with
    pub draft: FormValues,
    pub errors: Vec<FieldError>,
}

impl ViewState {
    pub fn new(page: Page) -> Self {
        Self { page, ..Self::default() }
    }

    pub fn with_user(self, user: Option<String>) -> Self {
        Self { user, ..self }
    }

    pub fn with_flash(mut self, flash: Flash) -> Self {
        self.flashes.push(flash);
        self
    }

    /// Keep submitted values and their field errors for re-rendering
    pub fn with_draft(self, draft: FormValues, errors: Vec<FieldError>) -> Self {
        Self { draft, errors, ..self }
    }

    pub fn draft_value(&self, field: &str) -> &str {
        self.draft.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}
