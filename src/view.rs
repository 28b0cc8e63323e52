//! View modes and the displayed-contacts transform.

use crate::contact::Contact;

pub const DEFAULT_COUNTRY: &str = "United States";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    All,
    /// Restricted to a single country
    Us,
}

impl ViewMode {
    pub const ALL: [ViewMode; 2] = [ViewMode::All, ViewMode::Us];

    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment.trim().to_ascii_lowercase().as_str() {
            "all" => Some(ViewMode::All),
            "us" => Some(ViewMode::Us),
            _ => None,
        }
    }

    /// View mode selected by the last path component of a route.
    ///
    /// Any segment other than `us` shows every contact.
    pub fn from_path(path: &str) -> Self {
        path.trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(Self::from_segment)
            .unwrap_or_default()
    }

    pub fn segment(self) -> &'static str {
        match self {
            ViewMode::All => "all",
            ViewMode::Us => "us",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewMode::All => "All Contacts",
            ViewMode::Us => "US Contacts",
        }
    }

    pub fn restricts_country(self) -> bool {
        matches!(self, ViewMode::Us)
    }
}

/// Derive the displayed contacts without touching the accumulated ones.
///
/// Even-position filtering (1-based positions 2, 4, ...) runs first, then
/// the country restriction for modes that need it.
pub fn visible_contacts<'a>(
    contacts: &'a [Contact],
    mode: ViewMode,
    only_even: bool,
    country: &str,
) -> Vec<&'a Contact> {
    contacts
        .iter()
        .enumerate()
        .filter(|(i, _)| !only_even || (i + 1) % 2 == 0)
        .map(|(_, contact)| contact)
        .filter(|contact| !mode.restricts_country() || contact.country.name == country)
        .collect()
}
