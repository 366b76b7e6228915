//! User record types
//!
//! These types are what the engine accumulates and what the stores persist.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single random user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Stable identifier
    pub id: String,
    /// Name parts
    pub name: Name,
    /// Gender as reported by the API
    pub gender: Gender,
    /// Email address
    pub email: String,
    /// Landline number
    pub phone: String,
    /// Mobile number
    pub cell: String,
    /// Picture URLs
    pub picture: Picture,
    /// Postal and geographic location
    pub location: Location,
}

impl UserRecord {
    /// Display name composed from the name parts
    pub fn full_name(&self) -> String {
        self.name.full()
    }

    /// Contact lines: email, phone and cell, one per line
    pub fn accessibilities(&self) -> String {
        format!("{}\n{}\n{}", self.email, self.phone, self.cell)
    }

    /// Multi-line postal address
    pub fn expanded_location(&self) -> String {
        let loc = &self.location;
        format!(
            "{} {}\n{} {}, {}\n{}",
            loc.street.number, loc.street.name, loc.postcode, loc.city, loc.state, loc.country
        )
    }

    /// Picture URL for the requested resolution
    pub fn picture(&self, size: PictureSize) -> &str {
        self.picture.url(size)
    }
}

impl PartialEq for UserRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for UserRecord {}

impl Hash for UserRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Name parts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    /// Honorific (Mr, Ms, Madame, ...)
    #[serde(default)]
    pub title: String,
    /// Given name
    pub first: String,
    /// Family name
    pub last: String,
}

impl Name {
    /// `"first last"`
    pub fn full(&self) -> String {
        format!("{} {}", self.first, self.last)
    }
}

/// Gender as reported by the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    #[serde(other)]
    Unspecified,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unspecified => "unspecified",
        };
        f.write_str(label)
    }
}

/// Available picture resolutions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureSize {
    /// 128x128
    Large,
    /// 72x72
    Medium,
    /// 48x48
    Thumbnail,
}

/// Picture URLs in several resolutions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    pub large: String,
    pub medium: String,
    pub thumbnail: String,
}

impl Picture {
    /// URL for a resolution
    pub fn url(&self, size: PictureSize) -> &str {
        match size {
            PictureSize::Large => &self.large,
            PictureSize::Medium => &self.medium,
            PictureSize::Thumbnail => &self.thumbnail,
        }
    }
}

/// Structured location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub street: Street,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postcode: String,
    #[serde(default)]
    pub coordinates: Coordinates,
    #[serde(default)]
    pub timezone: Timezone,
}

/// Street number and name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Street {
    pub number: u32,
    pub name: String,
}

/// Latitude/longitude, kept as the API's decimal strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: String,
    pub longitude: String,
}

/// UTC offset and a human description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timezone {
    pub offset: String,
    pub description: String,
}

/// Number of distinct display names among `records`.
///
/// Self-check that the source actually hands out different people; never
/// used to drop records.
pub fn distinct_names(records: &[UserRecord]) -> usize {
    records
        .iter()
        .map(UserRecord::full_name)
        .collect::<HashSet<_>>()
        .len()
}
