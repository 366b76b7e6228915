//! randomuser.me wire format
//!
//! The API answers either `{"results": [...], "info": {...}}` or
//! `{"error": "..."}`. Postcodes arrive as numbers for some nationalities and
//! as strings for others.

use super::types::{Coordinates, Gender, Location, Name, Picture, Street, Timezone, UserRecord};
use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One decoded API response
#[derive(Debug, Clone)]
pub struct UserPage {
    /// Users in response order
    pub users: Vec<UserRecord>,
    /// Paging echo from the API, when present
    pub info: Option<ApiInfo>,
}

impl UserPage {
    /// Decode a response body
    pub fn from_json(body: &str) -> Result<Self> {
        let envelope: Envelope = serde_json::from_str(body)
            .map_err(|e| Error::decode(format!("Invalid user payload: {e}")))?;

        if let Some(message) = envelope.error {
            return Err(Error::api(message));
        }

        let results = envelope
            .results
            .ok_or_else(|| Error::decode("Response has neither 'results' nor 'error'"))?;

        Ok(Self {
            users: results.into_iter().map(UserRecord::from).collect(),
            info: envelope.info,
        })
    }
}

/// The `info` block echoed by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiInfo {
    pub seed: String,
    pub results: usize,
    pub page: usize,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    results: Option<Vec<ApiUser>>,
    #[serde(default)]
    info: Option<ApiInfo>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ApiUser {
    #[serde(default)]
    gender: Gender,
    name: Name,
    location: ApiLocation,
    email: String,
    #[serde(default)]
    login: Option<ApiLogin>,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    cell: String,
    picture: Picture,
}

#[derive(Deserialize)]
struct ApiLogin {
    uuid: String,
}

#[derive(Deserialize)]
struct ApiLocation {
    street: Street,
    city: String,
    state: String,
    country: String,
    #[serde(deserialize_with = "string_or_number")]
    postcode: String,
    #[serde(default)]
    coordinates: Coordinates,
    #[serde(default)]
    timezone: Timezone,
}

impl From<ApiUser> for UserRecord {
    fn from(user: ApiUser) -> Self {
        let id = user.login.map_or_else(|| user.email.clone(), |login| login.uuid);
        Self {
            id,
            name: user.name,
            gender: user.gender,
            email: user.email,
            phone: user.phone,
            cell: user.cell,
            picture: user.picture,
            location: Location {
                street: user.location.street,
                city: user.location.city,
                state: user.location.state,
                country: user.location.country,
                postcode: user.location.postcode,
                coordinates: user.location.coordinates,
                timezone: user.location.timezone,
            },
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}
