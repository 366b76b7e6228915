//! User model module
//!
//! The immutable user record shown by the browser, plus the wire DTOs of the
//! randomuser.me API that decode into it.
//!
//! # Overview
//!
//! - `UserRecord` - A single user; equality and hashing by `id`
//! - `UserPage` - One decoded API response (`results` + `info`)
//! - `distinct_names` - Diagnostic count of distinct display names

mod dto;
mod types;

pub use dto::{ApiInfo, UserPage};
pub use types::{
    distinct_names, Coordinates, Gender, Location, Name, Picture, PictureSize, Street, Timezone,
    UserRecord,
};
