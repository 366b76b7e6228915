//! Seed generation
//!
//! A seed pins the remote source's pseudo-random sequence: the same
//! (page, page size, seed) always yields the same users.

use uuid::Uuid;

/// Fresh random seed
pub fn new_seed() -> String {
    Uuid::new_v4().to_string()
}
