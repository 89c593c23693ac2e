//! Key prefix generation.
//!
//! A prefix is the upload time at second precision plus a random token drawn
//! fresh for every upload, e.g. `20240102_030405_9f1c2a7b4e3d`. Prefixes sort
//! by upload time and two uploads in the same second still get distinct keys.

use chrono::{DateTime, Utc};
use lightbox_core::constants::{IDENTITY_TIMESTAMP_FORMAT, IDENTITY_TOKEN_LEN};
use lightbox_core::UniqueIdentity;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityGenerator;

impl IdentityGenerator {
    pub fn generate(&self) -> UniqueIdentity {
        self.generate_at(Utc::now())
    }

    pub fn generate_at(&self, now: DateTime<Utc>) -> UniqueIdentity {
        // The first 12 hex digits of a v4 UUID are all random bits.
        let mut token = Uuid::new_v4().simple().to_string();
        token.truncate(IDENTITY_TOKEN_LEN);

        UniqueIdentity {
            timestamp: now.format(IDENTITY_TIMESTAMP_FORMAT).to_string(),
            token,
        }
    }
}
