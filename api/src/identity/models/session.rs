use std::ops::Add;

use base64::Engine;
use diesel::prelude::*;

#[derive(Queryable, Selectable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Session {
    pub id: i32,
    pub token: String,
    pub active: bool,
    pub issued_at: chrono::NaiveDateTime,
    pub expires_at: chrono::NaiveDateTime,
    pub identity_id: i32,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::sessions)]
pub struct NewSession {
    pub token: String,
    pub active: bool,
    pub issued_at: chrono::NaiveDateTime,
    pub expires_at: chrono::NaiveDateTime,
    pub identity_id: i32,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

pub const SESSION_TOKEN_PREFIX: &str = "nws_";

impl Session {
    pub fn new_with_identity_id(identity_id: i32) -> NewSession {
        let session_bytes: [u8; 96] = std::array::from_fn(|_| rand::random::<u8>());

        let token = SESSION_TOKEN_PREFIX.to_owned()
            + &base64::engine::general_purpose::STANDARD.encode(session_bytes);

        let now = chrono::Utc::now().naive_utc();

        NewSession {
            active: true,
            token,
            issued_at: now,
            expires_at: now.add(chrono::Duration::try_days(365).unwrap_or_else(|| {
                tracing::error!("Could not convert 365 to days, using default");
                chrono::Duration::default()
            })),
            identity_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// A session authenticates only while active and inside its validity window.
    pub fn is_valid_at(&self, now: chrono::NaiveDateTime) -> bool {
        self.active && self.issued_at <= now && self.expires_at > now
    }
}
