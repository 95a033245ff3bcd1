use diesel::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Queryable, Selectable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::identities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Identity {
    pub id: i32,
    pub traits: JsonValue,
    pub is_staff: bool,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::identities)]
pub struct NewIdentity {
    pub traits: JsonValue,
    pub is_staff: bool,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl Identity {
    pub fn new_with_traits(traits: Traits, is_staff: bool) -> NewIdentity {
        let now = chrono::Utc::now().naive_utc();
        NewIdentity {
            traits: JsonValue::from(&traits),
            is_staff,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name shown next to the identity's comments.
    pub fn display_name(&self) -> String {
        display_name_from_traits(&self.traits)
    }
}

pub fn display_name_from_traits(traits: &JsonValue) -> String {
    traits
        .get("name")
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("Anonymous")
        .to_string()
}

#[derive(Clone, Debug, Default)]
pub struct Traits {
    pub email: Option<String>,
    pub name: Option<String>,
}

impl From<&Traits> for JsonValue {
    fn from(t: &Traits) -> Self {
        serde_json::json!({
            "email": t.email,
            "name": t.name,
        })
    }
}
