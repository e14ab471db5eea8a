//! Diesel models for the keyed query cache store.

use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::cache_entries)]
#[diesel(primary_key(key))]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub expires_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl CacheEntry {
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::cache_entries)]
pub struct NewCacheEntry<'a> {
    pub key: &'a str,
    pub value: &'a str,
    pub expires_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::cache_tags)]
pub struct NewCacheTag<'a> {
    pub tag: &'a str,
    pub key: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(expires_at: Option<NaiveDateTime>) -> CacheEntry {
        CacheEntry {
            key: "dashboard.stats".into(),
            value: "{}".into(),
            expires_at,
            created_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn entries_without_expiry_never_expire() {
        assert!(!entry(None).is_expired(NaiveDateTime::MAX));
    }

    #[test]
    fn entry_expires_at_its_deadline() {
        let now = NaiveDateTime::default();
        assert!(entry(Some(now)).is_expired(now));
        assert!(!entry(Some(now + Duration::seconds(1))).is_expired(now));
    }
}
