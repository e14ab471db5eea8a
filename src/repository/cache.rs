//! Query cache persisted in SQLite so the server and the console share it.

use chrono::{NaiveDateTime, Utc};
use diesel::dsl::count;
use diesel::prelude::*;
use diesel::upsert::excluded;

use crate::models::cache::{CacheEntry, NewCacheEntry, NewCacheTag};
use crate::repository::errors::RepositoryResult;
use crate::repository::{CacheReader, CacheStats, CacheWriter, DieselRepository};

impl CacheReader for DieselRepository {
    fn get_cache_value(&self, key: &str, now: NaiveDateTime) -> RepositoryResult<Option<String>> {
        use crate::schema::cache_entries;

        let mut conn = self.conn()?;
        let entry = cache_entries::table
            .filter(cache_entries::key.eq(key))
            .first::<CacheEntry>(&mut conn)
            .optional()?;

        Ok(entry
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value))
    }

    fn cache_stats(&self, now: NaiveDateTime) -> RepositoryResult<CacheStats> {
        use crate::schema::{cache_entries, cache_tags};

        let mut conn = self.conn()?;
        let entries: i64 = cache_entries::table.count().get_result(&mut conn)?;
        let expired: i64 = cache_entries::table
            .filter(cache_entries::expires_at.le(now))
            .count()
            .get_result(&mut conn)?;
        let tags: i64 = cache_tags::table
            .select(count(cache_tags::tag).aggregate_distinct())
            .first(&mut conn)?;

        Ok(CacheStats {
            entries: entries as usize,
            expired: expired as usize,
            tags: tags as usize,
        })
    }
}

impl CacheWriter for DieselRepository {
    fn put_cache_value(
        &self,
        key: &str,
        value: &str,
        expires_at: Option<NaiveDateTime>,
        tags: &[String],
    ) -> RepositoryResult<()> {
        use crate::schema::{cache_entries, cache_tags};

        let mut conn = self.conn()?;
        let entry = NewCacheEntry {
            key,
            value,
            expires_at,
            created_at: Utc::now().naive_utc(),
        };
        let tag_rows = tags
            .iter()
            .map(|tag| NewCacheTag {
                tag: tag.as_str(),
                key,
            })
            .collect::<Vec<_>>();

        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            diesel::insert_into(cache_entries::table)
                .values(&entry)
                .on_conflict(cache_entries::key)
                .do_update()
                .set((
                    cache_entries::value.eq(excluded(cache_entries::value)),
                    cache_entries::expires_at.eq(excluded(cache_entries::expires_at)),
                    cache_entries::created_at.eq(excluded(cache_entries::created_at)),
                ))
                .execute(conn)?;

            diesel::delete(cache_tags::table.filter(cache_tags::key.eq(key))).execute(conn)?;
            if !tag_rows.is_empty() {
                diesel::insert_or_ignore_into(cache_tags::table)
                    .values(&tag_rows)
                    .execute(conn)?;
            }
            Ok(())
        })?;

        Ok(())
    }

    fn forget_cache_value(&self, key: &str) -> RepositoryResult<bool> {
        use crate::schema::cache_entries;

        let mut conn = self.conn()?;
        let affected = diesel::delete(cache_entries::table.filter(cache_entries::key.eq(key)))
            .execute(&mut conn)?;
        Ok(affected > 0)
    }

    fn flush_cache_tags(&self, tags: &[String]) -> RepositoryResult<usize> {
        use crate::schema::{cache_entries, cache_tags};

        if tags.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let tagged_keys = cache_tags::table
            .filter(cache_tags::tag.eq_any(tags))
            .select(cache_tags::key);
        let affected =
            diesel::delete(cache_entries::table.filter(cache_entries::key.eq_any(tagged_keys)))
                .execute(&mut conn)?;
        Ok(affected)
    }

    fn flush_cache(&self) -> RepositoryResult<usize> {
        use crate::schema::{cache_entries, cache_tags};

        let mut conn = self.conn()?;
        let affected = conn.transaction::<usize, diesel::result::Error, _>(|conn| {
            diesel::delete(cache_tags::table).execute(conn)?;
            diesel::delete(cache_entries::table).execute(conn)
        })?;
        Ok(affected)
    }

    fn prune_expired_cache(&self, now: NaiveDateTime) -> RepositoryResult<usize> {
        use crate::schema::cache_entries;

        let mut conn = self.conn()?;
        let affected =
            diesel::delete(cache_entries::table.filter(cache_entries::expires_at.le(now)))
                .execute(&mut conn)?;
        Ok(affected)
    }
}
