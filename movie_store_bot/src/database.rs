use std::str::FromStr;

use bot_commons::useful_methods::FileKind;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
pub use sqlx::Error;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Executor, Row, Sqlite,
};
use teloxide::types::UserId;

use crate::types::{MediaRecord, NewMedia, ShortId, UserRecord};

type Pool = sqlx::Pool<Sqlite>;

/// How many times to draw a new short ID if the drawn one is taken.
const SHORT_ID_ATTEMPTS: usize = 5;

pub struct Database {
    pool: Pool,
}

impl Database {
    /// Open the database at `url`.
    ///
    /// Connections are made lazily, so an unreachable database is not an error here. If the
    /// tables can't be set up right away, that is logged and left for the requests to stumble on.
    ///
    /// # Errors
    ///
    /// Fails if `url` is not a valid SQLite URL.
    pub async fn new(url: &str) -> Result<Database, Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .pragma("cache_size", "-32768")
            .busy_timeout(std::time::Duration::from_secs(600));

        let pool = SqlitePoolOptions::new()
            .max_connections(32)
            .connect_lazy_with(options);

        let database = Database { pool };

        match database.create_tables().await {
            Ok(()) => log::info!("Database is ready."),
            Err(e) => log::error!("Failed to set up the database: {e}"),
        }

        Ok(database)
    }

    async fn create_tables(&self) -> Result<(), Error> {
        // USERS:
        // id (Telegram user ID, i64 because sqlite doesn't support u64)
        // first_name (string)
        // points, referrals (non-negative integers)
        // joined_at (date+time in UTC)
        self.pool
            .execute(sqlx::query(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY NOT NULL,
                    first_name TEXT NOT NULL,
                    points INTEGER NOT NULL DEFAULT 0,
                    referrals INTEGER NOT NULL DEFAULT 0,
                    joined_at TEXT NOT NULL
                ) STRICT;",
            ))
            .await?;

        // MEDIA:
        // id (key, insertion order)
        // short_id (public random ID, unique, case sensitive)
        // file_ref (Telegram file ID)
        // kind ("document" or "video")
        // name (cleaned up file name)
        // caption (may be NULL)
        // views (non-negative integer)
        // added_at (date+time in UTC)
        self.pool
            .execute(sqlx::query(
                "CREATE TABLE IF NOT EXISTS media (
                    id INTEGER PRIMARY KEY NOT NULL,
                    short_id TEXT NOT NULL UNIQUE,
                    file_ref TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    name TEXT NOT NULL,
                    caption TEXT NULL,
                    views INTEGER NOT NULL DEFAULT 0,
                    added_at TEXT NOT NULL
                ) STRICT;",
            ))
            .await?;

        self.pool
            .execute(sqlx::query(
                "CREATE INDEX IF NOT EXISTS media_views ON media(views);",
            ))
            .await?;

        Ok(())
    }

    /// Close every connection. Anything asked of the database afterwards fails.
    #[cfg(test)]
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Insert a user unless they're already known.
    /// Returns `true` if this call is what created them.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn insert_user_if_absent(
        &self,
        id: UserId,
        first_name: &str,
        joined_at: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            "INSERT INTO users(id, first_name, joined_at)
            VALUES (?, ?, ?)
        ON CONFLICT(id) DO NOTHING;",
        )
        .bind(id.0 as i64)
        .bind(first_name)
        .bind(joined_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    #[allow(clippy::cast_possible_wrap)]
    pub async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>, Error> {
        let row = sqlx::query(
            "SELECT id, first_name, points, referrals, joined_at FROM users WHERE id=?;",
        )
        .bind(id.0 as i64)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Give a referrer one point and one referral, in one statement.
    /// Returns `false` if there's no such user.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn credit_referral(&self, referrer: UserId) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE users SET points=points+1, referrals=referrals+1 WHERE id=?;",
        )
        .bind(referrer.0 as i64)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[allow(clippy::cast_sign_loss)]
    pub async fn all_user_ids(&self) -> Result<Vec<UserId>, Error> {
        sqlx::query("SELECT id FROM users ORDER BY joined_at, id;")
            .map(|row: SqliteRow| UserId(row.get::<i64, _>(0) as u64))
            .fetch_all(&self.pool)
            .await
    }

    pub async fn count_users(&self) -> Result<u64, Error> {
        count(&self.pool, "SELECT COUNT(*) FROM users;").await
    }

    pub async fn count_media(&self) -> Result<u64, Error> {
        count(&self.pool, "SELECT COUNT(*) FROM media;").await
    }

    /// Store a new media file under a freshly drawn short ID.
    pub async fn insert_media(
        &self,
        media: &NewMedia,
        added_at: DateTime<Utc>,
    ) -> Result<MediaRecord, Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let short_id = ShortId::generate();

            let result = sqlx::query(
                "INSERT INTO media(short_id, file_ref, kind, name, caption, added_at)
                VALUES (?, ?, ?, ?, ?, ?);",
            )
            .bind(short_id.as_str())
            .bind(&media.file_ref)
            .bind(media.kind.as_str())
            .bind(&media.name)
            .bind(media.caption.as_deref())
            .bind(added_at)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => {
                    return Ok(MediaRecord {
                        short_id,
                        file_ref: media.file_ref.clone(),
                        kind: media.kind,
                        name: media.name.clone(),
                        caption: media.caption.clone(),
                        views: 0,
                        added_at,
                    });
                }
                Err(Error::Database(e))
                    if e.is_unique_violation() && attempt < SHORT_ID_ATTEMPTS =>
                {
                    log::warn!("Short ID {short_id} is already taken, drawing another one.");
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn find_media(&self, short_id: &str) -> Result<Option<MediaRecord>, Error> {
        let row = sqlx::query(concat!(
            "SELECT short_id, file_ref, kind, name, caption, views, added_at ",
            "FROM media WHERE short_id=?;"
        ))
        .bind(short_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(media_from_row).transpose()
    }

    /// Bump the view counter of a media file by one, in one statement.
    /// Returns `false` if there's no such file.
    pub async fn record_view(&self, short_id: &ShortId) -> Result<bool, Error> {
        let result = sqlx::query("UPDATE media SET views=views+1 WHERE short_id=?;")
            .bind(short_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Most viewed media first. Ties go by insertion order.
    pub async fn most_viewed(&self, limit: u32) -> Result<Vec<MediaRecord>, Error> {
        let rows = sqlx::query(concat!(
            "SELECT short_id, file_ref, kind, name, caption, views, added_at ",
            "FROM media ORDER BY views DESC, id ASC LIMIT ?;"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(media_from_row).collect()
    }

    /// Uniformly random sample of media.
    pub async fn random_media(&self, limit: u32) -> Result<Vec<MediaRecord>, Error> {
        let rows = sqlx::query(concat!(
            "SELECT short_id, file_ref, kind, name, caption, views, added_at ",
            "FROM media ORDER BY RANDOM() LIMIT ?;"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(media_from_row).collect()
    }

    /// Media whose name contains `needle`, ignoring case, in insertion order.
    pub async fn media_named_like(
        &self,
        needle: &str,
        limit: usize,
    ) -> Result<Vec<MediaRecord>, Error> {
        // SQLite's own lower() and LIKE only know about ASCII,
        // so do the matching here to get it right for every script.
        let needle = needle.to_lowercase();
        let mut found = Vec::new();

        let mut rows = sqlx::query(concat!(
            "SELECT short_id, file_ref, kind, name, caption, views, added_at ",
            "FROM media ORDER BY id ASC;"
        ))
        .fetch(&self.pool);

        while let Some(row) = rows.try_next().await? {
            let name: String = row.try_get("name")?;
            if !name.to_lowercase().contains(&needle) {
                continue;
            }
            found.push(media_from_row(&row)?);
            if found.len() >= limit {
                break;
            }
        }

        Ok(found)
    }
}

async fn count(pool: &Pool, query: &str) -> Result<u64, Error> {
    let count: i64 = sqlx::query(query)
        .fetch_one(pool)
        .await?
        .try_get(0)?;
    Ok(count.try_into().unwrap_or(0))
}

#[allow(clippy::cast_sign_loss)]
fn user_from_row(row: &SqliteRow) -> Result<UserRecord, Error> {
    Ok(UserRecord {
        id: UserId(row.try_get::<i64, _>("id")? as u64),
        first_name: row.try_get("first_name")?,
        points: row.try_get("points")?,
        referrals: row.try_get("referrals")?,
        joined_at: row.try_get("joined_at")?,
    })
}

fn media_from_row(row: &SqliteRow) -> Result<MediaRecord, Error> {
    let kind: String = row.try_get("kind")?;
    let kind = FileKind::from_name(&kind).ok_or_else(|| Error::ColumnDecode {
        index: String::from("kind"),
        source: format!("unknown media kind: {kind}").into(),
    })?;

    Ok(MediaRecord {
        short_id: ShortId::from_stored(row.try_get("short_id")?),
        file_ref: row.try_get("file_ref")?,
        kind,
        name: row.try_get("name")?,
        caption: row.try_get("caption")?,
        views: row.try_get("views")?,
        added_at: row.try_get("added_at")?,
    })
}
