use std::str::FromStr;
use std::time::Duration;

use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::Result;

pub const TABLE_SCHEMA: &[&str] = &[
	r#"
CREATE TABLE IF NOT EXISTS slots (
	key TEXT NOT NULL PRIMARY KEY,
	value TEXT NOT NULL,
	updated_at TEXT NOT NULL
);
"#,
	r#"
CREATE TABLE IF NOT EXISTS covers (
	hash TEXT NOT NULL PRIMARY KEY,
	mime TEXT NOT NULL,
	bytes BLOB NOT NULL,
	CHECK(length(hash) == 64)
);
"#,
];

/// Named key-value slots and the cover blobs they point at.
#[derive(Clone, Debug)]
pub struct Slots(SqlitePool);

pub async fn open(database_url: &str) -> Result<Slots> {
	let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

	// an in-memory database lives and dies with its single connection
	let pool = if database_url.contains(":memory:") {
		SqlitePoolOptions::new()
			.max_connections(1)
			.idle_timeout(None)
			.max_lifetime(None)
	} else {
		SqlitePoolOptions::new().max_connections(5)
	}
	.acquire_timeout(Duration::from_secs(3))
	.connect_with(options)
	.await?;

	for statement in TABLE_SCHEMA {
		sqlx::query(statement).execute(&pool).await?;
	}
	tracing::debug!("slot store ready at {database_url}");

	Ok(Slots(pool))
}

impl Slots {
	pub fn pool(&self) -> &SqlitePool {
		&self.0
	}

	/// Raw text of a slot, `None` when it was never written.
	pub async fn load(&self, key: &str) -> Result<Option<String>> {
		let row: Option<(String,)> = sqlx::query_as("SELECT value FROM slots WHERE key = ?")
			.bind(key)
			.fetch_optional(&self.0)
			.await?;
		Ok(row.map(|(value,)| value))
	}

	/// Overwrites the slot with `value`.
	pub async fn save(&self, key: &str, value: &str) -> Result<()> {
		let now = chrono::Utc::now().to_rfc3339();
		sqlx::query(
			r#"
INSERT INTO slots (key, value, updated_at)
VALUES (?, ?, ?)
ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
			"#,
		)
		.bind(key)
		.bind(value)
		.bind(now)
		.execute(&self.0)
		.await?;
		Ok(())
	}

	// on Ok returns the content hash the cover is stored under
	pub async fn put_cover(&self, bytes: &[u8], mime: &str) -> Result<String> {
		let hash = hex::encode(Sha256::digest(bytes));
		sqlx::query("INSERT OR IGNORE INTO covers (hash, mime, bytes) VALUES (?, ?, ?)")
			.bind(&hash)
			.bind(mime)
			.bind(bytes)
			.execute(&self.0)
			.await?;
		Ok(hash)
	}

	/// Content type and bytes of a stored cover.
	pub async fn cover(&self, hash: &str) -> Result<Option<(String, Vec<u8>)>> {
		let row: Option<(String, Vec<u8>)> =
			sqlx::query_as("SELECT mime, bytes FROM covers WHERE hash = ?")
				.bind(hash)
				.fetch_optional(&self.0)
				.await?;
		Ok(row)
	}
}
