use std::env;

#[derive(Clone, Debug)]
pub struct Config {
	pub database_url: String,
	pub bind_addr: String,
	pub assets_dir: String,
}

impl Config {
	/// Reads settings from the environment, after `.env` has been loaded.
	pub fn from_env() -> Self {
		Self {
			database_url: env::var("DATABASE_URL")
				.unwrap_or_else(|_| "sqlite://bookshelf.db?mode=rwc".to_string()),
			bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
			assets_dir: env::var("ASSETS_DIR").unwrap_or_else(|_| "assets".to_string()),
		}
	}
}
