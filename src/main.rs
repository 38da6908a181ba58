// bookshelf server

use bookshelf::{config::Config, sql, web, Shelf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	dotenvy::dotenv().ok();

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "bookshelf=debug,tower_http=info".into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	let config = Config::from_env();

	let slots = sql::open(&config.database_url).await?;
	let shelf = Shelf::hydrate(slots.clone()).await;
	let app = web::router(web::AppState::new(shelf, slots), &config.assets_dir);

	let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
	tracing::info!("listening on {}", listener.local_addr()?);
	axum::serve(listener, app).await?;

	Ok(())
}
