use axum::{
	extract::multipart::MultipartError,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShelfError>;

#[derive(Error, Debug)]
pub enum ShelfError {
	/// Slot or cover store failure
	#[error("Database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error(transparent)]
	Serialization(#[from] serde_json::Error),

	#[error("{entity} not found: {id}")]
	NotFound { entity: String, id: String },

	#[error("Invalid input: {0}")]
	InvalidInput(String),
}

impl ShelfError {
	pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
		Self::NotFound {
			entity: entity.into(),
			id: id.into(),
		}
	}

	pub fn status(&self) -> StatusCode {
		match self {
			ShelfError::NotFound { .. } => StatusCode::NOT_FOUND,
			ShelfError::InvalidInput(_) => StatusCode::BAD_REQUEST,
			ShelfError::Database(_) | ShelfError::Serialization(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}
}

impl From<MultipartError> for ShelfError {
	fn from(err: MultipartError) -> Self {
		Self::InvalidInput(err.body_text())
	}
}

impl IntoResponse for ShelfError {
	fn into_response(self) -> Response {
		let status = self.status();
		if status.is_server_error() {
			tracing::error!("{self}");
		} else {
			tracing::debug!("{self}");
		}
		(status, self.to_string()).into_response()
	}
}
