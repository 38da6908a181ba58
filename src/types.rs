use serde::{Deserialize, Serialize};

pub type BookId = String;

/// Stored label of a book the reader plans to read.
pub const TO_READ: &str = "буду читать";
/// Stored label of a book the reader is reading now.
pub const READING: &str = "читаю";

/// Reading state of a record.
///
/// Serialized as the bare label string. Labels other than the two known
/// ones are kept verbatim so a hand-edited slot survives a round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReadingStatus {
	#[default]
	ToRead,
	Reading,
	Other(String),
}

impl From<String> for ReadingStatus {
	fn from(label: String) -> Self {
		match label.as_str() {
			TO_READ => ReadingStatus::ToRead,
			READING => ReadingStatus::Reading,
			_ => ReadingStatus::Other(label),
		}
	}
}

impl From<ReadingStatus> for String {
	fn from(status: ReadingStatus) -> Self {
		match status {
			ReadingStatus::ToRead => TO_READ.to_string(),
			ReadingStatus::Reading => READING.to_string(),
			ReadingStatus::Other(label) => label,
		}
	}
}

impl std::fmt::Display for ReadingStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			ReadingStatus::ToRead => f.write_str(TO_READ),
			ReadingStatus::Reading => f.write_str(READING),
			ReadingStatus::Other(label) => f.write_str(label),
		}
	}
}

impl ReadingStatus {
	pub fn is_reading(&self) -> bool {
		matches!(self, ReadingStatus::Reading)
	}

	// values posted by the status buttons
	pub fn from_form(value: &str) -> Option<Self> {
		match value {
			"reading" => Some(ReadingStatus::Reading),
			"to-read" => Some(ReadingStatus::ToRead),
			_ => None,
		}
	}
}

/// One record of the collection, stored with the same keys it is shown with.
///
/// Every key may be missing from a stored record; a record without an id
/// gets a fresh one so it stays addressable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
	#[serde(default = "crate::store::new_id")]
	pub id: BookId,
	#[serde(default)]
	pub title: String,
	/// Author names joined with `", "`.
	#[serde(default)]
	pub author: String,
	#[serde(default)]
	pub genre: String,
	/// Page count as typed into the form, not validated.
	#[serde(default, deserialize_with = "text_or_number")]
	pub pages: String,
	/// `/covers/<sha256>` or empty.
	#[serde(default)]
	pub cover: String,
	#[serde(default)]
	pub status: ReadingStatus,
	#[serde(rename = "readPages", default)]
	pub read_pages: i64,
}

// pages may have been stored as a bare number
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: serde::Deserializer<'de>,
{
	Ok(match serde_json::Value::deserialize(deserializer)? {
		serde_json::Value::String(text) => text,
		serde_json::Value::Null => String::new(),
		other => other.to_string(),
	})
}

impl Book {
	/// Share of the book already read, in whole percent.
	///
	/// `None` when the page count is not a positive number.
	pub fn progress(&self) -> Option<i64> {
		let pages: f64 = self.pages.trim().parse().ok()?;
		if !pages.is_finite() || pages <= 0.0 {
			return None;
		}
		Some((self.read_pages as f64 / pages * 100.0).round() as i64)
	}

	pub fn has_cover(&self) -> bool {
		!self.cover.is_empty()
	}
}

/// Fields of the creation form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookInput {
	pub title: String,
	pub authors: Vec<String>,
	pub genre: String,
	pub pages: String,
	pub cover: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
	pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ProgressForm {
	pub read_pages: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
	/// Number of author inputs to render in the creation form.
	pub authors: Option<usize>,
}
