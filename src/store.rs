//! The book collection and its mirror in the `bookList` slot.
//!
//! Every mutation rewrites the whole slot. A missing id is never an error:
//! `delete`, `update` and friends answer `Ok(false)` and leave the collection
//! as it was.

use uuid::Uuid;

use crate::error::Result;
use crate::sql::Slots;
use crate::types::{Book, BookId, BookInput, ReadingStatus};

pub const SLOT_KEY: &str = "bookList";

pub struct Shelf {
	slots: Slots,
	books: Vec<Book>,
}

impl Shelf {
	/// Loads the collection from its slot.
	///
	/// An absent or unreadable slot, or one that is not a JSON array of
	/// records, gives an empty shelf. Missing keys inside a record do not.
	pub async fn hydrate(slots: Slots) -> Self {
		let books = match slots.load(SLOT_KEY).await {
			Ok(Some(raw)) => match serde_json::from_str::<Vec<Book>>(&raw) {
				Ok(books) => books,
				Err(e) => {
					tracing::warn!("discarding unreadable {SLOT_KEY} slot: {e}");
					Vec::new()
				}
			},
			Ok(None) => Vec::new(),
			Err(e) => {
				tracing::warn!("can't read {SLOT_KEY} slot, starting empty: {e}");
				Vec::new()
			}
		};
		tracing::info!("hydrated {} books", books.len());

		Shelf { slots, books }
	}

	pub fn books(&self) -> &[Book] {
		&self.books
	}

	pub fn len(&self) -> usize {
		self.books.len()
	}

	pub fn is_empty(&self) -> bool {
		self.books.is_empty()
	}

	pub fn get(&self, id: &str) -> Option<&Book> {
		self.books.iter().find(|book| book.id == id)
	}

	/// Appends a new record, always as unread with no progress.
	///
	/// On a failed write the record is still on the shelf.
	pub async fn add(&mut self, input: BookInput) -> Result<Book> {
		let book = Book {
			id: new_id(),
			title: input.title,
			author: input.authors.join(", "),
			genre: input.genre,
			pages: input.pages,
			cover: input.cover,
			status: ReadingStatus::ToRead,
			read_pages: 0,
		};
		tracing::debug!(id = %book.id, title = %book.title, "adding book");
		self.books.push(book.clone());
		self.persist().await?;
		Ok(book)
	}

	pub async fn delete(&mut self, id: &str) -> Result<bool> {
		let found = match self.position(id) {
			Some(idx) => {
				self.books.remove(idx);
				true
			}
			None => {
				tracing::debug!(id, "delete of unknown book");
				false
			}
		};
		self.persist().await?;
		Ok(found)
	}

	/// Replaces the record with the same id, keeping its place in the list.
	pub async fn update(&mut self, book: Book) -> Result<bool> {
		let found = match self.position(&book.id) {
			Some(idx) => {
				self.books[idx] = book;
				true
			}
			None => {
				tracing::debug!(id = %book.id, "update of unknown book");
				false
			}
		};
		self.persist().await?;
		Ok(found)
	}

	pub async fn set_status(&mut self, id: &str, status: ReadingStatus) -> Result<bool> {
		match self.get(id) {
			Some(book) => {
				let book = Book {
					status,
					..book.clone()
				};
				self.update(book).await
			}
			None => {
				tracing::debug!(id, "status change of unknown book");
				Ok(false)
			}
		}
	}

	pub async fn record_progress(&mut self, id: &str, read_pages: i64) -> Result<bool> {
		match self.get(id) {
			Some(book) => {
				let book = Book {
					read_pages,
					..book.clone()
				};
				self.update(book).await
			}
			None => {
				tracing::debug!(id, "progress on unknown book");
				Ok(false)
			}
		}
	}

	/// Writes the whole collection to its slot.
	pub async fn persist(&self) -> Result<()> {
		let raw = serde_json::to_string(&self.books)?;
		self.slots.save(SLOT_KEY, &raw).await
	}

	fn position(&self, id: &str) -> Option<usize> {
		self.books.iter().position(|book| book.id == id)
	}
}

/// Fresh collision-free record id.
pub fn new_id() -> BookId {
	Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sql;
	use std::collections::HashSet;

	async fn empty_shelf() -> Shelf {
		let slots = sql::open("sqlite::memory:").await.unwrap();
		Shelf::hydrate(slots).await
	}

	fn input(title: &str) -> BookInput {
		BookInput {
			title: title.to_string(),
			authors: vec!["Someone".to_string()],
			genre: "Novel".to_string(),
			pages: "100".to_string(),
			cover: String::new(),
		}
	}

	fn dune() -> BookInput {
		BookInput {
			title: "Dune".to_string(),
			authors: vec!["Herbert".to_string()],
			genre: "SF".to_string(),
			pages: "412".to_string(),
			cover: String::new(),
		}
	}

	async fn stored(shelf: &Shelf) -> Option<String> {
		shelf.slots.load(SLOT_KEY).await.unwrap()
	}

	#[tokio::test]
	async fn adds_are_counted_and_found() {
		let mut shelf = empty_shelf().await;
		let mut ids = Vec::new();
		for n in 0..25 {
			ids.push(shelf.add(input(&format!("book {n}"))).await.unwrap().id);
		}
		assert_eq!(shelf.len(), 25);
		for (n, id) in ids.iter().enumerate() {
			assert_eq!(shelf.get(id).unwrap().title, format!("book {n}"));
		}
		let unique: HashSet<_> = ids.iter().collect();
		assert_eq!(unique.len(), ids.len());
	}

	#[tokio::test]
	async fn add_forces_unread_state() {
		let mut shelf = empty_shelf().await;
		let book = shelf.add(input("x")).await.unwrap();
		assert_eq!(book.status, ReadingStatus::ToRead);
		assert_eq!(book.read_pages, 0);
	}

	#[tokio::test]
	async fn add_joins_authors() {
		let mut shelf = empty_shelf().await;
		let mut book = input("Good Omens");
		book.authors = vec!["Pratchett".to_string(), "Gaiman".to_string()];
		let book = shelf.add(book).await.unwrap();
		assert_eq!(book.author, "Pratchett, Gaiman");
	}

	#[tokio::test]
	async fn unknown_ids_leave_collection_alone() {
		let mut shelf = empty_shelf().await;
		shelf.add(input("a")).await.unwrap();
		let b = shelf.add(input("b")).await.unwrap();
		let before = shelf.books().to_vec();

		assert!(!shelf.delete("missing").await.unwrap());
		assert_eq!(shelf.books(), &before[..]);

		let ghost = Book {
			id: "missing".to_string(),
			..b
		};
		assert!(!shelf.update(ghost).await.unwrap());
		assert_eq!(shelf.books(), &before[..]);

		assert!(!shelf.set_status("missing", ReadingStatus::Reading).await.unwrap());
		assert!(!shelf.record_progress("missing", 5).await.unwrap());
		assert_eq!(shelf.books(), &before[..]);
	}

	#[tokio::test]
	async fn update_keeps_position() {
		let mut shelf = empty_shelf().await;
		shelf.add(input("first")).await.unwrap();
		let middle = shelf.add(input("middle")).await.unwrap();
		shelf.add(input("last")).await.unwrap();

		let renamed = Book {
			title: "renamed".to_string(),
			..middle.clone()
		};
		assert!(shelf.update(renamed).await.unwrap());

		let titles: Vec<_> = shelf.books().iter().map(|b| b.title.as_str()).collect();
		assert_eq!(titles, ["first", "renamed", "last"]);
		assert_eq!(shelf.books()[1].id, middle.id);
	}

	#[tokio::test]
	async fn status_and_progress_touch_one_record() {
		let mut shelf = empty_shelf().await;
		let a = shelf.add(input("a")).await.unwrap();
		let b = shelf.add(input("b")).await.unwrap();

		assert!(shelf.set_status(&b.id, ReadingStatus::Reading).await.unwrap());
		assert!(shelf.record_progress(&b.id, 40).await.unwrap());

		assert_eq!(shelf.get(&a.id).unwrap(), &a);
		let b = shelf.get(&b.id).unwrap();
		assert!(b.status.is_reading());
		assert_eq!(b.read_pages, 40);
		assert_eq!(b.progress(), Some(40));

		let b_id = b.id.clone();
		assert!(shelf.set_status(&b_id, ReadingStatus::ToRead).await.unwrap());
		assert_eq!(shelf.get(&b_id).unwrap().status, ReadingStatus::ToRead);
	}

	#[tokio::test]
	async fn persist_then_hydrate_round_trips() {
		let slots = sql::open("sqlite::memory:").await.unwrap();
		let mut shelf = Shelf::hydrate(slots.clone()).await;
		let a = shelf.add(input("a")).await.unwrap();
		shelf.add(dune()).await.unwrap();
		shelf.set_status(&a.id, ReadingStatus::Reading).await.unwrap();
		shelf
			.update(Book {
				status: ReadingStatus::Other("прочитано".to_string()),
				..shelf.books()[1].clone()
			})
			.await
			.unwrap();

		let again = Shelf::hydrate(slots).await;
		assert_eq!(again.books(), shelf.books());
	}

	#[tokio::test]
	async fn hydrate_fails_open() {
		let slots = sql::open("sqlite::memory:").await.unwrap();
		assert!(Shelf::hydrate(slots.clone()).await.is_empty());

		slots.save(SLOT_KEY, "{not json").await.unwrap();
		assert!(Shelf::hydrate(slots.clone()).await.is_empty());

		slots.save(SLOT_KEY, r#"{"id":"1"}"#).await.unwrap();
		assert!(Shelf::hydrate(slots).await.is_empty());
	}

	#[tokio::test]
	async fn hydrate_keeps_records_with_missing_fields() {
		let slots = sql::open("sqlite::memory:").await.unwrap();
		let raw = r#"[{"id":"1","title":"Dune","author":"Herbert","pages":"412","status":"читаю"},{"title":"no id"}]"#;
		slots.save(SLOT_KEY, raw).await.unwrap();

		let mut shelf = Shelf::hydrate(slots.clone()).await;
		assert_eq!(shelf.len(), 2);
		let dune = shelf.get("1").unwrap();
		assert_eq!(dune.genre, "");
		assert!(dune.status.is_reading());
		assert_eq!(shelf.books()[1].title, "no id");
		assert!(!shelf.books()[1].id.is_empty());

		// the next write must not drop the old records
		shelf.add(input("new")).await.unwrap();
		let again = Shelf::hydrate(slots).await;
		let titles: Vec<_> = again.books().iter().map(|b| b.title.as_str()).collect();
		assert_eq!(titles, ["Dune", "no id", "new"]);
	}

	#[tokio::test]
	async fn hydrate_reads_browser_shaped_records() {
		let slots = sql::open("sqlite::memory:").await.unwrap();
		let raw = r#"[{"id":"1700000000000","title":"Dune","author":"Herbert","genre":"SF","pages":"412","cover":"","status":"читаю","readPages":12}]"#;
		slots.save(SLOT_KEY, raw).await.unwrap();

		let shelf = Shelf::hydrate(slots).await;
		let book = shelf.get("1700000000000").unwrap();
		assert!(book.status.is_reading());
		assert_eq!(book.read_pages, 12);
	}

	#[tokio::test]
	async fn dune_lifecycle() {
		let mut shelf = empty_shelf().await;
		let book = shelf.add(dune()).await.unwrap();
		assert_eq!(shelf.len(), 1);
		assert_eq!(book.status, ReadingStatus::ToRead);
		assert_eq!(book.read_pages, 0);
		assert_eq!(book.author, "Herbert");

		let reading = Book {
			status: ReadingStatus::Reading,
			..book.clone()
		};
		assert!(shelf.update(reading).await.unwrap());
		assert_eq!(shelf.books()[0].status, ReadingStatus::Reading);

		let raw = stored(&shelf).await.unwrap();
		assert!(raw.contains("\"status\":\"читаю\""));

		assert!(shelf.delete(&book.id).await.unwrap());
		assert!(shelf.is_empty());
		let raw = stored(&shelf).await.unwrap();
		let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
		assert_eq!(value, serde_json::json!([]));
	}

	#[test]
	fn ids_are_uuids() {
		let id = new_id();
		assert!(Uuid::parse_str(&id).is_ok());
		assert_ne!(id, new_id());
	}
}
