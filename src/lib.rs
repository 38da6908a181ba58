// bookshelf: a reading list kept in one persistent slot

pub mod config;
pub mod error;
pub mod sql;
pub mod store;
pub mod types;
pub mod web;

pub use error::{Result, ShelfError};
pub use store::Shelf;
pub use types::{Book, BookInput, ReadingStatus};
