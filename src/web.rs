// bookshelf pages

use std::sync::Arc;

use axum::{
	extract::{DefaultBodyLimit, Multipart, Path, Query, State},
	http::header,
	response::{IntoResponse, Redirect},
	routing::{get, post},
	Form, Router,
};
use maud::{html, Markup, DOCTYPE};
use tokio::sync::Mutex;
use tower_cookies::{Cookie, CookieManagerLayer, Cookies};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::error::{Result, ShelfError};
use crate::sql::Slots;
use crate::store::Shelf;
use crate::types::{Book, BookInput, ListParams, ProgressForm, ReadingStatus, StatusForm};

const NOTICE_COOKIE: &str = "notice";
const MAX_AUTHOR_FIELDS: usize = 16;
const MAX_UPLOAD: usize = 10 * 1024 * 1024;

pub type SharedShelf = Arc<Mutex<Shelf>>;

#[derive(Clone)]
pub struct AppState {
	pub shelf: SharedShelf,
	pub slots: Slots,
}

impl AppState {
	pub fn new(shelf: Shelf, slots: Slots) -> Self {
		AppState {
			shelf: Arc::new(Mutex::new(shelf)),
			slots,
		}
	}
}

pub fn router(state: AppState, assets_dir: &str) -> Router {
	Router::new()
		.route("/", get(display_all))
		.route(
			"/books",
			post(perform_add).layer(DefaultBodyLimit::max(MAX_UPLOAD)),
		)
		.route("/books/:id/delete", post(perform_delete))
		.route("/books/:id/status", post(perform_status))
		.route("/books/:id/progress", post(perform_progress))
		.route("/covers/:hash", get(serve_cover))
		.nest_service("/static", ServeDir::new(assets_dir))
		.layer(CookieManagerLayer::new())
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

/// One-shot message shown on the next page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notice {
	Missing,
	SaveFailed,
}

impl Notice {
	// cookie values stay ascii
	fn code(self) -> &'static str {
		match self {
			Notice::Missing => "missing",
			Notice::SaveFailed => "save-failed",
		}
	}

	fn from_code(code: &str) -> Option<Self> {
		match code {
			"missing" => Some(Notice::Missing),
			"save-failed" => Some(Notice::SaveFailed),
			_ => None,
		}
	}

	fn text(self) -> &'static str {
		match self {
			Notice::Missing => "Книга не найдена",
			Notice::SaveFailed => "Не удалось сохранить список книг",
		}
	}
}

fn flash(cookies: &Cookies, notice: Notice) {
	let mut cookie = Cookie::new(NOTICE_COOKIE, notice.code());
	cookie.set_path("/");
	cookies.add(cookie);
}

fn take_notice(cookies: &Cookies) -> Option<Notice> {
	let code = cookies.get(NOTICE_COOKIE)?.value().to_string();
	let mut cookie = Cookie::new(NOTICE_COOKIE, "");
	cookie.set_path("/");
	cookies.remove(cookie);
	Notice::from_code(&code)
}

// turns the outcome of a mutation into a notice for the next page
fn settle(cookies: &Cookies, outcome: Result<bool>) -> Redirect {
	match outcome {
		Ok(true) => {}
		Ok(false) => flash(cookies, Notice::Missing),
		Err(e) => {
			tracing::error!("can't persist shelf: {e}");
			flash(cookies, Notice::SaveFailed);
		}
	}
	Redirect::to("/")
}

async fn display_all(
	State(state): State<AppState>,
	cookies: Cookies,
	Query(params): Query<ListParams>,
) -> Markup {
	let notice = take_notice(&cookies);
	let shelf = state.shelf.lock().await;
	let author_fields = params.authors.unwrap_or(1).clamp(1, MAX_AUTHOR_FIELDS);

	page(html! {
		@if let Some(notice) = notice {
			p class="notice" { (notice.text()) }
		}
		h2 { "Список книг" }
		@if shelf.is_empty() {
			p { "Список книг пуст" }
		} @else {
			ul class="books" {
				@for book in shelf.books() {
					(book_card(book))
				}
			}
		}
		h2 { "Добавить книгу" }
		(book_form(author_fields))
	})
}

fn page(body: Markup) -> Markup {
	html! {
		(DOCTYPE)
		html {
			head {
				meta charset="utf-8";
				title { "Книжная полка" }
				link rel="stylesheet" href="/static/shelf.css";
			}
			body { main { (body) } }
		}
	}
}

fn book_card(book: &Book) -> Markup {
	html! {
		li class="book" {
			h3 { (book.title) }
			p { "Автор: " (book.author) }
			p { "Жанр: " (book.genre) }
			p { "Количество страниц: " (book.pages) }
			p { "Статус: " (book.status) }
			@if book.has_cover() {
				img src=(book.cover) alt={ "Обложка книги \"" (book.title) "\"" };
			}
			form method="POST" action={ "/books/" (book.id) "/delete" } {
				button class="delete" { "Удалить" }
			}
			form method="POST" action={ "/books/" (book.id) "/status" } {
				input type="hidden" name="status" value="reading";
				button class="reading" { "Читаю" }
			}
			form method="POST" action={ "/books/" (book.id) "/status" } {
				input type="hidden" name="status" value="to-read";
				button class="to-read" { "Буду читать" }
			}
			@if book.status.is_reading() {
				p {
					"Прочитано страниц: " (book.read_pages) "/" (book.pages)
					@if let Some(percent) = book.progress() {
						" (" (percent) "%)"
					}
				}
				form method="POST" action={ "/books/" (book.id) "/progress" } {
					input type="number" name="read_pages" min="0" value=(book.read_pages);
					button { "Отметить" }
				}
			}
		}
	}
}

fn book_form(author_fields: usize) -> Markup {
	html! {
		form method="POST" action="/books" enctype="multipart/form-data" {
			label for="title" { "Название книги:" }
			input type="text" id="title" name="title";
			@for idx in 1..=author_fields {
				label for={ "author" (idx) } { "Автор " (idx) ":" }
				input type="text" id={ "author" (idx) } name="author";
			}
			@if author_fields < MAX_AUTHOR_FIELDS {
				a class="button" href={ "/?authors=" (author_fields + 1) } { "Добавить автора" }
			}
			label for="genre" { "Жанр:" }
			input type="text" id="genre" name="genre";
			label for="pages" { "Количество страниц:" }
			input type="number" id="pages" name="pages";
			label for="cover" { "Обложка:" }
			input type="file" id="cover" name="cover" accept="image/*";
			button type="submit" { "Добавить" }
		}
	}
}

#[axum::debug_handler]
async fn perform_add(
	State(state): State<AppState>,
	cookies: Cookies,
	mut multipart: Multipart,
) -> Result<Redirect> {
	let mut input = BookInput::default();

	while let Some(field) = multipart.next_field().await? {
		let name = field.name().unwrap_or_default().to_string();
		match name.as_str() {
			"title" => input.title = field.text().await?,
			"author" => {
				let author = field.text().await?;
				// blank extra author inputs are not authors
				if !author.trim().is_empty() {
					input.authors.push(author);
				}
			}
			"genre" => input.genre = field.text().await?,
			"pages" => input.pages = field.text().await?,
			"cover" => {
				let mime = field
					.content_type()
					.unwrap_or("application/octet-stream")
					.to_string();
				let bytes = field.bytes().await?;
				if !bytes.is_empty() {
					if !mime.starts_with("image/") {
						return Err(ShelfError::InvalidInput(format!(
							"cover must be an image, got {mime}"
						)));
					}
					let hash = state.slots.put_cover(&bytes, &mime).await?;
					input.cover = format!("/covers/{hash}");
				}
			}
			other => tracing::debug!("ignoring form field {other}"),
		}
	}

	let mut shelf = state.shelf.lock().await;
	let outcome = shelf.add(input).await.map(|_| true);
	Ok(settle(&cookies, outcome))
}

async fn perform_delete(
	State(state): State<AppState>,
	cookies: Cookies,
	Path(id): Path<String>,
) -> Redirect {
	let mut shelf = state.shelf.lock().await;
	settle(&cookies, shelf.delete(&id).await)
}

async fn perform_status(
	State(state): State<AppState>,
	cookies: Cookies,
	Path(id): Path<String>,
	Form(form): Form<StatusForm>,
) -> Result<Redirect> {
	let status = ReadingStatus::from_form(&form.status)
		.ok_or_else(|| ShelfError::InvalidInput(format!("unknown status {}", form.status)))?;
	let mut shelf = state.shelf.lock().await;
	Ok(settle(&cookies, shelf.set_status(&id, status).await))
}

async fn perform_progress(
	State(state): State<AppState>,
	cookies: Cookies,
	Path(id): Path<String>,
	Form(form): Form<ProgressForm>,
) -> Redirect {
	let mut shelf = state.shelf.lock().await;
	settle(
		&cookies,
		shelf.record_progress(&id, i64::from(form.read_pages)).await,
	)
}

async fn serve_cover(
	State(state): State<AppState>,
	Path(hash): Path<String>,
) -> Result<impl IntoResponse> {
	let (mime, bytes) = state
		.slots
		.cover(&hash)
		.await?
		.ok_or_else(|| ShelfError::not_found("cover", &hash))?;

	Ok((
		[
			(header::CONTENT_TYPE, mime),
			(header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
			(
				header::CACHE_CONTROL,
				"public, max-age=31536000, immutable".to_string(),
			),
		],
		bytes,
	))
}
