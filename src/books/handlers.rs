use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    books::{
        dto::{BookForm, BookListResponse, BookResponse, SingleBookResponse},
        image::RequestOrigin,
        services::{create_book, update_book},
    },
    common::{parse_id, MessageResponse},
    error::ApiError,
    state::AppState,
};

const BOOK_NOT_FOUND: &str = "Book not found";

/// Largest request body accepted on book routes (cover uploads included).
pub const MAX_BOOK_BODY: usize = 20 * 1024 * 1024;

pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books).post(add_book))
        .route(
            "/books/:id",
            get(get_book).put(edit_book).delete(delete_book),
        )
        .layer(DefaultBodyLimit::max(MAX_BOOK_BODY))
}

#[instrument(skip(state, origin))]
pub async fn list_books(
    State(state): State<AppState>,
    origin: RequestOrigin,
) -> Result<Json<BookListResponse>, ApiError> {
    let books = state
        .books
        .list_recent()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch books", e))?;
    Ok(Json(BookListResponse {
        success: true,
        books: books
            .into_iter()
            .map(|b| BookResponse::from_book(b, &origin))
            .collect(),
    }))
}

#[instrument(skip(state, origin))]
pub async fn get_book(
    State(state): State<AppState>,
    origin: RequestOrigin,
    Path(id): Path<String>,
) -> Result<Json<SingleBookResponse>, ApiError> {
    let id = parse_id(&id, BOOK_NOT_FOUND)?;
    let book = state
        .books
        .find_by_id(id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch book", e))?
        .ok_or_else(|| ApiError::not_found(BOOK_NOT_FOUND))?;
    Ok(Json(SingleBookResponse {
        success: true,
        message: None,
        book: BookResponse::from_book(book, &origin),
    }))
}

#[instrument(skip(state, origin, form))]
pub async fn add_book(
    State(state): State<AppState>,
    origin: RequestOrigin,
    form: BookForm,
) -> Result<(StatusCode, Json<SingleBookResponse>), ApiError> {
    let book = create_book(&state, form).await?;
    info!(book_id = %book.id, title = %book.title, has_image = book.image.is_some(), "book added");
    Ok((
        StatusCode::CREATED,
        Json(SingleBookResponse {
            success: true,
            message: Some("Book added successfully"),
            book: BookResponse::from_book(book, &origin),
        }),
    ))
}

#[instrument(skip(state, origin, form))]
pub async fn edit_book(
    State(state): State<AppState>,
    origin: RequestOrigin,
    Path(id): Path<String>,
    form: BookForm,
) -> Result<Json<SingleBookResponse>, ApiError> {
    let id = parse_id(&id, BOOK_NOT_FOUND)?;
    let Some(book) = update_book(&state, id, form).await? else {
        warn!(book_id = %id, "update of unknown book");
        return Err(ApiError::not_found(BOOK_NOT_FOUND));
    };
    info!(book_id = %book.id, "book updated");
    Ok(Json(SingleBookResponse {
        success: true,
        message: Some("Book updated successfully"),
        book: BookResponse::from_book(book, &origin),
    }))
}

#[instrument(skip(state))]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id, BOOK_NOT_FOUND)?;
    let deleted = state
        .books
        .delete(id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete book", e))?;
    if !deleted {
        return Err(ApiError::not_found(BOOK_NOT_FOUND));
    }
    info!(book_id = %id, "book deleted");
    Ok(Json(MessageResponse::ok("Book deleted successfully")))
}
