use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    books::{
        dto::{BookForm, UploadedFile},
        repo_types::Book,
    },
    error::ApiError,
    state::AppState,
    storage::{is_image_upload, unique_file_name, UPLOADS_PREFIX},
};

/// A file written to the upload store whose record has not been persisted yet.
struct StagedUpload {
    key: String,
}

impl StagedUpload {
    /// Reference stored on the book record.
    fn reference(&self) -> String {
        format!("{UPLOADS_PREFIX}/{}", self.key)
    }
}

async fn store_upload(state: &AppState, file: UploadedFile) -> Result<StagedUpload, ApiError> {
    if !is_image_upload(file.file_name.as_deref(), file.content_type.as_deref()) {
        warn!(
            file_name = ?file.file_name,
            content_type = ?file.content_type,
            "rejected non-image upload"
        );
        return Err(ApiError::validation("Only image files are allowed"));
    }
    let key = unique_file_name(file.file_name.as_deref(), file.content_type.as_deref());
    let size = file.bytes.len();
    state
        .storage
        .put_object(&key, file.bytes)
        .await
        .map_err(|e| ApiError::internal("Failed to store image", e))?;
    info!(%key, size, "image stored");
    Ok(StagedUpload { key })
}

/// Removes a staged file after its record could not be written.
async fn discard_upload(state: &AppState, staged: Option<StagedUpload>) {
    let Some(staged) = staged else {
        return;
    };
    match state.storage.delete_object(&staged.key).await {
        Ok(()) => warn!(key = %staged.key, "orphan upload removed"),
        Err(e) => error!(error = ?e, key = %staged.key, "failed to remove orphan upload"),
    }
}

pub async fn create_book(state: &AppState, form: BookForm) -> Result<Book, ApiError> {
    let mut new_book = form.new_book()?;

    let staged = match form.upload {
        Some(file) => Some(store_upload(state, file).await?),
        None => None,
    };
    if let Some(staged) = &staged {
        new_book.image = Some(staged.reference());
    }

    match state.books.create(new_book).await {
        Ok(book) => Ok(book),
        Err(e) => {
            discard_upload(state, staged).await;
            Err(ApiError::internal("Failed to add book", e))
        }
    }
}

/// `Ok(None)` when no book has this id.
pub async fn update_book(
    state: &AppState,
    id: Uuid,
    form: BookForm,
) -> Result<Option<Book>, ApiError> {
    let mut patch = form.patch()?;

    let staged = match form.upload {
        Some(file) => Some(store_upload(state, file).await?),
        None => None,
    };
    if let Some(staged) = &staged {
        patch.image = Some(staged.reference());
    }

    match state.books.update(id, patch).await {
        Ok(Some(book)) => Ok(Some(book)),
        Ok(None) => {
            discard_upload(state, staged).await;
            Ok(None)
        }
        Err(e) => {
            discard_upload(state, staged).await;
            Err(ApiError::internal("Failed to update book", e))
        }
    }
}
