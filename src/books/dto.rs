use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::{
    books::{
        image::{normalize_image, RequestOrigin},
        repo_types::{Book, BookPatch, NewBook},
    },
    common::ApiJson,
    error::ApiError,
    users::validation::non_blank,
};

/// Multipart field carrying the cover file (or, as plain text, a ready reference).
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// A number that may arrive either as a JSON number or as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumericInput {
    Number(serde_json::Number),
    Text(String),
}

impl NumericInput {
    fn into_raw(self) -> String {
        match self {
            NumericInput::Number(n) => n.to_string(),
            NumericInput::Text(s) => s,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct BookJson {
    title: Option<String>,
    author: Option<String>,
    category: Option<String>,
    description: Option<String>,
    price: Option<NumericInput>,
    stock: Option<NumericInput>,
    image: Option<String>,
}

/// Raw book input from either a multipart form or a JSON body.
///
/// Nothing is validated on extraction; `new_book` and `patch` decide what the
/// fields mean for create and update respectively.
#[derive(Debug, Default)]
pub struct BookForm {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub stock: Option<String>,
    pub image_url: Option<String>,
    pub upload: Option<UploadedFile>,
}

#[async_trait]
impl<S> FromRequest<S> for BookForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::validation(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else {
            let ApiJson(body) = ApiJson::<BookJson>::from_request(req, state).await?;
            Ok(Self::from_json(body))
        }
    }
}

impl BookForm {
    fn from_json(body: BookJson) -> Self {
        Self {
            title: body.title,
            author: body.author,
            category: body.category,
            description: body.description,
            price: body.price.map(NumericInput::into_raw),
            stock: body.stock.map(NumericInput::into_raw),
            image_url: body.image,
            upload: None,
        }
    }

    async fn from_multipart(mut mp: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == IMAGE_FIELD && field.file_name().is_some() {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(e.body_text()))?;
                if bytes.is_empty() {
                    debug!(?file_name, "empty image part ignored");
                    continue;
                }
                form.upload = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| ApiError::validation(e.body_text()))?;
            match name.as_str() {
                "title" => form.title = Some(value),
                "author" => form.author = Some(value),
                "category" => form.category = Some(value),
                "description" => form.description = Some(value),
                "price" => form.price = Some(value),
                "stock" => form.stock = Some(value),
                IMAGE_FIELD => form.image_url = Some(value),
                other => debug!(field = other, "unknown form field ignored"),
            }
        }
        Ok(form)
    }

    /// Validates a create request. Every text field and both numbers are required.
    pub fn new_book(&self) -> Result<NewBook, ApiError> {
        let required = |value: &Option<String>, field: &str| {
            non_blank(value.clone())
                .ok_or_else(|| ApiError::validation(format!("{field} is required")))
        };
        let title = required(&self.title, "title")?;
        let author = required(&self.author, "author")?;
        let category = required(&self.category, "category")?;
        let description = required(&self.description, "description")?;
        let price = parse_price(&required(&self.price, "price")?)?;
        let stock = parse_stock(&required(&self.stock, "stock")?)?;

        Ok(NewBook {
            title,
            author,
            category,
            description,
            price,
            stock,
            image: non_blank(self.image_url.clone()),
        })
    }

    /// Validates an update request. Blank text leaves a field as it is; a
    /// number that is present is applied, `0` included.
    pub fn patch(&self) -> Result<BookPatch, ApiError> {
        let price = non_blank(self.price.clone())
            .map(|p| parse_price(&p))
            .transpose()?;
        let stock = non_blank(self.stock.clone())
            .map(|s| parse_stock(&s))
            .transpose()?;

        Ok(BookPatch {
            title: non_blank(self.title.clone()),
            author: non_blank(self.author.clone()),
            category: non_blank(self.category.clone()),
            description: non_blank(self.description.clone()),
            price,
            stock,
            image: non_blank(self.image_url.clone()),
        })
    }
}

fn parse_price(raw: &str) -> Result<f64, ApiError> {
    match raw.parse::<f64>() {
        Ok(p) if p.is_finite() && p >= 0.0 => Ok(p),
        _ => Err(ApiError::validation("price must be a non-negative number")),
    }
}

fn parse_stock(raw: &str) -> Result<i32, ApiError> {
    let invalid = || ApiError::validation("stock must be a non-negative integer");
    let value = raw.parse::<f64>().map_err(|_| invalid())?;
    if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > f64::from(i32::MAX) {
        return Err(invalid());
    }
    Ok(value as i32)
}

/// Book as sent to the client, with `image` already resolved to a URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl BookResponse {
    pub fn from_book(book: Book, origin: &RequestOrigin) -> Self {
        Self {
            image: normalize_image(book.image.as_deref(), origin),
            id: book.id,
            title: book.title,
            author: book.author,
            category: book.category,
            description: book.description,
            price: book.price,
            stock: book.stock,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookListResponse {
    pub success: bool,
    pub books: Vec<BookResponse>,
}

#[derive(Debug, Serialize)]
pub struct SingleBookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub book: BookResponse,
}
