use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Book record in the database. `image` holds the stored reference, not a URL.
#[derive(Debug, Clone, FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
    pub image: Option<String>,
}

/// Partial update. A `Some` is applied even when it holds `0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i32>,
    pub image: Option<String>,
}

/// Mirrors the `COALESCE` update of `PgBookRepo` for the in-memory store.
#[cfg(test)]
impl BookPatch {
    pub fn apply(self, book: &mut Book) {
        if let Some(v) = self.title {
            book.title = v;
        }
        if let Some(v) = self.author {
            book.author = v;
        }
        if let Some(v) = self.category {
            book.category = v;
        }
        if let Some(v) = self.description {
            book.description = v;
        }
        if let Some(v) = self.price {
            book.price = v;
        }
        if let Some(v) = self.stock {
            book.stock = v;
        }
        if let Some(v) = self.image {
            book.image = Some(v);
        }
    }
}
