use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::books::repo_types::{Book, BookPatch, NewBook};
use crate::db::StoreError;

#[async_trait]
pub trait BookRepo: Send + Sync {
    /// All books, newest first.
    async fn list_recent(&self) -> Result<Vec<Book>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>, StoreError>;
    async fn create(&self, book: NewBook) -> Result<Book, StoreError>;
    async fn update(&self, id: Uuid, patch: BookPatch) -> Result<Option<Book>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgBookRepo {
    pool: PgPool,
}

impl PgBookRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepo for PgBookRepo {
    async fn list_recent(&self) -> Result<Vec<Book>, StoreError> {
        let rows = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, category, description, price, stock, image,
                   created_at, updated_at
            FROM books
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>, StoreError> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, category, description, price, stock, image,
                   created_at, updated_at
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, author, category, description, price, stock, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, author, category, description, price, stock, image,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(&book.description)
        .bind(book.price)
        .bind(book.stock)
        .bind(&book.image)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: BookPatch) -> Result<Option<Book>, StoreError> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
               SET title = COALESCE($2, title),
                   author = COALESCE($3, author),
                   category = COALESCE($4, category),
                   description = COALESCE($5, description),
                   price = COALESCE($6, price),
                   stock = COALESCE($7, stock),
                   image = COALESCE($8, image),
                   updated_at = now()
             WHERE id = $1
            RETURNING id, title, author, category, description, price, stock, image,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.author)
        .bind(patch.category)
        .bind(patch.description)
        .bind(patch.price)
        .bind(patch.stock)
        .bind(patch.image)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
