use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use uuid::Uuid;

/// URL path segment under which uploaded files are served and referenced.
pub const UPLOADS_PREFIX: &str = "uploads";

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
}

/// Upload store backed by a directory on local disk.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create upload dir {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        anyhow::ensure!(is_plain_file_name(key), "invalid object key {key:?}");
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write upload {}", path.display()))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("delete upload {}", path.display())),
        }
    }
}

fn is_plain_file_name(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains(['/', '\\'])
}

/// Generates a collision-free file name: `<unix-millis>-<uuid>[.<ext>]`.
pub fn unique_file_name(original_name: Option<&str>, content_type: Option<&str>) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let id = Uuid::new_v4().simple();
    let ext = original_name
        .and_then(ext_from_file_name)
        .or_else(|| content_type.and_then(ext_from_mime).map(str::to_string));
    match ext {
        Some(ext) => format!("{millis}-{id}.{ext}"),
        None => format!("{millis}-{id}"),
    }
}

/// Extensions an uploaded file may be stored under.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "heic"];

/// True when the upload is one of the accepted image formats.
///
/// A declared content type must be a known image type and a file-name
/// extension, when present, must be an image extension. At least one of them
/// has to be present.
pub fn is_image_upload(original_name: Option<&str>, content_type: Option<&str>) -> bool {
    let name_ext = original_name.and_then(ext_from_file_name);
    if name_ext
        .as_deref()
        .is_some_and(|ext| !IMAGE_EXTENSIONS.contains(&ext))
    {
        return false;
    }

    let mime_ext = match content_type {
        Some(ct) => {
            let essence = ct.split(';').next().unwrap_or_default().trim();
            match ext_from_mime(&essence.to_ascii_lowercase()) {
                Some(ext) => Some(ext),
                None => return false,
            }
        }
        None => None,
    };

    name_ext.is_some() || mime_ext.is_some()
}

fn ext_from_file_name(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
