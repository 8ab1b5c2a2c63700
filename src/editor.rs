use crate::api::{ApiClient, ImageFile, IMAGE_UPLOAD_PATH};
use crate::controller::NewsController;
use crate::error::ApiError;
use crate::form::{FormError, NewsForm};
use crate::models::{ImageUploadResponse, NewsId, NewsPayload};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Invalid(#[from] FormError),
    #[error("cannot read image {path}: {reason}")]
    Image { path: String, reason: String },
    #[error("image upload failed: {0}")]
    Upload(#[source] ApiError),
    #[error("saving news failed: {0}")]
    Save(#[source] ApiError),
}

impl ImageFile {
    /// Reads an image from disk, expanding `~`.
    /// Only files whose extension maps to an `image/*` type are accepted.
    pub async fn from_path(path: &str) -> Result<Self, EditorError> {
        let expanded = shellexpand::tilde(path).to_string();
        let fail = |reason: String| EditorError::Image { path: path.to_string(), reason };

        let mime_type = image_mime_type(Path::new(&expanded))
            .ok_or_else(|| fail("not an image file".to_string()))?;
        let bytes = tokio::fs::read(&expanded).await.map_err(|e| fail(e.to_string()))?;
        let filename = Path::new(&expanded)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Ok(Self { filename, mime_type: mime_type.to_string(), bytes })
    }
}

fn image_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Uploads an image and returns its public URL
pub async fn upload_image<C: ApiClient>(client: &C, image: ImageFile) -> Result<String, ApiError> {
    let filename = image.filename.clone();
    let response = client.upload(IMAGE_UPLOAD_PATH, image).await?;
    let url = serde_json::from_value::<ImageUploadResponse>(response)?.into_url();
    info!(%filename, %url, "image uploaded");
    Ok(url)
}

async fn prepare<C: ApiClient>(
    controller: &NewsController<C>,
    form: NewsForm,
    image: Option<ImageFile>,
) -> Result<NewsPayload, EditorError> {
    let mut payload = NewsPayload::try_from(form)?;

    if let Some(image) = image {
        payload.image = upload_image(controller.client(), image).await.map_err(|err| {
            error!(error = %err, "error uploading image");
            EditorError::Upload(err)
        })?;
    }

    Ok(payload)
}

/// Validates the form, uploads the image if one was picked, then creates the record.
/// On failure nothing is created and the form can be resubmitted as is.
pub async fn create_news<C: ApiClient>(
    controller: &NewsController<C>,
    form: NewsForm,
    image: Option<ImageFile>,
) -> Result<Value, EditorError> {
    let payload = prepare(controller, form, image).await?;
    controller.create_record(&payload).await.map_err(EditorError::Save)
}

/// Same as [`create_news`] for an existing record. Without a new image the
/// form's current image URL is kept.
pub async fn update_news<C: ApiClient>(
    controller: &NewsController<C>,
    id: &NewsId,
    form: NewsForm,
    image: Option<ImageFile>,
) -> Result<Value, EditorError> {
    let payload = prepare(controller, form, image).await?;
    controller.update_record(id, &payload).await.map_err(EditorError::Save)
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod tests;
