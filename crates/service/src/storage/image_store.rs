use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{info, warn};

use crate::errors::ServiceError;
use crate::metrics::{IMAGES_DELETED_TOTAL, IMAGES_REJECTED_TOTAL, IMAGES_UPLOADED_TOTAL};

/// Web-root-relative prefix of every uploaded image path.
pub const UPLOADS_PREFIX: &str = "images/uploads";

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "svg"];
const NAME_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// An image payload decoded from a `data:image/<subtype>;base64,<data>` URL.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UploadedImage {
    pub path: String,
    pub filename: String,
    pub size: usize,
}

/// Outcome of one entry of a batch upload.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItemResult {
    pub success: bool,
    #[serde(flatten)]
    pub image: Option<UploadedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageInfo {
    pub filename: String,
    pub path: String,
    pub size: u64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Parse a base64 image data URL.
pub fn decode_data_url(payload: &str) -> Result<DecodedImage, ServiceError> {
    let invalid = || ServiceError::InvalidImageFormat("expected base64 data URL".into());

    let rest = payload.strip_prefix("data:image/").ok_or_else(invalid)?;
    let (subtype, data) = rest.split_once(";base64,").ok_or_else(invalid)?;
    if subtype.is_empty() || !subtype.chars().all(|c| c.is_ascii_alphabetic() || c == '+') {
        return Err(invalid());
    }
    if data.is_empty() {
        return Err(invalid());
    }
    let bytes = BASE64
        .decode(data.trim_end())
        .map_err(|e| ServiceError::InvalidImageFormat(format!("bad base64 data: {e}")))?;

    let subtype = subtype.to_ascii_lowercase();
    let extension = match subtype.as_str() {
        "jpeg" => "jpg".to_string(),
        "svg+xml" => "svg".to_string(),
        _ => subtype,
    };
    Ok(DecodedImage { extension, bytes })
}

/// `img_{unix_millis}_{6 base36 chars}.{ext}`
fn generate_filename(extension: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| NAME_ALPHABET[rng.gen_range(0..NAME_ALPHABET.len())] as char)
        .collect();
    format!("img_{}_{}.{}", Utc::now().timestamp_millis(), suffix, extension)
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['\\', '\0', ':'])
}

/// Split a `/`-separated relative path into segments that cannot escape their root.
fn safe_segments(path: &str) -> Option<Vec<&str>> {
    let segments: Vec<&str> = path.split('/').collect();
    segments.iter().all(|s| is_safe_segment(s)).then_some(segments)
}

fn image_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

async fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(path).await?;
    file.write_all(bytes).await?;
    file.flush().await
}

/// Stores uploaded images below `{web_root}/images/uploads`.
///
/// Callers may scope uploads into a folder (`news-content`, `banners`, ...).
/// Only files inside the uploads tree can be listed or deleted here.
#[derive(Debug, Clone)]
pub struct ImageStore {
    uploads_dir: PathBuf,
}

impl ImageStore {
    pub async fn new<P: AsRef<Path>>(web_root: P) -> Result<Arc<Self>, ServiceError> {
        let uploads_dir = web_root.as_ref().join(UPLOADS_PREFIX);
        fs::create_dir_all(&uploads_dir)
            .await
            .map_err(|e| ServiceError::write("create uploads directory", e))?;
        Ok(Arc::new(Self { uploads_dir }))
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Resolve an optional caller folder to `(directory, web path prefix)`.
    fn resolve_folder(&self, folder: Option<&str>) -> Result<(PathBuf, String), ServiceError> {
        let folder = folder.map(|f| f.trim().trim_matches('/')).filter(|f| !f.is_empty());
        let Some(folder) = folder else {
            return Ok((self.uploads_dir.clone(), UPLOADS_PREFIX.to_string()));
        };
        let segments = safe_segments(folder)
            .ok_or_else(|| ServiceError::Forbidden(format!("folder outside uploads: {folder}")))?;
        let dir = segments.iter().fold(self.uploads_dir.clone(), |acc, s| acc.join(s));
        Ok((dir, format!("{UPLOADS_PREFIX}/{}", segments.join("/"))))
    }

    /// Decode and store one image. Nothing is written when the payload is malformed.
    pub async fn upload_image(
        &self,
        payload: &str,
        folder: Option<&str>,
        filename: Option<&str>,
    ) -> Result<UploadedImage, ServiceError> {
        let decoded = decode_data_url(payload).map_err(|e| {
            IMAGES_REJECTED_TOTAL.inc();
            e
        })?;
        let filename = filename.map(str::trim).filter(|f| !f.is_empty());
        if let Some(name) = filename {
            if !is_safe_segment(name) || name.contains('/') {
                return Err(ServiceError::Validation(format!("invalid filename: {name}")));
            }
        }
        let (dir, prefix) = self.resolve_folder(folder)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ServiceError::write("create upload folder", e))?;
        self.store(&dir, &prefix, decoded, filename).await
    }

    /// Upload several images into the same folder. A bad entry is reported in
    /// its own result and does not stop the rest of the batch.
    pub async fn upload_images(
        &self,
        payloads: &[String],
        folder: Option<&str>,
    ) -> Result<Vec<BatchItemResult>, ServiceError> {
        let (dir, prefix) = self.resolve_folder(folder)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ServiceError::write("create upload folder", e))?;

        let mut results = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let outcome = match decode_data_url(payload) {
                Ok(decoded) => self.store(&dir, &prefix, decoded, None).await,
                Err(e) => {
                    IMAGES_REJECTED_TOTAL.inc();
                    Err(e)
                }
            };
            results.push(match outcome {
                Ok(image) => BatchItemResult { success: true, image: Some(image), error: None },
                Err(e) => BatchItemResult { success: false, image: None, error: Some(e.to_string()) },
            });
        }
        Ok(results)
    }

    async fn store(
        &self,
        dir: &Path,
        prefix: &str,
        image: DecodedImage,
        filename: Option<&str>,
    ) -> Result<UploadedImage, ServiceError> {
        let filename = match filename {
            Some(name) => {
                fs::write(dir.join(name), &image.bytes)
                    .await
                    .map_err(|e| ServiceError::write("write image", e))?;
                name.to_string()
            }
            None => {
                let mut attempt = 0;
                loop {
                    let name = generate_filename(&image.extension);
                    match write_new(&dir.join(&name), &image.bytes).await {
                        Ok(()) => break name,
                        Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < 3 => attempt += 1,
                        Err(e) => return Err(ServiceError::write("write image", e)),
                    }
                }
            }
        };

        let path = format!("{prefix}/{filename}");
        IMAGES_UPLOADED_TOTAL.inc();
        info!(%path, size = image.bytes.len(), event = "image_uploaded", "image uploaded");
        Ok(UploadedImage { path, filename, size: image.bytes.len() })
    }

    /// Delete an uploaded image by its web path (`images/uploads/...`).
    pub async fn delete_image(&self, path: &str) -> Result<(), ServiceError> {
        let relative = path
            .strip_prefix(UPLOADS_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| ServiceError::Forbidden("can only delete images from uploads folder".into()))?;
        let segments = safe_segments(relative)
            .ok_or_else(|| ServiceError::Forbidden("can only delete images from uploads folder".into()))?;
        let full = segments.iter().fold(self.uploads_dir.clone(), |acc, s| acc.join(s));

        match fs::metadata(&full).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(ServiceError::not_found("image")),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ServiceError::not_found("image")),
            Err(e) => return Err(ServiceError::write("stat image", e)),
        }
        fs::remove_file(&full)
            .await
            .map_err(|e| ServiceError::write("delete image", e))?;
        IMAGES_DELETED_TOTAL.inc();
        info!(%path, event = "image_deleted", "image deleted");
        Ok(())
    }

    /// List image files in the uploads root or a folder, newest first.
    /// A folder that does not exist lists as empty.
    pub async fn list_images(&self, folder: Option<&str>) -> Result<Vec<ImageInfo>, ServiceError> {
        let (dir, prefix) = self.resolve_folder(folder)?;
        let mut rd = match fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ServiceError::write("read upload folder", e)),
        };

        let mut images = Vec::new();
        while let Some(entry) = rd
            .next_entry()
            .await
            .map_err(|e| ServiceError::write("read upload folder", e))?
        {
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !image_extension(&filename) {
                continue;
            }
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                Ok(_) => continue,
                Err(e) => {
                    warn!(%filename, error = %e, "cannot stat uploaded image");
                    continue;
                }
            };
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let created = meta.created().unwrap_or(modified);
            images.push(ImageInfo {
                path: format!("{prefix}/{filename}"),
                filename,
                size: meta.len(),
                created: created.into(),
                modified: modified.into(),
            });
        }
        images.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.filename.cmp(&a.filename)));
        Ok(images)
    }
}
