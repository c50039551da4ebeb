use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use actix_multipart::form::tempfile::TempFile;
use tracing::{debug, warn};

use crate::token::random_token;

/// URL prefix under which stored logos are served
pub const LOGO_URL_PREFIX: &str = "/uploads/jobs";

/// Accepted web image formats: magic bytes, mime type, stored extension
const WEB_IMAGES: [(&[u8], &str, &str); 4] = [
    (b"\xFF\xD8\xFF", "image/jpeg", "jpg"),
    (b"\x89PNG\r\n\x1A\n", "image/png", "png"),
    (b"GIF87a", "image/gif", "gif"),
    (b"GIF89a", "image/gif", "gif"),
];

/// Detect the image format from file content, ignoring the client's claim
pub fn sniff_image(header: &[u8]) -> Option<(&'static str, &'static str)> {
    WEB_IMAGES
        .iter()
        .find(|(magic, _, _)| header.starts_with(magic))
        .map(|(_, mime, extension)| (*mime, *extension))
}

/// A checked upload that has not been written to the upload directory yet
#[derive(Debug)]
pub struct PendingLogo<'a> {
    file: &'a TempFile,
    extension: &'static str,
}

/// Company logos stored as files under a configured directory
#[derive(Debug, Clone)]
pub struct LogoStorage {
    dir: PathBuf,
    max_size: usize,
}

impl LogoStorage {
    pub fn new(dir: impl Into<PathBuf>, max_size: usize) -> Self {
        Self {
            dir: dir.into(),
            max_size,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Check size and format of an uploaded logo.
    ///
    /// `Ok(None)` when no file was chosen: browsers still submit an empty part
    /// for an untouched file input. `Err` carries the message for the form.
    pub fn inspect<'a>(&self, file: Option<&'a TempFile>) -> Result<Option<PendingLogo<'a>>, String> {
        let Some(file) = file.filter(|f| f.size > 0) else {
            return Ok(None);
        };

        if file.size > self.max_size {
            return Err(format!("File is too large (maximum is {} bytes).", self.max_size));
        }

        let mut header = [0u8; 8];
        let read = File::open(file.file.path())
            .and_then(|mut f| f.read(&mut header))
            .map_err(|e| {
                warn!("Failed to read uploaded logo: {}", e);
                "The file could not be read.".to_string()
            })?;

        match sniff_image(&header[..read]) {
            Some((mime, extension)) => {
                debug!("Accepted logo upload: mime={}, size={}", mime, file.size);
                Ok(Some(PendingLogo { file, extension }))
            }
            None => {
                let claimed = file
                    .content_type
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                Err(format!("Invalid mime type ({claimed})."))
            }
        }
    }

    /// Copy the upload under a fresh random name and return that name
    pub fn save(&self, logo: &PendingLogo<'_>) -> io::Result<String> {
        fs::create_dir_all(&self.dir)?;
        let name = format!("{}.{}", random_token(), logo.extension);
        fs::copy(logo.file.file.path(), self.dir.join(&name))?;
        debug!("Stored logo {}", name);
        Ok(name)
    }

    pub fn remove(&self, name: &str) {
        if let Err(e) = fs::remove_file(self.dir.join(name)) {
            warn!("Failed to remove logo {}: {}", name, e);
        }
    }

    pub fn url(name: &str) -> String {
        format!("{LOGO_URL_PREFIX}/{name}")
    }
}
