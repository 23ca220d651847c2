//! Image file to data URI conversion for the student picture field.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use mime_guess::mime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PictureError {
    #[error("failed to read picture {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not an image ({mime})", path.display())]
    NotAnImage { path: PathBuf, mime: String },
}

/// Reads an image file and returns it as `data:<mime>;base64,<payload>`.
/// The MIME type is inferred from the file extension.
pub async fn read_data_uri(path: impl AsRef<Path>) -> Result<String, PictureError> {
    let path = path.as_ref();
    let guessed = mime_guess::from_path(path).first();
    let mime = match guessed {
        Some(mime) if mime.type_() == mime::IMAGE => mime,
        other => {
            return Err(PictureError::NotAnImage {
                path: path.to_path_buf(),
                mime: other
                    .map(|mime| mime.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            })
        }
    };

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| PictureError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(encode_data_uri(mime.essence_str(), &bytes))
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// MIME type of a base64 data URI, if `uri` is one.
pub fn data_uri_mime(uri: &str) -> Option<&str> {
    let rest = uri.strip_prefix("data:")?;
    let (header, _) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64").unwrap_or(header);
    (!mime.is_empty()).then_some(mime)
}
