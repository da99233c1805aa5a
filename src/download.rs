//! Plain HTTP GET that buffers the whole body.
//!
//! Used to fetch documents before they are pushed into a memory.

use tracing::info;

/// Errors from downloading a document.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// A fetched document.
#[derive(Debug, Clone)]
pub struct Downloaded {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Fetch `url` and buffer its body.
pub async fn download(url: &str) -> Result<Downloaded, DownloadError> {
    let response = reqwest::get(url).await?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
    let bytes = response.bytes().await?.to_vec();

    info!(url, size = bytes.len(), "downloaded");
    Ok(Downloaded {
        file_name: file_name_from_url(url),
        content_type,
        bytes,
    })
}

/// Last path segment of `url`, percent-decoded. Falls back to `document`.
pub fn file_name_from_url(url: &str) -> String {
    let path = url
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or(url)
        .trim_end_matches('/');
    let after_scheme = path.split_once("://").map(|(_, rest)| rest).unwrap_or(path);

    let segment = match after_scheme.split_once('/') {
        Some((_, rest)) => rest.rsplit('/').next().unwrap_or(""),
        None => "",
    };
    if segment.is_empty() {
        return "document".into();
    }

    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}
