//! Playlist import sources and export
//!
//! Every source ends up as playlist text handed to the parser. Remote sources
//! go through a ureq agent; gzip bodies are detected by their magic bytes.

use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::m3u_parser;
use crate::models::Entry;

pub const DEFAULT_EXPORT_NAME: &str = "playlist_edited.m3u";
pub const DEFAULT_USER_AGENT: &str = "M3UEditor/1.0";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Largest body we are willing to buffer
const MAX_PLAYLIST_BYTES: u64 = 512 * 1024 * 1024;

const PLAYLIST_SUFFIXES: [&str; 4] = [".m3u", ".m3u8", ".m3u.gz", ".m3u8.gz"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XtreamLogin {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl XtreamLogin {
    /// `{host}/get.php?...&type=m3u_plus&output=ts`
    pub fn playlist_url(&self) -> Result<String> {
        // Credentials are sent exactly as typed; only the host is tidied
        let host = self.host.trim();
        let username = self.username.as_str();
        let password = self.password.as_str();
        if host.is_empty() || username.is_empty() || password.is_empty() {
            return Err(Error::Validation("Please fill all Xtream fields.".to_string()));
        }

        let mut base = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };
        while base.ends_with('/') {
            base.pop();
        }

        Ok(format!(
            "{}/get.php?username={}&password={}&type=m3u_plus&output=ts",
            base,
            urlencoding::encode(username),
            urlencoding::encode(password)
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    File(PathBuf),
    Url(String),
    Xtream(XtreamLogin),
}

impl ImportSource {
    /// Reject bad input before touching disk or network
    pub fn validate(&self) -> Result<()> {
        match self {
            ImportSource::File(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
                if PLAYLIST_SUFFIXES.iter().any(|s| name.ends_with(s)) {
                    Ok(())
                } else {
                    Err(Error::Validation(format!(
                        "Unsupported file type: {} (expected .m3u or .m3u8)",
                        path.display()
                    )))
                }
            }
            ImportSource::Url(url) => {
                if url.trim().is_empty() {
                    Err(Error::Validation("Please enter a playlist URL.".to_string()))
                } else {
                    Ok(())
                }
            }
            ImportSource::Xtream(login) => login.playlist_url().map(|_| ()),
        }
    }

    /// Human-readable origin for logs and status text. Never includes credentials.
    pub fn describe(&self) -> String {
        match self {
            ImportSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            ImportSource::Url(url) => url.trim().to_string(),
            ImportSource::Xtream(login) => format!("Xtream {}@{}", login.username.trim(), login.host.trim()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Load the playlist text behind `source`. Blocks; call from a worker thread.
pub fn read_source(source: &ImportSource, options: &FetchOptions) -> Result<String> {
    source.validate()?;
    info!("Importing playlist from {}", source.describe());
    match source {
        ImportSource::File(path) => read_file(path),
        ImportSource::Url(url) => fetch_url(url.trim(), options),
        ImportSource::Xtream(login) => fetch_url(&login.playlist_url()?, options),
    }
}

pub fn read_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    decode_body(bytes)
}

pub fn fetch_url(url: &str, options: &FetchOptions) -> Result<String> {
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(options.timeout))
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = agent
        .get(url)
        .header("User-Agent", &options.user_agent)
        .call()
        .map_err(|e| Error::Network(format!("Failed to fetch playlist: {}", e)))?;

    let status = response.status();
    if status != 200 {
        return Err(Error::Network(format!("HTTP error: {}", status)));
    }

    let bytes = response
        .body_mut()
        .with_config()
        .limit(MAX_PLAYLIST_BYTES)
        .read_to_vec()
        .map_err(|e| Error::Network(format!("Read failed: {}", e)))?;
    debug!("Fetched {} bytes from {}", bytes.len(), url);
    decode_body(bytes)
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

/// Inflate gzip if needed, then decode as UTF-8 (lossy)
pub fn decode_body(bytes: Vec<u8>) -> Result<String> {
    let bytes = if is_gzip(&bytes) {
        let mut inflated = Vec::new();
        GzDecoder::new(bytes.as_slice()).read_to_end(&mut inflated)?;
        inflated
    } else {
        bytes
    };

    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Write the generated playlist to `path`
pub fn save_playlist(path: &Path, entries: &[Entry]) -> Result<()> {
    fs::write(path, m3u_parser::generate(entries))?;
    info!("Exported {} entries to {}", entries.len(), path.display());
    Ok(())
}

#[cfg(test)]
#[path = "sources_tests.rs"]
mod tests;
