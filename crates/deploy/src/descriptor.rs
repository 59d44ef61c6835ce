//! Descriptor location and disk file resolution.

use std::fmt;
use std::path::{Path, PathBuf};

use ovfdeploy_transfer::TransferSource;
use tracing::debug;

use crate::error::DeployError;

/// Where the OVF descriptor lives. Disk files sit next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorLocation {
    Local(PathBuf),
    /// An `http` or `https` URL.
    Remote(String),
}

impl DescriptorLocation {
    /// Classifies `location`: `http://` and `https://` URLs are remote,
    /// anything else is a local path.
    pub fn parse(location: &str) -> Self {
        if is_http_url(location) {
            DescriptorLocation::Remote(location.to_string())
        } else {
            DescriptorLocation::Local(PathBuf::from(location))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, DescriptorLocation::Remote(_))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            DescriptorLocation::Local(path) => path.as_os_str().is_empty(),
            DescriptorLocation::Remote(url) => url.is_empty(),
        }
    }

    /// Reads the descriptor text.
    pub async fn read(&self, http: &reqwest::Client) -> Result<String, DeployError> {
        match self {
            DescriptorLocation::Local(path) => Ok(tokio::fs::read_to_string(path).await?),
            DescriptorLocation::Remote(url) => {
                let response = http.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(DeployError::DescriptorUnavailable {
                        location: url.clone(),
                        status: status.as_u16(),
                    });
                }
                let text = response.text().await?;
                debug!(%url, bytes = text.len(), "fetched descriptor");
                Ok(text)
            }
        }
    }

    /// Location of a file referenced by the descriptor with a relative path.
    pub fn sibling(&self, relative: &str) -> DescriptorLocation {
        match self {
            DescriptorLocation::Local(path) => {
                let dir = path.parent().unwrap_or_else(|| Path::new(""));
                DescriptorLocation::Local(dir.join(relative))
            }
            DescriptorLocation::Remote(url) => {
                let base = url.rsplit_once('/').map_or(url.as_str(), |(base, _)| base);
                DescriptorLocation::Remote(format!("{base}/{relative}"))
            }
        }
    }

    /// Transfer source for a file next to the descriptor: a local file read
    /// or a straight HTTP pipe, depending on where the descriptor lives.
    pub fn file_source(&self, relative: &str) -> TransferSource {
        match self.sibling(relative) {
            DescriptorLocation::Local(path) => TransferSource::local(path),
            DescriptorLocation::Remote(url) => TransferSource::remote(url),
        }
    }
}

impl fmt::Display for DescriptorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorLocation::Local(path) => write!(f, "{}", path.display()),
            DescriptorLocation::Remote(url) => f.write_str(url),
        }
    }
}

impl From<&str> for DescriptorLocation {
    fn from(location: &str) -> Self {
        Self::parse(location)
    }
}

impl From<String> for DescriptorLocation {
    fn from(location: String) -> Self {
        Self::parse(&location)
    }
}

impl From<PathBuf> for DescriptorLocation {
    fn from(path: PathBuf) -> Self {
        DescriptorLocation::Local(path)
    }
}

fn is_http_url(location: &str) -> bool {
    let lower = location.get(..8).unwrap_or(location).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
