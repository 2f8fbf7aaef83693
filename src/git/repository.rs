//! Remote repository URL handling

use crate::error::FetchError;
use anyhow::Result;

/// A remote repository location, passed verbatim to `git clone`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryUrl {
    url: String,
}

impl RepositoryUrl {
    /// Wrap a repository URL
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is empty or only whitespace
    #[inline]
    pub fn new(url: &str) -> Result<Self> {
        if url.trim().is_empty() {
            return Err(FetchError::configuration("Repository URL cannot be empty").into());
        }

        Ok(Self {
            url: url.to_owned(),
        })
    }

    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Name of the checkout directory derived from the URL
    ///
    /// Takes the last path segment of the URL and drops its extension:
    /// `https://example.com/org/repo.git` gives `repo`. Trailing slashes are
    /// ignored and scp-like URLs (`host:repo.git`) split on the colon.
    ///
    /// # Errors
    ///
    /// Returns an error if no usable name remains (for example `https://`)
    #[inline]
    pub fn stem(&self) -> Result<String> {
        let trimmed = self.url.trim_end_matches(['/', '\\']);
        let file_name = trimmed
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(trimmed);
        // scp-like `host:repo.git` without any slash
        let file_name = file_name.rsplit(':').next().unwrap_or(file_name);

        let stem = match file_name.rfind('.') {
            Some(0) | None => file_name,
            Some(dot) => &file_name[..dot],
        };

        if stem.is_empty() || stem == "." || stem == ".." {
            return Err(FetchError::configuration(format!(
                "Cannot derive a destination directory name from repository URL '{}'",
                self.url
            ))
            .into());
        }

        Ok(stem.to_owned())
    }
}
