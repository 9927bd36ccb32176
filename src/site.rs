//! Target URL handling and the derived site identifier.

use crate::ExportError;

/// The page being exported, plus the directory name its artifacts go under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTarget {
    url: String,
    site_id: String,
}

impl SiteTarget {
    /// Accepts any non-empty string. Malformed URLs are left for the browser
    /// to reject during navigation.
    pub fn parse(raw: &str) -> Result<Self, ExportError> {
        if raw.is_empty() {
            return Err(ExportError::ArgumentMissing);
        }

        Ok(Self {
            url: raw.to_string(),
            site_id: strip_scheme(raw).to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    /// Host name for log fields, when the URL parses.
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

/// Removes one leading `https://` or `http://`.
///
/// Matching is case-sensitive and anchored at the start. Paths, ports and
/// query strings are kept, so the result may contain `/`, `:` or `?`.
pub fn strip_scheme(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}
