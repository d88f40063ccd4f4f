use crate::backend::endpoints;
use crate::config::{normalize_base_url, ClientConfig};

/// Builds deep links into the backend-served PDF viewer.
///
/// The page and highlight go into the URL fragment, which browser PDF
/// viewers interpret (`#page=3&search=term`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerLinks {
    base_url: String,
}

impl ViewerLinks {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: normalize_base_url(base_url).unwrap_or_default() }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/api/pdf?path=<pdf_path>#page=<page>[&search=<highlight>]`.
    /// The search part is left out when `highlight` is empty.
    pub fn pdf_url(&self, pdf_path: &str, page: u32, highlight: &str) -> String {
        let mut url = format!(
            "{}{}?path={}#page={}",
            self.base_url,
            endpoints::PDF,
            urlencoding::encode(pdf_path),
            page
        );
        if !highlight.is_empty() {
            url.push_str("&search=");
            url.push_str(&urlencoding::encode(highlight));
        }
        url
    }
}
