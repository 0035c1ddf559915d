use serde::Serialize;
use url::Url;

/// Fields scraped from a movie info page. Each one is optional on the page,
/// so a missing field is kept as an empty string.
#[derive(Debug, Clone, Serialize)]
pub struct MovieMetadata {
    pub url: Url,
    pub directory: String,
    pub name: String,
    pub description: String,
    pub trailer: String,
    pub cover: String,
    pub keywords: String,
    pub image: String,
    pub image_width: String,
    pub image_height: String,
}

impl MovieMetadata {
    pub fn new(url: Url, directory: impl Into<String>) -> Self {
        Self {
            url,
            directory: directory.into(),
            name: String::new(),
            description: String::new(),
            trailer: String::new(),
            cover: String::new(),
            keywords: String::new(),
            image: String::new(),
            image_width: String::new(),
            image_height: String::new(),
        }
    }
}
