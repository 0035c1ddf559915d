use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MovieError {
    #[error("empty info link")]
    EmptyLink,

    #[error("invalid info link '{url}': {source}")]
    InvalidLink {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported info link: {0}")]
    UnsupportedSite(String),

    #[error("info page unreachable after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("info page responded with {0}")]
    Status(StatusCode),

    #[error("failed to read info page: {0}")]
    Body(#[source] reqwest::Error),

    #[error("failed to read template '{}': {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}
