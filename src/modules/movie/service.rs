use super::error::MovieError;
use super::model::MovieMetadata;
use regex::Regex;
use reqwest::{Client, StatusCode};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// The info site only answers crawlers it recognizes.
pub const CRAWLER_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static SITE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://(.*)\.kinopoisk\.ru/film/([0-9]+)/").expect("site pattern"));

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"itemprop="name">([^<]*)"#).expect("name pattern"));
static DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"itemprop="description">([^<]*)"#).expect("description pattern"));
static TRAILER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"content="([^"]*)" property="og:video:url""#).expect("trailer pattern")
});
static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"content="([^"]*)" property="og:image""#).expect("image pattern"));
static IMAGE_WIDTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"content="([0-9]+)" property="og:image:width""#).expect("width pattern")
});
static IMAGE_HEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"content="([0-9]+)" property="og:image:height""#).expect("height pattern")
});
static KEYWORDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"content="([^"]*)" name="keywords""#).expect("keywords pattern"));
static COVER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="image__source" srcset="([^ ]*) 1x"#).expect("cover pattern"));

/// Retry budget for transport failures while fetching an info page.
#[derive(Debug, Clone, Copy)]
pub struct ScrapePolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ScrapePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            interval: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct MovieService {
    client: Client,
    metadata_base: Url,
    policy: ScrapePolicy,
}

impl MovieService {
    pub fn new(metadata_base: Url) -> Result<Self, reqwest::Error> {
        Self::with_policy(metadata_base, ScrapePolicy::default())
    }

    pub fn with_policy(metadata_base: Url, policy: ScrapePolicy) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(CRAWLER_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            metadata_base,
            policy,
        })
    }

    /// Validates a public info link and maps it onto the metadata host.
    /// No request is made here.
    pub fn target(&self, info_url: &str) -> Result<Url, MovieError> {
        if info_url.is_empty() {
            return Err(MovieError::EmptyLink);
        }
        let parsed = Url::parse(info_url).map_err(|source| MovieError::InvalidLink {
            url: info_url.to_string(),
            source,
        })?;
        if !SITE_RE.is_match(info_url) {
            return Err(MovieError::UnsupportedSite(info_url.to_string()));
        }

        let mut target = self.metadata_base.clone();
        target.set_path(parsed.path());
        target.set_query(parsed.query());
        Ok(target)
    }

    pub async fn fetch(&self, info_url: &str, directory: &str) -> Result<MovieMetadata, MovieError> {
        let url = self.target(info_url)?;
        info!("Parsing info page '{}'...", url);

        let body = self.download(&url).await?;
        let mut movie = MovieMetadata::new(url, directory);
        parse_fields(&mut movie, &body);

        info!("Parsed movie: {}", movie.name);
        Ok(movie)
    }

    async fn download(&self, url: &Url) -> Result<String, MovieError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.client.get(url.clone()).send().await {
                Ok(response) => {
                    if response.status() != StatusCode::OK {
                        return Err(MovieError::Status(response.status()));
                    }
                    return response.text().await.map_err(MovieError::Body);
                }
                Err(e) if attempts >= self.policy.max_attempts => {
                    return Err(MovieError::Transport { attempts, source: e });
                }
                Err(e) => {
                    debug!("Retrying {}/{}: {}", attempts, self.policy.max_attempts, e);
                    tokio::time::sleep(self.policy.interval).await;
                }
            }
        }
    }
}

fn parse_fields(movie: &mut MovieMetadata, body: &str) {
    movie.name = capture(&NAME_RE, body);
    movie.description = capture(&DESCRIPTION_RE, body);
    movie.trailer = capture(&TRAILER_RE, body);
    movie.image = capture(&IMAGE_RE, body);
    movie.image_width = capture(&IMAGE_WIDTH_RE, body);
    movie.image_height = capture(&IMAGE_HEIGHT_RE, body);
    movie.keywords = capture(&KEYWORDS_RE, body);

    // srcset is protocol-relative
    let cover = capture(&COVER_RE, body);
    if !cover.is_empty() {
        movie.cover = format!("http:{cover}");
    }
}

fn capture(re: &Regex, body: &str) -> String {
    re.captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
