use super::error::MovieError;
use super::model::MovieMetadata;
use minijinja::Environment;
use std::path::{Path, PathBuf};

pub const TEMPLATE_NAME: &str = "movie.html";
pub const INDEX_FILE: &str = "index.html";

/// Renders the movie page. The template is read from disk on every call so
/// edits are picked up by the next job without a restart.
pub async fn render(movie: &MovieMetadata, template_path: &Path) -> Result<String, MovieError> {
    let source = tokio::fs::read_to_string(template_path)
        .await
        .map_err(|source| MovieError::TemplateRead {
            path: template_path.to_path_buf(),
            source,
        })?;

    // The name drives auto-escaping, so keep the .html suffix
    let name = template_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(TEMPLATE_NAME);

    let env = Environment::new();
    let template = env.template_from_named_str(name, &source)?;
    Ok(template.render(movie)?)
}

/// Writes `index.html` into `page_dir`, creating the directory when needed
/// and replacing any previous page.
pub async fn save(html: &str, page_dir: &Path) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(page_dir).await?;
    let index = page_dir.join(INDEX_FILE);
    tokio::fs::write(&index, html).await?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use url::Url;

    const TEMPLATE: &str = r#"<title>{{ name }}</title>
<p class="description">{{ description }}</p>
<meta name="keywords" content="{{ keywords }}">
<video src="{{ trailer }}" poster="{{ cover }}"></video>
<img src="{{ image }}" width="{{ image_width }}" height="{{ image_height }}">
<a href="{{ directory }}">files</a>
<span>{{ rating }}</span>"#;

    fn full_movie() -> MovieMetadata {
        let mut movie = MovieMetadata::new(
            Url::parse("https://plus.kinopoisk.ru/film/301/").unwrap(),
            "night_train",
        );
        movie.name = "Night Train".to_string();
        movie.description = "A crew robs a moving train".to_string();
        movie.keywords = "Heist, Crime".to_string();
        movie.trailer = "https://media.example.com/trailer.mp4".to_string();
        movie.cover = "http://media.example.com/cover.jpg".to_string();
        movie.image = "https://media.example.com/poster.jpg".to_string();
        movie.image_width = "600".to_string();
        movie.image_height = "900".to_string();
        movie
    }

    fn write_template(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join(TEMPLATE_NAME);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn substitutes_every_field() {
        let dir = TempDir::new().unwrap();
        let template = write_template(&dir, TEMPLATE);

        let html = render(&full_movie(), &template).await.unwrap();

        assert!(html.contains("<title>Night Train</title>"));
        assert!(html.contains("A crew robs a moving train"));
        assert!(html.contains("Heist, Crime"));
        assert!(html.contains("trailer.mp4"));
        assert!(html.contains("cover.jpg"));
        assert!(html.contains("poster.jpg"));
        assert!(html.contains(r#"width="600" height="900""#));
        assert!(html.contains(r#"<a href="night_train">"#));
    }

    #[tokio::test]
    async fn empty_and_unknown_fields_render_blank() {
        let dir = TempDir::new().unwrap();
        let template = write_template(&dir, TEMPLATE);
        let mut movie = full_movie();
        movie.description.clear();
        movie.image_width.clear();

        let html = render(&movie, &template).await.unwrap();

        assert!(html.contains(r#"<p class="description"></p>"#));
        assert!(html.contains(r#"width="" height="900""#));
        assert!(html.contains("<span></span>"));
    }

    #[tokio::test]
    async fn escapes_markup_in_scraped_text() {
        let dir = TempDir::new().unwrap();
        let template = write_template(&dir, "{{ name }}");
        let mut movie = full_movie();
        movie.name = "<script>x</script>".to_string();

        let html = render(&movie, &template).await.unwrap();
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn reloads_template_on_each_call() {
        let dir = TempDir::new().unwrap();
        let template = write_template(&dir, "first {{ name }}");
        assert_eq!(render(&full_movie(), &template).await.unwrap(), "first Night Train");

        write_template(&dir, "second {{ name }}");
        assert_eq!(render(&full_movie(), &template).await.unwrap(), "second Night Train");
    }

    #[tokio::test]
    async fn missing_template_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = render(&full_movie(), &dir.path().join(TEMPLATE_NAME)).await.unwrap_err();
        assert!(matches!(err, MovieError::TemplateRead { .. }));
    }

    #[tokio::test]
    async fn broken_template_is_an_error() {
        let dir = TempDir::new().unwrap();
        let template = write_template(&dir, "{% if name %}unterminated");
        assert!(matches!(
            render(&full_movie(), &template).await,
            Err(MovieError::Template(_))
        ));
    }

    #[tokio::test]
    async fn save_creates_directory_and_truncates() {
        let dir = TempDir::new().unwrap();
        let page_dir = dir.path().join("night_train");

        save("a much longer first version", &page_dir).await.unwrap();
        let index = save("short", &page_dir).await.unwrap();

        assert_eq!(index, page_dir.join(INDEX_FILE));
        assert_eq!(std::fs::read_to_string(index).unwrap(), "short");
    }
}
