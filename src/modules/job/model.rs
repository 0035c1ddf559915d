use serde::{Deserialize, Serialize};

pub const FINISHED_STATE: &str = "finished";

/// Job announcement published by the delivery service.
///
/// Every field falls back to its empty value when missing from the payload;
/// the worker does not validate the shape beyond well-formed JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRecord {
    pub id: String,
    pub state: String,
    pub download_url: String,
    pub info_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl JobRecord {
    pub fn is_finished(&self) -> bool {
        self.state == FINISHED_STATE
    }

    /// Name of the delivered archive without its extension. Used both for
    /// `{result_dir}/{directory}.tar` and for the page output directory.
    pub fn directory(&self) -> String {
        let trimmed = self.download_url.trim_end_matches('/');
        let base = match trimmed.rsplit_once('/') {
            Some((_, last)) => last,
            None => trimmed,
        };
        if base.is_empty() {
            return String::new();
        }
        match base.rfind('.') {
            Some(idx) => base[..idx].to_string(),
            None => base.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_with_url(url: &str) -> JobRecord {
        JobRecord {
            download_url: url.to_string(),
            ..JobRecord::default()
        }
    }

    #[test]
    fn directory_strips_last_extension_only() {
        let job = job_with_url("https://cdn.example.com/out/foo.bar.tar");
        assert_eq!(job.directory(), "foo.bar");
    }

    #[test]
    fn directory_keeps_name_without_extension() {
        let job = job_with_url("https://cdn.example.com/out/movie");
        assert_eq!(job.directory(), "movie");
    }

    #[test]
    fn directory_ignores_trailing_slash() {
        let job = job_with_url("https://cdn.example.com/out/movie.tar/");
        assert_eq!(job.directory(), "movie");
    }

    #[test]
    fn directory_is_stable() {
        let job = job_with_url("/data/releases/The.Movie.2019.tar");
        assert_eq!(job.directory(), job.directory());
        assert_eq!(job.directory(), "The.Movie.2019");
    }

    #[test]
    fn decodes_partial_payload_with_defaults() {
        let job: JobRecord = serde_json::from_str(r#"{"id":"42","state":"queued"}"#).unwrap();
        assert_eq!(job.id, "42");
        assert!(!job.is_finished());
        assert!(job.download_url.is_empty());
        assert!(job.name.is_none());
    }

    #[test]
    fn only_finished_state_triggers_work() {
        let mut job = JobRecord::default();
        for state in ["queued", "running", "failed", "Finished", ""] {
            job.state = state.to_string();
            assert!(!job.is_finished(), "state {state:?}");
        }
        job.state = "finished".to_string();
        assert!(job.is_finished());
    }
}
