use serde::{Deserialize, Serialize};

/// Progress message published on the job log channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub initiator: String,
    pub job_id: String,
    pub message: String,
}

impl LogEvent {
    pub fn new(initiator: &str, job_id: &str, message: impl Into<String>) -> Self {
        Self {
            initiator: initiator.to_string(),
            job_id: job_id.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_snake_case_keys() {
        let event = LogEvent::new("reel-indexer-host", "job-1", "Done");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["initiator"], "reel-indexer-host");
        assert_eq!(json["job_id"], "job-1");
        assert_eq!(json["message"], "Done");
    }
}
