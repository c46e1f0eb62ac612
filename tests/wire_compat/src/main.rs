fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use serde::Deserialize;
    use serde_json::Value;
    use snaptrack_protocol::fields::{self, PollStatus};
    use snaptrack_protocol::{JobHandle, ProgressEvent, ResultId};
    use snaptrack_tracker::push::parse_message;

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads and deserializes a fixture file.
    fn load_fixture<T: serde::de::DeserializeOwned>(name: &str) -> T {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    #[derive(Deserialize)]
    struct UploadCase {
        name: String,
        body: Value,
        job: Option<String>,
    }

    #[derive(Deserialize)]
    struct StatusCase {
        name: String,
        body: Value,
        result: Option<String>,
    }

    #[derive(Deserialize)]
    struct PushCase {
        name: String,
        text: String,
        result: Option<String>,
    }

    #[test]
    fn upload_responses() {
        let cases: Vec<UploadCase> = load_fixture("upload_responses.json");
        assert!(!cases.is_empty());
        for case in cases {
            assert_eq!(
                fields::job_id(&case.body),
                case.job.map(JobHandle::new),
                "upload case {}",
                case.name
            );
        }
    }

    #[test]
    fn status_responses() {
        let cases: Vec<StatusCase> = load_fixture("status_responses.json");
        assert!(!cases.is_empty());
        for case in cases {
            let expected = match case.result {
                Some(id) => PollStatus::Ready(ResultId::new(id)),
                None => PollStatus::Pending,
            };
            assert_eq!(
                fields::poll_status(&case.body),
                expected,
                "status case {}",
                case.name
            );
        }
    }

    #[test]
    fn push_messages() {
        let cases: Vec<PushCase> = load_fixture("push_messages.json");
        assert!(!cases.is_empty());
        for case in cases {
            assert_eq!(
                parse_message(&case.text),
                case.result.map(ResultId::new),
                "push case {}",
                case.name
            );
        }
    }

    /// Every event shape deserializes and re-serializes unchanged.
    #[test]
    fn progress_event_shapes() {
        let fixtures: Vec<Value> = load_fixture("progress_events.json");
        for fixture in fixtures {
            let parsed: ProgressEvent = serde_json::from_value(fixture.clone())
                .unwrap_or_else(|e| panic!("failed to deserialize {fixture}: {e}"));
            let reserialized = serde_json::to_value(&parsed).unwrap();
            assert_eq!(fixture, reserialized, "roundtrip mismatch for {fixture}");
        }
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let result = serde_json::from_str::<ProgressEvent>(r#"{"type":"paused"}"#);
        assert!(result.is_err());
    }
}
