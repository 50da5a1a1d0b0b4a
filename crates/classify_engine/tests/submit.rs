use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use classify_engine::{
    ClassifySettings, Classifier, CycleProgress, EngineEvent, FailureKind, ProgressSink,
    ReqwestClassifier, Stage,
};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLASSIFIED: &str = "source,log_message,target_label\nModernCRM,\"IP 1.2.3.4 blocked\",Security Alert\n";

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn upload_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("logs")
        .suffix(".csv")
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn settings_for(server: &MockServer) -> ClassifySettings {
    ClassifySettings {
        endpoint: format!("{}/classify/", server.uri()),
        ..ClassifySettings::default()
    }
}

#[tokio::test]
async fn classifier_posts_multipart_file_and_returns_raw_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify/"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("source,log_message"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(CLASSIFIED, "text/csv"))
        .expect(1)
        .mount(&server)
        .await;

    let file = upload_file("source,log_message\nModernCRM,IP 1.2.3.4 blocked\n");
    let classifier = ReqwestClassifier::new(settings_for(&server));
    let sink = TestSink::new();

    let output = classifier
        .classify(1, file.path(), &sink)
        .await
        .expect("classify ok");

    assert_eq!(output.bytes, CLASSIFIED.as_bytes());
    assert_eq!(output.metadata.status, 200);
    assert_eq!(output.metadata.byte_len, CLASSIFIED.len() as u64);
    assert!(output.metadata.file_name.ends_with(".csv"));
    assert!(output
        .metadata
        .content_type
        .unwrap()
        .starts_with("text/csv"));

    let stages = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::Progress(CycleProgress { stage, cycle, .. }) => {
                assert_eq!(cycle, 1);
                Some(stage)
            }
            _ => None,
        })
        .collect::<Vec<_>>();
    assert!(stages.contains(&Stage::Uploading));
    assert!(stages.contains(&Stage::Receiving));
}

#[tokio::test]
async fn classifier_reports_service_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify/"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid file"))
        .mount(&server)
        .await;

    let file = upload_file("not,really\n");
    let classifier = ReqwestClassifier::new(settings_for(&server));

    let err = classifier
        .classify(2, file.path(), &TestSink::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(400));
    assert_eq!(err.message, "invalid file");
}

#[tokio::test]
async fn empty_error_body_falls_back_to_status_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let file = upload_file("a\n");
    let classifier = ReqwestClassifier::new(settings_for(&server));

    let err = classifier
        .classify(3, file.path(), &TestSink::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert!(err.message.contains("500"));
}

#[tokio::test]
async fn missing_file_fails_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let classifier = ReqwestClassifier::new(settings_for(&server));
    let err = classifier
        .classify(4, std::path::Path::new("/definitely/not/here.csv"), &TestSink::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::FileUnreadable);
    assert!(err.message.contains("here.csv"));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_failure() {
    let file = upload_file("a\n");
    let classifier = ReqwestClassifier::new(ClassifySettings {
        endpoint: "http://127.0.0.1:1/classify/".to_string(),
        ..ClassifySettings::default()
    });

    let err = classifier
        .classify(5, file.path(), &TestSink::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);
}

#[tokio::test]
async fn invalid_endpoint_is_rejected() {
    let file = upload_file("a\n");
    let classifier = ReqwestClassifier::new(ClassifySettings {
        endpoint: "not a url".to_string(),
        ..ClassifySettings::default()
    });

    let err = classifier
        .classify(6, file.path(), &TestSink::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidEndpoint);
}

#[tokio::test]
async fn classifier_times_out_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let file = upload_file("a\n");
    let classifier = ReqwestClassifier::new(ClassifySettings {
        request_timeout: Some(Duration::from_millis(50)),
        ..settings_for(&server)
    });

    let err = classifier
        .classify(7, file.path(), &TestSink::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn classifier_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("01234567890"))
        .mount(&server)
        .await;

    let file = upload_file("a\n");
    let classifier = ReqwestClassifier::new(ClassifySettings {
        max_bytes: 10,
        ..settings_for(&server)
    });

    let err = classifier
        .classify(8, file.path(), &TestSink::new())
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}
