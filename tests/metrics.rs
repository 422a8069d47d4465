//! The metrics recorder is process-global, so it gets a test binary of its own.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fpml_intake::{
    DuplicateCheckResult, ExtractError, IncomingMessage, IngestError, Pipeline, PipelineMetrics,
    set_pipeline_metrics,
};

#[derive(Default)]
struct Recorded {
    decodes: Vec<Result<(), IngestError>>,
    validations: Vec<usize>,
    extractions: Vec<Result<(), ExtractError>>,
    duplicate_checks: usize,
}

#[derive(Default)]
struct RecordingMetrics {
    seen: Mutex<Recorded>,
}

impl PipelineMetrics for RecordingMetrics {
    fn record_decode(&self, _latency: Duration, result: Result<(), IngestError>) {
        self.seen.lock().unwrap().decodes.push(result);
    }

    fn record_validation(&self, _latency: Duration, error_findings: usize) {
        self.seen.lock().unwrap().validations.push(error_findings);
    }

    fn record_extraction(&self, _latency: Duration, result: Result<(), ExtractError>) {
        self.seen.lock().unwrap().extractions.push(result);
    }

    fn record_duplicate_check(&self, _latency: Duration, _check: &DuplicateCheckResult) {
        self.seen.lock().unwrap().duplicate_checks += 1;
    }
}

fn message(content_base64: String) -> IncomingMessage {
    IncomingMessage::new(
        "MSG-M",
        "TradeConfirmation",
        "5.12",
        "529900T8BM49AURSDO55",
        content_base64,
    )
}

#[tokio::test]
async fn recorder_sees_every_stage_that_ran() {
    let metrics = Arc::new(RecordingMetrics::default());
    let recorder: Arc<dyn PipelineMetrics> = metrics.clone();
    set_pipeline_metrics(Some(recorder));
    let pipeline = Pipeline::default();

    let valid = STANDARD.encode("<dataDocument><trade/><party/></dataDocument>");
    let invalid = STANDARD.encode("<dataDocument/>");
    pipeline.process(&message(valid)).await;
    pipeline.process(&message(invalid)).await;
    pipeline.process(&message("%%%".into())).await;

    set_pipeline_metrics(None);

    let seen = metrics.seen.lock().unwrap();
    assert_eq!(seen.decodes.len(), 3);
    assert!(seen.decodes[0].is_ok());
    assert!(seen.decodes[1].is_ok());
    assert!(matches!(seen.decodes[2], Err(IngestError::Decode(_))));
    // the third message never reached validation
    assert_eq!(seen.validations, vec![0, 1]);
    assert_eq!(seen.extractions.len(), 1);
    assert!(seen.extractions[0].is_ok());
    assert_eq!(seen.duplicate_checks, 2);
}
