//! Concurrency, batching and cross-message duplicate detection.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fpml_intake::{
    InMemoryDuplicateStore, IncomingMessage, Pipeline, PipelineConfig, ProcessingFlags,
    ValidationStatus,
};

fn confirmation(trade_id: &str) -> String {
    format!(
        r#"<requestConfirmation>
  <trade><tradeHeader><partyTradeIdentifier><tradeId>{trade_id}</tradeId></partyTradeIdentifier></tradeHeader></trade>
  <party id="a"/>
</requestConfirmation>"#
    )
}

fn message(id: &str, xml: &str) -> IncomingMessage {
    IncomingMessage::new(
        id,
        "TradeConfirmation",
        "5.12",
        "529900T8BM49AURSDO55",
        STANDARD.encode(xml),
    )
}

#[tokio::test]
async fn batch_results_keep_input_order() {
    let pipeline = Pipeline::new(PipelineConfig {
        max_concurrency: 3,
        ..Default::default()
    });
    let messages: Vec<_> = (0..20)
        .map(|i| {
            if i % 4 == 0 {
                let mut bad = message(&format!("MSG-{i}"), "");
                bad.content_base64 = "***".into();
                bad
            } else {
                message(&format!("MSG-{i}"), &confirmation(&format!("TRD-{i}")))
            }
        })
        .collect();

    let processed = pipeline.process_batch(&messages).await;

    assert_eq!(processed.len(), messages.len());
    for (i, (message, processed)) in messages.iter().zip(&processed).enumerate() {
        assert_eq!(processed.result.message_id, message.message_id);
        if i % 4 == 0 {
            assert_eq!(processed.result.validation_status, ValidationStatus::SchemaError);
        } else {
            let data = processed.result.extracted_data.as_ref().unwrap();
            assert_eq!(data.trade_id.as_deref(), Some(format!("TRD-{i}").as_str()));
        }
    }
}

#[tokio::test]
async fn empty_batch_is_empty() {
    let processed = Pipeline::default().process_batch(&[]).await;
    assert!(processed.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_pipeline_across_tasks() {
    let pipeline = Arc::new(Pipeline::default());

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move {
                let msg = message(&format!("MSG-{i}"), &confirmation(&format!("TRD-{i}")));
                pipeline.process(&msg).await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let processed = handle.await.expect("task completes");
        assert_eq!(processed.result.validation_status, ValidationStatus::Valid);
        let data = processed.result.extracted_data.unwrap();
        assert_eq!(data.trade_id, Some(format!("TRD-{i}")));
    }
}

#[tokio::test]
async fn reprocessing_is_deterministic_apart_from_identity() {
    let pipeline = Pipeline::default();
    let msg = message("MSG-1", &confirmation("TRD-1"));

    let first = pipeline.process(&msg).await;
    let second = pipeline.process(&msg).await;

    assert_ne!(first.result.processing_id, second.result.processing_id);
    assert_eq!(first.fingerprint, second.fingerprint);
    assert_eq!(first.decoded_len, second.decoded_len);
    assert_eq!(first.result.validation_status, second.result.validation_status);
    assert_eq!(first.result.findings, second.result.findings);
    assert_eq!(first.result.extracted_data, second.result.extracted_data);
}

#[tokio::test]
async fn resubmitted_content_is_flagged_as_duplicate() {
    let store = Arc::new(InMemoryDuplicateStore::new());
    let pipeline = Pipeline::with_store(PipelineConfig::default(), store.clone());
    let xml = confirmation("TRD-DUP");

    let original = pipeline.process(&message("MSG-1", &xml)).await;
    assert!(!original.result.is_duplicate());
    assert_eq!(store.len(), 1);

    let resubmitted = pipeline.process(&message("MSG-2", &xml)).await;
    let check = resubmitted.result.duplicate_check.as_ref().unwrap();
    assert!(check.is_duplicate);
    assert_eq!(check.original_message_id.as_deref(), Some("MSG-1"));
    // still processed; the caller decides what a duplicate means
    assert_eq!(resubmitted.result.validation_status, ValidationStatus::Valid);

    let same_id = pipeline
        .process(&message("MSG-1", &confirmation("TRD-OTHER")))
        .await;
    assert!(same_id.result.is_duplicate());

    let fresh = pipeline
        .process(&message("MSG-3", &confirmation("TRD-NEW")))
        .await;
    assert!(!fresh.result.is_duplicate());
}

#[tokio::test]
async fn skipped_check_does_not_remember_the_message() {
    let store = Arc::new(InMemoryDuplicateStore::new());
    let pipeline = Pipeline::with_store(PipelineConfig::default(), store.clone());
    let msg = message("MSG-1", &confirmation("TRD-1")).with_flags(ProcessingFlags {
        skip_duplicate_check: true,
        ..Default::default()
    });

    let processed = pipeline.process(&msg).await;

    assert!(processed.result.duplicate_check.is_none());
    assert!(store.is_empty());
}
