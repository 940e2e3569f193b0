//! Storage gateway tests.

use rstest::rstest;
use serde_json::json;
use taskdeck::task::{
    adapters::http::UPLOAD_CHUNK_BYTES,
    domain::{AttachmentKey, UploadFile},
    ports::{BlobStore, BlobStoreError, IgnoreProgress},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

use super::helpers::{BEARER, RecordedProgress, blob_store};

const KEY: &str = "attachments/dana/1/1700000000000-report.pdf";
const OBJECT_PATH: &str = "/storage/objects/attachments/dana/1/1700000000000-report.pdf";

fn key() -> AttachmentKey {
    AttachmentKey::new(KEY).expect("valid key")
}

#[rstest]
#[tokio::test]
async fn put_streams_bytes_and_reports_progress() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(OBJECT_PATH))
        .and(header("content-type", "application/pdf"))
        .and(header("authorization", BEARER))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let size = UPLOAD_CHUNK_BYTES * 2 + 100;
    let file = UploadFile::new("report.pdf", "application/pdf", vec![b'p'; size])
        .expect("valid upload");
    let progress = RecordedProgress::default();

    blob_store(&server)
        .put(&key(), &file, &progress)
        .await
        .expect("upload succeeds");

    let reports = progress.reports();
    let total = file.len();
    assert!(reports.iter().all(|&(_, reported_total)| reported_total == total));
    assert!(reports.windows(2).all(|pair| pair.first() <= pair.last()));
    assert_eq!(reports.last(), Some(&(total, total)));

    let received = server.received_requests().await.expect("recording enabled");
    let body = received.first().map(|request| request.body.len());
    assert_eq!(body, Some(size));
}

#[rstest]
#[tokio::test]
async fn rejected_upload_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(413).set_body_string("too large"))
        .mount(&server)
        .await;
    let file = UploadFile::new("report.pdf", "application/pdf", vec![1, 2, 3])
        .expect("valid upload");

    let err = blob_store(&server)
        .put(&key(), &file, &IgnoreProgress)
        .await
        .expect_err("upload fails");

    assert!(matches!(err, BlobStoreError::Rejected { status: 413, .. }));
}

#[rstest]
#[tokio::test]
async fn url_is_presigned_by_the_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/presign"))
        .and(body_json(json!({"key": KEY})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"url": "https://cdn.test/signed?sig=abc"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = blob_store(&server).url(&key()).await.expect("presign succeeds");

    assert_eq!(url, "https://cdn.test/signed?sig=abc");
}

#[rstest]
#[tokio::test]
async fn removing_a_missing_object_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = blob_store(&server)
        .remove(&key())
        .await
        .expect_err("remove fails");

    assert!(matches!(err, BlobStoreError::NotFound(ref missing) if *missing == key()));
}

#[rstest]
#[tokio::test]
async fn key_segments_are_percent_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/storage/objects/attachments/dana/1/5-my%20notes.txt"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let spaced = AttachmentKey::new("attachments/dana/1/5-my notes.txt").expect("valid key");
    blob_store(&server)
        .remove(&spaced)
        .await
        .expect("remove succeeds");
}
