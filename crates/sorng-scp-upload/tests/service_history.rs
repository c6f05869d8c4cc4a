mod common;

use common::*;
use sorng_scp_upload::scp::*;

#[tokio::test]
async fn records_success_and_failure_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let good = local_file(&dir, "good.txt", b"hello");

    let svc = ScpService::new(
        ScpUploader::new(config("/tmp"), MockTransport::replying(&[0, 0, 0])).unwrap(),
    );
    let stats = svc.upload(good.clone()).await.unwrap();
    assert_eq!(stats.total_bytes, 5);
    let _ = svc.upload(dir.path().join("missing.txt")).await.unwrap_err();

    let records = svc.get_history(None);
    assert_eq!(records.len(), 2);
    assert!(!records[0].success);
    assert!(records[1].success);
    assert_eq!(records[1].bytes_transferred, 5);
    assert_eq!(records[1].host, "files.example");
    assert_eq!(records[1].remote_directory, "/tmp");
    assert_ne!(records[0].transfer_id, records[1].transfer_id);

    let summary = svc.history_stats();
    assert_eq!(summary.total_transfers, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.total_bytes, 5);

    assert_eq!(svc.get_history(Some(1)).len(), 1);
    assert_eq!(svc.clear_history(), 2);
    assert!(svc.get_history(None).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_uploads_use_separate_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let a = local_file(&dir, "a.txt", b"aaaa");
    let b = local_file(&dir, "b.txt", b"bbbbbbbb");

    let transport = MockTransport::replying(&[0, 0, 0]);
    let tracker = transport.tracker.clone();
    let svc = ScpService::new(ScpUploader::new(config("."), transport).unwrap());

    let (ra, rb) = tokio::join!(svc.upload(a), svc.upload(b));
    assert_eq!(ra.unwrap().total_bytes, 4);
    assert_eq!(rb.unwrap().total_bytes, 8);

    let st = tracker.state();
    assert_eq!(st.sessions_opened, 2);
    assert_eq!(st.session_disconnects, 2);
    assert_eq!(st.channel_disconnects, 2);
    assert_eq!(svc.history_stats().succeeded, 2);
}

#[tokio::test]
async fn remote_rejection_is_recorded_with_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = local_file(&dir, "f.txt", b"x");
    let mut replies = vec![0u8, 1];
    replies.extend_from_slice(b"disk full\n");
    let svc = ScpService::new(
        ScpUploader::new(config("/tmp"), MockTransport::replying(&replies)).unwrap(),
    );

    let err = svc.upload(path).await.unwrap_err();
    assert_eq!(err.kind, ScpErrorKind::RemoteError);

    let records = svc.get_history(None);
    assert!(records[0].error.as_deref().unwrap().contains("disk full"));
}
