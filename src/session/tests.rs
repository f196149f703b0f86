use super::*;
use crate::test_support::{FakeCapture, FakeEngine, FakeRecorder, MemorySink};

type TestSession = RecordingSession<FakeRecorder, FakeEngine, MemorySink>;

fn options(transcode: bool) -> SessionOptions {
    SessionOptions {
        mime_type: MimeType::Webm,
        transcode: transcode.then(|| TranscodeJob::new(60, "00:00:01")),
    }
}

async fn open_session(payload: &[u8], transcode: bool) -> TestSession {
    RecordingSession::open(
        &mut FakeCapture::granting(),
        MediaConstraints::default(),
        FakeRecorder::with_payload(payload),
        FakeEngine::default(),
        MemorySink::default(),
        options(transcode),
    )
    .await
    .unwrap()
}

/// Records and stops, leaving the session in Stopped.
async fn record(session: &mut TestSession) {
    assert_eq!(session.activate().await.unwrap(), Activation::Started);
    assert_eq!(session.activate().await.unwrap(), Activation::Stopped);
}

#[tokio::test]
async fn test_open_requests_fixed_constraints_and_previews_stream() {
    let mut capture = FakeCapture::granting();
    let session: TestSession = RecordingSession::open(
        &mut capture,
        MediaConstraints::default(),
        FakeRecorder::with_payload(b"x"),
        FakeEngine::default(),
        MemorySink::default(),
        options(true),
    )
    .await
    .unwrap();

    assert_eq!(capture.requests, vec![MediaConstraints::default()]);
    assert_eq!(session.state(), &SessionState::Idle);
    assert_eq!(
        session.preview().source(),
        &PreviewSource::Live("fake camera".to_string())
    );
    assert_eq!(session.control().icon(), Icon::Record);
}

#[tokio::test]
async fn test_denied_capture_never_creates_a_session() {
    let result: Result<TestSession> = RecordingSession::open(
        &mut FakeCapture::denying(),
        MediaConstraints::default(),
        FakeRecorder::with_payload(b"x"),
        FakeEngine::default(),
        MemorySink::default(),
        options(false),
    )
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_control_always_has_one_matching_handler() {
    let mut session = open_session(b"webm-bytes", true).await;
    let mut seen = vec![(session.state().kind(), session.control().handler())];

    session.activate().await.unwrap();
    seen.push((session.state().kind(), session.control().handler()));
    session.activate().await.unwrap();
    seen.push((session.state().kind(), session.control().handler()));
    session.activate().await.unwrap();
    seen.push((session.state().kind(), session.control().handler()));
    session.drive().await.unwrap();
    seen.push((session.state().kind(), session.control().handler()));

    assert_eq!(
        seen,
        vec![
            (StateKind::Idle, Handler::Start),
            (StateKind::Recording, Handler::Stop),
            (StateKind::Stopped, Handler::Download),
            (StateKind::Transcoding, Handler::Download),
            (StateKind::Idle, Handler::Start),
        ]
    );
}

#[tokio::test]
async fn test_stop_loops_raw_recording_in_preview() {
    let mut session = open_session(b"webm-bytes", false).await;
    record(&mut session).await;

    let raw = match session.state() {
        SessionState::Stopped { raw } => raw.clone(),
        other => panic!("expected Stopped, got {other:?}"),
    };
    assert!(session.preview().references(&raw));
    assert!(session.preview().is_looped());
    assert!(session.preview().is_playing());
    assert_eq!(
        session.registry().resolve(&raw).map(|a| a.bytes().to_vec()),
        Some(b"webm-bytes".to_vec())
    );
    assert_eq!(session.control().label(), "Download Recording");
}

#[tokio::test]
async fn test_direct_download_saves_single_webm() {
    let mut session = open_session(b"webm-bytes", false).await;
    record(&mut session).await;

    let activation = session.activate().await.unwrap();

    assert_eq!(
        activation,
        Activation::Downloaded(CycleReport {
            files: vec![PathBuf::from("/downloads/MyRecording.webm")],
            transcoded: false,
        })
    );
    assert_eq!(session.sink().names(), vec!["MyRecording.webm"]);
    assert_eq!(session.sink().saved[0].1.bytes(), b"webm-bytes");
    assert!(session.registry().is_empty());
    assert_eq!(session.state(), &SessionState::Idle);
    assert_eq!(session.control().label(), "Record Again");
    assert_eq!(session.engine().loads, 0);
}

#[tokio::test]
async fn test_transcode_path_saves_mp4_and_thumbnail() {
    let mut session = open_session(b"webm-bytes", true).await;
    record(&mut session).await;

    assert_eq!(session.activate().await.unwrap(), Activation::TranscodePending);
    assert!(!session.control().is_enabled());
    assert_eq!(session.control().label(), "Transcoding…");
    assert!(session.has_pending_work());

    let report = session.drive().await.unwrap().unwrap();

    assert!(report.transcoded);
    assert_eq!(session.sink().names(), vec!["MyRecording.mp4", "MyThumbnail.jpg"]);
    assert_eq!(session.sink().saved[0].1.mime_type(), MimeType::Mp4);
    assert_eq!(session.sink().saved[1].1.bytes(), b"thumbnail.jpg:webm-bytes");
    assert!(session.registry().is_empty());
    assert_eq!(session.registry().created_count(), 3);
    assert!(session.control().is_enabled());
    assert_eq!(session.control().icon(), Icon::Record);
    assert!(!session.has_pending_work());
}

#[tokio::test]
async fn test_transcode_runs_reformat_then_thumbnail() {
    let mut session = open_session(b"webm-bytes", true).await;
    record(&mut session).await;
    session.activate().await.unwrap();
    session.drive().await.unwrap();

    let runs = &session.engine().runs;
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0], ["-i", "recording.webm", "-r", "60", "output.mp4"]);
    assert_eq!(
        runs[1],
        ["-i", "recording.webm", "-ss", "00:00:01", "-frames:v", "1", "thumbnail.jpg"]
    );
}

#[tokio::test]
async fn test_two_cycles_leave_engine_filesystem_empty() {
    let mut session = open_session(b"webm-bytes", true).await;

    for cycle in 1..=2 {
        record(&mut session).await;
        session.activate().await.unwrap();
        session.drive().await.unwrap();

        let engine = session.engine();
        assert!(engine.files.is_empty(), "cycle {cycle} left files behind");
        assert_eq!(engine.writes, cycle);
        assert_eq!(engine.unlinks, engine.writes + engine.produced);
        assert!(session.registry().is_empty());
    }

    // The engine is loaded once and reused
    assert_eq!(session.engine().loads, 1);
    assert_eq!(session.sink().saved.len(), 4);
}

#[tokio::test]
async fn test_empty_recording_never_downloads() {
    let mut session = open_session(b"", true).await;

    assert_eq!(session.activate().await.unwrap(), Activation::Started);
    assert_eq!(session.activate().await.unwrap(), Activation::Discarded);

    assert_eq!(session.state(), &SessionState::Idle);
    assert_eq!(session.control().handler(), Handler::Start);
    assert!(session.registry().is_empty());
    assert_eq!(session.registry().created_count(), 0);
    assert!(session.sink().saved.is_empty());
    assert_eq!(session.drive().await.unwrap(), None);
}

#[tokio::test]
async fn test_activation_while_transcoding_is_ignored() {
    let mut session = open_session(b"webm-bytes", true).await;
    record(&mut session).await;
    session.activate().await.unwrap();

    assert_eq!(session.activate().await.unwrap(), Activation::Ignored);
    assert_eq!(session.state().kind(), StateKind::Transcoding);
    assert!(session.sink().saved.is_empty());
}

#[tokio::test]
async fn test_engine_load_failure_halts_with_control_disabled() {
    let mut session = open_session(b"webm-bytes", true).await;
    session.engine.fail_load = true;
    record(&mut session).await;
    session.activate().await.unwrap();

    assert!(session.drive().await.is_err());
    assert_eq!(session.state().kind(), StateKind::Transcoding);
    assert!(!session.control().is_enabled());
    assert!(session.sink().saved.is_empty());
}

#[tokio::test]
async fn test_engine_run_failure_still_cleans_engine_files() {
    let mut session = open_session(b"webm-bytes", true).await;
    session.engine.fail_run = true;
    record(&mut session).await;
    session.activate().await.unwrap();

    assert!(session.drive().await.is_err());
    assert!(session.engine().files.is_empty());
    assert_eq!(session.engine().writes, 1);
    assert_eq!(session.engine().unlinks, 1);
}

#[tokio::test]
async fn test_recording_elapsed_only_while_recording() {
    let mut session = open_session(b"webm-bytes", false).await;
    assert!(session.recording_elapsed().is_none());

    session.activate().await.unwrap();
    assert!(session.recording_elapsed().is_some());
    assert!(session.recorder.is_recording());

    session.activate().await.unwrap();
    assert!(session.recording_elapsed().is_none());
    assert!(!session.recorder.is_recording());
}

#[tokio::test]
async fn test_recorder_failure_halts_without_running_timer() {
    let mut session = open_session(b"webm-bytes", true).await;
    session.recorder.fail_delivery = true;

    assert_eq!(session.activate().await.unwrap(), Activation::Started);
    let err = session.activate().await.unwrap_err();

    assert!(err.to_string().contains("device disconnected"));
    assert_eq!(session.state(), &SessionState::Idle);
    assert!(session.recording_elapsed().is_none());
    assert!(!session.control().is_enabled());
    assert_eq!(session.control().label(), "Recorder failed");
    assert!(session.registry().is_empty());
    assert_eq!(session.activate().await.unwrap(), Activation::Ignored);
}
