//! Recording session scenarios driven through mock ports

mod common;

use std::sync::{Arc, Mutex};

use common::*;
use folder_recorder::application::ports::{CaptureError, FolderError};
use folder_recorder::application::{
    BlobStore, ControllerConfig, ErrorKind, RecordingController, SessionCallbacks, SessionError,
    SessionPorts,
};
use folder_recorder::domain::persistence::SaveOutcome;
use folder_recorder::domain::recording::{Duration, RecordingFormat};
use folder_recorder::domain::session::SessionStatus;
use folder_recorder::infrastructure::{NoOpAudioCue, NoOpNotifier};

type Controller = RecordingController<
    MockMicrophone,
    MockEncoder,
    MockVisualizers,
    MockDownloader,
    NoOpNotifier,
    NoOpAudioCue,
>;

struct Setup {
    mic: MicBehavior,
    encoder: MockEncoder,
    config: ControllerConfig,
    download_fails: bool,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            mic: MicBehavior::Grant,
            encoder: MockEncoder::new(EncoderBehavior::Finalize(b"test audio data".to_vec())),
            config: ControllerConfig::default(),
            download_fails: false,
        }
    }
}

struct Harness {
    controller: Controller,
    mic_opens: Counter,
    track_stops: Counter,
    encoder_starts: Counter,
    visualizers: MockVisualizers,
    log: CallLog,
    store: BlobStore,
    downloads: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    errors: Arc<Mutex<Vec<SessionError>>>,
    statuses: Arc<Mutex<Vec<SessionStatus>>>,
    released: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    fn new(setup: Setup) -> Self {
        let store = BlobStore::new();
        let log = CallLog::default();
        let microphone = MockMicrophone::new(setup.mic);
        let mic_opens = microphone.opens.clone();
        let track_stops = microphone.track_stops.clone();
        let encoder_starts = setup.encoder.starts.clone();
        let visualizers = MockVisualizers::default();
        let mut downloader = MockDownloader::new(store.clone(), log.clone());
        downloader.fail = setup.download_fails;
        let downloads = downloader.downloads.clone();

        let errors = Arc::new(Mutex::new(Vec::new()));
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let released = Arc::new(Mutex::new(Vec::new()));
        let callbacks = {
            let errors = errors.clone();
            let statuses = statuses.clone();
            let released = released.clone();
            SessionCallbacks {
                on_status: Some(Box::new(move |s| statuses.lock().unwrap().push(s))),
                on_error: Some(Box::new(move |e: &SessionError| {
                    errors.lock().unwrap().push(e.clone())
                })),
                on_saved: None,
                on_folder_released: Some(Box::new(move |name: &str| {
                    released.lock().unwrap().push(name.to_string())
                })),
            }
        };

        let ports = SessionPorts {
            microphone,
            encoder: setup.encoder,
            visualizers: visualizers.clone(),
            downloader,
            notifier: NoOpNotifier,
            cues: NoOpAudioCue,
        };
        let controller =
            RecordingController::new(ports, store.clone(), setup.config).with_callbacks(callbacks);

        Self {
            controller,
            mic_opens,
            track_stops,
            encoder_starts,
            visualizers,
            log,
            store,
            downloads,
            errors,
            statuses,
            released,
        }
    }

    fn folder(&self, name: &str, behavior: FolderBehavior) -> MockFolder {
        MockFolder::new(name, behavior, self.log.clone())
    }

    async fn select(&mut self, folder: &MockFolder) {
        let picker = MockPicker {
            result: Ok(folder.clone()),
        };
        self.controller.select_folder(&picker).await.unwrap();
    }

    async fn record(&mut self) -> SaveOutcome {
        self.controller.start().await.unwrap();
        self.controller.stop().await.unwrap().unwrap()
    }

    fn errors(&self) -> Vec<SessionError> {
        self.errors.lock().unwrap().clone()
    }
}

fn short_timeouts() -> ControllerConfig {
    ControllerConfig {
        permission_timeout: Duration::from_millis(50),
        write_timeout: Duration::from_millis(50),
        ..ControllerConfig::default()
    }
}

#[tokio::test]
async fn start_without_folder_never_touches_microphone() {
    let mut h = Harness::new(Setup::default());

    let err = h.controller.start().await.unwrap_err();

    assert_eq!(err, SessionError::FolderRequired);
    assert_eq!(h.mic_opens.get(), 0);
    assert_eq!(h.controller.status(), SessionStatus::Idle);
    assert_eq!(h.errors(), vec![SessionError::FolderRequired]);
}

#[tokio::test]
async fn recording_is_saved_into_selected_folder() {
    let mut h = Harness::new(Setup::default());
    let folder = h.folder("test-folder", FolderBehavior::Accept);
    h.select(&folder).await;
    assert_eq!(h.controller.folder_name(), Some("test-folder"));

    let outcome = h.record().await;

    match &outcome {
        SaveOutcome::SavedToFolder(path) => {
            assert!(path.to_string_lossy().contains("test-folder"))
        }
        other => panic!("expected folder save, got {:?}", other),
    }
    let written = folder.written();
    assert_eq!(written.len(), 1);
    assert!(written[0].0.starts_with("recording-"));
    assert!(written[0].0.ends_with(".webm"));
    assert_eq!(written[0].1, b"test audio data");
    assert_eq!(h.log.entries(), vec!["folder:test-folder"]);
    assert_eq!(h.controller.status(), SessionStatus::Idle);
    assert!(h.errors().is_empty());
}

#[tokio::test]
async fn status_walks_through_the_cycle() {
    let mut h = Harness::new(Setup::default());
    let folder = h.folder("takes", FolderBehavior::Accept);
    h.select(&folder).await;

    h.record().await;

    assert_eq!(
        *h.statuses.lock().unwrap(),
        vec![
            SessionStatus::Requesting,
            SessionStatus::Recording,
            SessionStatus::Stopping,
            SessionStatus::Idle,
        ]
    );
}

#[tokio::test]
async fn denied_folder_write_falls_back_to_download() {
    let mut h = Harness::new(Setup::default());
    let folder = h.folder(
        "test-folder",
        FolderBehavior::Reject(FolderError::PermissionDenied("Permission denied".to_string())),
    );
    h.select(&folder).await;

    let outcome = h.record().await;

    match &outcome {
        SaveOutcome::Downloaded(path) => assert!(path.to_string_lossy().contains("downloads")),
        other => panic!("expected download, got {:?}", other),
    }
    // Folder is tried before the download path
    assert_eq!(h.log.entries(), vec!["folder:test-folder", "download"]);
    assert_eq!(h.downloads.lock().unwrap()[0].1, b"test audio data");
    // Download URL created and revoked; the kept result holds the other one
    assert_eq!(h.store.created_count(), 2);
    assert_eq!(h.store.revoked_count(), 1);
    assert_eq!(h.store.live_count(), 1);
    // Fallback is not an error
    assert!(h.errors().is_empty());
}

#[tokio::test]
async fn failed_download_fallback_is_reported() {
    let mut h = Harness::new(Setup {
        download_fails: true,
        ..Setup::default()
    });
    let folder = h.folder("test-folder", FolderBehavior::Reject(FolderError::Unsupported));
    h.select(&folder).await;

    let outcome = h.record().await;

    assert!(matches!(outcome, SaveOutcome::Failed(_)));
    let errors = h.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::Persistence);
    assert_eq!(h.controller.status(), SessionStatus::Idle);
    assert_eq!(h.store.live_count(), 1);
}

#[tokio::test]
async fn microphone_denial_is_reported_and_start_stays_available() {
    let mut h = Harness::new(Setup {
        mic: MicBehavior::Deny(CaptureError::PermissionDenied("Permission denied".to_string())),
        ..Setup::default()
    });
    let folder = h.folder("test-folder", FolderBehavior::Accept);
    h.select(&folder).await;

    let err = h.controller.start().await.unwrap_err();

    let expected = SessionError::Microphone(CaptureError::PermissionDenied(
        "Permission denied".to_string(),
    ));
    assert_eq!(err, expected);
    assert_eq!(err.to_string(), "Permission denied");
    assert_eq!(err.kind(), ErrorKind::Permission);
    assert_eq!(h.errors(), vec![expected]);
    assert_eq!(h.controller.status(), SessionStatus::Idle);
    assert_eq!(h.encoder_starts.get(), 0);

    // Not stuck: the next attempt reaches the microphone again
    let _ = h.controller.start().await;
    assert_eq!(h.mic_opens.get(), 2);
}

#[tokio::test]
async fn encoder_error_mid_session_is_reported_and_saved() {
    let mut h = Harness::new(Setup {
        encoder: MockEncoder::new(EncoderBehavior::FailAfterStart),
        ..Setup::default()
    });
    let folder = h.folder("test-folder", FolderBehavior::Accept);
    h.select(&folder).await;
    h.controller.start().await.unwrap();

    let event = h.controller.next_encoder_event().await.unwrap();
    let outcome = h.controller.handle_encoder_event(event).await.unwrap();

    let errors = h.errors();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], SessionError::Encoding(_)));
    assert_eq!(errors[0].kind(), ErrorKind::Encoding);
    assert!(matches!(outcome, Some(SaveOutcome::SavedToFolder(_))));
    assert_eq!(h.controller.status(), SessionStatus::Idle);
    assert_eq!(h.track_stops.get(), 1);
}

#[tokio::test]
async fn encoder_error_after_a_chunk_keeps_the_chunk() {
    let mut h = Harness::new(Setup {
        encoder: MockEncoder::new(EncoderBehavior::FailAfterChunk(b"first second".to_vec())),
        ..Setup::default()
    });
    let folder = h.folder("test-folder", FolderBehavior::Accept);
    h.select(&folder).await;
    h.controller.start().await.unwrap();

    let event = h.controller.next_encoder_event().await.unwrap();
    assert!(h.controller.handle_encoder_event(event).await.unwrap().is_none());
    assert_eq!(h.controller.buffered_bytes(), 12);

    let event = h.controller.next_encoder_event().await.unwrap();
    let outcome = h.controller.handle_encoder_event(event).await.unwrap();

    assert!(matches!(outcome, Some(SaveOutcome::SavedToFolder(_))));
    assert_eq!(h.errors().len(), 1);
    let written = folder.written();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].1, b"first second");
    assert_eq!(h.controller.status(), SessionStatus::Idle);
}

#[tokio::test]
async fn encoder_init_failure_releases_microphone() {
    let mut h = Harness::new(Setup {
        encoder: MockEncoder::new(EncoderBehavior::InitFails),
        ..Setup::default()
    });
    let folder = h.folder("test-folder", FolderBehavior::Accept);
    h.select(&folder).await;

    let err = h.controller.start().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Encoding);
    assert_eq!(h.track_stops.get(), 1);
    assert_eq!(h.visualizers.created.get(), 0);
    assert_eq!(h.controller.status(), SessionStatus::Idle);
}

#[tokio::test]
async fn no_supported_format_is_a_capability_error() {
    let mut h = Harness::new(Setup {
        encoder: MockEncoder::new(EncoderBehavior::Numbered).supporting(vec![]),
        ..Setup::default()
    });
    let folder = h.folder("test-folder", FolderBehavior::Accept);
    h.select(&folder).await;

    let err = h.controller.start().await.unwrap_err();

    assert_eq!(err, SessionError::NoSupportedFormat);
    assert_eq!(err.to_string(), "No supported audio formats found");
    assert_eq!(err.kind(), ErrorKind::Capability);
    assert_eq!(h.mic_opens.get(), 0);
}

#[tokio::test]
async fn format_negotiation_prefers_opus() {
    let mut h = Harness::new(Setup::default());
    let folder = h.folder("f", FolderBehavior::Accept);
    h.select(&folder).await;
    assert_eq!(h.controller.start().await.unwrap(), RecordingFormat::WebmOpus);
    assert_eq!(h.controller.format(), Some(RecordingFormat::WebmOpus));
    h.controller.stop().await.unwrap();

    let mut h = Harness::new(Setup {
        encoder: MockEncoder::new(EncoderBehavior::Numbered).supporting(vec!["audio/webm"]),
        ..Setup::default()
    });
    h.select(&folder).await;
    assert_eq!(h.controller.start().await.unwrap(), RecordingFormat::Webm);
}

#[tokio::test]
async fn stop_releases_resources_exactly_once() {
    let mut h = Harness::new(Setup::default());
    let folder = h.folder("test-folder", FolderBehavior::Accept);
    h.select(&folder).await;
    h.controller.start().await.unwrap();
    assert!(h.controller.is_recording());

    let first = h.controller.stop().await.unwrap();
    let second = h.controller.stop().await.unwrap();

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(h.track_stops.get(), 1);
    assert_eq!(h.visualizers.created.get(), 1);
    assert_eq!(h.visualizers.destroyed.get(), 1);
}

#[tokio::test]
async fn start_while_recording_is_rejected() {
    let mut h = Harness::new(Setup::default());
    let folder = h.folder("test-folder", FolderBehavior::Accept);
    h.select(&folder).await;
    h.controller.start().await.unwrap();

    let err = h.controller.start().await.unwrap_err();

    assert!(matches!(err, SessionError::InvalidState(_)));
    assert_eq!(err.kind(), ErrorKind::State);
    assert_eq!(h.mic_opens.get(), 1);
    assert!(h.controller.is_recording());
}

#[tokio::test]
async fn each_session_starts_with_an_empty_buffer() {
    let mut h = Harness::new(Setup {
        encoder: MockEncoder::new(EncoderBehavior::Numbered),
        ..Setup::default()
    });
    let folder = h.folder("takes", FolderBehavior::Accept);
    h.select(&folder).await;

    h.record().await;
    h.record().await;

    let written = folder.written();
    assert_eq!(written[0].1, b"take-1");
    assert_eq!(written[1].1, b"take-2");
    assert_eq!(h.controller.last_result().unwrap().data(), b"take-2");
    // Superseded result URL was revoked
    assert_eq!(h.store.live_count(), 1);
    assert_eq!(
        h.visualizers.events(),
        vec![
            VisualizerEvent::Created(1),
            VisualizerEvent::Destroyed(1),
            VisualizerEvent::Created(2),
            VisualizerEvent::Destroyed(2),
        ]
    );
}

#[tokio::test]
async fn folder_is_kept_forever_without_retry_limit() {
    let mut h = Harness::new(Setup::default());
    let folder = h.folder("flaky", FolderBehavior::Reject(FolderError::WriteFailed("disk full".into())));
    h.select(&folder).await;

    for _ in 0..3 {
        assert!(matches!(h.record().await, SaveOutcome::Downloaded(_)));
    }

    assert_eq!(h.controller.folder_name(), Some("flaky"));
    assert!(h.released.lock().unwrap().is_empty());
}

#[tokio::test]
async fn folder_is_released_after_retry_limit() {
    let mut h = Harness::new(Setup {
        config: ControllerConfig {
            folder_retry_limit: 2,
            ..ControllerConfig::default()
        },
        ..Setup::default()
    });
    let folder = h.folder("flaky", FolderBehavior::Reject(FolderError::WriteFailed("disk full".into())));
    h.select(&folder).await;

    h.record().await;
    assert_eq!(h.controller.folder_name(), Some("flaky"));
    h.record().await;

    assert_eq!(h.controller.folder_name(), None);
    assert_eq!(*h.released.lock().unwrap(), vec!["flaky".to_string()]);
    assert_eq!(
        h.controller.start().await.unwrap_err(),
        SessionError::FolderRequired
    );
}

#[tokio::test]
async fn successful_write_resets_failure_count() {
    let mut h = Harness::new(Setup {
        config: ControllerConfig {
            folder_retry_limit: 2,
            ..ControllerConfig::default()
        },
        ..Setup::default()
    });
    let folder = h.folder("flaky", FolderBehavior::Reject(FolderError::WriteFailed("busy".into())));
    h.select(&folder).await;

    h.record().await;
    folder.set_behavior(FolderBehavior::Accept);
    h.record().await;
    folder.set_behavior(FolderBehavior::Reject(FolderError::WriteFailed("busy".into())));
    h.record().await;

    assert_eq!(h.controller.folder_name(), Some("flaky"));
}

#[tokio::test]
async fn resave_uses_newly_selected_folder() {
    let mut h = Harness::new(Setup::default());
    let broken = h.folder("broken", FolderBehavior::Reject(FolderError::NotFound("gone".into())));
    h.select(&broken).await;
    assert!(matches!(h.record().await, SaveOutcome::Downloaded(_)));

    let good = h.folder("good", FolderBehavior::Accept);
    h.select(&good).await;
    let outcome = h.controller.resave().await.unwrap();

    assert!(matches!(outcome, SaveOutcome::SavedToFolder(_)));
    assert_eq!(good.written()[0].1, b"test audio data");
}

#[tokio::test]
async fn resave_without_recording_fails() {
    let mut h = Harness::new(Setup::default());
    let err = h.controller.resave().await.unwrap_err();
    assert_eq!(err, SessionError::NothingToSave);
}

#[tokio::test]
async fn failed_folder_selection_keeps_previous_folder() {
    let mut h = Harness::new(Setup::default());
    let folder = h.folder("first", FolderBehavior::Accept);
    h.select(&folder).await;

    let picker = MockPicker {
        result: Err(FolderError::Cancelled),
    };
    let err = h.controller.select_folder(&picker).await.unwrap_err();

    assert_eq!(err, SessionError::Folder(FolderError::Cancelled));
    assert_eq!(err.kind(), ErrorKind::Permission);
    assert_eq!(h.controller.folder_name(), Some("first"));
}

#[tokio::test]
async fn shutdown_saves_in_flight_recording_and_releases_everything() {
    let mut h = Harness::new(Setup::default());
    let folder = h.folder("test-folder", FolderBehavior::Accept);
    h.select(&folder).await;
    h.controller.start().await.unwrap();

    let outcome = h.controller.shutdown().await.unwrap();

    assert!(matches!(outcome, Some(SaveOutcome::SavedToFolder(_))));
    assert_eq!(h.track_stops.get(), 1);
    assert_eq!(h.visualizers.destroyed.get(), 1);
    assert_eq!(h.store.live_count(), 0);
    assert_eq!(h.controller.folder_name(), None);
}

#[tokio::test]
async fn dropping_controller_releases_microphone() {
    let h = Harness::new(Setup::default());
    let track_stops = h.track_stops.clone();
    let visualizers = h.visualizers.clone();
    let mut controller = h.controller;
    let picker = MockPicker {
        result: Ok(MockFolder::new("f", FolderBehavior::Accept, CallLog::default())),
    };
    controller.select_folder(&picker).await.unwrap();
    controller.start().await.unwrap();

    drop(controller);

    assert_eq!(track_stops.get(), 1);
    assert_eq!(visualizers.destroyed.get(), 1);
}

#[tokio::test]
async fn hung_permission_prompt_times_out() {
    let mut h = Harness::new(Setup {
        mic: MicBehavior::Hang,
        config: short_timeouts(),
        ..Setup::default()
    });
    let folder = h.folder("test-folder", FolderBehavior::Accept);
    h.select(&folder).await;

    let err = h.controller.start().await.unwrap_err();

    assert!(matches!(err, SessionError::Timeout { operation: "Microphone access", .. }));
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(h.controller.status(), SessionStatus::Idle);
}

#[tokio::test]
async fn hung_folder_write_falls_back_to_download() {
    let mut h = Harness::new(Setup {
        config: short_timeouts(),
        ..Setup::default()
    });
    let folder = h.folder("slow", FolderBehavior::Hang);
    h.select(&folder).await;

    let outcome = h.record().await;

    assert!(matches!(outcome, SaveOutcome::Downloaded(_)));
    assert_eq!(h.log.entries(), vec!["folder:slow", "download"]);
}

#[tokio::test]
async fn max_duration_sets_a_deadline() {
    let mut h = Harness::new(Setup {
        config: ControllerConfig {
            max_duration: Some(Duration::from_secs(5)),
            ..ControllerConfig::default()
        },
        ..Setup::default()
    });
    assert!(h.controller.deadline().is_none());
    let folder = h.folder("f", FolderBehavior::Accept);
    h.select(&folder).await;
    h.controller.start().await.unwrap();

    let deadline = h.controller.deadline().unwrap();
    let remaining = deadline - std::time::Instant::now();
    assert!(remaining <= std::time::Duration::from_secs(5));
    assert!(remaining > std::time::Duration::from_secs(4));
}
