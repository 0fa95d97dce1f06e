use futures::StreamExt;
use libtts::{
    BackendGuard, BackendState, PluginDescriptor, Settings, TTSBackend, TTSError, collect_audio,
};
use libtts_test_utils::{MockTonePlugin, TONE_SAMPLE_RATE};
use serde_json::json;
use std::time::Duration;
use tokio_test::assert_ok;

fn settings_with(descriptor: &PluginDescriptor, changes: serde_json::Value) -> Settings {
    let mut dict = descriptor.make_default_settings().to_dict();
    if let serde_json::Value::Object(changes) = changes {
        dict.extend(changes);
    }
    descriptor.make_settings_from_dict(&dict).unwrap()
}

fn backend(plugin: &MockTonePlugin, changes: serde_json::Value) -> Box<dyn TTSBackend> {
    let descriptor = plugin.descriptor();
    let settings = settings_with(&descriptor, changes);
    descriptor.make_backend(&settings).unwrap()
}

#[tokio::test]
async fn test_backend_lifecycle() {
    let _ = env_logger::builder().is_test(true).try_init();
    let plugin = MockTonePlugin::new("tone_v1");
    let backend = backend(&plugin, json!({}));
    assert_eq!(backend.state(), BackendState::Created);
    assert_eq!(backend.audio_spec().sample_rate, TONE_SAMPLE_RATE);

    let err = backend.convert("too early").await.err().unwrap();
    assert!(matches!(
        err,
        TTSError::InvalidState {
            state: BackendState::Created,
            ..
        }
    ));

    backend.start().await.unwrap();
    assert_eq!(backend.state(), BackendState::Ready);

    let audio = collect_audio(backend.convert("three short words").await.unwrap())
        .await
        .unwrap();
    // 20 ms of 16-bit mono at 16 kHz per word
    assert_eq!(audio.len(), 3 * 320 * 2);
    assert_eq!(backend.state(), BackendState::Running);

    assert_ok!(backend.stop().await);
    assert_ok!(backend.stop().await);
    assert_eq!(backend.state(), BackendState::Stopped);
    assert!(matches!(
        backend.convert("after stop").await,
        Err(TTSError::InvalidState { .. })
    ));

    backend.start().await.unwrap();
    assert_eq!(backend.state(), BackendState::Ready);
    backend.stop().await.unwrap();
}

#[tokio::test]
async fn test_blank_text_is_rejected() {
    let plugin = MockTonePlugin::new("tone_v1");
    let backend = backend(&plugin, json!({}));
    backend.start().await.unwrap();
    for text in ["", "   ", "\n\t"] {
        assert!(matches!(
            backend.convert(text).await,
            Err(TTSError::InvalidInput(_))
        ));
    }
    assert_eq!(backend.state(), BackendState::Ready);
}

#[tokio::test]
async fn test_failed_start_is_terminal() {
    let plugin = MockTonePlugin::new("tone_v1");
    let backend = backend(&plugin, json!({"fail_on_start": true}));

    assert!(matches!(
        backend.start().await,
        Err(TTSError::BackendInitialization { .. })
    ));
    assert_eq!(backend.state(), BackendState::Failed);
    assert!(matches!(
        backend.start().await,
        Err(TTSError::InvalidState {
            state: BackendState::Failed,
            ..
        })
    ));
    backend.stop().await.unwrap();
    assert_eq!(backend.state(), BackendState::Failed);
}

#[tokio::test]
async fn test_single_conversion_in_flight() {
    let plugin = MockTonePlugin::new("tone_v1");
    let backend = backend(&plugin, json!({"delay_ms": 5}));
    backend.start().await.unwrap();

    let first = backend.convert("one two three").await.unwrap();
    assert!(matches!(
        backend.convert("four").await,
        Err(TTSError::BackendBusy(_))
    ));

    assert!(!assert_ok!(collect_audio(first).await).is_empty());
    assert_ok!(backend.convert("four").await);
}

#[tokio::test]
async fn test_dropping_stream_cancels_conversion() {
    let plugin = MockTonePlugin::new("tone_v1");
    let backend = backend(&plugin, json!({"delay_ms": 20}));
    backend.start().await.unwrap();

    let text = vec!["word"; 50].join(" ");
    let mut stream = backend.convert(&text).await.unwrap();
    stream.next().await.unwrap().unwrap();
    stream.next().await.unwrap().unwrap();
    drop(stream);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let produced = plugin.produced();
    assert!(produced < 10, "producer kept running: {produced} chunks");

    let audio = collect_audio(backend.convert("again").await.unwrap())
        .await
        .unwrap();
    assert_eq!(audio.len(), 640);
}

#[tokio::test]
async fn test_engine_error_ends_stream() {
    let plugin = MockTonePlugin::new("tone_v1");
    let backend = backend(&plugin, json!({"fail_at_chunk": 1}));
    backend.start().await.unwrap();

    let items: Vec<_> = backend.convert("one two three").await.unwrap().collect().await;
    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(matches!(
        items[1],
        Err(TTSError::ConversionFailed { chunk: 1, .. })
    ));
    assert!(backend.state().can_convert());
}

#[tokio::test]
async fn test_update_settings() {
    let plugin = MockTonePlugin::new("tone_v1");
    let descriptor = plugin.descriptor();
    let backend = backend(&plugin, json!({}));
    backend.start().await.unwrap();

    let before = backend.current_settings();
    let foreign = MockTonePlugin::new("tone_v2")
        .descriptor()
        .make_default_settings();
    assert!(matches!(
        backend.update_settings(foreign).await,
        Err(TTSError::InvalidSettings(_))
    ));
    assert_eq!(backend.current_settings(), before);

    let longer = settings_with(&descriptor, json!({"chunk_ms": 40}));
    backend.update_settings(longer.clone()).await.unwrap();
    assert_eq!(backend.current_settings(), longer);

    let audio = collect_audio(backend.convert("word").await.unwrap())
        .await
        .unwrap();
    assert_eq!(audio.len(), 640 * 2);
}

#[tokio::test]
async fn test_update_does_not_affect_conversion_in_flight() {
    let plugin = MockTonePlugin::new("tone_v1");
    let descriptor = plugin.descriptor();
    let backend = backend(&plugin, json!({"delay_ms": 10}));
    backend.start().await.unwrap();

    let stream = backend.convert("one two three four").await.unwrap();
    backend
        .update_settings(settings_with(&descriptor, json!({"chunk_ms": 100})))
        .await
        .unwrap();

    let chunks: Vec<_> = stream.collect().await;
    assert_eq!(chunks.len(), 4);
    assert!(chunks.iter().all(|chunk| chunk.as_ref().unwrap().len() == 640));

    let audio = collect_audio(backend.convert("five").await.unwrap())
        .await
        .unwrap();
    assert_eq!(audio.len(), 3200);
}

#[tokio::test]
async fn test_failed_reload_fails_backend() {
    let plugin = MockTonePlugin::new("tone_v1");
    let descriptor = plugin.descriptor();
    let backend = backend(&plugin, json!({}));
    backend.start().await.unwrap();

    let before = backend.current_settings();
    let broken = settings_with(&descriptor, json!({"fail_on_start": true}));
    assert!(matches!(
        backend.update_settings(broken).await,
        Err(TTSError::BackendInitialization { .. })
    ));
    assert_eq!(backend.state(), BackendState::Failed);
    assert_eq!(backend.current_settings(), before);
}

#[tokio::test]
async fn test_stop_releases_session() {
    let plugin = MockTonePlugin::new("tone_v1");
    let backend = backend(&plugin, json!({}));
    backend.start().await.unwrap();
    assert_eq!(plugin.live_sessions(), 1);

    // Reloading swaps the session rather than adding one
    let descriptor = plugin.descriptor();
    backend
        .update_settings(settings_with(&descriptor, json!({"frequency_hz": 880})))
        .await
        .unwrap();
    assert_eq!(plugin.live_sessions(), 1);

    backend.stop().await.unwrap();
    assert_eq!(plugin.live_sessions(), 0);
}

#[tokio::test]
async fn test_update_before_start_does_not_load() {
    let plugin = MockTonePlugin::new("tone_v1");
    let descriptor = plugin.descriptor();
    let backend = backend(&plugin, json!({}));
    backend
        .update_settings(settings_with(&descriptor, json!({"frequency_hz": 880})))
        .await
        .unwrap();
    assert_eq!(plugin.live_sessions(), 0);
    assert_eq!(backend.state(), BackendState::Created);
}

#[tokio::test]
async fn test_guard_finish() {
    let plugin = MockTonePlugin::new("tone_v1");
    let guard = BackendGuard::start(backend(&plugin, json!({}))).await.unwrap();
    assert_eq!(guard.state(), BackendState::Ready);
    assert_eq!(plugin.live_sessions(), 1);

    let audio = collect_audio(guard.convert("hello").await.unwrap())
        .await
        .unwrap();
    assert!(!audio.is_empty());

    guard.finish().await.unwrap();
    assert_eq!(plugin.live_sessions(), 0);
}

#[tokio::test]
async fn test_guard_start_failure() {
    let plugin = MockTonePlugin::new("tone_v1");
    let result = BackendGuard::start(backend(&plugin, json!({"fail_on_start": true}))).await;
    assert!(matches!(
        result,
        Err(TTSError::BackendInitialization { .. })
    ));
}

#[tokio::test]
async fn test_guard_stops_backend_on_drop() {
    let plugin = MockTonePlugin::new("tone_v1");

    async fn speak(plugin: &MockTonePlugin) -> Result<(), TTSError> {
        let guard = BackendGuard::start(backend(plugin, json!({}))).await?;
        guard.convert("   ").await?;
        Ok(())
    }

    assert!(matches!(speak(&plugin).await, Err(TTSError::InvalidInput(_))));
    assert_eq!(plugin.live_sessions(), 0);
}

#[test]
fn test_guard_drop_inside_futures_executor() {
    let plugin = MockTonePlugin::new("tone_v1");
    futures::executor::block_on(async {
        let guard = BackendGuard::start(backend(&plugin, json!({}))).await.unwrap();
        let audio = collect_audio(guard.convert("no tokio here").await.unwrap())
            .await
            .unwrap();
        assert_eq!(audio.len(), 3 * 640);
        assert_eq!(plugin.live_sessions(), 1);
        drop(guard);
    });
    assert_eq!(plugin.live_sessions(), 0);
}

#[test]
fn test_guard_drop_while_runtime_shuts_down() {
    let plugin = MockTonePlugin::new("tone_v1");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let guard = runtime
        .block_on(BackendGuard::start(backend(&plugin, json!({}))))
        .unwrap();
    runtime.spawn(async move {
        let _guard = guard;
        std::future::pending::<()>().await;
    });
    drop(runtime);
    assert_eq!(plugin.live_sessions(), 0);
}

#[test]
fn test_guard_drop_outside_runtime() {
    let plugin = MockTonePlugin::new("tone_v1");
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let guard = runtime
        .block_on(BackendGuard::start(backend(&plugin, json!({}))))
        .unwrap();
    assert_eq!(plugin.live_sessions(), 1);

    drop(guard);
    assert_eq!(plugin.live_sessions(), 0);
}
