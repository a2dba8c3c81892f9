//! The dashboard composer.
//!
//! Owns all cross-cutting state — selected source, selected zone,
//! processing lifecycle, upload progress, bounded logs, counters — and
//! mutates it only through the named transitions below. The push fan-out
//! loop and every request/response call funnel into the same owner, so
//! no two components ever write the same field.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use boxmon_client::ApiClient;
use boxmon_models::{
    format_bytes, ClientMessage, CountsSnapshot, EventKind, EventRecord, LogMessage,
    ProcessingAction, ProcessingState, ProcessingStatusUpdate, PushEvent, SourceSelection,
    StatisticsSnapshot, UploadProgress, UploadedFileMeta, ZoneId, ZoneInfo,
};
use boxmon_transport::ChannelClient;

use crate::error::DashboardResult;
use crate::event_log::{BoundedLog, EVENT_LOG_CAPACITY, RAW_LOG_CAPACITY};
use crate::lifecycle::ProcessingGate;
use crate::renderer::{FramePayload, LatestFrameSlot};
use crate::source::{validate_upload, SourceKind, UploadManager, UploadRequest};
use crate::statistics::StatsAggregator;
use crate::zones::ZoneSelector;

/// Everything the composer owns. Mutated only while holding the lock,
/// never across a suspension point.
struct DashboardState {
    source: SourceSelection,
    source_kind: Option<SourceKind>,
    zones: ZoneSelector,
    gate: ProcessingGate,
    upload: UploadManager,
    events: BoundedLog<EventRecord>,
    raw_logs: BoundedLog<LogMessage>,
    stats: StatsAggregator,
    counts: Option<CountsSnapshot>,
    last_status: Option<ProcessingStatusUpdate>,
    connected: bool,
}

impl DashboardState {
    fn new() -> Self {
        Self {
            source: SourceSelection::None,
            source_kind: None,
            zones: ZoneSelector::new(),
            gate: ProcessingGate::new(),
            upload: UploadManager::new(),
            events: BoundedLog::new(EVENT_LOG_CAPACITY),
            raw_logs: BoundedLog::new(RAW_LOG_CAPACITY),
            stats: StatsAggregator::new(),
            counts: None,
            last_status: None,
            connected: false,
        }
    }
}

/// Top-level coordinator for the monitoring view.
#[derive(Clone)]
pub struct Dashboard {
    state: Arc<Mutex<DashboardState>>,
    client: ApiClient,
    channel: Arc<ChannelClient>,
    frames: Arc<LatestFrameSlot>,
}

impl Dashboard {
    pub fn new(client: ApiClient, channel: Arc<ChannelClient>) -> Self {
        Self {
            state: Arc::new(Mutex::new(DashboardState::new())),
            client,
            channel,
            frames: Arc::new(LatestFrameSlot::new()),
        }
    }

    /// The latest-wins frame mailbox, for wiring up a renderer.
    pub fn frame_slot(&self) -> Arc<LatestFrameSlot> {
        Arc::clone(&self.frames)
    }

    // ------------------------------------------------------------------
    // Source selection
    // ------------------------------------------------------------------

    /// Change the coarse video source.
    ///
    /// Runs synchronously: if the pipeline is processing, the gate falls
    /// back to idle before anything else can observe the new source. The
    /// zone selection resets, and any in-flight upload loses the UI's
    /// interest (the transfer itself keeps running).
    pub fn select_source(&self, kind: SourceKind) {
        let join = {
            let mut state = self.state.lock().expect("state lock poisoned");

            if state.gate.force_idle() {
                state
                    .events
                    .append(EventRecord::system("Processing stopped: video source changed"));
            }
            state.zones.clear();
            if kind != SourceKind::Upload {
                state.upload.detach();
            }

            state.source_kind = Some(kind);
            state.source = match kind {
                SourceKind::Webcam => SourceSelection::Webcam,
                // Re-selecting Upload keeps an already-resolved file.
                SourceKind::Upload => match &state.source {
                    uploaded @ SourceSelection::UploadedFile { .. } => uploaded.clone(),
                    _ => SourceSelection::None,
                },
            };

            state
                .source
                .stream_key()
                .map(|key| ClientMessage::join_video(key))
        };

        if let Some(message) = join {
            if let Err(e) = self.channel.emit(message) {
                warn!("join_video emit failed: {}", e);
            }
        }
    }

    /// Upload a picked file and, on success, bind it as the active
    /// source.
    ///
    /// Non-video MIME types and files over the 2 GiB cap are rejected
    /// synchronously, before any network call, leaving the source
    /// selection untouched. A completion arriving after the user switched
    /// away is ignored.
    pub async fn upload_file(&self, request: UploadRequest) -> DashboardResult<()> {
        let meta = UploadedFileMeta::new(request.original_name.clone(), request.size_bytes);

        let generation = {
            let mut state = self.state.lock().expect("state lock poisoned");
            if let Err(rejection) = validate_upload(&request.content_type, request.size_bytes) {
                state.upload.reject(meta, &rejection);
                return Err(rejection.into());
            }
            state.source_kind = Some(SourceKind::Upload);
            state.upload.begin(meta)
        };

        // Forward transfer progress into the owned state.
        let (progress_tx, mut progress_rx) = watch::channel(0u8);
        let forwarder = {
            let dashboard = self.clone();
            tokio::spawn(async move {
                while progress_rx.changed().await.is_ok() {
                    let percent = *progress_rx.borrow_and_update();
                    let mut state = dashboard.state.lock().expect("state lock poisoned");
                    state.upload.set_percent(generation, percent);
                }
            })
        };

        let result = self
            .client
            .upload_video(
                &request.path,
                &request.original_name,
                &request.content_type,
                progress_tx,
            )
            .await;
        let _ = forwarder.await;

        match result {
            Ok(uploaded) => {
                let join = {
                    let mut state = self.state.lock().expect("state lock poisoned");
                    if !state.upload.complete(generation) {
                        debug!("ignoring upload completion for a detached transfer");
                        return Ok(());
                    }
                    state.source = SourceSelection::UploadedFile {
                        path: uploaded.video_path,
                        original_name: request.original_name,
                        size_bytes: uploaded.size_bytes,
                    };
                    state.events.append(EventRecord::system(format!(
                        "Video uploaded: {} ({})",
                        uploaded.filename,
                        format_bytes(uploaded.size_bytes)
                    )));
                    state
                        .source
                        .stream_key()
                        .map(|key| ClientMessage::join_video(key))
                };
                if let Some(message) = join {
                    if let Err(e) = self.channel.emit(message) {
                        warn!("join_video emit failed: {}", e);
                    }
                }
                Ok(())
            }
            Err(e) => {
                let mut state = self.state.lock().expect("state lock poisoned");
                if state.upload.fail(generation, e.to_string()) {
                    state.source = SourceSelection::None;
                    state.events.append(
                        EventRecord::new(EventKind::Error, format!("Upload failed: {}", e)),
                    );
                }
                Err(e.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Zone selection
    // ------------------------------------------------------------------

    /// Select a dispatch zone.
    ///
    /// The local selection updates immediately; the remote confirmation
    /// is best-effort and a failure is logged without blocking. The
    /// dependent info fetch resolves against the selection it was issued
    /// for and is discarded if the selection has moved on.
    pub async fn select_zone(&self, zone: ZoneId) {
        let epoch = {
            let mut state = self.state.lock().expect("state lock poisoned");
            state.zones.select(zone)
        };

        if let Err(e) = self.client.set_zone(zone).await {
            warn!(zone = %zone, "zone confirmation failed: {}", e);
        }

        let info = match self.client.fetch_zone_info(zone).await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(zone = %zone, "zone info fetch failed: {}", e);
                None
            }
        };

        let mut state = self.state.lock().expect("state lock poisoned");
        if !state.zones.apply_info(epoch, zone, info) {
            debug!(zone = %zone, "discarding stale zone info");
        }
    }

    // ------------------------------------------------------------------
    // Processing lifecycle
    // ------------------------------------------------------------------

    /// Whether a start may currently be attempted.
    pub fn can_start(&self) -> bool {
        let state = self.state.lock().expect("state lock poisoned");
        ProcessingGate::can_start(&state.source, state.zones.selection())
    }

    /// Ask the pipeline to start or stop, flipping local state only on a
    /// confirmed response.
    ///
    /// With no ready source or no zone selected the start is disabled:
    /// the call is a no-op and performs no network request. Stop is
    /// always allowed while processing.
    pub async fn toggle_processing(&self) -> DashboardResult<()> {
        let (key, action) = {
            let state = self.state.lock().expect("state lock poisoned");
            let key = match state.source.stream_key() {
                Some(key) => key.to_string(),
                None => return Ok(()),
            };
            if state.gate.is_active() {
                (key, ProcessingAction::Stop)
            } else {
                if !ProcessingGate::can_start(&state.source, state.zones.selection()) {
                    return Ok(());
                }
                (key, ProcessingAction::Start)
            }
        };

        match self.client.toggle_processing(&key, action).await {
            Ok(()) => {
                let mut state = self.state.lock().expect("state lock poisoned");
                // The source may have changed while the call was in
                // flight; a confirmation for a replaced source is stale.
                if state.source.stream_key() == Some(key.as_str()) {
                    state.gate.apply_confirmed(action);
                    info!(action = %action, source = %key, "processing toggle applied");
                } else {
                    debug!("ignoring toggle confirmation for a replaced source");
                }
                Ok(())
            }
            Err(e) => {
                let mut state = self.state.lock().expect("state lock poisoned");
                state.events.append(EventRecord::new(
                    EventKind::Error,
                    format!("Failed to toggle processing: {}", e),
                ));
                Err(e.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    /// Pull a fresh statistics snapshot and replace the held one.
    pub async fn refresh_statistics(&self) -> DashboardResult<StatisticsSnapshot> {
        let snapshot = self.client.fetch_statistics().await?;
        let mut state = self.state.lock().expect("state lock poisoned");
        state.stats.replace(snapshot);
        Ok(snapshot)
    }

    // ------------------------------------------------------------------
    // Push fan-out
    // ------------------------------------------------------------------

    /// Consume push events and connection transitions until the channel
    /// goes away.
    pub async fn run(&self) {
        let mut events = self.channel.subscribe_all();
        let mut connection = self.channel.connection_state();

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_push(event),
                    None => break,
                },
                changed = connection.changed() => match changed {
                    Ok(()) => {
                        let connected = connection.borrow().is_connected();
                        self.handle_connection(connected);
                    }
                    Err(_) => break,
                },
            }
        }
    }

    /// Record a connectivity transition as a synthetic system event.
    pub(crate) fn handle_connection(&self, connected: bool) {
        let mut state = self.state.lock().expect("state lock poisoned");
        if state.connected == connected {
            return;
        }
        state.connected = connected;
        let details = if connected {
            "Connected to server"
        } else {
            "Disconnected from server"
        };
        state.events.append(EventRecord::system(details));
    }

    /// Route one push event into the owned state.
    pub(crate) fn handle_push(&self, event: PushEvent) {
        match event {
            // Frames bypass the state lock entirely: latest-wins, no
            // queueing, and they never reach the audit log.
            PushEvent::VideoFrame {
                source,
                frame,
                frame_count,
            } => {
                self.frames.offer(FramePayload {
                    source,
                    frame_b64: frame,
                    frame_count,
                });
            }
            event => {
                let mut state = self.state.lock().expect("state lock poisoned");
                Self::apply_push(&mut state, event);
            }
        }
    }

    fn apply_push(state: &mut DashboardState, event: PushEvent) {
        match event {
            PushEvent::VideoFrame { .. } => {}

            PushEvent::Detection {
                details,
                source,
                frame,
                ..
            } => {
                state.events.append(
                    EventRecord::new(EventKind::Detection, details)
                        .with_source_opt(source)
                        .with_frame_opt(frame),
                );
            }

            PushEvent::LogMessage(message) => {
                state
                    .events
                    .append(EventRecord::new(EventKind::Log, message.message.clone()));
                state.raw_logs.append(message);
            }

            PushEvent::CountsUpdate(counts) => {
                state
                    .events
                    .append(EventRecord::new(EventKind::Counts, counts.summary()));
                state.counts = Some(counts);
            }

            PushEvent::StatisticsUpdate(snapshot) => {
                state.stats.replace(snapshot);
            }

            PushEvent::ProcessingStatus(update) => {
                state.events.append(
                    EventRecord::new(
                        EventKind::Processing,
                        format!("{}: {}", update.status, update.message),
                    )
                    .with_source(update.source.clone()),
                );
                // Terminal reports flip the gate only when they are for
                // the currently selected source; anything else is stale.
                if state.source.stream_key() == Some(update.source.as_str()) {
                    match update.status.as_str() {
                        "completed" => state.gate.complete(),
                        "error" => state.gate.mark_error(),
                        _ => {}
                    }
                }
                state.last_status = Some(update);
            }

            PushEvent::ProcessingError { source, message } => {
                state.events.append(
                    EventRecord::new(EventKind::Error, format!("Error: {}", message))
                        .with_source(source),
                );
            }

            PushEvent::ZoneUpdated { zone_id, status } => {
                state.events.append(EventRecord::new(
                    EventKind::Zone,
                    format!("Zone {} set to {}", zone_id, status),
                ));
            }

            PushEvent::GuiReset { message } => {
                state.events.append(EventRecord::system(message));
            }
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn events(&self) -> Vec<EventRecord> {
        self.state.lock().expect("state lock poisoned").events.snapshot()
    }

    pub fn raw_logs(&self) -> Vec<LogMessage> {
        self.state
            .lock()
            .expect("state lock poisoned")
            .raw_logs
            .snapshot()
    }

    /// Drop the audit log. Explicit user action only.
    pub fn clear_event_log(&self) {
        self.state.lock().expect("state lock poisoned").events.clear();
    }

    pub fn statistics(&self) -> StatisticsSnapshot {
        self.state.lock().expect("state lock poisoned").stats.snapshot()
    }

    pub fn statistics_updated_at(&self) -> Option<DateTime<Utc>> {
        self.state
            .lock()
            .expect("state lock poisoned")
            .stats
            .last_update()
    }

    pub fn counts(&self) -> Option<CountsSnapshot> {
        self.state.lock().expect("state lock poisoned").counts.clone()
    }

    pub fn last_status(&self) -> Option<ProcessingStatusUpdate> {
        self.state
            .lock()
            .expect("state lock poisoned")
            .last_status
            .clone()
    }

    pub fn processing_state(&self) -> ProcessingState {
        self.state.lock().expect("state lock poisoned").gate.state()
    }

    pub fn source(&self) -> SourceSelection {
        self.state.lock().expect("state lock poisoned").source.clone()
    }

    pub fn selected_zone(&self) -> Option<ZoneId> {
        self.state
            .lock()
            .expect("state lock poisoned")
            .zones
            .selection()
    }

    pub fn zone_info(&self) -> Option<ZoneInfo> {
        self.state
            .lock()
            .expect("state lock poisoned")
            .zones
            .info()
            .cloned()
    }

    pub fn upload_progress(&self) -> UploadProgress {
        self.state
            .lock()
            .expect("state lock poisoned")
            .upload
            .progress()
    }

    pub fn upload_error(&self) -> Option<String> {
        self.state
            .lock()
            .expect("state lock poisoned")
            .upload
            .error()
            .map(str::to_string)
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().expect("state lock poisoned").connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dashboard() -> Dashboard {
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        Dashboard::new(client, Arc::new(ChannelClient::new()))
    }

    #[tokio::test]
    async fn test_connection_transitions_become_system_records() {
        let dash = dashboard();

        dash.handle_connection(true);
        dash.handle_connection(true); // no duplicate for a repeat
        dash.handle_connection(false);

        let events = dash.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::System);
        assert_eq!(events[0].details, "Connected to server");
        assert_eq!(events[1].details, "Disconnected from server");
        assert!(!dash.is_connected());
    }

    #[tokio::test]
    async fn test_source_change_while_processing_resets_gate_synchronously() {
        let dash = dashboard();
        dash.select_source(SourceKind::Webcam);
        {
            let mut state = dash.state.lock().unwrap();
            state.gate.apply_confirmed(ProcessingAction::Start);
        }

        dash.select_source(SourceKind::Upload);

        // The reset happened inside select_source, before any other
        // handler could run.
        assert_eq!(dash.processing_state(), ProcessingState::Idle);
        let events = dash.events();
        assert!(events
            .iter()
            .any(|e| e.details == "Processing stopped: video source changed"));
    }

    #[tokio::test]
    async fn test_source_change_resets_zone_selection() {
        let dash = dashboard();
        {
            let mut state = dash.state.lock().unwrap();
            state.zones.select(ZoneId::new(3).unwrap());
        }

        dash.select_source(SourceKind::Webcam);
        assert_eq!(dash.selected_zone(), None);
        assert!(dash.zone_info().is_none());
    }

    #[tokio::test]
    async fn test_push_fan_out_updates_owned_state() {
        let dash = dashboard();

        dash.handle_push(PushEvent::Detection {
            timestamp: Utc::now(),
            details: "box opened".to_string(),
            source: Some("0".to_string()),
            frame: Some(17),
        });
        dash.handle_push(PushEvent::LogMessage(LogMessage::new("pipeline warmed up")));
        dash.handle_push(PushEvent::CountsUpdate(CountsSnapshot {
            pending_boxes: 2,
            boxes_sold: 5,
            timestamp: Utc::now(),
        }));
        dash.handle_push(PushEvent::ZoneUpdated {
            zone_id: 4,
            status: "active".to_string(),
        });
        dash.handle_push(PushEvent::GuiReset {
            message: "View reset by server".to_string(),
        });

        let events = dash.events();
        assert_eq!(events.len(), 5);
        assert_eq!(events[0].kind, EventKind::Detection);
        assert_eq!(events[0].frame, Some(17));
        assert_eq!(events[1].kind, EventKind::Log);
        assert_eq!(events[2].details, "Pending: 2, Sold: 5");
        assert_eq!(events[3].details, "Zone 4 set to active");
        assert_eq!(events[4].kind, EventKind::System);

        assert_eq!(dash.raw_logs().len(), 1);
        assert_eq!(dash.counts().unwrap().boxes_sold, 5);
    }

    #[tokio::test]
    async fn test_statistics_push_fully_replaces_pull() {
        let dash = dashboard();
        {
            let mut state = dash.state.lock().unwrap();
            state.stats.replace(StatisticsSnapshot {
                boxes_sold: 1,
                ..Default::default()
            });
        }

        let pushed = StatisticsSnapshot {
            boxes_sold: 8,
            total_detections: 20,
            ..Default::default()
        };
        dash.handle_push(PushEvent::StatisticsUpdate(pushed));

        assert_eq!(dash.statistics(), pushed);
    }

    #[tokio::test]
    async fn test_video_frames_go_to_the_slot_not_the_log() {
        let dash = dashboard();
        for i in 1..=5 {
            dash.handle_push(PushEvent::VideoFrame {
                source: "0".to_string(),
                frame: "aGVsbG8=".to_string(),
                frame_count: i,
            });
        }

        assert!(dash.events().is_empty());
        assert_eq!(dash.frame_slot().take().unwrap().frame_count, 5);
        assert!(dash.frame_slot().take().is_none());
    }

    #[tokio::test]
    async fn test_terminal_status_for_current_source_flips_gate() {
        let dash = dashboard();
        dash.select_source(SourceKind::Webcam);
        {
            let mut state = dash.state.lock().unwrap();
            state.gate.apply_confirmed(ProcessingAction::Start);
        }

        // A terminal report for some other source is stale and ignored.
        dash.handle_push(PushEvent::ProcessingStatus(ProcessingStatusUpdate {
            source: "uploads/old.mp4".to_string(),
            status: "completed".to_string(),
            message: "done".to_string(),
        }));
        assert_eq!(dash.processing_state(), ProcessingState::Processing);

        dash.handle_push(PushEvent::ProcessingStatus(ProcessingStatusUpdate {
            source: "0".to_string(),
            status: "completed".to_string(),
            message: "done".to_string(),
        }));
        assert_eq!(dash.processing_state(), ProcessingState::Completed);
        assert_eq!(dash.last_status().unwrap().status, "completed");
    }

    #[tokio::test]
    async fn test_clear_event_log() {
        let dash = dashboard();
        dash.handle_push(PushEvent::GuiReset {
            message: "reset".to_string(),
        });
        assert_eq!(dash.events().len(), 1);

        dash.clear_event_log();
        assert!(dash.events().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejection_is_synchronous_and_keeps_selection() {
        let dash = dashboard();
        dash.select_source(SourceKind::Webcam);

        let request = UploadRequest {
            path: "/tmp/too-big.mp4".into(),
            original_name: "too-big.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            size_bytes: 3 * 1024 * 1024 * 1024,
        };
        // The rejection happens before any I/O: the path is never opened.
        let err = dash.upload_file(request).await.unwrap_err();
        assert!(err.to_string().contains("2GB"));
        assert_eq!(dash.source(), SourceSelection::Webcam);
        assert_eq!(
            dash.upload_progress().state,
            boxmon_models::UploadState::Failed
        );
    }
}
