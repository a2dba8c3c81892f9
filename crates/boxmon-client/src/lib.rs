//! Request/response API client.
//!
//! One-shot calls against the monitoring server: statistics pulls, zone
//! configuration, video source listing, processing toggles, and the
//! progress-tracked video upload. Any non-2xx response is mapped to a
//! recoverable [`ClientError`] carrying the server-provided message.

pub mod error;
pub mod upload;

pub use error::{ClientError, ClientResult};
pub use upload::{UploadedVideo, MAX_UPLOAD_BYTES};

use reqwest::Response;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use boxmon_models::{
    ProcessingAction, StatisticsSnapshot, ZoneAlert, ZoneAlertKind, ZoneId, ZoneInfo,
};

/// HTTP client for the monitoring server's request/response endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for the given server base URL.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
        })
    }

    /// Create a client with a preconfigured `reqwest` client.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> ClientResult<Self> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    pub(crate) fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Fetch a full statistics snapshot.
    pub async fn fetch_statistics(&self) -> ClientResult<StatisticsSnapshot> {
        let url = self.endpoint("/api/statistics")?;
        let response = check_status(self.http.get(url).send().await?).await?;
        let body: StatisticsResponse = response.json().await?;

        if body.status != "success" {
            return Err(ClientError::unexpected(format!(
                "statistics endpoint returned status {:?}",
                body.status
            )));
        }

        Ok(StatisticsSnapshot {
            total_detections: body.total,
            current_session: body.current,
            boxes_sold: body.boxes_sold,
            pending_boxes: body.pending_boxes,
            open_boxes_in_zone: body.open_boxes_in_zone,
            closed_boxes_in_zone: body.closed_boxes_in_zone,
        })
    }

    /// Fetch remote info for one zone.
    pub async fn fetch_zone_info(&self, zone: ZoneId) -> ClientResult<ZoneInfo> {
        let url = self.endpoint("/api/zone-info")?;
        let response = check_status(self.http.get(url).send().await?).await?;
        let entries: Vec<ZoneInfoEntry> = response.json().await?;

        let wanted = zone.to_string();
        let entry = entries
            .into_iter()
            .find(|e| e.zone_id == wanted)
            .ok_or_else(|| ClientError::not_found(format!("zone {}", zone)))?;

        let alert_kind = if entry.status == "active" {
            ZoneAlertKind::Info
        } else {
            ZoneAlertKind::Warning
        };

        Ok(ZoneInfo {
            id: zone,
            name: format!("Zone {}", zone),
            count: entry.count,
            alerts: vec![ZoneAlert {
                kind: alert_kind,
                message: format!("Status: {}", entry.status),
            }],
        })
    }

    /// Confirm the active zone on the server.
    pub async fn set_zone(&self, zone: ZoneId) -> ClientResult<()> {
        let url = self.endpoint("/api/set-zone")?;
        let response = self
            .http
            .post(url)
            .json(&SetZoneRequest {
                zone_id: zone.get(),
            })
            .send()
            .await?;
        check_status(response).await?;
        debug!(zone = %zone, "active zone confirmed");
        Ok(())
    }

    /// List the available video sources.
    pub async fn list_video_sources(&self) -> ClientResult<Vec<String>> {
        let url = self.endpoint("/api/video-sources")?;
        let response = check_status(self.http.get(url).send().await?).await?;
        let body: VideoSourcesResponse = response.json().await?;
        Ok(body.sources)
    }

    /// Ask the pipeline to start or stop processing a source.
    ///
    /// The caller flips its local lifecycle state only after this returns
    /// `Ok`; a failure means the remote pipeline did not change.
    pub async fn toggle_processing(
        &self,
        source: &str,
        action: ProcessingAction,
    ) -> ClientResult<()> {
        let url = self.endpoint("/api/process-toggle")?;
        let response = self
            .http
            .post(url)
            .json(&ProcessToggleRequest {
                source: source.to_string(),
                action,
            })
            .send()
            .await?;
        check_status(response).await?;
        debug!(source, action = %action, "processing toggle confirmed");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct StatisticsResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    current: u64,
    #[serde(default)]
    boxes_sold: u64,
    #[serde(default)]
    pending_boxes: u64,
    #[serde(default)]
    open_boxes_in_zone: u64,
    #[serde(default)]
    closed_boxes_in_zone: u64,
}

#[derive(Debug, Deserialize)]
struct ZoneInfoEntry {
    #[serde(rename = "zoneId")]
    zone_id: String,
    #[serde(default)]
    count: u64,
    #[serde(default)]
    status: String,
}

#[derive(Debug, serde::Serialize)]
struct SetZoneRequest {
    zone_id: u8,
}

#[derive(Debug, Deserialize)]
struct VideoSourcesResponse {
    sources: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
struct ProcessToggleRequest {
    source: String,
    action: ProcessingAction,
}

/// Error payload shape used by the server for failed requests.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Map any non-2xx response to a [`ClientError::Http`] carrying the
/// server-provided message when one is present.
pub(crate) async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error.or(body.detail))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    Err(ClientError::http(status.as_u16(), message))
}
