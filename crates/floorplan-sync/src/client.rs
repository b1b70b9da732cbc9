#![forbid(unsafe_code)]

//! Blocking HTTP client for the optimizer service.
//!
//! Every call is issued once: there is no retry, and no timeout unless
//! `request_timeout_secs` is configured. [`SyncClient::execute`] turns an
//! editor [`Effect`] into the message that reports its outcome, which is
//! how a driver closes the editor's update loop.

use std::time::Duration;

use floorplan_core::config::SyncConfig;
use floorplan_core::department::Department;
use floorplan_core::editor::{Editor, Effect, Msg};
use floorplan_core::mode::Mode;
use floorplan_core::preview::OptimizationResult;
use floorplan_core::request::{BuildRequest, CreateProjectRequest, LayoutRequest, Project};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, SyncError};
use crate::normalize;

#[derive(Debug, Clone)]
pub struct SyncClient {
    client: Client,
    api_base: String,
    live_sync_url: String,
}

impl SyncClient {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout_secs.map(Duration::from_secs))
            .build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            live_sync_url: config.live_sync_url.clone(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base)
    }

    /// `POST craft/project`.
    pub fn create_project(&self, request: &CreateProjectRequest) -> Result<Project> {
        let body = self.post_json(&self.endpoint("craft/project"), request)?;
        normalize::project(&body, &request.name)
    }

    /// `POST craft/layout`. Returns the layout id to fetch the result with.
    pub fn submit_layout(&self, request: &LayoutRequest) -> Result<String> {
        let body = self.post_json(&self.endpoint("craft/layout"), request)?;
        normalize::layout_id(&body)
    }

    /// `GET craft/result?layoutId=...`.
    pub fn fetch_result(&self, layout_id: &str) -> Result<OptimizationResult> {
        let url = self.endpoint("craft/result");
        let _span = tracing::debug_span!("optimizer_request", method = "GET", url = %url).entered();
        let request = self.client.get(&url).query(&[("layoutId", layout_id)]);
        let body = read_json(&url, request)?;
        normalize::result(&body)
    }

    /// `POST {corelap|aldep}/generate`.
    pub fn generate(&self, request: &BuildRequest) -> Result<Vec<OptimizationResult>> {
        let url = self.endpoint(&generate_path(request.algorithm));
        let body = self.post_json(&url, request)?;
        normalize::candidates(&body)
    }

    /// Push the live roster to the layout store. Transport failures are
    /// logged and otherwise ignored; the response is not inspected.
    pub fn sync_live_layout(&self, departments: &[Department]) {
        let _span = tracing::debug_span!(
            "live_sync",
            url = %self.live_sync_url,
            count = departments.len()
        )
        .entered();
        match self
            .client
            .post(&self.live_sync_url)
            .json(departments)
            .send()
        {
            Ok(response) => tracing::debug!(status = response.status().as_u16(), "live layout synced"),
            Err(error) => tracing::warn!(%error, "live layout sync failed"),
        }
    }

    /// Perform `effect` and report its outcome as a message. `None` when
    /// the effect has nothing to report.
    pub fn execute(&self, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::None => None,
            Effect::SyncLayout(departments) => {
                self.sync_live_layout(&departments);
                None
            }
            Effect::CreateProject(request) => Some(outcome(
                self.create_project(&request).map(Msg::ProjectCreated),
            )),
            Effect::SubmitLayout { tag, request } => Some(outcome(
                self.submit_layout(&request)
                    .map(|layout_id| Msg::LayoutSubmitted { tag, layout_id }),
            )),
            Effect::FetchResult { tag, layout_id } => Some(outcome(
                self.fetch_result(&layout_id)
                    .map(|result| Msg::ResultReceived { tag, result }),
            )),
            Effect::Generate { tag, request } => Some(outcome(
                self.generate(&request)
                    .map(|candidates| Msg::CandidatesReceived { tag, candidates }),
            )),
        }
    }

    /// Feed `msg` to the editor and keep executing effects until the chain
    /// settles. Returns the number of messages processed.
    pub fn dispatch(&self, editor: &mut Editor, msg: Msg) -> usize {
        let mut next = Some(msg);
        let mut processed = 0;
        while let Some(msg) = next.take() {
            processed += 1;
            let effect = editor.update(msg);
            next = self.execute(effect);
        }
        processed
    }

    fn post_json<T: Serialize + ?Sized>(&self, url: &str, payload: &T) -> Result<Value> {
        let _span = tracing::debug_span!("optimizer_request", method = "POST", url = %url).entered();
        let request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(payload);
        read_json(url, request)
    }
}

fn read_json(url: &str, request: RequestBuilder) -> Result<Value> {
    let response = request.send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(SyncError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let text = response.text()?;
    tracing::debug!(status = status.as_u16(), bytes = text.len(), "optimizer responded");
    Ok(serde_json::from_str(&text)?)
}

fn outcome(result: Result<Msg>) -> Msg {
    result.unwrap_or_else(|error| Msg::RequestFailed(error.to_string()))
}

/// Slug of the generate endpoint for a build mode.
#[must_use]
pub fn generate_path(mode: Mode) -> String {
    format!("{}/generate", mode.slug())
}

#[cfg(test)]
mod tests {
    use floorplan_core::config::SyncConfig;
    use floorplan_core::editor::{Effect, Msg, RequestTag};
    use floorplan_core::mode::Mode;

    use super::{SyncClient, generate_path};

    #[test]
    fn api_base_trailing_slash_is_trimmed() {
        let config = SyncConfig {
            api_base: "http://localhost:8000/api/".to_string(),
            ..SyncConfig::default()
        };
        let client = SyncClient::new(&config).expect("client");
        assert_eq!(client.api_base(), "http://localhost:8000/api");
        assert_eq!(client.endpoint("craft/layout"), "http://localhost:8000/api/craft/layout");
    }

    #[test]
    fn generate_paths_follow_mode_slug() {
        assert_eq!(generate_path(Mode::Corelap), "corelap/generate");
        assert_eq!(generate_path(Mode::Aldep), "aldep/generate");
    }

    #[test]
    fn none_effect_reports_nothing() {
        let client = SyncClient::new(&SyncConfig::default()).expect("client");
        assert_eq!(client.execute(Effect::None), None::<Msg>);
    }

    #[test]
    fn unreachable_optimizer_becomes_request_failed() {
        let config = SyncConfig {
            api_base: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: Some(2),
            ..SyncConfig::default()
        };
        let client = SyncClient::new(&config).expect("client");
        let msg = client.execute(Effect::FetchResult {
            tag: RequestTag::default(),
            layout_id: "L1".to_string(),
        });
        assert!(matches!(msg, Some(Msg::RequestFailed(_))));
    }
}
