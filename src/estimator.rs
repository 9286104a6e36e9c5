//! Video headcount estimation.
//!
//! Estimation happens outside the core: a recorded clip goes to an [`HeadcountEstimator`] on a
//! background thread, and its answer comes back through
//! [`AttendanceManager::on_estimate_ready`]. Nothing waits on it. If the estimator fails, the
//! session keeps whatever estimate it had, and the final headcount can still be entered by hand.

use crate::manager::AttendanceManager;
use log::{info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

/// The default address of the video headcount service.
pub const DEFAULT_ESTIMATOR_URL: &str = "http://localhost:5001/process_video";

#[derive(Debug, Error)]
pub enum EstimateError {
    #[error("could not read clip: {0}")]
    Io(#[from] std::io::Error),

    #[error("estimator request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("estimator rejected the clip: {0}")]
    Rejected(String),
}

/// Anything that can count the people in a recorded clip.
pub trait HeadcountEstimator: Send + Sync {
    fn estimate(&self, clip: &Path) -> Result<u32, EstimateError>;
}

/// Body returned by the headcount service, either a count or an error message.
#[derive(Debug, Deserialize)]
struct EstimateResponse {
    face_count: Option<u32>,
    error: Option<String>,
}

/// A [`HeadcountEstimator`] that uploads the clip to an HTTP service as the multipart field
/// `video` and reads the `face_count` from its JSON reply.
pub struct HttpEstimator {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpEstimator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, EstimateError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl HeadcountEstimator for HttpEstimator {
    fn estimate(&self, clip: &Path) -> Result<u32, EstimateError> {
        let form = reqwest::blocking::multipart::Form::new().file("video", clip)?;

        let response = self.client.post(&self.url).multipart(form).send()?;
        let status = response.status();
        let body: EstimateResponse = response.json()?;

        match (body.face_count, body.error) {
            (Some(count), None) if status.is_success() => Ok(count),
            (_, Some(message)) => Err(EstimateError::Rejected(message)),
            _ => Err(EstimateError::Rejected(format!(
                "unexpected response with status {status}"
            ))),
        }
    }
}

/// Estimates the headcount of `clip` on a background thread and records the result on the
/// session.
///
/// The handle yields the recorded count, or `None` if no estimate was recorded. Failures are
/// logged, never propagated: a late estimate for a session that has since been finalized is
/// dropped.
pub fn spawn_estimate(
    manager: Arc<AttendanceManager>,
    estimator: Arc<dyn HeadcountEstimator>,
    session_id: i32,
    clip: PathBuf,
) -> JoinHandle<Option<u32>> {
    thread::spawn(move || {
        let count = match estimator.estimate(&clip) {
            Ok(count) => count,
            Err(e) => {
                warn!("session {session_id}: estimate unavailable: {e}");
                return None;
            }
        };

        match manager.on_estimate_ready(session_id, count) {
            Ok(_) => {
                info!("session {session_id}: estimator counted {count} from {clip:?}");
                Some(count)
            }
            Err(e) => {
                warn!("session {session_id}: dropped estimate of {count}: {e}");
                None
            }
        }
    })
}
