use std::collections::VecDeque;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::PredictError;
use crate::types::{Prediction, Verdict};

/// Outcome of one prediction. Customer attributes are never kept.
#[derive(Debug, Clone, Serialize)]
pub struct RecentPrediction {
    pub timestamp: u64,
    pub probability: f64,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub predictions: u64,
    pub likely_to_churn: u64,
    pub not_likely_to_churn: u64,
    pub rejected: u64,
    pub defects: u64,
    pub uptime: String,
}

#[derive(Debug, Default)]
struct StatsCounters {
    predictions: u64,
    likely_to_churn: u64,
    not_likely_to_churn: u64,
    rejected: u64,
    defects: u64,
}

pub struct TelemetryStore {
    start_time: SystemTime,
    recent_limit: usize,
    stats: Mutex<StatsCounters>,
    recent: Mutex<VecDeque<RecentPrediction>>,
}

impl TelemetryStore {
    pub fn new(recent_limit: usize) -> Self {
        let recent_limit = recent_limit.max(1);
        TelemetryStore {
            start_time: SystemTime::now(),
            recent_limit,
            stats: Mutex::new(StatsCounters::default()),
            recent: Mutex::new(VecDeque::with_capacity(recent_limit)),
        }
    }

    pub async fn snapshot_stats(&self) -> StatsSnapshot {
        let stats = self.stats.lock().await;
        StatsSnapshot {
            predictions: stats.predictions,
            likely_to_churn: stats.likely_to_churn,
            not_likely_to_churn: stats.not_likely_to_churn,
            rejected: stats.rejected,
            defects: stats.defects,
            uptime: format_uptime(
                SystemTime::now()
                    .duration_since(self.start_time)
                    .unwrap_or(Duration::from_secs(0)),
            ),
        }
    }

    pub async fn snapshot_recent(&self) -> Vec<RecentPrediction> {
        let recent = self.recent.lock().await;
        recent.iter().cloned().collect()
    }

    pub async fn record_prediction(&self, prediction: &Prediction) {
        {
            let mut stats = self.stats.lock().await;
            stats.predictions = stats.predictions.saturating_add(1);
            match prediction.verdict {
                Verdict::LikelyToChurn => {
                    stats.likely_to_churn = stats.likely_to_churn.saturating_add(1);
                }
                Verdict::NotLikelyToChurn => {
                    stats.not_likely_to_churn = stats.not_likely_to_churn.saturating_add(1);
                }
            }
        }

        let mut recent = self.recent.lock().await;
        recent.push_front(RecentPrediction {
            timestamp: to_epoch_seconds(SystemTime::now()),
            probability: prediction.probability,
            verdict: prediction.verdict,
        });
        while recent.len() > self.recent_limit {
            recent.pop_back();
        }
    }

    /// Request bodies that never became a customer record.
    pub async fn record_rejected_request(&self) {
        let mut stats = self.stats.lock().await;
        stats.rejected = stats.rejected.saturating_add(1);
    }

    pub async fn record_failure(&self, error: &PredictError) {
        let mut stats = self.stats.lock().await;
        if error.is_defect() {
            stats.defects = stats.defects.saturating_add(1);
        } else {
            stats.rejected = stats.rejected.saturating_add(1);
        }
    }
}

fn to_epoch_seconds(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs()
}

fn format_uptime(duration: Duration) -> String {
    let total_minutes = duration.as_secs() / 60;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;
    format!("{}d {}h {}m", days, hours, minutes)
}
