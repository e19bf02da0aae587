// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Progress event types and broadcast channel for real-time crawl telemetry.
//!
//! The orchestrator emits `ProgressEvent`s while it works through the waves.
//! They flow through a `tokio::sync::broadcast` channel to every subscriber
//! (progress bar, log sinks). When no subscriber exists, events are dropped.

use serde::{Deserialize, Serialize};

/// A progress event emitted during a crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The crawl run this event belongs to.
    pub run_id: String,
    /// Monotonically increasing sequence number.
    pub seq: u64,
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// The sitemap was read.
    SitemapLoaded { url_count: usize },
    /// A wave is about to be dispatched.
    WaveStarted {
        wave: u32,
        size: usize,
        /// Average load of the previous wave, if any samples were taken.
        average_load: Option<f64>,
        remaining: usize,
    },
    /// One page visit finished successfully.
    PageVisited {
        url: String,
        observations: usize,
        elapsed_ms: u64,
    },
    /// One page visit failed. The crawl continues.
    PageFailed { url: String, error: String },
    /// Every visit of a wave settled and its observations were merged.
    WaveCompleted {
        wave: u32,
        succeeded: usize,
        failed: usize,
        findings_total: usize,
        elapsed_ms: u64,
    },
    /// Failed URLs are queued for one more pass.
    RetryScheduled { url_count: usize },
    /// The crawl finished.
    CrawlComplete {
        pages_succeeded: usize,
        pages_failed: usize,
        findings: usize,
        elapsed_ms: u64,
    },
}

/// Sender handle for emitting progress events.
pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a new progress broadcast channel with a bounded buffer.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(1024)
}

/// Emit a progress event, silently ignoring send errors (which occur when
/// no receivers are listening).
pub fn emit(tx: &Option<ProgressSender>, run_id: &str, seq: &mut u64, event: ProgressEventKind) {
    if let Some(ref sender) = tx {
        *seq += 1;
        let _ = sender.send(ProgressEvent {
            run_id: run_id.to_string(),
            seq: *seq,
            event,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_serialization() {
        let event = ProgressEvent {
            run_id: "run-1".to_string(),
            seq: 1,
            event: ProgressEventKind::WaveStarted {
                wave: 1,
                size: 10,
                average_load: None,
                remaining: 32,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("WaveStarted"));

        let parsed: ProgressEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.run_id, "run-1");
        assert_eq!(parsed.seq, 1);
    }

    #[test]
    fn test_channel_no_receivers() {
        let (tx, rx) = channel();
        drop(rx);
        let mut seq = 0;
        emit(
            &Some(tx),
            "run",
            &mut seq,
            ProgressEventKind::RetryScheduled { url_count: 1 },
        );
        assert_eq!(seq, 1);
    }

    #[test]
    fn test_emit_none_sender() {
        let mut seq = 0;
        emit(
            &None,
            "run",
            &mut seq,
            ProgressEventKind::RetryScheduled { url_count: 1 },
        );
        assert_eq!(seq, 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_in_order() {
        let (tx, mut rx) = channel();
        let tx = Some(tx);
        let mut seq = 0;
        emit(&tx, "run", &mut seq, ProgressEventKind::SitemapLoaded { url_count: 3 });
        emit(
            &tx,
            "run",
            &mut seq,
            ProgressEventKind::PageFailed {
                url: "https://x.com/3".into(),
                error: "timeout".into(),
            },
        );
        assert_eq!(rx.recv().await.unwrap().seq, 1);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.seq, 2);
        assert!(matches!(second.event, ProgressEventKind::PageFailed { .. }));
    }
}
