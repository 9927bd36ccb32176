//! Network-idle detection for navigation.
//!
//! The browser reports request lifecycle events; navigation is complete once
//! the number of open requests stays at or below a threshold for a full quiet
//! window.

use crate::NetworkIdle;
use futures::{stream, Stream, StreamExt};
use std::collections::HashSet;
use tracing::trace;

/// Request lifecycle event, keyed by the browser's request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkActivity {
    Started(String),
    Finished(String),
    Failed(String),
}

/// Open request ids.
///
/// Lifecycle events arrive on separate listeners, so a request's end can be
/// seen before its start. Ended ids are remembered and a late start for one of
/// them is ignored.
#[derive(Debug, Default)]
pub struct InflightTracker {
    open: HashSet<String>,
    settled: HashSet<String>,
}

impl InflightTracker {
    pub fn apply(&mut self, activity: NetworkActivity) {
        match activity {
            // Redirects reuse the request id, so a repeated start is a no-op.
            NetworkActivity::Started(id) => {
                if !self.settled.contains(&id) {
                    self.open.insert(id);
                }
            }
            NetworkActivity::Finished(id) | NetworkActivity::Failed(id) => {
                self.open.remove(&id);
                self.settled.insert(id);
            }
        }
    }

    pub fn inflight(&self) -> usize {
        self.open.len()
    }
}

/// Combines the three lifecycle listeners into one activity stream.
pub fn merge_activity<A, B, C>(
    started: A,
    finished: B,
    failed: C,
) -> impl Stream<Item = NetworkActivity>
where
    A: Stream<Item = NetworkActivity>,
    B: Stream<Item = NetworkActivity>,
    C: Stream<Item = NetworkActivity>,
{
    stream::select(started, stream::select(finished, failed))
}

/// Resolves once the network has been idle for `idle.quiet_window`, or when the
/// activity stream ends. Never times out on its own.
pub async fn wait_until_idle<S>(mut activity: S, idle: &NetworkIdle)
where
    S: Stream<Item = NetworkActivity> + Unpin,
{
    let mut tracker = InflightTracker::default();

    loop {
        let next = if tracker.inflight() <= idle.max_inflight {
            match tokio::time::timeout(idle.quiet_window, activity.next()).await {
                Ok(next) => next,
                Err(_) => {
                    trace!("Network idle with {} open requests", tracker.inflight());
                    return;
                }
            }
        } else {
            activity.next().await
        };

        match next {
            Some(event) => tracker.apply(event),
            None => return,
        }
    }
}
