//! Best-effort stream reachability check
//!
//! Probes a bounded number of entries with a small worker pool. Each probe
//! races a per-item timeout, so a hanging server only costs its own slot.
//! Probing never fails: anything other than a usable response is `Offline`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::models::{Entry, EntryId, StreamStatus};

pub const DEFAULT_PROBE_CAP: usize = 50;
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(4);
pub const DEFAULT_PROBE_CONCURRENCY: usize = 10;

/// A single liveness check. Implementations may block; the prober bounds them.
pub trait ReachabilityCheck: Send + Sync {
    fn is_reachable(&self, url: &str) -> bool;
}

/// HEAD request over HTTP(S)
pub struct HttpCheck {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpCheck {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            user_agent: user_agent.to_string(),
        }
    }
}

impl ReachabilityCheck for HttpCheck {
    fn is_reachable(&self, url: &str) -> bool {
        match self.agent.head(url).header("User-Agent", &self.user_agent).call() {
            // 405: alive, just refuses HEAD
            Ok(response) => {
                let status = response.status().as_u16();
                status < 400 || status == 405
            }
            Err(e) => {
                debug!("Probe failed for {}: {}", url, e);
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Probes running at once
    pub concurrency: usize,
    /// Per-entry deadline
    pub timeout: Duration,
    /// Entries probed per invocation; the rest are left alone
    pub cap: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_PROBE_CONCURRENCY,
            timeout: DEFAULT_PROBE_TIMEOUT,
            cap: DEFAULT_PROBE_CAP,
        }
    }
}

pub struct Prober {
    check: Arc<dyn ReachabilityCheck>,
    config: ProbeConfig,
}

impl Prober {
    pub fn new(check: Arc<dyn ReachabilityCheck>, config: ProbeConfig) -> Self {
        Self { check, config }
    }

    /// Prober backed by [`HttpCheck`]
    pub fn http(config: ProbeConfig, user_agent: &str) -> Self {
        Self::new(Arc::new(HttpCheck::new(config.timeout, user_agent)), config)
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// The entries an invocation would probe
    pub fn targets<'a>(&self, entries: &'a [Entry]) -> &'a [Entry] {
        &entries[..entries.len().min(self.config.cap)]
    }

    /// Probe up to `cap` entries and return a status for each of them.
    /// Blocks until every probe has finished or timed out.
    pub fn probe(&self, entries: &[Entry]) -> HashMap<EntryId, StreamStatus> {
        let targets: Vec<(EntryId, &str)> = self
            .targets(entries)
            .iter()
            .map(|e| (e.id(), e.url.as_str()))
            .collect();
        if targets.is_empty() {
            return HashMap::new();
        }

        let started = Instant::now();
        let workers = self.config.concurrency.max(1).min(targets.len());
        let next = AtomicUsize::new(0);
        let next = &next;
        let queue = &targets;

        let mut results: HashMap<EntryId, StreamStatus> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(move || {
                        let mut done = Vec::new();
                        loop {
                            let idx = next.fetch_add(1, Ordering::Relaxed);
                            let Some(&(id, url)) = queue.get(idx) else {
                                break;
                            };
                            done.push((id, self.probe_one(url)));
                        }
                        done
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap_or_default())
                .collect()
        });

        // A worker that died still owes its entries an answer
        for (id, _) in &targets {
            results.entry(*id).or_insert(StreamStatus::Offline);
        }

        let online = results.values().filter(|s| **s == StreamStatus::Online).count();
        info!(
            "Probed {} streams in {:?}: {} online, {} offline",
            results.len(),
            started.elapsed(),
            online,
            results.len() - online
        );
        results
    }

    /// Run one check on its own thread and race it against the timeout
    fn probe_one(&self, url: &str) -> StreamStatus {
        let (sender, receiver) = channel();
        let check = Arc::clone(&self.check);
        let url = url.to_string();

        thread::spawn(move || {
            let _ = sender.send(check.is_reachable(&url));
        });

        match receiver.recv_timeout(self.config.timeout) {
            Ok(true) => StreamStatus::Online,
            // unreachable, timed out, or the check panicked
            _ => StreamStatus::Offline,
        }
    }
}

#[cfg(test)]
#[path = "prober_tests.rs"]
mod tests;
