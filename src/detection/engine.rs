use crate::config::DetectionConfig;
use crate::decoders::PacketDecoder;
use crate::detection::Alert;
use crate::error::{NidsError, Result};
use crate::packet::{DecodedPacket, RawPacket};
use crate::rules::SharedRuleSet;
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, trace};

const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// Statistics for rule evaluation
#[derive(Debug, Default)]
pub struct DetectionStats {
    pub packets_inspected: AtomicU64,
    pub decode_failures: AtomicU64,
    pub alerts_raised: AtomicU64,
}

impl DetectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_packets(&self) {
        self.packets_inspected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_decode_failures(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_alerts(&self, alerts: u64) {
        self.alerts_raised.fetch_add(alerts, Ordering::Relaxed);
    }

    /// (packets inspected, decode failures, alerts raised)
    pub fn get_stats(&self) -> (u64, u64, u64) {
        (
            self.packets_inspected.load(Ordering::Relaxed),
            self.decode_failures.load(Ordering::Relaxed),
            self.alerts_raised.load(Ordering::Relaxed),
        )
    }
}

/// Evaluates packets against the shared rule set.
///
/// Cloning is cheap and clones share the rule set and the statistics.
#[derive(Debug, Clone)]
pub struct DetectionEngine {
    rules: SharedRuleSet,
    config: DetectionConfig,
    decoder: PacketDecoder,
    stats: Arc<DetectionStats>,
}

impl DetectionEngine {
    pub fn new(rules: SharedRuleSet, config: DetectionConfig) -> Self {
        Self {
            rules,
            config,
            decoder: PacketDecoder::new(),
            stats: Arc::new(DetectionStats::new()),
        }
    }

    /// Use a different decoder for worker threads (e.g. raw IP captures)
    pub fn with_decoder(mut self, decoder: PacketDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn rules(&self) -> &SharedRuleSet {
        &self.rules
    }

    pub fn stats(&self) -> Arc<DetectionStats> {
        self.stats.clone()
    }

    /// Alerts for every rule matching the packet, in rule load order.
    ///
    /// The whole packet is evaluated against one snapshot, so a concurrent
    /// reload never mixes old and new rules for the same packet.
    pub fn inspect(&self, packet: &DecodedPacket) -> Vec<Alert> {
        let rules = self.rules.snapshot();
        self.stats.increment_packets();

        let alerts: Vec<Alert> = rules
            .matching(packet)
            .into_iter()
            .map(|rule| Alert::new(packet.raw.timestamp, rule))
            .collect();

        if !alerts.is_empty() {
            trace!("{} rules matched packet", alerts.len());
            self.stats.increment_alerts(alerts.len() as u64);
        }

        alerts
    }

    /// Number of worker threads `spawn_workers` starts
    pub fn worker_count(&self) -> usize {
        if self.config.worker_threads == 0 {
            num_cpus::get().saturating_sub(2).max(1)
        } else {
            self.config.worker_threads
        }
    }

    /// Packet queue sized by `packet_queue_size`
    pub fn packet_channel(&self) -> (Sender<RawPacket>, Receiver<RawPacket>) {
        bounded(self.config.packet_queue_size)
    }

    /// Alert queue sized by `alert_queue_size`
    pub fn alert_channel(&self) -> (Sender<Alert>, Receiver<Alert>) {
        bounded(self.config.alert_queue_size)
    }

    /// Start worker threads that decode and inspect packets from `packets`
    /// and forward alerts to `alerts`.
    ///
    /// Workers stop when `shutdown` is set, when every packet sender is gone,
    /// or when the alert receiver is dropped.
    pub fn spawn_workers(
        &self,
        packets: Receiver<RawPacket>,
        alerts: Sender<Alert>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Vec<thread::JoinHandle<()>>> {
        let count = self.worker_count();
        info!("Starting {} detection workers", count);

        (0..count)
            .map(|id| {
                let engine = self.clone();
                let packets = packets.clone();
                let alerts = alerts.clone();
                let shutdown = shutdown.clone();

                thread::Builder::new()
                    .name(format!("detect-worker-{}", id))
                    .spawn(move || engine.worker_loop(id, packets, alerts, shutdown))
                    .map_err(|e| {
                        NidsError::Thread(format!("Failed to spawn detection worker: {}", e))
                    })
            })
            .collect()
    }

    fn worker_loop(
        &self,
        id: usize,
        packets: Receiver<RawPacket>,
        alerts: Sender<Alert>,
        shutdown: Arc<AtomicBool>,
    ) {
        debug!("Detection worker {} started", id);

        while !shutdown.load(Ordering::Relaxed) {
            match packets.recv_timeout(RECV_TIMEOUT) {
                Ok(raw) => {
                    let decoded = match self.decoder.decode(raw) {
                        Ok(decoded) => decoded,
                        Err(e) => {
                            debug!("Failed to decode packet: {}", e);
                            self.stats.increment_decode_failures();
                            continue;
                        }
                    };

                    for alert in self.inspect(&decoded) {
                        if alerts.send(alert).is_err() {
                            info!("Alert channel closed, worker {} stopping", id);
                            return;
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Packet channel disconnected");
                    break;
                }
            }
        }

        debug!("Detection worker {} stopped", id);
    }
}
