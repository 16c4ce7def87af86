//! Network mapper: probes addresses for protocol support and aggregates the hits

use crate::config::ScanConfig;
use crate::probe::{ConnectionProvider, ProbeOutcome, ProtocolSession, SessionFactory};
use crate::scanner::ScanReport;
use crate::ScanError;
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Scans networks for hosts which speak a protocol.
///
/// The mapper owns no transport or protocol logic of its own: `provider`
/// opens connections and `factory` turns each connection into a session whose
/// capability check is the verdict for that host. Every failure on the way
/// (unreachable host, handshake error, panicking session) becomes a negative
/// result for that one address.
pub struct NetworkMapper<P, F> {
    provider: Arc<P>,
    factory: Arc<F>,
    max_in_flight: usize,
}

impl<P, F> NetworkMapper<P, F>
where
    P: ConnectionProvider,
    F: SessionFactory<P::Connection>,
{
    /// Create a mapper with the default in-flight limit
    pub fn new(provider: P, factory: F) -> Self {
        Self::with_config(provider, factory, &ScanConfig::default())
    }

    /// Create a mapper taking its in-flight limit from `config`
    pub fn with_config(provider: P, factory: F, config: &ScanConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            factory: Arc::new(factory),
            max_in_flight: config.max_in_flight.max(1),
        }
    }

    /// Cap the number of probes running at once (at least one)
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Returns true if the host at `addr` exists and supports the protocol
    pub async fn ping(&self, addr: &P::Address) -> bool {
        self.probe(addr).await.is_supported()
    }

    /// Probe a single address and report how the probe ended
    pub async fn probe(&self, addr: &P::Address) -> ProbeOutcome {
        isolated_probe(&*self.provider, &*self.factory, addr).await
    }

    /// Probe every address concurrently and return the ones that support the protocol.
    ///
    /// Order of the result is unspecified. Duplicate input addresses are
    /// probed once.
    pub async fn scan<I>(&self, addresses: I) -> crate::Result<Vec<P::Address>>
    where
        I: IntoIterator<Item = P::Address>,
    {
        Ok(self.scan_report(addresses).await?.supported)
    }

    /// Same as [`scan`](Self::scan), also returning per-outcome statistics.
    ///
    /// Dropping the returned future does not cancel probes already spawned;
    /// they run to completion detached.
    pub async fn scan_report<I>(&self, addresses: I) -> crate::Result<ScanReport<P::Address>>
    where
        I: IntoIterator<Item = P::Address>,
    {
        let start_time = Instant::now();
        let mut report = ScanReport::new();

        let mut seen = HashSet::new();
        let targets: Vec<P::Address> = addresses
            .into_iter()
            .filter(|addr| seen.insert(addr.clone()))
            .collect();

        if targets.is_empty() {
            return Ok(report);
        }

        log::info!(
            "Probing {} addresses with up to {} in flight",
            targets.len(),
            self.max_in_flight
        );

        // Admission is gated here; a task holds its permit until its probe ends
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut handles: Vec<(P::Address, JoinHandle<ProbeOutcome>)> = Vec::with_capacity(targets.len());

        for addr in targets {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    abort_all(handles);
                    return Err(ScanError::Runtime(format!("probe admission failed: {}", e)));
                }
            };
            let provider = Arc::clone(&self.provider);
            let factory = Arc::clone(&self.factory);
            let target = addr.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                isolated_probe(&*provider, &*factory, &target).await
            });
            handles.push((addr, handle));
        }

        // Join barrier: nothing is reported until every probe has finished
        let mut pending = handles.into_iter();
        while let Some((addr, handle)) = pending.next() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => {
                    log::warn!("Probe task for {:?} panicked", addr);
                    ProbeOutcome::Errored
                }
                Err(e) => {
                    abort_all(pending);
                    return Err(ScanError::Runtime(format!(
                        "probe task for {:?} did not complete: {}",
                        addr, e
                    )));
                }
            };
            report.record(addr, outcome);
        }

        report.set_duration(start_time.elapsed());
        log::info!(
            "Scan finished in {:?}: {} supported, {} unsupported, {} unreachable, {} errored",
            report.stats.duration,
            report.stats.supported,
            report.stats.unsupported,
            report.stats.unreachable,
            report.stats.errored
        );

        Ok(report)
    }
}

fn abort_all<A, I>(handles: I)
where
    I: IntoIterator<Item = (A, JoinHandle<ProbeOutcome>)>,
{
    for (_, handle) in handles {
        handle.abort();
    }
}

/// Run one probe, turning a panic anywhere inside it into `Errored`
async fn isolated_probe<P, F>(provider: &P, factory: &F, addr: &P::Address) -> ProbeOutcome
where
    P: ConnectionProvider,
    F: SessionFactory<P::Connection>,
{
    match AssertUnwindSafe(run_probe(provider, factory, addr)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(_) => {
            log::warn!("Probe of {:?} panicked", addr);
            ProbeOutcome::Errored
        }
    }
}

async fn run_probe<P, F>(provider: &P, factory: &F, addr: &P::Address) -> ProbeOutcome
where
    P: ConnectionProvider,
    F: SessionFactory<P::Connection>,
{
    let conn = match provider.connect(addr).await {
        Ok(conn) => conn,
        Err(e) => {
            log::debug!("{:?}: connect failed: {}", addr, e);
            return ProbeOutcome::Unreachable;
        }
    };

    // The session takes the connection; dropping it closes both
    let mut session = factory.make_session(conn);
    let outcome = match session.supports_protocol().await {
        Ok(true) => ProbeOutcome::Supported,
        Ok(false) => ProbeOutcome::Unsupported,
        Err(e) => {
            log::debug!("{:?}: capability check failed: {}", addr, e);
            ProbeOutcome::Errored
        }
    };
    drop(session);

    log::debug!("{:?}: {}", addr, outcome);
    outcome
}
