use std::{
    net::IpAddr,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::{Duration, SystemTime},
};

use async_trait::async_trait;
use glass_model::{DnsConfig, IpVersion};
use tokio::{
    task::{JoinHandle, JoinSet},
    time::{Instant, MissedTickBehavior, interval, timeout},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::{
    Resolve,
    doh::{DohClient, Endpoint, HttpDohClient, RecordType},
    errors::DnsError,
    system::{SystemResolver, TokioSystemResolver},
};

const MIN_PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// Point-in-time view of one endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointStatus {
    pub name: String,
    pub url: String,
    pub latency: Option<Duration>,
    pub last_probe: Option<SystemTime>,
    pub current: bool,
}

struct EndpointState {
    endpoint: Endpoint,
    latency: Option<Duration>,
    last_probe: Option<SystemTime>,
}

struct EndpointTable {
    endpoints: Vec<EndpointState>,
    current: usize,
}

impl EndpointTable {
    /// Index of the lowest measured latency; unmeasured endpoints rank last, ties keep the
    /// earlier entry.
    fn fastest(&self) -> usize {
        let mut best = 0;
        let mut best_latency = Duration::MAX;
        for (i, ep) in self.endpoints.iter().enumerate() {
            let latency = ep.latency.unwrap_or(Duration::MAX);
            if latency < best_latency {
                best = i;
                best_latency = latency;
            }
        }
        best
    }
}

/// Multi-endpoint DoH resolver.
///
/// Build one per process, share it behind an `Arc` and start [`DnsResolver::spawn_prober`]
/// to keep the endpoint ranking fresh.
pub struct DnsResolver {
    table: RwLock<EndpointTable>,
    client: Arc<dyn DohClient>,
    system: Arc<dyn SystemResolver>,
    probe_domain: String,
    probe_interval: Duration,
    resolve_timeout: Duration,
    query_timeout: Duration,
    failure_penalty: Duration,
}

impl DnsResolver {
    /// Resolver backed by `reqwest` and the platform resolver.
    pub fn new(cfg: &DnsConfig) -> Result<Self, DnsError> {
        let client = HttpDohClient::new(cfg.query_timeout())?;
        Self::with_backends(cfg, Arc::new(client), Arc::new(TokioSystemResolver))
    }

    pub fn with_backends(
        cfg: &DnsConfig,
        client: Arc<dyn DohClient>,
        system: Arc<dyn SystemResolver>,
    ) -> Result<Self, DnsError> {
        if cfg.endpoints.is_empty() {
            return Err(DnsError::NoEndpoints);
        }
        let endpoints = cfg
            .endpoints
            .iter()
            .map(|e| {
                Ok(EndpointState {
                    endpoint: Endpoint::parse(&e.name, &e.url)?,
                    latency: None,
                    last_probe: None,
                })
            })
            .collect::<Result<Vec<_>, DnsError>>()?;

        Ok(Self {
            table: RwLock::new(EndpointTable {
                endpoints,
                current: 0,
            }),
            client,
            system,
            probe_domain: cfg.probe_domain.clone(),
            probe_interval: cfg.probe_interval().max(MIN_PROBE_INTERVAL),
            resolve_timeout: cfg.resolve_timeout(),
            query_timeout: cfg.query_timeout(),
            failure_penalty: cfg.failure_penalty(),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, EndpointTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, EndpointTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve `domain` to addresses of the preferred family.
    ///
    /// Per-endpoint failures are absorbed; only when every DoH endpoint and the platform
    /// resolver have failed does this return [`DnsError::Exhausted`].
    #[instrument(level = "debug", target = "glass.dns", skip(self))]
    pub async fn resolve(&self, domain: &str, version: IpVersion) -> Result<Vec<IpAddr>, DnsError> {
        let (current, others) = {
            let table = self.read();
            let current = table.endpoints[table.current].endpoint.clone();
            let others = table
                .endpoints
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != table.current)
                .map(|(_, e)| e.endpoint.clone())
                .collect::<Vec<_>>();
            (current, others)
        };

        match timeout(
            self.resolve_timeout,
            self.resolve_doh(domain, version, current, others),
        )
        .await
        {
            Ok(Some(ips)) => return Ok(ips),
            Ok(None) => debug!(target: "glass.dns", "every DoH endpoint failed; using system resolver"),
            Err(_) => warn!(
                target: "glass.dns",
                timeout_ms = self.resolve_timeout.as_millis() as u64,
                "DoH resolution deadline exceeded; using system resolver"
            ),
        }

        self.resolve_system(domain, version).await
    }

    async fn resolve_doh(
        &self,
        domain: &str,
        version: IpVersion,
        current: Endpoint,
        others: Vec<Endpoint>,
    ) -> Option<Vec<IpAddr>> {
        match query_with_deadline(self.client.as_ref(), &current, domain, version, self.query_timeout).await {
            Ok(ips) if !ips.is_empty() => {
                trace!(target: "glass.dns", endpoint = %current.name, "answered by current endpoint");
                return Some(ips);
            }
            Ok(_) => debug!(target: "glass.dns", endpoint = %current.name, "current endpoint returned no addresses"),
            Err(e) => debug!(target: "glass.dns", endpoint = %current.name, error = %e, "current endpoint failed"),
        }

        // Dropping the set aborts whatever is still in flight.
        let mut race = JoinSet::new();
        for endpoint in others {
            let client = Arc::clone(&self.client);
            let domain = domain.to_string();
            let deadline = self.query_timeout;
            race.spawn(async move {
                let res = query_with_deadline(client.as_ref(), &endpoint, &domain, version, deadline).await;
                (endpoint.name, res)
            });
        }

        while let Some(joined) = race.join_next().await {
            match joined {
                Ok((name, Ok(ips))) if !ips.is_empty() => {
                    debug!(target: "glass.dns", endpoint = %name, "race won");
                    return Some(ips);
                }
                Ok((name, Ok(_))) => trace!(target: "glass.dns", endpoint = %name, "no addresses"),
                Ok((name, Err(e))) => debug!(target: "glass.dns", endpoint = %name, error = %e, "endpoint failed"),
                Err(e) => warn!(target: "glass.dns", error = %e, "resolution task aborted"),
            }
        }
        None
    }

    async fn resolve_system(&self, domain: &str, version: IpVersion) -> Result<Vec<IpAddr>, DnsError> {
        let exhausted = |reason: String| DnsError::Exhausted {
            domain: domain.to_string(),
            reason,
        };

        let ips = match timeout(self.query_timeout, self.system.lookup(domain)).await {
            Ok(Ok(ips)) => ips,
            Ok(Err(e)) => return Err(exhausted(e.to_string())),
            Err(_) => return Err(exhausted(DnsError::Timeout(self.query_timeout).to_string())),
        };

        let ips = filter_version(ips, version);
        if ips.is_empty() {
            return Err(exhausted(format!("no {version} addresses")));
        }
        Ok(ips)
    }

    /// Measure every endpoint once and re-rank them.
    pub async fn probe(&self) {
        let targets: Vec<Endpoint> = self.read().endpoints.iter().map(|e| e.endpoint.clone()).collect();

        let mut probes = JoinSet::new();
        for (idx, endpoint) in targets.into_iter().enumerate() {
            let client = Arc::clone(&self.client);
            let domain = self.probe_domain.clone();
            let deadline = self.query_timeout;
            let penalty = self.failure_penalty;
            probes.spawn(async move {
                let started = Instant::now();
                let latency = match timeout(deadline, client.query(&endpoint, &domain, RecordType::A)).await {
                    Ok(Ok(_)) => started.elapsed(),
                    Ok(Err(e)) => {
                        debug!(target: "glass.dns", endpoint = %endpoint.name, error = %e, "probe failed");
                        penalty
                    }
                    Err(_) => {
                        debug!(target: "glass.dns", endpoint = %endpoint.name, "probe timed out");
                        penalty
                    }
                };
                (idx, latency)
            });
        }

        let mut measured = Vec::new();
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok(m) => measured.push(m),
                Err(e) => warn!(target: "glass.dns", error = %e, "probe task aborted"),
            }
        }

        let now = SystemTime::now();
        let mut table = self.write();
        for (idx, latency) in measured {
            if let Some(ep) = table.endpoints.get_mut(idx) {
                ep.latency = Some(latency);
                ep.last_probe = Some(now);
            }
        }
        let previous = table.current;
        table.current = table.fastest();

        let current = &table.endpoints[table.current];
        if previous != table.current {
            info!(
                target: "glass.dns",
                endpoint = %current.endpoint.name,
                latency_ms = current.latency.map(|l| l.as_millis() as u64),
                "switched current DoH endpoint"
            );
        } else {
            debug!(target: "glass.dns", endpoint = %current.endpoint.name, "probe round finished");
        }
    }

    /// Run [`DnsResolver::probe`] now and then every probe interval until `cancel` fires.
    pub fn spawn_prober(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(this.probe_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(target: "glass.dns", "prober stopped");
                        break;
                    }
                    _ = ticker.tick() => this.probe().await,
                }
            }
        })
    }

    pub fn current_endpoint(&self) -> EndpointStatus {
        let table = self.read();
        status_of(&table.endpoints[table.current], true)
    }

    pub fn endpoints(&self) -> Vec<EndpointStatus> {
        let table = self.read();
        table
            .endpoints
            .iter()
            .enumerate()
            .map(|(i, e)| status_of(e, i == table.current))
            .collect()
    }
}

#[async_trait]
impl Resolve for DnsResolver {
    async fn resolve(&self, domain: &str, version: IpVersion) -> Result<Vec<IpAddr>, DnsError> {
        DnsResolver::resolve(self, domain, version).await
    }
}

fn status_of(state: &EndpointState, current: bool) -> EndpointStatus {
    EndpointStatus {
        name: state.endpoint.name.clone(),
        url: state.endpoint.url.to_string(),
        latency: state.latency,
        last_probe: state.last_probe,
        current,
    }
}

async fn query_with_deadline(
    client: &dyn DohClient,
    endpoint: &Endpoint,
    domain: &str,
    version: IpVersion,
    deadline: Duration,
) -> Result<Vec<IpAddr>, DnsError> {
    timeout(deadline, query_version(client, endpoint, domain, version))
        .await
        .map_err(|_| DnsError::Timeout(deadline))?
}

async fn query_version(
    client: &dyn DohClient,
    endpoint: &Endpoint,
    domain: &str,
    version: IpVersion,
) -> Result<Vec<IpAddr>, DnsError> {
    match version {
        IpVersion::V4 => client.query(endpoint, domain, RecordType::A).await,
        IpVersion::V6 => client.query(endpoint, domain, RecordType::Aaaa).await,
        IpVersion::Auto => {
            let (v4, v6) = tokio::join!(
                client.query(endpoint, domain, RecordType::A),
                client.query(endpoint, domain, RecordType::Aaaa),
            );
            merge_auto(v4, v6)
        }
    }
}

/// IPv4 wins when both families answered; otherwise take whichever has addresses.
fn merge_auto(
    v4: Result<Vec<IpAddr>, DnsError>,
    v6: Result<Vec<IpAddr>, DnsError>,
) -> Result<Vec<IpAddr>, DnsError> {
    match (v4, v6) {
        (Ok(a), _) if !a.is_empty() => Ok(a),
        (_, Ok(b)) if !b.is_empty() => Ok(b),
        (Ok(a), _) => Ok(a),
        (_, Ok(b)) => Ok(b),
        (Err(e), Err(_)) => Err(e),
    }
}

fn filter_version(ips: Vec<IpAddr>, version: IpVersion) -> Vec<IpAddr> {
    match version {
        IpVersion::V4 => ips.into_iter().filter(IpAddr::is_ipv4).collect(),
        IpVersion::V6 => ips.into_iter().filter(IpAddr::is_ipv6).collect(),
        IpVersion::Auto => {
            if ips.iter().any(IpAddr::is_ipv4) {
                ips.into_iter().filter(IpAddr::is_ipv4).collect()
            } else {
                ips
            }
        }
    }
}
