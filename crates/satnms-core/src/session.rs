// ── NMS session ──
//
// The configuration client: one authenticated NMS connection plus the
// object repository it feeds. Every scenario operation goes through an
// explicit `NmsSession` value; there is no process-global connection.
//
// Writes fail fast with domain errors. Waits never fail: they report
// whether the remote state converged before the timeout.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use satnms_api::NmsClient;
use satnms_api::transport::{TlsMode, TransportConfig};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{SessionConfig, TlsVerification};
use crate::enums::{ControllerMode, DeviceModel, EnumFamily, ObjectState, StationMode};
use crate::error::{CoreError, Operation};
use crate::model::{Capabilities, Faults, Handle, Params};
use crate::snapshot::SnapshotManager;
use crate::store::ObjectRepository;
use crate::wait::{Convergence, poll_until};

/// An open session against one NMS.
pub struct NmsSession {
    config: SessionConfig,
    client: NmsClient,
    repository: ObjectRepository,
    snapshots: SnapshotManager,
    /// Serializes index allocation per object type across concurrent creates.
    create_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl NmsSession {
    /// Build a session without contacting the NMS.
    pub fn new(config: SessionConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: tls_mode(&config.tls),
            timeout: config.timeout,
            cookie_jar: None,
        }
        .with_cookie_jar();
        let client = NmsClient::new(config.url.clone(), &transport)?;
        Ok(Self::with_client(config, client))
    }

    /// Build a session around an existing client.
    pub fn with_client(config: SessionConfig, client: NmsClient) -> Self {
        let snapshots = SnapshotManager::new(config.snapshot_dir.clone());
        Self {
            config,
            client,
            repository: ObjectRepository::new(),
            snapshots,
            create_locks: DashMap::new(),
        }
    }

    /// Build a session and authenticate.
    ///
    /// Without credentials the tick counter is read instead, so an
    /// unreachable NMS fails here rather than at the first operation.
    pub async fn connect(config: SessionConfig) -> Result<Self, CoreError> {
        let session = Self::new(config)?;
        session.open().await?;
        Ok(session)
    }

    async fn open(&self) -> Result<(), CoreError> {
        let url = self.config.url.to_string();
        let result = match &self.config.credentials {
            Some(creds) => self.client.login(&creds.username, &creds.password).await,
            None => self.client.get_tick().await.map(|_| ()),
        };
        result.map_err(|e| match CoreError::from(e) {
            CoreError::ConnectionFailed { reason, .. } => CoreError::ConnectionFailed { url, reason },
            other => other,
        })?;
        info!(url = %self.config.url, "connected to NMS");
        Ok(())
    }

    /// Log out. Failures are logged, not returned: the session is going away.
    pub async fn disconnect(self) {
        if self.config.credentials.is_some() {
            if let Err(e) = self.client.logout().await {
                warn!(error = %e, "logout failed (non-fatal)");
            }
        }
        debug!("disconnected");
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn client(&self) -> &NmsClient {
        &self.client
    }

    pub fn repository(&self) -> &ObjectRepository {
        &self.repository
    }

    pub fn snapshots(&self) -> &SnapshotManager {
        &self.snapshots
    }

    // ── Snapshots ────────────────────────────────────────────────────

    /// Capture the full configuration as snapshot `name`.
    pub async fn create_backup(&self, name: &str, local: bool) -> Result<(), CoreError> {
        self.snapshots.create_backup(&self.client, name, local).await
    }

    /// Replace the full configuration with snapshot `name`.
    ///
    /// Handle indices restart from zero afterwards, matching the freshly
    /// loaded baseline.
    pub async fn load_config(&self, name: &str, local: bool) -> Result<(), CoreError> {
        self.snapshots.apply_backup(&self.client, name, local).await?;
        self.repository.reset();
        debug!(name, "object repository reset");
        Ok(())
    }

    /// Same as [`load_config`](Self::load_config).
    pub async fn apply_backup(&self, name: &str, local: bool) -> Result<(), CoreError> {
        self.load_config(name, local).await
    }

    // ── Objects ──────────────────────────────────────────────────────

    /// Create an object of `kind` under `parent` (`None` = root).
    ///
    /// The handle index is only consumed when the NMS accepts the object.
    pub async fn create(
        &self,
        parent: Option<&Handle>,
        kind: &str,
        params: Params,
    ) -> Result<Handle, CoreError> {
        let kind = kind.trim();
        if kind.is_empty() || kind.contains([':', '/']) {
            return Err(CoreError::invalid_usage(format!("invalid object type {kind:?}")));
        }
        check_capabilities(kind, &params)?;

        let lock = Arc::clone(self.create_locks.entry(kind.to_owned()).or_default().value());
        let _guard = lock.lock().await;

        let parent_path = Handle::parent_path(parent);
        let handle = Handle::new(kind, self.repository.peek_index(kind));
        debug!(%handle, parent = %parent_path, "creating object");

        let echoed = self
            .client
            .insert_object(&parent_path, kind, handle.index(), &params)
            .await
            .map_err(|e| {
                CoreError::from_api(
                    e,
                    Operation::Create {
                        parent: &parent_path,
                        kind,
                    },
                )
            })?;

        let mut stored = params;
        if let Value::Object(remote) = echoed {
            stored.extend(remote);
        }
        self.repository
            .commit_create(handle.clone(), parent.cloned(), stored);
        info!(%handle, parent = %parent_path, "object created");
        Ok(handle)
    }

    /// Submit a partial change. The NMS validates cross-field constraints;
    /// on rejection the last-known values are left as they were.
    pub async fn update(&self, handle: &Handle, changes: Params) -> Result<(), CoreError> {
        let merged = self.repository.merged(handle, &changes);
        self.client
            .write_object(&handle.to_string(), &changes)
            .await
            .map_err(|e| CoreError::from_api(e, Operation::Update { handle }))?;
        self.repository.commit_params(handle, merged);
        debug!(%handle, fields = changes.len(), "object updated");
        Ok(())
    }

    /// Last-known value of one parameter, as the NMS formatted it.
    pub fn read(&self, handle: &Handle, name: &str) -> Option<Value> {
        self.repository
            .get(handle)
            .and_then(|r| r.params.get(name).cloned())
    }

    /// Last-known parameters of an object.
    pub fn read_all(&self, handle: &Handle) -> Option<Params> {
        self.repository.get(handle).map(|r| r.params.clone())
    }

    /// Re-read an object from the NMS and update its last-known values.
    pub async fn refresh(&self, handle: &Handle) -> Result<Params, CoreError> {
        let remote = self
            .client
            .get_object(&handle.to_string())
            .await
            .map_err(|e| CoreError::from_api(e, Operation::Read { handle }))?;
        self.repository.absorb(handle, &remote);
        Ok(remote)
    }

    /// Live value of one parameter.
    pub async fn fetch(&self, handle: &Handle, name: &str) -> Result<Option<Value>, CoreError> {
        Ok(self.refresh(handle).await?.remove(name))
    }

    // ── Tick synchronization ─────────────────────────────────────────

    /// Current value of the NMS configuration-push counter.
    pub async fn tick(&self) -> Result<u64, CoreError> {
        Ok(self.client.get_tick().await?)
    }

    /// Wait until `n` configuration cycles have elapsed.
    ///
    /// Errors only when the starting tick cannot be read. Returns `false`
    /// if the counter stalls for longer than `tick_timeout` per tick.
    pub async fn wait_ticks(&self, n: u64) -> Result<bool, CoreError> {
        if n == 0 {
            return Ok(true);
        }
        let start = self.tick().await?;
        let target = start.saturating_add(n);
        let timeout = self
            .config
            .tick_timeout
            .saturating_mul(u32::try_from(n).unwrap_or(u32::MAX));

        let client = &self.client;
        let outcome = poll_until(self.config.tick_poll_interval, timeout, move || async move {
            match client.get_tick().await {
                // A counter below the start means the NMS restarted and
                // pushed a full configuration since.
                Ok(tick) => tick >= target || tick < start,
                Err(e) => {
                    debug!(error = %e, "tick poll failed");
                    false
                }
            }
        })
        .await;

        if outcome.is_reached() {
            debug!(n, start, polls = outcome.polls(), "ticks elapsed");
        } else {
            warn!(
                n,
                start,
                elapsed_ms = duration_ms(outcome.elapsed()),
                "tick counter did not advance in time"
            );
        }
        Ok(outcome.is_reached())
    }

    // ── Convergence ──────────────────────────────────────────────────

    /// Read the object's `state` from the NMS.
    pub async fn current_state(&self, handle: &Handle) -> Result<Option<ObjectState>, CoreError> {
        let params = self.refresh(handle).await?;
        Ok(params.get("state").and_then(ObjectState::from_json))
    }

    /// Read and decode the object's `faults` from the NMS.
    ///
    /// `None` when the field is absent or cannot be decoded.
    pub async fn current_faults(&self, handle: &Handle) -> Result<Option<Faults>, CoreError> {
        let params = self.refresh(handle).await?;
        let Some(raw) = params.get("faults") else {
            return Ok(None);
        };
        let faults = Faults::from_json(raw);
        if faults.is_none() {
            debug!(%handle, faults = %raw, "undecodable faults value");
        }
        Ok(faults)
    }

    /// Poll the object's state until `accept` holds or `timeout` expires.
    ///
    /// Read errors count as "not yet": an object whose link is
    /// re-acquiring may briefly be unreadable.
    pub async fn poll_state<P>(&self, handle: &Handle, timeout: Duration, accept: P) -> Convergence
    where
        P: Fn(Option<ObjectState>) -> bool,
    {
        let accept = &accept;
        let outcome = poll_until(self.config.poll_interval, timeout, move || async move {
            match self.current_state(handle).await {
                Ok(state) => accept(state),
                Err(e) => {
                    debug!(%handle, error = %e, "state poll failed");
                    false
                }
            }
        })
        .await;
        log_outcome(handle, "state", &outcome);
        outcome
    }

    /// Wait for `Up`.
    pub async fn wait_up(&self, handle: &Handle, timeout: Duration) -> bool {
        self.wait_state(handle, ObjectState::Up, timeout).await
    }

    /// Wait until the object reports `state`.
    pub async fn wait_state(&self, handle: &Handle, state: ObjectState, timeout: Duration) -> bool {
        self.poll_state(handle, timeout, |s| s == Some(state))
            .await
            .is_reached()
    }

    /// Wait until the object reports anything other than `state`.
    pub async fn wait_not_state(
        &self,
        handle: &Handle,
        state: ObjectState,
        timeout: Duration,
    ) -> bool {
        self.poll_state(handle, timeout, |s| s != Some(state))
            .await
            .is_reached()
    }

    /// Poll the object's faults until they match `expected`.
    ///
    /// `strict` requires equality; otherwise `expected` must be a subset.
    pub async fn poll_faults(
        &self,
        handle: &Handle,
        expected: Faults,
        strict: bool,
        timeout: Duration,
    ) -> Convergence {
        let outcome = poll_until(self.config.poll_interval, timeout, move || async move {
            match self.current_faults(handle).await {
                Ok(Some(faults)) => faults.matches(expected, strict),
                Ok(None) => false,
                Err(e) => {
                    debug!(%handle, error = %e, "fault poll failed");
                    false
                }
            }
        })
        .await;
        log_outcome(handle, "faults", &outcome);
        outcome
    }

    pub async fn wait_faults(
        &self,
        handle: &Handle,
        expected: Faults,
        strict: bool,
        timeout: Duration,
    ) -> bool {
        self.poll_faults(handle, expected, strict, timeout)
            .await
            .is_reached()
    }
}

fn tls_mode(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

/// Reject controller/station modes the named hardware model can't run.
fn check_capabilities(kind: &str, params: &Params) -> Result<(), CoreError> {
    let Some(raw_model) = params.get("model") else {
        return Ok(());
    };
    let model = DeviceModel::from_json(raw_model).ok_or_else(|| {
        CoreError::invalid_usage(format!("unknown hardware model {raw_model}"))
    })?;
    let caps = Capabilities::for_model(model);
    let Some(raw_mode) = params.get("mode") else {
        return Ok(());
    };

    match kind {
        "controller" => {
            let mode = ControllerMode::from_json(raw_mode).ok_or_else(|| {
                CoreError::invalid_usage(format!("unknown controller mode {raw_mode}"))
            })?;
            caps.ensure_controller_mode(mode)
        }
        "station" => {
            let mode = StationMode::from_json(raw_mode).ok_or_else(|| {
                CoreError::invalid_usage(format!("unknown station mode {raw_mode}"))
            })?;
            caps.ensure_station_mode(mode)
        }
        _ => Ok(()),
    }
}

fn log_outcome(handle: &Handle, what: &str, outcome: &Convergence) {
    let elapsed_ms = duration_ms(outcome.elapsed());
    if outcome.is_reached() {
        debug!(%handle, what, elapsed_ms, polls = outcome.polls(), "converged");
    } else {
        warn!(%handle, what, elapsed_ms, polls = outcome.polls(), "did not converge before timeout");
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
