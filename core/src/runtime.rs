//! The long-running engine host: per-entity state, global ticks and on-demand requests.
//!
//! Every mutation of a user or group goes through that entity's writer lock and replaces its
//! published state wholesale. Heavy computation runs off the async threads: per-user transit
//! updates through the [`WorkerPool`], charts, timing and synastry through `spawn_blocking`.

use crate::broadcaster::{StateBroadcaster, Subscription};
use crate::error::CoreError;
use crate::persistence::{
    Persistence, PersistenceError, KIND_BIRTH_DATA, KIND_CHART, KIND_GROUP, KIND_TRANSIT,
};
use crate::pool::{JobOutcome, WorkerPool};
use crate::store::EntityStore;
use chrono::{DateTime, Utc};
use orrery_config::OrreryConfig;
use orrery_signals::{EntityKey, StateMessage};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use urania::houses::system_by_name;
use urania::transit::DEFAULT_ACTIVE_ORB;
use urania::{
    BirthChart, BirthData, CancelToken, EphemerisError, EphemerisProvider, EphemerisSnapshot,
    GroupAnalysis, GroupRequest, GroupSynastryEngine, NatalChartCalculator, SacredTiming,
    SacredTimingEngine, StateSnapshot, TimingSettings, TransitModel, TransitState,
    TransitTracker, ValidationError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub house_system: String,
    pub active_orb: f64,
    pub timing: TimingSettings,
    pub concurrency: usize,
    pub job_timeout: Duration,
    pub provider_timeout: Duration,
    pub mailbox_capacity: usize,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            house_system: "equal".to_string(),
            active_orb: DEFAULT_ACTIVE_ORB,
            timing: TimingSettings::default(),
            concurrency: 4,
            job_timeout: Duration::from_secs(5),
            provider_timeout: Duration::from_secs(30),
            mailbox_capacity: 16,
        }
    }
}

impl RuntimeSettings {
    pub fn from_config(config: &OrreryConfig) -> Self {
        Self {
            house_system: config.chart.house_system.clone(),
            active_orb: config.transit.active_orb,
            timing: config.timing.settings(),
            concurrency: config.workers.concurrency,
            job_timeout: config.workers.job_timeout(),
            provider_timeout: config.scheduler.provider_timeout(),
            mailbox_capacity: config.broadcast.mailbox_capacity,
        }
    }
}

/// Published state of one user.
#[derive(Debug, Clone)]
pub struct UserState {
    pub birth_data: BirthData,
    pub chart: Arc<BirthChart>,
    /// Absent until an ephemeris snapshot has been seen
    pub transit: Option<Arc<TransitState>>,
}

/// Published state of one group.
#[derive(Debug, Clone)]
pub struct GroupState {
    pub request: GroupRequest,
    pub analysis: Option<Arc<GroupAnalysis>>,
}

/// What one successful tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub instant: DateTime<Utc>,
    pub updated: usize,
    pub failed: usize,
    pub timed_out: usize,
    /// Users whose chart was replaced while their update was in flight
    pub superseded: usize,
}

impl TickReport {
    fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant,
            updated: 0,
            failed: 0,
            timed_out: 0,
            superseded: 0,
        }
    }
}

/// Entities restored by [`AstroRuntime::hydrate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HydrateReport {
    pub users: usize,
    pub groups: usize,
    pub skipped: usize,
}

pub struct AstroRuntime<P> {
    provider: Arc<P>,
    natal: Arc<NatalChartCalculator<Arc<P>>>,
    timing: Arc<SacredTimingEngine<Arc<P>>>,
    synastry: Arc<GroupSynastryEngine>,
    transits: Arc<dyn TransitModel>,
    users: EntityStore<UserState>,
    groups: EntityStore<GroupState>,
    /// Last known good snapshot
    ephemeris: RwLock<Option<Arc<EphemerisSnapshot>>>,
    /// Set while the provider is failing
    outage: AtomicBool,
    pool: WorkerPool,
    broadcaster: StateBroadcaster,
    persistence: Arc<dyn Persistence>,
    provider_timeout: Duration,
}

impl<P: EphemerisProvider + 'static> AstroRuntime<P> {
    pub fn new(
        provider: Arc<P>,
        persistence: Arc<dyn Persistence>,
        settings: RuntimeSettings,
    ) -> Result<Self, CoreError> {
        settings.timing.validate()?;
        let house_system = system_by_name(&settings.house_system)?;
        let tracker = TransitTracker::new().with_active_orb(settings.active_orb);

        log::info!(
            "runtime using {} ephemeris, {} houses, {} workers",
            provider.name(),
            house_system.name(),
            settings.concurrency
        );

        Ok(Self {
            natal: Arc::new(
                NatalChartCalculator::new(provider.clone()).with_house_system(house_system.clone()),
            ),
            timing: Arc::new(SacredTimingEngine::new(
                provider.clone(),
                tracker.clone(),
                settings.timing,
            )),
            synastry: Arc::new(GroupSynastryEngine::new(house_system)),
            provider,
            transits: Arc::new(tracker),
            users: EntityStore::new(),
            groups: EntityStore::new(),
            ephemeris: RwLock::new(None),
            outage: AtomicBool::new(false),
            pool: WorkerPool::new(settings.concurrency, settings.job_timeout),
            broadcaster: StateBroadcaster::new(settings.mailbox_capacity),
            persistence,
            provider_timeout: settings.provider_timeout,
        })
    }

    /// Replaces the model used for per-user transit updates.
    pub fn with_transit_model(mut self, transits: Arc<dyn TransitModel>) -> Self {
        self.transits = transits;
        self
    }

    // ====================================================================
    // Users
    // ====================================================================

    /// Validates birth data, computes the natal chart and makes the user ready.
    ///
    /// Replaces any previous chart. On a validation error nothing is stored.
    pub async fn set_birth_data(
        &self,
        user_id: &str,
        birth: BirthData,
    ) -> Result<Arc<BirthChart>, CoreError> {
        if user_id.trim().is_empty() {
            return Err(ValidationError::new("user_id", "must not be empty").into());
        }
        self.install_user(user_id, birth, true).await
    }

    async fn install_user(
        &self,
        user_id: &str,
        birth: BirthData,
        persist: bool,
    ) -> Result<Arc<BirthChart>, CoreError> {
        birth.validate()?;

        let natal = self.natal.clone();
        let owner = user_id.to_string();
        let input = birth.clone();
        let chart = tokio::task::spawn_blocking(move || natal.compute(&owner, &input)).await??;
        let chart = Arc::new(chart);

        if persist {
            self.persistence
                .put(KIND_BIRTH_DATA, user_id, serde_json::to_value(&birth)?)
                .await?;
            self.persistence
                .put(KIND_CHART, user_id, serde_json::to_value(chart.as_ref())?)
                .await?;
        }

        // The snapshot is read under the writer lock; a tick publishing in between waits.
        let writer = self.users.lock(user_id).await;
        let transit = self.last_ephemeris().map(|snapshot| {
            let state = self.transits.compute(&chart, &snapshot);
            if self.outage.load(Ordering::SeqCst) {
                Arc::new(state.marked_stale())
            } else {
                Arc::new(state)
            }
        });
        let state = writer.publish(UserState {
            birth_data: birth,
            chart: chart.clone(),
            transit,
        });
        self.broadcast_user(user_id, &state, Utc::now());
        drop(writer);

        log::info!(
            "chart ready for {} ({} bodies, {} aspects, {} patterns)",
            user_id,
            chart.positions.len(),
            chart.aspects.len(),
            chart.patterns.len()
        );
        Ok(chart)
    }

    fn user(&self, user_id: &str) -> Result<Arc<UserState>, CoreError> {
        self.users
            .get(user_id)
            .ok_or_else(|| CoreError::not_ready(EntityKey::user(user_id)))
    }

    pub fn users(&self) -> Vec<String> {
        self.users.ids()
    }

    pub fn birth_chart(&self, user_id: &str) -> Result<Arc<BirthChart>, CoreError> {
        Ok(self.user(user_id)?.chart.clone())
    }

    /// Latest transit state. `NotReady` until the user has a chart and a tick has run.
    pub fn transit_state(&self, user_id: &str) -> Result<Arc<TransitState>, CoreError> {
        self.user(user_id)?
            .transit
            .clone()
            .ok_or_else(|| CoreError::not_ready(EntityKey::user(user_id)))
    }

    pub fn snapshot(&self, user_id: &str) -> Result<StateSnapshot, CoreError> {
        let user = self.user(user_id)?;
        Ok(StateSnapshot::build(&user.chart, user.transit.as_deref()))
    }

    /// Projects the user's transits forward. Nothing is stored or published.
    pub async fn sacred_timing(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        cancel: CancelToken,
    ) -> Result<SacredTiming, CoreError> {
        let user = self.user(user_id)?;
        let engine = self.timing.clone();
        let timing = tokio::task::spawn_blocking(move || {
            engine.compute(&user.chart, user.transit.as_deref(), now, &cancel)
        })
        .await??;
        Ok(timing)
    }

    // ====================================================================
    // Groups
    // ====================================================================

    pub async fn register_group(&self, request: GroupRequest) -> Result<(), CoreError> {
        if request.group_id.trim().is_empty() {
            return Err(ValidationError::new("group_id", "must not be empty").into());
        }
        if request.participant_ids.len() < 2 {
            return Err(ValidationError::new(
                "participant_ids",
                format!("need at least 2 participants, got {}", request.participant_ids.len()),
            )
            .into());
        }
        let mut seen = BTreeSet::new();
        if let Some(dup) = request.participant_ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(
                ValidationError::new("participant_ids", format!("{dup} is listed twice")).into(),
            );
        }
        self.install_group(request, true).await
    }

    async fn install_group(&self, request: GroupRequest, persist: bool) -> Result<(), CoreError> {
        if persist {
            self.persistence
                .put(KIND_GROUP, &request.group_id, serde_json::to_value(&request)?)
                .await?;
        }
        let writer = self.groups.lock(&request.group_id).await;
        log::info!(
            "group {} registered with {} participants",
            request.group_id,
            request.participant_ids.len()
        );
        writer.publish(GroupState {
            request,
            analysis: None,
        });
        Ok(())
    }

    pub fn groups(&self) -> Vec<String> {
        self.groups.ids()
    }

    /// Composite, synastry matrix and dynamics for a registered group.
    ///
    /// Every participant needs a completed chart. The result is published unless the group's
    /// membership changed while it was computed.
    pub async fn analyze_group(
        &self,
        group_id: &str,
        now: DateTime<Utc>,
        cancel: CancelToken,
    ) -> Result<Arc<GroupAnalysis>, CoreError> {
        let group = self
            .groups
            .get(group_id)
            .ok_or_else(|| CoreError::not_ready(EntityKey::group(group_id)))?;
        let charts = group
            .request
            .participant_ids
            .iter()
            .map(|id| self.birth_chart(id))
            .collect::<Result<Vec<_>, _>>()?;

        let engine = self.synastry.clone();
        let id = group_id.to_string();
        let analysis =
            tokio::task::spawn_blocking(move || engine.analyze(&id, &charts, now, &cancel))
                .await??;
        let analysis = Arc::new(analysis);

        let writer = self.groups.lock(group_id).await;
        match writer.current() {
            Some(current) if current.request == group.request => {
                writer.publish(GroupState {
                    request: current.request.clone(),
                    analysis: Some(analysis.clone()),
                });
                let key = EntityKey::group(group_id);
                let message = StateMessage::new(&key, serde_json::to_value(analysis.as_ref())?, now);
                self.broadcaster.publish(message);
            }
            _ => log::debug!("group {} changed during analysis; result not published", group_id),
        }
        Ok(analysis)
    }

    /// Latest published analysis.
    pub fn group_analysis(&self, group_id: &str) -> Result<Arc<GroupAnalysis>, CoreError> {
        self.groups
            .get(group_id)
            .and_then(|group| group.analysis.clone())
            .ok_or_else(|| CoreError::not_ready(EntityKey::group(group_id)))
    }

    // ====================================================================
    // Publication
    // ====================================================================

    /// Subscribes to an entity's state. The latest state, if any, arrives immediately.
    pub fn subscribe(&self, key: EntityKey) -> Subscription {
        self.broadcaster.subscribe(key)
    }

    pub fn broadcaster(&self) -> &StateBroadcaster {
        &self.broadcaster
    }

    fn broadcast_user(&self, user_id: &str, state: &UserState, at: DateTime<Utc>) {
        let snapshot = StateSnapshot::build(&state.chart, state.transit.as_deref());
        match serde_json::to_value(&snapshot) {
            Ok(value) => {
                self.broadcaster
                    .publish(StateMessage::new(&EntityKey::user(user_id), value, at));
            }
            Err(e) => log::error!("could not encode state for {}: {}", user_id, e),
        }
    }

    // ====================================================================
    // Ticks
    // ====================================================================

    pub fn last_ephemeris(&self) -> Option<Arc<EphemerisSnapshot>> {
        self.ephemeris
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn fetch_ephemeris(&self, now: DateTime<Utc>) -> Result<EphemerisSnapshot, CoreError> {
        let provider = self.provider.clone();
        let fetch = tokio::task::spawn_blocking(move || provider.positions(now));
        match tokio::time::timeout(self.provider_timeout, fetch).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(join)) => Err(CoreError::EphemerisUnavailable(EphemerisError::Unavailable {
                at: now,
                message: join.to_string(),
            })),
            Err(_) => Err(CoreError::EphemerisUnavailable(EphemerisError::Unavailable {
                at: now,
                message: format!("no answer within {:?}", self.provider_timeout),
            })),
        }
    }

    /// Advances every ready user to the ephemeris at `now`.
    ///
    /// When the provider fails the last good snapshot is kept, every transit state is marked
    /// stale and `EphemerisUnavailable` is returned so the caller can back off.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport, CoreError> {
        let snapshot = match self.fetch_ephemeris(now).await {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                self.outage.store(true, Ordering::SeqCst);
                let mut marked = 0;
                for id in self.users.ids() {
                    if self.mark_stale(&id, now).await {
                        marked += 1;
                    }
                }
                log::warn!("tick at {} failed: {}; {} users marked stale", now, e, marked);
                return Err(e);
            }
        };
        self.outage.store(false, Ordering::SeqCst);
        *self.ephemeris.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());

        let jobs: Vec<_> = self
            .users
            .ids()
            .into_iter()
            .filter_map(|id| {
                let chart = self.users.get(&id)?.chart.clone();
                let transits = self.transits.clone();
                let snapshot = snapshot.clone();
                Some((id, move || {
                    let state = transits.compute(&chart, &snapshot);
                    (chart, state)
                }))
            })
            .collect();

        let mut report = TickReport::new(now);
        for (id, outcome) in self.pool.run_all(jobs).await {
            match outcome {
                JobOutcome::Completed((chart, transit)) => {
                    let writer = self.users.lock(&id).await;
                    let Some(current) = writer.current() else {
                        continue;
                    };
                    if !Arc::ptr_eq(&current.chart, &chart) {
                        report.superseded += 1;
                        let behind = current
                            .transit
                            .as_ref()
                            .map_or(true, |t| t.ephemeris_instant < snapshot.instant);
                        if behind {
                            let transit = Arc::new(self.transits.compute(&current.chart, &snapshot));
                            let state = writer.publish(UserState {
                                transit: Some(transit.clone()),
                                ..UserState::clone(&current)
                            });
                            self.broadcast_user(&id, &state, now);
                            drop(writer);
                            self.persist_transit(&id, &transit).await;
                        }
                        continue;
                    }
                    let state = writer.publish(UserState {
                        transit: Some(Arc::new(transit)),
                        ..UserState::clone(&current)
                    });
                    self.broadcast_user(&id, &state, now);
                    drop(writer);
                    if let Some(transit) = &state.transit {
                        self.persist_transit(&id, transit).await;
                    }
                    report.updated += 1;
                }
                JobOutcome::Failed(reason) => {
                    log::error!("transit update for {} failed: {}", id, reason);
                    self.mark_stale(&id, now).await;
                    report.failed += 1;
                }
                JobOutcome::TimedOut => {
                    log::warn!(
                        "transit update for {} exceeded {:?}; retrying next tick",
                        id,
                        self.pool.timeout()
                    );
                    self.mark_stale(&id, now).await;
                    report.timed_out += 1;
                }
            }
        }

        log::info!(
            "tick {}: {} updated, {} failed, {} timed out",
            now,
            report.updated,
            report.failed,
            report.timed_out
        );
        Ok(report)
    }

    /// Write-through of the latest transit state. Failures are logged, never returned.
    async fn persist_transit(&self, user_id: &str, transit: &TransitState) {
        let result = match serde_json::to_value(transit) {
            Ok(document) => self.persistence.put(KIND_TRANSIT, user_id, document).await,
            Err(e) => {
                log::error!("could not encode transit state for {}: {}", user_id, e);
                return;
            }
        };
        if let Err(e) = result {
            log::warn!("transit state for {} not persisted: {}", user_id, e);
        }
    }

    /// Flags the user's transit state stale. Returns whether anything changed.
    async fn mark_stale(&self, user_id: &str, at: DateTime<Utc>) -> bool {
        let writer = self.users.lock(user_id).await;
        let Some(current) = writer.current() else {
            return false;
        };
        let Some(transit) = current.transit.as_ref().filter(|t| !t.stale) else {
            return false;
        };
        let state = writer.publish(UserState {
            transit: Some(Arc::new(transit.marked_stale())),
            ..UserState::clone(&current)
        });
        self.broadcast_user(user_id, &state, at);
        true
    }

    // ====================================================================
    // Hydration
    // ====================================================================

    /// Restores users and groups from persistence. Unreadable documents are logged and skipped.
    pub async fn hydrate(&self) -> Result<HydrateReport, CoreError> {
        let mut report = HydrateReport::default();

        for id in self.persistence.list(KIND_BIRTH_DATA).await? {
            let Some(birth) = self.load_document::<BirthData>(KIND_BIRTH_DATA, &id).await? else {
                report.skipped += 1;
                continue;
            };
            match self.install_user(&id, birth, false).await {
                Ok(_) => report.users += 1,
                Err(e) => {
                    log::warn!("could not restore user {}: {}", id, e);
                    report.skipped += 1;
                }
            }
        }

        for id in self.persistence.list(KIND_GROUP).await? {
            let Some(request) = self.load_document::<GroupRequest>(KIND_GROUP, &id).await? else {
                report.skipped += 1;
                continue;
            };
            self.install_group(request, false).await?;
            report.groups += 1;
        }

        log::info!(
            "hydrated {} users and {} groups ({} skipped)",
            report.users,
            report.groups,
            report.skipped
        );
        Ok(report)
    }

    async fn load_document<T: DeserializeOwned>(
        &self,
        kind: &str,
        id: &str,
    ) -> Result<Option<T>, CoreError> {
        let Some(document) = self.persistence.get(kind, id).await? else {
            return Ok(None);
        };
        match serde_json::from_value(document) {
            Ok(value) => Ok(Some(value)),
            Err(source) => {
                let err = PersistenceError::Malformed {
                    kind: kind.to_string(),
                    id: id.to_string(),
                    source,
                };
                log::warn!("{}", err);
                Ok(None)
            }
        }
    }
}
