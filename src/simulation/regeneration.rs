//! Periodic per-object regeneration and status pushes
//!
//! Each object owns two optional ticker tasks on the tokio runtime. The tasks
//! hold only a `Weak` reference, take only the object's own state lock, and
//! end by themselves once the object is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::core::config::{RegenConfig, REGEN_TICK};
use crate::core::error::RegenError;
use crate::entity::WorldObject;
use crate::transport::{OutboundMessage, Transport};

/// Ticker task handles owned by an object
#[derive(Debug, Default)]
pub struct RegenTimers {
    regen: Option<JoinHandle<()>>,
    status: Option<JoinHandle<()>>,
}

impl RegenTimers {
    pub fn regen_running(&self) -> bool {
        self.regen.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn status_running(&self) -> bool {
        self.status.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Returns false when nothing was running
    pub fn stop_regen(&mut self) -> bool {
        match self.regen.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    /// Returns false when nothing was running
    pub fn stop_status(&mut self) -> bool {
        match self.status.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&mut self) {
        self.stop_regen();
        self.stop_status();
    }
}

impl Drop for RegenTimers {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[derive(Debug, Clone, Copy)]
enum TickKind {
    Regen,
    Status,
}

/// Apply one regeneration tick to `object`
pub fn regeneration_tick(object: &WorldObject) -> Result<(), RegenError> {
    if !object.is_spawned() {
        return Err(RegenError::Decayed(object.id()));
    }
    object.behavior().regenerate(object)
}

/// Push `object`'s current pools to whoever follows its status
pub fn status_tick(object: &WorldObject, transport: &dyn Transport) -> Result<(), RegenError> {
    if !object.is_spawned() {
        return Err(RegenError::Decayed(object.id()));
    }
    let Some(recipient) = object.behavior().status_recipient(object) else {
        return Ok(());
    };

    let (hp, mp, cp) = object.with_state(|state| state.vitals.displayed());
    transport.send(
        recipient,
        OutboundMessage::StatusUpdate {
            object: object.id(),
            hp,
            mp,
            cp,
        },
    );
    Ok(())
}

pub struct RegenerationScheduler {
    runtime: Handle,
    transport: Arc<dyn Transport>,
    status_interval: Duration,
}

impl RegenerationScheduler {
    pub fn new(runtime: Handle, transport: Arc<dyn Transport>, config: &RegenConfig) -> Self {
        Self {
            runtime,
            transport,
            status_interval: config.status_interval(),
        }
    }

    pub fn status_interval(&self) -> Duration {
        self.status_interval
    }

    /// Start both tickers; already running ones are left alone
    pub fn start(&self, object: &Arc<WorldObject>) {
        self.start_regeneration(object);
        self.start_status_updates(object);
    }

    /// Returns false if the ticker was already running
    pub fn start_regeneration(&self, object: &Arc<WorldObject>) -> bool {
        let mut timers = object.timers();
        if timers.regen_running() {
            return false;
        }
        timers.regen = Some(self.spawn_ticker(object, REGEN_TICK, TickKind::Regen));
        true
    }

    /// Returns false if the ticker was already running
    pub fn start_status_updates(&self, object: &Arc<WorldObject>) -> bool {
        let mut timers = object.timers();
        if timers.status_running() {
            return false;
        }
        timers.status = Some(self.spawn_ticker(object, self.status_interval, TickKind::Status));
        true
    }

    pub fn stop(&self, object: &WorldObject) {
        object.timers().stop_all();
    }

    pub fn stop_regeneration(&self, object: &WorldObject) -> bool {
        object.timers().stop_regen()
    }

    pub fn stop_status_updates(&self, object: &WorldObject) -> bool {
        object.timers().stop_status()
    }

    fn spawn_ticker(&self, object: &Arc<WorldObject>, period: Duration, kind: TickKind) -> JoinHandle<()> {
        let target = Arc::downgrade(object);
        let transport = Arc::clone(&self.transport);

        self.runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(object) = target.upgrade() else {
                    break;
                };

                let result = match kind {
                    TickKind::Regen => regeneration_tick(&object),
                    TickKind::Status => status_tick(&object, transport.as_ref()),
                };

                if let Err(error) = result {
                    tracing::warn!(object = %object.id(), ?kind, %error, "tick skipped");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ObjectId, ObjectKind, Position};
    use crate::entity::{NpcBehavior, PlayerBehavior, Vitals};
    use crate::transport::RecordingTransport;

    fn wounded_player(id: u32) -> Arc<WorldObject> {
        let mut vitals = Vitals::full(100.0, 50.0, 0.0);
        vitals.cur_hp = 50.0;
        let object = WorldObject::new(ObjectId(id), ObjectKind::Player, Position::default(), PlayerBehavior::new("p"))
            .with_vitals(vitals);
        object.store_spawned(true);
        Arc::new(object)
    }

    fn scheduler(transport: &Arc<RecordingTransport>) -> RegenerationScheduler {
        RegenerationScheduler::new(Handle::current(), transport.clone(), &RegenConfig::default())
    }

    fn status_count(transport: &RecordingTransport, id: ObjectId) -> usize {
        transport.count_for(id, |m| matches!(m, OutboundMessage::StatusUpdate { .. }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_regenerates_once_per_second() {
        let transport = Arc::new(RecordingTransport::new());
        let scheduler = scheduler(&transport);
        let hero = wounded_player(1);

        assert!(scheduler.start_regeneration(&hero));
        time::sleep(Duration::from_millis(3500)).await;

        assert!((hero.vitals().cur_hp - 53.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_and_stops_are_idempotent() {
        let transport = Arc::new(RecordingTransport::new());
        let scheduler = scheduler(&transport);
        let hero = wounded_player(1);

        assert!(scheduler.start_regeneration(&hero));
        assert!(!scheduler.start_regeneration(&hero));
        assert!(scheduler.start_status_updates(&hero));
        assert!(!scheduler.start_status_updates(&hero));

        assert!(scheduler.stop_regeneration(&hero));
        assert!(!scheduler.stop_regeneration(&hero));
        assert!(scheduler.stop_status_updates(&hero));
        assert!(!scheduler.stop_status_updates(&hero));

        time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(hero.vitals().cur_hp, 50.0);
        assert_eq!(status_count(&transport, ObjectId(1)), 0);

        assert!(scheduler.start_regeneration(&hero));
        assert!(hero.is_regenerating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_follows_configured_interval() {
        let transport = Arc::new(RecordingTransport::new());
        let scheduler = scheduler(&transport);
        let hero = wounded_player(1);

        scheduler.start_status_updates(&hero);
        time::sleep(Duration::from_millis(2900)).await;
        assert_eq!(status_count(&transport, ObjectId(1)), 0);

        time::sleep(Duration::from_millis(3200)).await;
        assert_eq!(status_count(&transport, ObjectId(1)), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_tick_does_not_stop_schedule() {
        let transport = Arc::new(RecordingTransport::new());
        let scheduler = scheduler(&transport);
        let hero = wounded_player(1);
        hero.set_dead(true);

        scheduler.start_regeneration(&hero);
        time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(hero.vitals().cur_hp, 50.0);
        assert!(hero.is_regenerating());

        hero.set_dead(false);
        time::sleep(Duration::from_millis(1000)).await;
        assert!((hero.vitals().cur_hp - 51.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_npc_status_goes_nowhere() {
        let transport = Arc::new(RecordingTransport::new());
        let scheduler = scheduler(&transport);
        let npc = WorldObject::new(ObjectId(5), ObjectKind::Npc, Position::default(), NpcBehavior::new(1));
        npc.store_spawned(true);
        let npc = Arc::new(npc);

        scheduler.start(&npc);
        time::sleep(Duration::from_millis(6500)).await;
        assert!(transport.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_ends_when_object_dropped() {
        let transport = Arc::new(RecordingTransport::new());
        let scheduler = scheduler(&transport);
        let hero = wounded_player(1);

        scheduler.start_regeneration(&hero);
        let task = hero.timers().regen.take().unwrap();
        drop(hero);

        time::sleep(Duration::from_millis(1500)).await;
        assert!(task.is_finished());
    }

    #[test]
    fn test_decayed_object_ticks_fail() {
        let transport = RecordingTransport::new();
        let npc = WorldObject::new(ObjectId(5), ObjectKind::Npc, Position::default(), NpcBehavior::new(1));

        assert_eq!(regeneration_tick(&npc), Err(RegenError::Decayed(ObjectId(5))));
        assert_eq!(
            status_tick(&npc, &transport),
            Err(RegenError::Decayed(ObjectId(5)))
        );
    }
}
