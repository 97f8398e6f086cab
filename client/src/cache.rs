//! Last-known state of every remote participant
//!
//! Written by the receive loop, read once per frame by the update loop.
//! Both sides go through one exclusive lock; entries are replaced whole
//! under it, so a reader never sees a half-updated pose.

use shared::{ParticipantId, ParticipantState, RelayMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedCache = Arc<Mutex<RemoteStateCache>>;

#[derive(Debug, Default)]
pub struct RemoteStateCache {
    participants: HashMap<ParticipantId, ParticipantState>,
}

impl RemoteStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedCache {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Inserts or overwrites the state for `identity`
    ///
    /// Returns true if the participant was not known before.
    pub fn apply(&mut self, identity: ParticipantId, state: ParticipantState) -> bool {
        self.participants.insert(identity, state).is_none()
    }

    pub fn remove(&mut self, identity: &ParticipantId) -> Option<ParticipantState> {
        self.participants.remove(identity)
    }

    /// Applies one relay message
    pub fn handle(&mut self, message: RelayMessage) {
        match message {
            RelayMessage::State { identity, state } => {
                self.apply(identity, state);
            }
            RelayMessage::Leave { identity } => {
                self.remove(&identity);
            }
        }
    }

    /// Copies every entry for one frame, ordered by identity
    pub fn snapshot_all(&self) -> Vec<(ParticipantId, ParticipantState)> {
        let mut snapshot: Vec<_> = self
            .participants
            .iter()
            .map(|(identity, state)| (identity.clone(), *state))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }

    pub fn get(&self, identity: &ParticipantId) -> Option<&ParticipantState> {
        self.participants.get(identity)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Facing;

    fn id(n: u64) -> ParticipantId {
        ParticipantId::numbered(n)
    }

    #[test]
    fn test_apply_creates_then_overwrites() {
        let mut cache = RemoteStateCache::new();

        let created = cache.apply(id(1), ParticipantState::new(1.0, 2.0, Facing::Up, true));
        let updated = cache.apply(id(1), ParticipantState::new(3.0, 4.0, Facing::Left, false));

        assert!(created);
        assert!(!updated);
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get(&id(1)),
            Some(&ParticipantState::new(3.0, 4.0, Facing::Left, false))
        );
    }

    #[test]
    fn test_entry_exists_only_after_update() {
        let mut cache = RemoteStateCache::new();
        assert!(cache.is_empty());
        assert!(cache.get(&id(1)).is_none());

        cache.apply(id(1), ParticipantState::default());
        assert!(cache.get(&id(1)).is_some());
        assert!(cache.get(&id(2)).is_none());
    }

    #[test]
    fn test_leave_removes_entry() {
        let mut cache = RemoteStateCache::new();
        cache.handle(RelayMessage::State {
            identity: id(1),
            state: ParticipantState::default(),
        });
        cache.handle(RelayMessage::State {
            identity: id(2),
            state: ParticipantState::default(),
        });

        cache.handle(RelayMessage::Leave { identity: id(1) });
        // Leaving twice or leaving unknown identities is harmless
        cache.handle(RelayMessage::Leave { identity: id(1) });
        cache.handle(RelayMessage::Leave { identity: id(9) });

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&id(2)).is_some());
    }

    #[test]
    fn test_snapshot_is_detached_copy() {
        let mut cache = RemoteStateCache::new();
        cache.apply(id(2), ParticipantState::new(2.0, 2.0, Facing::Down, false));
        cache.apply(id(1), ParticipantState::new(1.0, 1.0, Facing::Up, false));

        let snapshot = cache.snapshot_all();
        cache.apply(id(1), ParticipantState::new(9.0, 9.0, Facing::Right, true));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].0, id(1));
        assert_eq!(snapshot[0].1.position.x, 1.0);
        assert_eq!(snapshot[1].0, id(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_reads_never_see_torn_entries() {
        let cache = RemoteStateCache::shared();

        let writer = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                for i in 0..2_000u32 {
                    let v = f64::from(i);
                    let facing = Facing::from_code((i % 4) as u8).unwrap();
                    let state = ParticipantState::new(v, v, facing, i % 2 == 0);
                    cache.lock().await.apply(id(u64::from(i % 3)), state);
                    if i % 64 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        };

        let reader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                for _ in 0..2_000 {
                    let snapshot = cache.lock().await.snapshot_all();
                    for (_, state) in snapshot {
                        let i = state.position.x as u32;
                        assert_eq!(state.position.x, state.position.y);
                        assert_eq!(state.facing.code(), (i % 4) as u8);
                        assert_eq!(state.is_moving, i % 2 == 0);
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
        assert_eq!(cache.lock().await.len(), 3);
    }
}
