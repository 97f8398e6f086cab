//! Frame consumers: whatever draws the synchronized state

use log::{debug, info};
use shared::{ParticipantId, ParticipantState};
use std::collections::BTreeSet;

/// Receives the local state and a snapshot of every remote participant once
/// per frame
///
/// Called after the cache lock has been released, so implementations may
/// take as long as drawing needs.
pub trait FrameConsumer {
    fn frame(&mut self, local: &ParticipantState, remote: &[(ParticipantId, ParticipantState)]);
}

/// Headless consumer that logs who is visible
pub struct LogRenderer {
    frames: u64,
    report_every: u64,
    visible: BTreeSet<ParticipantId>,
}

impl LogRenderer {
    /// Logs a frame summary every `report_every` frames (0 disables summaries)
    pub fn new(report_every: u64) -> Self {
        Self {
            frames: 0,
            report_every,
            visible: BTreeSet::new(),
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn visible(&self) -> &BTreeSet<ParticipantId> {
        &self.visible
    }
}

impl FrameConsumer for LogRenderer {
    fn frame(&mut self, local: &ParticipantState, remote: &[(ParticipantId, ParticipantState)]) {
        self.frames += 1;

        let current: BTreeSet<ParticipantId> =
            remote.iter().map(|(identity, _)| identity.clone()).collect();
        for joined in current.difference(&self.visible) {
            info!("{} is now visible", joined);
        }
        for left in self.visible.difference(&current) {
            info!("{} is no longer visible", left);
        }
        self.visible = current;

        if self.report_every > 0 && self.frames % self.report_every == 0 {
            debug!(
                "Frame {}: local at ({:.2}, {:.2}) facing {:?}, {} remote",
                self.frames,
                local.position.x,
                local.position.y,
                local.facing,
                remote.len()
            );
            for (identity, state) in remote {
                debug!(
                    "  {} at ({:.2}, {:.2}) facing {:?}{}",
                    identity,
                    state.position.x,
                    state.position.y,
                    state.facing,
                    if state.is_moving { ", moving" } else { "" }
                );
            }
        }
    }
}
