// Copyright (c) 2026 rezky_nightky

use std::time::Instant;

use glam::Vec2;

use crate::schedule::{Cadence, Scheduler, TaskHandle};
use crate::surface::Surface;

/// Pixel size of the area an effect covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Ambient inputs the host hands to effects.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Environment {
    pub viewport: Viewport,
}

/// A self-contained animation owning its drawing surface.
pub trait Effect {
    type Surface: Surface;

    fn name(&self) -> &'static str;

    fn cadence(&self) -> Cadence;

    /// Builds fresh state for `env`. Returns false, leaving the effect
    /// unmounted, when there is no surface to draw on yet.
    fn mount(&mut self, env: &Environment) -> bool;

    fn resize(&mut self, viewport: Viewport);

    fn wants_pointer(&self) -> bool {
        false
    }

    fn pointer_moved(&mut self, _at: Vec2) {}

    fn tick(&mut self);

    fn unmount(&mut self);

    fn is_mounted(&self) -> bool;

    fn surface(&self) -> &Self::Surface;
}

pub type BoxedEffect<S> = Box<dyn Effect<Surface = S>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

struct Slot<S> {
    id: SlotId,
    effect: BoxedEffect<S>,
    /// `None` while parked waiting for a usable viewport.
    task: Option<TaskHandle>,
}

/// Mounts effects, owns their schedule and routes host events to them.
pub struct Stage<S> {
    env: Environment,
    scheduler: Scheduler,
    slots: Vec<Slot<S>>,
    next_id: u64,
    ticks: u64,
}

impl<S: Surface + 'static> Stage<S> {
    pub fn new(scheduler: Scheduler, viewport: Viewport) -> Self {
        Self {
            env: Environment { viewport },
            scheduler,
            slots: Vec::new(),
            next_id: 1,
            ticks: 0,
        }
    }

    pub fn total_ticks(&self) -> u64 {
        self.ticks
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    fn try_start(
        scheduler: &mut Scheduler,
        env: &Environment,
        slot: &mut Slot<S>,
        now: Instant,
    ) -> bool {
        if !slot.effect.mount(env) {
            log::warn!(
                "{} has no surface yet ({}x{}); mount deferred",
                slot.effect.name(),
                env.viewport.width,
                env.viewport.height
            );
            return false;
        }
        slot.task = Some(scheduler.schedule(slot.effect.cadence(), now));
        log::debug!("mounted {}", slot.effect.name());
        true
    }

    /// Mounts `effect` and starts its ticks. An effect that cannot mount
    /// yet stays parked and is mounted on the next usable resize.
    pub fn mount(&mut self, effect: BoxedEffect<S>, now: Instant) -> SlotId {
        let id = SlotId(self.next_id);
        self.next_id += 1;
        let mut slot = Slot {
            id,
            effect,
            task: None,
        };
        Self::try_start(&mut self.scheduler, &self.env, &mut slot, now);
        self.slots.push(slot);
        id
    }

    #[cfg(test)]
    pub fn is_running(&self, id: SlotId) -> bool {
        self.slots
            .iter()
            .any(|s| s.id == id && s.task.is_some() && s.effect.is_mounted())
    }

    /// Stops the effect's ticks and listeners and hands it back.
    pub fn unmount(&mut self, id: SlotId) -> Option<BoxedEffect<S>> {
        let pos = self.slots.iter().position(|s| s.id == id)?;
        let mut slot = self.slots.remove(pos);
        if let Some(task) = slot.task.take() {
            self.scheduler.cancel(task);
        }
        if slot.effect.is_mounted() {
            slot.effect.unmount();
        }
        log::debug!("unmounted {}", slot.effect.name());
        Some(slot.effect)
    }

    /// Unmounts everything, topmost layer first.
    pub fn unmount_all(&mut self) {
        log::debug!("unmounting {} effect(s)", self.len());
        while let Some(id) = self.slots.last().map(|s| s.id) {
            self.unmount(id);
        }
        debug_assert_eq!(self.scheduler.len(), 0);
    }

    /// Tears every effect down and mounts it again from scratch.
    pub fn remount_all(&mut self, now: Instant) {
        for slot in &mut self.slots {
            if let Some(task) = slot.task.take() {
                self.scheduler.cancel(task);
            }
            if slot.effect.is_mounted() {
                slot.effect.unmount();
            }
            Self::try_start(&mut self.scheduler, &self.env, slot, now);
        }
        log::debug!("remounted {} effect(s)", self.slots.len());
    }

    /// Forwards a new viewport. An empty viewport suspends running effects
    /// with their state intact; the next usable one resumes them.
    pub fn resize(&mut self, viewport: Viewport, now: Instant) {
        self.env.viewport = viewport;
        log::debug!("viewport {}x{}", viewport.width, viewport.height);
        for slot in &mut self.slots {
            if viewport.is_empty() {
                if let Some(task) = slot.task.take() {
                    self.scheduler.cancel(task);
                    log::debug!("{} suspended", slot.effect.name());
                }
            } else if slot.task.is_some() {
                slot.effect.resize(viewport);
            } else if slot.effect.is_mounted() {
                slot.effect.resize(viewport);
                slot.task = Some(self.scheduler.schedule(slot.effect.cadence(), now));
                log::debug!("{} resumed", slot.effect.name());
            } else {
                Self::try_start(&mut self.scheduler, &self.env, slot, now);
            }
        }
    }

    pub fn pointer_moved(&mut self, at: Vec2) {
        for slot in &mut self.slots {
            if slot.task.is_some() && slot.effect.wants_pointer() {
                slot.effect.pointer_moved(at);
            }
        }
    }

    /// Runs every tick that is due. Returns how many ran.
    pub fn run_due(&mut self, now: Instant) -> usize {
        let due = self.scheduler.due(now);
        let mut ran = 0;
        for task_id in due {
            let Some(slot) = self
                .slots
                .iter_mut()
                .find(|s| s.task.as_ref().map(TaskHandle::id) == Some(task_id))
            else {
                continue;
            };
            slot.effect.tick();
            ran += 1;
        }
        self.ticks += ran as u64;
        ran
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Mounted surfaces in mount order (bottom layer first).
    pub fn layers(&self) -> impl Iterator<Item = (&'static str, &S)> + '_ {
        self.slots
            .iter()
            .filter(|s| s.task.is_some())
            .map(|s| (s.effect.name(), s.effect.surface()))
    }
}
