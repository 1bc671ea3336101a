// Copyright (c) 2026 rezky_nightky

use std::time::{Duration, Instant};

/// How often a task wants to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cadence {
    /// Once per presented frame.
    Frame,
    /// Fixed interval, independent of the frame rate.
    Every(Duration),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Proof of a live registration. Cancelling consumes it, so a task
/// cannot be cancelled twice or outlive its owner by accident.
#[derive(Debug, PartialEq, Eq)]
pub struct TaskHandle {
    id: TaskId,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }
}

#[derive(Clone, Debug)]
struct Task {
    id: TaskId,
    period: Duration,
    next_due: Instant,
}

/// Single-threaded timer wheel for repeating work.
///
/// Nothing runs on its own: the owner asks for `due` tasks and runs them,
/// so at most one tick is ever in flight.
#[derive(Debug)]
pub struct Scheduler {
    frame_period: Duration,
    next_id: u64,
    tasks: Vec<Task>,
}

impl Scheduler {
    pub fn new(frame_period: Duration) -> Self {
        Self {
            frame_period: frame_period.max(Duration::from_millis(1)),
            next_id: 1,
            tasks: Vec::new(),
        }
    }

    fn period_of(&self, cadence: Cadence) -> Duration {
        match cadence {
            Cadence::Frame => self.frame_period,
            Cadence::Every(d) => d.max(Duration::from_millis(1)),
        }
    }

    /// Registers repeating work. The first run is due immediately.
    pub fn schedule(&mut self, cadence: Cadence, now: Instant) -> TaskHandle {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            period: self.period_of(cadence),
            next_due: now,
        });
        TaskHandle { id }
    }

    /// Returns false if the task was already gone.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != handle.id);
        self.tasks.len() != before
    }

    #[cfg(test)]
    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Collects every task due at `now` and books its next run.
    ///
    /// A task that fell behind by several periods runs once and is
    /// rescheduled from `now`; missed ticks are dropped, not replayed.
    pub fn due(&mut self, now: Instant) -> Vec<TaskId> {
        let mut out = Vec::new();
        for t in &mut self.tasks {
            if now < t.next_due {
                continue;
            }
            out.push(t.id);
            t.next_due += t.period;
            if t.next_due <= now {
                t.next_due = now + t.period;
            }
        }
        out
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.iter().map(|t| t.next_due).min()
    }
}
