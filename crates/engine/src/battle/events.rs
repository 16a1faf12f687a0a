use std::collections::VecDeque;

use tracing::debug;

/// Returned by event hooks: keep running, or done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    Stop,
}

/// A step of a battle sequence. `start` runs once; `update` runs each tick
/// after a `Continue` from `start` until it returns `Stop`.
pub trait Event<C> {
    fn name(&self) -> &'static str;
    fn start(&mut self, ctx: &mut C) -> Signal;
    fn update(&mut self, ctx: &mut C, frames: u32) -> Signal;
}

struct QueueEntry<C> {
    event: Box<dyn Event<C>>,
    priority: i32,
}

/// Pending events ordered by ascending priority, with at most one running.
pub struct EventQueue<C> {
    pending: VecDeque<QueueEntry<C>>,
    current: Option<QueueEntry<C>>,
}

impl<C> Default for EventQueue<C> {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            current: None,
        }
    }
}

impl<C> EventQueue<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Pending entries, not counting the running event.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn current_priority(&self) -> Option<i32> {
        self.current.as_ref().map(|entry| entry.priority)
    }

    pub fn current_name(&self) -> Option<&'static str> {
        self.current.as_ref().map(|entry| entry.event.name())
    }

    /// Inserts after every entry of equal or lower priority, scanning from
    /// whichever end is numerically closer.
    pub fn push(&mut self, event: Box<dyn Event<C>>, priority: i32) {
        let index = match (self.pending.front(), self.pending.back()) {
            (Some(front), Some(back)) => {
                let from_front = (i64::from(priority) - i64::from(front.priority)).abs();
                let from_back = (i64::from(back.priority) - i64::from(priority)).abs();
                if from_front <= from_back {
                    self.pending
                        .iter()
                        .position(|entry| entry.priority > priority)
                        .unwrap_or(self.pending.len())
                } else {
                    self.pending
                        .iter()
                        .rposition(|entry| entry.priority <= priority)
                        .map_or(0, |index| index + 1)
                }
            }
            _ => 0,
        };
        self.pending.insert(index, QueueEntry { event, priority });
    }

    /// Removes the lowest-priority pending event.
    pub fn pop(&mut self) -> Option<(Box<dyn Event<C>>, i32)> {
        self.pending
            .pop_front()
            .map(|entry| (entry.event, entry.priority))
    }

    /// Steps the running event, then starts pending events until one keeps
    /// running or none are left.
    pub fn update(&mut self, ctx: &mut C, frames: u32) {
        if let Some(current) = self.current.as_mut() {
            if current.event.update(ctx, frames) == Signal::Continue {
                return;
            }
            debug!(event = current.event.name(), "battle_event_finished");
            self.current = None;
        }

        while let Some(mut entry) = self.pending.pop_front() {
            let signal = entry.event.start(ctx);
            debug!(
                event = entry.event.name(),
                priority = entry.priority,
                instant = signal == Signal::Stop,
                "battle_event_started"
            );
            if signal == Signal::Continue {
                self.current = Some(entry);
                return;
            }
        }
    }
}
