//! Session Clock and Timer Queue
//!
//! Every delayed callback in the engine (typing delays, departures and the
//! repeating tick) is a task in a single priority queue keyed by due time.
//! Tasks that fall due at the same instant run in the order they were
//! scheduled.

use bevy_ecs::prelude::*;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use chat_events::{MessageDraft, ParticipantId, SimTime};

/// Resource: the session clock
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SessionClock {
    pub now: SimTime,
    /// When the session started; density is measured from here
    pub started_at: SimTime,
}

impl SessionClock {
    /// Milliseconds since the session started.
    pub fn elapsed_ms(&self) -> u64 {
        self.now.since(self.started_at)
    }
}

/// Work waiting for its due time.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// One scheduler tick; ignored unless `generation` is the live ticker's
    Tick { generation: u64 },
    /// Post a composed message once its sender has finished typing
    Deliver {
        draft: MessageDraft,
        /// Clear the sender's busy flag afterwards; goodbyes keep it set
        release_speaker: bool,
    },
    /// Remove a leaving bot
    Depart { bot: ParticipantId },
}

/// A task with its due time and scheduling sequence number.
#[derive(Debug, Clone)]
pub struct Scheduled {
    pub due: SimTime,
    pub seq: u64,
    pub task: Task,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordering: (due ASC, seq ASC). Wrapped in `Reverse` so the earliest pops first.
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due.cmp(&other.due).then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Resource: pending timed tasks
#[derive(Resource, Debug, Default)]
pub struct TimerQueue {
    queue: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `task` at `due`.
    pub fn schedule(&mut self, due: SimTime, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled { due, seq, task }));
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<SimTime> {
        self.queue.peek().map(|Reverse(s)| s.due)
    }

    /// Pops the earliest task if it is due at or before `until`.
    pub fn pop_due(&mut self, until: SimTime) -> Option<Scheduled> {
        if self.next_due()? > until {
            return None;
        }
        self.queue.pop().map(|Reverse(s)| s)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pending tasks in the order they will run.
    pub fn pending(&self) -> Vec<&Scheduled> {
        let mut tasks: Vec<&Scheduled> = self.queue.iter().map(|Reverse(s)| s).collect();
        tasks.sort();
        tasks
    }

    /// Pending message deliveries in the order they were scheduled.
    pub fn pending_deliveries(&self) -> Vec<&MessageDraft> {
        let mut deliveries: Vec<&Scheduled> = self
            .queue
            .iter()
            .map(|Reverse(s)| s)
            .filter(|s| matches!(s.task, Task::Deliver { .. }))
            .collect();
        deliveries.sort_by_key(|s| s.seq);
        deliveries
            .into_iter()
            .filter_map(|s| match &s.task {
                Task::Deliver { draft, .. } => Some(draft),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_due_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(SimTime::from_millis(300), Task::Depart { bot: ParticipantId(3) });
        timers.schedule(SimTime::from_millis(100), Task::Depart { bot: ParticipantId(1) });
        timers.schedule(SimTime::from_millis(200), Task::Depart { bot: ParticipantId(2) });

        let order: Vec<SimTime> = std::iter::from_fn(|| timers.pop_due(SimTime::from_secs(1)))
            .map(|s| s.due)
            .collect();
        assert_eq!(
            order,
            vec![
                SimTime::from_millis(100),
                SimTime::from_millis(200),
                SimTime::from_millis(300)
            ]
        );
    }

    #[test]
    fn test_equal_due_times_keep_scheduling_order() {
        let mut timers = TimerQueue::new();
        for id in 0..10 {
            timers.schedule(SimTime::from_secs(5), Task::Depart { bot: ParticipantId(id) });
        }
        for expected in 0..10 {
            let next = timers.pop_due(SimTime::from_secs(5)).unwrap();
            assert_eq!(next.task, Task::Depart { bot: ParticipantId(expected) });
        }
        assert!(timers.is_empty());
    }

    #[test]
    fn test_pop_due_respects_horizon() {
        let mut timers = TimerQueue::new();
        timers.schedule(SimTime::from_secs(2), Task::Tick { generation: 1 });
        assert!(timers.pop_due(SimTime::from_secs(1)).is_none());
        assert_eq!(timers.len(), 1);
        assert!(timers.pop_due(SimTime::from_secs(2)).is_some());
        assert_eq!(timers.next_due(), None);
    }

    #[test]
    fn test_elapsed() {
        let clock = SessionClock {
            now: SimTime::from_secs(12),
            started_at: SimTime::from_secs(2),
        };
        assert_eq!(clock.elapsed_ms(), 10_000);
    }
}
