//! Delayed transitions.
//!
//! Tasks are tied to the [`SessionToken`] that was active when they were queued. The
//! owner compares the token on fire and drops tasks from sessions that have since ended.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Deferred {
    /// Leave the judgement screen and show the next question, or finish the session.
    NextQuestion,
    /// Apply grid completion once the last number has been found.
    FinishGrid,
}

#[derive(Clone, Debug)]
struct ScheduledTask {
    seq: u64,
    token: SessionToken,
    due_ms: u64,
    action: Deferred,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DueTask {
    pub token: SessionToken,
    pub action: Deferred,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
    next_seq: u64,
    next_token: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_session_token(&mut self) -> SessionToken {
        self.next_token += 1;
        SessionToken(self.next_token)
    }

    pub fn schedule(&mut self, token: SessionToken, due_ms: u64, action: Deferred) {
        self.next_seq += 1;
        self.tasks.push(ScheduledTask {
            seq: self.next_seq,
            token,
            due_ms,
            action,
        });
    }

    /// Drops every task queued under `token`. Returns how many were dropped.
    pub fn cancel_session(&mut self, token: SessionToken) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.token != token);
        before - self.tasks.len()
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.tasks.iter().map(|task| task.due_ms).min()
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Removes and returns tasks due at `now_ms`, earliest first, ties in queue order.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<DueTask> {
        let (mut due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|task| task.due_ms <= now_ms);
        self.tasks = rest;
        due.sort_by_key(|task| (task.due_ms, task.seq));
        due.into_iter()
            .map(|task| DueTask {
                token: task.token,
                action: task.action,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_due_orders_by_due_time() {
        let mut scheduler = Scheduler::new();
        let token = scheduler.new_session_token();
        scheduler.schedule(token, 200, Deferred::FinishGrid);
        scheduler.schedule(token, 100, Deferred::NextQuestion);
        scheduler.schedule(token, 500, Deferred::NextQuestion);

        assert_eq!(scheduler.next_due_ms(), Some(100));
        let due = scheduler.take_due(250);
        let actions: Vec<_> = due.iter().map(|t| t.action).collect();
        assert_eq!(actions, vec![Deferred::NextQuestion, Deferred::FinishGrid]);
        assert_eq!(scheduler.pending(), 1);
        assert!(scheduler.take_due(499).is_empty());
    }

    #[test]
    fn test_same_due_time_keeps_queue_order() {
        let mut scheduler = Scheduler::new();
        let first = scheduler.new_session_token();
        let second = scheduler.new_session_token();
        scheduler.schedule(second, 50, Deferred::FinishGrid);
        scheduler.schedule(first, 50, Deferred::NextQuestion);

        let tokens: Vec<_> = scheduler.take_due(50).iter().map(|t| t.token).collect();
        assert_eq!(tokens, vec![second, first]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_cancel_session_drops_only_that_session() {
        let mut scheduler = Scheduler::new();
        let old = scheduler.new_session_token();
        let new = scheduler.new_session_token();
        assert_ne!(old, new);
        scheduler.schedule(old, 10, Deferred::NextQuestion);
        scheduler.schedule(old, 20, Deferred::NextQuestion);
        scheduler.schedule(new, 30, Deferred::FinishGrid);

        assert_eq!(scheduler.cancel_session(old), 2);
        assert_eq!(scheduler.next_due_ms(), Some(30));
    }
}
