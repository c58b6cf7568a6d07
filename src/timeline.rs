use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

/// Simulated clock with a queue of deferred tasks.
///
/// The game loop advances the clock once per frame and drains every task
/// whose fire time has passed. Tasks scheduled for the same instant fire in
/// the order they were scheduled.
#[derive(Debug)]
pub struct Timeline<T> {
    now: Duration,
    next_seq: u64,
    queue: BinaryHeap<Scheduled<T>>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }
}

impl<T> Timeline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time since the timeline was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn advance(&mut self, delta: Duration) {
        self.now += delta;
    }

    /// Schedules `task` to fire `delay` after the current time.
    pub fn after(&mut self, delay: Duration, task: T) {
        let fire_at = self.now + delay;
        self.at(fire_at, task);
    }

    pub fn at(&mut self, fire_at: Duration, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Scheduled { fire_at, seq, task });
    }

    /// Pops the earliest task that is due, if any.
    pub fn pop_due(&mut self) -> Option<T> {
        if self.queue.peek()?.fire_at > self.now {
            return None;
        }
        self.queue.pop().map(|entry| entry.task)
    }

    /// Fire time of the earliest pending task.
    pub fn next_fire_time(&self) -> Option<Duration> {
        self.queue.peek().map(|entry| entry.fire_at)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[derive(Debug)]
struct Scheduled<T> {
    fire_at: Duration,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the earliest (time, seq) pops first.
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_wait_until_due() {
        let mut timeline = Timeline::new();
        timeline.after(Duration::from_millis(100), "a");
        assert_eq!(timeline.pop_due(), None);
        timeline.advance(Duration::from_millis(99));
        assert_eq!(timeline.pop_due(), None);
        timeline.advance(Duration::from_millis(1));
        assert_eq!(timeline.pop_due(), Some("a"));
        assert_eq!(timeline.pending(), 0);
    }

    #[test]
    fn earlier_tasks_fire_first_and_ties_keep_order() {
        let mut timeline = Timeline::new();
        timeline.after(Duration::from_millis(50), 3);
        timeline.after(Duration::from_millis(10), 1);
        timeline.after(Duration::from_millis(10), 2);
        timeline.advance(Duration::from_secs(1));
        let fired: Vec<_> = std::iter::from_fn(|| timeline.pop_due()).collect();
        assert_eq!(fired, vec![1, 2, 3]);
    }

    #[test]
    fn next_fire_time_reports_head() {
        let mut timeline = Timeline::new();
        assert_eq!(timeline.next_fire_time(), None);
        timeline.advance(Duration::from_millis(5));
        timeline.after(Duration::from_millis(20), ());
        assert_eq!(timeline.next_fire_time(), Some(Duration::from_millis(25)));
    }
}
