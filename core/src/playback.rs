use serde::{Deserialize, Serialize};

/// Eagerly computed, immutable sequence of algorithm snapshots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepLog<S> {
    steps: Vec<S>,
}

impl<S> StepLog<S> {
    pub fn new(steps: Vec<S>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn get(&self, index: usize) -> Option<&S> {
        self.steps.get(index)
    }

    /// Step at `index`, clamped into the valid range. `None` only for an empty log.
    pub fn at(&self, index: usize) -> Option<&S> {
        self.steps.get(index.min(self.last_index()))
    }

    pub fn first(&self) -> Option<&S> {
        self.steps.first()
    }

    pub fn last(&self) -> Option<&S> {
        self.steps.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.steps.iter()
    }

    pub fn as_slice(&self) -> &[S] {
        &self.steps
    }
}

impl<S> From<Vec<S>> for StepLog<S> {
    fn from(steps: Vec<S>) -> Self {
        Self::new(steps)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Idle,
    Running,
    Finished,
}

/// Cursor replaying a [`StepLog`] one timer tick at a time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playback {
    index: usize,
    len: usize,
    state: PlaybackState,
}

impl Playback {
    pub fn new(len: usize) -> Self {
        Self {
            index: 0,
            len,
            state: PlaybackState::Idle,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, PlaybackState::Running)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, PlaybackState::Finished)
    }

    fn last_index(&self) -> usize {
        self.len.saturating_sub(1)
    }

    /// Starts or resumes playback. A finished or empty playback stays as it is.
    pub fn play(&mut self) {
        if self.len == 0 || self.is_finished() {
            return;
        }
        self.state = if self.index >= self.last_index() {
            PlaybackState::Finished
        } else {
            PlaybackState::Running
        };
    }

    pub fn pause(&mut self) {
        if self.is_running() {
            self.state = PlaybackState::Idle;
        }
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.state = PlaybackState::Idle;
    }

    /// Moves the cursor, clamping out-of-range indices to the last step.
    pub fn seek(&mut self, index: usize) {
        self.index = index.min(self.last_index());
        if self.index < self.last_index() && self.is_finished() {
            self.state = PlaybackState::Idle;
        }
    }

    /// Advances by `increment` steps. Returns whether the cursor moved.
    pub fn advance(&mut self, increment: usize) -> bool {
        if !self.is_running() {
            return false;
        }
        let prev = self.index;
        self.index = self.index.saturating_add(increment.max(1)).min(self.last_index());
        if self.index >= self.last_index() {
            self.state = PlaybackState::Finished;
        }
        self.index != prev
    }
}

/// How many steps one timer tick covers and how long to wait before it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TickPlan {
    pub increment: usize,
    pub delay_ms: u32,
}

/// Speed-dependent batching: fast delays skip several steps per tick so long
/// logs still finish in a reasonable time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpeedProfile {
    pub instant_divisor: usize,
    /// `(max_delay_ms, divisor)` pairs, checked in order.
    pub tiers: &'static [(u32, usize)],
}

impl SpeedProfile {
    pub const SORTING: Self = Self {
        instant_divisor: 50,
        tiers: &[(3, 200), (10, 500)],
    };

    pub const PATHFINDING: Self = Self {
        instant_divisor: 60,
        tiers: &[(8, 250)],
    };

    pub fn plan(&self, delay_ms: u32, len: usize) -> TickPlan {
        if delay_ms == 0 {
            return TickPlan {
                increment: (len / self.instant_divisor).max(1),
                delay_ms: 1,
            };
        }

        let increment = self
            .tiers
            .iter()
            .find(|&&(max_delay, _)| delay_ms <= max_delay)
            .map_or(1, |&(_, divisor)| (len / divisor).max(1));

        TickPlan {
            increment,
            delay_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seek_clamps_to_last_step() {
        let log = StepLog::new(vec![1, 2, 3]);
        assert_eq!(log.at(10), Some(&3));
        assert_eq!(log.at(1), Some(&2));

        let mut playback = Playback::new(log.len());
        playback.seek(99);
        assert_eq!(playback.index(), 2);
    }

    #[test]
    fn empty_log_has_no_step() {
        let log: StepLog<u8> = StepLog::new(Vec::new());
        assert_eq!(log.at(0), None);

        let mut playback = Playback::new(0);
        playback.play();
        assert_eq!(playback.state(), PlaybackState::Idle);
    }

    #[test]
    fn advance_finishes_at_last_step() {
        let mut playback = Playback::new(5);
        assert!(!playback.advance(1));

        playback.play();
        assert!(playback.advance(3));
        assert_eq!(playback.index(), 3);
        assert!(playback.is_running());

        assert!(playback.advance(3));
        assert_eq!(playback.index(), 4);
        assert!(playback.is_finished());
        assert!(!playback.advance(1));
    }

    #[test]
    fn pause_then_resume_keeps_position() {
        let mut playback = Playback::new(10);
        playback.play();
        playback.advance(2);
        playback.pause();
        assert!(!playback.advance(1));
        playback.play();
        assert!(playback.advance(1));
        assert_eq!(playback.index(), 3);
    }

    #[test]
    fn speed_profiles_batch_fast_playback() {
        let sorting = SpeedProfile::SORTING;
        assert_eq!(
            sorting.plan(0, 1000),
            TickPlan {
                increment: 20,
                delay_ms: 1
            }
        );
        assert_eq!(sorting.plan(2, 1000).increment, 5);
        assert_eq!(sorting.plan(10, 1000).increment, 2);
        assert_eq!(sorting.plan(25, 1000).increment, 1);
        assert_eq!(sorting.plan(2, 10).increment, 1);

        let pathfinding = SpeedProfile::PATHFINDING;
        assert_eq!(pathfinding.plan(0, 600).increment, 10);
        assert_eq!(pathfinding.plan(8, 1000).increment, 4);
        assert_eq!(pathfinding.plan(35, 1000).increment, 1);
    }
}
