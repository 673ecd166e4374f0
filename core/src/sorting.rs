//! Instrumented sorting algorithms.
//!
//! Each algorithm runs once over a copy of the input and records a
//! [`SortStep`] for every comparison and write, so the web view can replay the
//! run at any speed and seek freely.

use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

pub const MIN_BARS: usize = 10;
pub const MAX_BARS: usize = 120;
pub const MAX_BARS_EXTENDED: usize = 500;
pub const DEFAULT_BARS: usize = 40;
pub const MIN_VALUE: u32 = 2;
pub const MAX_VALUE: u32 = 200;
pub const DEFAULT_DELAY_MS: u32 = 25;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    Bubble,
    Insertion,
    Selection,
    Quick,
    Merge,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Self::Bubble,
        Self::Insertion,
        Self::Selection,
        Self::Quick,
        Self::Merge,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Bubble => "Bubble Sort",
            Self::Insertion => "Insertion Sort",
            Self::Selection => "Selection Sort",
            Self::Quick => "Quick Sort",
            Self::Merge => "Merge Sort",
        }
    }
}

pub type Indices = SmallVec<[usize; 2]>;

/// Snapshot of the array after one recorded operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortStep {
    pub values: Vec<u32>,
    pub active: Indices,
    pub comparing: Indices,
    /// Prefix `[0, sorted_upto)` is in final order.
    pub sorted_upto: usize,
    /// Suffix of this length is in final order.
    pub sorted_from_end: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarRole {
    Sorted,
    Active,
    Comparing,
    Idle,
}

impl SortStep {
    fn new(values: &[u32]) -> Self {
        Self {
            values: values.to_vec(),
            ..Self::default()
        }
    }

    fn active<const N: usize>(mut self, indices: [usize; N]) -> Self {
        self.active.extend(indices);
        self
    }

    fn comparing<const N: usize>(mut self, indices: [usize; N]) -> Self {
        self.comparing.extend(indices);
        self
    }

    fn upto(mut self, sorted_upto: usize) -> Self {
        self.sorted_upto = sorted_upto;
        self
    }

    fn from_end(mut self, sorted_from_end: usize) -> Self {
        self.sorted_from_end = sorted_from_end;
        self
    }

    pub fn is_sorted(&self, index: usize) -> bool {
        index < self.sorted_upto || index + self.sorted_from_end >= self.values.len()
    }

    /// Sorted wins over active, active over comparing.
    pub fn role(&self, index: usize) -> BarRole {
        if self.is_sorted(index) {
            BarRole::Sorted
        } else if self.active.contains(&index) {
            BarRole::Active
        } else if self.comparing.contains(&index) {
            BarRole::Comparing
        } else {
            BarRole::Idle
        }
    }

    pub fn max_value(&self) -> u32 {
        self.values.iter().copied().max().unwrap_or(1).max(1)
    }
}

pub fn random_values<R: Rng>(count: usize, rng: &mut R) -> Vec<u32> {
    (0..count)
        .map(|_| rng.random_range(MIN_VALUE..=MAX_VALUE))
        .collect()
}

/// Truncates or extends with fresh random values, keeping the common prefix.
pub fn resize_values<R: Rng>(values: &mut Vec<u32>, count: usize, rng: &mut R) {
    if count <= values.len() {
        values.truncate(count);
    } else {
        let missing = count - values.len();
        values.extend(random_values(missing, rng));
    }
}

pub fn build_steps(algorithm: Algorithm, input: &[u32]) -> StepLog<SortStep> {
    let steps = match algorithm {
        Algorithm::Bubble => bubble_steps(input),
        Algorithm::Insertion => insertion_steps(input),
        Algorithm::Selection => selection_steps(input),
        Algorithm::Quick => quick_steps(input),
        Algorithm::Merge => merge_steps(input),
    };
    log::debug!(
        "{} over {} values took {} steps",
        algorithm.label(),
        input.len(),
        steps.len()
    );
    StepLog::new(steps)
}

fn bubble_steps(input: &[u32]) -> Vec<SortStep> {
    let mut a = input.to_vec();
    let n = a.len();
    let mut steps = vec![SortStep::new(&a)];

    for end in (1..n).rev() {
        let done = n - 1 - end;
        let mut swapped = false;
        for i in 0..end {
            steps.push(SortStep::new(&a).comparing([i, i + 1]).from_end(done));
            if a[i] > a[i + 1] {
                a.swap(i, i + 1);
                swapped = true;
                steps.push(SortStep::new(&a).active([i, i + 1]).from_end(done));
            }
        }
        steps.push(SortStep::new(&a).from_end(n - end));
        if !swapped {
            break;
        }
    }

    steps.push(SortStep::new(&a).from_end(n));
    steps
}

fn insertion_steps(input: &[u32]) -> Vec<SortStep> {
    let mut a = input.to_vec();
    let n = a.len();
    let mut steps = vec![SortStep::new(&a).upto(n.min(1))];

    for i in 1..n {
        let key = a[i];
        steps.push(SortStep::new(&a).active([i]).upto(i));
        let mut j = i;
        while j > 0 && a[j - 1] > key {
            steps.push(SortStep::new(&a).comparing([j - 1, j]).upto(i));
            a[j] = a[j - 1];
            steps.push(SortStep::new(&a).active([j - 1, j]).upto(i));
            j -= 1;
        }
        a[j] = key;
        steps.push(SortStep::new(&a).active([j]).upto(i + 1));
    }

    steps.push(SortStep::new(&a).upto(n));
    steps
}

/// Moves the maximum of the unsorted prefix to its end on every pass.
fn selection_steps(input: &[u32]) -> Vec<SortStep> {
    let mut a = input.to_vec();
    let n = a.len();
    let mut steps = vec![SortStep::new(&a)];

    for end in (1..n).rev() {
        let done = n - 1 - end;
        let mut max_index = 0;
        for i in 1..=end {
            steps.push(SortStep::new(&a).comparing([max_index, i]).from_end(done));
            if a[i] > a[max_index] {
                max_index = i;
            }
        }
        if max_index != end {
            steps.push(SortStep::new(&a).active([max_index, end]).from_end(done));
            a.swap(max_index, end);
            steps.push(SortStep::new(&a).active([max_index, end]).from_end(done));
        }
        steps.push(SortStep::new(&a).from_end(n - end));
    }

    steps.push(SortStep::new(&a).from_end(n));
    steps
}

fn quick_steps(input: &[u32]) -> Vec<SortStep> {
    struct Quick {
        a: Vec<u32>,
        steps: Vec<SortStep>,
    }

    impl Quick {
        fn swap(&mut self, i: usize, j: usize) {
            if i == j {
                return;
            }
            self.a.swap(i, j);
            self.steps.push(SortStep::new(&self.a).active([i, j]));
        }

        /// Lomuto partition around the last element.
        fn partition(&mut self, lo: usize, hi: usize) -> usize {
            let pivot = self.a[hi];
            let mut i = lo;
            for j in lo..hi {
                self.steps
                    .push(SortStep::new(&self.a).comparing([j, hi]).active([i]));
                if self.a[j] < pivot {
                    self.swap(i, j);
                    i += 1;
                }
            }
            self.swap(i, hi);
            i
        }

        fn sort(&mut self, lo: usize, hi: usize) {
            if lo >= hi {
                return;
            }
            let p = self.partition(lo, hi);
            if p > lo {
                self.sort(lo, p - 1);
            }
            self.sort(p + 1, hi);
        }
    }

    let mut quick = Quick {
        steps: vec![SortStep::new(input)],
        a: input.to_vec(),
    };
    if !input.is_empty() {
        quick.sort(0, input.len() - 1);
    }
    let n = quick.a.len();
    quick.steps.push(SortStep::new(&quick.a).upto(n));
    quick.steps
}

fn merge_steps(input: &[u32]) -> Vec<SortStep> {
    struct Merge {
        a: Vec<u32>,
        aux: Vec<u32>,
        steps: Vec<SortStep>,
    }

    impl Merge {
        fn merge(&mut self, lo: usize, mid: usize, hi: usize) {
            self.aux[lo..=hi].copy_from_slice(&self.a[lo..=hi]);

            let (mut i, mut j) = (lo, mid + 1);
            for k in lo..=hi {
                if i > mid {
                    self.a[k] = self.aux[j];
                    j += 1;
                    self.steps.push(SortStep::new(&self.a).active([k]).comparing([k]));
                } else if j > hi {
                    self.a[k] = self.aux[i];
                    i += 1;
                    self.steps.push(SortStep::new(&self.a).active([k]).comparing([k]));
                } else {
                    self.steps.push(SortStep::new(&self.a).comparing([i, j]));
                    if self.aux[j] < self.aux[i] {
                        self.a[k] = self.aux[j];
                        j += 1;
                    } else {
                        self.a[k] = self.aux[i];
                        i += 1;
                    }
                    self.steps.push(SortStep::new(&self.a).active([k]));
                }
            }
        }

        fn sort(&mut self, lo: usize, hi: usize) {
            if lo >= hi {
                return;
            }
            let mid = lo + (hi - lo) / 2;
            self.sort(lo, mid);
            self.sort(mid + 1, hi);
            self.merge(lo, mid, hi);
        }
    }

    let mut merge = Merge {
        a: input.to_vec(),
        aux: input.to_vec(),
        steps: vec![SortStep::new(input)],
    };
    if !input.is_empty() {
        merge.sort(0, input.len() - 1);
    }
    let n = merge.a.len();
    merge.steps.push(SortStep::new(&merge.a).upto(n));
    merge.steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(values: &[u32]) -> Vec<u32> {
        let mut out = values.to_vec();
        out.sort_unstable();
        out
    }

    #[test]
    fn every_algorithm_sorts_and_only_permutes() {
        let mut rng = seeded_rng(42);
        for len in [0, 1, 2, 3, 10, 41] {
            for _ in 0..5 {
                let input = random_values(len, &mut rng);
                let expected = sorted(&input);
                for algorithm in Algorithm::ALL {
                    let log = build_steps(algorithm, &input);
                    assert_eq!(log.first().unwrap().values, input);
                    assert_eq!(log.last().unwrap().values, expected, "{:?}", algorithm);
                    for step in log.iter() {
                        assert_eq!(sorted(&step.values), expected, "{:?}", algorithm);
                    }
                }
            }
        }
    }

    #[test]
    fn sorted_markers_never_shrink() {
        let mut rng = seeded_rng(9);
        let input = random_values(30, &mut rng);
        for algorithm in Algorithm::ALL {
            let log = build_steps(algorithm, &input);
            for (prev, next) in log.as_slice().iter().zip(log.as_slice().iter().skip(1)) {
                assert!(next.sorted_upto >= prev.sorted_upto, "{:?}", algorithm);
                assert!(next.sorted_from_end >= prev.sorted_from_end, "{:?}", algorithm);
            }
            let last = log.last().unwrap();
            assert!((0..input.len()).all(|index| last.is_sorted(index)));
        }
    }

    #[test]
    fn marked_regions_hold_their_final_values() {
        let mut rng = seeded_rng(5);
        let input = random_values(25, &mut rng);
        let expected = sorted(&input);
        for algorithm in [Algorithm::Bubble, Algorithm::Selection] {
            for step in build_steps(algorithm, &input).iter() {
                let n = step.values.len();
                for index in n - step.sorted_from_end..n {
                    assert_eq!(step.values[index], expected[index], "{:?}", algorithm);
                }
            }
        }
    }

    #[test]
    fn bubble_exits_early_on_sorted_input() {
        let log = build_steps(Algorithm::Bubble, &[1, 2, 3, 4]);
        // initial, three comparisons, end of pass, final
        assert_eq!(log.len(), 6);
        assert!(log.iter().all(|step| step.active.is_empty()));
    }

    #[test]
    fn quick_sort_records_lomuto_partition() {
        let log = build_steps(Algorithm::Quick, &[3, 1, 2]);
        let second = log.get(1).unwrap();
        assert_eq!(second.comparing.as_slice(), &[0, 2]);
        assert_eq!(second.active.as_slice(), &[0]);
    }

    #[test]
    fn role_prefers_sorted_then_active() {
        let step = SortStep::new(&[5, 4, 3, 2])
            .active([1, 3])
            .comparing([1, 2])
            .from_end(1);
        assert_eq!(step.role(3), BarRole::Sorted);
        assert_eq!(step.role(1), BarRole::Active);
        assert_eq!(step.role(2), BarRole::Comparing);
        assert_eq!(step.role(0), BarRole::Idle);
        assert_eq!(step.max_value(), 5);
    }

    #[test]
    fn resize_keeps_prefix() {
        let mut rng = seeded_rng(1);
        let mut values = random_values(DEFAULT_BARS, &mut rng);
        let prefix = values[..MIN_BARS].to_vec();
        resize_values(&mut values, MIN_BARS, &mut rng);
        assert_eq!(values, prefix);
        resize_values(&mut values, MAX_BARS, &mut rng);
        assert_eq!(values.len(), MAX_BARS);
        assert_eq!(values[..MIN_BARS], prefix[..]);
        assert!(values.iter().all(|v| (MIN_VALUE..=MAX_VALUE).contains(v)));
    }
}
