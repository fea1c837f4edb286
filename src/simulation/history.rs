//! Bounded time series used for graphs and trails.

use ndarray::Array1;
use std::collections::VecDeque;

use super::Scalar;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<T> {
    pub time: Scalar,
    pub value: T,
}

/// FIFO buffer that evicts its oldest sample once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct HistorySeries<T> {
    samples: VecDeque<Sample<T>>,
    capacity: usize,
}

impl<T> HistorySeries<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        HistorySeries {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, time: Scalar, value: T) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample { time, value });
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample<T>> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&Sample<T>> {
        self.samples.back()
    }

    pub fn times(&self) -> Array1<Scalar> {
        self.samples.iter().map(|s| s.time).collect()
    }

    /// Projects one channel of every sample into an array for plotting.
    pub fn channel(&self, f: impl Fn(&T) -> Scalar) -> Array1<Scalar> {
        self.samples.iter().map(|s| f(&s.value)).collect()
    }
}

/// Minimum and maximum of a channel, or `None` for an empty series.
pub fn value_range(values: &Array1<Scalar>) -> Option<(Scalar, Scalar)> {
    if values.is_empty() {
        return None;
    }
    let min = values.fold(Scalar::INFINITY, |acc, v| acc.min(*v));
    let max = values.fold(Scalar::NEG_INFINITY, |acc, v| acc.max(*v));
    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut history = HistorySeries::new(3);
        for i in 0..5 {
            history.push(i as Scalar, i);
        }
        assert_eq!(history.len(), 3);
        let values: Vec<i32> = history.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![2, 3, 4]);
        assert_eq!(history.latest().map(|s| s.time), Some(4.0));
    }

    #[test]
    fn test_channel_range() {
        let mut history = HistorySeries::new(10);
        history.push(0.0, (1.0, -2.0));
        history.push(1.0, (3.0, 5.0));
        assert_eq!(value_range(&history.channel(|v| v.0)), Some((1.0, 3.0)));
        assert_eq!(value_range(&history.channel(|v| v.1)), Some((-2.0, 5.0)));
        assert_eq!(value_range(&Array1::zeros(0)), None);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut history = HistorySeries::new(0);
        history.push(0.0, 1);
        history.push(1.0, 2);
        assert_eq!(history.len(), 1);
    }
}
