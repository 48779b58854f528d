//! Fixed-width histograms for selectivity estimation.
//!
//! Space and per-value time are constant in the number of values seen:
//! only bucket heights are kept, never the values themselves. Estimates
//! interpolate inside the bucket a constant falls into and assume values
//! are uniform within each bucket.

use crate::exec::CmpOp;

/// Equi-width histogram over an integer column.
pub struct IntHistogram {
    heights: Vec<u64>,
    min: i32,
    max: i32,
    buckets: usize,
    total: u64,
    /// Values per bucket (integer width, so the last bucket may be wider).
    width: i64,
    /// Width of the final bucket: whatever the first `buckets - 1` leave.
    last_range: i64,
}

impl IntHistogram {
    /// Histogram with up to `buckets` buckets over `[min, max]`. A domain
    /// narrower than the bucket count just gets one bucket per value.
    pub fn new(buckets: usize, min: i32, max: i32) -> Self {
        let range = (max as i64 - min as i64 + 1).max(1);
        let buckets = buckets.clamp(1, range as usize);
        let width = range / buckets as i64;
        let last_range = range - width * (buckets as i64 - 1);

        IntHistogram {
            heights: vec![0; buckets],
            min,
            max,
            buckets,
            total: 0,
            width,
            last_range,
        }
    }

    /// Record one value. Out-of-domain values are ignored.
    pub fn add_value(&mut self, v: i32) {
        if v < self.min || v > self.max {
            return;
        }
        let idx = self.bucket_of(v);
        self.heights[idx] += 1;
        self.total += 1;
    }

    /// Number of values recorded.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Estimated fraction of recorded values satisfying `value op v`.
    pub fn estimate_selectivity(&self, op: CmpOp, v: i32) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f64;
        match op {
            CmpOp::GreaterThan => {
                if v < self.min {
                    1.0
                } else if v >= self.max {
                    0.0
                } else {
                    self.count_greater(v) as f64 / total
                }
            }
            CmpOp::GreaterThanOrEq => {
                if v <= self.min {
                    1.0
                } else if v > self.max {
                    0.0
                } else {
                    (self.count_greater(v) + self.count_equal(v)) as f64 / total
                }
            }
            CmpOp::LessThan => {
                if v > self.max {
                    1.0
                } else if v <= self.min {
                    0.0
                } else {
                    self.count_less(v) as f64 / total
                }
            }
            CmpOp::LessThanOrEq => {
                if v >= self.max {
                    1.0
                } else if v < self.min {
                    0.0
                } else {
                    (self.count_less(v) + self.count_equal(v)) as f64 / total
                }
            }
            CmpOp::Equals | CmpOp::Like => {
                if v < self.min || v > self.max {
                    0.0
                } else {
                    self.count_equal(v) as f64 / total
                }
            }
            CmpOp::NotEquals => {
                if v < self.min || v > self.max {
                    1.0
                } else {
                    1.0 - self.count_equal(v) as f64 / total
                }
            }
        }
    }

    /// Bucket index of an in-domain value.
    fn bucket_of(&self, v: i32) -> usize {
        (((v as i64 - self.min as i64) / self.width) as usize).min(self.buckets - 1)
    }

    /// Estimated count of values strictly greater than `v` (in-domain).
    fn count_greater(&self, v: i32) -> u64 {
        let idx = self.bucket_of(v);
        if idx != self.buckets - 1 {
            let offset = (v as i64 - self.min as i64) % self.width;
            let in_bucket = (self.width - 1 - offset) as u64 * self.heights[idx] / self.width as u64;
            in_bucket + self.heights[idx + 1..].iter().sum::<u64>()
        } else {
            (self.max as i64 - v as i64) as u64 * self.heights[idx] / self.last_range as u64
        }
    }

    /// Estimated count of values equal to `v` (in-domain).
    fn count_equal(&self, v: i32) -> u64 {
        let idx = self.bucket_of(v);
        if idx != self.buckets - 1 {
            self.heights[idx] / self.width as u64
        } else {
            self.heights[idx] / self.last_range as u64
        }
    }

    fn count_less(&self, v: i32) -> u64 {
        self.total - self.count_equal(v) - self.count_greater(v)
    }
}

/// Histogram over a text column.
///
/// Strings are mapped onto the integers by prefix-encoding their first
/// four bytes (7 bits each), then delegated to an [`IntHistogram`]; the
/// estimate quality degrades gracefully for strings sharing long
/// prefixes.
pub struct TextHistogram {
    inner: IntHistogram,
}

/// Largest value `encode` can produce: four 7-bit bytes.
const ENCODE_MAX: i32 = 128 * 128 * 128 * 128 - 1;

fn encode(s: &str) -> i32 {
    let bytes = s.as_bytes();
    let mut v: i32 = 0;
    for i in 0..4 {
        let b = bytes.get(i).map(|b| (b & 0x7f) as i32).unwrap_or(0);
        v = v * 128 + b;
    }
    v
}

impl TextHistogram {
    pub fn new(buckets: usize) -> Self {
        TextHistogram {
            inner: IntHistogram::new(buckets, 0, ENCODE_MAX),
        }
    }

    pub fn add_value(&mut self, s: &str) {
        self.inner.add_value(encode(s));
    }

    pub fn estimate_selectivity(&self, op: CmpOp, s: &str) -> f64 {
        self.inner.estimate_selectivity(op, encode(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_histogram() -> IntHistogram {
        // 100 values uniform over [0, 99], 10 buckets of width 10.
        let mut h = IntHistogram::new(10, 0, 99);
        for v in 0..100 {
            h.add_value(v);
        }
        h
    }

    #[test]
    fn test_out_of_domain_values_ignored() {
        let mut h = IntHistogram::new(10, 0, 9);
        h.add_value(-1);
        h.add_value(10);
        assert_eq!(h.total(), 0);
        h.add_value(0);
        h.add_value(9);
        assert_eq!(h.total(), 2);
    }

    #[test]
    fn test_boundary_selectivities() {
        let h = uniform_histogram();
        assert_eq!(h.estimate_selectivity(CmpOp::GreaterThan, -5), 1.0);
        assert_eq!(h.estimate_selectivity(CmpOp::GreaterThan, 99), 0.0);
        assert_eq!(h.estimate_selectivity(CmpOp::LessThan, 120), 1.0);
        assert_eq!(h.estimate_selectivity(CmpOp::LessThan, 0), 0.0);
        assert_eq!(h.estimate_selectivity(CmpOp::Equals, 150), 0.0);
        assert_eq!(h.estimate_selectivity(CmpOp::NotEquals, 150), 1.0);
    }

    #[test]
    fn test_uniform_estimates_are_close() {
        let h = uniform_histogram();

        let gt50 = h.estimate_selectivity(CmpOp::GreaterThan, 50);
        assert!((gt50 - 0.49).abs() < 0.1, "gt50 = {}", gt50);

        let lt50 = h.estimate_selectivity(CmpOp::LessThan, 50);
        assert!((lt50 - 0.5).abs() < 0.1, "lt50 = {}", lt50);

        let eq50 = h.estimate_selectivity(CmpOp::Equals, 50);
        assert!((eq50 - 0.01).abs() < 0.01, "eq50 = {}", eq50);

        let ne50 = h.estimate_selectivity(CmpOp::NotEquals, 50);
        assert!((ne50 - 0.99).abs() < 0.01, "ne50 = {}", ne50);
    }

    #[test]
    fn test_skewed_distribution() {
        let mut h = IntHistogram::new(10, 0, 99);
        for _ in 0..90 {
            h.add_value(5);
        }
        for v in 90..100 {
            h.add_value(v);
        }

        // Almost everything is below 50.
        assert!(h.estimate_selectivity(CmpOp::LessThan, 50) > 0.8);
        assert!(h.estimate_selectivity(CmpOp::GreaterThan, 50) < 0.2);
    }

    #[test]
    fn test_domain_narrower_than_buckets() {
        // 3 distinct values, 100 requested buckets: one bucket per value.
        let mut h = IntHistogram::new(100, 1, 3);
        h.add_value(1);
        h.add_value(2);
        h.add_value(3);

        let eq2 = h.estimate_selectivity(CmpOp::Equals, 2);
        assert!((eq2 - 1.0 / 3.0).abs() < 0.01, "eq2 = {}", eq2);
    }

    #[test]
    fn test_empty_histogram_estimates_zero() {
        let h = IntHistogram::new(10, 0, 99);
        assert_eq!(h.estimate_selectivity(CmpOp::Equals, 50), 0.0);
        assert_eq!(h.estimate_selectivity(CmpOp::GreaterThan, 50), 0.0);
    }

    #[test]
    fn test_text_histogram_orders_by_prefix() {
        let mut h = TextHistogram::new(100);
        for s in ["apple", "banana", "cherry", "melon", "zebra"] {
            h.add_value(s);
        }

        // Everything is >= "a..." and nothing is > "zz".
        assert!(h.estimate_selectivity(CmpOp::GreaterThanOrEq, "a") > 0.9);
        assert!(h.estimate_selectivity(CmpOp::GreaterThan, "zz") < 0.1);
        // Most entries sort after "b".
        assert!(h.estimate_selectivity(CmpOp::GreaterThan, "b") >= 0.6);
    }
}
