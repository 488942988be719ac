use std::fmt::Display;

use crate::geometry::FloatType;

/// Running summary of a set of samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub min: FloatType,
    pub max: FloatType,
    pub avg: FloatType,
}

impl Stats {
    pub fn add_sample(&mut self, value: impl Into<FloatType>) {
        let value = value.into();
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.avg += (value - self.avg) / (self.count as FloatType);
    }

    pub fn merge(&self, other: &Self) -> Self {
        let count = self.count + other.count;
        Stats {
            count,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            avg: if count > 0 {
                (self.avg * self.count as FloatType + other.avg * other.count as FloatType)
                    / count as FloatType
            } else {
                0.0
            },
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            count: 0,
            min: FloatType::INFINITY,
            max: FloatType::NEG_INFINITY,
            avg: 0.0,
        }
    }
}

impl<T: Into<FloatType>> FromIterator<T> for Stats {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut ret = Stats::default();
        for sample in iter {
            ret.add_sample(sample);
        }
        ret
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}; avg {:.1}; {} samples",
            self.min, self.max, self.avg, self.count
        )
    }
}
