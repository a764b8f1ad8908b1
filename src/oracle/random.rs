use rand::Rng;

use crate::core::{OracleError, OracleResult};

pub const DEFAULT_MIN: u64 = 1;
pub const DEFAULT_MAX: u64 = 1_000_000;

/// Inclusive integer range the counter variant draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomRange {
    min: u64,
    max: u64,
}

impl Default for RandomRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
        }
    }
}

impl RandomRange {
    pub fn new(min: u64, max: u64) -> OracleResult<Self> {
        if min > max {
            return Err(OracleError::InvalidValue(format!(
                "random range is empty: min {} > max {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn generate(&self) -> u64 {
        self.generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng>(&self, rng: &mut R) -> u64 {
        rng.gen_range(self.min..=self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_range() {
        let range = RandomRange::default();
        assert_eq!((range.min(), range.max()), (1, 1_000_000));
    }

    #[test]
    fn test_values_stay_within_bounds() {
        let mut rng = StdRng::seed_from_u64(42);

        for (min, max) in [(1, 1_000_000), (0, 1), (10, 20), (u64::MAX - 3, u64::MAX)] {
            let range = RandomRange::new(min, max).unwrap();
            for _ in 0..1_000 {
                let v = range.generate_with(&mut rng);
                assert!(v >= min && v <= max, "{} outside [{}, {}]", v, min, max);
            }
        }
    }

    #[test]
    fn test_single_point_range() {
        let range = RandomRange::new(7, 7).unwrap();
        assert_eq!(range.generate(), 7);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = RandomRange::new(0, 1).unwrap();

        let draws: Vec<u64> = (0..200).map(|_| range.generate_with(&mut rng)).collect();
        assert!(draws.contains(&0));
        assert!(draws.contains(&1));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        assert!(matches!(
            RandomRange::new(10, 1),
            Err(OracleError::InvalidValue(_))
        ));
    }
}
