use gonogo_core::{Color, SessionError, Shape};
use rand::Rng;
use rand::seq::SliceRandom;

/// A stimulus dimension that can be sampled.
pub trait Category: Copy + PartialEq {
    const NAME: &'static str;
}

impl Category for Shape {
    const NAME: &'static str = "shape";
}

impl Category for Color {
    const NAME: &'static str = "color";
}

/// Distinct values of `set`, in first-seen order.
fn members<T: Category>(set: &[T]) -> Vec<T> {
    let mut members = Vec::with_capacity(set.len());
    for &v in set {
        if !members.contains(&v) {
            members.push(v);
        }
    }
    members
}

/// Uniform sampling over category domains.
#[derive(Debug, Clone)]
pub struct RandomPool<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomPool<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Uniform over the distinct members of `set`.
    pub fn sample<T: Category>(&mut self, set: &[T]) -> Result<T, SessionError> {
        let members = members(set);
        if members.is_empty() {
            return Err(SessionError::EmptyDomain { category: T::NAME });
        }
        Ok(members[self.rng.random_range(0..members.len())])
    }

    /// Uniform over `set \ {excluded}`. `excluded` need not be a member.
    /// Sets of one distinct member or less are rejected outright.
    pub fn sample_excluding<T: Category>(
        &mut self,
        set: &[T],
        excluded: T,
    ) -> Result<T, SessionError> {
        let members = members(set);
        if members.len() <= 1 {
            return Err(SessionError::EmptyDomain { category: T::NAME });
        }
        let remaining: Vec<T> = members.into_iter().filter(|&v| v != excluded).collect();
        if remaining.is_empty() {
            return Err(SessionError::EmptyDomain { category: T::NAME });
        }
        Ok(remaining[self.rng.random_range(0..remaining.len())])
    }

    /// Fisher–Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn pool() -> RandomPool<StdRng> {
        RandomPool::new(StdRng::seed_from_u64(7))
    }

    #[test]
    fn sample_covers_the_domain() {
        let mut pool = pool();
        let seen: HashSet<Color> = (0..500)
            .map(|_| pool.sample(&Color::ALL).unwrap())
            .collect();
        assert_eq!(seen.len(), Color::ALL.len());
    }

    #[test]
    fn exclusion_never_returns_the_excluded_value() {
        let mut pool = pool();
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let shape = pool.sample_excluding(&Shape::ALL, Shape::Circle).unwrap();
            assert_ne!(shape, Shape::Circle);
            seen.insert(shape);
        }
        assert_eq!(seen.len(), Shape::ALL.len() - 1);
    }

    #[test]
    fn excluded_value_outside_the_set_is_fine() {
        let mut pool = pool();
        let set = [Shape::Square, Shape::Minus];
        for _ in 0..50 {
            let shape = pool.sample_excluding(&set, Shape::Circle).unwrap();
            assert!(set.contains(&shape));
        }
    }

    #[test]
    fn empty_domains_are_reported() {
        let mut pool = pool();
        let empty: [Shape; 0] = [];
        assert!(matches!(
            pool.sample(&empty),
            Err(SessionError::EmptyDomain { category: "shape" })
        ));
        assert!(matches!(
            pool.sample_excluding(&[Color::Red], Color::Red),
            Err(SessionError::EmptyDomain { category: "color" })
        ));
        assert!(matches!(
            pool.sample_excluding(&[Color::Red], Color::Blue),
            Err(SessionError::EmptyDomain { .. })
        ));
        assert!(matches!(
            pool.sample_excluding(&[Color::Red, Color::Red], Color::Red),
            Err(SessionError::EmptyDomain { .. })
        ));
    }

    #[test]
    fn repeated_entries_do_not_weight_the_draw() {
        let mut pool = pool();
        let set = [Shape::Cross, Shape::Cross, Shape::Cross, Shape::Circle];
        let crosses = (0..10_000)
            .filter(|_| pool.sample(&set).unwrap() == Shape::Cross)
            .count();
        assert!((4_500..5_500).contains(&crosses), "{crosses} crosses");

        assert!(matches!(
            pool.sample_excluding(&[Color::Red, Color::Red], Color::Blue),
            Err(SessionError::EmptyDomain { category: "color" })
        ));
        let set = [Color::Red, Color::Red, Color::Blue];
        for _ in 0..50 {
            assert_eq!(pool.sample_excluding(&set, Color::Red).unwrap(), Color::Blue);
        }
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut pool = pool();
        let mut items: Vec<u32> = (0..32).collect();
        pool.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..32).collect::<Vec<_>>());
    }
}
