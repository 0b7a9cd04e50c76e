use crate::config::SessionConfig;
use crate::pool::RandomPool;
use gonogo_core::{Mode, Role, SessionError, Stimulus};
use rand::Rng;
use tracing::debug;

/// Builds the balanced, shuffled stimulus sequence for a session.
///
/// Targets fix the relevant dimension to the target value. Distractors draw
/// the relevant dimension from the domain without the target value. The
/// irrelevant dimension is unconstrained for both, so a distractor may carry
/// the target value there.
#[derive(Debug, Clone, Copy)]
pub struct StimulusSetBuilder<'a> {
    config: &'a SessionConfig,
}

impl<'a> StimulusSetBuilder<'a> {
    pub fn new(config: &'a SessionConfig) -> Self {
        Self { config }
    }

    pub fn build<R: Rng>(&self, pool: &mut RandomPool<R>) -> Result<Vec<Stimulus>, SessionError> {
        let config = self.config;
        config.validate()?;

        let per_class = config.trials_per_class;
        let mut stimuli = Vec::with_capacity(config.total_trials());
        for _ in 0..per_class {
            stimuli.push(self.target(pool)?);
        }
        for _ in 0..per_class {
            stimuli.push(self.distractor(pool)?);
        }
        pool.shuffle(&mut stimuli);

        debug!(
            mode = %config.mode,
            targets = per_class,
            distractors = per_class,
            total = stimuli.len(),
            "generated stimuli"
        );
        Ok(stimuli)
    }

    fn target<R: Rng>(&self, pool: &mut RandomPool<R>) -> Result<Stimulus, SessionError> {
        let c = self.config;
        let (shape, color) = match c.mode {
            Mode::Icon => (c.target_shape, pool.sample(&c.colors)?),
            Mode::Color => (pool.sample(&c.shapes)?, c.target_color),
        };
        Ok(Stimulus::new(Role::Target, shape, color))
    }

    fn distractor<R: Rng>(&self, pool: &mut RandomPool<R>) -> Result<Stimulus, SessionError> {
        let c = self.config;
        let (shape, color) = match c.mode {
            Mode::Icon => (
                pool.sample_excluding(&c.shapes, c.target_shape)?,
                pool.sample(&c.colors)?,
            ),
            Mode::Color => (
                pool.sample(&c.shapes)?,
                pool.sample_excluding(&c.colors, c.target_color)?,
            ),
        };
        Ok(Stimulus::new(Role::NonTarget, shape, color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonogo_core::{Color, Shape};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn pool(seed: u64) -> RandomPool<StdRng> {
        RandomPool::new(StdRng::seed_from_u64(seed))
    }

    fn count(stimuli: &[Stimulus], role: Role) -> usize {
        stimuli.iter().filter(|s| s.role == role).count()
    }

    #[test]
    fn icon_mode_set_is_balanced_and_exclusive() {
        let config = SessionConfig {
            target_shape: Shape::Triangle,
            trials_per_class: 40,
            ..SessionConfig::default()
        };
        for seed in 0..20 {
            let stimuli = StimulusSetBuilder::new(&config).build(&mut pool(seed)).unwrap();
            assert_eq!(stimuli.len(), 80);
            assert_eq!(count(&stimuli, Role::Target), 40);
            assert_eq!(count(&stimuli, Role::NonTarget), 40);
            for s in &stimuli {
                match s.role {
                    Role::Target => assert_eq!(s.shape, Shape::Triangle),
                    Role::NonTarget => assert_ne!(s.shape, Shape::Triangle),
                }
            }
        }
    }

    #[test]
    fn color_mode_set_is_balanced_and_exclusive() {
        let config = SessionConfig {
            mode: Mode::Color,
            target_color: Color::Yellow,
            trials_per_class: 25,
            ..SessionConfig::default()
        };
        for seed in 0..20 {
            let stimuli = StimulusSetBuilder::new(&config).build(&mut pool(seed)).unwrap();
            assert_eq!(count(&stimuli, Role::Target), 25);
            assert_eq!(count(&stimuli, Role::NonTarget), 25);
            for s in &stimuli {
                match s.role {
                    Role::Target => assert_eq!(s.color, Color::Yellow),
                    Role::NonTarget => assert_ne!(s.color, Color::Yellow),
                }
            }
        }
    }

    #[test]
    fn irrelevant_dimension_is_left_free() {
        // Distractors in icon mode may carry the target color.
        let config = SessionConfig {
            target_color: Color::Red,
            trials_per_class: 200,
            ..SessionConfig::default()
        };
        let stimuli = StimulusSetBuilder::new(&config).build(&mut pool(3)).unwrap();
        assert!(
            stimuli
                .iter()
                .any(|s| s.role == Role::NonTarget && s.color == Color::Red)
        );
    }

    #[test]
    fn irrelevant_dimension_is_left_free_in_color_mode() {
        // Distractors in color mode may carry the target shape.
        let config = SessionConfig {
            mode: Mode::Color,
            target_shape: Shape::Circle,
            target_color: Color::Green,
            trials_per_class: 200,
            ..SessionConfig::default()
        };
        let stimuli = StimulusSetBuilder::new(&config).build(&mut pool(3)).unwrap();
        assert!(
            stimuli
                .iter()
                .any(|s| s.role == Role::NonTarget && s.shape == Shape::Circle)
        );
        assert!(
            stimuli
                .iter()
                .filter(|s| s.role == Role::NonTarget)
                .all(|s| s.color != Color::Green)
        );
    }

    #[test]
    fn rebuilding_keeps_composition_but_not_order() {
        let config = SessionConfig {
            trials_per_class: 30,
            ..SessionConfig::default()
        };
        let builder = StimulusSetBuilder::new(&config);
        let a = builder.build(&mut pool(1)).unwrap();
        let b = builder.build(&mut pool(2)).unwrap();
        assert_eq!(count(&a, Role::Target), count(&b, Role::Target));
        assert_eq!(count(&a, Role::NonTarget), count(&b, Role::NonTarget));
        assert_ne!(a, b);
    }

    #[test]
    fn same_seed_reproduces_the_sequence() {
        let config = SessionConfig::default();
        let builder = StimulusSetBuilder::new(&config);
        assert_eq!(
            builder.build(&mut pool(99)).unwrap(),
            builder.build(&mut pool(99)).unwrap()
        );
    }

    #[test]
    fn invalid_config_is_rejected_before_generation() {
        let config = SessionConfig {
            trials_per_class: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            StimulusSetBuilder::new(&config).build(&mut pool(0)),
            Err(SessionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn single_value_relevant_domain_cannot_make_distractors() {
        let config = SessionConfig {
            shapes: vec![Shape::Circle],
            ..SessionConfig::default()
        };
        assert!(matches!(
            StimulusSetBuilder::new(&config).build(&mut pool(0)),
            Err(SessionError::EmptyDomain { category: "shape" })
        ));
    }
}
