use crate::error::{Error, Result};

/// A hyperparameter that may change from one episode to the next
///
/// A bare `f64` is a schedule that never changes.
pub trait Decay {
    /// Value of the parameter during the zero-based `episode`
    fn at(&self, episode: usize) -> f64;
}

impl Decay for f64 {
    fn at(&self, _episode: usize) -> f64 {
        *self
    }
}

/// Movement from `from` toward `to` at a given speed
///
/// The sign of `rate` must agree with the direction of travel; a zero rate only makes sense for a falling
/// schedule and holds it at `from`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Span {
    rate: f64,
    from: f64,
    to: f64,
}

impl Span {
    fn new(rate: f64, from: f64, to: f64) -> Result<Self> {
        let falling = rate >= 0.0 && from > to;
        let rising = rate < 0.0 && from < to;
        if falling || rising {
            Ok(Self { rate, from, to })
        } else {
            Err(Error::InvalidDecay {
                rate,
                vi: from,
                vf: to,
            })
        }
    }

    /// Episodes scaled by the magnitude of the rate
    fn elapsed(&self, episode: usize) -> f64 {
        self.rate.abs() * episode as f64
    }

    /// `from` when all of the distance remains, `to` when none does
    fn blend(&self, remaining: f64) -> f64 {
        self.to + (self.from - self.to) * remaining
    }
}

/// v(t) = v<sub>f</sub> + (v<sub>i</sub> - v<sub>f</sub>) e<sup>-|r|t</sup>
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential(Span);

impl Exponential {
    pub fn new(rate: f64, vi: f64, vf: f64) -> Result<Self> {
        Span::new(rate, vi, vf).map(Self)
    }
}

impl Decay for Exponential {
    fn at(&self, episode: usize) -> f64 {
        self.0.blend((-self.0.elapsed(episode)).exp())
    }
}

/// v(t) = v<sub>f</sub> + (v<sub>i</sub> - v<sub>f</sub>) / (1 + |r|t)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseTime(Span);

impl InverseTime {
    pub fn new(rate: f64, vi: f64, vf: f64) -> Result<Self> {
        Span::new(rate, vi, vf).map(Self)
    }
}

impl Decay for InverseTime {
    fn at(&self, episode: usize) -> f64 {
        self.0.blend(1.0 / (1.0 + self.0.elapsed(episode)))
    }
}

/// Moves `|r|` per episode from v<sub>i</sub> and stops at v<sub>f</sub>
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Linear(Span);

impl Linear {
    pub fn new(rate: f64, vi: f64, vf: f64) -> Result<Self> {
        Span::new(rate, vi, vf).map(Self)
    }
}

impl Decay for Linear {
    fn at(&self, episode: usize) -> f64 {
        let Span { from, to, .. } = self.0;
        let remaining = 1.0 - self.0.elapsed(episode) / (from - to).abs();
        self.0.blend(remaining.max(0.0))
    }
}

/// Multiplies v<sub>i</sub> by `factor` once every `every` episodes, never going below v<sub>f</sub>
///
/// `Step::new(0.5, 1.0, 0.01, 100)` halves exploration every hundred episodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    factor: f64,
    from: f64,
    to: f64,
    every: usize,
}

impl Step {
    pub fn new(factor: f64, vi: f64, vf: f64, every: usize) -> Result<Self> {
        if every == 0 {
            return Err(Error::InvalidParameter {
                name: "every",
                reason: "step length must be at least one episode".into(),
            });
        }
        if !(0.0..1.0).contains(&factor) || vi <= vf {
            return Err(Error::InvalidDecay {
                rate: factor,
                vi,
                vf,
            });
        }
        Ok(Self {
            factor,
            from: vi,
            to: vf,
            every,
        })
    }
}

impl Decay for Step {
    fn at(&self, episode: usize) -> f64 {
        let steps = (episode / self.every) as f64;
        (self.from * self.factor.powf(steps)).max(self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every schedule starts at 1, heads for 0.25, and may never overshoot it
    fn falling() -> Vec<(&'static str, Box<dyn Decay>)> {
        vec![
            ("exponential", Box::new(Exponential::new(0.05, 1.0, 0.25).unwrap()) as Box<dyn Decay>),
            ("inverse time", Box::new(InverseTime::new(0.05, 1.0, 0.25).unwrap())),
            ("linear", Box::new(Linear::new(0.01, 1.0, 0.25).unwrap())),
            ("step", Box::new(Step::new(0.5, 1.0, 0.25, 10).unwrap())),
        ]
    }

    #[test]
    fn falling_schedules_functional() {
        for (name, schedule) in falling() {
            assert_eq!(schedule.at(0), 1.0, "{name} starts at vi");
            let mut previous = schedule.at(0);
            for episode in 1..2000 {
                let value = schedule.at(episode);
                assert!(value <= previous, "{name} never rises");
                assert!(value >= 0.25, "{name} stays above vf");
                previous = value;
            }
            assert!(previous - 0.25 < 1e-2, "{name} ends near vf, got {previous}");
        }
    }

    #[test]
    fn rising_schedule() {
        let x = Linear::new(-0.1, 0.0, 1.0).unwrap();
        assert_eq!(x.at(0), 0.0);
        assert!(x.at(5) > 0.4 && x.at(5) < 0.6);
        assert_eq!(x.at(100), 1.0, "clamped at vf");

        let x = Exponential::new(-1.0, 0.0, 1.0).unwrap();
        assert!(x.at(50) <= 1.0, "approaches vf from below");
    }

    #[test]
    fn direction_must_match_rate() {
        assert!(Span::new(1.0, 1.0, 0.0).is_ok());
        assert!(Span::new(0.0, 1.0, 0.0).is_ok());
        assert!(Span::new(1.0, -1.0, 0.0).is_err());
        assert!(Span::new(-1.0, 1.0, 0.0).is_err());
        assert!(Span::new(-1.0, -1.0, 0.0).is_ok());
        assert!(Span::new(1.0, 0.5, 0.5).is_err(), "nowhere to go");

        assert_eq!(
            Linear::new(1.0, 0.0, 1.0),
            Err(Error::InvalidDecay {
                rate: 1.0,
                vi: 0.0,
                vf: 1.0
            }),
            "error carries the rejected parameters"
        );
    }

    #[test]
    fn step_validation() {
        assert!(Step::new(0.5, 1.0, 0.1, 0).is_err(), "zero step length");
        assert!(Step::new(1.5, 1.0, 0.1, 10).is_err(), "factor above one");
        assert!(Step::new(0.5, 0.1, 1.0, 10).is_err(), "rising");

        let x = Step::new(0.5, 1.0, 0.1, 10).unwrap();
        assert_eq!([x.at(9), x.at(10), x.at(25)], [1.0, 0.5, 0.25]);
    }

    #[test]
    fn plain_float_is_constant() {
        let epsilon = 0.25_f64;
        assert_eq!(epsilon.at(0), 0.25);
        assert_eq!(epsilon.at(1_000_000), 0.25);
    }
}
