//! Solution steps and scalar time functions.

/// One solution step of the analysis.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeStep {
    /// Step counter, starting at 1.
    pub number: u64,
    /// Time at the end of the step.
    pub target_time: f64,
    /// Time at which state-dependent quantities are evaluated.
    pub intrinsic_time: f64,
    /// Step length.
    pub time_increment: f64,
}

impl TimeStep {
    /// A step whose intrinsic time equals its target time.
    pub fn new(number: u64, target_time: f64, time_increment: f64) -> Self {
        Self {
            number,
            target_time,
            intrinsic_time: target_time,
            time_increment,
        }
    }

    pub fn with_intrinsic_time(mut self, t: f64) -> Self {
        self.intrinsic_time = t;
        self
    }
}

/// Scalar function of simulation time.
pub trait TimeFunction: Send + Sync {
    fn evaluate(&self, time: f64) -> f64;
}

/// Same value at all times.
#[derive(Copy, Clone, Debug)]
pub struct ConstantFunction(pub f64);

impl TimeFunction for ConstantFunction {
    fn evaluate(&self, _time: f64) -> f64 {
        self.0
    }
}

/// Zero before `start`, `value` from `start` on.
#[derive(Copy, Clone, Debug)]
pub struct HeavisideFunction {
    pub start: f64,
    pub value: f64,
}

impl TimeFunction for HeavisideFunction {
    fn evaluate(&self, time: f64) -> f64 {
        if time >= self.start { self.value } else { 0.0 }
    }
}

/// Piecewise-linear interpolation through `(time, value)` knots, constant
/// extrapolation outside the knot range.
#[derive(Clone, Debug, Default)]
pub struct PiecewiseLinearFunction {
    knots: Vec<(f64, f64)>,
}

impl PiecewiseLinearFunction {
    /// Knots are sorted by time on construction.
    pub fn new(mut knots: Vec<(f64, f64)>) -> Self {
        knots.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { knots }
    }
}

impl TimeFunction for PiecewiseLinearFunction {
    fn evaluate(&self, time: f64) -> f64 {
        let (Some(first), Some(last)) = (self.knots.first(), self.knots.last()) else {
            return 0.0;
        };
        if time <= first.0 {
            return first.1;
        }
        if time >= last.0 {
            return last.1;
        }
        for w in self.knots.windows(2) {
            let (t0, v0) = w[0];
            let (t1, v1) = w[1];
            if time <= t1 {
                if t1 == t0 {
                    return v1;
                }
                return v0 + (v1 - v0) * (time - t0) / (t1 - t0);
            }
        }
        last.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heaviside_switches_on() {
        let f = HeavisideFunction { start: 2.0, value: 1.0 };
        assert_eq!(f.evaluate(1.5), 0.0);
        assert_eq!(f.evaluate(2.0), 1.0);
    }

    #[test]
    fn piecewise_linear_interpolates_and_clamps() {
        let f = PiecewiseLinearFunction::new(vec![(1.0, 2.0), (0.0, 0.0), (2.0, 2.0)]);
        assert_eq!(f.evaluate(-1.0), 0.0);
        assert!((f.evaluate(0.5) - 1.0).abs() < 1e-12);
        assert_eq!(f.evaluate(1.5), 2.0);
        assert_eq!(f.evaluate(10.0), 2.0);
    }

    #[test]
    fn empty_piecewise_is_zero() {
        assert_eq!(PiecewiseLinearFunction::default().evaluate(3.0), 0.0);
    }
}
