//! Numeric kernel: piecewise-linear interpolation, three-point quadratic fit
//! and a derivative-free 1-D maximizer.
//!
//! These are the building blocks the performance disciplines use to locate
//! optimal operating points (best climb speed, best cruise Mach, ...).

use tracing::{debug, instrument, trace};

use crate::domain::error::{DomainError, DomainResult};

/// Default ceiling on bracket extensions in [`maximize_1d`].
pub const DEFAULT_MAX_BRACKET_STEPS: usize = 10_000;

/// Piecewise-linear interpolation of `ys` over the strictly increasing knots `xs`.
///
/// Above the last knot the last segment is extrapolated. Below the first
/// knot the first segment is extrapolated; callers should not rely on that.
///
/// # Errors
/// `InvalidInput` if the lengths differ, fewer than two knots are given, or
/// the knots are not strictly increasing.
pub fn interpolate_linear(x: f64, xs: &[f64], ys: &[f64]) -> DomainResult<f64> {
    check_knots(xs, ys)?;
    Ok(interpolate_unchecked(x, xs, ys))
}

fn check_knots(xs: &[f64], ys: &[f64]) -> DomainResult<()> {
    if xs.len() != ys.len() {
        return Err(DomainError::InvalidInput(format!(
            "knot count {} does not match value count {}",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < 2 {
        return Err(DomainError::InvalidInput(format!(
            "at least 2 knots required, got {}",
            xs.len()
        )));
    }
    if let Some(i) = xs.windows(2).position(|w| !(w[0] < w[1])) {
        return Err(DomainError::InvalidInput(format!(
            "knots must be strictly increasing: xs[{}] = {} >= xs[{}] = {}",
            i,
            xs[i],
            i + 1,
            xs[i + 1]
        )));
    }

    Ok(())
}

fn interpolate_unchecked(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len();
    let j = (1..n).find(|&j| x < xs[j]).unwrap_or(n - 1);
    ys[j - 1] + (ys[j] - ys[j - 1]) * (x - xs[j - 1]) / (xs[j] - xs[j - 1])
}

/// Validated 1-D lookup table; evaluation cannot fail once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Table1d {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Table1d {
    pub fn new(xs: &[f64], ys: &[f64]) -> DomainResult<Self> {
        check_knots(xs, ys)?;
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }

    pub fn eval(&self, x: f64) -> f64 {
        interpolate_unchecked(x, &self.xs, &self.ys)
    }
}

/// Coefficients of `a*x^2 + b*x + c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadratic {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Quadratic {
    pub fn eval(&self, x: f64) -> f64 {
        (self.a * x + self.b) * x + self.c
    }

    /// Abscissa of the extremum, `None` for a straight line.
    pub fn vertex(&self) -> Option<f64> {
        if self.a == 0.0 {
            None
        } else {
            Some(-self.b / (2.0 * self.a))
        }
    }
}

/// Fit the quadratic through three points with Cramer's rule.
///
/// A singular system is not an error. If the first and third abscissae
/// differ the result is `b = y0 - y2`, `c = y2*x0 - y0*x2/(x0 - x2)`: note
/// that `b` is the raw ordinate difference (not a slope) and only the
/// second term of `c` is divided. Persisted sizing results depend on these
/// exact coefficients. Otherwise a flat function at the mean ordinate.
pub fn fit_quadratic(points: [(f64, f64); 3]) -> Quadratic {
    let [(x0, y0), (x1, y1), (x2, y2)] = points;
    let (s0, s1, s2) = (x0 * x0, x1 * x1, x2 * x2);

    let det = s0 * (x1 - x2) - s1 * (x0 - x2) + s2 * (x0 - x1);

    if det != 0.0 {
        let adet = y0 * (x1 - x2) - y1 * (x0 - x2) + y2 * (x0 - x1);
        let bdet = s0 * (y1 - y2) - s1 * (y0 - y2) + s2 * (y0 - y1);
        let cdet = s0 * (x1 * y2 - x2 * y1) - s1 * (x0 * y2 - x2 * y0) + s2 * (x0 * y1 - x1 * y0);
        Quadratic {
            a: adet / det,
            b: bdet / det,
            c: cdet / det,
        }
    } else if x0 != x2 {
        trace!("singular fit, falling back to first/third point coefficients");
        Quadratic {
            a: 0.0,
            b: y0 - y2,
            c: y2 * x0 - y0 * x2 / (x0 - x2),
        }
    } else {
        trace!("singular fit, falling back to mean ordinate");
        Quadratic {
            a: 0.0,
            b: 0.0,
            c: (y0 + y1 + y2) / 3.0,
        }
    }
}

/// Outcome of a successful 1-D maximization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Maximum {
    /// Estimated maximizer.
    pub x: f64,
    /// Objective evaluated at `x`.
    pub value: f64,
    /// Final bracket abscissae, ordered along the search direction.
    pub bracket: [f64; 3],
    /// Number of objective evaluations.
    pub evaluations: usize,
}

/// Bracket-and-refine line search with a fixed step.
#[derive(Debug, Clone, Copy)]
pub struct LineSearch {
    /// Maximum number of times the bracket may be pushed forward.
    pub max_steps: usize,
}

impl Default for LineSearch {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_BRACKET_STEPS,
        }
    }
}

impl LineSearch {
    pub fn new(max_steps: usize) -> Self {
        Self { max_steps }
    }

    /// Walk from `x0` in increments of `step` (reversing direction if the
    /// first move goes downhill) until three consecutive samples stop
    /// increasing, then return the vertex of the parabola through them.
    ///
    /// # Errors
    /// - `InvalidInput` if `step` is zero or not finite.
    /// - `NoConvergence` if the bracket is pushed `max_steps` times without
    ///   enclosing a maximum.
    #[instrument(level = "debug", skip(self, f))]
    pub fn maximize<F>(&self, x0: f64, step: f64, mut f: F) -> DomainResult<Maximum>
    where
        F: FnMut(f64) -> f64,
    {
        if !step.is_finite() || step == 0.0 {
            return Err(DomainError::InvalidInput(format!(
                "search step must be finite and non-zero, got {}",
                step
            )));
        }

        let mut dx = step;
        let mut xs = [x0, x0 + dx, 0.0];
        let mut ys = [f(xs[0]), f(xs[1]), 0.0];
        let mut evaluations = 2;

        if ys[1] <= ys[0] {
            dx = -dx;
            xs.swap(0, 1);
            ys.swap(0, 1);
        }

        xs[2] = xs[1] + dx;
        ys[2] = f(xs[2]);
        evaluations += 1;

        let mut extensions = 0;
        while ys[1] < ys[2] {
            if extensions >= self.max_steps {
                return Err(DomainError::NoConvergence {
                    iterations: extensions,
                    last_x: xs[2],
                });
            }
            xs = [xs[1], xs[2], xs[2] + dx];
            ys = [ys[1], ys[2], f(xs[2])];
            evaluations += 1;
            extensions += 1;
        }
        debug!(?xs, ?ys, extensions, "maximum bracketed");

        let fit = fit_quadratic([(xs[0], ys[0]), (xs[1], ys[1]), (xs[2], ys[2])]);
        let x = match fit.vertex() {
            Some(v) if fit.a < 0.0 && v.is_finite() => v,
            // no downward curvature: the middle sample is the best one seen
            _ => xs[1],
        };
        let value = f(x);
        evaluations += 1;

        Ok(Maximum {
            x,
            value,
            bracket: xs,
            evaluations,
        })
    }
}

/// [`LineSearch::maximize`] with the default bracket-growth ceiling.
pub fn maximize_1d<F>(x0: f64, step: f64, f: F) -> DomainResult<Maximum>
where
    F: FnMut(f64) -> f64,
{
    LineSearch::default().maximize(x0, step, f)
}
