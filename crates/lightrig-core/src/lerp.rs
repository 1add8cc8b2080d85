//! Interpolation helpers and a time-driven animator.

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp `value` into `lo..=hi`. NaN maps to `lo`.
pub fn clamp(value: f32, lo: f32, hi: f32) -> f32 {
    if value.is_nan() {
        lo
    } else {
        value.max(lo).min(hi)
    }
}

/// Values that can be blended toward a target.
pub trait Lerp: Clone {
    /// Blend `self` toward `other` by `t` in `0.0..=1.0`.
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        lerp(*self, *other, t)
    }
}

impl Lerp for crate::Color {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        crate::Color::lerp(self, other, t)
    }
}

/// Animates between values over a fixed duration.
///
/// Time is supplied by the caller so the animator follows frame time rather
/// than wall-clock time.
#[derive(Debug, Clone)]
pub struct LerpAnimator<T: Lerp> {
    from: T,
    target: T,
    duration: f64,
    started_at: f64,
}

impl<T: Lerp> LerpAnimator<T> {
    /// Start at `initial` with no transition pending.
    pub fn new(initial: T, duration: f64) -> Self {
        Self {
            from: initial.clone(),
            target: initial,
            duration,
            started_at: f64::NEG_INFINITY,
        }
    }

    /// Begin a transition from the current rendered value toward `target`.
    pub fn push(&mut self, target: T, now: f64) {
        self.from = self.render(now);
        self.target = target;
        self.started_at = now;
    }

    /// Progress of the current transition in `0.0..=1.0`.
    pub fn progress(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.started_at) / self.duration).clamp(0.0, 1.0) as f32
    }

    /// Value at time `now`.
    pub fn render(&self, now: f64) -> T {
        self.from.lerp(&self.target, self.progress(now))
    }

    /// The value the animator is heading toward.
    pub fn target(&self) -> &T {
        &self.target
    }
}
