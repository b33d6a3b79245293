/// Composite score weights. Fixed configuration, not per-request state:
/// `total = Σ(componentᵢ × weightᵢ)` over the four 0–100 components.
pub const SCORE_WEIGHTS: Weights = Weights {
    skills: 0.35,
    experience: 0.30,
    warmth: 0.20,
    timing: 0.15,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub skills: f64,
    pub experience: f64,
    pub warmth: f64,
    pub timing: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.skills + self.experience + self.warmth + self.timing
    }

    pub fn total(&self, skills: f64, experience: f64, warmth: f64, timing: f64) -> f64 {
        skills * self.skills + experience * self.experience + warmth * self.warmth + timing * self.timing
    }
}
