use serde::{Deserialize, Serialize};

use super::hit_window::{HitWindow, Rating};

/// How a hit turns into points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreCurve {
    /// Fixed points per tier, read from the hit window.
    Table,
    /// Logistic falloff over |timing difference|.
    Timing {
        max_score: f64,
        scoring_offset: f64,
        scoring_slope: f64,
        min_score: f64,
        perfect_threshold_ms: f64,
    },
}

impl ScoreCurve {
    pub const fn timing() -> Self {
        ScoreCurve::Timing {
            max_score: 500.0,
            scoring_offset: 54.99,
            scoring_slope: 0.080,
            min_score: 9.0,
            perfect_threshold_ms: 5.0,
        }
    }

    pub fn points(&self, window: &HitWindow, rating: Rating, time_diff: f64) -> i64 {
        match *self {
            ScoreCurve::Table => window.tier(rating).map_or(0, |tier| tier.points.max(0)),
            ScoreCurve::Timing {
                max_score,
                scoring_offset,
                scoring_slope,
                min_score,
                perfect_threshold_ms,
            } => {
                let diff = time_diff.abs();
                if diff < perfect_threshold_ms {
                    return max_score as i64;
                }
                let factor = 1.0 - 1.0 / (1.0 + (-scoring_slope * (diff - scoring_offset)).exp());
                ((max_score * factor + min_score).floor() as i64).max(0)
            }
        }
    }
}

impl Default for ScoreCurve {
    fn default() -> Self {
        Self::timing()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub start: f64,
    pub max: f64,
    pub miss_damage: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { start: 1.0, max: 2.0, miss_damage: 0.1 }
    }
}

/// What one judgment changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingDelta {
    pub rating: Option<Rating>,
    pub points: i64,
    pub combo: u32,
    pub combo_broken: bool,
    pub health: f64,
    pub health_depleted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSnapshot {
    pub score: i64,
    pub combo: u32,
    pub max_combo: u32,
    pub sick: u32,
    pub good: u32,
    pub bad: u32,
    pub shit: u32,
    pub misses: u32,
    pub accuracy: f64,
    pub health: f64,
}

/// Score, combo, accuracy and health of one player.
#[derive(Debug, Clone)]
pub struct RatingAggregator {
    window: HitWindow,
    curve: ScoreCurve,
    health_config: HealthConfig,
    score: i64,
    combo: u32,
    max_combo: u32,
    counts: [u32; 4],
    miss_count: u32,
    weighted_hits: f64,
    judged: u32,
    health: f64,
}

impl RatingAggregator {
    pub fn new(window: HitWindow, curve: ScoreCurve, health_config: HealthConfig) -> Self {
        let health = health_config.start.clamp(0.0, health_config.max);
        Self {
            window,
            curve,
            health_config,
            score: 0,
            combo: 0,
            max_combo: 0,
            counts: [0; 4],
            miss_count: 0,
            weighted_hits: 0.0,
            judged: 0,
            health,
        }
    }

    /// The worst tier counts as a hit but breaks the combo.
    pub fn process_hit(&mut self, rating: Rating, time_diff: f64) -> RatingDelta {
        let points = self.curve.points(&self.window, rating, time_diff);
        self.score += points;

        let combo_broken = self.window.is_worst(rating);
        if combo_broken {
            self.combo = 0;
        } else {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        }

        self.counts[rating.index()] += 1;
        self.judged += 1;
        let (weight, health_change) = self
            .window
            .tier(rating)
            .map_or((0.0, 0.0), |tier| (tier.accuracy, tier.health));
        self.weighted_hits += weight;

        let health_depleted = self.change_health(health_change);
        RatingDelta {
            rating: Some(rating),
            points,
            combo: self.combo,
            combo_broken,
            health: self.health,
            health_depleted,
        }
    }

    /// Costs combo, health and accuracy. Score is left alone.
    pub fn process_miss(&mut self) -> RatingDelta {
        self.miss_count += 1;
        self.judged += 1;
        let combo_broken = self.combo > 0;
        self.combo = 0;
        let health_depleted = self.change_health(-self.health_config.miss_damage);
        RatingDelta {
            rating: None,
            points: 0,
            combo: 0,
            combo_broken,
            health: self.health,
            health_depleted,
        }
    }

    /// Returns true when this change took health to zero.
    fn change_health(&mut self, amount: f64) -> bool {
        let before = self.health;
        self.health = (self.health + amount).clamp(0.0, self.health_config.max);
        before > 0.0 && self.health <= 0.0
    }

    pub fn accuracy(&self) -> f64 {
        if self.judged == 0 {
            return 0.0;
        }
        (self.weighted_hits / f64::from(self.judged)).clamp(0.0, 1.0)
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn count(&self, rating: Rating) -> u32 {
        self.counts[rating.index()]
    }

    pub fn miss_count(&self) -> u32 {
        self.miss_count
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn max_health(&self) -> f64 {
        self.health_config.max
    }

    pub fn window(&self) -> &HitWindow {
        &self.window
    }

    pub fn snapshot(&self) -> RatingSnapshot {
        RatingSnapshot {
            score: self.score,
            combo: self.combo,
            max_combo: self.max_combo,
            sick: self.count(Rating::Sick),
            good: self.count(Rating::Good),
            bad: self.count(Rating::Bad),
            shit: self.count(Rating::Shit),
            misses: self.miss_count,
            accuracy: self.accuracy(),
            health: self.health,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.window.clone(), self.curve, self.health_config);
    }
}

impl Default for RatingAggregator {
    fn default() -> Self {
        Self::new(HitWindow::default(), ScoreCurve::default(), HealthConfig::default())
    }
}
