use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Judgment tiers, best first. A miss is not a tier: it is whatever falls
/// outside the widest window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Sick,
    Good,
    Bad,
    Shit,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Sick, Rating::Good, Rating::Bad, Rating::Shit];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Rating::Sick => "sick",
            Rating::Good => "good",
            Rating::Bad => "bad",
            Rating::Shit => "shit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub rating: Rating,
    /// Largest |timing difference| in ms still classified into this tier.
    pub max_ms: f64,
    /// Points awarded by [`ScoreCurve::Table`](super::rating::ScoreCurve::Table).
    pub points: i64,
    /// Weight toward accuracy, 0.0..=1.0.
    pub accuracy: f64,
    pub health: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum HitWindowError {
    #[error("hit window needs at least one tier")]
    Empty,
    #[error("tier {rating:?} ({max_ms}ms) must be wider than the tier before it")]
    NotIncreasing { rating: Rating, max_ms: f64 },
    #[error("tier {0:?} appears more than once")]
    Duplicate(Rating),
    #[error("tier {rating:?} has invalid threshold {max_ms}")]
    InvalidThreshold { rating: Rating, max_ms: f64 },
    #[error("tier {rating:?} has accuracy weight {accuracy} outside 0..=1")]
    InvalidAccuracy { rating: Rating, accuracy: f64 },
}

/// Ordered timing windows with strictly increasing thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Tier>", into = "Vec<Tier>")]
pub struct HitWindow {
    tiers: Vec<Tier>,
}

impl HitWindow {
    pub fn new(tiers: Vec<Tier>) -> Result<Self, HitWindowError> {
        if tiers.is_empty() {
            return Err(HitWindowError::Empty);
        }
        let mut seen = [false; 4];
        let mut previous: Option<f64> = None;
        for tier in &tiers {
            if !(tier.max_ms.is_finite() && tier.max_ms > 0.0) {
                return Err(HitWindowError::InvalidThreshold {
                    rating: tier.rating,
                    max_ms: tier.max_ms,
                });
            }
            if !(0.0..=1.0).contains(&tier.accuracy) {
                return Err(HitWindowError::InvalidAccuracy {
                    rating: tier.rating,
                    accuracy: tier.accuracy,
                });
            }
            if std::mem::replace(&mut seen[tier.rating.index()], true) {
                return Err(HitWindowError::Duplicate(tier.rating));
            }
            if previous.is_some_and(|p| tier.max_ms <= p) {
                return Err(HitWindowError::NotIncreasing {
                    rating: tier.rating,
                    max_ms: tier.max_ms,
                });
            }
            previous = Some(tier.max_ms);
        }
        Ok(Self { tiers })
    }

    /// Default tier weights with custom thresholds for sick/good/bad/shit.
    pub fn from_thresholds(thresholds: [f64; 4]) -> Result<Self, HitWindowError> {
        let tiers = Self::default()
            .tiers
            .into_iter()
            .zip(thresholds)
            .map(|(tier, max_ms)| Tier { max_ms, ..tier })
            .collect();
        Self::new(tiers)
    }

    /// First tier whose threshold the difference does not exceed.
    pub fn classify(&self, time_diff: f64) -> Option<Rating> {
        let diff = time_diff.abs();
        self.tiers
            .iter()
            .find(|tier| diff <= tier.max_ms)
            .map(|tier| tier.rating)
    }

    pub fn tier(&self, rating: Rating) -> Option<&Tier> {
        self.tiers.iter().find(|tier| tier.rating == rating)
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Threshold of the last tier; anything later is a miss.
    pub fn widest_ms(&self) -> f64 {
        self.worst().max_ms
    }

    pub fn worst(&self) -> &Tier {
        // `new` rejects empty windows.
        &self.tiers[self.tiers.len() - 1]
    }

    pub fn is_worst(&self, rating: Rating) -> bool {
        self.worst().rating == rating
    }
}

impl Default for HitWindow {
    fn default() -> Self {
        Self {
            tiers: vec![
                Tier { rating: Rating::Sick, max_ms: 45.0, points: 350, accuracy: 1.0, health: 0.04 },
                Tier { rating: Rating::Good, max_ms: 95.0, points: 200, accuracy: 0.75, health: 0.02 },
                Tier { rating: Rating::Bad, max_ms: 140.0, points: 100, accuracy: 0.5, health: 0.005 },
                Tier { rating: Rating::Shit, max_ms: 180.0, points: 50, accuracy: 0.0, health: -0.02 },
            ],
        }
    }
}

impl TryFrom<Vec<Tier>> for HitWindow {
    type Error = HitWindowError;

    fn try_from(tiers: Vec<Tier>) -> Result<Self, Self::Error> {
        Self::new(tiers)
    }
}

impl From<HitWindow> for Vec<Tier> {
    fn from(window: HitWindow) -> Self {
        window.tiers
    }
}
