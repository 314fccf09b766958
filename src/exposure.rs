/*!

A single visitor's flu risk from where they have recently been.

Each visit to a campus area is appended to a history. The risk only looks at the last
[`EXPOSURE_WINDOW`] visits: the visit counts per area feed a fixed logistic score that gives the
cumulative probability `P` of catching the flu over that window. Spread evenly over the `k` visits
in the window, the chance of infection on any one visit is `1 - (1 - P)^(1/k)`.

An infection clears the history.

*/

use crate::{area::AreaCategory, logistic::sigmoid};
use log::debug;
use rand::Rng;
use serde::Serialize;

/// Number of most recent visits that contribute to the risk.
pub const EXPOSURE_WINDOW: usize = 5;

/// Coefficients of the cumulative exposure score.
#[derive(Copy, Clone, PartialEq, Debug, Serialize)]
pub struct ExposureCoefficients {
    pub intercept: f64,
    pub dorm: f64,
    pub classroom: f64,
    pub dining_hall: f64,
    pub outdoor: f64,
}

impl Default for ExposureCoefficients {
    fn default() -> Self {
        ExposureCoefficients {
            intercept: -5.0,
            dorm: 0.5,
            classroom: 0.3,
            dining_hall: 0.4,
            outdoor: 0.1,
        }
    }
}

impl ExposureCoefficients {
    fn weight(&self, area: AreaCategory) -> f64 {
        match area {
            AreaCategory::Dorm => self.dorm,
            AreaCategory::Classroom => self.classroom,
            AreaCategory::DiningHall => self.dining_hall,
            AreaCategory::Outdoor => self.outdoor,
        }
    }

    /// Cumulative infection probability for the given window totals.
    #[must_use]
    pub fn cumulative_probability(&self, totals: &AreaTotals) -> f64 {
        let log_odds = AreaCategory::ALL
            .iter()
            .fold(self.intercept, |acc, area| acc + self.weight(*area) * totals.get(*area) as f64);
        sigmoid(log_odds)
    }
}

/// Visit counts per area.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize)]
pub struct AreaTotals {
    pub dorm: usize,
    pub classroom: usize,
    pub dining_hall: usize,
    pub outdoor: usize,
}

impl AreaTotals {
    pub fn get(&self, area: AreaCategory) -> usize {
        match area {
            AreaCategory::Dorm => self.dorm,
            AreaCategory::Classroom => self.classroom,
            AreaCategory::DiningHall => self.dining_hall,
            AreaCategory::Outdoor => self.outdoor,
        }
    }

    fn add(&mut self, area: AreaCategory) {
        match area {
            AreaCategory::Dorm => self.dorm += 1,
            AreaCategory::Classroom => self.classroom += 1,
            AreaCategory::DiningHall => self.dining_hall += 1,
            AreaCategory::Outdoor => self.outdoor += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.dorm + self.classroom + self.dining_hall + self.outdoor
    }
}

#[derive(Copy, Clone, PartialEq, Debug, Serialize)]
pub enum ExposureOutcome {
    /// The visitor caught the flu; the history has been cleared.
    Infected,
    Healthy {
        totals: AreaTotals,
        cumulative_probability: f64,
    },
}

#[derive(Clone, Debug, Default)]
pub struct ExposureHistory {
    visits: Vec<AreaCategory>,
    coefficients: ExposureCoefficients,
}

impl ExposureHistory {
    pub fn new() -> Self {
        ExposureHistory::default()
    }

    pub fn with_coefficients(coefficients: ExposureCoefficients) -> Self {
        ExposureHistory {
            visits: Vec::new(),
            coefficients,
        }
    }

    pub fn visits(&self) -> &[AreaCategory] {
        &self.visits
    }

    pub fn reset(&mut self) {
        self.visits.clear();
    }

    /// Size of the current window, `min(visits, EXPOSURE_WINDOW)`.
    pub fn window(&self) -> usize {
        self.visits.len().min(EXPOSURE_WINDOW)
    }

    pub fn window_totals(&self) -> AreaTotals {
        let mut totals = AreaTotals::default();
        for area in &self.visits[self.visits.len() - self.window()..] {
            totals.add(*area);
        }
        totals
    }

    pub fn cumulative_probability(&self) -> f64 {
        self.coefficients.cumulative_probability(&self.window_totals())
    }

    /// Chance of infection on a single visit inside the current window.
    pub fn per_visit_probability(&self) -> f64 {
        let k = self.window();
        if k == 0 {
            return 0.0;
        }
        1.0 - (1.0 - self.cumulative_probability()).powf(1.0 / k as f64)
    }

    /// Records a visit to `area` and draws whether it made the visitor sick.
    pub fn visit<R: Rng + ?Sized>(&mut self, area: AreaCategory, rng: &mut R) -> ExposureOutcome {
        self.visits.push(area);
        let p = self.per_visit_probability();
        if rng.random::<f64>() < p {
            debug!("infected after {} visits (per-visit risk {:.4})", self.visits.len(), p);
            self.reset();
            return ExposureOutcome::Infected;
        }
        ExposureOutcome::Healthy {
            totals: self.window_totals(),
            cumulative_probability: self.cumulative_probability(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn empty_history_has_no_risk() {
        let history = ExposureHistory::new();
        assert_eq!(history.window(), 0);
        assert_eq!(history.per_visit_probability(), 0.0);
        assert!((history.cumulative_probability() - sigmoid(-5.0)).abs() < 1e-12);
    }

    #[test]
    fn window_keeps_last_five() {
        let mut history = ExposureHistory::new();
        let mut rng = StdRng::seed_from_u64(0);
        let coefficients = ExposureCoefficients { intercept: -1000.0, ..ExposureCoefficients::default() };
        history.coefficients = coefficients;

        for area in [
            AreaCategory::Outdoor,
            AreaCategory::Outdoor,
            AreaCategory::Dorm,
            AreaCategory::Dorm,
            AreaCategory::Classroom,
            AreaCategory::DiningHall,
            AreaCategory::Dorm,
        ] {
            assert!(matches!(history.visit(area, &mut rng), ExposureOutcome::Healthy { .. }));
        }

        let totals = history.window_totals();
        assert_eq!(totals, AreaTotals { dorm: 3, classroom: 1, dining_hall: 1, outdoor: 0 });
        assert_eq!(totals.total(), EXPOSURE_WINDOW);
        assert_eq!(history.visits().len(), 7);
    }

    #[test]
    fn per_visit_probability_compounds_to_cumulative() {
        let mut history = ExposureHistory::new();
        history.visits = vec![AreaCategory::Dorm, AreaCategory::DiningHall, AreaCategory::Dorm];

        let big_p = history.cumulative_probability();
        let expected = sigmoid(-5.0 + 0.5 * 2.0 + 0.4);
        assert!((big_p - expected).abs() < 1e-12);

        let p = history.per_visit_probability();
        let compounded = 1.0 - (1.0 - p).powi(3);
        assert!((compounded - big_p).abs() < 1e-12);
    }

    #[test]
    fn infection_resets_history() {
        let coefficients = ExposureCoefficients { intercept: 1000.0, ..ExposureCoefficients::default() };
        let mut history = ExposureHistory::with_coefficients(coefficients);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(history.visit(AreaCategory::Classroom, &mut rng), ExposureOutcome::Infected);
        assert!(history.visits().is_empty());
    }

    #[test]
    fn dorms_are_riskier_than_outdoors() {
        let mut dorms = ExposureHistory::new();
        dorms.visits = vec![AreaCategory::Dorm; 5];
        let mut outdoors = ExposureHistory::new();
        outdoors.visits = vec![AreaCategory::Outdoor; 5];
        assert!(dorms.per_visit_probability() > outdoors.per_visit_probability());
    }
}
