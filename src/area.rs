use crate::error::CampusError;
use crate::grid::{Grid, GridCoord};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The kind of place a grid cell belongs to.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub enum AreaCategory {
    Dorm,
    Classroom,
    DiningHall,
    Outdoor,
}

impl AreaCategory {
    pub const ALL: [AreaCategory; 4] = [
        AreaCategory::Dorm,
        AreaCategory::Classroom,
        AreaCategory::DiningHall,
        AreaCategory::Outdoor,
    ];

    /// Stable integer code, used when exporting the area grid.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            AreaCategory::Dorm => 0,
            AreaCategory::Classroom => 1,
            AreaCategory::DiningHall => 2,
            AreaCategory::Outdoor => 3,
        }
    }

    /// Human readable label for map overlays.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AreaCategory::Dorm => "Dorms",
            AreaCategory::Classroom => "Classrooms",
            AreaCategory::DiningHall => "Dining Halls",
            AreaCategory::Outdoor => "Outdoor",
        }
    }

    /// Where the presentation layer anchors this area's label on an
    /// `grid_size` map: the middle of the area's quadrant.
    #[must_use]
    pub fn label_anchor(self, grid_size: usize) -> GridCoord {
        let near = grid_size / 4;
        let far = 3 * grid_size / 4;
        match self {
            AreaCategory::Dorm => GridCoord::new(near, near),
            AreaCategory::Classroom => GridCoord::new(near, far),
            AreaCategory::DiningHall => GridCoord::new(far, near),
            AreaCategory::Outdoor => GridCoord::new(far, far),
        }
    }
}

impl Display for AreaCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AreaCategory {
    type Err = CampusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dorm" | "dorms" => Ok(AreaCategory::Dorm),
            "class" | "classroom" | "classrooms" => Ok(AreaCategory::Classroom),
            "dining" | "dining_hall" | "dininghall" | "dining-hall" => Ok(AreaCategory::DiningHall),
            "outdoor" | "outside" => Ok(AreaCategory::Outdoor),
            other => Err(CampusError::InvalidConfiguration(format!("unknown area '{other}'"))),
        }
    }
}

/// Splits an `grid_size` x `grid_size` campus into four quadrants:
///
/// ```text
///  Dorm       | Classroom
///  -----------+----------
///  DiningHall | Outdoor
/// ```
///
/// The cut sits at `grid_size / 2`, so on odd sizes the bottom and right
/// halves are one cell wider.
pub fn assign_areas(grid_size: usize) -> Grid<AreaCategory> {
    let mid = grid_size / 2;
    Grid::from_fn(grid_size, |GridCoord { row, col }| match (row < mid, col < mid) {
        (true, true) => AreaCategory::Dorm,
        (true, false) => AreaCategory::Classroom,
        (false, true) => AreaCategory::DiningHall,
        (false, false) => AreaCategory::Outdoor,
    })
}

/// Marks each cell vaccinated independently with probability `rate`.
pub fn assign_vaccination<R: Rng + ?Sized>(grid_size: usize, rate: f64, rng: &mut R) -> Grid<bool> {
    Grid::from_fn(grid_size, |_| rng.random::<f64>() < rate)
}

/// The static part of a run: who is where, and who is vaccinated.
#[derive(Clone, Debug, PartialEq)]
pub struct CampusLayout {
    pub areas: Grid<AreaCategory>,
    pub vaccinated: Grid<bool>,
}

impl CampusLayout {
    pub fn generate<R: Rng + ?Sized>(grid_size: usize, vaccination_rate: f64, rng: &mut R) -> Self {
        CampusLayout {
            areas: assign_areas(grid_size),
            vaccinated: assign_vaccination(grid_size, vaccination_rate, rng),
        }
    }

    #[must_use]
    pub fn grid_size(&self) -> usize {
        self.areas.size()
    }
}
