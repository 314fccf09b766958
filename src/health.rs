use serde::{Deserialize, Serialize};

/// Epidemic state of one grid cell. Cells only move forward:
/// Susceptible, then Infected, then Recovered, which is terminal.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum HealthStatus {
    #[default]
    Susceptible,
    Infected,
    Recovered,
}

impl HealthStatus {
    pub fn is_susceptible(self) -> bool {
        self == HealthStatus::Susceptible
    }
    pub fn is_infected(self) -> bool {
        self == HealthStatus::Infected
    }
    pub fn is_recovered(self) -> bool {
        self == HealthStatus::Recovered
    }

    /// Code used by the grid export: 0, 1 and 2 in state order.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            HealthStatus::Susceptible => 0,
            HealthStatus::Infected => 1,
            HealthStatus::Recovered => 2,
        }
    }

    /// Whether `self -> next` is an allowed (or no-op) transition.
    #[must_use]
    pub fn can_become(self, next: HealthStatus) -> bool {
        self.code() <= next.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_move_forward() {
        use HealthStatus::*;
        assert!(Susceptible.can_become(Infected));
        assert!(Infected.can_become(Recovered));
        assert!(Susceptible.can_become(Recovered));
        assert!(Recovered.can_become(Recovered));
        assert!(!Recovered.can_become(Infected));
        assert!(!Recovered.can_become(Susceptible));
        assert!(!Infected.can_become(Susceptible));
    }

    #[test]
    fn default_is_susceptible() {
        assert!(HealthStatus::default().is_susceptible());
    }
}
