use serde::{Deserialize, Serialize};

/// Which rotation curve drives the star field.
///
/// `Observed` is the flat curve measured in real spiral galaxies,
/// `Expected` is the Keplerian falloff Newtonian gravity predicts from the
/// visible mass alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationMode {
    #[default]
    Observed,
    Expected,
}

impl RotationMode {
    pub fn toggled(self) -> Self {
        match self {
            RotationMode::Observed => RotationMode::Expected,
            RotationMode::Expected => RotationMode::Observed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RotationMode::Observed => "observed",
            RotationMode::Expected => "expected",
        }
    }

    /// Caption shown on the comparison chart.
    pub fn label(self) -> &'static str {
        match self {
            RotationMode::Observed => "SHOWING: OBSERVED",
            RotationMode::Expected => "SHOWING: EXPECTED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_observed() {
        assert_eq!(RotationMode::default(), RotationMode::Observed);
    }

    #[test]
    fn test_toggle_is_an_involution() {
        let mode = RotationMode::Observed;
        assert_eq!(mode.toggled(), RotationMode::Expected);
        assert_eq!(mode.toggled().toggled(), mode);
    }
}
