//! Wizard steps

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnboardingStep {
    Contact,
    Company,
    Locations,
    DeviceSelection,
    Fees,
    AuthorizedPersons,
    ActualOwners,
    Consents,
}

impl OnboardingStep {
    pub const ALL: [OnboardingStep; 8] = [
        Self::Contact,
        Self::Company,
        Self::Locations,
        Self::DeviceSelection,
        Self::Fees,
        Self::AuthorizedPersons,
        Self::ActualOwners,
        Self::Consents,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Stable camelCase name, as used in field configuration
    pub fn key(self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Company => "company",
            Self::Locations => "locations",
            Self::DeviceSelection => "deviceSelection",
            Self::Fees => "fees",
            Self::AuthorizedPersons => "authorizedPersons",
            Self::ActualOwners => "actualOwners",
            Self::Consents => "consents",
        }
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for OnboardingStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|step| step.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown step: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trip() {
        for step in OnboardingStep::ALL {
            assert_eq!(OnboardingStep::from_index(step.index()), Some(step));
        }
        assert_eq!(OnboardingStep::from_index(OnboardingStep::COUNT), None);
    }

    #[test]
    fn parses_keys() {
        assert_eq!("fees".parse::<OnboardingStep>(), Ok(OnboardingStep::Fees));
        assert_eq!(
            "deviceselection".parse::<OnboardingStep>(),
            Ok(OnboardingStep::DeviceSelection)
        );
        assert!("payment".parse::<OnboardingStep>().is_err());
    }
}
