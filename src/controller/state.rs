use std::fmt;

/// Whether motion events trigger captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurveillanceState {
    #[default]
    Disarmed,
    Armed,
}

impl SurveillanceState {
    pub fn is_armed(&self) -> bool {
        matches!(self, SurveillanceState::Armed)
    }
}

impl fmt::Display for SurveillanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurveillanceState::Disarmed => write!(f, "disarmed"),
            SurveillanceState::Armed => write!(f, "armed"),
        }
    }
}
