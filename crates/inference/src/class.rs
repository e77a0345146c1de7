//! Class taxonomy of the road damage model (RDD labels).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageClass {
    LongitudinalCrack,
    TransverseCrack,
    AlligatorCrack,
    Pothole,
}

impl DamageClass {
    pub const ALL: [DamageClass; 4] = [
        DamageClass::LongitudinalCrack,
        DamageClass::TransverseCrack,
        DamageClass::AlligatorCrack,
        DamageClass::Pothole,
    ];

    /// Map a model class index; `None` for ids outside the known taxonomy.
    pub fn from_id(class_id: u32) -> Option<Self> {
        Self::ALL.get(class_id as usize).copied()
    }

    pub fn id(&self) -> u32 {
        match self {
            DamageClass::LongitudinalCrack => 0,
            DamageClass::TransverseCrack => 1,
            DamageClass::AlligatorCrack => 2,
            DamageClass::Pothole => 3,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DamageClass::LongitudinalCrack => "D00",
            DamageClass::TransverseCrack => "D10",
            DamageClass::AlligatorCrack => "D20",
            DamageClass::Pothole => "D40",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DamageClass::LongitudinalCrack => "longitudinal crack",
            DamageClass::TransverseCrack => "transverse crack",
            DamageClass::AlligatorCrack => "alligator crack",
            DamageClass::Pothole => "pothole",
        }
    }

    pub fn risk(&self) -> RiskLevel {
        match self {
            DamageClass::LongitudinalCrack | DamageClass::TransverseCrack => RiskLevel::Medium,
            DamageClass::AlligatorCrack | DamageClass::Pothole => RiskLevel::High,
        }
    }
}

impl fmt::Display for DamageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.label())
    }
}
