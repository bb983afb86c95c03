use serde::{Deserialize, Serialize};

/// Cigarettes per day per AQI point (Berkeley Earth's PM2.5 rule of thumb).
pub const CIGARETTES_PER_AQI_POINT: f64 = 0.04631;

const HEALTHY_CEILING: u32 = 50;
const CAUTION_CEILING: u32 = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub aqi: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Healthy,
    Caution,
    Severe,
}

impl Reading {
    pub fn new(aqi: u32) -> Self {
        Self { aqi }
    }

    pub fn severity(self) -> Severity {
        if self.aqi <= HEALTHY_CEILING {
            Severity::Healthy
        } else if self.aqi <= CAUTION_CEILING {
            Severity::Caution
        } else {
            Severity::Severe
        }
    }

    pub fn cigarette_equivalent(self) -> f64 {
        f64::from(self.aqi) * CIGARETTES_PER_AQI_POINT
    }
}
