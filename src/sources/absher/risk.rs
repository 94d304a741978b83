//! Additive risk scoring and threshold classification.

use crate::core::event::{Action, IpRisk, KnownDevice, RiskLevel};

const UNKNOWN_DEVICE_POINTS: u32 = 40;
const NIGHT_POINTS: u32 = 20;
const AWAY_FROM_HOME_POINTS: u32 = 30;
const MEDIUM_IP_POINTS: u32 = 20;
const HIGH_IP_POINTS: u32 = 40;
const FIRST_TIME_SERVICE_POINTS: u32 = 10;

/// Events before this hour count as night activity.
const NIGHT_END_HOUR: u32 = 6;

/// Largest score the additive rules can produce.
#[cfg(test)]
const MAX_RISK_SCORE: u32 = UNKNOWN_DEVICE_POINTS
    + NIGHT_POINTS
    + AWAY_FROM_HOME_POINTS
    + HIGH_IP_POINTS
    + FIRST_TIME_SERVICE_POINTS;

/// Inputs to the scorer for a single event.
#[derive(Debug, Clone, Copy)]
pub struct RiskSignals<'a> {
    pub is_known: KnownDevice,
    /// Time of day as `HH:MM`.
    pub time: &'a str,
    pub home_city: &'a str,
    pub location: &'a str,
    pub ip_risk: IpRisk,
    /// Always false for login events.
    pub first_time_service: bool,
}

/// Sums the risk contributions for one event.
pub fn calculate_risk(signals: &RiskSignals<'_>) -> u32 {
    let mut score = 0;
    if signals.is_known == KnownDevice::No {
        score += UNKNOWN_DEVICE_POINTS;
    }
    if is_night(signals.time) {
        score += NIGHT_POINTS;
    }
    if signals.location != signals.home_city {
        score += AWAY_FROM_HOME_POINTS;
    }
    score += match signals.ip_risk {
        IpRisk::Low => 0,
        IpRisk::Medium => MEDIUM_IP_POINTS,
        IpRisk::High => HIGH_IP_POINTS,
    };
    if signals.first_time_service {
        score += FIRST_TIME_SERVICE_POINTS;
    }
    score
}

/// Maps a raw score to its level and recommended action.
pub fn classify_risk(score: u32) -> (RiskLevel, Action) {
    match score {
        0..=30 => (RiskLevel::Low, Action::Allow),
        31..=60 => (RiskLevel::Medium, Action::Otp),
        61..=80 => (RiskLevel::High, Action::Fingerprint),
        _ => (RiskLevel::Critical, Action::CallUser),
    }
}

/// Returns whether an `HH:MM` time falls in the night window.
///
/// Unparseable times are treated as daytime.
pub fn is_night(time: &str) -> bool {
    time.split(':')
        .next()
        .and_then(|hour| hour.trim().parse::<u32>().ok())
        .map(|hour| hour < NIGHT_END_HOUR)
        .unwrap_or(false)
}
