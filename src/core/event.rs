use serde::{Deserialize, Serialize};

/// Service name used for the entry event of every user block.
pub const LOGIN_SERVICE: &str = "Login";

/// One row of the generated dataset.
///
/// Field order matches the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "UserID")]
    pub user_id: u32,
    /// Home city of the user.
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Age")]
    pub age: u8,
    /// Device fingerprint used for the event (`fp_<12 hex>`).
    #[serde(rename = "DeviceID")]
    pub device_id: String,
    /// `Login` or one of the portal services.
    #[serde(rename = "Service")]
    pub service: String,
    /// Time of day (`HH:MM`).
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "IP_Risk")]
    pub ip_risk: IpRisk,
    /// City the event originated from; may differ from `city`.
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "IsKnownDevice")]
    pub is_known_device: KnownDevice,
    #[serde(rename = "Risk_Score")]
    pub risk_score: u32,
    #[serde(rename = "Risk_Level")]
    pub risk_level: RiskLevel,
    #[serde(rename = "Action")]
    pub action: Action,
}

impl Event {
    #[cfg(test)]
    pub(crate) fn is_login(&self) -> bool {
        self.service == LOGIN_SERVICE
    }
}

/// Reputation tier of the source IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpRisk {
    Low,
    Medium,
    High,
}

impl IpRisk {
    pub const ALL: [IpRisk; 3] = [IpRisk::Low, IpRisk::Medium, IpRisk::High];
}

/// Whether the device belongs to the user's registered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnownDevice {
    Yes,
    No,
}

impl From<bool> for KnownDevice {
    fn from(known: bool) -> Self {
        if known {
            KnownDevice::Yes
        } else {
            KnownDevice::No
        }
    }
}

/// Four-tier risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

/// Recommended response for a risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Allow,
    #[serde(rename = "OTP")]
    Otp,
    Fingerprint,
    #[serde(rename = "Call_User")]
    CallUser,
}
