use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackCategory {
    BruteForce,
    Ddos,
    Malware,
    SqlInjection,
    PortScan,
    Intrusion,
}

impl AttackCategory {
    pub const ALL: [Self; 6] = [
        Self::BruteForce,
        Self::Ddos,
        Self::Malware,
        Self::SqlInjection,
        Self::PortScan,
        Self::Intrusion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BruteForce => "brute_force",
            Self::Ddos => "ddos",
            Self::Malware => "malware",
            Self::SqlInjection => "sql_injection",
            Self::PortScan => "port_scan",
            Self::Intrusion => "intrusion",
        }
    }

    /// Title-cased label used in feed entries, e.g. "Sql Injection".
    pub fn label(&self) -> &'static str {
        match self {
            Self::BruteForce => "Brute Force",
            Self::Ddos => "Ddos",
            Self::Malware => "Malware",
            Self::SqlInjection => "Sql Injection",
            Self::PortScan => "Port Scan",
            Self::Intrusion => "Intrusion",
        }
    }
}

impl fmt::Display for AttackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Country {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

/// Origins synthetic attacks are attributed to.
pub const COUNTRIES: [Country; 8] = [
    Country { name: "Russia", lat: 55.7558, lng: 37.6176 },
    Country { name: "China", lat: 39.9042, lng: 116.4074 },
    Country { name: "North Korea", lat: 39.0392, lng: 125.7625 },
    Country { name: "Iran", lat: 35.6892, lng: 51.3890 },
    Country { name: "Brazil", lat: -15.7942, lng: -47.8822 },
    Country { name: "India", lat: 20.5937, lng: 78.9629 },
    Country { name: "Turkey", lat: 38.9637, lng: 35.2433 },
    Country { name: "Vietnam", lat: 14.0583, lng: 108.2772 },
];

pub const SOURCE_ADDRESSES: [&str; 12] = [
    "192.168.1.100",
    "10.0.0.50",
    "172.16.0.25",
    "203.0.113.15",
    "198.51.100.8",
    "192.0.2.146",
    "203.0.113.73",
    "198.51.100.42",
    "172.16.254.1",
    "10.0.0.1",
    "192.168.0.1",
    "203.0.113.1",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackerRecord {
    pub ip: String,
    pub country: String,
    #[serde(rename = "type")]
    pub category: AttackCategory,
    pub attempts: u32,
    pub risk: RiskTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_names() {
        for category in AttackCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn test_risk_ordering() {
        assert!(RiskTier::Low < RiskTier::Medium);
        assert!(RiskTier::Medium < RiskTier::High);
    }

    #[test]
    fn test_attacker_record_shape() {
        let record = AttackerRecord {
            ip: "10.0.0.50".to_string(),
            country: "China".to_string(),
            category: AttackCategory::PortScan,
            attempts: 7,
            risk: RiskTier::Medium,
            last_seen: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "port_scan");
        assert_eq!(value["risk"], "medium");
        assert!(value.get("lastSeen").is_none());
    }
}
