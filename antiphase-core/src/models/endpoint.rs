use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::SessionError;

/// Direction of a logical endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    /// Prefix used in the wire form of an endpoint id.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Output => "Output",
        }
    }
}

/// Structured endpoint identifier.
///
/// Formats to and parses from `input_<driverId>` / `output_<driverId>`.
/// Only the leading prefix is significant; the driver id may itself
/// contain underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointId {
    direction: Direction,
    driver_id: String,
}

impl EndpointId {
    pub fn new(direction: Direction, driver_id: impl Into<String>) -> Self {
        Self {
            direction,
            driver_id: driver_id.into(),
        }
    }

    pub fn input(driver_id: impl Into<String>) -> Self {
        Self::new(Direction::Input, driver_id)
    }

    pub fn output(driver_id: impl Into<String>) -> Self {
        Self::new(Direction::Output, driver_id)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn driver_id(&self) -> &str {
        &self.driver_id
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.direction.prefix(), self.driver_id)
    }
}

impl FromStr for EndpointId {
    type Err = SessionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (direction, driver_id) = if let Some(rest) = raw.strip_prefix("input_") {
            (Direction::Input, rest)
        } else if let Some(rest) = raw.strip_prefix("output_") {
            (Direction::Output, rest)
        } else {
            return Err(SessionError::InvalidEndpointId(raw.to_string()));
        };

        if driver_id.is_empty() {
            return Err(SessionError::InvalidEndpointId(raw.to_string()));
        }
        Ok(Self::new(direction, driver_id))
    }
}

impl Serialize for EndpointId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EndpointId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Raw driver descriptor as reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverDescriptor {
    pub id: String,
    pub name: String,
    pub is_simulated: bool,
    pub input_channels: Option<u16>,
    pub output_channels: Option<u16>,
    pub preferred_buffer_size: Option<u32>,
}

impl DriverDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_simulated: false,
            input_channels: None,
            output_channels: None,
            preferred_buffer_size: None,
        }
    }

    pub fn simulated(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            is_simulated: true,
            ..Self::new(id, name)
        }
    }

    /// A descriptor without a usable name cannot be offered to clients.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// A logical audio endpoint exposed to clients.
///
/// Every driver yields one input and one output endpoint sharing
/// `driver_id` and `driver_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub id: EndpointId,
    pub display_name: String,
    pub direction: Direction,
    pub driver_id: String,
    pub driver_name: String,
    pub is_simulated: bool,
}

impl Endpoint {
    pub fn new(direction: Direction, driver_id: &str, driver_name: &str, is_simulated: bool) -> Self {
        Self {
            id: EndpointId::new(direction, driver_id),
            display_name: format!("{} ({})", driver_name, direction.label()),
            direction,
            driver_id: driver_id.to_string(),
            driver_name: driver_name.to_string(),
            is_simulated,
        }
    }
}

/// What a backend reports after a driver has been opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverInfo {
    pub driver_name: String,
    pub input_channels: u16,
    pub output_channels: u16,
    pub buffer_size: u32,
    pub sample_rate: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_id_round_trips_wire_form() {
        let id: EndpointId = "output_driver_A".parse().unwrap();
        assert_eq!(id.direction(), Direction::Output);
        assert_eq!(id.driver_id(), "driver_A");
        assert_eq!(id.to_string(), "output_driver_A");
    }

    #[test]
    fn endpoint_id_rejects_unknown_prefix() {
        assert!(matches!(
            "speaker_1".parse::<EndpointId>(),
            Err(SessionError::InvalidEndpointId(_))
        ));
        assert!("input_".parse::<EndpointId>().is_err());
        assert!("".parse::<EndpointId>().is_err());
    }

    #[test]
    fn endpoint_serializes_camel_case_with_string_id() {
        let endpoint = Endpoint::new(Direction::Input, "sim", "Simulated Driver", true);
        let json = serde_json::to_value(&endpoint).unwrap();

        assert_eq!(json["id"], "input_sim");
        assert_eq!(json["displayName"], "Simulated Driver (Input)");
        assert_eq!(json["direction"], "input");
        assert_eq!(json["driverName"], "Simulated Driver");
        assert_eq!(json["isSimulated"], true);
    }

    #[test]
    fn descriptor_with_blank_name_is_invalid() {
        assert!(!DriverDescriptor::new("0", "   ").is_valid());
        assert!(DriverDescriptor::new("", "Focusrite").is_valid());
    }
}
