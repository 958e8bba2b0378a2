use serde::{Deserialize, Serialize};

use crate::models::endpoint::Endpoint;
use crate::models::state::SessionStatus;

/// A client command, tagged by `op`.
///
/// ```json
/// {"op": "start", "gain": 1.0, "inputEndpointId": "input_sim", "outputEndpointId": "output_sim"}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ControlRequest {
    Discover,
    Status,
    #[serde(rename_all = "camelCase")]
    Initialize { endpoint_id: String },
    #[serde(rename_all = "camelCase")]
    Start {
        #[serde(default)]
        gain: Option<f64>,
        input_endpoint_id: String,
        output_endpoint_id: String,
    },
    Stop,
    SetGain { gain: f64 },
    InputLevel,
    Spectrum,
}

/// Outcome of a lifecycle command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            reason: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok()
        }
    }

    pub fn failed(reason: impl ToString) -> Self {
        Self {
            success: false,
            message: None,
            reason: Some(reason.to_string()),
        }
    }
}

/// Response body for each request kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ControlResponse {
    Devices { devices: Vec<Endpoint> },
    Status(SessionStatus),
    Ack(Ack),
    Level { level: f32 },
    Spectrum { data: Vec<f32> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_tagged_requests() {
        let request: ControlRequest = serde_json::from_value(json!({
            "op": "start",
            "inputEndpointId": "input_sim",
            "outputEndpointId": "output_sim"
        }))
        .unwrap();
        assert_eq!(
            request,
            ControlRequest::Start {
                gain: None,
                input_endpoint_id: "input_sim".into(),
                output_endpoint_id: "output_sim".into(),
            }
        );

        let request: ControlRequest =
            serde_json::from_value(json!({"op": "setGain", "gain": 0.5})).unwrap();
        assert_eq!(request, ControlRequest::SetGain { gain: 0.5 });

        let request: ControlRequest = serde_json::from_value(json!({"op": "inputLevel"})).unwrap();
        assert_eq!(request, ControlRequest::InputLevel);
    }

    #[test]
    fn rejects_unknown_op() {
        assert!(serde_json::from_value::<ControlRequest>(json!({"op": "reboot"})).is_err());
        assert!(serde_json::from_value::<ControlRequest>(json!({"op": "initialize"})).is_err());
    }

    #[test]
    fn ack_omits_empty_fields() {
        assert_eq!(serde_json::to_value(Ack::ok()).unwrap(), json!({"success": true}));
        assert_eq!(
            serde_json::to_value(ControlResponse::Ack(Ack::failed("nope"))).unwrap(),
            json!({"success": false, "reason": "nope"})
        );
    }

    #[test]
    fn telemetry_responses_use_wire_names() {
        assert_eq!(
            serde_json::to_value(ControlResponse::Level { level: 12.5 }).unwrap(),
            json!({"level": 12.5})
        );
        assert_eq!(
            serde_json::to_value(ControlResponse::Spectrum { data: vec![0.0; 2] }).unwrap(),
            json!({"data": [0.0, 0.0]})
        );
    }
}
