use serde::Serialize;
use serde_json::Value;

use super::topics::Topics;
use crate::models::light_state::{LightState, PartialUpdate};

const MIREDS_PER_KELVIN: u32 = 1_000_000;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PowerState {
    #[serde(rename = "ON")]
    On,
    #[serde(rename = "OFF")]
    Off,
}

impl From<bool> for PowerState {
    fn from(on: bool) -> Self {
        if on {
            PowerState::On
        } else {
            PowerState::Off
        }
    }
}

/// Payload of the `state` topic. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatePayload {
    pub state: PowerState,
    pub brightness: u8,
    /// Mireds.
    pub color_temp: u32,
}

/// Retained capability announcement on the `config` topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryPayload {
    pub name: String,
    pub unique_id: String,
    pub state_topic: String,
    pub command_topic: String,
    pub schema: &'static str,
    pub brightness: bool,
    pub color_temp: bool,
}

pub fn kelvin_to_mireds(kelvin: u16) -> u32 {
    MIREDS_PER_KELVIN.checked_div(u32::from(kelvin)).unwrap_or(0)
}

/// Inverse of [`kelvin_to_mireds`]. Zero or negative mireds have no finite
/// temperature and saturate toward the cool end.
pub fn mireds_to_kelvin(mireds: i64) -> i64 {
    if mireds <= 0 {
        return i64::MAX;
    }
    i64::from(MIREDS_PER_KELVIN) / mireds
}

pub fn encode_state(state: &LightState) -> StatePayload {
    StatePayload {
        state: state.on.into(),
        brightness: state.brightness,
        color_temp: kelvin_to_mireds(state.color_temperature),
    }
}

pub fn encode_discovery(hostname: &str, topics: &Topics) -> DiscoveryPayload {
    DiscoveryPayload {
        name: hostname.to_string(),
        unique_id: hostname.to_string(),
        state_topic: topics.state.clone(),
        command_topic: topics.command.clone(),
        schema: "json",
        brightness: true,
        color_temp: true,
    }
}

/// Parse one command message into a partial update.
///
/// Only unparseable or non-object payloads are errors. Any `state` other
/// than `"ON"` turns the light off. Numbers are truncated toward zero and
/// left for the state manager to clamp; a non-numeric `brightness` or
/// `color_temp` is treated as absent.
pub fn decode_command(payload: &[u8]) -> Result<PartialUpdate, DecodeError> {
    let value: Value = serde_json::from_slice(payload).map_err(DecodeError::Syntax)?;
    let Value::Object(fields) = value else {
        return Err(DecodeError::NotAnObject);
    };

    Ok(PartialUpdate {
        on: fields.get("state").map(|s| s.as_str() == Some("ON")),
        brightness: fields.get("brightness").and_then(integer),
        color_temperature: fields
            .get("color_temp")
            .and_then(integer)
            .map(mireds_to_kelvin),
    })
}

fn integer(value: &Value) -> Option<i64> {
    // Float casts saturate, so oversized values still clamp to a bound.
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.trunc() as i64))
}

impl StatePayload {
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

impl DiscoveryPayload {
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::light_state::{LightStateManager, TemperatureRange};

    #[test]
    fn test_default_state_wire_format() {
        let state = LightState::initial(&TemperatureRange::default());
        let bytes = encode_state(&state).to_bytes();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"state":"ON","brightness":255,"color_temp":234}"#
        );
    }

    #[test]
    fn test_off_state_wire_format() {
        let state = LightState {
            on: false,
            brightness: 12,
            color_temperature: 2000,
        };
        assert_eq!(
            String::from_utf8(encode_state(&state).to_bytes()).unwrap(),
            r#"{"state":"OFF","brightness":12,"color_temp":500}"#
        );
    }

    #[test]
    fn test_discovery_wire_format() {
        let topics = Topics::for_hostname("office_lights");
        let value = serde_json::to_value(encode_discovery("office_lights", &topics)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "office_lights",
                "unique_id": "office_lights",
                "state_topic": "homeassistant/light/office_lights/state",
                "command_topic": "homeassistant/light/office_lights/set",
                "schema": "json",
                "brightness": true,
                "color_temp": true,
            })
        );
    }

    #[test]
    fn test_decode_full_command() {
        let update = decode_command(br#"{"state":"OFF","brightness":80,"color_temp":250}"#).unwrap();
        assert_eq!(update.on, Some(false));
        assert_eq!(update.brightness, Some(80));
        assert_eq!(update.color_temperature, Some(4000));
    }

    #[test]
    fn test_decode_partial_command() {
        let update = decode_command(br#"{"brightness":100}"#).unwrap();
        assert_eq!(update.on, None);
        assert_eq!(update.brightness, Some(100));
        assert_eq!(update.color_temperature, None);

        assert_eq!(decode_command(b"{}").unwrap(), PartialUpdate::default());
    }

    #[test]
    fn test_decode_ignores_unknown_keys() {
        let update = decode_command(br#"{"state":"ON","transition":2}"#).unwrap();
        assert_eq!(update.on, Some(true));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_command(b"not json"),
            Err(DecodeError::Syntax(_))
        ));
        assert!(matches!(
            decode_command(b"[1,2,3]"),
            Err(DecodeError::NotAnObject)
        ));
        assert!(matches!(
            decode_command(b"\"ON\""),
            Err(DecodeError::NotAnObject)
        ));
    }

    #[test]
    fn test_decode_state_other_than_on_means_off() {
        let update = decode_command(br#"{"state":"on","brightness":10}"#).unwrap();
        assert_eq!(update.on, Some(false));
        assert_eq!(update.brightness, Some(10));

        assert_eq!(decode_command(br#"{"state":"MAYBE"}"#).unwrap().on, Some(false));
        assert_eq!(decode_command(br#"{"state":1}"#).unwrap().on, Some(false));
    }

    #[test]
    fn test_decode_truncates_fractional_numbers() {
        let update = decode_command(br#"{"brightness":127.9,"color_temp":250.0}"#).unwrap();
        assert_eq!(update.brightness, Some(127));
        assert_eq!(update.color_temperature, Some(4000));

        let update = decode_command(br#"{"brightness":-3.5}"#).unwrap();
        assert_eq!(update.brightness, Some(-3));

        let update = decode_command(br#"{"brightness":1e30}"#).unwrap();
        assert_eq!(update.brightness, Some(i64::MAX));
    }

    #[test]
    fn test_decode_skips_non_numeric_fields() {
        let update = decode_command(br#"{"state":"OFF","brightness":"high","color_temp":null}"#)
            .unwrap();
        assert_eq!(update.on, Some(false));
        assert_eq!(update.brightness, None);
        assert_eq!(update.color_temperature, None);
    }

    #[test]
    fn test_zero_mireds_saturates_cool() {
        let update = decode_command(br#"{"color_temp":0}"#).unwrap();
        let mut mgr = LightStateManager::new(TemperatureRange::default());
        mgr.apply(&update);
        assert_eq!(mgr.snapshot().color_temperature, 6535);
    }

    #[test]
    fn test_round_trip_through_wire() {
        let range = TemperatureRange::default();
        for kelvin in range.min_kelvin..=range.max_kelvin {
            let original = LightState {
                on: kelvin % 2 == 0,
                brightness: (kelvin % 256) as u8,
                color_temperature: kelvin,
            };
            let wire = encode_state(&original).to_bytes();

            let mut mgr = LightStateManager::new(range);
            mgr.apply(&decode_command(&wire).unwrap());
            let restored = mgr.snapshot();

            assert_eq!(restored.on, original.on);
            assert_eq!(restored.brightness, original.brightness);
            // Integer mireds only ever round the temperature up, by at most
            // 41K inside the default bounds.
            let drift = restored.color_temperature - original.color_temperature;
            assert!(drift <= 41, "{kelvin}K drifted by {drift}K");
            // The mired value itself is stable.
            assert_eq!(
                kelvin_to_mireds(restored.color_temperature),
                kelvin_to_mireds(kelvin)
            );
        }
    }
}
