use serde_json::json;
use tabled::Tabled;

use crate::cli::output::{print_json, print_table};
use crate::config::{DeviceConfig, OutputMode, RuntimeConfig};
use crate::error::AppError;
use crate::models::channel::{mix_state, ChannelOutput, DriveLevels};
use crate::models::light_state::{LightState, LightStateManager, PartialUpdate};

#[derive(Tabled)]
struct ChannelRow {
    #[tabled(rename = "CHANNEL")]
    channel: &'static str,
    #[tabled(rename = "LIGHT")]
    light: u8,
    #[tabled(rename = "DRIVE")]
    drive: u8,
}

pub fn handle(
    off: bool,
    brightness: u8,
    kelvin: Option<u16>,
    device: &DeviceConfig,
    config: &RuntimeConfig,
) -> Result<(), AppError> {
    let mut light = LightStateManager::new(device.temperature);
    light.apply(&PartialUpdate {
        on: Some(!off),
        brightness: Some(i64::from(brightness)),
        color_temperature: kelvin.map(i64::from),
    });
    let state = light.snapshot();
    let output = mix_state(&state, light.range());
    let drive = output.drive_levels(device.output.polarity);

    if config.output_mode == OutputMode::Table {
        print_table(&[
            ChannelRow {
                channel: "cool",
                light: output.cool,
                drive: drive.cool,
            },
            ChannelRow {
                channel: "warm",
                light: output.warm,
                drive: drive.warm,
            },
        ]);
    } else {
        print_json(&report(&state, &output, &drive, device));
    }
    Ok(())
}

pub(crate) fn report(
    state: &LightState,
    output: &ChannelOutput,
    drive: &DriveLevels,
    device: &DeviceConfig,
) -> serde_json::Value {
    json!({
        "state": {
            "on": state.on,
            "brightness": state.brightness,
            "kelvin": state.color_temperature,
        },
        "output": {"cool": output.cool, "warm": output.warm},
        "drive": {
            "polarity": device.output.polarity,
            "cool": drive.cool,
            "warm": drive.warm,
        },
    })
}
