use serde_json::json;

use crate::cli::mix::report;
use crate::cli::output::print_json;
use crate::config::DeviceConfig;
use crate::error::AppError;
use crate::models::channel::mix_state;
use crate::models::light_state::LightStateManager;
use crate::protocol::codec::{decode_command, encode_state};

pub fn handle(payload: &str, device: &DeviceConfig) -> Result<(), AppError> {
    let update = decode_command(payload.as_bytes())?;

    let mut light = LightStateManager::new(device.temperature);
    light.apply(&update);
    let state = light.snapshot();
    let output = mix_state(&state, light.range());
    let drive = output.drive_levels(device.output.polarity);

    let mut result = report(&state, &output, &drive, device);
    result["update"] = json!({
        "on": update.on,
        "brightness": update.brightness,
        "kelvin": update.color_temperature,
    });
    result["published"] = serde_json::to_value(encode_state(&state))?;
    print_json(&result);
    Ok(())
}
