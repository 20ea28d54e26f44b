use serde_json::json;
use tabled::Tabled;

use crate::cli::output::{print_json, print_table};
use crate::config::{DeviceConfig, OutputMode, RuntimeConfig};
use crate::error::AppError;
use crate::protocol::codec::encode_discovery;

#[derive(Tabled)]
struct TopicRow {
    #[tabled(rename = "ROLE")]
    role: &'static str,
    #[tabled(rename = "TOPIC")]
    topic: String,
    #[tabled(rename = "RETAINED")]
    retained: &'static str,
}

pub fn handle(device: &DeviceConfig, config: &RuntimeConfig) -> Result<(), AppError> {
    let topics = device.topics();

    if config.output_mode == OutputMode::Table {
        let rows = vec![
            TopicRow {
                role: "config",
                topic: topics.config,
                retained: "yes",
            },
            TopicRow {
                role: "state",
                topic: topics.state,
                retained: "yes",
            },
            TopicRow {
                role: "command",
                topic: topics.command,
                retained: "-",
            },
        ];
        print_table(&rows);
    } else {
        let discovery = encode_discovery(&device.hostname, &topics);
        print_json(&json!({
            "topic": topics.config,
            "discovery": serde_json::to_value(discovery)?,
        }));
    }
    Ok(())
}
