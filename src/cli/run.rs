use log::info;

use crate::config::DeviceConfig;
use crate::error::AppError;
use crate::hardware::firmware::NoUpdates;
use crate::hardware::output::{LogDriver, SysfsPwmDriver};
use crate::mqtt::transport::MqttTransport;
use crate::runtime::Controller;

pub async fn handle(config: &DeviceConfig) -> Result<(), AppError> {
    info!(
        "{}: broker {}:{}, {}-{}K",
        config.hostname,
        config.broker.host,
        config.broker.port,
        config.temperature.min_kelvin,
        config.temperature.max_kelvin
    );
    let transport = MqttTransport::new(&config.hostname, &config.broker);

    match &config.output.pwm {
        Some(pwm) => {
            let driver = SysfsPwmDriver::open(pwm)?;
            info!("output: sysfs PWM on {}", pwm.chip.display());
            Controller::new(config, transport, driver, NoUpdates).run().await;
        }
        None => {
            info!("output: no PWM configured, logging levels only");
            Controller::new(config, transport, LogDriver::default(), NoUpdates)
                .run()
                .await;
        }
    }
    Ok(())
}
