/// Home Assistant discovery prefix for light entities.
pub const DISCOVERY_PREFIX: &str = "homeassistant/light";

/// Topic names for one light, derived from its hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub config: String,
    pub state: String,
    pub command: String,
}

impl Topics {
    pub fn for_hostname(hostname: &str) -> Self {
        let base = format!("{}/{}", DISCOVERY_PREFIX, hostname);
        Self {
            config: format!("{}/config", base),
            state: format!("{}/state", base),
            command: format!("{}/set", base),
        }
    }
}
