use serde::{Deserialize, Serialize};

/// §6 inbound webhook HTTP surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8585".to_string(),
        }
    }
}

/// §9 design note: the in-process event bus backpressure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventBusBackpressure {
    DropOldest,
    Block,
}

impl Default for EventBusBackpressure {
    fn default() -> Self {
        EventBusBackpressure::DropOldest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    pub capacity: usize,
    pub backpressure: EventBusBackpressure,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            backpressure: EventBusBackpressure::DropOldest,
        }
    }
}
