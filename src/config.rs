use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HomewatchConfig {
    pub telegram: TelegramConfig,
    pub sensor: SensorConfig,
    pub capture: CaptureConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TelegramConfig {
    /// Bot API credential token
    #[serde(default)]
    pub token: String,

    /// Chat id of the single operator allowed to control the system
    #[serde(default)]
    pub operator_id: i64,

    /// Base URL of the Bot API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Long-poll timeout for getUpdates in seconds
    #[serde(default = "default_poll_timeout_seconds")]
    pub poll_timeout_seconds: u64,

    /// Base delay before retrying a failed poll, doubled per consecutive failure
    #[serde(default = "default_retry_delay_seconds")]
    pub retry_delay_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SensorBackend {
    /// PIR sensor wired to a sysfs GPIO pin
    Gpio,
    /// Keyboard-driven simulation for bench testing
    Keyboard,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SensorConfig {
    #[serde(default = "default_sensor_backend")]
    pub backend: SensorBackend,

    /// GPIO identifier of the PIR sensor output
    #[serde(default = "default_gpio_pin")]
    pub gpio_pin: String,

    /// Root of the sysfs GPIO tree
    #[serde(default = "default_gpio_root")]
    pub gpio_root: String,

    /// Interval between sensor reads in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CaptureConfig {
    /// Directory receiving captured JPEG files
    #[serde(default = "default_capture_path")]
    pub path: String,

    /// Still capture program writing a JPEG to stdout
    #[serde(default = "default_capture_command")]
    pub command: String,

    /// Arguments passed to the capture program
    #[serde(default = "default_capture_args")]
    pub args: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,

    /// Capacity of the queue between the sensor and the controller
    #[serde(default = "default_motion_queue_capacity")]
    pub motion_queue_capacity: usize,
}

impl HomewatchConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("telegram.token", "")?
            .set_default("telegram.operator_id", 0_i64)?
            .set_default("telegram.api_url", default_api_url())?
            .set_default(
                "telegram.poll_timeout_seconds",
                default_poll_timeout_seconds(),
            )?
            .set_default(
                "telegram.retry_delay_seconds",
                default_retry_delay_seconds(),
            )?
            .set_default("sensor.backend", "gpio")?
            .set_default("sensor.gpio_pin", default_gpio_pin())?
            .set_default("sensor.gpio_root", default_gpio_root())?
            .set_default("sensor.poll_interval_ms", default_poll_interval_ms())?
            .set_default("capture.path", default_capture_path())?
            .set_default("capture.command", default_capture_command())?
            .set_default("capture.args", default_capture_args())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .set_default(
                "system.motion_queue_capacity",
                default_motion_queue_capacity() as i64,
            )?
            .add_source(File::with_name(&path_str).required(false))
            // Double underscore so that HOMEWATCH_TELEGRAM__OPERATOR_ID maps to telegram.operator_id
            .add_source(
                Environment::with_prefix("HOMEWATCH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: HomewatchConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!(
            "Operator {}, sensor backend {:?}, capture path {}",
            config.telegram.operator_id, config.sensor.backend, config.capture.path
        );

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.token.trim().is_empty() {
            return Err(ConfigError::Message(
                "Telegram token must be set".to_string(),
            ));
        }

        if self.telegram.operator_id == 0 {
            return Err(ConfigError::Message(
                "Telegram operator_id must be set".to_string(),
            ));
        }

        if self.telegram.poll_timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Telegram poll_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.sensor.backend == SensorBackend::Gpio && self.sensor.gpio_pin.trim().is_empty() {
            return Err(ConfigError::Message(
                "Sensor gpio_pin must be set for the gpio backend".to_string(),
            ));
        }

        if self.sensor.poll_interval_ms == 0 {
            return Err(ConfigError::Message(
                "Sensor poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.capture.path.trim().is_empty() {
            return Err(ConfigError::Message(
                "Capture path must be set".to_string(),
            ));
        }

        if self.capture.command.trim().is_empty() {
            return Err(ConfigError::Message(
                "Capture command must be set".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        if self.system.motion_queue_capacity == 0 {
            return Err(ConfigError::Message(
                "Motion queue capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for HomewatchConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig {
                token: String::new(),
                operator_id: 0,
                api_url: default_api_url(),
                poll_timeout_seconds: default_poll_timeout_seconds(),
                retry_delay_seconds: default_retry_delay_seconds(),
            },
            sensor: SensorConfig {
                backend: default_sensor_backend(),
                gpio_pin: default_gpio_pin(),
                gpio_root: default_gpio_root(),
                poll_interval_ms: default_poll_interval_ms(),
            },
            capture: CaptureConfig {
                path: default_capture_path(),
                command: default_capture_command(),
                args: default_capture_args(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
                motion_queue_capacity: default_motion_queue_capacity(),
            },
        }
    }
}

// Default value functions
fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}
fn default_poll_timeout_seconds() -> u64 {
    60
}
fn default_retry_delay_seconds() -> u64 {
    1
}

fn default_sensor_backend() -> SensorBackend {
    SensorBackend::Gpio
}
fn default_gpio_pin() -> String {
    "4".to_string()
}
fn default_gpio_root() -> String {
    "/sys/class/gpio".to_string()
}
fn default_poll_interval_ms() -> u64 {
    50
}

fn default_capture_path() -> String {
    "./pictures".to_string()
}
fn default_capture_command() -> String {
    "raspistill".to_string()
}
fn default_capture_args() -> Vec<String> {
    ["-n", "-t", "1", "-o", "-"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_event_bus_capacity() -> usize {
    100
}
fn default_motion_queue_capacity() -> usize {
    32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> HomewatchConfig {
        let mut config = HomewatchConfig::default();
        config.telegram.token = "123:abc".to_string();
        config.telegram.operator_id = 42;
        config
    }

    #[test]
    fn test_default_config_needs_credentials() {
        let config = HomewatchConfig::default();
        assert!(config.validate().is_err());
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = valid_config();
        config.telegram.operator_id = 0;
        assert!(config.validate().is_err());

        config.telegram.operator_id = 42;
        config.capture.path = String::new();
        assert!(config.validate().is_err());

        config.capture.path = "./pictures".to_string();
        config.sensor.gpio_pin = " ".to_string();
        assert!(config.validate().is_err());

        // The keyboard backend does not need a pin
        config.sensor.backend = SensorBackend::Keyboard;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[telegram]
token = "123:abc"
operator_id = 987654

[sensor]
backend = "keyboard"

[capture]
path = "/var/lib/homewatch"
"#
        )
        .unwrap();

        let config = HomewatchConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.telegram.token, "123:abc");
        assert_eq!(config.telegram.operator_id, 987654);
        assert_eq!(config.telegram.poll_timeout_seconds, 60);
        assert_eq!(config.sensor.backend, SensorBackend::Keyboard);
        assert_eq!(config.sensor.gpio_root, "/sys/class/gpio");
        assert_eq!(config.capture.path, "/var/lib/homewatch");
        assert_eq!(config.capture.command, "raspistill");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_serializes_to_toml() {
        let rendered = toml::to_string_pretty(&HomewatchConfig::default()).unwrap();
        assert!(rendered.contains("[telegram]"));
        assert!(rendered.contains("backend = \"gpio\""));
        assert!(rendered.contains("raspistill"));
    }
}
