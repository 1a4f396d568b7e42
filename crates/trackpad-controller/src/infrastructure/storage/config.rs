//! TOML-based configuration persistence for the controller application.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\TrackpadOverLan\controller.toml`
//! - Linux:    `~/.config/trackpad-over-lan/controller.toml`
//! - macOS:    `~/Library/Application Support/TrackpadOverLan/controller.toml`
//!
//! Every field carries a serde default so the application works on first run
//! (before a config file exists) and when upgrading from an older file that
//! is missing newer fields.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use trackpad_core::gesture::{AccelerationCurve, GestureConfig};

use crate::infrastructure::network::session::SessionConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The configured peer address is not a valid IP address.
    #[error("invalid peer address {value:?}: {source}")]
    InvalidPeerAddress {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub gesture: GestureSettings,
}

/// General controller settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControllerConfig {
    /// Name advertised to the peer in the handshake.
    #[serde(default = "default_device_name")]
    pub device_name: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// How to reach the peer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Service name handed to the discovery boundary.
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Peer IP address used by the static resolver.
    #[serde(default = "default_peer_host")]
    pub peer_host: String,
    /// Peer TCP port.
    #[serde(default = "default_peer_port")]
    pub peer_port: u16,
    /// Upper bound on a single connect attempt, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Batch flush cadence, in milliseconds (8 ≈ 120 Hz).
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

/// Reconnect backoff policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    /// First reconnect delay, in milliseconds; doubles per failure.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Maximum reconnect delay, in milliseconds.
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
    /// Consecutive failures before the session parks in `Failed`.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

/// Gesture recognition thresholds and feel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GestureSettings {
    #[serde(default = "default_movement_threshold")]
    pub movement_threshold: f32,
    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,
    #[serde(default = "default_tap_max_duration_ms")]
    pub tap_max_duration_ms: u64,
    #[serde(default = "default_tap_movement_tolerance")]
    pub tap_movement_tolerance: f32,
    #[serde(default = "default_double_tap_max_interval_ms")]
    pub double_tap_max_interval_ms: u64,
    #[serde(default = "default_two_finger_tap_max_duration_ms")]
    pub two_finger_tap_max_duration_ms: u64,
    #[serde(default = "default_scroll_activation_threshold")]
    pub scroll_activation_threshold: f32,
    #[serde(default = "default_pinch_activation_threshold")]
    pub pinch_activation_threshold: f32,
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold: f32,
    #[serde(default = "default_swipe_axis_dominance")]
    pub swipe_axis_dominance: f32,
    #[serde(default = "default_swipe_window_ms")]
    pub swipe_window_ms: u64,
    #[serde(default = "default_true")]
    pub natural_scrolling: bool,
    #[serde(default = "default_sensitivity")]
    pub cursor_sensitivity: f32,
    #[serde(default = "default_sensitivity")]
    pub scroll_sensitivity: f32,
    /// One of `"none"`, `"light"`, `"medium"`, `"heavy"`.
    #[serde(default)]
    pub acceleration_curve: AccelerationCurve,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_device_name() -> String {
    "trackpad".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_service_name() -> String {
    "_trackpad._tcp".to_string()
}
fn default_peer_host() -> String {
    "127.0.0.1".to_string()
}
fn default_peer_port() -> u16 {
    9847
}
fn default_connect_timeout_ms() -> u64 {
    5000
}
fn default_flush_interval_ms() -> u64 {
    8
}
fn default_backoff_base_ms() -> u64 {
    2000
}
fn default_backoff_cap_ms() -> u64 {
    300_000
}
fn default_max_reconnect_attempts() -> u32 {
    5
}
fn default_movement_threshold() -> f32 {
    5.0
}
fn default_long_press_ms() -> u64 {
    500
}
fn default_tap_max_duration_ms() -> u64 {
    200
}
fn default_tap_movement_tolerance() -> f32 {
    20.0
}
fn default_double_tap_max_interval_ms() -> u64 {
    300
}
fn default_two_finger_tap_max_duration_ms() -> u64 {
    250
}
fn default_scroll_activation_threshold() -> f32 {
    8.0
}
fn default_pinch_activation_threshold() -> f32 {
    15.0
}
fn default_swipe_threshold() -> f32 {
    80.0
}
fn default_swipe_axis_dominance() -> f32 {
    1.5
}
fn default_swipe_window_ms() -> u64 {
    500
}
fn default_true() -> bool {
    true
}
fn default_sensitivity() -> f32 {
    1.0
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            log_level: default_log_level(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            peer_host: default_peer_host(),
            peer_port: default_peer_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
            flush_interval_ms: default_flush_interval_ms(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
        }
    }
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            movement_threshold: default_movement_threshold(),
            long_press_ms: default_long_press_ms(),
            tap_max_duration_ms: default_tap_max_duration_ms(),
            tap_movement_tolerance: default_tap_movement_tolerance(),
            double_tap_max_interval_ms: default_double_tap_max_interval_ms(),
            two_finger_tap_max_duration_ms: default_two_finger_tap_max_duration_ms(),
            scroll_activation_threshold: default_scroll_activation_threshold(),
            pinch_activation_threshold: default_pinch_activation_threshold(),
            swipe_threshold: default_swipe_threshold(),
            swipe_axis_dominance: default_swipe_axis_dominance(),
            swipe_window_ms: default_swipe_window_ms(),
            natural_scrolling: default_true(),
            cursor_sensitivity: default_sensitivity(),
            scroll_sensitivity: default_sensitivity(),
            acceleration_curve: AccelerationCurve::default(),
        }
    }
}

// ── Conversions into runtime config ───────────────────────────────────────────

impl AppConfig {
    /// The peer endpoint for the static resolver.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPeerAddress`] when `peer_host` is not a
    /// parseable IP address.
    pub fn peer_endpoint(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr =
            self.network
                .peer_host
                .parse()
                .map_err(|source| ConfigError::InvalidPeerAddress {
                    value: self.network.peer_host.clone(),
                    source,
                })?;
        Ok(SocketAddr::new(ip, self.network.peer_port))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            service_name: self.network.service_name.clone(),
            device_name: self.controller.device_name.clone(),
            flush_interval: Duration::from_millis(self.network.flush_interval_ms),
            connect_timeout: Duration::from_millis(self.network.connect_timeout_ms),
            backoff_base: Duration::from_millis(self.session.backoff_base_ms),
            backoff_cap: Duration::from_millis(self.session.backoff_cap_ms),
            max_reconnect_attempts: self.session.max_reconnect_attempts,
        }
    }

    pub fn gesture_config(&self) -> GestureConfig {
        let g = &self.gesture;
        GestureConfig {
            movement_threshold: g.movement_threshold,
            long_press_threshold: Duration::from_millis(g.long_press_ms),
            tap_max_duration: Duration::from_millis(g.tap_max_duration_ms),
            tap_movement_tolerance: g.tap_movement_tolerance,
            double_tap_max_interval: Duration::from_millis(g.double_tap_max_interval_ms),
            two_finger_tap_max_duration: Duration::from_millis(g.two_finger_tap_max_duration_ms),
            scroll_activation_threshold: g.scroll_activation_threshold,
            pinch_activation_threshold: g.pinch_activation_threshold,
            swipe_threshold: g.swipe_threshold,
            swipe_axis_dominance: g.swipe_axis_dominance,
            swipe_window: Duration::from_millis(g.swipe_window_ms),
            natural_scrolling: g.natural_scrolling,
            cursor_sensitivity: g.cursor_sensitivity,
            scroll_sensitivity: g.scroll_sensitivity,
            acceleration: g.acceleration_curve,
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("controller.toml"))
}

/// Loads `AppConfig` from disk, returning `AppConfig::default()` if the file
/// does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Persists `config` to disk, creating the config directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    let path = config_file_path()?;

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("TrackpadOverLan"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("trackpad-over-lan"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("TrackpadOverLan")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_documented_defaults() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.network.peer_port, 9847);
        assert_eq!(cfg.network.flush_interval_ms, 8);
        assert_eq!(cfg.session.backoff_base_ms, 2000);
        assert_eq!(cfg.session.max_reconnect_attempts, 5);
        assert_eq!(cfg.gesture.long_press_ms, 500);
        assert_eq!(cfg.gesture.double_tap_max_interval_ms, 300);
        assert!(cfg.gesture.natural_scrolling);
    }

    #[test]
    fn test_empty_toml_parses_to_defaults() {
        // An absent or empty file must behave like AppConfig::default().
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_toml_fills_missing_fields_with_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [network]
            peer_host = "192.168.1.44"

            [gesture]
            natural_scrolling = false
            acceleration_curve = "heavy"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.network.peer_host, "192.168.1.44");
        assert_eq!(cfg.network.peer_port, 9847, "missing fields use defaults");
        assert!(!cfg.gesture.natural_scrolling);
        assert_eq!(cfg.gesture.acceleration_curve, AccelerationCurve::Heavy);
        assert_eq!(cfg.gesture.long_press_ms, 500);
    }

    #[test]
    fn test_toml_round_trip_preserves_config() {
        let mut original = AppConfig::default();
        original.controller.device_name = "corner-tablet".to_string();
        original.network.peer_host = "10.0.0.7".to_string();
        original.session.max_reconnect_attempts = 8;
        original.gesture.acceleration_curve = AccelerationCurve::Light;

        let text = toml::to_string_pretty(&original).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();

        assert_eq!(parsed, original);
    }

    #[test]
    fn test_peer_endpoint_parses_host_and_port() {
        let mut cfg = AppConfig::default();
        cfg.network.peer_host = "192.168.1.20".to_string();
        cfg.network.peer_port = 4242;

        let endpoint = cfg.peer_endpoint().unwrap();

        assert_eq!(endpoint, "192.168.1.20:4242".parse().unwrap());
    }

    #[test]
    fn test_peer_endpoint_rejects_garbage_host() {
        let mut cfg = AppConfig::default();
        cfg.network.peer_host = "not-an-ip".to_string();

        let result = cfg.peer_endpoint();

        assert!(matches!(
            result,
            Err(ConfigError::InvalidPeerAddress { .. })
        ));
    }

    #[test]
    fn test_session_config_conversion_uses_millis() {
        let cfg = AppConfig::default();
        let session = cfg.session_config();

        assert_eq!(session.flush_interval, Duration::from_millis(8));
        assert_eq!(session.backoff_base, Duration::from_secs(2));
        assert_eq!(session.backoff_cap, Duration::from_secs(300));
    }

    #[test]
    fn test_gesture_config_conversion_carries_thresholds() {
        let mut cfg = AppConfig::default();
        cfg.gesture.pinch_activation_threshold = 22.0;
        cfg.gesture.long_press_ms = 650;

        let gesture = cfg.gesture_config();

        assert_eq!(gesture.pinch_activation_threshold, 22.0);
        assert_eq!(gesture.long_press_threshold, Duration::from_millis(650));
    }
}
