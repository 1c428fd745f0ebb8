//! Output limits configuration.

use serde::Deserialize;

/// Reply batching limits.
///
/// A dispatch producing more lines than `max_output_lines` is redirected to
/// the requester privately instead of flooding the channel.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Maximum lines sent to a channel per dispatch (default: 5).
    #[serde(default = "default_max_output_lines")]
    pub max_output_lines: usize,
    /// Channel notice sent when output is redirected.
    #[serde(default = "default_overflow_warning")]
    pub overflow_warning: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_output_lines: default_max_output_lines(),
            overflow_warning: default_overflow_warning(),
        }
    }
}

/// Outbound line pacing, applied in the connection writer.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Steady-state lines per second (default: 2).
    #[serde(default = "default_send_rate")]
    pub send_rate_per_second: u32,
    /// Lines that may be sent back to back (default: 5).
    #[serde(default = "default_send_burst")]
    pub send_burst: u32,
    /// Outbound queue capacity (default: 256).
    #[serde(default = "default_send_queue")]
    pub send_queue: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            send_rate_per_second: default_send_rate(),
            send_burst: default_send_burst(),
            send_queue: default_send_queue(),
        }
    }
}

fn default_max_output_lines() -> usize {
    5
}

fn default_overflow_warning() -> String {
    "Too much output; sending it to you privately.".to_string()
}

fn default_send_rate() -> u32 {
    2
}

fn default_send_burst() -> u32 {
    5
}

fn default_send_queue() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_correct() {
        let output = OutputConfig::default();
        assert_eq!(output.max_output_lines, 5);
        assert!(output.overflow_warning.contains("privately"));

        let network = NetworkConfig::default();
        assert_eq!(network.send_rate_per_second, 2);
        assert_eq!(network.send_burst, 5);
        assert_eq!(network.send_queue, 256);
    }
}
