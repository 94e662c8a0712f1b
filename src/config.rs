use crate::error::{AppError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE_URL: &str =
    "https://www.eia.gov/electricity/wholesalemarkets/csv/nyiso_load_act_hr_2024.csv";

pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_source_url")]
    pub url: String,
    #[serde(default = "default_timeout", deserialize_with = "deserialize_u64")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_header_scan_lines")]
    pub header_scan_lines: usize,
}

fn default_source_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_header_scan_lines() -> usize {
    crate::table::DEFAULT_HEADER_SCAN_LINES
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            header_scan_lines: default_header_scan_lines(),
        }
    }
}

/// Custom deserializer that handles a number given either as a number or a string
///
/// Accepts:
/// - `timeout_seconds: 60` (number)
/// - `timeout_seconds: "60"` (string that parses to number)
/// - `timeout_seconds: ${FETCH_TIMEOUT}` (env var substituted to either)
fn deserialize_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberValue {
        Number(u64),
        String(String),
    }

    match NumberValue::deserialize(deserializer)? {
        NumberValue::Number(n) => Ok(n),
        NumberValue::String(s) => s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("Invalid number: '{}'", s))),
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WindowConfig {
    #[serde(default = "default_window_start")]
    pub start: NaiveDate,
    #[serde(default = "default_window_end")]
    pub end: NaiveDate,
}

fn default_window_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap_or_default()
}

fn default_window_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 7).unwrap_or_default()
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: default_window_start(),
            end: default_window_end(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SynthesisConfig {
    /// `None` (an explicit `seed: null`) draws from OS entropy.
    #[serde(default = "default_seed")]
    pub seed: Option<u64>,
}

fn default_seed() -> Option<u64> {
    Some(DEFAULT_SEED)
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_power_file")]
    pub power_file: String,
    #[serde(default = "default_temperature_file")]
    pub temperature_file: String,
    #[serde(default = "default_solar_file")]
    pub solar_file: String,
    #[serde(default = "default_merged_file")]
    pub merged_file: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_power_file() -> String {
    "nyiso_power.csv".to_string()
}

fn default_temperature_file() -> String {
    "temp.csv".to_string()
}

fn default_solar_file() -> String {
    "solar.csv".to_string()
}

fn default_merged_file() -> String {
    "merged.csv".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            power_file: default_power_file(),
            temperature_file: default_temperature_file(),
            solar_file: default_solar_file(),
            merged_file: default_merged_file(),
        }
    }
}

impl OutputConfig {
    pub fn power_path(&self) -> PathBuf {
        self.dir.join(&self.power_file)
    }

    pub fn temperature_path(&self) -> PathBuf {
        self.dir.join(&self.temperature_file)
    }

    pub fn solar_path(&self) -> PathBuf {
        self.dir.join(&self.solar_file)
    }

    pub fn merged_path(&self) -> PathBuf {
        self.dir.join(&self.merged_file)
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // Substitute environment variables
        let expanded = expand_env_vars(content)?;

        let config: Config = serde_yaml::from_str(&expanded)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    ///
    /// Checks for:
    /// - Valid HTTPS source URL
    /// - Positive timeout and header scan depth
    /// - Non-empty output location and file names
    fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.source.url).map_err(|e| {
            AppError::Config(format!("Invalid source url '{}': {}", self.source.url, e))
        })?;

        if parsed.scheme() != "https" {
            return Err(AppError::Config(format!(
                "Source url must use HTTPS, got: {}",
                parsed.scheme()
            )));
        }

        if self.source.timeout_seconds == 0 {
            return Err(AppError::Config(
                "Source timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.source.max_retries > 10 {
            return Err(AppError::Config(format!(
                "Source max_retries {} seems too high, maximum recommended is 10",
                self.source.max_retries
            )));
        }

        if self.source.header_scan_lines == 0 {
            return Err(AppError::Config(
                "Source header_scan_lines must be at least 1".to_string(),
            ));
        }

        // An inverted window is not rejected; it yields an empty range at run time
        if self.window.start > self.window.end {
            tracing::warn!(
                "Window start {} is after end {}, no rows will match",
                self.window.start,
                self.window.end
            );
        }

        if self.output.dir.as_os_str().is_empty() {
            return Err(AppError::Config(
                "Output dir cannot be empty".to_string(),
            ));
        }

        let file_names = [
            ("power_file", &self.output.power_file),
            ("temperature_file", &self.output.temperature_file),
            ("solar_file", &self.output.solar_file),
            ("merged_file", &self.output.merged_file),
        ];

        for (field_name, value) in &file_names {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "Output {} cannot be empty",
                    field_name
                )));
            }
        }

        Ok(())
    }
}

fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = content.to_string();
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| AppError::Config(format!("Invalid env var pattern: {}", e)))?;

    let mut missing_vars = Vec::new();

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(value) => {
                result = result.replace(&cap[0], &value);
            }
            Err(_) => {
                missing_vars.push(var_name.to_string());
            }
        }
    }

    if !missing_vars.is_empty() {
        return Err(AppError::Config(format!(
            "Missing required environment variable{}: {}\n\n\
             To fix this:\n\
             1. Create a .env file in the project root (copy .env.example)\n\
             2. Set the missing variable{}: export {}=<value>\n\
             3. Or set {} in your environment before running",
            if missing_vars.len() > 1 { "s" } else { "" },
            missing_vars.join(", "),
            if missing_vars.len() > 1 { "s" } else { "" },
            missing_vars[0],
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}
