use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Hourly load split across the three utilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// 0-23
    #[serde(rename = "Hour")]
    pub hour: u32,
    #[serde(rename = "NYC")]
    pub nyc: f64,
    #[serde(rename = "NJ")]
    pub nj: f64,
    #[serde(rename = "CT")]
    pub ct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempRow {
    #[serde(rename = "일시", with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "기온(°C)")]
    pub temperature: f64,
}

/// Solar output in the trading-hour convention, where hour 1 covers 00:00-01:00
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarRow {
    #[serde(rename = "거래일자")]
    pub date: NaiveDate,
    /// 1-24
    #[serde(rename = "거래시간")]
    pub reported_hour: u32,
    #[serde(rename = "태양광")]
    pub output: f64,
}

/// One row of the outer join; a field is `None` when its source lacked the timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "NYC")]
    pub nyc: Option<f64>,
    #[serde(rename = "NJ")]
    pub nj: Option<f64>,
    #[serde(rename = "CT")]
    pub ct: Option<f64>,
    pub solar: Option<f64>,
    pub temperature: Option<f64>,
}

/// `YYYY-MM-DD HH:MM:SS` on write; ISO `T` separator also accepted on read
pub mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
            .map_err(|e| serde::de::Error::custom(format!("Invalid timestamp '{}': {}", s, e)))
    }
}
