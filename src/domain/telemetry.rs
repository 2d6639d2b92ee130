// Telemetry time series domain models
use super::bus::Measurements;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Supported look-back windows for the chart view, in minutes
pub const WINDOW_OPTIONS: [u32; 30] = [
    1, 5, 10, 15, 30, 45, 60, 120, 180, 240, 300, 360, 420, 480, 540, 600, 660, 720, 780, 840,
    900, 960, 1020, 1080, 1140, 1200, 1260, 1320, 1380, 1440,
];

/// One reading of a bus at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(flatten)]
    pub measurements: Measurements,
}

impl TimeSeriesPoint {
    #[cfg(test)]
    pub fn new(timestamp: NaiveDateTime, measurements: Measurements) -> Self {
        Self {
            timestamp,
            measurements,
        }
    }
}

/// Backend timestamps come either naive or with an offset; both are kept as
/// the wall-clock time the backend reported.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

/// A point prepared for display on the chart axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub time: String,
    #[serde(flatten)]
    pub point: TimeSeriesPoint,
}

impl ChartPoint {
    pub fn new(point: TimeSeriesPoint, window_minutes: u32) -> Self {
        Self {
            time: time_label(&point.timestamp, window_minutes),
            point,
        }
    }
}

/// Short windows keep second resolution on the axis, longer ones drop it
pub fn time_label(timestamp: &NaiveDateTime, window_minutes: u32) -> String {
    if window_minutes < 60 {
        timestamp.format("%H:%M:%S").to_string()
    } else {
        timestamp.format("%H:%M").to_string()
    }
}

/// Human label for a look-back window
pub fn format_window(minutes: u32) -> String {
    if minutes < 60 {
        format!("{} min", minutes)
    } else if minutes % 60 == 0 {
        format!("{} h", minutes / 60)
    } else {
        format!("{}h {}min", minutes / 60, minutes % 60)
    }
}

/// Static description of one chart: three phase fields plotted together
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartGroup {
    pub key: &'static str,
    pub label: &'static str,
    pub fields: [&'static str; 3],
    pub colors: [&'static str; 3],
}

pub const CHART_GROUPS: [ChartGroup; 11] = [
    ChartGroup {
        key: "freq",
        label: "Frequency (Hz)",
        fields: ["freq_a", "freq_b", "freq_c"],
        colors: ["#3e95cd", "#8e5ea2", "#3cba9f"],
    },
    ChartGroup {
        key: "va_rms",
        label: "Voltage RMS (V)",
        fields: ["va_rms", "vb_rms", "vc_rms"],
        colors: ["#fc6c85", "#fda65d", "#2dbe98"],
    },
    ChartGroup {
        key: "ia_rms",
        label: "Current RMS (A)",
        fields: ["ia_rms", "ib_rms", "ic_rms"],
        colors: ["#b8d9eb", "#ffc658", "#ff7300"],
    },
    ChartGroup {
        key: "p",
        label: "Active Power (W)",
        fields: ["pa", "pb", "pc"],
        colors: ["#ff6f69", "#ffcc5c", "#88d8b0"],
    },
    ChartGroup {
        key: "q",
        label: "Reactive Power (VAr)",
        fields: ["qa", "qb", "qc"],
        colors: ["#3d3d6b", "#edae49", "#d1495b"],
    },
    ChartGroup {
        key: "s",
        label: "Apparent Power (VA)",
        fields: ["sa", "sb", "sc"],
        colors: ["#476C9B", "#ED6A5E", "#F4F1BB"],
    },
    ChartGroup {
        key: "pf",
        label: "Power Factor (%)",
        fields: ["pfa", "pfb", "pfc"],
        colors: ["#85C1E9", "#F7DC6F", "#F1948A"],
    },
    ChartGroup {
        key: "va_p",
        label: "Voltage P (%)",
        fields: ["va_p", "vb_p", "vc_p"],
        colors: ["#95A5A6", "#BB8FCE", "#48C9B0"],
    },
    ChartGroup {
        key: "va_th",
        label: "Voltage THD (%)",
        fields: ["va_th", "vb_th", "vc_th"],
        colors: ["#F5B041", "#7DCEA0", "#5D6D7E"],
    },
    ChartGroup {
        key: "ia_p",
        label: "Current P (%)",
        fields: ["ia_p", "ib_p", "ic_p"],
        colors: ["#C39BD3", "#85C1E9", "#F7DC6F"],
    },
    ChartGroup {
        key: "ia_th",
        label: "Current THD (%)",
        fields: ["ia_th", "ib_th", "ic_th"],
        colors: ["#F5B041", "#5DADE2", "#48C9B0"],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bus::MEASUREMENT_FIELDS;

    #[test]
    fn test_format_window() {
        assert_eq!(format_window(5), "5 min");
        assert_eq!(format_window(120), "2 h");
        assert_eq!(format_window(90), "1h 30min");
    }

    #[test]
    fn test_time_label_resolution() {
        let ts = parse_timestamp("2025-03-01T14:07:09").unwrap();
        assert_eq!(time_label(&ts, 5), "14:07:09");
        assert_eq!(time_label(&ts, 59), "14:07:09");
        assert_eq!(time_label(&ts, 60), "14:07");
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let naive = parse_timestamp("2025-03-01T14:07:09.250").unwrap();
        assert_eq!(naive.format("%H:%M:%S").to_string(), "14:07:09");

        // Offset is kept as reported, not converted
        let offset = parse_timestamp("2025-03-01T14:07:09-03:00").unwrap();
        assert_eq!(offset.format("%H:%M:%S").to_string(), "14:07:09");

        let spaced = parse_timestamp("2025-03-01 14:07:09").unwrap();
        assert_eq!(spaced, parse_timestamp("2025-03-01T14:07:09").unwrap());

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_point_deserializes_from_backend_row() {
        let row = r#"{"bus_id": 3, "timestamp": "2025-03-01T12:00:05", "va_rms": 219.8, "ia_rms": null}"#;
        let point: TimeSeriesPoint = serde_json::from_str(row).unwrap();
        assert_eq!(point.measurements.va_rms, Some(219.8));
        assert_eq!(point.measurements.ia_rms, None);

        let chart_point = ChartPoint::new(point, 5);
        assert_eq!(chart_point.time, "12:00:05");
    }

    #[test]
    fn test_chart_groups_reference_known_fields() {
        for group in CHART_GROUPS {
            for field in group.fields {
                assert!(MEASUREMENT_FIELDS.contains(&field), "{} in {}", field, group.key);
            }
        }
    }

    #[test]
    fn test_window_options_sorted() {
        assert_eq!(WINDOW_OPTIONS.first(), Some(&1));
        assert_eq!(WINDOW_OPTIONS.last(), Some(&1440));
        assert!(WINDOW_OPTIONS.windows(2).all(|w| w[0] < w[1]));
    }
}
