use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// one row of the `sensor_readings` table
///
/// immutable once built: a newer row replaces it wholesale, fields are
/// never merged across rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// primary key, if the table exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// temperature in celsius
    #[serde(default, deserialize_with = "null_as_zero")]
    pub sensor1: f64,

    /// relative humidity (0-100%)
    #[serde(default, deserialize_with = "null_as_zero")]
    pub sensor2: f64,

    /// soil moisture (0-100%)
    #[serde(default, deserialize_with = "null_as_zero")]
    pub sensor3: f64,

    /// gas concentration in ppm
    #[serde(default, deserialize_with = "null_as_zero")]
    pub sensor4: f64,

    /// insert time, set by the database
    pub created_at: DateTime<Utc>,
}

impl Reading {
    #[cfg(test)]
    pub fn new(sensor1: f64, sensor2: f64, sensor3: f64, sensor4: f64, created_at: DateTime<Utc>) -> Self {
        Self { id: None, sensor1, sensor2, sensor3, sensor4, created_at }
    }

    pub fn temperature(&self) -> f64 { self.sensor1 }
    pub fn humidity(&self) -> f64 { self.sensor2 }
    pub fn soil_moisture(&self) -> f64 { self.sensor3 }
    pub fn gas(&self) -> f64 { self.sensor4 }
}

/// the sensor columns come back as `null` when a node skipped a channel.
/// the dashboard shows those as 0.
fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_table_row() {
        let row = r#"{
            "id": 42,
            "sensor1": 25.5,
            "sensor2": 45,
            "sensor3": 55,
            "sensor4": 150,
            "created_at": "2025-03-01T10:15:30.123456+00:00"
        }"#;
        let reading: Reading = serde_json::from_str(row).unwrap();
        assert_eq!(reading.id, Some(42));
        assert_eq!(reading.temperature(), 25.5);
        assert_eq!(reading.humidity(), 45.0);
        assert_eq!(reading.soil_moisture(), 55.0);
        assert_eq!(reading.gas(), 150.0);
    }

    #[test]
    fn null_channels_read_as_zero() {
        let row = r#"{"sensor1": null, "sensor2": 10, "sensor3": null,
                      "created_at": "2025-03-01T10:15:30Z"}"#;
        let reading: Reading = serde_json::from_str(row).unwrap();
        assert_eq!(reading.id, None);
        assert_eq!(reading.sensor1, 0.0);
        assert_eq!(reading.sensor3, 0.0);
        assert_eq!(reading.sensor4, 0.0);
        assert_eq!(reading.sensor2, 10.0);
    }

    #[test]
    fn missing_timestamp_is_rejected() {
        let row = r#"{"sensor1": 1, "sensor2": 2, "sensor3": 3, "sensor4": 4}"#;
        assert!(serde_json::from_str::<Reading>(row).is_err());
    }
}
