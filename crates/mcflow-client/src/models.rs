//! Wire models for the Materials Commons API.
//!
//! Only the fields the ETL flow depends on are required; everything else is
//! defaulted so that server responses with extra or missing fields still
//! deserialize.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A point in time, carried on the wire as bare UNIX seconds.
///
/// The server serializes timestamps as integers but has historically emitted
/// float seconds as well, so deserialization accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp(pub i64);

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

struct TimestampVisitor;

impl<'de> Visitor<'de> for TimestampVisitor {
    type Value = Timestamp;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("UNIX seconds as an integer or float")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Timestamp, E> {
        Ok(Timestamp(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Timestamp, E> {
        Ok(Timestamp(v as i64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Timestamp, E> {
        Ok(Timestamp(v as i64))
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TimestampVisitor)
    }
}

/// A project is the container for experiments, samples and files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub birthtime: Timestamp,
    #[serde(default)]
    pub mtime: Timestamp,
}

/// An experiment holds the workflow built from one spreadsheet load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
}

/// A sample together with its current property-set identity.
///
/// Every transforming process step produces a new `property_set_id` for the
/// sample; the pair `(id, property_set_id)` is what downstream steps consume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub property_set_id: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub description: String,
}

/// A server-side process instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Process {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub does_transform: bool,
    #[serde(default)]
    pub process_type: String,
}

/// A named group of setup properties sent with process creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Setup {
    pub name: String,
    pub attribute: String,
    #[serde(default)]
    pub properties: Vec<SetupProperty>,
}

/// One process attribute inside a [`Setup`] block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetupProperty {
    pub name: String,
    pub attribute: String,
    pub otype: String,
    pub unit: String,
    pub value: Value,
}

/// A sample property carrying one or more measurements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Property {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub measurements: Vec<Measurement>,
}

/// A sample property as sent to `addMeasurementsToSampleInProcess`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleProperty {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub measurements: Vec<Measurement>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
}

/// One measured value of an attribute at a process step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Measurement {
    pub otype: String,
    pub unit: String,
    pub value: Value,
    #[serde(default)]
    pub is_best_measure: bool,
}

/// A file known to the project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct File {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
}

/// A file attached to a process, by id or by project path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileAndDirection {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    pub direction: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_serializes_as_bare_integer() {
        let json = serde_json::to_string(&Timestamp(1_556_000_000)).unwrap();
        assert_eq!(json, "1556000000");
    }

    #[test]
    fn test_timestamp_accepts_integer_seconds() {
        let ts: Timestamp = serde_json::from_str("1556000000").unwrap();
        assert_eq!(ts, Timestamp(1_556_000_000));
    }

    #[test]
    fn test_timestamp_accepts_float_seconds() {
        let ts: Timestamp = serde_json::from_str("1556000000.75").unwrap();
        assert_eq!(ts, Timestamp(1_556_000_000));
    }

    #[test]
    fn test_timestamp_rejects_strings() {
        assert!(serde_json::from_str::<Timestamp>("\"2019-04-23\"").is_err());
    }

    #[test]
    fn test_sample_deserializes_with_missing_optional_fields() {
        let sample: Sample =
            serde_json::from_str(r#"{"id":"s1","name":"S1","property_set_id":"ps1"}"#).unwrap();
        assert_eq!(sample.id, "s1");
        assert_eq!(sample.property_set_id, "ps1");
        assert!(sample.owner.is_empty());
    }

    #[test]
    fn test_file_and_direction_omits_empty_selectors() {
        let file = FileAndDirection {
            file_id: String::new(),
            path: "data/run1.tif".into(),
            direction: "in".into(),
        };
        let json = serde_json::to_value(&file).unwrap();
        assert!(json.get("file_id").is_none());
        assert_eq!(json["path"], "data/run1.tif");
    }

    #[test]
    fn test_project_deserializes_with_timestamps() {
        let project: Project = serde_json::from_str(
            r#"{"id":"p1","name":"Alloys","birthtime":1556000000,"mtime":1556000001.5}"#,
        )
        .unwrap();
        assert_eq!(project.birthtime, Timestamp(1_556_000_000));
        assert_eq!(project.mtime, Timestamp(1_556_000_001));
    }
}
