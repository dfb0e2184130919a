//! Common routines for reading model configuration files.
use crate::id::{HasID, IDLike};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fs;
use std::path::Path;

/// Read a series of type `T`s from a CSV file into a `Vec<T>`.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_vec_from_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(file_path)
        .with_context(|| format!("Could not open {}", file_path.display()))?;

    let mut vec = Vec::new();
    for result in reader.deserialize() {
        let record: T =
            result.with_context(|| format!("Error reading {}", file_path.display()))?;
        vec.push(record);
    }

    ensure!(
        !vec.is_empty(),
        "CSV file {} cannot be empty",
        file_path.display()
    );

    Ok(vec)
}

/// Read a CSV file of records with unique IDs into an ID-keyed map.
///
/// Record order in the file is preserved in the returned map.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv_id_file<T, ID>(file_path: &Path) -> Result<IndexMap<ID, T>>
where
    T: HasID<ID> + DeserializeOwned,
    ID: IDLike,
{
    let mut map = IndexMap::new();
    for record in read_vec_from_csv::<T>(file_path)? {
        let id = record.get_id().clone();
        ensure!(
            map.insert(id.clone(), record).is_none(),
            "Duplicate ID {} in {}",
            id,
            file_path.display()
        );
    }

    Ok(map)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let contents = fs::read_to_string(file_path)
        .with_context(|| format!("Could not read {}", file_path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Error parsing {}", file_path.display()))
}

/// Read an f64, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value is not between 0 and 1"))?;
    }

    Ok(value)
}
