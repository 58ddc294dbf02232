use crate::error::PathError;
use serde::Deserialize;
use std::{fs::File, io::BufReader, path::Path};
use tracing::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PathRecord {
    pose: RecordPose,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecordPose {
    position: RecordPosition,
}

#[derive(Debug, Deserialize)]
struct RecordPosition {
    #[serde(rename = "X")]
    x: f64,
    #[serde(rename = "Y")]
    y: f64,
}

/// Parses a path document: a JSON array of `{"Pose": {"Position": {"X", "Y"}}}` records.
pub fn parse_path(json: &str) -> Result<Vec<(f64, f64)>, PathError> {
    let records: Vec<PathRecord> = serde_json::from_str(json)?;
    Ok(into_points(records))
}

pub fn load_path(path: &Path) -> Result<Vec<(f64, f64)>, PathError> {
    let file = File::open(path)?;
    let records: Vec<PathRecord> = serde_json::from_reader(BufReader::new(file))?;
    let points = into_points(records);
    match points.first() {
        Some((x, y)) => info!("Found path. First position is {}:{}", x, y),
        None => info!("Path file {:?} holds no positions", path),
    }
    Ok(points)
}

/// Missing or malformed files are reported and treated as an empty path.
pub fn load_path_or_empty(path: &Path) -> Vec<(f64, f64)> {
    match load_path(path) {
        Ok(points) => points,
        Err(err) => {
            error!("No path found in {:?}: {}", path, err);
            vec![]
        }
    }
}

fn into_points(records: Vec<PathRecord>) -> Vec<(f64, f64)> {
    records
        .into_iter()
        .map(|record| (record.pose.position.x, record.pose.position.y))
        .collect()
}
