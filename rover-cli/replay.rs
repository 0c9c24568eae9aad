use std::path::{Path, PathBuf};
use rover_core::{Frame, Pose};
use serde::{Deserialize, Serialize};
use crate::{PerceptionError, PerceptionResult};

/// One recorded camera frame with the pose reported alongside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub image: PathBuf,
    pub pose: Pose,
}

/// Parse a JSON manifest: an array of frame records in playback order
pub fn parse_manifest(json: &str) -> PerceptionResult<Vec<FrameRecord>> {
    serde_json::from_str(json).map_err(|e| PerceptionError::Manifest(e.to_string()))
}

/// Load a manifest file; relative image paths resolve against the manifest's directory
pub fn load_manifest<P: AsRef<Path>>(path: P) -> PerceptionResult<Vec<FrameRecord>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let records = parse_manifest(&content)?
        .into_iter()
        .map(|mut record| {
            if record.image.is_relative() {
                record.image = base.join(&record.image);
            }
            record
        })
        .collect();
    Ok(records)
}

/// Decode an image file into an RGB frame
pub fn load_frame<P: AsRef<Path>>(path: P) -> PerceptionResult<Frame> {
    Ok(image::open(path)?.to_rgb8())
}
