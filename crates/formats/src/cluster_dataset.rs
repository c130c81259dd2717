//! Cluster payload decoding.
//!
//! The host page embeds the dataset as a JSON array of
//! `{"x": [...], "y": [...], "z": [...]}` objects. Order is significant: a
//! cluster's position in the array selects its color.

use foundation::bounds::Aabb3;
use foundation::math::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("cluster payload is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("cluster {cluster}: coordinate lengths differ (x={x}, y={y}, z={z})")]
    LengthMismatch {
        cluster: usize,
        x: usize,
        y: usize,
        z: usize,
    },
    #[error("cluster {cluster}: non-finite {axis} coordinate at index {index}")]
    NonFinite {
        cluster: usize,
        axis: char,
        index: usize,
    },
}

/// One cluster as three parallel coordinate sequences.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cluster {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl Cluster {
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Self {
        Self { x, y, z }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((&x, &y), &z)| Vec3::new(x, y, z))
    }

    fn validate(&self, cluster: usize) -> Result<(), DatasetError> {
        let (x, y, z) = (self.x.len(), self.y.len(), self.z.len());
        if x != y || y != z {
            return Err(DatasetError::LengthMismatch { cluster, x, y, z });
        }
        for (axis, values) in [('x', &self.x), ('y', &self.y), ('z', &self.z)] {
            if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                return Err(DatasetError::NonFinite {
                    cluster,
                    axis,
                    index,
                });
            }
        }
        Ok(())
    }
}

/// Validated, immutable cluster dataset.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ClusterDataset {
    clusters: Vec<Cluster>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DatasetSummary {
    pub clusters: usize,
    pub points: usize,
    pub empty_clusters: usize,
    pub bounds: Option<Aabb3>,
}

impl ClusterDataset {
    pub fn new(clusters: Vec<Cluster>) -> Result<Self, DatasetError> {
        for (idx, cluster) in clusters.iter().enumerate() {
            cluster.validate(idx)?;
        }
        Ok(Self { clusters })
    }

    pub fn from_json_str(payload: &str) -> Result<Self, DatasetError> {
        let clusters: Vec<Cluster> = serde_json::from_str(payload)?;
        Self::new(clusters)
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            clusters: self.clusters.len(),
            points: self.clusters.iter().map(Cluster::len).sum(),
            empty_clusters: self.clusters.iter().filter(|c| c.is_empty()).count(),
            bounds: Aabb3::from_points(self.clusters.iter().flat_map(Cluster::points)),
        }
    }
}
