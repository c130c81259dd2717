use foundation::color::cluster_color;
use formats::{Cluster, ClusterDataset};
use scene::components::PointCloud;

/// Rendered point size in scene units.
pub const POINT_SIZE: f32 = 0.3;

/// Point cloud for cluster `index` of `count`.
///
/// Assumes equal-length coordinate arrays; `ClusterDataset` guarantees that.
pub fn build_point_cloud(cluster: &Cluster, index: usize, count: usize, point_size: f32) -> PointCloud {
    let n = cluster.x.len();
    let mut positions = Vec::with_capacity(n * 3);
    for k in 0..n {
        positions.push(cluster.x[k] as f32);
        positions.push(cluster.y[k] as f32);
        positions.push(cluster.z[k] as f32);
    }
    PointCloud::new(positions, cluster_color(index, count).to_rgb(), point_size)
}

/// One cloud per cluster, in dataset order.
pub fn build_point_clouds(dataset: &ClusterDataset, point_size: f32) -> Vec<PointCloud> {
    let count = dataset.len();
    dataset
        .clusters()
        .iter()
        .enumerate()
        .map(|(index, cluster)| build_point_cloud(cluster, index, count, point_size))
        .collect()
}
