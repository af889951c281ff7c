//! CPU-side mesh representation used by loaders.

/// Vertex with position and uv in object space. The model is ambient-lit,
/// so normals are not kept.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, uv }
    }
}

/// Sphere enclosing every vertex of a mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingSphere {
    pub center: [f32; 3],
    pub radius: f32,
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    /// Sphere centered on the axis-aligned bounds, radius reaching the
    /// farthest vertex. Empty meshes yield a zero sphere at the origin.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        let Some(first) = self.vertices.first() else {
            return BoundingSphere::default();
        };

        let mut min = first.position;
        let mut max = first.position;
        for v in &self.vertices {
            for axis in 0..3 {
                min[axis] = min[axis].min(v.position[axis]);
                max[axis] = max[axis].max(v.position[axis]);
            }
        }
        let center = [
            (min[0] + max[0]) * 0.5,
            (min[1] + max[1]) * 0.5,
            (min[2] + max[2]) * 0.5,
        ];

        let radius_sq = self
            .vertices
            .iter()
            .map(|v| {
                let dx = v.position[0] - center[0];
                let dy = v.position[1] - center[1];
                let dz = v.position[2] - center[2];
                dx * dx + dy * dy + dz * dz
            })
            .fold(0.0_f32, f32::max);

        BoundingSphere {
            center,
            radius: radius_sq.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_data_validity() {
        let data = MeshData::new(vec![MeshVertex::default()], vec![0]);
        assert!(data.is_valid());
    }

    #[test]
    fn unit_cube_sphere() {
        let mut vertices = Vec::new();
        for x in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    vertices.push(MeshVertex::new([x, y, z], [0.0, 0.0]));
                }
            }
        }
        let sphere = MeshData::new(vertices, vec![0, 1, 2]).bounding_sphere();
        assert_eq!(sphere.center, [0.0, 0.0, 0.0]);
        assert!((sphere.radius - 3f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn offset_mesh_sphere_follows_bounds_center() {
        let vertices = vec![
            MeshVertex::new([10.0, 0.0, 0.0], [0.0; 2]),
            MeshVertex::new([14.0, 0.0, 0.0], [0.0; 2]),
        ];
        let sphere = MeshData::new(vertices, vec![0, 1, 0]).bounding_sphere();
        assert_eq!(sphere.center, [12.0, 0.0, 0.0]);
        assert!((sphere.radius - 2.0).abs() < 1e-6);
    }
}
