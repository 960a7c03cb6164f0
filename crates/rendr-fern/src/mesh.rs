use std::fmt;

use serde::Deserialize;

/// Baked fern geometry, exported from the modelling tool as JSON.
const FERN_JSON: &str = include_str!("../assets/fern.json");

/// Error loading a [`FernMesh`].
#[derive(Debug)]
pub enum MeshError {
    /// The asset is not `{ "mesh": { "vertices": .., "indices": .. } }`.
    Decode(serde_json::Error),
    /// An index points past the vertex list.
    IndexOutOfRange { index: u16, vertex_count: usize },
    /// The index list does not describe whole triangles.
    PartialTriangle { index_count: usize },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::Decode(e) => write!(f, "couldn't decode mesh asset: {e}"),
            MeshError::IndexOutOfRange {
                index,
                vertex_count,
            } => write!(f, "index {index} out of range for {vertex_count} vertices"),
            MeshError::PartialTriangle { index_count } => {
                write!(f, "{index_count} indices is not a multiple of 3")
            }
        }
    }
}

impl std::error::Error for MeshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MeshError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MeshError {
    fn from(e: serde_json::Error) -> Self {
        MeshError::Decode(e)
    }
}

#[derive(Deserialize)]
struct MeshAsset {
    mesh: FernMesh,
}

/// 2D indexed triangle mesh in world units.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FernMesh {
    pub vertices: Vec<[f32; 2]>,
    pub indices: Vec<u16>,
}

impl FernMesh {
    /// The mesh embedded in the binary.
    pub fn builtin() -> Result<Self, MeshError> {
        Self::from_json(FERN_JSON)
    }

    /// Decodes and validates a mesh asset.
    pub fn from_json(src: &str) -> Result<Self, MeshError> {
        let asset: MeshAsset = serde_json::from_str(src)?;
        asset.mesh.validate()?;
        log::debug!(
            "fern mesh: {} vertices, {} triangles",
            asset.mesh.vertices.len(),
            asset.mesh.triangle_count()
        );
        Ok(asset.mesh)
    }

    fn validate(&self) -> Result<(), MeshError> {
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::PartialTriangle {
                index_count: self.indices.len(),
            });
        }
        if let Some(&index) = self
            .indices
            .iter()
            .find(|&&i| usize::from(i) >= self.vertices.len())
        {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: self.vertices.len(),
            });
        }
        Ok(())
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Corner positions of every triangle, in index order.
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 2]; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| {
            [
                self.vertices[usize::from(t[0])],
                self.vertices[usize::from(t[1])],
                self.vertices[usize::from(t[2])],
            ]
        })
    }

    /// Every triangle scaled by `scale` about its own centroid, unindexed.
    ///
    /// Drawn over the original in the background color, this leaves a rim of
    /// width `1 - scale` around each triangle visible.
    pub fn inset_triangles(&self, scale: f32) -> Vec<[f32; 2]> {
        let mut out = Vec::with_capacity(self.indices.len());
        for tri in self.triangles() {
            let cx = (tri[0][0] + tri[1][0] + tri[2][0]) / 3.0;
            let cy = (tri[0][1] + tri[1][1] + tri[2][1]) / 3.0;
            out.extend(
                tri.iter()
                    .map(|[x, y]| [cx + (x - cx) * scale, cy + (y - cy) * scale]),
            );
        }
        out
    }
}
