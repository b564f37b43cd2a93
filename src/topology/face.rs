use super::cell::CellId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for a face in the mesh store.
    pub struct FaceId;
}

/// Data associated with a mesh face.
///
/// The vertex sequence defines both the polygon and its winding (normal
/// direction). A face is adjacent to exactly one cell (its owner) or two
/// (owner and neighbour); a face without a neighbour lies on the mesh
/// boundary.
#[derive(Debug, Clone)]
pub struct FaceData {
    /// The ordered vertex cycle of the face.
    pub verts: Vec<VertexId>,
    /// The owning cell. Every face has one.
    pub owner: CellId,
    /// The cell on the other side, if the face is internal.
    pub neighbour: Option<CellId>,
    /// Boundary patch slot index. `None` until boundary assignment; never
    /// set on a face that has a neighbour.
    pub patch: Option<usize>,
    /// Logical deletion flag.
    pub deleted: bool,
}

impl FaceData {
    /// Creates a new live face owned by `owner` with the given vertex cycle.
    #[must_use]
    pub fn new(verts: Vec<VertexId>, owner: CellId) -> Self {
        Self {
            verts,
            owner,
            neighbour: None,
            patch: None,
            deleted: false,
        }
    }

    /// Returns `true` if the face has no neighbour cell.
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.neighbour.is_none()
    }
}
