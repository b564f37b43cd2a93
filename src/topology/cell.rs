use super::face::FaceId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for a cell in the mesh store.
    pub struct CellId;
}

/// Data associated with a mesh cell (a closed polyhedral volume).
///
/// `verts` is derived state: the first-seen-order union of the attached
/// faces' vertices, maintained by
/// [`MeshStore::attach_face_to_cell`](super::MeshStore::attach_face_to_cell).
#[derive(Debug, Clone, Default)]
pub struct CellData {
    /// The faces enclosing this cell.
    pub faces: Vec<FaceId>,
    /// The vertices of this cell, deduplicated, in first-seen order.
    pub verts: Vec<VertexId>,
    /// Logical deletion flag.
    pub deleted: bool,
}

impl CellData {
    /// Creates a new empty live cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
