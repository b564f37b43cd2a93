use crate::math::Point3;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in the mesh store.
    pub struct VertexId;
}

/// Data associated with a mesh vertex.
#[derive(Debug, Clone)]
pub struct VertexData {
    /// The 3D position of the vertex.
    pub point: Point3,
    /// Logical deletion flag. Deleted vertices keep their slot but are
    /// skipped by export passes and queries.
    pub deleted: bool,
}

impl VertexData {
    /// Creates a new live vertex at the given point.
    #[must_use]
    pub fn new(point: Point3) -> Self {
        Self {
            point,
            deleted: false,
        }
    }
}
