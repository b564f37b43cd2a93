pub mod boundary;
pub mod cell;
pub mod face;
pub mod vertex;

pub use boundary::{PatchData, PatchId};
pub use cell::{CellData, CellId};
pub use face::{FaceData, FaceId};
pub use vertex::{VertexData, VertexId};

use crate::error::TopologyError;
use slotmap::SlotMap;

/// Central arena that owns all mesh entities for one editing session.
///
/// Entities reference each other via typed IDs (generational indices),
/// avoiding self-referential structures and enabling safe mutation. In
/// addition to the arenas, the store keeps per-kind creation-order lists:
/// the external interchange formats address entities by their position in
/// an ordered sequence, so iteration order must be stable.
///
/// The store never removes entities. Editing collaborators mark them
/// deleted via the `deleted` flags, and export passes and queries skip
/// tombstoned entries.
#[derive(Debug, Default)]
pub struct MeshStore {
    vertices: SlotMap<VertexId, VertexData>,
    faces: SlotMap<FaceId, FaceData>,
    cells: SlotMap<CellId, CellData>,
    patches: SlotMap<PatchId, PatchData>,
    vertex_order: Vec<VertexId>,
    face_order: Vec<FaceId>,
    cell_order: Vec<CellId>,
    patch_order: Vec<PatchId>,
}

impl MeshStore {
    /// Creates a new, empty mesh store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    pub fn add_vertex(&mut self, data: VertexData) -> VertexId {
        let id = self.vertices.insert(data);
        self.vertex_order.push(id);
        id
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData, TopologyError> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Returns a mutable reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData, TopologyError> {
        self.vertices
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Vertex IDs in creation order, including deleted entries.
    #[must_use]
    pub fn vertex_ids(&self) -> &[VertexId] {
        &self.vertex_order
    }

    // --- Face operations ---

    /// Inserts a face and returns its ID.
    pub fn add_face(&mut self, data: FaceData) -> FaceId {
        let id = self.faces.insert(data);
        self.face_order.push(id);
        id
    }

    /// Returns a reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn face(&self, id: FaceId) -> Result<&FaceData, TopologyError> {
        self.faces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    /// Returns a mutable reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn face_mut(&mut self, id: FaceId) -> Result<&mut FaceData, TopologyError> {
        self.faces
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    /// Face IDs in creation order, including deleted entries.
    #[must_use]
    pub fn face_ids(&self) -> &[FaceId] {
        &self.face_order
    }

    // --- Cell operations ---

    /// Inserts a cell and returns its ID.
    pub fn add_cell(&mut self, data: CellData) -> CellId {
        let id = self.cells.insert(data);
        self.cell_order.push(id);
        id
    }

    /// Returns a reference to the cell data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn cell(&self, id: CellId) -> Result<&CellData, TopologyError> {
        self.cells
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("cell".into()))
    }

    /// Returns a mutable reference to the cell data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn cell_mut(&mut self, id: CellId) -> Result<&mut CellData, TopologyError> {
        self.cells
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("cell".into()))
    }

    /// Cell IDs in creation order, including deleted entries.
    #[must_use]
    pub fn cell_ids(&self) -> &[CellId] {
        &self.cell_order
    }

    // --- Patch operations ---

    /// Inserts a boundary patch and returns its ID.
    ///
    /// The patch occupies the next slot in patch creation order; that slot
    /// number is the patch index faces refer to.
    pub fn add_patch(&mut self, data: PatchData) -> PatchId {
        let id = self.patches.insert(data);
        self.patch_order.push(id);
        id
    }

    /// Returns a reference to the patch data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn patch(&self, id: PatchId) -> Result<&PatchData, TopologyError> {
        self.patches
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("patch".into()))
    }

    /// Returns a mutable reference to the patch data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn patch_mut(&mut self, id: PatchId) -> Result<&mut PatchData, TopologyError> {
        self.patches
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("patch".into()))
    }

    /// Patch IDs in creation (slot) order, including deleted entries.
    #[must_use]
    pub fn patch_ids(&self) -> &[PatchId] {
        &self.patch_order
    }

    // --- Structure maintenance ---

    /// Attaches a face to a cell, merging the face's unseen vertices into
    /// the cell's derived vertex list.
    ///
    /// Maintains the invariant that a cell's vertex set equals the union of
    /// its faces' vertex sets.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or cell is not found in the store.
    pub fn attach_face_to_cell(
        &mut self,
        face_id: FaceId,
        cell_id: CellId,
    ) -> Result<(), TopologyError> {
        let face_verts = self.face(face_id)?.verts.clone();
        let cell = self
            .cells
            .get_mut(cell_id)
            .ok_or_else(|| TopologyError::EntityNotFound("cell".into()))?;
        cell.faces.push(face_id);
        for v in face_verts {
            if !cell.verts.contains(&v) {
                cell.verts.push(v);
            }
        }
        Ok(())
    }

    // --- Queries ---

    /// Number of non-deleted vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_order
            .iter()
            .filter(|id| !self.vertices[**id].deleted)
            .count()
    }

    /// Number of non-deleted faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.face_order
            .iter()
            .filter(|id| !self.faces[**id].deleted)
            .count()
    }

    /// Number of non-deleted cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cell_order
            .iter()
            .filter(|id| !self.cells[**id].deleted)
            .count()
    }

    /// Number of non-deleted patches.
    #[must_use]
    pub fn patch_count(&self) -> usize {
        self.patch_order
            .iter()
            .filter(|id| !self.patches[**id].deleted)
            .count()
    }

    /// Number of non-deleted internal faces (faces with a neighbour).
    #[must_use]
    pub fn internal_face_count(&self) -> usize {
        self.face_order
            .iter()
            .filter(|id| {
                let f = &self.faces[**id];
                !f.deleted && !f.is_boundary()
            })
            .count()
    }

    /// Number of non-deleted boundary faces.
    #[must_use]
    pub fn boundary_face_count(&self) -> usize {
        self.face_order
            .iter()
            .filter(|id| {
                let f = &self.faces[**id];
                !f.deleted && f.is_boundary()
            })
            .count()
    }

    /// Vertex cycles of all non-deleted boundary faces, in face creation
    /// order. This is the polygon connectivity the host environment draws.
    #[must_use]
    pub fn boundary_polygons(&self) -> Vec<Vec<VertexId>> {
        self.face_order
            .iter()
            .map(|id| &self.faces[*id])
            .filter(|f| !f.deleted && f.is_boundary())
            .map(|f| f.verts.clone())
            .collect()
    }

    /// Vertex index pairs tracing the edges of all non-deleted internal
    /// faces. Hosts may draw these as wireframe edges; internal faces never
    /// become polygons.
    #[must_use]
    pub fn internal_edges(&self) -> Vec<(VertexId, VertexId)> {
        let mut edges = Vec::new();
        for id in &self.face_order {
            let f = &self.faces[*id];
            if f.deleted || f.is_boundary() {
                continue;
            }
            let n = f.verts.len();
            for j in 0..n {
                edges.push((f.verts[(j + n - 1) % n], f.verts[j]));
            }
        }
        edges
    }
}
