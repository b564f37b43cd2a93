use rustc_hash::FxHashMap;

use crate::error::{CodecError, Result, TopologyError};
use crate::topology::{CellId, FaceData, FaceId, MeshStore, VertexId};

/// Resolves cell face descriptions to shared [`FaceData`] records.
///
/// Two adjacent cells describe their common face with opposite windings.
/// The deduplicator keys faces by their sorted absolute vertex-index list,
/// so both descriptions collide on the same key: the first cell to mention
/// a face becomes its owner (and its winding is the one stored), the second
/// becomes its neighbour. A third claimant is a non-manifold input and
/// fails deterministically.
///
/// The key map is scoped to one import pass in practice, but reusing an
/// instance across repeated partial imports is supported.
#[derive(Debug, Default)]
pub struct FaceDeduplicator {
    facemap: FxHashMap<Vec<u32>, FaceId>,
}

impl FaceDeduplicator {
    /// Creates a deduplicator with an empty face map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves one cell's faces, given as absolute vertex-index lists, and
    /// attaches them to the cell.
    ///
    /// `vertex_table` maps absolute indices to store vertices in creation
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::DuplicateFaceOwnership`] if a face already has
    /// both an owner and a neighbour, and a topology error if a vertex
    /// index is out of range.
    pub fn add_cell_faces(
        &mut self,
        store: &mut MeshStore,
        cell: CellId,
        face_lists: &[Vec<u32>],
        vertex_table: &[VertexId],
    ) -> Result<()> {
        for vilist in face_lists {
            let mut key = vilist.clone();
            key.sort_unstable();

            let face_id = if let Some(&existing) = self.facemap.get(&key) {
                let face = store.face_mut(existing)?;
                if face.neighbour.is_some() {
                    return Err(CodecError::DuplicateFaceOwnership { key }.into());
                }
                face.neighbour = Some(cell);
                existing
            } else {
                let verts = vilist
                    .iter()
                    .map(|&vi| {
                        vertex_table.get(vi as usize).copied().ok_or_else(|| {
                            TopologyError::InvalidTopology(format!(
                                "vertex index {vi} exceeds point count {}",
                                vertex_table.len()
                            ))
                        })
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                let id = store.add_face(FaceData::new(verts, cell));
                self.facemap.insert(key, id);
                id
            };

            store.attach_face_to_cell(face_id, cell)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::CellArchetype;
    use crate::error::UgridError;
    use crate::math::Point3;
    use crate::topology::{CellData, VertexData};

    /// Resolves an archetype's local templates through a cell vertex list.
    fn absolute_faces(archetype: CellArchetype, vilist: &[u32]) -> Vec<Vec<u32>> {
        archetype
            .face_templates()
            .iter()
            .map(|t| t.iter().map(|&i| vilist[i]).collect())
            .collect()
    }

    #[allow(clippy::cast_precision_loss)]
    fn grid_store(n: usize) -> (MeshStore, Vec<VertexId>) {
        let mut store = MeshStore::new();
        let table: Vec<VertexId> = (0..n)
            .map(|i| store.add_vertex(VertexData::new(Point3::new(i as f64, 0.0, 0.0))))
            .collect();
        (store, table)
    }

    // ── Shared face between two hexahedra ──────────────────────

    #[test]
    fn adjacent_hexahedra_share_exactly_one_face() {
        let (mut store, table) = grid_store(12);
        let mut dedup = FaceDeduplicator::new();

        // Two unit hexes stacked along x share the quad 1-2-6-5 / 4-5-9-8
        // in their respective local orders.
        let left: Vec<u32> = vec![0, 1, 5, 4, 2, 3, 7, 6];
        let right: Vec<u32> = vec![1, 8, 9, 5, 3, 10, 11, 7];

        let c0 = store.add_cell(CellData::new());
        dedup
            .add_cell_faces(
                &mut store,
                c0,
                &absolute_faces(CellArchetype::Hexahedron, &left),
                &table,
            )
            .unwrap();
        let c1 = store.add_cell(CellData::new());
        dedup
            .add_cell_faces(
                &mut store,
                c1,
                &absolute_faces(CellArchetype::Hexahedron, &right),
                &table,
            )
            .unwrap();

        // 6 + 6 faces collapse to 11: one is shared.
        assert_eq!(store.face_count(), 11);
        let shared: Vec<_> = store
            .face_ids()
            .iter()
            .filter(|id| store.face(**id).unwrap().neighbour.is_some())
            .collect();
        assert_eq!(shared.len(), 1);
        let face = store.face(*shared[0]).unwrap();
        assert_eq!(face.owner, c0);
        assert_eq!(face.neighbour, Some(c1));
        assert_eq!(store.boundary_face_count(), 10);
    }

    // ── Third claimant fails ───────────────────────────────────

    #[test]
    fn third_cell_claiming_a_face_fails() {
        let (mut store, table) = grid_store(8);
        let mut dedup = FaceDeduplicator::new();
        let quad = vec![vec![0, 1, 2, 3]];

        for expect_ok in [true, true, false] {
            let cell = store.add_cell(CellData::new());
            let res = dedup.add_cell_faces(&mut store, cell, &quad, &table);
            if expect_ok {
                res.unwrap();
            } else {
                assert!(matches!(
                    res.unwrap_err(),
                    UgridError::Codec(CodecError::DuplicateFaceOwnership { .. })
                ));
            }
        }
    }

    // ── Winding does not defeat deduplication ──────────────────

    #[test]
    fn opposite_windings_collide_and_first_winding_is_kept() {
        let (mut store, table) = grid_store(4);
        let mut dedup = FaceDeduplicator::new();

        let c0 = store.add_cell(CellData::new());
        dedup
            .add_cell_faces(&mut store, c0, &[vec![0, 1, 2, 3]], &table)
            .unwrap();
        let c1 = store.add_cell(CellData::new());
        dedup
            .add_cell_faces(&mut store, c1, &[vec![3, 2, 1, 0]], &table)
            .unwrap();

        assert_eq!(store.face_count(), 1);
        let face = store.face(store.face_ids()[0]).unwrap();
        assert_eq!(face.verts, vec![table[0], table[1], table[2], table[3]]);
    }

    // ── Cell vertex sets are derived from faces ────────────────

    #[test]
    fn cell_verts_equal_union_of_face_verts() {
        let (mut store, table) = grid_store(4);
        let mut dedup = FaceDeduplicator::new();
        let tet: Vec<u32> = vec![0, 1, 2, 3];

        let cell = store.add_cell(CellData::new());
        dedup
            .add_cell_faces(
                &mut store,
                cell,
                &absolute_faces(CellArchetype::Tetra, &tet),
                &table,
            )
            .unwrap();

        let data = store.cell(cell).unwrap();
        assert_eq!(data.faces.len(), 4);
        assert_eq!(data.verts.len(), 4);
    }

    #[test]
    fn out_of_range_vertex_index_is_an_error() {
        let (mut store, table) = grid_store(2);
        let mut dedup = FaceDeduplicator::new();
        let cell = store.add_cell(CellData::new());
        let res = dedup.add_cell_faces(&mut store, cell, &[vec![0, 1, 9]], &table);
        assert!(matches!(res.unwrap_err(), UgridError::Topology(_)));
    }
}
