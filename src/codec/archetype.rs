use crate::error::CodecError;

/// VTK cell type code for a general polyhedron.
pub const VTK_POLYHEDRON: i64 = 42;

/// A face template: the cycle of cell-local vertex indices defining one
/// face of a fixed cell archetype, in outward winding order.
pub type FaceTemplate = &'static [usize];

/// The polyhedral cell archetypes the codecs understand.
///
/// Each fixed archetype carries a constant table of face templates. The
/// general [`Polyhedron`](Self::Polyhedron) has no fixed table; its face
/// structure arrives per-instance in the input data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellArchetype {
    Tetra,
    Hexahedron,
    Wedge,
    Pyramid,
    PentagonalPrism,
    HexagonalPrism,
    Polyhedron,
}

const TETRA_FACES: &[FaceTemplate] = &[&[0, 2, 1], &[0, 1, 3], &[1, 2, 3], &[0, 3, 2]];

// Face loop direction is inverted relative to the VTK corner order so that
// boundary normals point out of the cell.
const HEX_FACES: &[FaceTemplate] = &[
    &[0, 3, 2, 1],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
    &[7, 4, 5, 6],
];

const WEDGE_FACES: &[FaceTemplate] = &[
    &[0, 1, 2],
    &[0, 3, 4, 1],
    &[1, 4, 5, 2],
    &[2, 5, 3, 0],
    &[3, 5, 4],
];

const PYRAMID_FACES: &[FaceTemplate] = &[
    &[0, 3, 2, 1],
    &[0, 4, 3],
    &[3, 4, 2],
    &[2, 4, 1],
    &[1, 4, 0],
];

const PENTA_PRISM_FACES: &[FaceTemplate] = &[
    &[0, 1, 2, 3, 4],
    &[0, 5, 6, 1],
    &[1, 6, 7, 2],
    &[2, 7, 8, 3],
    &[3, 8, 9, 4],
    &[4, 9, 5, 0],
    &[9, 8, 7, 6, 5],
];

const HEXA_PRISM_FACES: &[FaceTemplate] = &[
    &[0, 1, 2, 3, 4, 5],
    &[0, 6, 7, 1],
    &[1, 7, 8, 2],
    &[2, 8, 9, 3],
    &[3, 9, 10, 4],
    &[4, 10, 11, 5],
    &[5, 11, 6, 0],
    &[11, 10, 9, 8, 7, 6],
];

impl CellArchetype {
    /// Maps a VTK cell type code to its archetype.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedCellType`] for any code outside the
    /// supported set. The failure is per-cell; callers decide whether to
    /// skip the cell or abort the import.
    pub fn from_vtk_type(vtk_type: i64) -> Result<Self, CodecError> {
        match vtk_type {
            10 => Ok(Self::Tetra),
            12 => Ok(Self::Hexahedron),
            13 => Ok(Self::Wedge),
            14 => Ok(Self::Pyramid),
            15 => Ok(Self::PentagonalPrism),
            16 => Ok(Self::HexagonalPrism),
            VTK_POLYHEDRON => Ok(Self::Polyhedron),
            other => Err(CodecError::UnsupportedCellType { vtk_type: other }),
        }
    }

    /// The ordered face templates of this archetype.
    ///
    /// Empty for [`Polyhedron`](Self::Polyhedron), whose faces are supplied
    /// by the input data instead of a fixed table.
    #[must_use]
    pub fn face_templates(self) -> &'static [FaceTemplate] {
        match self {
            Self::Tetra => TETRA_FACES,
            Self::Hexahedron => HEX_FACES,
            Self::Wedge => WEDGE_FACES,
            Self::Pyramid => PYRAMID_FACES,
            Self::PentagonalPrism => PENTA_PRISM_FACES,
            Self::HexagonalPrism => HEXA_PRISM_FACES,
            Self::Polyhedron => &[],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn vtk_codes_map_to_archetypes() {
        assert_eq!(CellArchetype::from_vtk_type(10).unwrap(), CellArchetype::Tetra);
        assert_eq!(
            CellArchetype::from_vtk_type(12).unwrap(),
            CellArchetype::Hexahedron
        );
        assert_eq!(
            CellArchetype::from_vtk_type(42).unwrap(),
            CellArchetype::Polyhedron
        );
    }

    #[test]
    fn unknown_code_is_rejected_with_the_offending_code() {
        let err = CellArchetype::from_vtk_type(11).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnsupportedCellType { vtk_type: 11 }
        ));
    }

    #[test]
    fn face_counts_match_the_archetypes() {
        assert_eq!(CellArchetype::Tetra.face_templates().len(), 4);
        assert_eq!(CellArchetype::Hexahedron.face_templates().len(), 6);
        assert_eq!(CellArchetype::Wedge.face_templates().len(), 5);
        assert_eq!(CellArchetype::Pyramid.face_templates().len(), 5);
        assert_eq!(CellArchetype::PentagonalPrism.face_templates().len(), 7);
        assert_eq!(CellArchetype::HexagonalPrism.face_templates().len(), 8);
        assert!(CellArchetype::Polyhedron.face_templates().is_empty());
    }

    #[test]
    fn every_template_edge_is_shared_by_exactly_two_faces() {
        // A closed polyhedron traverses each edge once in each direction.
        for archetype in [
            CellArchetype::Tetra,
            CellArchetype::Hexahedron,
            CellArchetype::Wedge,
            CellArchetype::Pyramid,
            CellArchetype::PentagonalPrism,
            CellArchetype::HexagonalPrism,
        ] {
            let mut edges = Vec::new();
            for template in archetype.face_templates() {
                let n = template.len();
                for i in 0..n {
                    edges.push((template[i], template[(i + 1) % n]));
                }
            }
            for &(a, b) in &edges {
                assert!(
                    edges.contains(&(b, a)),
                    "{archetype:?}: edge ({a}, {b}) has no reversed twin"
                );
                assert_eq!(
                    edges.iter().filter(|e| **e == (a, b)).count(),
                    1,
                    "{archetype:?}: edge ({a}, {b}) traversed more than once"
                );
            }
        }
    }
}
