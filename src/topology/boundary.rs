slotmap::new_key_type! {
    /// Unique identifier for a boundary patch in the mesh store.
    pub struct PatchId;
}

/// A named, contiguous group of boundary faces.
///
/// Patch creation order defines the patch slot index space referenced by
/// [`FaceData::patch`](super::face::FaceData::patch). A deleted patch keeps
/// its slot so face assignments stay valid, but contributes no faces to an
/// export pass.
#[derive(Debug, Clone)]
pub struct PatchData {
    /// Unique patch name.
    pub name: String,
    /// Patch type tag, e.g. `patch` or `wall`. Free-form.
    pub type_name: String,
    /// Raw `inGroups` membership string, if present in the source.
    pub in_groups: Option<String>,
    /// Number of boundary faces in the patch, as imported. Re-derived on
    /// export.
    pub n_faces: usize,
    /// Index of the patch's first face in the export face ordering, as
    /// imported. Re-derived on export.
    pub start_face: usize,
    /// Logical deletion flag.
    pub deleted: bool,
}

impl PatchData {
    /// Creates a new live patch with the default `patch` type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: "patch".to_string(),
            in_groups: None,
            n_faces: 0,
            start_face: 0,
            deleted: false,
        }
    }
}
