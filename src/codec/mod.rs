pub mod archetype;
pub mod dedup;
pub mod polymesh;
pub mod vtu;

pub use archetype::CellArchetype;
pub use dedup::FaceDeduplicator;
pub use polymesh::{
    read_polymesh_dir, write_polymesh_dir, PolyMeshBlocks, PolyMeshExport, PolyMeshImport,
};
pub use vtu::{read_vtu_file, validate_vtu, write_vtu_file, VtuExport, VtuImport};

/// Record counts produced by an import pass.
///
/// Permissive parsing keys success on these counts rather than on strict
/// grammar conformance; callers compare them against expectations from the
/// source data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Number of vertices created.
    pub points: usize,
    /// Number of faces created.
    pub faces: usize,
    /// Number of internal (two-sided) faces.
    pub internal_faces: usize,
    /// Number of boundary faces.
    pub boundary_faces: usize,
    /// Number of cells created.
    pub cells: usize,
    /// Number of boundary patches created.
    pub patches: usize,
}

/// Formats a coordinate with 6 significant digits, matching C's `%.6g`:
/// trailing zeros are trimmed and scientific notation kicks in outside
/// the exponent range `[-4, 6)`.
#[must_use]
pub(crate) fn format_g6(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    // Round to 6 significant digits first so exponent bumps (e.g.
    // 999999.5 -> 1e+06) land in the right branch.
    let sci = format!("{value:.5e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if !(-4..6).contains(&exp) {
        let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
        format!("{mantissa}e{exp:+03}")
    } else {
        let decimals = usize::try_from(5 - exp).unwrap_or(0);
        let fixed = format!("{value:.decimals$}");
        if fixed.contains('.') {
            fixed
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string()
        } else {
            fixed
        }
    }
}
