//! OpenFOAM polyMesh codec.
//!
//! A polyMesh directory holds five sibling text files (`points`, `faces`,
//! `owner`, `neighbour`, `boundary`) in OpenFOAM dictionary syntax. The
//! parsers here are deliberately permissive line scanners: lines that do
//! not match the expected shape are skipped, and the record counts logged
//! at each stage are the success signal, not grammar conformance.

use std::fs;
use std::path::Path;

use slotmap::SecondaryMap;
use tracing::{debug, warn};

use crate::codec::{format_g6, ImportSummary};
use crate::error::{CodecError, Result, TopologyError};
use crate::math::Point3;
use crate::topology::{
    CellData, CellId, FaceData, FaceId, MeshStore, PatchData, VertexData, VertexId,
};

/// The five text blocks of a polyMesh directory.
#[derive(Debug, Clone, Default)]
pub struct PolyMeshBlocks {
    pub points: String,
    pub faces: String,
    pub owner: String,
    pub neighbour: String,
    pub boundary: String,
}

const POLYMESH_FILES: [&str; 5] = ["points", "faces", "owner", "neighbour", "boundary"];

/// Reads the five polyMesh files from a directory.
///
/// # Errors
///
/// Returns [`CodecError::Io`] naming the first missing or unreadable file.
/// Nothing is parsed and no state is mutated on failure.
pub fn read_polymesh_dir(dir: &Path) -> Result<PolyMeshBlocks> {
    let mut blocks = PolyMeshBlocks::default();
    for name in POLYMESH_FILES {
        let path = dir.join(name);
        debug!(path = %path.display(), "reading polyMesh file");
        let text = fs::read_to_string(&path).map_err(|source| CodecError::Io { path, source })?;
        match name {
            "points" => blocks.points = text,
            "faces" => blocks.faces = text,
            "owner" => blocks.owner = text,
            "neighbour" => blocks.neighbour = text,
            _ => blocks.boundary = text,
        }
    }
    Ok(blocks)
}

/// Writes the five polyMesh files into a directory.
///
/// # Errors
///
/// Returns [`CodecError::Io`] naming the first file that could not be
/// written.
pub fn write_polymesh_dir(dir: &Path, blocks: &PolyMeshBlocks) -> Result<()> {
    for (name, text) in [
        ("points", &blocks.points),
        ("faces", &blocks.faces),
        ("owner", &blocks.owner),
        ("neighbour", &blocks.neighbour),
        ("boundary", &blocks.boundary),
    ] {
        let path = dir.join(name);
        debug!(path = %path.display(), "writing polyMesh file");
        fs::write(&path, text).map_err(|source| CodecError::Io { path, source })?;
    }
    Ok(())
}

/// The OpenFOAM dictionary header every polyMesh file starts with.
fn foam_header(class_name: &str, object_name: &str) -> String {
    let mut h = String::from("FoamFile\n{\n");
    h.push_str("    version     2.0;\n");
    h.push_str("    format      ascii;\n");
    h.push_str(&format!("    class       {class_name};\n"));
    h.push_str(&format!("    object      {object_name};\n}}\n"));
    h
}

// --- Permissive block scanners ---

/// Extracts `(x y z)` coordinate triplets, one per line, anchored at line
/// start. Anything else is skipped.
fn parse_points(text: &str) -> Vec<Point3> {
    let mut points = Vec::new();
    for line in text.lines() {
        let Some(rest) = line.strip_prefix('(') else {
            continue;
        };
        let Some(end) = rest.find(')') else {
            continue;
        };
        let tokens: Vec<&str> = rest[..end].split_whitespace().collect();
        if tokens.len() != 3 {
            continue;
        }
        let coords: Option<Vec<f64>> = tokens.iter().map(|t| t.parse().ok()).collect();
        if let Some(c) = coords {
            points.push(Point3::new(c[0], c[1], c[2]));
        }
    }
    debug!(count = points.len(), "coordinate triplets read");
    points
}

/// Extracts one integer per line from a parenthesis-delimited list.
///
/// State machine: a `(` at line start enters the list, a `)` at line start
/// leaves it, and a leading integer while inside appends. The declared
/// count line sits outside the parentheses and is ignored.
fn parse_int_list(text: &str) -> Vec<usize> {
    let mut values = Vec::new();
    let mut inside = false;
    for line in text.lines() {
        if line.starts_with('(') {
            inside = true;
        }
        if line.starts_with(')') {
            inside = false;
        }
        if !inside {
            continue;
        }
        let end = line
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(line.len());
        if end > 0 {
            if let Ok(v) = line[..end].parse::<usize>() {
                values.push(v);
            }
        }
    }
    debug!(count = values.len(), "integers read");
    values
}

/// Extracts `<n>(<v0> <v1> …)` face definitions from a
/// parenthesis-delimited list, using the same bracket state machine as
/// [`parse_int_list`].
fn parse_face_list(text: &str) -> Vec<Vec<u32>> {
    let mut lists = Vec::new();
    let mut inside = false;
    for line in text.lines() {
        if line.starts_with('(') {
            inside = true;
        }
        if line.starts_with(')') {
            inside = false;
        }
        if !inside {
            continue;
        }
        let Some(open) = line.find('(') else {
            continue;
        };
        if open == 0 || !line[..open].chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let Some(close) = line[open..].find(')') else {
            continue;
        };
        let inner = &line[open + 1..open + close];
        let vals: Option<Vec<u32>> = inner.split_whitespace().map(|t| t.parse().ok()).collect();
        match vals {
            Some(vals) if !vals.is_empty() => lists.push(vals),
            _ => {}
        }
    }
    debug!(count = lists.len(), "face vertex lists read");
    lists
}

/// Reflows multi-line `inGroups` entries onto one logical line.
///
/// A line consisting of the bare keyword `inGroups` starts accumulation;
/// the first line containing `;` ends it. The line scanner in
/// [`parse_boundary`] only matches single-line entries, so this must run
/// first.
fn coalesce_in_groups(text: &str) -> String {
    let mut out = String::new();
    let mut acc: Option<String> = None;
    for line in text.lines() {
        if line.trim() == "inGroups" {
            acc = Some("        inGroups        ".to_string());
        } else if let Some(mut a) = acc.take() {
            a.push_str(line);
            a.push(' ');
            if line.contains(';') {
                out.push_str(&a);
                out.push('\n');
            } else {
                acc = Some(a);
            }
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Returns the value of a `<key>   <value>;` dictionary line, if this line
/// is one.
fn keyword_value<'a>(trimmed: &'a str, key: &str) -> Option<&'a str> {
    let rest = trimmed.strip_prefix(key)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    rest.trim().strip_suffix(';').map(str::trim)
}

/// A patch name is an indented bare word (allowing `%`, `:`, `-` and `_`)
/// on its own line.
fn is_patch_name(line: &str, trimmed: &str) -> bool {
    line.starts_with(char::is_whitespace)
        && !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '%' | ':' | '-'))
}

/// Parses the `boundary` dictionary list into patch records.
///
/// Expects `inGroups` entries already coalesced onto single lines.
fn parse_boundary(text: &str) -> Vec<PatchData> {
    let mut patches: Vec<PatchData> = Vec::new();
    let mut inside = false;
    for line in text.lines() {
        if line.starts_with('(') {
            inside = true;
        }
        if line.starts_with(')') {
            inside = false;
        }
        if !inside {
            continue;
        }
        let trimmed = line.trim();

        if let Some(value) = keyword_value(trimmed, "type") {
            if let Some(p) = patches.last_mut() {
                p.type_name = value.to_string();
            }
            continue;
        }
        if let Some(value) = keyword_value(trimmed, "inGroups") {
            if let Some(p) = patches.last_mut() {
                p.in_groups = Some(value.to_string());
            }
            continue;
        }
        if let Some(value) = keyword_value(trimmed, "nFaces") {
            if let (Some(p), Ok(v)) = (patches.last_mut(), value.parse()) {
                p.n_faces = v;
            }
            continue;
        }
        if let Some(value) = keyword_value(trimmed, "startFace") {
            if let (Some(p), Ok(v)) = (patches.last_mut(), value.parse()) {
                p.start_face = v;
            }
            continue;
        }
        if is_patch_name(line, trimmed) {
            debug!(name = trimmed, "reading boundary patch definition");
            patches.push(PatchData::new(trimmed));
        }
    }
    patches
}

// --- Import ---

/// Builds mesh topology from polyMesh text blocks.
///
/// Cell count is derived as `max(owner) + 1`; faces listed in `neighbour`
/// are internal, the rest are boundary faces. Patch face assignments walk
/// each patch's `[startFace, startFace + nFaces)` range.
pub struct PolyMeshImport {
    blocks: PolyMeshBlocks,
}

impl PolyMeshImport {
    /// Creates a new `PolyMeshImport` operation.
    #[must_use]
    pub fn new(blocks: PolyMeshBlocks) -> Self {
        Self { blocks }
    }

    /// Executes the import, populating the mesh store.
    ///
    /// # Errors
    ///
    /// Returns an error only on topology-store failures; malformed input
    /// lines are skipped, with the resulting record counts reported in the
    /// returned [`ImportSummary`].
    pub fn execute(&self, store: &mut MeshStore) -> Result<ImportSummary> {
        let points = parse_points(&self.blocks.points);
        let owner = parse_int_list(&self.blocks.owner);
        let neighbour = parse_int_list(&self.blocks.neighbour);
        let face_verts = parse_face_list(&self.blocks.faces);
        if owner.len() != face_verts.len() {
            warn!(
                owners = owner.len(),
                faces = face_verts.len(),
                "owner and faces record counts disagree"
            );
        }

        let vertex_table: Vec<VertexId> = points
            .into_iter()
            .map(|p| store.add_vertex(VertexData::new(p)))
            .collect();

        let cell_count = owner.iter().max().map_or(0, |m| m + 1);
        let cell_table: Vec<CellId> = (0..cell_count)
            .map(|_| store.add_cell(CellData::new()))
            .collect();

        let mut face_table: Vec<FaceId> = Vec::with_capacity(face_verts.len());
        let mut internal_faces = 0usize;
        for (i, vilist) in face_verts.iter().enumerate() {
            let Some(&owner_index) = owner.get(i) else {
                warn!(face = i, "no owner entry; remaining faces skipped");
                break;
            };
            let verts: Option<Vec<VertexId>> = vilist
                .iter()
                .map(|&vi| vertex_table.get(vi as usize).copied())
                .collect();
            let Some(verts) = verts else {
                warn!(face = i, "vertex index out of range; face skipped");
                continue;
            };
            let owner_cell = cell_table[owner_index];
            let face_id = store.add_face(FaceData::new(verts, owner_cell));
            store.attach_face_to_cell(face_id, owner_cell)?;

            if let Some(&ni) = neighbour.get(i) {
                if let Some(&neighbour_cell) = cell_table.get(ni) {
                    store.face_mut(face_id)?.neighbour = Some(neighbour_cell);
                    store.attach_face_to_cell(face_id, neighbour_cell)?;
                    internal_faces += 1;
                } else {
                    warn!(face = i, neighbour = ni, "neighbour cell index out of range");
                }
            }
            face_table.push(face_id);
        }

        let patches = parse_boundary(&coalesce_in_groups(&self.blocks.boundary));
        let patch_count = patches.len();
        for patch in patches {
            let slot = store.patch_ids().len();
            let (start, n) = (patch.start_face, patch.n_faces);
            store.add_patch(patch);
            for fi in start..start + n {
                let Some(&face_id) = face_table.get(fi) else {
                    warn!(patch = slot, face = fi, "patch range exceeds face count");
                    break;
                };
                let face = store.face_mut(face_id)?;
                if face.is_boundary() {
                    face.patch = Some(slot);
                } else {
                    warn!(patch = slot, face = fi, "patch range covers an internal face");
                }
            }
        }

        let summary = ImportSummary {
            points: vertex_table.len(),
            faces: face_table.len(),
            internal_faces,
            boundary_faces: face_table.len() - internal_faces,
            cells: cell_table.len(),
            patches: patch_count,
        };
        debug!(?summary, "polyMesh import finished");
        Ok(summary)
    }
}

// --- Export ---

/// Serializes mesh topology into polyMesh text blocks.
///
/// Faces are emitted in two passes, internal first and boundary grouped by
/// patch slot; cells are renumbered into a contiguous 0-based sequence in
/// internal-face first-encounter order, as OpenFOAM expects. All export
/// indices are computed locally and discarded with the call.
pub struct PolyMeshExport;

impl Default for PolyMeshExport {
    fn default() -> Self {
        Self::new()
    }
}

impl PolyMeshExport {
    /// Creates a new `PolyMeshExport` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the export against a read-only store.
    ///
    /// # Errors
    ///
    /// Returns an error if a live face references a deleted or missing
    /// vertex or cell.
    pub fn execute(&self, store: &MeshStore) -> Result<PolyMeshBlocks> {
        // Vertex export indices and the points block.
        let mut vert_ei: SecondaryMap<VertexId, usize> = SecondaryMap::new();
        let mut points_body = String::new();
        let mut n_points = 0usize;
        for &vid in store.vertex_ids() {
            let v = store.vertex(vid)?;
            if v.deleted {
                continue;
            }
            vert_ei.insert(vid, n_points);
            points_body.push_str(&format!(
                "({} {} {})\n",
                format_g6(v.point.x),
                format_g6(v.point.y),
                format_g6(v.point.z)
            ));
            n_points += 1;
        }
        debug!(count = n_points, "points block generated");

        // Split live faces into the internal pass and per-patch boundary
        // groups. Faces on a deleted patch stay in their group so the face
        // stream keeps the slot layout; only the boundary entry is skipped.
        let mut internal: Vec<FaceId> = Vec::new();
        let mut by_patch: Vec<Vec<FaceId>> = vec![Vec::new(); store.patch_ids().len()];
        let mut unpatched: Vec<FaceId> = Vec::new();
        for &fid in store.face_ids() {
            let f = store.face(fid)?;
            if f.deleted {
                continue;
            }
            if f.neighbour.is_some() {
                internal.push(fid);
            } else if let Some(slot) = f.patch.filter(|s| *s < by_patch.len()) {
                by_patch[slot].push(fid);
            } else {
                unpatched.push(fid);
            }
        }
        if !unpatched.is_empty() {
            warn!(
                count = unpatched.len(),
                "boundary faces without a patch are emitted after all patches"
            );
        }

        // Contiguous cell renumbering: first-encounter order over the
        // internal pass, then remaining live cells in creation order.
        let mut cell_ei: SecondaryMap<CellId, usize> = SecondaryMap::new();
        let mut next_cell = 0usize;
        for &fid in &internal {
            let f = store.face(fid)?;
            if !cell_ei.contains_key(f.owner) {
                cell_ei.insert(f.owner, next_cell);
                next_cell += 1;
            }
            if let Some(n) = f.neighbour {
                if !cell_ei.contains_key(n) {
                    cell_ei.insert(n, next_cell);
                    next_cell += 1;
                }
            }
        }
        for &cid in store.cell_ids() {
            if store.cell(cid)?.deleted || cell_ei.contains_key(cid) {
                continue;
            }
            cell_ei.insert(cid, next_cell);
            next_cell += 1;
        }

        let ordered: Vec<FaceId> = internal
            .iter()
            .chain(by_patch.iter().flatten())
            .chain(unpatched.iter())
            .copied()
            .collect();

        // faces / owner / neighbour bodies share the two-pass order.
        let mut faces_body = String::new();
        let mut owner_body = String::new();
        let mut neighbour_body = String::new();
        for &fid in &ordered {
            let f = store.face(fid)?;
            faces_body.push_str(&face_line(f, &vert_ei)?);
            owner_body.push_str(&format!("{}\n", cell_export_index(&cell_ei, f.owner)?));
            if let Some(n) = f.neighbour {
                neighbour_body.push_str(&format!("{}\n", cell_export_index(&cell_ei, n)?));
            }
        }
        debug!(
            internal = internal.len(),
            total = ordered.len(),
            "faces block generated"
        );

        // Boundary entries: nFaces/startFace re-derived from the current
        // face set. Deleted patches keep their slot (their faces stay in
        // the stream) but emit no entry.
        let mut boundary_body = String::new();
        let mut n_live_patches = 0usize;
        let mut start = internal.len();
        for (slot, &pid) in store.patch_ids().iter().enumerate() {
            let p = store.patch(pid)?;
            let group = &by_patch[slot];
            if p.deleted {
                start += group.len();
                continue;
            }
            boundary_body.push_str(&format!("    {}\n    {{\n", p.name));
            boundary_body.push_str(&format!("        type            {};\n", p.type_name));
            if let Some(groups) = &p.in_groups {
                boundary_body.push_str(&format!("        inGroups        {groups};\n"));
            }
            boundary_body.push_str(&format!("        nFaces          {};\n", group.len()));
            boundary_body.push_str(&format!("        startFace       {start};\n    }}\n"));
            start += group.len();
            n_live_patches += 1;
        }
        debug!(count = n_live_patches, "boundary block generated");

        Ok(PolyMeshBlocks {
            points: format!(
                "{}\n{n_points}\n(\n{points_body})\n",
                foam_header("vectorField", "points")
            ),
            faces: format!(
                "{}\n{}\n(\n{faces_body})\n",
                foam_header("faceList", "faces"),
                ordered.len()
            ),
            owner: format!(
                "{}\n{}\n(\n{owner_body})\n",
                foam_header("labelList", "owner"),
                ordered.len()
            ),
            neighbour: format!(
                "{}\n{}\n(\n{neighbour_body})\n",
                foam_header("labelList", "neighbour"),
                internal.len()
            ),
            boundary: format!(
                "{}\n{n_live_patches}\n(\n{boundary_body})\n",
                foam_header("polyBoundaryMesh", "boundary")
            ),
        })
    }
}

/// Formats one `<n>(<v0> <v1> …)` face definition line.
fn face_line(face: &FaceData, vert_ei: &SecondaryMap<VertexId, usize>) -> Result<String> {
    let mut indices = Vec::with_capacity(face.verts.len());
    for &v in &face.verts {
        let ei = vert_ei.get(v).ok_or_else(|| {
            TopologyError::InvalidTopology("face references a deleted vertex".into())
        })?;
        indices.push(ei.to_string());
    }
    Ok(format!("{}({})\n", face.verts.len(), indices.join(" ")))
}

fn cell_export_index(cell_ei: &SecondaryMap<CellId, usize>, cell: CellId) -> Result<usize> {
    cell_ei.get(cell).copied().ok_or_else(|| {
        TopologyError::InvalidTopology("face references a deleted cell".into()).into()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::{CellArchetype, FaceDeduplicator};
    use approx::assert_relative_eq;

    // ── Block scanners ─────────────────────────────────────────

    #[test]
    fn points_scanner_skips_noise() {
        let text = "FoamFile\n{\n}\n4\n(\n(0 0 0)\n(1 0 0)\nnot a point\n(1.5e-1 2 3)\n(1 2)\n)\n";
        let points = parse_points(text);
        assert_eq!(points.len(), 3);
        assert_relative_eq!(points[2].x, 0.15);
    }

    #[test]
    fn int_list_scanner_respects_parentheses() {
        let text = "17\n3\n(\n0\n1\n2\n)\n99\n";
        // The count lines 17 and 99 sit outside the parentheses.
        assert_eq!(parse_int_list(text), vec![0, 1, 2]);
    }

    #[test]
    fn face_list_scanner_reads_length_prefixed_lists() {
        let text = "2\n(\n4(0 1 2 3)\n3(4 5 6)\njunk\n)\n";
        assert_eq!(parse_face_list(text), vec![vec![0, 1, 2, 3], vec![4, 5, 6]]);
    }

    #[test]
    fn in_groups_spanning_lines_is_coalesced() {
        let text = "    wall\n    {\n        inGroups\n2\n(\nwalls\nmovingWalls\n)\n;\n        nFaces          4;\n    }\n";
        let fixed = coalesce_in_groups(text);
        assert!(fixed.contains("inGroups        2 ( walls movingWalls ) ; "));
        // The accumulated entry collapsed to one logical line.
        assert_eq!(
            fixed.lines().filter(|l| l.contains("inGroups")).count(),
            1
        );
    }

    #[test]
    fn boundary_parser_reads_patch_dictionaries() {
        let text = "2\n(\n    inlet\n    {\n        type            patch;\n        nFaces          2;\n        startFace       8;\n    }\n    walls\n    {\n        type            wall;\n        inGroups        1(wall);\n        nFaces          6;\n        startFace       10;\n    }\n)\n";
        let patches = parse_boundary(text);
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].name, "inlet");
        assert_eq!(patches[0].type_name, "patch");
        assert_eq!(patches[0].n_faces, 2);
        assert_eq!(patches[0].start_face, 8);
        assert_eq!(patches[1].name, "walls");
        assert_eq!(patches[1].type_name, "wall");
        assert_eq!(patches[1].in_groups.as_deref(), Some("1(wall)"));
    }

    // ── Import ─────────────────────────────────────────────────

    fn single_tet_blocks() -> PolyMeshBlocks {
        PolyMeshBlocks {
            points: "4\n(\n(0 0 0)\n(1 0 0)\n(0 1 0)\n(0 0 1)\n)\n".to_string(),
            faces: "4\n(\n3(0 2 1)\n3(0 1 3)\n3(1 2 3)\n3(0 3 2)\n)\n".to_string(),
            owner: "4\n(\n0\n0\n0\n0\n)\n".to_string(),
            neighbour: "0\n(\n)\n".to_string(),
            boundary: "1\n(\n    walls\n    {\n        type            wall;\n        nFaces          4;\n        startFace       0;\n    }\n)\n".to_string(),
        }
    }

    #[test]
    fn single_tetrahedron_imports() {
        let mut store = MeshStore::new();
        let summary = PolyMeshImport::new(single_tet_blocks())
            .execute(&mut store)
            .unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                points: 4,
                faces: 4,
                internal_faces: 0,
                boundary_faces: 4,
                cells: 1,
                patches: 1,
            }
        );
        let cell = store.cell(store.cell_ids()[0]).unwrap();
        assert_eq!(cell.faces.len(), 4);
        assert_eq!(cell.verts.len(), 4);
        for &fid in store.face_ids() {
            assert_eq!(store.face(fid).unwrap().patch, Some(0));
        }
    }

    #[test]
    fn internal_faces_link_owner_and_neighbour() {
        // Two cells sharing face 0; faces 1..=8 are boundary.
        let mut blocks = PolyMeshBlocks {
            points: "5\n(\n(0 0 0)\n(1 0 0)\n(1 1 0)\n(0 1 0)\n(0.5 0.5 1)\n)\n".to_string(),
            faces: String::from("9\n(\n"),
            owner: "9\n(\n0\n0\n0\n0\n0\n1\n1\n1\n1\n)\n".to_string(),
            neighbour: "1\n(\n1\n)\n".to_string(),
            boundary: "0\n(\n)\n".to_string(),
        };
        blocks.faces.push_str("4(0 1 2 3)\n");
        for _ in 0..8 {
            blocks.faces.push_str("3(0 1 4)\n");
        }
        blocks.faces.push_str(")\n");

        let mut store = MeshStore::new();
        let summary = PolyMeshImport::new(blocks).execute(&mut store).unwrap();
        assert_eq!(summary.cells, 2);
        assert_eq!(summary.internal_faces, 1);
        assert_eq!(summary.boundary_faces, 8);

        let shared = store.face(store.face_ids()[0]).unwrap();
        let c0 = store.cell_ids()[0];
        let c1 = store.cell_ids()[1];
        assert_eq!(shared.owner, c0);
        assert_eq!(shared.neighbour, Some(c1));
        assert!(store.cell(c0).unwrap().faces.contains(&store.face_ids()[0]));
        assert!(store.cell(c1).unwrap().faces.contains(&store.face_ids()[0]));
    }

    #[test]
    fn empty_owner_list_yields_zero_cells() {
        let blocks = PolyMeshBlocks::default();
        let mut store = MeshStore::new();
        let summary = PolyMeshImport::new(blocks).execute(&mut store).unwrap();
        assert_eq!(summary, ImportSummary::default());
    }

    // ── Export and round-trip ──────────────────────────────────

    fn two_hex_store() -> MeshStore {
        // Two unit hexahedra side by side along x: 12 points, 11 faces.
        let mut store = MeshStore::new();
        let mut table = Vec::new();
        for x in 0..3 {
            for (y, z) in [(0, 0), (1, 0), (1, 1), (0, 1)] {
                table.push(store.add_vertex(VertexData::new(Point3::new(
                    f64::from(x),
                    f64::from(y),
                    f64::from(z),
                ))));
            }
        }
        // Local hex corner order: bottom quad then top quad.
        let cells: [[u32; 8]; 2] = [[0, 4, 5, 1, 3, 7, 6, 2], [4, 8, 9, 5, 7, 11, 10, 6]];
        let mut dedup = FaceDeduplicator::new();
        for corners in &cells {
            let faces: Vec<Vec<u32>> = CellArchetype::Hexahedron
                .face_templates()
                .iter()
                .map(|t| t.iter().map(|&i| corners[i]).collect())
                .collect();
            let cell = store.add_cell(CellData::new());
            dedup
                .add_cell_faces(&mut store, cell, &faces, &table)
                .unwrap();
        }
        // One patch covering every boundary face.
        let slot = store.patch_ids().len();
        store.add_patch(PatchData::new("defaultFaces"));
        for &fid in &store.face_ids().to_vec() {
            if store.face(fid).unwrap().is_boundary() {
                store.face_mut(fid).unwrap().patch = Some(slot);
            }
        }
        store
    }

    #[test]
    fn export_emits_internal_faces_first() {
        let store = two_hex_store();
        let blocks = PolyMeshExport::new().execute(&store).unwrap();

        assert!(blocks.points.starts_with("FoamFile"));
        assert!(blocks.points.contains("class       vectorField;"));
        let owner = parse_int_list(&blocks.owner);
        let neighbour = parse_int_list(&blocks.neighbour);
        assert_eq!(owner.len(), 11);
        assert_eq!(neighbour.len(), 1);
        // The shared face leads both lists: owner 0, neighbour 1.
        assert_eq!(owner[0], 0);
        assert_eq!(neighbour[0], 1);
        assert!(blocks.boundary.contains("nFaces          10;"));
        assert!(blocks.boundary.contains("startFace       1;"));
    }

    #[test]
    fn round_trip_preserves_topology() {
        let store = two_hex_store();
        let blocks = PolyMeshExport::new().execute(&store).unwrap();

        let mut reimported = MeshStore::new();
        let summary = PolyMeshImport::new(blocks.clone())
            .execute(&mut reimported)
            .unwrap();
        assert_eq!(summary.points, 12);
        assert_eq!(summary.faces, 11);
        assert_eq!(summary.internal_faces, 1);
        assert_eq!(summary.boundary_faces, 10);
        assert_eq!(summary.cells, 2);
        assert_eq!(summary.patches, 1);

        // A second export must reproduce the blocks exactly.
        let again = PolyMeshExport::new().execute(&reimported).unwrap();
        assert_eq!(blocks.points, again.points);
        assert_eq!(blocks.faces, again.faces);
        assert_eq!(blocks.owner, again.owner);
        assert_eq!(blocks.neighbour, again.neighbour);
        assert_eq!(blocks.boundary, again.boundary);
    }

    #[test]
    fn boundary_partition_covers_all_boundary_faces() {
        let store = two_hex_store();
        let blocks = PolyMeshExport::new().execute(&store).unwrap();

        let mut reimported = MeshStore::new();
        PolyMeshImport::new(blocks).execute(&mut reimported).unwrap();

        let n_internal = reimported.internal_face_count();
        let n_total = reimported.face_ids().len();
        let mut covered = vec![false; n_total];
        for &pid in reimported.patch_ids() {
            let p = reimported.patch(pid).unwrap();
            for fi in p.start_face..p.start_face + p.n_faces {
                assert!(!covered[fi], "face {fi} claimed by two patches");
                covered[fi] = true;
            }
        }
        for (fi, seen) in covered.iter().enumerate() {
            assert_eq!(*seen, fi >= n_internal, "face {fi} coverage is wrong");
        }
    }

    #[test]
    fn deleted_entities_are_not_exported() {
        let mut store = two_hex_store();
        // Tombstone one boundary face; its vertices stay live.
        let victim = *store
            .face_ids()
            .iter()
            .find(|id| store.face(**id).unwrap().is_boundary())
            .unwrap();
        store.face_mut(victim).unwrap().deleted = true;

        let blocks = PolyMeshExport::new().execute(&store).unwrap();
        let faces = parse_face_list(&blocks.faces);
        assert_eq!(faces.len(), 10);
        assert!(blocks.boundary.contains("nFaces          9;"));
    }

    #[test]
    fn deleted_patch_keeps_its_slot_but_emits_no_entry() {
        let mut store = two_hex_store();
        let second_slot = store.patch_ids().len();
        store.add_patch(PatchData::new("ghost"));
        let pid = store.patch_ids()[second_slot];
        store.patch_mut(pid).unwrap().deleted = true;

        let blocks = PolyMeshExport::new().execute(&store).unwrap();
        assert!(!blocks.boundary.contains("ghost"));
        assert!(blocks.boundary.contains("defaultFaces"));
        // Header count lists live patches only.
        let count_line = blocks
            .boundary
            .lines()
            .find(|l| l.trim().parse::<usize>().is_ok())
            .unwrap();
        assert_eq!(count_line.trim(), "1");
    }
}
