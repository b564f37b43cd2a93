//! VTK XML UnstructuredGrid (.vtu) codec.
//!
//! Only the ascii format is supported. Import reconstructs face-sharing
//! topology from per-cell connectivity via the archetype table and the
//! face deduplicator; export always round-trips through the generic
//! polyhedron representation (type 42) so face winding is never ambiguous.
//! VTU carries no patch metadata, so import records a single `default`
//! boundary patch.

use std::fs;
use std::path::Path;

use slotmap::SecondaryMap;
use tracing::{debug, warn};

use crate::codec::archetype::{CellArchetype, VTK_POLYHEDRON};
use crate::codec::{format_g6, FaceDeduplicator, ImportSummary};
use crate::error::{CodecError, Result, TopologyError, UgridError};
use crate::math::Point3;
use crate::topology::{CellData, MeshStore, PatchData, VertexData, VertexId};

/// Reads a VTU file into a string.
///
/// # Errors
///
/// Returns [`CodecError::Io`] naming the path if the file is missing or
/// unreadable.
pub fn read_vtu_file(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "reading VTU file");
    fs::read_to_string(path).map_err(|source| {
        CodecError::Io {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Writes VTU text to a file.
///
/// # Errors
///
/// Returns [`CodecError::Io`] naming the path on failure.
pub fn write_vtu_file(path: &Path, text: &str) -> Result<()> {
    debug!(path = %path.display(), "writing VTU file");
    fs::write(path, text).map_err(|source| {
        CodecError::Io {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Returns the quoted value following `marker` on this line, if present.
fn scan_attribute<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let start = line.find(marker)? + marker.len();
    let rest = &line[start..];
    rest.find('"').map(|end| &rest[..end])
}

/// Checks that the text is an ascii `UnstructuredGrid` VTU document.
///
/// Runs before any parsing: a failure here aborts an import before it
/// mutates any state.
///
/// # Errors
///
/// Returns [`CodecError::Validation`] naming the offending attribute
/// value, or [`CodecError::NotVtu`] if no `VTKFile` declaration is found.
pub fn validate_vtu(text: &str) -> Result<()> {
    let mut saw_vtkfile = false;
    for line in text.lines() {
        if let Some(value) = scan_attribute(line, "VTKFile type=\"") {
            saw_vtkfile = true;
            if value != "UnstructuredGrid" {
                return Err(CodecError::Validation {
                    attribute: "type",
                    expected: "UnstructuredGrid",
                    value: value.to_string(),
                }
                .into());
            }
        }
        if let Some(value) = scan_attribute(line, " format=\"") {
            if value != "ascii" {
                return Err(CodecError::Validation {
                    attribute: "format",
                    expected: "ascii",
                    value: value.to_string(),
                }
                .into());
            }
        }
    }
    if saw_vtkfile {
        Ok(())
    } else {
        Err(CodecError::NotVtu.into())
    }
}

/// Accumulates the lines between the `<DataArray Name="…">` tag matching
/// `name` and its closing tag. An absent array yields an empty block.
fn data_array_block(name: &str, text: &str) -> String {
    let mut inside = false;
    let mut block = String::new();
    for line in text.lines() {
        if line.contains("<DataArray") {
            if let Some(found) = scan_attribute(line, "Name=\"") {
                inside = found == name;
                if inside {
                    continue;
                }
            }
        }
        if line.contains("</DataArray>") {
            inside = false;
        }
        if inside {
            block.push_str(line);
            block.push(' ');
        }
    }
    block
}

fn parse_floats(name: &'static str, block: &str) -> Result<Vec<f64>> {
    block
        .split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| {
                CodecError::Parse {
                    array: name.to_string(),
                    token: token.to_string(),
                }
                .into()
            })
        })
        .collect()
}

fn parse_ints(name: &'static str, block: &str) -> Result<Vec<i64>> {
    block
        .split_whitespace()
        .map(|token| {
            token.parse::<i64>().map_err(|_| {
                CodecError::Parse {
                    array: name.to_string(),
                    token: token.to_string(),
                }
                .into()
            })
        })
        .collect()
}

/// Decodes one polyhedron cell's face stream,
/// `[faceCount, n0, v…, n1, v…]`, into absolute vertex-index lists.
fn decode_polyhedron_faces(cell: usize, stream: &[i64]) -> Result<Vec<Vec<u32>>> {
    let declared = stream
        .first()
        .and_then(|&n| usize::try_from(n).ok())
        .unwrap_or(0);
    let mut fis: Vec<Vec<u32>> = Vec::with_capacity(declared);
    let mut i = 1;
    while i < stream.len() {
        let Ok(n) = usize::try_from(stream[i]) else {
            break;
        };
        i += 1;
        if i + n > stream.len() {
            // Truncated record; the count check below reports it.
            break;
        }
        let verts = stream[i..i + n]
            .iter()
            .map(|&v| {
                u32::try_from(v).map_err(|_| CodecError::Parse {
                    array: "faces".to_string(),
                    token: v.to_string(),
                })
            })
            .collect::<std::result::Result<Vec<u32>, _>>()?;
        fis.push(verts);
        i += n;
    }
    if fis.len() == declared && !stream.is_empty() {
        Ok(fis)
    } else {
        Err(CodecError::MalformedPolyhedron {
            cell,
            declared,
            decoded: fis.len(),
        }
        .into())
    }
}

// --- Import ---

/// Builds mesh topology from VTU text.
///
/// Fixed archetype cells resolve their face templates through the cell
/// vertex list; polyhedron cells (type 42) carry explicit face data. All
/// faces go through the [`FaceDeduplicator`] to establish owner/neighbour
/// links.
pub struct VtuImport {
    text: String,
    skip_unsupported: bool,
}

impl VtuImport {
    /// Creates a new `VtuImport` operation.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            skip_unsupported: false,
        }
    }

    /// When set, cells with unsupported VTK type codes are skipped with a
    /// warning instead of aborting the import.
    #[must_use]
    pub fn skip_unsupported(mut self, skip: bool) -> Self {
        self.skip_unsupported = skip;
        self
    }

    /// Executes the import, populating the mesh store.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any state is mutated if the file
    /// is not an ascii `UnstructuredGrid`; during cell reconstruction,
    /// [`CodecError::UnsupportedCellType`] (unless skipping is enabled),
    /// [`CodecError::MalformedPolyhedron`] or
    /// [`CodecError::DuplicateFaceOwnership`].
    #[allow(clippy::too_many_lines)]
    pub fn execute(&self, store: &mut MeshStore) -> Result<ImportSummary> {
        validate_vtu(&self.text)?;

        let points = parse_floats("Points", &data_array_block("Points", &self.text))?;
        let connectivities = parse_ints("connectivity", &data_array_block("connectivity", &self.text))?;
        let offsets = parse_ints("offsets", &data_array_block("offsets", &self.text))?;
        let celltypes = parse_ints("types", &data_array_block("types", &self.text))?;
        let cellfaces = parse_ints("faces", &data_array_block("faces", &self.text))?;
        let cellfaceoffsets =
            parse_ints("faceoffsets", &data_array_block("faceoffsets", &self.text))?;
        debug!(
            coordinates = points.len(),
            connectivities = connectivities.len(),
            offsets = offsets.len(),
            celltypes = celltypes.len(),
            cellfaces = cellfaces.len(),
            cellfaceoffsets = cellfaceoffsets.len(),
            "VTU data arrays read"
        );
        if points.len() % 3 != 0 {
            warn!(
                count = points.len(),
                "Points array is not a whole number of triplets; remainder dropped"
            );
        }

        let faces_before = store.face_ids().len();
        let vertex_table: Vec<VertexId> = points
            .chunks_exact(3)
            .map(|c| store.add_vertex(VertexData::new(Point3::new(c[0], c[1], c[2]))))
            .collect();

        let mut dedup = FaceDeduplicator::new();
        let mut conn_index = 0usize;
        let mut face_cursor = 0usize;
        let mut cells_created = 0usize;
        for (ci, &vtk_type) in celltypes.iter().enumerate() {
            let Some(conn_end) = offsets.get(ci).and_then(|&v| usize::try_from(v).ok()) else {
                warn!(cell = ci, "missing or negative offset; remaining cells skipped");
                break;
            };
            if conn_end < conn_index || conn_end > connectivities.len() {
                warn!(cell = ci, "connectivity range out of bounds; remaining cells skipped");
                break;
            }
            let vilist = &connectivities[conn_index..conn_end];

            let archetype = match CellArchetype::from_vtk_type(vtk_type) {
                Ok(a) => a,
                Err(err) => {
                    if self.skip_unsupported {
                        warn!(cell = ci, vtk_type, "skipping cell of unsupported type");
                        conn_index = conn_end;
                        continue;
                    }
                    return Err(err.into());
                }
            };

            // Decode the complete face description before touching the
            // store, so a malformed cell leaves no partial topology behind.
            let face_lists = if archetype == CellArchetype::Polyhedron {
                let Some(stream_end) = cellfaceoffsets
                    .get(ci)
                    .and_then(|&v| usize::try_from(v).ok())
                else {
                    warn!(cell = ci, "missing polyhedron face offset; remaining cells skipped");
                    break;
                };
                if stream_end < face_cursor || stream_end > cellfaces.len() {
                    warn!(cell = ci, "polyhedron face range out of bounds; remaining cells skipped");
                    break;
                }
                let fis = decode_polyhedron_faces(ci, &cellfaces[face_cursor..stream_end])?;
                face_cursor = stream_end;
                fis
            } else {
                resolve_templates(ci, archetype, vilist)?
            };

            let cell = store.add_cell(CellData::new());
            dedup.add_cell_faces(store, cell, &face_lists, &vertex_table)?;
            cells_created += 1;
            conn_index = conn_end;
        }

        // VTU has no patch metadata: record one default patch and put every
        // unassigned boundary face in it.
        let slot = store.patch_ids().len();
        store.add_patch(PatchData::new("default"));
        let mut internal_faces = 0usize;
        let mut boundary_faces = 0usize;
        for &fid in &store.face_ids()[faces_before..].to_vec() {
            let face = store.face_mut(fid)?;
            if face.is_boundary() {
                if face.patch.is_none() {
                    face.patch = Some(slot);
                }
                boundary_faces += 1;
            } else {
                internal_faces += 1;
            }
        }

        let summary = ImportSummary {
            points: vertex_table.len(),
            faces: internal_faces + boundary_faces,
            internal_faces,
            boundary_faces,
            cells: cells_created,
            patches: 1,
        };
        debug!(?summary, "VTU import finished");
        Ok(summary)
    }
}

/// Resolves a fixed archetype's local face templates through the cell's
/// vertex list into absolute vertex-index lists.
fn resolve_templates(
    cell: usize,
    archetype: CellArchetype,
    vilist: &[i64],
) -> Result<Vec<Vec<u32>>> {
    let vilist: Vec<u32> = vilist
        .iter()
        .map(|&v| {
            u32::try_from(v).map_err(|_| CodecError::Parse {
                array: "connectivity".to_string(),
                token: v.to_string(),
            })
        })
        .collect::<std::result::Result<_, _>>()?;
    archetype
        .face_templates()
        .iter()
        .map(|template| {
            template
                .iter()
                .map(|&li| {
                    vilist.get(li).copied().ok_or_else(|| {
                        UgridError::from(TopologyError::InvalidTopology(format!(
                            "cell {cell} lists {} vertices, {archetype:?} needs more",
                            vilist.len()
                        )))
                    })
                })
                .collect()
        })
        .collect()
}

// --- Export ---

/// Serializes mesh topology into VTU text.
///
/// Every cell is emitted as a generic polyhedron (type 42) regardless of
/// its original archetype, so the explicit face data carries the winding.
/// `RangeMin`/`RangeMax` attributes are placeholders in the same spots the
/// reference writer leaves them, not recomputed extrema.
pub struct VtuExport;

impl Default for VtuExport {
    fn default() -> Self {
        Self::new()
    }
}

impl VtuExport {
    /// Creates a new `VtuExport` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the export against a read-only store.
    ///
    /// # Errors
    ///
    /// Returns an error if a live cell or face references a deleted or
    /// missing vertex.
    pub fn execute(&self, store: &MeshStore) -> Result<String> {
        // Points and vertex export indices.
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
                "{} {} {}\n",
                format_g6(v.point.x),
                format_g6(v.point.y),
                format_g6(v.point.z)
            ));
            n_points += 1;
        }
        debug!(count = n_points, "points generated");

        let lookup_ei = |v: VertexId| -> Result<usize> {
            vert_ei.get(v).copied().ok_or_else(|| {
                TopologyError::InvalidTopology("cell references a deleted vertex".into()).into()
            })
        };

        // Connectivity, types, offsets, and the polyhedron face stream.
        let mut connectivity_body = String::new();
        let mut types: Vec<String> = Vec::new();
        let mut offsets: Vec<usize> = Vec::new();
        let mut faces_body = String::new();
        let mut faceoffsets: Vec<usize> = Vec::new();
        let mut n_verts_total = 0usize;
        let mut stream_len = 0usize;
        let mut n_cells = 0usize;
        for &cid in store.cell_ids() {
            let c = store.cell(cid)?;
            if c.deleted {
                continue;
            }
            let mut line = String::new();
            for &v in &c.verts {
                line.push_str(&format!("{} ", lookup_ei(v)?));
            }
            connectivity_body.push_str(&line);
            connectivity_body.push('\n');

            types.push(VTK_POLYHEDRON.to_string());
            n_verts_total += c.verts.len();
            offsets.push(n_verts_total);

            let mut stream: Vec<String> = vec![c.faces.len().to_string()];
            for &fid in &c.faces {
                let f = store.face(fid)?;
                stream.push(f.verts.len().to_string());
                for &v in &f.verts {
                    stream.push(lookup_ei(v)?.to_string());
                }
            }
            faces_body.push_str(&stream.join(" "));
            faces_body.push('\n');
            stream_len += stream.len();
            faceoffsets.push(stream_len);

            n_cells += 1;
        }
        debug!(count = n_cells, "cells generated");

        let offsets_max = offsets.last().copied().unwrap_or(0);
        let connectivity_max = i64::try_from(n_points).unwrap_or(0) - 1;

        let mut text = String::from(
            "<VTKFile type=\"UnstructuredGrid\" version=\"1.0\" byte_order=\"LittleEndian\" header_type=\"UInt64\">\n  <UnstructuredGrid>\n    <Piece NumberOfPoints=\"",
        );
        text.push_str(&format!(
            "{n_points}\" NumberOfCells=\"{n_cells}\">\n      <PointData>\n      </PointData>\n      <CellData>\n      </CellData>\n      <Points>\n        <DataArray type=\"Float32\" Name=\"Points\" NumberOfComponents=\"3\" format=\"ascii\" RangeMin=\"0.0\" RangeMax=\"0.0\">\n"
        ));
        text.push_str(&points_body);
        text.push_str(&format!(
            "       </DataArray>\n      </Points>\n      <Cells>\n        <DataArray type=\"Int64\" Name=\"connectivity\" format=\"ascii\" RangeMin=\"0\" RangeMax=\"{connectivity_max}\">\n"
        ));
        text.push_str(&connectivity_body);
        text.push_str(&format!(
            "        </DataArray>\n        <DataArray type=\"Int64\" Name=\"offsets\" format=\"ascii\" RangeMin=\"0\" RangeMax=\"{offsets_max}\">\n"
        ));
        text.push_str(&offsets.iter().map(ToString::to_string).collect::<Vec<_>>().join(" "));
        text.push('\n');
        text.push_str(
            "        </DataArray>\n        <DataArray type=\"UInt8\" Name=\"types\" format=\"ascii\" RangeMin=\"0\" RangeMax=\"42\">\n",
        );
        text.push_str(&types.join(" "));
        text.push('\n');
        text.push_str(&format!(
            "        </DataArray>\n        <DataArray type=\"Int64\" Name=\"faces\" format=\"ascii\" RangeMin=\"0\" RangeMax=\"{n_points}\">\n"
        ));
        text.push_str(&faces_body);
        text.push_str(&format!(
            "        </DataArray>\n        <DataArray type=\"Int64\" Name=\"faceoffsets\" format=\"ascii\" RangeMin=\"0\" RangeMax=\"{stream_len}\">\n"
        ));
        text.push_str(
            &faceoffsets
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" "),
        );
        text.push('\n');
        text.push_str(
            "        </DataArray>\n      </Cells>\n    </Piece>\n  </UnstructuredGrid>\n</VTKFile>\n",
        );
        Ok(text)
    }
}
