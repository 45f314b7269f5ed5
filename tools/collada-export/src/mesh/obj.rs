//! OBJ read-back
//!
//! Re-reads an emitted `.obj` and summarises it: attribute counts plus the
//! index range each `usemtl` section touches. Used by `inspect` and tests to
//! check the cross-group index offsets.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::RangeInclusive;
use std::path::Path;

/// Index range (1-based, inclusive) referenced by one section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSpan {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl IndexSpan {
    fn include(&mut self, index: usize) {
        self.min = Some(self.min.map_or(index, |m| m.min(index)));
        self.max = Some(self.max.map_or(index, |m| m.max(index)));
    }

    pub fn range(&self) -> Option<RangeInclusive<usize>> {
        Some(self.min?..=self.max?)
    }

    /// Number of distinct slots between min and max
    pub fn width(&self) -> usize {
        self.range().map_or(0, |r| r.end() - r.start() + 1)
    }
}

/// Faces following one `usemtl` line (or the leading faces before any)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjSection {
    pub material: Option<String>,
    pub faces: usize,
    pub positions: IndexSpan,
    pub uvs: IndexSpan,
    pub normals: IndexSpan,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjSummary {
    pub mtllib: Option<String>,
    pub positions: usize,
    pub normals: usize,
    pub uvs: usize,
    pub sections: Vec<ObjSection>,
}

impl ObjSummary {
    pub fn face_count(&self) -> usize {
        self.sections.iter().map(|s| s.faces).sum()
    }
}

/// Summarise an OBJ file on disk
pub fn read_obj_summary_file(input: &Path) -> Result<ObjSummary> {
    let file = File::open(input).with_context(|| format!("Failed to open OBJ: {:?}", input))?;
    read_obj_summary(BufReader::new(file)).with_context(|| format!("Failed to read {:?}", input))
}

/// Summarise OBJ text
pub fn read_obj_summary<R: BufRead>(reader: R) -> Result<ObjSummary> {
    let mut summary = ObjSummary::default();
    let mut current: Option<ObjSection> = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "mtllib" => summary.mtllib = parts.get(1).map(|s| s.to_string()),
            "v" => summary.positions += 1,
            "vn" => summary.normals += 1,
            "vt" => summary.uvs += 1,
            "usemtl" => {
                if let Some(section) = current.take() {
                    summary.sections.push(section);
                }
                current = Some(ObjSection {
                    material: parts.get(1).map(|s| s.to_string()),
                    ..Default::default()
                });
            }
            "f" => {
                let section = current.get_or_insert_with(ObjSection::default);
                section.faces += 1;
                for vertex in &parts[1..] {
                    let (vi, vti, vni) = parse_obj_vertex(vertex).with_context(|| {
                        format!("line {}: bad face vertex '{}'", line_no + 1, vertex)
                    })?;
                    section.positions.include(vi);
                    if let Some(ti) = vti {
                        section.uvs.include(ti);
                    }
                    if let Some(ni) = vni {
                        section.normals.include(ni);
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(section) = current {
        summary.sections.push(section);
    }

    Ok(summary)
}

/// Parse OBJ vertex reference: "v", "v/vt", "v/vt/vn", or "v//vn" (1-based)
fn parse_obj_vertex(s: &str) -> Option<(usize, Option<usize>, Option<usize>)> {
    let parts: Vec<&str> = s.split('/').collect();

    let vi = parts.first()?.parse::<usize>().ok().filter(|&i| i > 0)?;

    let vti = parts
        .get(1)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<usize>().ok());

    let vni = parts
        .get(2)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<usize>().ok());

    Some((vi, vti, vni))
}
