/// Wavefront OBJ loader for `v` and `f` records
use nom::{
    bytes::complete::{tag, take_till},
    character::complete::{i64 as integer, space0, space1},
    combinator::{all_consuming, opt, recognize},
    multi::many1,
    number::complete::double,
    sequence::{pair, preceded, terminated},
    IResult,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::geometry::Vertex;

/// Loader output: positions plus 0-based, range-checked triangles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<[usize; 3]>,
}

/// A record the loader skipped or cut short
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObjIssue {
    #[error("line {line}: malformed vertex record")]
    MalformedVertex { line: usize },
    #[error("line {line}: malformed face record")]
    MalformedFace { line: usize },
    #[error("line {line}: vertex index {index} out of range (1..={available}), face truncated")]
    IndexOutOfRange {
        line: usize,
        index: i64,
        available: usize,
    },
}

#[derive(Debug, Error)]
pub enum ObjError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parsed mesh together with every record that had to be skipped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjReport {
    pub mesh: RawMesh,
    pub issues: Vec<ObjIssue>,
}

/// Read and parse an OBJ file. Only I/O failures are errors; bad records
/// are logged and skipped.
pub fn load_obj(path: impl AsRef<Path>) -> Result<RawMesh, ObjError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ObjError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let report = parse_obj_report(&text);
    for issue in &report.issues {
        log::warn!("{}: {}", path.display(), issue);
    }
    log::info!(
        "loaded {}: {} vertices, {} triangles",
        path.display(),
        report.mesh.vertices.len(),
        report.mesh.faces.len()
    );

    Ok(report.mesh)
}

/// Parse OBJ text, discarding the issue list
pub fn parse_obj(input: &str) -> RawMesh {
    parse_obj_report(input).mesh
}

/// Parse OBJ text line by line.
///
/// `v x y z` appends a vertex. `f i[/t/n] ...` is fan-triangulated against
/// the vertices seen so far; the first out-of-range index drops that
/// triangle and the rest of the fan. Any other line is ignored.
pub fn parse_obj_report(input: &str) -> ObjReport {
    let mut report = ObjReport::default();

    for (number, line) in input.lines().enumerate() {
        let number = number + 1;
        let line = line.trim_end_matches('\r');

        if line.starts_with("v ") {
            match vertex_record(line) {
                Ok((_, vertex)) => report.mesh.vertices.push(vertex),
                Err(_) => report.issues.push(ObjIssue::MalformedVertex { line: number }),
            }
        } else if line.starts_with("f ") {
            match face_record(line) {
                Ok((_, indices)) => {
                    triangulate(&indices, number, &mut report);
                }
                Err(_) => report.issues.push(ObjIssue::MalformedFace { line: number }),
            }
        }
    }

    report
}

fn triangulate(indices: &[i64], line: usize, report: &mut ObjReport) {
    let available = report.mesh.vertices.len();
    let resolve = |index: i64| -> Result<usize, ObjIssue> {
        if index >= 1 && (index as u64) <= available as u64 {
            Ok(index as usize - 1)
        } else {
            Err(ObjIssue::IndexOutOfRange {
                line,
                index,
                available,
            })
        }
    };

    for window in indices.windows(2).skip(1) {
        let triangle = resolve(indices[0])
            .and_then(|a| Ok([a, resolve(window[0])?, resolve(window[1])?]));
        match triangle {
            Ok(triangle) => report.mesh.faces.push(triangle),
            Err(issue) => {
                report.issues.push(issue);
                break;
            }
        }
    }
}

fn vertex_record(input: &str) -> IResult<&str, Vertex> {
    let (input, _) = tag("v")(input)?;
    let (input, x) = preceded(space1, double)(input)?;
    let (input, y) = preceded(space1, double)(input)?;
    let (input, z) = preceded(space1, double)(input)?;
    // optional w weight, then nothing but trailing blanks
    let (input, _) = all_consuming(terminated(opt(preceded(space1, double)), space0))(input)?;
    Ok((input, Vertex::new(x, y, z)))
}

/// Position indices of a face; texture and normal sub-indices are dropped
fn face_record(input: &str) -> IResult<&str, Vec<i64>> {
    let (input, _) = tag("f")(input)?;
    all_consuming(terminated(many1(preceded(space1, face_index)), space0))(input)
}

fn face_index(input: &str) -> IResult<&str, i64> {
    let (input, index) = integer(input)?;
    let (input, _) = opt(recognize(pair(
        tag("/"),
        take_till(|c: char| c.is_whitespace()),
    )))(input)?;
    Ok((input, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE: &str = "\
# cube
v -1 -1 1
v 1 -1 1
v 1 1 1
v -1 1 1

f 1/1/1 2/2/1 3/3/1 4/4/1
o ignored
vn 0 0 1
";

    fn one_based(mesh: &RawMesh) -> Vec<[usize; 3]> {
        mesh.faces.iter().map(|f| f.map(|i| i + 1)).collect()
    }

    #[test]
    fn test_parse_vertices_and_quad() {
        let report = parse_obj_report(CUBE);
        assert!(report.issues.is_empty());
        assert_eq!(report.mesh.vertices.len(), 4);
        assert_eq!(report.mesh.vertices[2], Vertex::new(1.0, 1.0, 1.0));
        assert_eq!(one_based(&report.mesh), vec![[1, 2, 3], [1, 3, 4]]);
    }

    #[test]
    fn test_fan_triangulation_order() {
        let input = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv -1 0 0\nf 1 2 3 4 5\n";
        let mesh = parse_obj(input);
        assert_eq!(one_based(&mesh), vec![[1, 2, 3], [1, 3, 4], [1, 4, 5]]);
    }

    #[test]
    fn test_out_of_range_index_truncates_face() {
        let input = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 9 4\nf 1 2 3\n";
        let report = parse_obj_report(input);
        // (1,2,3) survives, (1,3,9) and everything after it is dropped
        assert_eq!(one_based(&report.mesh), vec![[1, 2, 3], [1, 2, 3]]);
        assert_eq!(
            report.issues,
            vec![ObjIssue::IndexOutOfRange {
                line: 5,
                index: 9,
                available: 4
            }]
        );
    }

    #[test]
    fn test_face_before_its_vertices_is_dropped() {
        let input = "v 0 0 0\nf 1 2 3\nv 1 0 0\nv 1 1 0\n";
        let report = parse_obj_report(input);
        assert!(report.mesh.faces.is_empty());
        assert_eq!(report.mesh.vertices.len(), 3);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn test_zero_and_negative_indices_are_out_of_range() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 1 1 0\nf 0 1 2\nf -1 -2 -3\n");
        assert!(mesh.faces.is_empty());
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let input = "v 1 2\nv 0 0 0\nv a b c\nv 1 0 0\nv 0 1 0\nf 1 x 3\nf 1 2 3\n";
        let report = parse_obj_report(input);
        assert_eq!(report.mesh.vertices.len(), 3);
        assert_eq!(one_based(&report.mesh), vec![[1, 2, 3]]);
        assert_eq!(
            report.issues,
            vec![
                ObjIssue::MalformedVertex { line: 1 },
                ObjIssue::MalformedVertex { line: 3 },
                ObjIssue::MalformedFace { line: 6 },
            ]
        );
    }

    #[test]
    fn test_vertex_record_must_end_cleanly() {
        let report = parse_obj_report("v 1 2 3abc\nv 1 2 3 0.5\nv 4 5 6  \nv 1 2 3 4 5\n");
        assert_eq!(
            report.issues,
            vec![
                ObjIssue::MalformedVertex { line: 1 },
                ObjIssue::MalformedVertex { line: 4 },
            ]
        );
        assert_eq!(report.mesh.vertices, vec![Vertex::new(1.0, 2.0, 3.0), Vertex::new(4.0, 5.0, 6.0)]);
    }

    #[test]
    fn test_degenerate_single_vertex_face() {
        let mesh = parse_obj("v 0.5 0.25 3\nf 1 1 1\n");
        assert_eq!(mesh.faces, vec![[0, 0, 0]]);
    }

    #[test]
    fn test_short_faces_and_blank_lines() {
        let mesh = parse_obj("\n\nv 0 0 0\nv 1 0 0\nf 1 2\n\r\nf 1\n");
        assert!(mesh.faces.is_empty());
        assert_eq!(mesh.vertices.len(), 2);
    }

    #[test]
    fn test_crlf_and_scientific_notation() {
        let mesh = parse_obj("v 1e2 -2.5E-1 .5\r\nv 0 0 0\r\nv 1 1 1\r\nf 1//3 2//3 3//3\r\n");
        assert_eq!(mesh.vertices[0], Vertex::new(100.0, -0.25, 0.5));
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_obj("/definitely/not/here.obj").unwrap_err();
        assert!(matches!(err, ObjError::Io { .. }));
    }
}
