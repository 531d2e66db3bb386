/// Wavefront OBJ importer for indexed triangle meshes.
///
/// Only `v`, `vt`, `vn` and triangular `f` records are read; every other line
/// is ignored. Corners sharing the same `(position, texcoord, normal)` index
/// triple collapse into a single vertex.
use std::path::Path;

use log::{debug, info};
use nalgebra::{Point3, Vector2, Vector3};
use nom::{
    character::complete::{char, digit1, space0, space1},
    combinator::{all_consuming, map, map_res, opt},
    error::{Error as NomError, ErrorKind},
    multi::{many0, many1},
    number::complete::float,
    sequence::{preceded, terminated, tuple},
    IResult,
};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::geometry::{Mesh, Vertex};

/// The 1-based `(position, texcoord, normal)` indices of one face corner.
///
/// A component of `0` means the attribute was absent from the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceIndexKey {
    pub position: u32,
    pub texcoord: u32,
    pub normal: u32,
}

impl FaceIndexKey {
    pub fn new(position: u32, texcoord: u32, normal: u32) -> Self {
        Self {
            position,
            texcoord,
            normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Record {
    Position(Point3<f32>),
    Texcoord(Vector2<f32>),
    Normal(Vector3<f32>),
    Face(Vec<FaceIndexKey>),
    Ignored,
}

/// Parse OBJ text into a deduplicated indexed mesh
pub fn parse_obj(input: &str) -> Result<Mesh> {
    let mut positions: Vec<Point3<f32>> = Vec::new();
    let mut texcoords: Vec<Vector2<f32>> = Vec::new();
    let mut normals: Vec<Vector3<f32>> = Vec::new();
    let mut corners: Vec<(usize, FaceIndexKey)> = Vec::new();

    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    for (line_index, line) in split_lines(input).enumerate() {
        let line_number = line_index + 1;
        match parse_record(line, line_number)? {
            Record::Position(p) => positions.push(p),
            Record::Texcoord(t) => texcoords.push(t),
            Record::Normal(n) => normals.push(n),
            Record::Face(face) => {
                if face.len() != 3 {
                    return Err(Error::UnsupportedPolygon {
                        line: line_number,
                        corners: face.len(),
                    });
                }
                corners.extend(face.into_iter().map(|key| (line_number, key)));
            }
            Record::Ignored => {}
        }
    }

    if positions.is_empty() {
        return Err(Error::MissingData("no vertex positions"));
    }
    match corners.first() {
        None => return Err(Error::MissingData("no faces")),
        Some((_, key)) if key.position == 0 => {
            return Err(Error::MissingData("first face corner has no position index"))
        }
        Some(_) => {}
    }

    let mut seen: FxHashMap<FaceIndexKey, u32> = FxHashMap::default();
    let mut vertices: Vec<Vertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::with_capacity(corners.len());

    for &(line, key) in &corners {
        if let Some(&slot) = seen.get(&key) {
            indices.push(slot);
            continue;
        }

        let position = *lookup(&positions, key.position, "position", line)?;
        let texcoord = match key.texcoord {
            0 => Vector2::zeros(),
            index => *lookup(&texcoords, index, "texcoord", line)?,
        };
        let normal = match key.normal {
            0 => Vector3::zeros(),
            index => *lookup(&normals, index, "normal", line)?,
        };

        let slot =
            u32::try_from(vertices.len()).map_err(|_| Error::TooManyVertices(vertices.len()))?;
        vertices.push(Vertex::new(position, normal, texcoord));
        seen.insert(key, slot);
        indices.push(slot);
    }

    info!(
        "OBJ loaded: {} faces, {} positions, {} normals, {} texcoords, {} unique vertices",
        indices.len() / 3,
        positions.len(),
        normals.len(),
        texcoords.len(),
        vertices.len()
    );

    Ok(Mesh { vertices, indices })
}

/// Split on `\n`, `\r\n` and lone `\r` line endings
fn split_lines(input: &str) -> impl Iterator<Item = &str> {
    input
        .split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

/// Resolve a 1-based source index against an attribute pool
fn lookup<'a, T>(pool: &'a [T], index: u32, attribute: &'static str, line: usize) -> Result<&'a T> {
    (index as usize)
        .checked_sub(1)
        .and_then(|slot| pool.get(slot))
        .ok_or(Error::IndexOutOfRange {
            line,
            attribute,
            index,
            len: pool.len(),
        })
}

fn parse_record(line: &str, line_number: usize) -> Result<Record> {
    // Strip trailing comments
    let content = line.split('#').next().unwrap_or("").trim_start();
    let keyword_end = content
        .find(char::is_whitespace)
        .unwrap_or(content.len());
    let (keyword, rest) = content.split_at(keyword_end);

    let (record, parsed) = match keyword {
        "v" => ("position", all_consuming(position_record)(rest).map(|(_, r)| r)),
        "vt" => ("texcoord", all_consuming(texcoord_record)(rest).map(|(_, r)| r)),
        "vn" => ("normal", all_consuming(normal_record)(rest).map(|(_, r)| r)),
        "f" => ("face", all_consuming(face_record)(rest).map(|(_, r)| r)),
        _ => return Ok(Record::Ignored),
    };

    parsed.map_err(|e| {
        debug!("line {}: {:?}", line_number, e);
        Error::Malformed {
            line: line_number,
            record,
            content: line.to_string(),
        }
    })
}

fn position_record(input: &str) -> IResult<&str, Record> {
    map(terminated(parse_vector3, extra_components), |v| {
        Record::Position(Point3::from(v))
    })(input)
}

fn texcoord_record(input: &str) -> IResult<&str, Record> {
    map(
        terminated(
            tuple((preceded(space1, float), preceded(space1, float))),
            extra_components,
        ),
        |(u, v)| Record::Texcoord(Vector2::new(u, v)),
    )(input)
}

fn normal_record(input: &str) -> IResult<&str, Record> {
    map(terminated(parse_vector3, extra_components), Record::Normal)(input)
}

fn face_record(input: &str) -> IResult<&str, Record> {
    map(
        terminated(many1(preceded(space1, parse_corner)), space0),
        Record::Face,
    )(input)
}

fn parse_vector3(input: &str) -> IResult<&str, Vector3<f32>> {
    let (input, x) = preceded(space1, float)(input)?;
    let (input, y) = preceded(space1, float)(input)?;
    let (input, z) = preceded(space1, float)(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

/// Optional trailing components such as the `w` of a position; read and dropped
fn extra_components(input: &str) -> IResult<&str, ()> {
    let (input, _) = many0(preceded(space1, float))(input)?;
    let (input, _) = space0(input)?;
    Ok((input, ()))
}

fn parse_index(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse::<u32>)(input)
}

/// Parse one `p[/t][/n]` corner descriptor; empty fields become 0
fn parse_corner(input: &str) -> IResult<&str, FaceIndexKey> {
    let start = input;
    let (input, position) = opt(parse_index)(input)?;
    let (input, texcoord) = opt(preceded(char('/'), opt(parse_index)))(input)?;
    let (input, normal) = match texcoord {
        Some(_) => opt(preceded(char('/'), opt(parse_index)))(input)?,
        None => (input, None),
    };

    if position.is_none() && texcoord.is_none() {
        return Err(nom::Err::Error(NomError::new(start, ErrorKind::Digit)));
    }

    Ok((
        input,
        FaceIndexKey::new(
            position.unwrap_or(0),
            texcoord.flatten().unwrap_or(0),
            normal.flatten().unwrap_or(0),
        ),
    ))
}

impl Mesh {
    /// Import a mesh from OBJ text
    pub fn from_obj_str(input: &str) -> Result<Self> {
        parse_obj(input)
    }

    /// Read and import an OBJ file
    pub fn load_obj(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("parsing {} ({} bytes)", path.display(), content.len());
        parse_obj(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";

    #[test]
    fn test_parse_corner_forms() {
        assert_eq!(parse_corner("7").unwrap().1, FaceIndexKey::new(7, 0, 0));
        assert_eq!(parse_corner("7/2").unwrap().1, FaceIndexKey::new(7, 2, 0));
        assert_eq!(parse_corner("7//3").unwrap().1, FaceIndexKey::new(7, 0, 3));
        assert_eq!(parse_corner("7/2/3").unwrap().1, FaceIndexKey::new(7, 2, 3));
        assert_eq!(parse_corner("/2/3").unwrap().1, FaceIndexKey::new(0, 2, 3));
        assert!(parse_corner("").is_err());
        assert!(parse_corner("-1").is_err());
    }

    #[test]
    fn test_record_classification() {
        assert_eq!(
            parse_record("v 1 2 3", 1).unwrap(),
            Record::Position(Point3::new(1.0, 2.0, 3.0))
        );
        assert_eq!(
            parse_record("vt 0.5 0.25", 1).unwrap(),
            Record::Texcoord(Vector2::new(0.5, 0.25))
        );
        assert_eq!(
            parse_record("vn 0 -1 0", 1).unwrap(),
            Record::Normal(Vector3::new(0.0, -1.0, 0.0))
        );
        assert_eq!(parse_record("# comment", 1).unwrap(), Record::Ignored);
        assert_eq!(parse_record("usemtl stone", 1).unwrap(), Record::Ignored);
        assert_eq!(parse_record("vp 0.1 0.2", 1).unwrap(), Record::Ignored);
        assert_eq!(parse_record("", 1).unwrap(), Record::Ignored);
    }

    #[test]
    fn test_extra_components_are_dropped() {
        assert_eq!(
            parse_record("v 1 2 3 1.0", 1).unwrap(),
            Record::Position(Point3::new(1.0, 2.0, 3.0))
        );
        assert_eq!(
            parse_record("vt 0.5 0.5 0", 1).unwrap(),
            Record::Texcoord(Vector2::new(0.5, 0.5))
        );
    }

    #[test]
    fn test_deduplicates_shared_corners() {
        let mesh = parse_obj(QUAD).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices(), &[0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.vertices()[2].texcoord, Vector2::new(1.0, 1.0));
        assert_eq!(mesh.vertices()[3].normal, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_same_position_different_texcoord_is_distinct() {
        let input = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 1\n\
                     f 1/1 2/1 3/1\nf 1/2 2/1 3/1\n";
        let mesh = parse_obj(input).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices(), &[0, 1, 2, 3, 1, 2]);
        assert_eq!(mesh.vertices()[0].position, mesh.vertices()[3].position);
    }

    #[test]
    fn test_absent_attributes_default_to_zero() {
        let input = "v 1 2 3\nv 4 5 6\nv 7 8 9\nf 1 2 3\n";
        let mesh = parse_obj(input).unwrap();
        for vertex in mesh.vertices() {
            assert_eq!(vertex.texcoord, Vector2::zeros());
            assert_eq!(vertex.normal, Vector3::zeros());
            assert_eq!(vertex.tangent, Vector3::zeros());
        }
    }

    #[test]
    fn test_crlf_and_comments() {
        let input = "v 0 0 0\r\nv 1 0 0\r\nv 0 1 0 # apex\r\nf 1 2 3\r\n";
        let mesh = parse_obj(input).unwrap();
        assert_eq!(mesh.index_count(), 3);
    }

    #[test]
    fn test_missing_positions() {
        let result = parse_obj("vn 0 0 1\nf 1 2 3\n");
        assert!(matches!(result, Err(Error::MissingData(_))));
    }

    #[test]
    fn test_missing_faces() {
        let result = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\n");
        assert!(matches!(result, Err(Error::MissingData(_))));
    }

    #[test]
    fn test_first_corner_without_position() {
        let result = parse_obj("v 0 0 0\nvt 0 0\nf /1 /1 /1\n");
        assert!(matches!(result, Err(Error::MissingData(_))));
    }

    #[test]
    fn test_later_corner_without_position() {
        let result = parse_obj("v 0 0 0\nv 1 0 0\nvt 0 0\nf 1/1 2/1 /1\n");
        assert!(matches!(
            result,
            Err(Error::IndexOutOfRange {
                attribute: "position",
                index: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let result = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1//1 2//1 3//1\n");
        match result {
            Err(Error::IndexOutOfRange {
                line,
                attribute,
                index,
                len,
            }) => {
                assert_eq!(line, 4);
                assert_eq!(attribute, "normal");
                assert_eq!(index, 1);
                assert_eq!(len, 0);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_number_is_fatal() {
        let result = parse_obj("v 0 0 0\nv 1 zero 0\nv 0 1 0\nf 1 2 3\n");
        match result {
            Err(Error::Malformed { line, record, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(record, "position");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_short_position_is_fatal() {
        let result = parse_obj("v 0 0\nf 1 1 1\n");
        assert!(matches!(result, Err(Error::Malformed { line: 1, .. })));
    }

    #[test]
    fn test_quad_face_rejected() {
        let input = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let result = parse_obj(input);
        assert!(matches!(
            result,
            Err(Error::UnsupportedPolygon {
                line: 5,
                corners: 4
            })
        ));
    }

    #[test]
    fn test_face_may_reference_later_positions() {
        let input = "f 1 2 3\nv 0 0 0\nv 1 0 0\nv 0 1 0\n";
        let mesh = parse_obj(input).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_carriage_return_line_endings() {
        let mesh = parse_obj("v 0 0 0\rv 1 0 0\rv 0 1 0\rf 1 2 3\r").unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices(), &[0, 1, 2]);
        assert_eq!(mesh.vertices()[1].position, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_crlf_keeps_line_numbers() {
        let result = parse_obj("v 0 0 0\r\nv 1 0 0\r\nv 0 1 x\r\n");
        assert!(matches!(result, Err(Error::Malformed { line: 3, .. })));

        let mesh = parse_obj("v 0 0 0\r\nv 1 0 0\r\nv 0 1 0\r\nf 1 2 3\r\n").unwrap();
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_leading_byte_order_mark() {
        let input = "\u{feff}v 9 9 9\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let mesh = parse_obj(input).unwrap();
        assert_eq!(mesh.vertices()[0].position, Point3::new(9.0, 9.0, 9.0));
        assert_eq!(mesh.vertices()[2].position, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Mesh::load_obj("/nonexistent/model.obj");
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
