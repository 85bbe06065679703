// Copyright (c) 2026 The ubo-layout contributors
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Deterministic test data derived from the computed layout.
//!
//! Every leaf scalar value is seeded by hashing the member's offset and
//! name, so the same layout always produces the same data and no side
//! channel is needed to verify a round trip. For floating-point types the
//! setter re-emits the value as its exact IEEE bit pattern and the checker
//! compares bit patterns, so driver-side decimal parsing can never
//! introduce a mismatch.

use crate::{
    glsl,
    packing::{align, PackingRules},
    registry::StructRegistry,
    walk::{block_members, UniformBlock},
    LayoutError,
};
use smallvec::SmallVec;

/// The djb2 string hash. Not a terrific hash, but all that is needed is a
/// pseudorandom 32-bit number derived from a string.
pub fn hash_string(s: &str) -> u32 {
    s.bytes()
        .fold(5381u32, |h, c| h.wrapping_mul(33).wrapping_add(c as u32))
}

fn seed(name: &str, offset: u32) -> u32 {
    hash_string(&format!("{}@{}", offset, name))
}

/// Formats a derived floating-point value so it reads back as the same
/// `f64`, always with a decimal point so GLSL parses it as a float literal.
fn format_float(value: f64) -> String {
    let s = format!("{}", value);

    if s.contains('.') || s.contains('e') || s.contains("inf") || s.contains("NaN") {
        s
    } else {
        format!("{}.0", s)
    }
}

fn scalar_data(type_name: &str, name: &str, offset: u32) -> Result<String, LayoutError> {
    let h = seed(name, offset);

    match type_name {
        "int" => Ok((i64::from(h) - 0x7fffffff).to_string()),
        "uint" => Ok(h.to_string()),
        "bool" => Ok(if h & 8 == 0 { "1" } else { "0" }.to_owned()),
        "float" | "double" => {
            let value = (i64::from(h) - 0x7fffffff) as f64 / 65535.0;
            Ok(format_float(value))
        }
        _ => Err(LayoutError::MalformedTypeName(type_name.to_owned())),
    }
}

/// Derives the data for one scalar, vector or matrix member, as a
/// whitespace-separated list of per-component values.
///
/// Components perturb the seed offset so they do not repeat: vectors by 3
/// per component, matrices by 7 per cell.
pub fn random_data(type_name: &str, name: &str, offset: u32) -> Result<String, LayoutError> {
    if glsl::is_scalar(type_name) {
        return scalar_data(type_name, name, offset);
    }

    if glsl::is_vector(type_name) {
        let scalar = glsl::component_type(type_name)?;
        let values = (0..glsl::vector_size(type_name)?)
            .map(|i| scalar_data(scalar, name, offset + i * 3))
            .collect::<Result<SmallVec<[String; 4]>, _>>()?;
        return Ok(values.join(" "));
    }

    if glsl::is_matrix(type_name) {
        let (columns, rows) = glsl::matrix_dimensions(type_name)?;
        let scalar = if glsl::is_double_based(type_name) {
            "double"
        } else {
            "float"
        };
        let values = (0..columns * rows)
            .map(|i| scalar_data(scalar, name, offset + i * 7))
            .collect::<Result<SmallVec<[String; 16]>, _>>()?;
        return Ok(values.join(" "));
    }

    Err(LayoutError::MalformedTypeName(type_name.to_owned()))
}

/// The type to declare in a setter. Booleans cannot be poked through the
/// API directly, so bool types widen to their integer equivalents.
pub fn setter_type(type_name: &str) -> String {
    if type_name == "bool" {
        "int".to_owned()
    } else if let Some(rest) = type_name.strip_prefix('b') {
        format!("i{}", rest)
    } else {
        type_name.to_owned()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScalarKind {
    Float,
    Double,
    Other,
}

fn scalar_kind(type_name: &str) -> ScalarKind {
    if glsl::is_matrix(type_name) {
        if glsl::is_double_based(type_name) {
            ScalarKind::Double
        } else {
            ScalarKind::Float
        }
    } else {
        match glsl::component_type(type_name) {
            Ok("float") => ScalarKind::Float,
            Ok("double") => ScalarKind::Double,
            _ => ScalarKind::Other,
        }
    }
}

fn f32_bits(data: &str) -> Result<String, LayoutError> {
    let value: f64 = data
        .parse()
        .map_err(|_| LayoutError::MalformedTypeName(data.to_owned()))?;
    Ok(format!("{:#x}", (value as f32).to_bits()))
}

fn f64_bits(data: &str) -> Result<u64, LayoutError> {
    let value: f64 = data
        .parse()
        .map_err(|_| LayoutError::MalformedTypeName(data.to_owned()))?;
    Ok(value.to_bits())
}

/// Re-emits derived data in the form the setter must use: float and double
/// values become their exact IEEE bit patterns in hex, everything else is
/// passed through.
pub fn setter_data(type_name: &str, raw_data: &str) -> Result<String, LayoutError> {
    match scalar_kind(type_name) {
        ScalarKind::Float => {
            let words = raw_data
                .split(' ')
                .map(f32_bits)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(words.join(" "))
        }
        ScalarKind::Double => {
            let words = raw_data
                .split(' ')
                .map(|d| f64_bits(d).map(|bits| format!("{:#x}", bits)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(words.join(" "))
        }
        ScalarKind::Other => Ok(raw_data.to_owned()),
    }
}

/// The boolean expression that is true when the shader reads back a value
/// that does NOT match `data`.
pub fn scalar_checker(type_name: &str, name: &str, data: &str) -> Result<String, LayoutError> {
    match type_name {
        "bool" => {
            // The value is its own (mis)match test: a stored 0 must read
            // back false.
            if data == "0" {
                Ok(name.to_owned())
            } else {
                Ok(format!("!{}", name))
            }
        }
        "uint" => Ok(format!("{} != {}u", name, data)),
        "int" => Ok(format!("{} != {}", name, data)),
        "float" => {
            let bits = f32_bits(data)?;
            Ok(format!("!float_match({}, {}, {}u)", name, data, bits))
        }
        "double" => {
            let bits = f64_bits(data)?;
            let hi = (bits >> 32) as u32;
            let lo = bits as u32;
            Ok(format!("!double_match({}, uvec2({:#x}, {:#x}))", name, lo, hi))
        }
        _ => Err(LayoutError::MalformedTypeName(type_name.to_owned())),
    }
}

/// Per-component mismatch expressions for a vector member.
pub fn vector_checkers(
    type_name: &str,
    name: &str,
    data: &[&str],
) -> Result<Vec<String>, LayoutError> {
    const COMPONENTS: [&str; 4] = ["x", "y", "z", "w"];

    let scalar = glsl::component_type(type_name)?;
    (0..glsl::vector_size(type_name)? as usize)
        .map(|i| {
            scalar_checker(
                scalar,
                &format!("{}.{}", name, COMPONENTS[i]),
                data[i],
            )
        })
        .collect()
}

/// Per-cell mismatch expressions for a matrix member, indexed column by
/// column.
pub fn matrix_checkers(
    type_name: &str,
    name: &str,
    data: &[&str],
) -> Result<Vec<String>, LayoutError> {
    let (columns, rows) = glsl::matrix_dimensions(type_name)?;
    let column_type = if glsl::is_double_based(type_name) {
        format!("dvec{}", rows)
    } else {
        format!("vec{}", rows)
    };

    let mut checkers = Vec::with_capacity((columns * rows) as usize);
    for i in 0..columns as usize {
        let rows = rows as usize;
        checkers.extend(vector_checkers(
            &column_type,
            &format!("{}[{}]", name, i),
            &data[i * rows..(i + 1) * rows],
        )?);
    }

    Ok(checkers)
}

/// One introspection expectation for a block member, to be asserted against
/// the live API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestVector {
    /// API accessor path; arrays are queried through their first element.
    pub name: String,
    pub api_type: &'static str,
    pub element_count: u32,
    /// The placed (aligned) byte offset.
    pub offset: u32,
    pub array_stride: u32,
    pub matrix_stride: u32,
    pub row_major: bool,
}

/// Computes the introspection expectations for every queryable member of a
/// block. Structure announcements and array-of-structure elements have no
/// API type of their own and produce no vector.
#[allow(clippy::too_many_arguments)]
pub fn test_vectors(
    registry: &StructRegistry,
    fields: &[crate::registry::StructField],
    field_layouts: &[Option<crate::generate::MatrixLayout>],
    block_name: &str,
    instance_name: &str,
    packing: &dyn PackingRules,
    default_row_major: bool,
) -> Result<Vec<TestVector>, LayoutError> {
    let mut vectors = Vec::new();

    let members = block_members(
        registry,
        fields,
        field_layouts,
        block_name,
        instance_name,
        packing,
        default_row_major,
    )?;

    for m in &members {
        let a = packing.base_alignment(registry, &m.glsl_type, m.row_major)?;

        let (base_type, array_stride, name) = if glsl::is_array(&m.glsl_type) {
            (
                glsl::array_base_type(&m.glsl_type)?.to_owned(),
                packing.array_stride(registry, &m.glsl_type, m.row_major)?,
                format!("{}[0]", m.api_name),
            )
        } else {
            (m.glsl_type.clone(), 0, m.api_name.clone())
        };

        if glsl::is_matrix(&base_type) {
            vectors.push(TestVector {
                name,
                api_type: m
                    .api_type
                    .ok_or_else(|| LayoutError::MalformedTypeName(m.glsl_type.clone()))?,
                element_count: m.element_count,
                offset: align(m.offset, a),
                array_stride,
                matrix_stride: packing.matrix_stride(registry, &base_type, m.row_major)?,
                row_major: m.row_major,
            });
        } else if glsl::is_vector(&base_type) || glsl::is_scalar(&base_type) {
            vectors.push(TestVector {
                name,
                api_type: m
                    .api_type
                    .ok_or_else(|| LayoutError::MalformedTypeName(m.glsl_type.clone()))?,
                element_count: m.element_count,
                offset: align(m.offset, a),
                array_stride,
                matrix_stride: 0,
                row_major: false,
            });
        }
    }

    Ok(vectors)
}

/// One value to poke into the block through the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Setter {
    /// The declared type of the poke (bool types already widened).
    pub glsl_type: String,
    /// API accessor path of the target.
    pub name: String,
    /// Whitespace-separated component data (bit-pattern hex for
    /// floating-point types).
    pub data: String,
}

/// Derives the paired setter and checker lists for a set of blocks.
///
/// The returned lists are parallel in the sense that poking every setter
/// and evaluating every checker must leave all checkers false.
pub fn data_pairs(
    registry: &StructRegistry,
    blocks: &[UniformBlock],
    packing: &dyn PackingRules,
) -> Result<(Vec<String>, Vec<Setter>), LayoutError> {
    let mut checkers = Vec::new();
    let mut setters = Vec::new();

    for block in blocks {
        for m in block.members(registry, packing)? {
            if m.api_type.is_none() {
                continue;
            }

            if glsl::is_array(&m.glsl_type) {
                let base = glsl::array_base_type(&m.glsl_type)?.to_owned();
                let stride = packing.array_stride(registry, &m.glsl_type, m.row_major)?;

                for i in 0..glsl::array_elements(&m.glsl_type)? {
                    let name = format!("{}[{}]", m.glsl_name, i);
                    let offset = m.offset + i * stride;

                    let raw = random_data(&base, &m.glsl_name, offset)?;
                    setters.push(Setter {
                        glsl_type: setter_type(&base),
                        name: format!("{}[{}]", m.api_name, i),
                        data: setter_data(&base, &raw)?,
                    });

                    push_checkers(&base, &name, &raw, &mut checkers)?;
                }
            } else {
                let raw = random_data(&m.glsl_type, &m.glsl_name, m.offset)?;
                setters.push(Setter {
                    glsl_type: setter_type(&m.glsl_type),
                    name: m.api_name.clone(),
                    data: setter_data(&m.glsl_type, &raw)?,
                });

                push_checkers(&m.glsl_type, &m.glsl_name, &raw, &mut checkers)?;
            }
        }
    }

    Ok((checkers, setters))
}

fn push_checkers(
    type_name: &str,
    name: &str,
    raw_data: &str,
    checkers: &mut Vec<String>,
) -> Result<(), LayoutError> {
    let data: SmallVec<[&str; 16]> = raw_data.split(' ').collect();

    if glsl::is_scalar(type_name) {
        checkers.push(scalar_checker(type_name, name, data[0])?);
    } else if glsl::is_vector(type_name) {
        checkers.extend(vector_checkers(type_name, name, &data)?);
    } else if glsl::is_matrix(type_name) {
        checkers.extend(matrix_checkers(type_name, name, &data)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::MatrixLayout;
    use crate::packing::Std140;
    use crate::registry::StructField;
    use crate::walk::sibling_blocks;

    #[test]
    fn djb2_hash_matches_reference() {
        assert_eq!(hash_string(""), 5381);
        assert_eq!(hash_string("a"), 5381 * 33 + 97);
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = random_data("vec4", "fv1", 48).unwrap();
        let b = random_data("vec4", "fv1", 48).unwrap();
        assert_eq!(a, b);

        // A different offset or name changes the data.
        assert_ne!(a, random_data("vec4", "fv1", 52).unwrap());
        assert_ne!(a, random_data("vec4", "fv2", 48).unwrap());
    }

    #[test]
    fn scalar_value_mappings() {
        let h = seed("u1", 16);

        assert_eq!(random_data("uint", "u1", 16).unwrap(), h.to_string());
        assert_eq!(
            random_data("int", "u1", 16).unwrap(),
            (i64::from(h) - 0x7fffffff).to_string(),
        );

        let expected = if h & 8 == 0 { "1" } else { "0" };
        assert_eq!(random_data("bool", "u1", 16).unwrap(), expected);

        let f: f64 = random_data("float", "u1", 16).unwrap().parse().unwrap();
        let expected = (i64::from(h) - 0x7fffffff) as f64 / 65535.0;
        assert_eq!(f, expected);
    }

    #[test]
    fn vector_components_differ() {
        let data = random_data("uvec4", "u1", 0).unwrap();
        let parts: Vec<&str> = data.split(' ').collect();
        assert_eq!(parts.len(), 4);
        assert_ne!(parts[0], parts[1]);
    }

    #[test]
    fn matrix_cell_count_matches_dimensions() {
        let data = random_data("mat3x2", "m1", 0).unwrap();
        assert_eq!(data.split(' ').count(), 6);

        let data = random_data("dmat4", "m2", 0).unwrap();
        assert_eq!(data.split(' ').count(), 16);
    }

    #[test]
    fn float_literals_always_parse_as_float() {
        // 2.0 must not be emitted as the int literal "2".
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(-0.5), "-0.5");
    }

    #[test]
    fn bool_setters_widen_to_int() {
        assert_eq!(setter_type("bool"), "int");
        assert_eq!(setter_type("bvec3"), "ivec3");
        assert_eq!(setter_type("vec2"), "vec2");
        assert_eq!(setter_type("dmat3x4"), "dmat3x4");
    }

    #[test]
    fn float_setter_data_is_the_exact_bit_pattern() {
        assert_eq!(setter_data("float", "1.5").unwrap(), "0x3fc00000");
        assert_eq!(setter_data("vec2", "1.5 -2.0").unwrap(), "0x3fc00000 0xc0000000");
        assert_eq!(setter_data("double", "1.5").unwrap(), "0x3ff8000000000000");
        assert_eq!(setter_data("ivec2", "3 -4").unwrap(), "3 -4");
        assert_eq!(setter_data("mat2", "1.5 1.5 1.5 1.5").unwrap(),
            "0x3fc00000 0x3fc00000 0x3fc00000 0x3fc00000");
    }

    #[test]
    fn scalar_checker_forms() {
        assert_eq!(scalar_checker("bool", "b1", "0").unwrap(), "b1");
        assert_eq!(scalar_checker("bool", "b1", "1").unwrap(), "!b1");
        assert_eq!(scalar_checker("uint", "u1", "7").unwrap(), "u1 != 7u");
        assert_eq!(scalar_checker("int", "i1", "-7").unwrap(), "i1 != -7");
        assert_eq!(
            scalar_checker("float", "f1", "1.5").unwrap(),
            "!float_match(f1, 1.5, 0x3fc00000u)",
        );
        assert_eq!(
            scalar_checker("double", "d1", "1.5").unwrap(),
            "!double_match(d1, uvec2(0x0, 0x3ff80000))",
        );
    }

    #[test]
    fn vector_checkers_name_components() {
        let checkers = vector_checkers("uvec3", "u1", &["1", "2", "3"]).unwrap();
        assert_eq!(checkers, ["u1.x != 1u", "u1.y != 2u", "u1.z != 3u"]);
    }

    #[test]
    fn matrix_checkers_index_columns() {
        let checkers =
            matrix_checkers("mat2", "m1", &["1.5", "1.5", "1.5", "1.5"]).unwrap();
        assert_eq!(checkers.len(), 4);
        assert!(checkers[0].contains("m1[0].x"));
        assert!(checkers[3].contains("m1[1].y"));
    }

    #[test]
    fn test_vectors_report_aligned_offsets() {
        let registry = StructRegistry::new();
        let fields = vec![
            StructField::new("float", "f1"),
            StructField::new("vec3", "v1"),
            StructField::new("mat3", "m1"),
        ];
        let layouts = vec![None, None, Some(MatrixLayout::ShadowColumnMajor)];

        let vectors = test_vectors(
            &registry, &fields, &layouts, "UB1", "", &Std140, false,
        )
        .unwrap();

        assert_eq!(vectors.len(), 3);

        assert_eq!(vectors[0].name, "f1");
        assert_eq!(vectors[0].api_type, "GL_FLOAT");
        assert_eq!(vectors[0].offset, 0);

        assert_eq!(vectors[1].offset, 16);
        assert_eq!(vectors[1].matrix_stride, 0);

        assert_eq!(vectors[2].name, "m1");
        assert_eq!(vectors[2].offset, 32);
        assert_eq!(vectors[2].matrix_stride, 16);
        assert!(!vectors[2].row_major);
    }

    #[test]
    fn array_test_vectors_query_the_first_element() {
        let registry = StructRegistry::new();
        let fields = vec![StructField::new("float[3]", "f1")];
        let vectors =
            test_vectors(&registry, &fields, &[None], "UB1", "", &Std140, false).unwrap();

        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].name, "f1[0]");
        assert_eq!(vectors[0].element_count, 3);
        assert_eq!(vectors[0].array_stride, 16);
    }

    #[test]
    fn structures_produce_no_test_vector() {
        let mut registry = StructRegistry::new();
        registry.define("S1", vec![StructField::new("float", "f1")]);

        let fields = vec![StructField::new("S1[2]", "s1")];
        let vectors =
            test_vectors(&registry, &fields, &[None], "UB1", "", &Std140, false).unwrap();

        // Only the leaf floats inside the elements are queryable.
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].name, "s1[0].f1");
        assert_eq!(vectors[1].name, "s1[1].f1");
        assert_eq!(vectors[1].offset, 16);
    }

    #[test]
    fn data_pairs_cover_every_leaf_once_per_block() {
        let mut registry = StructRegistry::new();
        registry.define(
            "S1",
            vec![
                StructField::new("bvec2", "b1"),
                StructField::new("float", "f1"),
            ],
        );

        let fields = vec![
            StructField::new("S1", "s1"),
            StructField::new("uint[3]", "u1"),
        ];
        let layouts = vec![Some(MatrixLayout::ShadowColumnMajor), None];

        let blocks = sibling_blocks(&Std140, &fields, &layouts, false).unwrap();
        let (checkers, setters) = data_pairs(&registry, &blocks, &Std140).unwrap();

        // Setters: bvec2, float, and one per uint array element.
        assert_eq!(setters.len(), 5);
        assert_eq!(setters[0].glsl_type, "ivec2");
        assert_eq!(setters[2].name, "u1[0]");

        // Checkers: 2 bvec components + 1 float + 3 uints.
        assert_eq!(checkers.len(), 6);

        // Every checker references the shader-facing path.
        assert!(checkers.iter().any(|c| c.contains("s1.b1.x")));
        assert!(checkers.iter().any(|c| c.contains("!float_match(s1.f1")));
    }

    #[test]
    fn setters_and_checkers_share_bit_patterns() {
        let registry = StructRegistry::new();
        let fields = vec![StructField::new("vec2", "v1")];
        let blocks = sibling_blocks(&Std140, &fields, &[None], false).unwrap();

        let (checkers, setters) = data_pairs(&registry, &blocks, &Std140).unwrap();
        assert_eq!(setters.len(), 1);
        assert_eq!(checkers.len(), 2);

        // Each checker carries the same bit pattern the setter pokes.
        for (checker, word) in checkers.iter().zip(setters[0].data.split(' ')) {
            assert!(
                checker.contains(&format!("{}u", word)),
                "{} missing {}",
                checker,
                word,
            );
        }
    }
}
