// Copyright (c) 2026 The ubo-layout contributors
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Classification of the GLSL type vocabulary.
//!
//! Type names are kept as plain strings throughout the crate, because that
//! is what both the shader source and the API introspection surface speak.
//! Arrays are encoded as `base[count]`, matrices carry their column and row
//! counts in the name (`mat3x2`, with `mat3` shorthand for `mat3x3`), and
//! vectors carry a component-kind prefix (`ivec4`, `dvec2`, bare `vec3` for
//! float). Anything that is none of these shapes is assumed to name a
//! structure and must be resolved through the
//! [`StructRegistry`](crate::registry::StructRegistry).

use crate::LayoutError;

/// The data types usable in a uniform block in GLSL 1.30.
pub const ALL_130_TYPES: &[&str] = &[
    "float", "vec2", "vec3", "vec4", //
    "int", "ivec2", "ivec3", "ivec4", //
    "uint", "uvec2", "uvec3", "uvec4", //
    "bool", "bvec2", "bvec3", "bvec4", //
    "mat2", "mat2x3", "mat2x4", //
    "mat3x2", "mat3", "mat3x4", //
    "mat4x2", "mat4x3", "mat4",
];

/// The double-precision types added by GLSL 4.00 and
/// `GL_ARB_gpu_shader_fp64`.
pub const DOUBLE_TYPES: &[&str] = &[
    "double", "dvec2", "dvec3", "dvec4", //
    "dmat2", "dmat2x3", "dmat2x4", //
    "dmat3x2", "dmat3", "dmat3x4", //
    "dmat4x2", "dmat4x3", "dmat4",
];

/// Redundant square matrix spellings. Same types as `matN`/`dmatN`, and they
/// map to the same API enumerants.
pub const REDUNDANT_MATRIX_TYPES: &[&str] = &[
    "mat2x2", "mat3x3", "mat4x4", //
    "dmat2x2", "dmat3x3", "dmat4x4",
];

/// Returns the GLSL 4.00 type set (the 1.30 set plus the double types).
pub fn all_400_types() -> Vec<&'static str> {
    let mut types = ALL_130_TYPES.to_vec();
    types.extend_from_slice(DOUBLE_TYPES);
    types
}

/// Whether `type_name` is a recognized built-in type, under any spelling.
pub fn is_known_builtin(type_name: &str) -> bool {
    ALL_130_TYPES.contains(&type_name)
        || DOUBLE_TYPES.contains(&type_name)
        || REDUNDANT_MATRIX_TYPES.contains(&type_name)
}

pub fn is_scalar(type_name: &str) -> bool {
    matches!(type_name, "float" | "bool" | "int" | "uint" | "double")
}

pub fn is_vector(type_name: &str) -> bool {
    matches!(
        type_name,
        "vec2" | "vec3" | "vec4" //
        | "ivec2" | "ivec3" | "ivec4" //
        | "uvec2" | "uvec3" | "uvec4" //
        | "bvec2" | "bvec3" | "bvec4" //
        | "dvec2" | "dvec3" | "dvec4"
    )
}

pub fn is_matrix(type_name: &str) -> bool {
    matches!(
        type_name,
        "mat2" | "mat3" | "mat4" //
        | "mat2x2" | "mat2x3" | "mat2x4" //
        | "mat3x2" | "mat3x3" | "mat3x4" //
        | "mat4x2" | "mat4x3" | "mat4x4" //
        | "dmat2" | "dmat3" | "dmat4" //
        | "dmat2x2" | "dmat2x3" | "dmat2x4" //
        | "dmat3x2" | "dmat3x3" | "dmat3x4" //
        | "dmat4x2" | "dmat4x3" | "dmat4x4"
    )
}

pub fn is_array(type_name: &str) -> bool {
    type_name.contains('[')
}

/// A structure is anything that is not one of the built-in shapes. Whether
/// the name actually resolves is the registry's business.
pub fn is_structure(type_name: &str) -> bool {
    !(is_scalar(type_name)
        || is_vector(type_name)
        || is_matrix(type_name)
        || is_array(type_name))
}

/// Whether the type's components are double-precision.
pub fn is_double_based(type_name: &str) -> bool {
    type_name.starts_with('d')
}

/// The number of components of a vector type.
pub fn vector_size(type_name: &str) -> Result<u32, LayoutError> {
    if !is_vector(type_name) {
        return Err(LayoutError::MalformedTypeName(type_name.to_owned()));
    }

    // The vocabulary guarantees the name ends in its component count.
    let components = type_name
        .chars()
        .next_back()
        .and_then(|c| c.to_digit(10))
        .ok_or_else(|| LayoutError::MalformedTypeName(type_name.to_owned()))?;

    Ok(components)
}

/// The (columns, rows) dimensions of a matrix type. `mat3x2` has 3 columns
/// of 2 rows; the square shorthand `mat3` is 3x3.
pub fn matrix_dimensions(type_name: &str) -> Result<(u32, u32), LayoutError> {
    if !is_matrix(type_name) {
        return Err(LayoutError::MalformedTypeName(type_name.to_owned()));
    }

    let mut chars = type_name.chars().rev();
    let last = chars
        .next()
        .and_then(|c| c.to_digit(10))
        .ok_or_else(|| LayoutError::MalformedTypeName(type_name.to_owned()))?;

    if chars.next() == Some('x') {
        let columns = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| LayoutError::MalformedTypeName(type_name.to_owned()))?;
        Ok((columns, last))
    } else {
        Ok((last, last))
    }
}

/// The element type of an array type: everything before the first bracket.
///
/// Arrays of arrays are spelled inside-out (`vec2[7][3]` is built by
/// wrapping `vec2[7]`), so the first bracket also carries the count that
/// [`array_elements`] reports.
pub fn array_base_type(type_name: &str) -> Result<&str, LayoutError> {
    match type_name.split_once('[') {
        Some((base, _)) => Ok(base),
        None => Err(LayoutError::MalformedTypeName(type_name.to_owned())),
    }
}

/// The element count of an array type, or 0 for non-array types.
pub fn array_elements(type_name: &str) -> Result<u32, LayoutError> {
    let Some((_, rest)) = type_name.split_once('[') else {
        return Ok(0);
    };

    let count = rest
        .split(']')
        .next()
        .and_then(|digits| digits.parse::<u32>().ok())
        .ok_or_else(|| LayoutError::MalformedTypeName(type_name.to_owned()))?;

    Ok(count)
}

/// The scalar component type of a scalar or vector type.
pub fn component_type(type_name: &str) -> Result<&'static str, LayoutError> {
    if is_scalar(type_name) {
        return Ok(match type_name {
            "float" => "float",
            "int" => "int",
            "uint" => "uint",
            "bool" => "bool",
            _ => "double",
        });
    }

    if is_vector(type_name) {
        return match type_name.chars().next() {
            Some('v') => Ok("float"),
            Some('i') => Ok("int"),
            Some('u') => Ok("uint"),
            Some('b') => Ok("bool"),
            Some('d') => Ok("double"),
            _ => Err(LayoutError::MalformedTypeName(type_name.to_owned())),
        };
    }

    // Matrices and structures have no single scalar component type here.
    Err(LayoutError::MalformedTypeName(type_name.to_owned()))
}

/// The machine-unit size of a scalar type, in bytes.
pub fn basic_machine_units(type_name: &str) -> Result<u32, LayoutError> {
    match type_name {
        "float" | "bool" | "int" | "uint" => Ok(4),
        "double" => Ok(8),
        _ => Err(LayoutError::MalformedTypeName(type_name.to_owned())),
    }
}

/// The API introspection enumerant for a built-in type, or `None` for
/// structures and arrays.
pub fn api_enum(type_name: &str) -> Option<&'static str> {
    let e = match type_name {
        "float" => "GL_FLOAT",
        "vec2" => "GL_FLOAT_VEC2",
        "vec3" => "GL_FLOAT_VEC3",
        "vec4" => "GL_FLOAT_VEC4",

        "double" => "GL_DOUBLE",
        "dvec2" => "GL_DOUBLE_VEC2",
        "dvec3" => "GL_DOUBLE_VEC3",
        "dvec4" => "GL_DOUBLE_VEC4",

        "int" => "GL_INT",
        "ivec2" => "GL_INT_VEC2",
        "ivec3" => "GL_INT_VEC3",
        "ivec4" => "GL_INT_VEC4",

        "uint" => "GL_UNSIGNED_INT",
        "uvec2" => "GL_UNSIGNED_INT_VEC2",
        "uvec3" => "GL_UNSIGNED_INT_VEC3",
        "uvec4" => "GL_UNSIGNED_INT_VEC4",

        "bool" => "GL_BOOL",
        "bvec2" => "GL_BOOL_VEC2",
        "bvec3" => "GL_BOOL_VEC3",
        "bvec4" => "GL_BOOL_VEC4",

        "mat2" | "mat2x2" => "GL_FLOAT_MAT2",
        "mat2x3" => "GL_FLOAT_MAT2x3",
        "mat2x4" => "GL_FLOAT_MAT2x4",

        "mat3" | "mat3x3" => "GL_FLOAT_MAT3",
        "mat3x2" => "GL_FLOAT_MAT3x2",
        "mat3x4" => "GL_FLOAT_MAT3x4",

        "mat4" | "mat4x4" => "GL_FLOAT_MAT4",
        "mat4x2" => "GL_FLOAT_MAT4x2",
        "mat4x3" => "GL_FLOAT_MAT4x3",

        "dmat2" | "dmat2x2" => "GL_DOUBLE_MAT2",
        "dmat2x3" => "GL_DOUBLE_MAT2x3",
        "dmat2x4" => "GL_DOUBLE_MAT2x4",

        "dmat3" | "dmat3x3" => "GL_DOUBLE_MAT3",
        "dmat3x2" => "GL_DOUBLE_MAT3x2",
        "dmat3x4" => "GL_DOUBLE_MAT3x4",

        "dmat4" | "dmat4x4" => "GL_DOUBLE_MAT4",
        "dmat4x2" => "GL_DOUBLE_MAT4x2",
        "dmat4x3" => "GL_DOUBLE_MAT4x3",

        _ => return None,
    };

    Some(e)
}
