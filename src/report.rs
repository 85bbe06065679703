// Copyright (c) 2026 The ubo-layout contributors
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Human-readable annotation of a computed layout.
//!
//! Generated tests embed each block's layout as comment columns next to the
//! member declarations, so a failing test can be debugged by reading it.
//! This module renders those columns and the GLSL `struct` declarations the
//! block depends on; assembling them into complete shader source is the
//! caller's job.

use crate::{
    glsl,
    packing::{align, PackingRules},
    registry::StructRegistry,
    walk::BlockMember,
    LayoutError,
};
use std::fmt::Write;

/// Column headings matching [`format_member`] output, aligned for a member
/// list indented by four spaces.
pub const ANNOTATION_HEADER: &str = "                          // base   base  align  padded  row-   array   matrix\n                          // align  off.  off.   size    major  stride  stride";

/// Renders the annotation columns for one type at one offset: base
/// alignment, base offset, aligned offset, padded size, row-majorness, and
/// the array and matrix strides where they apply.
pub fn format_type_data(
    registry: &StructRegistry,
    packing: &dyn PackingRules,
    type_name: &str,
    offset: u32,
    row_major: bool,
) -> Result<String, LayoutError> {
    let a = packing.base_alignment(registry, type_name, row_major)?;
    let aligned_offset = align(offset, a);
    let size = packing.size(registry, type_name, row_major)?;

    let mut row_major_str = "-".to_owned();
    let mut matrix_stride = "-".to_owned();
    let mut array_stride = "-".to_owned();

    let matrix_type = if glsl::is_array(type_name) {
        array_stride = packing
            .array_stride(registry, type_name, row_major)?
            .to_string();
        glsl::array_base_type(type_name)?
    } else {
        type_name
    };

    if glsl::is_matrix(matrix_type) {
        row_major_str = if row_major { "yes" } else { "no" }.to_owned();
        matrix_stride = packing
            .matrix_stride(registry, matrix_type, row_major)?
            .to_string();
    }

    Ok(format!(
        "{:>3}  {:>4}  {:>5}  {:>6}  {:^5}  {:>6}  {:>6}",
        a, offset, aligned_offset, size, row_major_str, array_stride, matrix_stride,
    ))
}

/// Renders one member's declaration-with-annotation line(s).
///
/// Array-of-structure elements collapse to a bare `[N` marker; nested
/// fields are indented comment lines; top-level members are real
/// declarations, preceded by their `layout(...)` qualifier when one is
/// declared explicitly.
pub fn format_member(
    registry: &StructRegistry,
    member: &BlockMember,
    packing: &dyn PackingRules,
) -> Result<String, LayoutError> {
    // An element of an array of structures: emit a marker for the index,
    // the element's fields follow as their own records.
    if member.glsl_name.ends_with(']') {
        let n = member.struct_nesting() + 1;
        let index = member
            .glsl_name
            .rsplit('[')
            .next()
            .ok_or_else(|| LayoutError::MalformedTypeName(member.glsl_name.clone()))?;

        return Ok(format!("//  {}[{}", "  ".repeat(n), index));
    }

    let name = member
        .glsl_name
        .rsplit('.')
        .next()
        .ok_or_else(|| LayoutError::MalformedTypeName(member.glsl_name.clone()))?;

    let data = format_type_data(
        registry,
        packing,
        &member.glsl_type,
        member.offset,
        member.row_major,
    )?;

    let n = member.struct_nesting();
    if n > 0 {
        let mut field = format!(
            "//  {}{:<11} {:<20}",
            "  ".repeat(n),
            member.glsl_type,
            name,
        );
        field.truncate(31);
        return Ok(format!("{}{}", field, data));
    }

    let padding = &"          "[name.len().min(10)..];
    let field = format!(
        "    {:<11}{};{}//   ",
        member.glsl_type, name, padding,
    );

    if let Some(layout) = member.explicit_layout_str() {
        Ok(format!("    layout({})\n{}{}", layout, field, data))
    } else {
        Ok(format!("{}{}", field, data))
    }
}

/// Renders the GLSL declaration of a registered structure.
pub fn struct_declaration(
    registry: &StructRegistry,
    name: &str,
) -> Result<String, LayoutError> {
    let mut decl = format!("struct {} {{\n", name);

    for field in registry.fields_of(name)? {
        // The longest type name is `dmatCxR[##]`, 11 characters.
        let _ = writeln!(decl, "    {:<11} {};", field.ty, field.name);
    }

    decl.push_str("};\n");
    Ok(decl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packing::Std140;
    use crate::registry::StructField;
    use crate::walk::block_members;

    #[test]
    fn type_data_columns() {
        let registry = StructRegistry::new();
        let data =
            format_type_data(&registry, &Std140, "vec3", 4, false).unwrap();

        let columns: Vec<&str> = data.split_whitespace().collect();
        assert_eq!(columns, ["16", "4", "16", "12", "-", "-", "-"]);
    }

    #[test]
    fn matrix_columns_include_stride_and_orientation() {
        let registry = StructRegistry::new();
        let data =
            format_type_data(&registry, &Std140, "mat3x2", 0, true).unwrap();

        let columns: Vec<&str> = data.split_whitespace().collect();
        // Row-major mat3x2: 2 rows of vec3, stride 16, size 32.
        assert_eq!(columns, ["16", "0", "0", "32", "yes", "-", "16"]);
    }

    #[test]
    fn array_of_matrices_columns_include_both_strides() {
        let registry = StructRegistry::new();
        let data =
            format_type_data(&registry, &Std140, "mat2[3]", 0, false).unwrap();

        let columns: Vec<&str> = data.split_whitespace().collect();
        assert_eq!(columns, ["16", "0", "0", "96", "no", "32", "16"]);
    }

    #[test]
    fn top_level_member_line() {
        let registry = StructRegistry::new();
        let fields = vec![StructField::new("float", "f1")];
        let members =
            block_members(&registry, &fields, &[None], "UB1", "", &Std140, false).unwrap();

        let line = format_member(&registry, &members[0], &Std140).unwrap();
        assert!(line.starts_with("    float      f1;"));
        assert!(line.contains("//"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn explicit_layout_prefixes_the_declaration() {
        use crate::generate::MatrixLayout;

        let registry = StructRegistry::new();
        let fields = vec![StructField::new("mat4", "m1")];
        let members = block_members(
            &registry,
            &fields,
            &[Some(MatrixLayout::RowMajor)],
            "UB1",
            "",
            &Std140,
            false,
        )
        .unwrap();

        let line = format_member(&registry, &members[0], &Std140).unwrap();
        assert!(line.starts_with("    layout(row_major)\n"));
    }

    #[test]
    fn shadow_layout_is_suppressed() {
        use crate::generate::MatrixLayout;

        let registry = StructRegistry::new();
        let fields = vec![StructField::new("mat4", "m1")];
        let members = block_members(
            &registry,
            &fields,
            &[Some(MatrixLayout::ShadowColumnMajor)],
            "UB1",
            "",
            &Std140,
            false,
        )
        .unwrap();

        let line = format_member(&registry, &members[0], &Std140).unwrap();
        assert!(!line.contains("layout("));
    }

    #[test]
    fn nested_members_become_comment_lines() {
        let mut registry = StructRegistry::new();
        registry.define("S1", vec![StructField::new("float", "f1")]);

        let fields = vec![StructField::new("S1[2]", "s1")];
        let members =
            block_members(&registry, &fields, &[None], "UB1", "", &Std140, false).unwrap();

        // Element announcement renders as an index marker.
        let marker = format_member(&registry, &members[1], &Std140).unwrap();
        assert_eq!(marker, "//    [0]");

        // The element's field renders as an indented comment.
        let nested = format_member(&registry, &members[2], &Std140).unwrap();
        assert!(nested.starts_with("//    float"));
    }

    #[test]
    fn struct_declaration_text() {
        let mut registry = StructRegistry::new();
        registry.define(
            "S1",
            vec![
                StructField::new("float", "f1"),
                StructField::new("dmat2x3[7]", "dm1"),
            ],
        );

        let decl = struct_declaration(&registry, "S1").unwrap();
        assert_eq!(
            decl,
            "struct S1 {\n    float       f1;\n    dmat2x3[7]  dm1;\n};\n",
        );
    }
}
