// Copyright (c) 2026 The ubo-layout contributors
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The packing rules that assign alignments, strides and sizes.
//!
//! The rule numbers cited below are the layout rules of the
//! `GL_ARB_uniform_buffer_object` specification (the "std140" rules). The
//! `shared` packing mode computes the identical layout; it differs only in
//! that the API is allowed to report different offsets, so generated tests
//! must query offsets instead of assuming them.
//!
//! All queries are pure functions of the registry contents. Every result is
//! in whole bytes.

use crate::{glsl, registry::StructRegistry, LayoutError};

/// Rounds `offset` up to the next multiple of `alignment`.
///
/// This is the single primitive every other rule composes through.
pub fn align(offset: u32, alignment: u32) -> u32 {
    ((offset + alignment - 1) / alignment) * alignment
}

/// One set of packing rules for uniform block members.
pub trait PackingRules {
    /// The string used in a `layout(...)` qualifier to select these rules.
    fn layout_string(&self) -> &'static str;

    /// Whether members have fixed, implementation-independent offsets
    /// (std140) or offsets that may vary among implementations (shared).
    fn fixed_offsets(&self) -> bool;

    /// The base alignment, in bytes, of the named type.
    fn base_alignment(
        &self,
        registry: &StructRegistry,
        type_name: &str,
        row_major: bool,
    ) -> Result<u32, LayoutError>;

    /// The stride, in bytes, from one indexable vector of a matrix (column
    /// or row, depending on orientation) to the next.
    fn matrix_stride(
        &self,
        registry: &StructRegistry,
        type_name: &str,
        row_major: bool,
    ) -> Result<u32, LayoutError>;

    /// The stride, in bytes, from one array element to the next.
    fn array_stride(
        &self,
        registry: &StructRegistry,
        type_name: &str,
        row_major: bool,
    ) -> Result<u32, LayoutError>;

    /// The padded size, in bytes, of the named type.
    fn size(
        &self,
        registry: &StructRegistry,
        type_name: &str,
        row_major: bool,
    ) -> Result<u32, LayoutError> {
        if glsl::is_array(type_name) {
            let stride = self.array_stride(registry, type_name, row_major)?;
            return Ok(stride * glsl::array_elements(type_name)?);
        }

        if glsl::is_scalar(type_name) {
            return glsl::basic_machine_units(type_name);
        }

        if glsl::is_vector(type_name) {
            let components = glsl::vector_size(type_name)?;
            let units = glsl::basic_machine_units(glsl::component_type(type_name)?)?;
            return Ok(components * units);
        }

        if glsl::is_matrix(type_name) {
            let (columns, rows) = glsl::matrix_dimensions(type_name)?;
            let stride = self.matrix_stride(registry, type_name, row_major)?;
            let vectors = if row_major { rows } else { columns };
            return Ok(vectors * stride);
        }

        // Rule 9: a structure is the sum of its aligned fields, padded to
        // the structure's own base alignment.
        let mut s = 0;
        for field in registry.fields_of(type_name)? {
            let a = self.base_alignment(registry, &field.ty, row_major)?;
            s = align(s, a) + self.size(registry, &field.ty, row_major)?;
        }

        Ok(align(s, self.base_alignment(registry, type_name, row_major)?))
    }
}

/// The std140 packing rules: fixed, cross-implementation offsets.
#[derive(Clone, Copy, Debug, Default)]
pub struct Std140;

impl PackingRules for Std140 {
    fn layout_string(&self) -> &'static str {
        "std140"
    }

    fn fixed_offsets(&self) -> bool {
        true
    }

    fn base_alignment(
        &self,
        registry: &StructRegistry,
        type_name: &str,
        row_major: bool,
    ) -> Result<u32, LayoutError> {
        // Rule 4: arrays align like a single element, rounded up to the
        // base alignment of a vec4.
        if glsl::is_array(type_name) {
            let base = glsl::array_base_type(type_name)?;
            return Ok(u32::max(
                16,
                self.base_alignment(registry, base, row_major)?,
            ));
        }

        // Rule 1: a scalar of N basic machine units aligns to N.
        if glsl::is_scalar(type_name) {
            return glsl::basic_machine_units(type_name);
        }

        // Rules 2 and 3: two- and four-component vectors align to 2N and
        // 4N; three-component vectors align to 4N.
        if glsl::is_vector(type_name) {
            let components = glsl::vector_size(type_name)?;
            let units = glsl::basic_machine_units(glsl::component_type(type_name)?)?;

            return match components {
                2 | 4 => Ok(components * units),
                3 => Ok(4 * units),
                _ => Err(LayoutError::InvalidVectorSize {
                    type_name: type_name.to_owned(),
                    components,
                }),
            };
        }

        // Rules 5 and 7: a matrix aligns like the array of vectors it is
        // stored as.
        if glsl::is_matrix(type_name) {
            return self.matrix_stride(registry, type_name, row_major);
        }

        // Rule 9: a structure aligns to its most-aligned member, rounded up
        // to the base alignment of a vec4.
        let mut a = 16;
        for field in registry.fields_of(type_name)? {
            a = u32::max(a, self.base_alignment(registry, &field.ty, row_major)?);
        }

        Ok(a)
    }

    fn matrix_stride(
        &self,
        registry: &StructRegistry,
        type_name: &str,
        row_major: bool,
    ) -> Result<u32, LayoutError> {
        let (columns, rows) = glsl::matrix_dimensions(type_name)?;

        // Rule 5: a column-major CxR matrix is stored as an array of C
        // column vectors with R components. Rule 7: row-major, as an array
        // of R row vectors with C components. Either way the stride is the
        // vector's base alignment per rule 4.
        let components = if row_major { columns } else { rows };
        let vector = if glsl::is_double_based(type_name) {
            format!("dvec{}", components)
        } else {
            format!("vec{}", components)
        };

        Ok(u32::max(16, self.base_alignment(registry, &vector, false)?))
    }

    fn array_stride(
        &self,
        registry: &StructRegistry,
        type_name: &str,
        row_major: bool,
    ) -> Result<u32, LayoutError> {
        let base = glsl::array_base_type(type_name)?;

        if !glsl::is_structure(base) {
            // Rule 4: stride of an array of scalars or vectors (and, via
            // rule 6, matrices) is the element's base alignment or size,
            // whichever is larger, rounded up to a vec4's alignment.
            Ok(u32::max(
                16,
                u32::max(
                    self.base_alignment(registry, base, row_major)?,
                    self.size(registry, base, row_major)?,
                ),
            ))
        } else {
            // Rule 10: elements of an array of structures are laid out in
            // order per rule 9, so the stride is the element size padded to
            // the element alignment.
            Ok(align(
                self.size(registry, base, row_major)?,
                self.base_alignment(registry, base, row_major)?,
            ))
        }
    }
}

/// The shared packing rules: same layout algorithm as std140, but offsets
/// are implementation-defined and must be queried rather than assumed.
#[derive(Clone, Copy, Debug, Default)]
pub struct Shared;

impl PackingRules for Shared {
    fn layout_string(&self) -> &'static str {
        "shared"
    }

    fn fixed_offsets(&self) -> bool {
        false
    }

    fn base_alignment(
        &self,
        registry: &StructRegistry,
        type_name: &str,
        row_major: bool,
    ) -> Result<u32, LayoutError> {
        Std140.base_alignment(registry, type_name, row_major)
    }

    fn matrix_stride(
        &self,
        registry: &StructRegistry,
        type_name: &str,
        row_major: bool,
    ) -> Result<u32, LayoutError> {
        Std140.matrix_stride(registry, type_name, row_major)
    }

    fn array_stride(
        &self,
        registry: &StructRegistry,
        type_name: &str,
        row_major: bool,
    ) -> Result<u32, LayoutError> {
        Std140.array_stride(registry, type_name, row_major)
    }
}
