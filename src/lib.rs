// Copyright (c) 2026 The ubo-layout contributors
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Computation of uniform-block memory layouts, and of test data that is
//! self-consistent with those layouts.
//!
//! When a GLSL uniform block is compiled, every member of the block is
//! assigned a byte offset relative to the start of the block's backing
//! buffer, and arrays and matrices are additionally assigned strides. Under
//! the `std140` packing rules these offsets are fixed and portable across
//! implementations; under the `shared` rules they are implementation-defined,
//! but drivers overwhelmingly reuse the `std140` algorithm. This crate
//! reimplements that algorithm for arbitrary nesting of scalars, vectors,
//! matrices, arrays and structures, including arrays of structures, arrays
//! of arrays, and row-major/column-major matrix orientation overrides.
//!
//! On top of the layout computation, the crate can synthesize random block
//! contents from an abstract recipe ("an array of structures containing a
//! matrix"), and derive deterministic per-member test data: the value to
//! write through the API, the boolean expression that detects a mismatch
//! when reading the value back in a shader, and the introspection tuple
//! (offset, strides, orientation) the API is expected to report. The data is
//! seeded from each member's name and offset, so a layout and its
//! verification data can never drift apart.
//!
//! What this crate deliberately does *not* do: compile shaders, talk to a
//! GPU, or emit complete shader source. It produces the structural and
//! numeric raw material; templating it into test files is the caller's job.
//!
//! # Examples
//!
//! ```
//! use ubo_layout::packing::{PackingRules, Std140};
//! use ubo_layout::registry::{StructField, StructRegistry};
//!
//! let mut registry = StructRegistry::new();
//! registry.define(
//!     "S1",
//!     vec![
//!         StructField::new("float", "f1"),
//!         StructField::new("vec3", "v1"),
//!     ],
//! );
//!
//! let packing = Std140;
//! assert_eq!(packing.base_alignment(&registry, "S1", false).unwrap(), 16);
//! assert_eq!(packing.size(&registry, "S1", false).unwrap(), 32);
//! ```

pub mod data;
pub mod generate;
pub mod glsl;
pub mod packing;
pub mod registry;
pub mod report;
pub mod walk;

pub use crate::{
    generate::{MatrixLayout, RecipeStep, UniqueNames},
    packing::{align, PackingRules, Shared, Std140},
    registry::{StructField, StructRegistry},
    walk::{BlockMember, UniformBlock},
};

use std::{error, fmt};

/// Error that can happen while classifying types, computing a layout, or
/// expanding a recipe.
///
/// Every variant aborts the generation attempt it occurred in; a partially
/// computed layout is useless because each offset depends on the previous
/// ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// A type name is neither a built-in GLSL type nor a registered
    /// structure.
    UnknownType(String),

    /// A structure directly or indirectly contains itself.
    TypeRecursion(String),

    /// A recipe step named a type outside the known vocabulary.
    InvalidRecipeToken(String),

    /// A type name did not parse as any recognized shape. This indicates a
    /// defect in the caller's recipe or in structure synthesis.
    MalformedTypeName(String),

    /// A vector type declared a component count other than 2, 3 or 4.
    InvalidVectorSize {
        /// The offending type name.
        type_name: String,
        /// The component count that was found.
        components: u32,
    },

    /// A layout qualifier cannot be re-expressed under an inverted default
    /// matrix orientation.
    InvalidLayoutQualifier(String),

    /// The candidate built-in type list given to the generator was empty.
    EmptyTypeList,
}

impl error::Error for LayoutError {}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::UnknownType(name) => {
                write!(f, "unknown type `{}`", name)
            }
            LayoutError::TypeRecursion(name) => {
                write!(f, "type recursion involving `{}`", name)
            }
            LayoutError::InvalidRecipeToken(token) => {
                write!(f, "invalid recipe token `{}`", token)
            }
            LayoutError::MalformedTypeName(name) => {
                write!(f, "malformed type name `{}`", name)
            }
            LayoutError::InvalidVectorSize {
                type_name,
                components,
            } => {
                write!(
                    f,
                    "invalid vector size {} for type `{}`",
                    components, type_name,
                )
            }
            LayoutError::InvalidLayoutQualifier(layout) => {
                write!(f, "layout qualifier `{}` cannot be inverted", layout)
            }
            LayoutError::EmptyTypeList => {
                write!(f, "empty candidate built-in type list")
            }
        }
    }
}
