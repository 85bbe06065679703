// Copyright (c) 2026 The ubo-layout contributors
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Flattening a block's field tree into offset-annotated members.
//!
//! The walk visits fields in declaration order, carrying a single running
//! offset cursor. Structures and arrays of structures produce one record
//! announcing the container, then one record per array element, then the
//! element's own fields recursively; leaves produce one record each. A
//! member's recorded offset is the *unaligned* running offset; consumers
//! round it up by the member's base alignment when they need the placed
//! offset, mirroring how the packing rules compose.

use crate::{
    generate::{invert_default, MatrixLayout},
    glsl,
    packing::{align, PackingRules},
    registry::{StructField, StructRegistry},
    LayoutError,
};

/// One flattened member of a uniform block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockMember {
    /// Accessor path as the shader sees it (through the instance name, if
    /// any).
    pub glsl_name: String,
    /// Accessor path as the API sees it (through the block name).
    pub api_name: String,
    /// The member's GLSL type name.
    pub glsl_type: String,
    /// The layout qualifier declared on the member, if any (shadow markers
    /// included; they are suppressed when emitting text).
    pub explicit_layout: Option<MatrixLayout>,
    /// Unaligned running offset at which this member is placed.
    pub offset: u32,
    /// Effective orientation of the member.
    pub row_major: bool,
    /// API introspection enumerant, or `None` for structures and arrays of
    /// structures.
    pub api_type: Option<&'static str>,
    /// Element count the API reports: array length for arrays, 1 otherwise.
    pub element_count: u32,
}

impl BlockMember {
    fn new(
        glsl_name: String,
        api_name: String,
        glsl_type: &str,
        explicit_layout: Option<MatrixLayout>,
        offset: u32,
        row_major: bool,
    ) -> Result<Self, LayoutError> {
        let (api_type, element_count) = if glsl::is_array(glsl_type) {
            let base = glsl::array_base_type(glsl_type)?;
            let api_type = if glsl::is_structure(base) {
                None
            } else {
                glsl::api_enum(base)
            };
            (api_type, glsl::array_elements(glsl_type)?)
        } else if glsl::is_structure(glsl_type) {
            (None, 1)
        } else {
            (glsl::api_enum(glsl_type), 1)
        };

        Ok(BlockMember {
            glsl_name,
            api_name,
            glsl_type: glsl_type.to_owned(),
            explicit_layout,
            offset,
            row_major,
            api_type,
            element_count,
        })
    }

    /// How many structure levels deep this member sits inside the block.
    ///
    /// When the block has an instance name the shader path starts with it
    /// while the API path starts with the block name; that first component
    /// is not structure nesting.
    pub fn struct_nesting(&self) -> usize {
        let dots = self.glsl_name.matches('.').count();

        if dots == 0 {
            0
        } else if self.glsl_name != self.api_name {
            dots - 1
        } else {
            dots
        }
    }

    /// The qualifier to print before the member declaration, if any.
    pub fn explicit_layout_str(&self) -> Option<&'static str> {
        self.explicit_layout.and_then(MatrixLayout::qualifier)
    }
}

/// A uniform block description: the inputs one layout walk needs, plus the
/// declared qualifiers the caller will template into shader text.
#[derive(Clone, Debug)]
pub struct UniformBlock {
    pub block_name: String,
    /// Empty when the block has no instance name.
    pub instance_name: String,
    /// A `layout(...) uniform;` default declared before the block.
    pub global_layout: Option<String>,
    /// A `layout(...)` qualifier declared on the block itself.
    pub block_layout: Option<String>,
    pub fields: Vec<StructField>,
    pub field_layouts: Vec<Option<MatrixLayout>>,
}

impl UniformBlock {
    /// The effective default matrix orientation for this block's members.
    pub fn row_major_default(&self) -> bool {
        block_row_major_default(self.global_layout.as_deref(), self.block_layout.as_deref())
    }

    /// Flattens this block against the given packing rules.
    pub fn members(
        &self,
        registry: &StructRegistry,
        packing: &dyn PackingRules,
    ) -> Result<Vec<BlockMember>, LayoutError> {
        block_members(
            registry,
            &self.fields,
            &self.field_layouts,
            &self.block_name,
            &self.instance_name,
            packing,
            self.row_major_default(),
        )
    }
}

/// Resolves the default matrix orientation from the global and per-block
/// layout qualifiers. A block qualifier overrides a global one.
pub fn block_row_major_default(
    global_layout: Option<&str>,
    block_layout: Option<&str>,
) -> bool {
    let mut row_major = global_layout.is_some_and(|l| l.contains("row_major"));

    if let Some(block) = block_layout {
        if block.contains("row_major") {
            row_major = true;
        } else if block.contains("column_major") {
            row_major = false;
        }
    }

    row_major
}

/// Builds the block list for one generated test: the plain block and, when
/// instance names are supported, two sibling blocks that must produce the
/// identical layout through inverted default orientations.
///
/// The second block declares `row_major` on the block itself and the third
/// declares it as the global default; both carry per-field qualifiers
/// re-expressed by [`invert_default`], so all three blocks lay out every
/// member at the same offset.
pub fn sibling_blocks(
    packing: &dyn PackingRules,
    fields: &[StructField],
    field_layouts: &[Option<MatrixLayout>],
    instance_names_supported: bool,
) -> Result<Vec<UniformBlock>, LayoutError> {
    let mut blocks = vec![UniformBlock {
        block_name: "UB1".to_owned(),
        instance_name: String::new(),
        global_layout: None,
        block_layout: Some(packing.layout_string().to_owned()),
        fields: fields.to_vec(),
        field_layouts: field_layouts.to_vec(),
    }];

    if instance_names_supported {
        let inverted = field_layouts
            .iter()
            .map(|&l| invert_default(l))
            .collect::<Result<Vec<_>, _>>()?;

        blocks.push(UniformBlock {
            block_name: "UB2".to_owned(),
            instance_name: "ub2".to_owned(),
            global_layout: None,
            block_layout: Some(format!("{}, row_major", packing.layout_string())),
            fields: fields.to_vec(),
            field_layouts: inverted.clone(),
        });

        blocks.push(UniformBlock {
            block_name: "UB3".to_owned(),
            instance_name: "ub3".to_owned(),
            global_layout: Some(format!("{}, row_major", packing.layout_string())),
            block_layout: None,
            fields: fields.to_vec(),
            field_layouts: inverted,
        });
    }

    Ok(blocks)
}

/// Flattens a block's fields into offset-annotated members, in strict
/// declaration order.
pub fn block_members(
    registry: &StructRegistry,
    fields: &[StructField],
    field_layouts: &[Option<MatrixLayout>],
    block_name: &str,
    instance_name: &str,
    packing: &dyn PackingRules,
    default_row_major: bool,
) -> Result<Vec<BlockMember>, LayoutError> {
    let mut members = Vec::new();
    let mut offset = 0;

    for (field, &layout) in fields.iter().zip(field_layouts) {
        let glsl_name = if instance_name.is_empty() {
            field.name.clone()
        } else {
            format!("{}.{}", instance_name, field.name)
        };
        let api_name = if instance_name.is_empty() {
            field.name.clone()
        } else {
            format!("{}.{}", block_name, field.name)
        };

        // Explicit row/column at the declaration level wins; shadow markers
        // and unqualified fields inherit the block default.
        let field_row_major = layout
            .and_then(MatrixLayout::explicit_row_major)
            .unwrap_or(default_row_major);

        let ty = field.ty.as_str();

        if glsl::is_array(ty) {
            let base = glsl::array_base_type(ty)?;

            if glsl::is_structure(base) {
                members.push(BlockMember::new(
                    glsl_name.clone(),
                    api_name.clone(),
                    ty,
                    layout,
                    offset,
                    field_row_major,
                )?);

                push_struct_array_elements(
                    registry,
                    ty,
                    &api_name,
                    &glsl_name,
                    layout,
                    packing,
                    offset,
                    field_row_major,
                    &mut members,
                )?;
            } else if glsl::is_matrix(base) {
                members.push(BlockMember::new(
                    glsl_name,
                    api_name,
                    ty,
                    layout,
                    offset,
                    field_row_major,
                )?);
            } else {
                members.push(BlockMember::new(glsl_name, api_name, ty, None, offset, false)?);
            }
        } else if glsl::is_structure(ty) {
            members.push(BlockMember::new(
                glsl_name.clone(),
                api_name.clone(),
                ty,
                layout,
                offset,
                field_row_major,
            )?);

            let a = packing.base_alignment(registry, ty, field_row_major)?;
            push_struct_fields(
                registry,
                ty,
                &api_name,
                &glsl_name,
                packing,
                align(offset, a),
                field_row_major,
                &mut members,
            )?;
        } else if glsl::is_matrix(ty) {
            members.push(BlockMember::new(
                glsl_name,
                api_name,
                ty,
                layout,
                offset,
                field_row_major,
            )?);
        } else if glsl::is_vector(ty) || glsl::is_scalar(ty) {
            members.push(BlockMember::new(glsl_name, api_name, ty, None, offset, false)?);
        } else {
            return Err(LayoutError::MalformedTypeName(ty.to_owned()));
        }

        let a = packing.base_alignment(registry, ty, field_row_major)?;
        offset = align(offset, a) + packing.size(registry, ty, field_row_major)?;
    }

    Ok(members)
}

/// Emits one record per element of an array of structures, then recurses
/// into each element's fields.
///
/// Every alignment and size query here uses the element's resolved
/// orientation; each element's offset is recomputed from the array stride,
/// independent of the caller's cursor.
#[allow(clippy::too_many_arguments)]
fn push_struct_array_elements(
    registry: &StructRegistry,
    array_type: &str,
    api_name: &str,
    glsl_name: &str,
    explicit_layout: Option<MatrixLayout>,
    packing: &dyn PackingRules,
    offset: u32,
    row_major: bool,
    members: &mut Vec<BlockMember>,
) -> Result<(), LayoutError> {
    let base = glsl::array_base_type(array_type)?;
    let stride = packing.array_stride(registry, array_type, row_major)?;
    let element_align = packing.base_alignment(registry, array_type, row_major)?;

    for i in 0..glsl::array_elements(array_type)? {
        let api_indexed = format!("{}[{}]", api_name, i);
        let glsl_indexed = format!("{}[{}]", glsl_name, i);

        let element_offset = align(offset, element_align) + stride * i;

        members.push(BlockMember::new(
            glsl_indexed.clone(),
            api_indexed.clone(),
            base,
            explicit_layout,
            element_offset,
            row_major,
        )?);

        push_struct_fields(
            registry,
            base,
            &api_indexed,
            &glsl_indexed,
            packing,
            element_offset,
            row_major,
            members,
        )?;
    }

    Ok(())
}

/// Recursively emits the members of one structure instance starting at
/// `offset`.
///
/// The orientation passed in is inherited by everything below; per-field
/// overrides only exist at the level a field was declared in the block, so
/// structure internals never re-derive their own.
#[allow(clippy::too_many_arguments)]
fn push_struct_fields(
    registry: &StructRegistry,
    struct_type: &str,
    api_base: &str,
    glsl_base: &str,
    packing: &dyn PackingRules,
    mut offset: u32,
    row_major: bool,
    members: &mut Vec<BlockMember>,
) -> Result<(), LayoutError> {
    for field in registry.fields_of(struct_type)? {
        let glsl_name = format!("{}.{}", glsl_base, field.name);
        let api_name = format!("{}.{}", api_base, field.name);
        let ty = field.ty.as_str();

        if glsl::is_array(ty) {
            let base = glsl::array_base_type(ty)?;

            if glsl::is_structure(base) {
                members.push(BlockMember::new(
                    glsl_name.clone(),
                    api_name.clone(),
                    ty,
                    None,
                    offset,
                    row_major,
                )?);

                push_struct_array_elements(
                    registry, ty, &api_name, &glsl_name, None, packing, offset, row_major,
                    members,
                )?;
            } else if glsl::is_matrix(base) {
                members.push(BlockMember::new(
                    glsl_name,
                    api_name,
                    ty,
                    None,
                    offset,
                    row_major,
                )?);
            } else {
                members.push(BlockMember::new(glsl_name, api_name, ty, None, offset, false)?);
            }
        } else if glsl::is_structure(ty) {
            members.push(BlockMember::new(
                glsl_name.clone(),
                api_name.clone(),
                ty,
                None,
                offset,
                row_major,
            )?);

            let a = packing.base_alignment(registry, ty, row_major)?;
            push_struct_fields(
                registry,
                ty,
                &api_name,
                &glsl_name,
                packing,
                align(offset, a),
                row_major,
                members,
            )?;
        } else if glsl::is_matrix(ty) {
            members.push(BlockMember::new(
                glsl_name,
                api_name,
                ty,
                None,
                offset,
                row_major,
            )?);
        } else {
            members.push(BlockMember::new(glsl_name, api_name, ty, None, offset, false)?);
        }

        let a = packing.base_alignment(registry, ty, row_major)?;
        offset = align(offset, a) + packing.size(registry, ty, row_major)?;
    }

    Ok(())
}
