// Copyright (c) 2026 The ubo-layout contributors
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Random synthesis of block contents from abstract recipes.
//!
//! A recipe describes the interesting nesting a generated block must
//! contain, without naming concrete types: `[Array, Struct, Type("mat3")]`
//! demands an array of structures where each structure (among random filler
//! fields) contains a `mat3`. Expansion draws every random choice from a
//! caller-supplied [`Rng`], so a seeded generator reproduces the same block
//! exactly.

use crate::{
    glsl,
    registry::{StructField, StructRegistry},
    LayoutError,
};
use foldhash::HashMap;
use rand::{seq::SliceRandom, Rng};

/// A matrix-orientation layout qualifier attached to a block member.
///
/// The shadow forms are not emitted into shader text; they record an
/// orientation choice that coincides with the current default, so that the
/// same block can be re-emitted under the inverted default with the
/// qualifier made explicit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixLayout {
    RowMajor,
    ColumnMajor,
    /// Row-major inherited from the default rather than declared.
    ShadowRowMajor,
    /// Column-major inherited from the default rather than declared.
    ShadowColumnMajor,
}

impl MatrixLayout {
    /// The qualifier text to declare on the member, or `None` for the
    /// shadow forms.
    pub fn qualifier(self) -> Option<&'static str> {
        match self {
            MatrixLayout::RowMajor => Some("row_major"),
            MatrixLayout::ColumnMajor => Some("column_major"),
            MatrixLayout::ShadowRowMajor | MatrixLayout::ShadowColumnMajor => None,
        }
    }

    /// The explicit orientation this qualifier forces, or `None` if the
    /// member inherits the block default.
    pub fn explicit_row_major(self) -> Option<bool> {
        match self {
            MatrixLayout::RowMajor => Some(true),
            MatrixLayout::ColumnMajor => Some(false),
            MatrixLayout::ShadowRowMajor | MatrixLayout::ShadowColumnMajor => None,
        }
    }

    fn marker(self) -> &'static str {
        match self {
            MatrixLayout::RowMajor => "row_major",
            MatrixLayout::ColumnMajor => "column_major",
            MatrixLayout::ShadowRowMajor => "#row_major",
            MatrixLayout::ShadowColumnMajor => "#column_major",
        }
    }
}

/// Re-expresses a layout choice assuming the opposite default matrix
/// orientation (row-major instead of column-major), such that the effective
/// layout of the member is unchanged.
pub fn invert_default(
    layout: Option<MatrixLayout>,
) -> Result<Option<MatrixLayout>, LayoutError> {
    match layout {
        None => Ok(None),
        Some(MatrixLayout::RowMajor) => Ok(Some(MatrixLayout::ShadowRowMajor)),
        Some(MatrixLayout::ColumnMajor) | Some(MatrixLayout::ShadowColumnMajor) => {
            Ok(Some(MatrixLayout::ColumnMajor))
        }
        Some(l @ MatrixLayout::ShadowRowMajor) => {
            Err(LayoutError::InvalidLayoutQualifier(l.marker().to_owned()))
        }
    }
}

/// Allocator of field names that are unique within one generation run.
///
/// Each canonical type gets a short deterministic prefix (`fv` for float
/// vectors, `m32_` for `mat3x2`, `s4_` for `S4`, the initial letter for
/// scalars) and an incrementing counter.
#[derive(Clone, Debug, Default)]
pub struct UniqueNames {
    names: HashMap<String, (String, u32)>,
}

impl UniqueNames {
    pub fn new() -> Self {
        UniqueNames {
            names: HashMap::default(),
        }
    }

    /// Collapses a type name to the key its counter is tracked under:
    /// arrays count as their element type, square matrices as their
    /// canonical `CxR` spelling, vectors without their component count.
    fn trim_name(type_name: &str) -> Result<String, LayoutError> {
        let t = if glsl::is_array(type_name) {
            glsl::array_base_type(type_name)?
        } else {
            type_name
        };

        if glsl::is_matrix(t) {
            let (columns, rows) = glsl::matrix_dimensions(t)?;
            let name = format!("mat{}x{}", columns, rows);

            Ok(if glsl::is_double_based(t) {
                format!("d{}", name)
            } else {
                name
            })
        } else if glsl::is_scalar(t) {
            Ok(t.to_owned())
        } else if glsl::is_vector(t) {
            Ok(t.trim_end_matches(['1', '2', '3', '4']).to_owned())
        } else {
            // Assume it must be a structure.
            Ok(t.to_owned())
        }
    }

    fn base_for(type_name: &str) -> Result<String, LayoutError> {
        let t = if glsl::is_array(type_name) {
            glsl::array_base_type(type_name)?
        } else {
            type_name
        };

        if glsl::is_vector(t) {
            let component = glsl::component_type(t)?;
            let initial = component
                .chars()
                .next()
                .ok_or_else(|| LayoutError::MalformedTypeName(t.to_owned()))?;
            Ok(format!("{}v", initial))
        } else if glsl::is_matrix(t) {
            let (columns, rows) = glsl::matrix_dimensions(t)?;

            Ok(if glsl::is_double_based(t) {
                format!("dm{}{}_", columns, rows)
            } else {
                format!("m{}{}_", columns, rows)
            })
        } else if glsl::is_scalar(t) {
            Ok(t[..1].to_owned())
        } else if let Some(rest) = t.strip_prefix('S') {
            Ok(format!("s{}_", rest))
        } else {
            Err(LayoutError::MalformedTypeName(t.to_owned()))
        }
    }

    /// Returns the next unique field name for a field of the given type.
    pub fn next(&mut self, type_name: &str) -> Result<String, LayoutError> {
        let key = Self::trim_name(type_name)?;

        if !self.names.contains_key(&key) {
            let base = Self::base_for(type_name)?;
            self.names.insert(key.clone(), (base, 1));
        }

        let (base, count) = self
            .names
            .get_mut(&key)
            .ok_or_else(|| LayoutError::MalformedTypeName(type_name.to_owned()))?;

        let name = format!("{}{}", base, *count);
        *count += 1;
        Ok(name)
    }
}

/// One step of a generation recipe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecipeStep {
    /// Wrap the rest of the recipe in an array.
    Array,
    /// Wrap the rest of the recipe in a freshly synthesized structure,
    /// alongside random filler fields.
    Struct,
    /// A specific built-in type.
    Type(String),
    /// A matrix-orientation requirement recorded against the produced
    /// field; does not consume a nesting level.
    Layout(MatrixLayout),
}

impl RecipeStep {
    pub fn ty(name: impl Into<String>) -> Self {
        RecipeStep::Type(name.into())
    }
}

fn select_basic_type<R: Rng + ?Sized>(
    types: &[&str],
    names: &mut UniqueNames,
    rng: &mut R,
) -> Result<StructField, LayoutError> {
    let ty = *types.choose(rng).ok_or(LayoutError::EmptyTypeList)?;
    let name = names.next(ty)?;
    Ok(StructField::new(ty, name))
}

fn filler_fields<R: Rng + ?Sized>(
    types: &[&str],
    names: &mut UniqueNames,
    rng: &mut R,
) -> Result<Vec<StructField>, LayoutError> {
    let count = rng.gen_range(1..=12);
    (0..count)
        .map(|_| select_basic_type(types, names, rng))
        .collect()
}

/// Expands a recipe into one concrete field, registering any synthesized
/// structures.
pub fn generate_member<R: Rng + ?Sized>(
    recipe: &[RecipeStep],
    builtin_types: &[&str],
    registry: &mut StructRegistry,
    names: &mut UniqueNames,
    rng: &mut R,
) -> Result<StructField, LayoutError> {
    let Some(step) = recipe.first() else {
        return select_basic_type(builtin_types, names, rng);
    };

    match step {
        RecipeStep::Array => {
            let element = generate_member(&recipe[1..], builtin_types, registry, names, rng)?;

            // Arrays of "big" things get fewer elements to bound the total
            // block size.
            let candidates: &[u32] = if glsl::is_matrix(&element.ty)
                || glsl::is_array(&element.ty)
                || glsl::is_structure(&element.ty)
            {
                &[2, 3, 5, 7]
            } else {
                &[3, 5, 7, 11, 13]
            };
            let count = *candidates.choose(rng).ok_or(LayoutError::EmptyTypeList)?;

            Ok(StructField::new(
                format!("{}[{}]", element.ty, count),
                element.name,
            ))
        }
        RecipeStep::Struct => {
            let mut fields = filler_fields(builtin_types, names, rng)?;
            fields.shuffle(rng);

            // Peek ahead. If the next step is a specific type, all of the
            // remaining steps must be specific types; each becomes its own
            // required field.
            let required = if matches!(recipe.get(1), Some(RecipeStep::Type(_))) {
                recipe[1..]
                    .iter()
                    .map(|step| {
                        generate_member(
                            std::slice::from_ref(step),
                            builtin_types,
                            registry,
                            names,
                            rng,
                        )
                    })
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                vec![generate_member(
                    &recipe[1..],
                    builtin_types,
                    registry,
                    names,
                    rng,
                )?]
            };

            // Splice the required fields at a random spot among the filler.
            let at = rng.gen_range(0..=fields.len());
            fields.splice(at..at, required);

            let struct_name = registry.fresh_name();
            registry.define(struct_name.clone(), fields);

            let field_name = names.next(&struct_name)?;
            Ok(StructField::new(struct_name, field_name))
        }
        RecipeStep::Type(name) => {
            if !glsl::is_known_builtin(name) {
                return Err(LayoutError::InvalidRecipeToken(name.clone()));
            }

            let field_name = names.next(name)?;
            Ok(StructField::new(name.clone(), field_name))
        }
        RecipeStep::Layout(_) => {
            // Orientation requirements are recorded by the caller; they do
            // not consume a nesting level here.
            generate_member(&recipe[1..], builtin_types, registry, names, rng)
        }
    }
}

/// Expands a list of recipes into the top-level field list of a uniform
/// block, mixed and shuffled with random filler fields.
///
/// Returns the fields and, aligned with them, the layout requirement each
/// recipe carried (if any).
#[allow(clippy::type_complexity)]
pub fn generate_block_fields<R: Rng + ?Sized>(
    recipes: &[Vec<RecipeStep>],
    builtin_types: &[&str],
    registry: &mut StructRegistry,
    rng: &mut R,
) -> Result<(Vec<StructField>, Vec<Option<MatrixLayout>>), LayoutError> {
    let mut names = UniqueNames::new();
    let mut required: HashMap<String, MatrixLayout> = HashMap::default();
    let mut fields = Vec::new();

    for recipe in recipes {
        let member = generate_member(recipe, builtin_types, registry, &mut names, rng)?;

        if let Some(RecipeStep::Layout(layout)) = recipe.first() {
            required.insert(member.name.clone(), *layout);
        }

        fields.push(member);
    }

    fields.extend(filler_fields(builtin_types, &mut names, rng)?);
    fields.shuffle(rng);

    let required_layouts = fields
        .iter()
        .map(|field| required.get(&field.name).copied())
        .collect();

    Ok((fields, required_layouts))
}

/// Picks a random orientation qualifier for one field, given its type.
///
/// Matrix and structure fields get the shadow column-major marker three
/// times out of six, row-major twice, and explicit column-major once.
/// When `allow_row_major_structure` is false, structure fields always get
/// the shadow marker; some drivers fail to propagate row-major into
/// structures, and tests that must run everywhere avoid that case.
pub fn random_layout<R: Rng + ?Sized>(
    type_name: &str,
    allow_row_major_structure: bool,
    rng: &mut R,
) -> Result<Option<MatrixLayout>, LayoutError> {
    let t = if glsl::is_array(type_name) {
        glsl::array_base_type(type_name)?
    } else {
        type_name
    };

    if glsl::is_structure(t) && !allow_row_major_structure {
        return Ok(Some(MatrixLayout::ShadowColumnMajor));
    }

    if glsl::is_matrix(t) || glsl::is_structure(t) {
        const WEIGHTED: &[MatrixLayout] = &[
            MatrixLayout::ShadowColumnMajor,
            MatrixLayout::ShadowColumnMajor,
            MatrixLayout::ShadowColumnMajor,
            MatrixLayout::RowMajor,
            MatrixLayout::RowMajor,
            MatrixLayout::ColumnMajor,
        ];
        return Ok(WEIGHTED.choose(rng).copied());
    }

    Ok(None)
}

/// Assigns a layout qualifier to every field: the required one where a
/// recipe demanded it, a random choice for matrix and structure fields, and
/// none for everything else.
pub fn generate_layouts<R: Rng + ?Sized>(
    fields: &[StructField],
    required_layouts: Option<&[Option<MatrixLayout>]>,
    allow_row_major_structure: bool,
    rng: &mut R,
) -> Result<Vec<Option<MatrixLayout>>, LayoutError> {
    let mut layouts = Vec::with_capacity(fields.len());

    for (i, field) in fields.iter().enumerate() {
        let required = required_layouts.and_then(|l| l.get(i).copied().flatten());

        if let Some(layout) = required {
            layouts.push(Some(layout));
        } else {
            layouts.push(random_layout(&field.ty, allow_row_major_structure, rng)?);
        }
    }

    Ok(layouts)
}
