// Copyright (c) 2026 The ubo-layout contributors
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! End-to-end generation: recipes in, layouts plus verification data out.

use rand::{rngs::StdRng, SeedableRng};
use ubo_layout::{
    data::{data_pairs, test_vectors},
    generate::{generate_block_fields, generate_layouts, MatrixLayout, RecipeStep},
    glsl,
    packing::{PackingRules, Shared, Std140},
    registry::StructRegistry,
    walk::sibling_blocks,
};

const BUILTINS: &[&str] = &[
    "float", "vec2", "vec3", "vec4", //
    "int", "ivec3", "uint", "uvec2", //
    "bool", "bvec4", "mat2", "mat3x2", "mat4", //
    "double", "dvec2", "dmat2x3",
];

fn recipes() -> Vec<Vec<RecipeStep>> {
    vec![
        vec![RecipeStep::Array, RecipeStep::Struct, RecipeStep::ty("mat3x2")],
        vec![
            RecipeStep::Layout(MatrixLayout::RowMajor),
            RecipeStep::Struct,
            RecipeStep::Struct,
        ],
        vec![
            RecipeStep::Struct,
            RecipeStep::ty("dvec3"),
            RecipeStep::ty("bvec2"),
        ],
    ]
}

fn generate(seed: u64, packing: &dyn PackingRules) -> (StructRegistry, Vec<ubo_layout::UniformBlock>) {
    let mut registry = StructRegistry::new();
    let mut rng = StdRng::seed_from_u64(seed);

    let (fields, required) =
        generate_block_fields(&recipes(), BUILTINS, &mut registry, &mut rng).unwrap();
    let layouts = generate_layouts(&fields, Some(&required), true, &mut rng).unwrap();
    let blocks = sibling_blocks(packing, &fields, &layouts, true).unwrap();

    (registry, blocks)
}

#[test]
fn sibling_blocks_agree_on_every_offset() {
    for seed in [1, 17, 7777] {
        let (registry, blocks) = generate(seed, &Std140);
        assert_eq!(blocks.len(), 3);

        let reference = blocks[0].members(&registry, &Std140).unwrap();
        assert!(!reference.is_empty());

        for block in &blocks[1..] {
            let members = block.members(&registry, &Std140).unwrap();
            assert_eq!(members.len(), reference.len());

            for (m, r) in members.iter().zip(&reference) {
                assert_eq!(m.offset, r.offset, "seed {} member {}", seed, r.glsl_name);
                assert_eq!(m.row_major, r.row_major, "seed {} member {}", seed, r.glsl_name);
            }
        }
    }
}

#[test]
fn dependency_order_covers_all_generated_structures() {
    let (registry, blocks) = generate(23, &Std140);

    let order = registry
        .dependency_order_all(blocks.iter().map(|b| b.fields.as_slice()))
        .unwrap();

    // Every structure referenced from the blocks appears exactly once,
    // after the structures it contains.
    let mut seen: Vec<&str> = Vec::new();
    for name in &order {
        for field in registry.fields_of(name).unwrap() {
            let mut ty = field.ty.as_str();
            if glsl::is_array(ty) {
                ty = glsl::array_base_type(ty).unwrap();
            }

            if glsl::is_structure(ty) {
                assert!(seen.contains(&ty), "{} used before defined", ty);
            }
        }
        assert!(!seen.contains(&name.as_str()));
        seen.push(name.as_str());
    }

    // The recipes nest at least two structures.
    assert!(order.len() >= 2);
}

#[test]
fn introspection_vectors_match_across_inverted_siblings() {
    let (registry, blocks) = generate(5, &Std140);

    let vectors_of = |block: &ubo_layout::UniformBlock| {
        test_vectors(
            &registry,
            &block.fields,
            &block.field_layouts,
            &block.block_name,
            &block.instance_name,
            &Std140,
            block.row_major_default(),
        )
        .unwrap()
    };

    let reference = vectors_of(&blocks[0]);
    assert!(!reference.is_empty());

    for block in &blocks[1..] {
        let vectors = vectors_of(block);
        assert_eq!(vectors.len(), reference.len());

        for (v, r) in vectors.iter().zip(&reference) {
            assert_eq!(v.api_type, r.api_type);
            assert_eq!(v.element_count, r.element_count);
            assert_eq!(v.offset, r.offset);
            assert_eq!(v.array_stride, r.array_stride);
            assert_eq!(v.matrix_stride, r.matrix_stride);
            assert_eq!(v.row_major, r.row_major);
        }
    }
}

#[test]
fn generation_is_reproducible_end_to_end() {
    let run = |seed| {
        let (registry, blocks) = generate(seed, &Shared);
        data_pairs(&registry, &blocks, &Shared).unwrap()
    };

    let (checkers_a, setters_a) = run(321);
    let (checkers_b, setters_b) = run(321);

    assert_eq!(checkers_a, checkers_b);
    assert_eq!(setters_a, setters_b);
    assert!(!setters_a.is_empty());
}

#[test]
fn every_setter_has_matching_checkers() {
    let (registry, blocks) = generate(9, &Std140);
    let (checkers, setters) = data_pairs(&registry, &blocks, &Std140).unwrap();

    // Each setter expands to one checker per scalar component, so there are
    // always at least as many checkers as setters.
    assert!(checkers.len() >= setters.len());

    // Boolean data never reaches the API as bool.
    for setter in &setters {
        assert!(!setter.glsl_type.starts_with('b'), "{}", setter.glsl_type);
    }
}

#[test]
fn generated_member_paths_are_unique_within_a_block() {
    let (registry, blocks) = generate(13, &Std140);

    let members = blocks[0].members(&registry, &Std140).unwrap();
    let mut names: Vec<&str> = members.iter().map(|m| m.glsl_name.as_str()).collect();
    let total = names.len();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), total);
}
