// Copyright (c) 2026 The ubo-layout contributors
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The registry of synthesized structure definitions.
//!
//! Structure types have no spelling of their own in a type name; `S3` only
//! means something because a definition was registered under that name. The
//! registry owns every definition for the duration of one generation run
//! and is consulted recursively by all sizing and alignment queries.
//! Construct a fresh registry per run; definitions are never deleted.

use crate::{glsl, LayoutError};
use foldhash::HashSet;
use indexmap::IndexMap;

/// One member of a structure or uniform block: a type name and a field
/// name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructField {
    pub ty: String,
    pub name: String,
}

impl StructField {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        StructField {
            ty: ty.into(),
            name: name.into(),
        }
    }
}

/// Ordered mapping from structure names to their field lists.
#[derive(Clone, Debug, Default)]
pub struct StructRegistry {
    structs: IndexMap<String, Vec<StructField>>,
}

impl StructRegistry {
    pub fn new() -> Self {
        StructRegistry {
            structs: IndexMap::new(),
        }
    }

    /// The number of registered structures.
    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    /// Returns the next synthesized structure name (`S1`, `S2`, ...).
    ///
    /// Callers are expected to `define` the structure before asking for
    /// another name.
    pub fn fresh_name(&self) -> String {
        format!("S{}", self.structs.len() + 1)
    }

    /// Registers a structure definition. Names are caller-allocated and
    /// fresh, so redefinition is not expected and simply replaces nothing
    /// silently; a duplicate name indicates a generator defect upstream.
    pub fn define(&mut self, name: impl Into<String>, fields: Vec<StructField>) {
        self.structs.insert(name.into(), fields);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    /// The ordered field list of a registered structure.
    pub fn fields_of(&self, name: &str) -> Result<&[StructField], LayoutError> {
        self.structs
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| LayoutError::UnknownType(name.to_owned()))
    }

    /// All registered structures in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[StructField])> {
        self.structs
            .iter()
            .map(|(name, fields)| (name.as_str(), fields.as_slice()))
    }

    /// Every structure reachable from `fields`, children before parents, in
    /// declaration order.
    ///
    /// Fails with [`LayoutError::TypeRecursion`] if a structure directly or
    /// indirectly contains itself.
    pub fn dependency_order(&self, fields: &[StructField]) -> Result<Vec<String>, LayoutError> {
        let mut yielded = HashSet::default();
        let mut out = Vec::new();
        self.dependency_order_into(fields, &mut Vec::new(), &mut yielded, &mut out)?;
        Ok(out)
    }

    /// Like [`dependency_order`](Self::dependency_order), but for several
    /// field lists that may share substructures; each structure appears
    /// once, at its first reachable position.
    pub fn dependency_order_all<'a>(
        &self,
        field_lists: impl IntoIterator<Item = &'a [StructField]>,
    ) -> Result<Vec<String>, LayoutError> {
        let mut yielded = HashSet::default();
        let mut out = Vec::new();

        for fields in field_lists {
            self.dependency_order_into(fields, &mut Vec::new(), &mut yielded, &mut out)?;
        }

        Ok(out)
    }

    fn dependency_order_into(
        &self,
        fields: &[StructField],
        seen: &mut Vec<String>,
        yielded: &mut HashSet<String>,
        out: &mut Vec<String>,
    ) -> Result<(), LayoutError> {
        for field in fields {
            let mut ty = field.ty.as_str();

            if glsl::is_array(ty) {
                ty = glsl::array_base_type(ty)?;
            }

            if !glsl::is_structure(ty) {
                continue;
            }

            if seen.iter().any(|s| s == ty) {
                return Err(LayoutError::TypeRecursion(ty.to_owned()));
            }

            seen.push(ty.to_owned());
            self.dependency_order_into(self.fields_of(ty)?, seen, yielded, out)?;
            seen.pop();

            if yielded.insert(ty.to_owned()) {
                out.push(ty.to_owned());
            }
        }

        Ok(())
    }
}
