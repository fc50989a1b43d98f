//! The rebuild index: who depends on whom across files.
//!
//! Rebuilt whole from the validated model after every assembly. When a
//! file changes, the first two maps name the other files whose shapes
//! carry array-trait fragments authored in it, so those are reparsed
//! too; the last two maps name the traits that must be preserved or
//! re-staged so cross-file applications survive the reload.

use std::collections::{BTreeSet, HashMap};

use smithy_ls_model::{Model, NodeValue, ShapeId, TraitApplication};

#[derive(Debug, Default)]
pub struct RebuildIndex {
    /// File A -> files whose shapes depend on array-trait fragments
    /// authored in A.
    files_to_dependent_files: HashMap<String, BTreeSet<String>>,
    /// Shape S -> every file contributing a fragment to one of S's
    /// array traits.
    shape_ids_to_dependency_files: HashMap<ShapeId, BTreeSet<String>>,
    /// File A -> shape S -> traits A applies to S that live elsewhere.
    files_to_applied_traits: HashMap<String, HashMap<ShapeId, Vec<TraitApplication>>>,
    /// Shape S -> traits applied to S from files other than S's
    /// defining file.
    shapes_to_other_file_traits: HashMap<ShapeId, Vec<TraitApplication>>,
    /// Shape ids defined per file, for removal bookkeeping.
    shapes_by_file: HashMap<String, BTreeSet<ShapeId>>,
}

impl RebuildIndex {
    /// Pure function of the validated model.
    pub fn from_model(model: &Model) -> RebuildIndex {
        let mut index = RebuildIndex::default();
        for shape in model.shapes() {
            let shape_file = shape.location.filename.as_str();
            index
                .shapes_by_file
                .entry(shape_file.to_string())
                .or_default()
                .insert(shape.id.clone());

            for application in &shape.traits {
                if application.synthetic {
                    continue;
                }
                if let (NodeValue::Arr(_), Some(locations)) =
                    (&application.value, application.element_locations.as_ref())
                {
                    for location in locations {
                        if location.filename != shape_file {
                            index
                                .files_to_dependent_files
                                .entry(location.filename.clone())
                                .or_default()
                                .insert(shape_file.to_string());
                            index
                                .shape_ids_to_dependency_files
                                .entry(shape.id.clone())
                                .or_default()
                                .insert(location.filename.clone());
                        }
                    }
                    continue;
                }
                if application.location.filename != shape_file {
                    index
                        .shapes_to_other_file_traits
                        .entry(shape.id.clone())
                        .or_default()
                        .push(application.clone());
                    index
                        .files_to_applied_traits
                        .entry(application.location.filename.clone())
                        .or_default()
                        .entry(shape.id.clone())
                        .or_default()
                        .push(application.clone());
                }
            }
        }
        index
    }

    /// Files that must be reparsed when `file` changes, not counting
    /// `file` itself.
    pub fn get_dependent_files(&self, file: &str) -> BTreeSet<String> {
        self.files_to_dependent_files
            .get(file)
            .cloned()
            .unwrap_or_default()
    }

    /// Files contributing array-trait fragments to `shape`: the reverse
    /// of [`Self::get_dependent_files`]. A reload of the shape's file
    /// re-feeds these so their fragments re-apply.
    pub fn get_dependencies_files(&self, shape: &ShapeId) -> BTreeSet<String> {
        self.shape_ids_to_dependency_files
            .get(shape)
            .cloned()
            .unwrap_or_default()
    }

    /// Traits applied to `shape` from files other than its own, the set
    /// a reload re-stages on the assembler.
    pub fn other_file_traits(&self, shape: &ShapeId) -> &[TraitApplication] {
        self.shapes_to_other_file_traits
            .get(shape)
            .map_or(&[], Vec::as_slice)
    }

    /// Traits `file` applies to shapes defined elsewhere. During a
    /// reload these are left to the file's own (possibly new) text
    /// rather than re-staged.
    pub fn applied_traits_of(
        &self,
        file: &str,
    ) -> Option<&HashMap<ShapeId, Vec<TraitApplication>>> {
        self.files_to_applied_traits.get(file)
    }

    pub fn shapes_in_file(&self, file: &str) -> BTreeSet<ShapeId> {
        self.shapes_by_file.get(file).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithy_ls_model::{IdlAssembler, ModelAssembler};

    fn model_of(files: &[(&str, &str)]) -> Model {
        let mut assembler = IdlAssembler::default();
        for (path, text) in files {
            assembler.add_document(path, text);
        }
        assembler.assemble().model
    }

    #[test]
    fn array_fragments_create_dependents() {
        let model = model_of(&[
            (
                "a.smithy",
                "$version: \"2\"\nnamespace com.a\n@tags([\"one\"])\nstructure S {}\n",
            ),
            (
                "b.smithy",
                "$version: \"2\"\nnamespace com.b\nuse com.a#S\napply S @tags([\"two\"])\n",
            ),
        ]);
        let index = RebuildIndex::from_model(&model);
        let dependents = index.get_dependent_files("b.smithy");
        assert!(dependents.contains("a.smithy"));
        let shape: ShapeId = "com.a#S".parse().unwrap();
        assert!(index.get_dependencies_files(&shape).contains("b.smithy"));
    }

    #[test]
    fn rebuild_completeness_is_symmetric() {
        let model = model_of(&[
            (
                "a.smithy",
                "$version: \"2\"\nnamespace com.a\nstructure S {}\n",
            ),
            (
                "b.smithy",
                "$version: \"2\"\nnamespace com.b\nuse com.a#S\napply S @tags([\"x\"])\n",
            ),
        ]);
        let index = RebuildIndex::from_model(&model);
        let shape: ShapeId = "com.a#S".parse().unwrap();
        let forward = index.get_dependent_files("b.smithy").contains("a.smithy");
        let backward = index.get_dependencies_files(&shape).contains("b.smithy");
        assert_eq!(forward, backward);
        assert!(forward);
    }

    #[test]
    fn non_array_cross_file_traits_are_preserved() {
        let model = model_of(&[
            (
                "a.smithy",
                "$version: \"2\"\nnamespace com.a\nstructure S {}\n",
            ),
            (
                "b.smithy",
                "$version: \"2\"\nnamespace com.b\nuse com.a#S\napply S @documentation(\"x\")\n",
            ),
        ]);
        let index = RebuildIndex::from_model(&model);
        let shape: ShapeId = "com.a#S".parse().unwrap();
        let preserved = index.other_file_traits(&shape);
        assert_eq!(preserved.len(), 1);
        assert_eq!(preserved[0].location.filename, "b.smithy");
        let applied = index.applied_traits_of("b.smithy").unwrap();
        assert!(applied.contains_key(&shape));
    }

    #[test]
    fn same_file_traits_stay_out_of_the_index() {
        let model = model_of(&[(
            "a.smithy",
            "$version: \"2\"\nnamespace com.a\n@documentation(\"local\")\nstructure S {}\n",
        )]);
        let index = RebuildIndex::from_model(&model);
        let shape: ShapeId = "com.a#S".parse().unwrap();
        assert!(index.other_file_traits(&shape).is_empty());
        assert!(index.get_dependencies_files(&shape).is_empty());
    }
}
