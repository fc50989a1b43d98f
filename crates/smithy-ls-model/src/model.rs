//! The validated model: a flat shape map plus side indices.

use std::collections::HashMap;

use crate::event::SourceLocation;
use crate::id::ShapeId;
use crate::shape::{Shape, TraitApplication};
use crate::value::NodeValue;

/// A metadata entry with the file that contributed it. Entries are kept
/// per file rather than merged, so a key contributed by several files
/// (suppressions, validators) surfaces every contribution.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    pub key: String,
    pub value: NodeValue,
    pub location: SourceLocation,
}

/// An immutable, validated model. Build through [`ModelBuilder`]; each
/// assembly produces a fresh model, so there is no edit-in-place
/// surface here.
#[derive(Debug, Default, Clone)]
pub struct Model {
    shapes: HashMap<ShapeId, Shape>,
    metadata: Vec<MetadataEntry>,
    by_trait: HashMap<ShapeId, Vec<ShapeId>>,
}

impl Model {
    pub fn get_shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.shapes.contains_key(id)
    }

    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.values()
    }

    /// Shapes carrying an application of the given trait.
    pub fn shapes_with_trait(&self, trait_id: &ShapeId) -> impl Iterator<Item = &Shape> + '_ {
        self.by_trait
            .get(trait_id)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.shapes.get(id))
    }

    pub fn metadata(&self) -> &[MetadataEntry] {
        &self.metadata
    }
}

/// Mutable accumulation of shapes and metadata before freezing into a
/// [`Model`] with its side indices.
#[derive(Debug, Default, Clone)]
pub struct ModelBuilder {
    shapes: HashMap<ShapeId, Shape>,
    metadata: Vec<MetadataEntry>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_shape(&mut self, shape: Shape) -> &mut Self {
        self.shapes.insert(shape.id.clone(), shape);
        self
    }

    pub fn get_shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    pub fn get_shape_mut(&mut self, id: &ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(id)
    }

    pub fn put_metadata(
        &mut self,
        key: impl Into<String>,
        value: NodeValue,
        location: SourceLocation,
    ) -> &mut Self {
        self.metadata.push(MetadataEntry {
            key: key.into(),
            value,
            location,
        });
        self
    }

    /// Apply a trait to an existing shape. Array values merge with any
    /// existing application of the same trait, keeping their per-element
    /// source locations aligned.
    pub fn apply_trait(&mut self, target: &ShapeId, application: TraitApplication) -> bool {
        let Some(shape) = self.shapes.get_mut(target) else {
            return false;
        };
        if let NodeValue::Arr(new_elements) = &application.value {
            if let Some(existing) = shape
                .traits
                .iter_mut()
                .find(|t| t.id == application.id && t.is_array())
            {
                let NodeValue::Arr(elements) = &mut existing.value else {
                    unreachable!("is_array checked above");
                };
                let new_locations = application
                    .element_locations
                    .clone()
                    .unwrap_or_else(|| vec![application.location.clone(); new_elements.len()]);
                let locations = existing.element_locations.get_or_insert_with(|| {
                    vec![existing.location.clone(); elements.len()]
                });
                elements.extend(new_elements.iter().cloned());
                locations.extend(new_locations);
                return true;
            }
        }
        shape.traits.push(application);
        true
    }

    /// Freeze into a model, computing the by-trait index.
    pub fn build(self) -> Model {
        let mut by_trait: HashMap<ShapeId, Vec<ShapeId>> = HashMap::new();
        for shape in self.shapes.values() {
            for application in &shape.traits {
                by_trait
                    .entry(application.id.clone())
                    .or_default()
                    .push(shape.id.clone());
            }
        }
        Model {
            shapes: self.shapes,
            metadata: self.metadata,
            by_trait,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SourceLocation;
    use crate::shape::ShapeType;

    fn shape(id: &str) -> Shape {
        Shape::new(
            id.parse().unwrap(),
            ShapeType::Structure,
            SourceLocation::top_of("a.smithy"),
        )
    }

    fn tag_trait(file: &str, values: &[&str]) -> TraitApplication {
        let mut application = TraitApplication::new(
            "smithy.api#tags".parse().unwrap(),
            NodeValue::Arr(values.iter().map(|v| NodeValue::Str(v.to_string())).collect()),
            SourceLocation::top_of(file),
        );
        application.element_locations =
            Some(values.iter().map(|_| SourceLocation::top_of(file)).collect());
        application
    }

    #[test]
    fn array_traits_merge_and_keep_element_files() {
        let mut builder = ModelBuilder::new();
        builder.add_shape(shape("com.a#S"));
        let id: ShapeId = "com.a#S".parse().unwrap();
        assert!(builder.apply_trait(&id, tag_trait("a.smithy", &["x"])));
        assert!(builder.apply_trait(&id, tag_trait("b.smithy", &["y", "z"])));

        let model = builder.build();
        let shape = model.get_shape(&id).unwrap();
        let application = &shape.traits[0];
        assert_eq!(application.value.as_arr().unwrap().len(), 3);
        let locations = application.element_locations.as_ref().unwrap();
        assert_eq!(locations[0].filename, "a.smithy");
        assert_eq!(locations[1].filename, "b.smithy");
        assert_eq!(locations[2].filename, "b.smithy");
    }

    #[test]
    fn applying_to_a_missing_shape_is_refused() {
        let mut builder = ModelBuilder::new();
        let id: ShapeId = "com.a#Missing".parse().unwrap();
        assert!(!builder.apply_trait(&id, tag_trait("a.smithy", &["x"])));
    }

    #[test]
    fn by_trait_index_finds_shapes() {
        let mut builder = ModelBuilder::new();
        builder.add_shape(shape("com.a#S"));
        let id: ShapeId = "com.a#S".parse().unwrap();
        builder.apply_trait(&id, tag_trait("a.smithy", &["x"]));
        let model = builder.build();
        let trait_id: ShapeId = "smithy.api#tags".parse().unwrap();
        assert_eq!(model.shapes_with_trait(&trait_id).count(), 1);
    }
}
