use crate::{
    error::CoreError,
    geometry::WorldBox,
    ray::{Ray, SpanList},
};

use super::SceneObject;

/// Flat list of scene objects, every child is tested for every ray.
#[derive(Debug)]
pub struct Compound {
    children: Vec<Box<dyn SceneObject>>,
    bounds: WorldBox,
}

impl Default for Compound {
    fn default() -> Self {
        Compound::new()
    }
}

impl Compound {
    pub fn new() -> Self {
        Compound {
            children: Vec::new(),
            bounds: WorldBox::empty(),
        }
    }

    pub fn add(&mut self, child: impl SceneObject + 'static) -> &mut Self {
        self.bounds = self.bounds.clone() + child.bound_box();
        self.children.push(Box::new(child));
        self
    }

    pub fn children(&self) -> &[Box<dyn SceneObject>] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl FromIterator<Box<dyn SceneObject>> for Compound {
    fn from_iter<T: IntoIterator<Item = Box<dyn SceneObject>>>(iter: T) -> Self {
        let children: Vec<_> = iter.into_iter().collect();
        let bounds = children
            .iter()
            .fold(WorldBox::empty(), |acc, child| acc + child.bound_box());
        Compound { children, bounds }
    }
}

/// Union of the spans of all children, `None` unless every child is solid.
pub(super) fn union_spans<'s>(
    children: &'s [Box<dyn SceneObject>],
    ray: &Ray<'s>,
) -> Result<Option<SpanList<'s>>, CoreError> {
    let mut ret = SpanList::new();
    for child in children {
        let Some(spans) = child.spans(ray)? else {
            return Ok(None);
        };
        ret = ret + spans;
    }
    Ok(Some(ret))
}

impl SceneObject for Compound {
    fn bound_box(&self) -> WorldBox {
        self.bounds.clone()
    }

    fn chart(&self) -> usize {
        self.children.first().map_or(0, |child| child.chart())
    }

    fn test_intersection<'s>(&'s self, ray: &mut Ray<'s>) -> Result<bool, CoreError> {
        let mut found = false;
        for child in &self.children {
            if ray.finished() {
                break;
            }
            found |= child.test_intersection(ray)?;
        }
        Ok(found)
    }

    fn is_solid(&self) -> bool {
        !self.children.is_empty() && self.children.iter().all(|child| child.is_solid())
    }

    fn spans<'s>(&'s self, ray: &Ray<'s>) -> Result<Option<SpanList<'s>>, CoreError> {
        if !self.is_solid() {
            return Ok(None);
        }
        union_spans(&self.children, ray)
    }
}
