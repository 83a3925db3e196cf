//! Scene graph for a single page.

use crate::align::{self, AlignEdge, Axis, DistributeOptions, DistributeOutcome};
use crate::batch::placeholders_in;
use crate::bounds::bounds_of_group;
use crate::error::{EngineError, EngineResult};
use crate::pages::PageId;
use crate::shapes::{ObjectId, ObjectKind, SceneObject, SerializableColor, TextContent};
use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// One page: an ordered object list on a sized, filled canvas.
///
/// Paint order is list order; later objects draw on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneGraph {
    id: PageId,
    width: u32,
    height: u32,
    #[serde(default = "SerializableColor::white")]
    pub background: SerializableColor,
    objects: Vec<SceneObject>,
}

impl SceneGraph {
    /// Create an empty page; both dimensions must be positive.
    pub fn new(width: u32, height: u32) -> EngineResult<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            id: Uuid::new_v4(),
            width,
            height,
            background: SerializableColor::white(),
            objects: Vec::new(),
        })
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Canvas rectangle in page coordinates.
    pub fn canvas(&self) -> Rect {
        self.size().to_rect()
    }

    pub fn set_size(&mut self, width: u32, height: u32) -> EngineResult<()> {
        check_dimensions(width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn with_background(mut self, background: SerializableColor) -> Self {
        self.background = background;
        self
    }

    /// Add an object on top of the stack.
    pub fn add(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id();
        self.objects.push(object);
        id
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let index = self.index_of(id)?;
        Some(self.objects.remove(index))
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id() == id)
    }

    /// Objects in paint order.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.objects.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Union bounds of every object.
    pub fn content_bounds(&self) -> Option<Rect> {
        bounds_of_group(&self.objects)
    }

    /// Bring an object to the front (topmost).
    pub fn bring_to_front(&mut self, id: ObjectId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let object = self.objects.remove(index);
        self.objects.push(object);
        true
    }

    /// Send an object to the back (bottommost).
    pub fn send_to_back(&mut self, id: ObjectId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let object = self.objects.remove(index);
        self.objects.insert(0, object);
        true
    }

    /// Move an object one layer forward (towards front).
    /// Returns true if the object was moved, false if already at front.
    pub fn bring_forward(&mut self, id: ObjectId) -> bool {
        match self.index_of(id) {
            Some(pos) if pos + 1 < self.objects.len() => {
                self.objects.swap(pos, pos + 1);
                true
            }
            _ => false,
        }
    }

    /// Move an object one layer backward (towards back).
    /// Returns true if the object was moved, false if already at back.
    pub fn send_backward(&mut self, id: ObjectId) -> bool {
        match self.index_of(id) {
            Some(pos) if pos > 0 => {
                self.objects.swap(pos, pos - 1);
                true
            }
            _ => false,
        }
    }

    /// Group the given objects, placing the group at the frontmost member's
    /// layer. Needs at least two matching objects.
    pub fn group(&mut self, ids: &[ObjectId]) -> Option<ObjectId> {
        let indices: Vec<usize> = (0..self.objects.len())
            .filter(|&i| ids.contains(&self.objects[i].id()))
            .collect();
        if indices.len() < 2 {
            return None;
        }
        let top = indices[indices.len() - 1];
        let insert_at = top + 1 - indices.len();

        let mut children = Vec::with_capacity(indices.len());
        for &index in indices.iter().rev() {
            children.push(self.objects.remove(index));
        }
        children.reverse();

        let group = SceneObject::group(children);
        let group_id = group.id();
        self.objects.insert(insert_at, group);
        log::debug!("Grouped {} objects into {group_id}", indices.len());
        Some(group_id)
    }

    /// Dissolve a group, returning its children to the page at its layer.
    pub fn ungroup(&mut self, id: ObjectId) -> Option<Vec<ObjectId>> {
        let index = self.index_of(id)?;
        if !self.objects[index].is_group() {
            return None;
        }
        let grouped = self.objects.remove(index);
        let ObjectKind::Group(group) = grouped.kind else {
            return None;
        };
        let children = group.dissolve(&grouped.geometry);
        let child_ids = children.iter().map(SceneObject::id).collect();
        for (offset, child) in children.into_iter().enumerate() {
            self.objects.insert(index + offset, child);
        }
        Some(child_ids)
    }

    fn selection_mut(&mut self, ids: &[ObjectId]) -> Vec<&mut SceneObject> {
        self.objects
            .iter_mut()
            .filter(|o| ids.contains(&o.id()))
            .collect()
    }

    /// Align the selected objects; see [`align::align_group`].
    pub fn align(&mut self, ids: &[ObjectId], edge: AlignEdge) {
        let canvas = self.size();
        let mut selection = self.selection_mut(ids);
        align::align_group(&mut selection, edge, canvas);
    }

    /// Distribute the selected objects; see [`align::distribute`].
    pub fn distribute(
        &mut self,
        ids: &[ObjectId],
        axis: Axis,
        options: DistributeOptions,
    ) -> DistributeOutcome {
        let mut selection = self.selection_mut(ids);
        align::distribute(&mut selection, axis, options)
    }

    /// Visit every text payload on the page, including inside groups.
    pub fn for_each_text_mut(&mut self, mut f: impl FnMut(&mut TextContent)) {
        for object in &mut self.objects {
            object.for_each_text_mut(&mut f);
        }
    }

    pub fn for_each_text(&self, mut f: impl FnMut(&TextContent)) {
        for object in &self.objects {
            object.for_each_text(&mut f);
        }
    }

    /// Distinct `{{key}}` placeholders used by text on this page, in order of
    /// first appearance.
    pub fn placeholders(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        self.for_each_text(|text| {
            for key in placeholders_in(&text.content) {
                if !keys.iter().any(|k| k == key) {
                    keys.push(key.to_string());
                }
            }
        });
        keys
    }

    /// Deep copy with a new page id and fresh object ids.
    pub fn fork(&self) -> Self {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4();
        for object in &mut copy.objects {
            object.regenerate_ids();
        }
        copy
    }

    /// Empty page with the same size and background.
    pub fn blank_copy(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            width: self.width,
            height: self.height,
            background: self.background,
            objects: Vec::new(),
        }
    }

    /// Check structural invariants: positive dimensions and unique ids.
    pub fn validate(&self) -> EngineResult<()> {
        check_dimensions(self.width, self.height)?;
        let mut seen = HashSet::new();
        let mut stack: Vec<&SceneObject> = self.objects.iter().collect();
        while let Some(object) = stack.pop() {
            if !seen.insert(object.id()) {
                return Err(EngineError::InvalidDocument(format!(
                    "duplicate object id {}",
                    object.id()
                )));
            }
            if let Some(group) = object.as_group() {
                stack.extend(group.children.iter());
            }
        }
        Ok(())
    }

    /// Fail unless the page has content and positive dimensions.
    pub fn ensure_renderable(&self) -> EngineResult<()> {
        check_dimensions(self.width, self.height)?;
        if self.objects.is_empty() {
            return Err(EngineError::InvalidDocument(
                "page has no content to export".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize to the JSON exchange format.
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from the JSON exchange format and validate.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let page: Self = serde_json::from_str(json)?;
        page.validate()?;
        Ok(page)
    }
}

fn check_dimensions(width: u32, height: u32) -> EngineResult<()> {
    if width == 0 || height == 0 {
        return Err(EngineError::InvalidDocument(format!(
            "page dimensions must be positive, got {width}x{height}"
        )));
    }
    Ok(())
}
