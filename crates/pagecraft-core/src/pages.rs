//! Multi-page documents.

use crate::error::{EngineError, EngineResult};
use crate::scene::SceneGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Unique identifier for pages.
pub type PageId = Uuid;

/// Ordered pages plus the id of the page being edited.
///
/// A document always holds at least one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pages: Vec<SceneGraph>,
    current: PageId,
}

impl Document {
    /// New document with one blank page of the given size.
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> EngineResult<Self> {
        Ok(Self::with_page(name, SceneGraph::new(width, height)?))
    }

    /// Document wrapping an existing page.
    pub fn with_page(name: impl Into<String>, page: SceneGraph) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            current: page.id(),
            pages: vec![page],
        }
    }

    pub fn pages(&self) -> &[SceneGraph] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, id: PageId) -> Option<&SceneGraph> {
        self.pages.iter().find(|p| p.id() == id)
    }

    pub fn page_mut(&mut self, id: PageId) -> Option<&mut SceneGraph> {
        self.pages.iter_mut().find(|p| p.id() == id)
    }

    pub fn index_of(&self, id: PageId) -> Option<usize> {
        self.pages.iter().position(|p| p.id() == id)
    }

    pub fn current_id(&self) -> PageId {
        self.current
    }

    fn current_index(&self) -> usize {
        self.index_of(self.current).unwrap_or(0)
    }

    pub fn current(&self) -> &SceneGraph {
        &self.pages[self.current_index()]
    }

    pub fn current_mut(&mut self) -> &mut SceneGraph {
        let index = self.current_index();
        &mut self.pages[index]
    }

    /// Append a blank page sized like the current one and make it current.
    pub fn add_page(&mut self) -> PageId {
        let page = self.current().blank_copy();
        let id = page.id();
        self.pages.push(page);
        self.current = id;
        log::debug!("Added page {id}");
        id
    }

    /// Deep-copy a page, inserting the copy right after it.
    ///
    /// The copy has its own page id and object ids; editing it never touches
    /// the source.
    pub fn duplicate_page(&mut self, id: PageId) -> EngineResult<PageId> {
        let index = self.index_of(id).ok_or(EngineError::PageNotFound(id))?;
        let copy = self.pages[index].fork();
        let copy_id = copy.id();
        self.pages.insert(index + 1, copy);
        self.current = copy_id;
        log::debug!("Duplicated page {id} as {copy_id}");
        Ok(copy_id)
    }

    /// Delete a page. The sole remaining page cannot be deleted.
    pub fn delete_page(&mut self, id: PageId) -> EngineResult<SceneGraph> {
        let index = self.index_of(id).ok_or(EngineError::PageNotFound(id))?;
        if self.pages.len() == 1 {
            log::warn!("Refusing to delete the last page of document {}", self.id);
            return Err(EngineError::LastPageDeletion);
        }
        let removed = self.pages.remove(index);
        if self.current == id {
            let next = index.min(self.pages.len() - 1);
            self.current = self.pages[next].id();
        }
        Ok(removed)
    }

    /// Move a page to `new_index`, clamped to the valid range.
    pub fn reorder(&mut self, id: PageId, new_index: usize) -> EngineResult<()> {
        let index = self.index_of(id).ok_or(EngineError::PageNotFound(id))?;
        let page = self.pages.remove(index);
        let target = new_index.min(self.pages.len());
        self.pages.insert(target, page);
        Ok(())
    }

    /// Make `id` the current page. Does not touch any page content.
    pub fn set_current(&mut self, id: PageId) -> EngineResult<()> {
        if self.index_of(id).is_none() {
            return Err(EngineError::PageNotFound(id));
        }
        self.current = id;
        Ok(())
    }

    /// Check document invariants and every page's invariants.
    pub fn validate(&self) -> EngineResult<()> {
        if self.pages.is_empty() {
            return Err(EngineError::InvalidDocument("document has no pages".to_string()));
        }
        if self.index_of(self.current).is_none() {
            return Err(EngineError::InvalidDocument(format!(
                "current page {} is not in the document",
                self.current
            )));
        }
        let mut seen = HashSet::new();
        for page in &self.pages {
            if !seen.insert(page.id()) {
                return Err(EngineError::InvalidDocument(format!(
                    "duplicate page id {}",
                    page.id()
                )));
            }
            page.validate()?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        let document: Self = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }
}
