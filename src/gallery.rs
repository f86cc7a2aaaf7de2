//! In-session gallery of captured images.
//!
//! Images are addressed by position only. Deleting index `i` shifts every
//! later image down by one, so an index is only meaningful against the
//! listing it was taken from.

use crate::types::CapturedImage;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryVisibility {
    #[default]
    Hidden,
    Shown,
}

impl GalleryVisibility {
    pub fn toggled(self) -> Self {
        match self {
            GalleryVisibility::Hidden => GalleryVisibility::Shown,
            GalleryVisibility::Shown => GalleryVisibility::Hidden,
        }
    }
}

/// One grid cell: its position and the alt text for the thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryEntry {
    pub index: usize,
    pub label: String,
}

#[derive(Debug, Default)]
pub struct GalleryStore {
    images: Vec<CapturedImage>,
    visibility: GalleryVisibility,
}

impl GalleryStore {
    /// Text rendered in place of the grid when there is nothing to show.
    pub const EMPTY_PLACEHOLDER: &'static str = "No images available";

    pub fn new() -> Self {
        Self::default()
    }

    /// Add `image` after every existing one and return its index.
    pub fn append(&mut self, image: CapturedImage) -> usize {
        self.images.push(image);
        self.images.len() - 1
    }

    /// Remove the image at `index`. Out-of-bounds indexes leave the store
    /// untouched and return `None`.
    pub fn delete_at(&mut self, index: usize) -> Option<CapturedImage> {
        if index >= self.images.len() {
            log::debug!(
                "Ignoring delete of index {} (gallery holds {})",
                index,
                self.images.len()
            );
            return None;
        }
        let removed = self.images.remove(index);
        log::debug!("Deleted gallery image {}", index);
        Some(removed)
    }

    pub fn list(&self) -> &[CapturedImage] {
        &self.images
    }

    pub fn get(&self, index: usize) -> Option<&CapturedImage> {
        self.images.get(index)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Grid cells in display order, labelled "Captured 1", "Captured 2", ...
    pub fn entries(&self) -> impl Iterator<Item = GalleryEntry> + '_ {
        self.images.iter().enumerate().map(|(index, _)| GalleryEntry {
            index,
            label: format!("Captured {}", index + 1),
        })
    }

    pub fn toggle_visibility(&mut self) -> GalleryVisibility {
        self.visibility = self.visibility.toggled();
        self.visibility
    }

    pub fn visibility(&self) -> GalleryVisibility {
        self.visibility
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == GalleryVisibility::Shown
    }

    /// Drop every image. Used when the owning view is torn down.
    pub fn clear(&mut self) {
        self.images.clear();
    }
}
