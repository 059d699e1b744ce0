use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::interfaces::RunResultViewer;

/// Maps result formats to the viewers able to render them
#[derive(Default)]
pub struct ViewerRegistry {
    formats: IndexMap<String, IndexMap<String, Weak<dyn RunResultViewer>>>,
}

impl fmt::Debug for ViewerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formats: Vec<_> = self
            .formats
            .iter()
            .map(|(format, viewers)| (format, viewers.keys().collect::<Vec<_>>()))
            .collect();
        f.debug_struct("ViewerRegistry")
            .field("formats", &formats)
            .finish()
    }
}

impl ViewerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, viewer: &Arc<dyn RunResultViewer>, formats: &[String]) {
        for format in formats {
            tracing::debug!("Viewer {} renders '{}'", viewer.viewer_id(), format);
            self.formats
                .entry(format.clone())
                .or_default()
                .insert(viewer.viewer_id().to_string(), Arc::downgrade(viewer));
        }
    }

    pub fn deregister(&mut self, viewer_id: &str, formats: &[String]) {
        for format in formats {
            if let Some(viewers) = self.formats.get_mut(format) {
                viewers.shift_remove(viewer_id);
            }
        }
        self.formats.retain(|_, viewers| !viewers.is_empty());
    }

    pub fn deregister_owner(&mut self, viewer_id: &str) {
        for viewers in self.formats.values_mut() {
            viewers.shift_remove(viewer_id);
        }
        self.formats.retain(|_, viewers| !viewers.is_empty());
    }

    pub fn prune_dead(&mut self) {
        for viewers in self.formats.values_mut() {
            viewers.retain(|_, viewer| viewer.strong_count() > 0);
        }
        self.formats.retain(|_, viewers| !viewers.is_empty());
    }

    /// Live viewers of a format in registration order
    pub fn viewers_for(&self, format: &str) -> Vec<Arc<dyn RunResultViewer>> {
        self.formats
            .get(format)
            .map(|viewers| viewers.values().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    }

    pub fn viewer_ids_for(&self, format: &str) -> Vec<String> {
        self.formats
            .get(format)
            .map(|viewers| {
                viewers
                    .iter()
                    .filter(|(_, viewer)| viewer.strong_count() > 0)
                    .map(|(id, _)| id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}
