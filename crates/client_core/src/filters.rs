use std::sync::{Arc, PoisonError, RwLock};

use shared::domain::FilterSelection;

/// Shared handle to the active filters.
///
/// The search controller is the only writer; the subscription controller
/// reads a snapshot at submit time. Cloning shares the same selection.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    inner: Arc<RwLock<FilterSelection>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> FilterSelection {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn replace(&self, selection: FilterSelection) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = selection;
    }

    pub(crate) fn clear(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn is_empty(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::FilterField;

    use super::*;

    #[test]
    fn clones_observe_the_same_selection() {
        let writer = FilterState::new();
        let reader = writer.clone();

        writer.replace(FilterSelection::new().with(FilterField::Sector, "Sociedad"));
        assert_eq!(reader.snapshot().get(FilterField::Sector), ["Sociedad".to_string()]);

        writer.clear();
        assert!(reader.is_empty());
    }
}
