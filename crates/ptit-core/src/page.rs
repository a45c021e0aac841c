// ── Resource page ──
//
// One managed list screen: a source collection, the list controller that
// views it, and the orchestrator that mutates it. Dropping the page
// detaches the orchestrator so late results are discarded.

use std::sync::Arc;

use tokio::sync::watch;

use crate::backend::ListBackend;
use crate::crud::CrudOrchestrator;
use crate::error::CoreError;
use crate::list::{ListController, ViewState, VisiblePage};
use crate::model::Listable;
use crate::store::{EntityCollection, Snapshot};

pub struct ResourcePage<T: Listable, B: ListBackend<T>> {
    list: ListController<T>,
    orchestrator: CrudOrchestrator<T, B>,
    source: watch::Receiver<Snapshot<T>>,
}

impl<T: Listable, B: ListBackend<T>> ResourcePage<T, B> {
    pub fn new(backend: B) -> Self {
        let collection = Arc::new(EntityCollection::new());
        let source = collection.subscribe();
        Self {
            list: ListController::new(),
            orchestrator: CrudOrchestrator::new(backend, collection),
            source,
        }
    }

    /// Start with a restored view (search term, filters, page).
    pub fn with_view(backend: B, view: ViewState) -> Result<Self, CoreError> {
        let mut page = Self::new(backend);
        page.list = ListController::with_view(view)?;
        Ok(page)
    }

    /// Fetch the source collection and sync the list view to it.
    pub async fn load(&mut self) -> Result<usize, CoreError> {
        let count = self.orchestrator.refresh().await?;
        self.sync();
        Ok(count)
    }

    /// Pull the latest snapshot into the list controller if it changed.
    pub fn sync(&mut self) -> bool {
        if !self.source.has_changed().unwrap_or(false) {
            return false;
        }
        let snapshot = self.source.borrow_and_update().clone();
        self.list.set_source(snapshot);
        true
    }

    pub fn visible_page(&mut self) -> VisiblePage<T> {
        self.sync();
        self.list.visible_page()
    }

    pub fn list(&self) -> &ListController<T> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListController<T> {
        &mut self.list
    }

    pub fn orchestrator(&self) -> &CrudOrchestrator<T, B> {
        &self.orchestrator
    }
}

impl<T: Listable, B: ListBackend<T>> Drop for ResourcePage<T, B> {
    fn drop(&mut self) {
        self.orchestrator.detach();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::backend::MemoryBackend;
    use crate::list::FilterValue;
    use crate::model::{Device, DeviceStatus, EntityId, NewDevice};

    fn device(id: i64, name: &str, status: DeviceStatus) -> Device {
        Device {
            id: EntityId::Number(id),
            name: name.into(),
            device_type: Some("sensor".into()),
            location: Some("Lab A2".into()),
            mac_address: None,
            status,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn mutations_flow_into_the_visible_page() {
        let seed = (1..=11).map(|i| device(i, &format!("node-{i}"), DeviceStatus::Active));
        let mut page = ResourcePage::new(MemoryBackend::new(seed));
        assert_eq!(page.load().await.unwrap(), 11);
        assert_eq!(page.visible_page().total_pages, 2);

        page.list_mut().set_page(2);
        assert_eq!(page.visible_page().items.len(), 1);

        let confirmation = page.orchestrator().request_delete(&EntityId::Number(11));
        page.orchestrator().submit_delete(confirmation).await.unwrap();

        let visible = page.visible_page();
        assert_eq!(visible.page, 1);
        assert_eq!(visible.total_records, 10);

        page.orchestrator()
            .submit_create(&NewDevice {
                name: "gateway-1".into(),
                device_type: "gateway".into(),
                ..NewDevice::default()
            })
            .await
            .unwrap();
        page.list_mut()
            .set_filter("device_type", FilterValue::is("gateway"))
            .unwrap();
        let visible = page.visible_page();
        assert_eq!(visible.total_records, 1);
        assert_eq!(visible.items[0].name, "gateway-1");
    }
}
