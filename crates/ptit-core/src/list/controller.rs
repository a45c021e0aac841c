// ── List controller ──
//
// Owns the view state for one list and derives the visible page from the
// current source snapshot. The derivation is pure: the same snapshot and
// view always produce the same page, and records are never mutated.

use std::sync::Arc;

use serde::Serialize;

use super::view::{FilterValue, PageSize, ViewState};
use crate::error::CoreError;
use crate::model::Listable;
use crate::store::Snapshot;

/// The slice of the filtered list currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisiblePage<T> {
    pub items: Vec<Arc<T>>,
    /// 1-based, always within `1..=total_pages`.
    pub page: usize,
    pub total_pages: usize,
    /// Records matching the search term and filters, across all pages.
    pub total_records: usize,
    /// 0-based index of the first item within the filtered list.
    pub range_start: usize,
    /// Exclusive end index within the filtered list.
    pub range_end: usize,
}

impl<T> VisiblePage<T> {
    /// 1-based inclusive bounds for a "Showing a-b of n" footer; `(0, 0)`
    /// when nothing matches.
    pub fn display_range(&self) -> (usize, usize) {
        if self.total_records == 0 {
            (0, 0)
        } else {
            (self.range_start + 1, self.range_end)
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

fn total_pages(total_records: usize, page_size: PageSize) -> usize {
    total_records.div_ceil(page_size.get()).max(1)
}

fn matches_search<T: Listable>(record: &T, needle: &str) -> bool {
    needle.is_empty()
        || record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

fn matches_filters<T: Listable>(record: &T, view: &ViewState) -> bool {
    view.filters
        .iter()
        .all(|(key, filter)| filter.matches(record.filter_value(key).as_deref()))
}

/// Search, filter and paginate over one entity type.
#[derive(Debug, Clone)]
pub struct ListController<T: Listable> {
    view: ViewState,
    source: Snapshot<T>,
}

impl<T: Listable> Default for ListController<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Listable> ListController<T> {
    pub fn new() -> Self {
        Self {
            view: ViewState::for_keys(T::FILTER_KEYS),
            source: Arc::new(Vec::new()),
        }
    }

    /// Start from an existing view, e.g. one restored from CLI flags.
    /// The page is clamped on the first `set_source`.
    pub fn with_view(view: ViewState) -> Result<Self, CoreError> {
        let mut controller = Self::new();
        for key in view.filters.keys() {
            check_filter_key::<T>(key)?;
        }
        controller.view.filters.extend(view.filters);
        controller.view.search_term = view.search_term;
        controller.view.page_size = view.page_size;
        controller.view.page = view.page.max(1);
        Ok(controller)
    }

    /// Records of `source` passing the search term and every filter, in
    /// source order, before pagination.
    pub fn matching<'a>(source: &'a [Arc<T>], view: &ViewState) -> Vec<&'a Arc<T>> {
        let needle = view.search_term.to_lowercase();
        source
            .iter()
            .filter(|r| matches_filters(r.as_ref(), view))
            .filter(|r| matches_search(r.as_ref(), &needle))
            .collect()
    }

    /// Derive the visible page for `source` under `view`.
    pub fn derive(source: &[Arc<T>], view: &ViewState) -> VisiblePage<T> {
        let matched = Self::matching(source, view);

        let size = view.page_size.get();
        let total_records = matched.len();
        let total_pages = total_pages(total_records, view.page_size);
        let page = view.page.clamp(1, total_pages);
        let range_start = (page - 1) * size;
        let range_end = (range_start + size).min(total_records);

        VisiblePage {
            items: matched[range_start.min(total_records)..range_end]
                .iter()
                .copied()
                .cloned()
                .collect(),
            page,
            total_pages,
            total_records,
            range_start,
            range_end,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn source(&self) -> &Snapshot<T> {
        &self.source
    }

    pub fn visible_page(&self) -> VisiblePage<T> {
        Self::derive(&self.source, &self.view)
    }

    /// Every record passing the current search and filters, unpaginated.
    pub fn filtered(&self) -> Vec<Arc<T>> {
        Self::matching(&self.source, &self.view)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn total_pages(&self) -> usize {
        self.visible_page().total_pages
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.view.search_term = term.into();
        self.view.page = 1;
    }

    /// Replace one filter predicate. Keys outside `T::FILTER_KEYS` are rejected.
    pub fn set_filter(&mut self, key: &str, value: FilterValue) -> Result<(), CoreError> {
        check_filter_key::<T>(key)?;
        self.view.filters.insert(key.to_owned(), value);
        self.view.page = 1;
        Ok(())
    }

    pub fn clear_filters(&mut self) {
        for value in self.view.filters.values_mut() {
            *value = FilterValue::All;
        }
        self.view.page = 1;
    }

    /// Jump to page `n`, clamped to the current page range. Returns the
    /// page actually selected.
    pub fn set_page(&mut self, n: usize) -> usize {
        self.view.page = n.clamp(1, self.total_pages());
        self.view.page
    }

    pub fn next_page(&mut self) -> usize {
        self.set_page(self.view.page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> usize {
        self.set_page(self.view.page.saturating_sub(1))
    }

    pub fn set_page_size(&mut self, size: usize) -> Result<(), CoreError> {
        self.view.page_size = PageSize::new(size)?;
        self.clamp_page();
        Ok(())
    }

    /// Swap in a new source snapshot (after a refresh or mutation).
    pub fn set_source(&mut self, source: Snapshot<T>) {
        self.source = source;
        self.clamp_page();
    }

    fn clamp_page(&mut self) {
        self.view.page = self.view.page.clamp(1, self.total_pages());
    }
}

fn check_filter_key<T: Listable>(key: &str) -> Result<(), CoreError> {
    if T::FILTER_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(CoreError::Validation {
            field: Some(key.to_owned()),
            message: format!(
                "unknown {} filter '{key}' (expected one of: {})",
                T::ENTITY_TYPE,
                T::FILTER_KEYS.join(", ")
            ),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::model::{AccountStatus, EntityId, Role, User};

    fn user(id: i64, username: &str, role: Role, status: AccountStatus) -> Arc<User> {
        Arc::new(User {
            id: EntityId::Number(id),
            username: username.into(),
            full_name: None,
            email: Some(format!("{username}@ptit.edu.vn")),
            role,
            status,
            created_at: None,
        })
    }

    fn twelve_users() -> Snapshot<User> {
        Arc::new(
            (1..=12)
                .map(|i| user(i, &format!("member{i:02}"), Role::User, AccountStatus::Active))
                .collect(),
        )
    }

    fn ids(page: &VisiblePage<User>) -> Vec<i64> {
        page.items.iter().filter_map(|u| u.id.as_number()).collect()
    }

    // ── Paging and search ──────────────────────────────────────────────

    #[test]
    fn twelve_records_paginate_and_clamp() {
        let mut list = ListController::<User>::new();
        list.set_source(twelve_users());

        let page = list.visible_page();
        assert_eq!(ids(&page), (1..=10).collect::<Vec<_>>());
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.display_range(), (1, 10));

        assert_eq!(list.set_page(5), 2);
        let page = list.visible_page();
        assert_eq!(ids(&page), vec![11, 12]);
        assert_eq!((page.range_start, page.range_end), (10, 12));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let mut records: Vec<Arc<User>> = twelve_users().iter().cloned().collect();
        records[3] = user(4, "SysAdmin", Role::User, AccountStatus::Active);
        let mut full_name = (*user(9, "ops", Role::User, AccountStatus::Active)).clone();
        full_name.full_name = Some("Admin Nguyen".into());
        records[8] = Arc::new(full_name);

        let mut list = ListController::<User>::new();
        list.set_source(Arc::new(records));
        list.set_search_term("admin");

        let page = list.visible_page();
        assert_eq!(page.total_records, 2);
        assert_eq!(page.total_pages, 1);
        assert_eq!(ids(&page), vec![4, 9]);
    }

    #[test]
    fn filters_and_together() {
        let mut list = ListController::<User>::new();
        list.set_source(Arc::new(vec![
            user(1, "a", Role::Admin, AccountStatus::Active),
            user(2, "b", Role::Admin, AccountStatus::Disabled),
            user(3, "c", Role::User, AccountStatus::Active),
        ]));

        list.set_filter("role", FilterValue::is("admin")).unwrap();
        list.set_filter("status", FilterValue::is("active")).unwrap();

        assert_eq!(ids(&list.visible_page()), vec![1]);

        list.clear_filters();
        assert_eq!(list.visible_page().total_records, 3);
    }

    #[test]
    fn filter_excludes_records_missing_the_value() {
        use crate::model::{Device, DeviceStatus};

        let device = |id: i64, device_type: Option<&str>| {
            Arc::new(Device {
                id: EntityId::Number(id),
                name: format!("node-{id}"),
                device_type: device_type.map(str::to_owned),
                location: None,
                mac_address: None,
                status: DeviceStatus::Active,
                created_at: None,
            })
        };
        let mut list = ListController::<Device>::new();
        list.set_source(Arc::new(vec![device(1, Some("sensor")), device(2, None)]));

        list.set_filter("device_type", FilterValue::is("sensor")).unwrap();
        let page = list.visible_page();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, EntityId::Number(1));

        list.set_filter("device_type", FilterValue::All).unwrap();
        assert_eq!(list.visible_page().total_records, 2);
    }

    // ── Edge cases ───────────────────────────────────────────────────

    #[test]
    fn empty_source_has_one_page() {
        let list = ListController::<User>::new();
        let page = list.visible_page();
        assert!(page.items.is_empty());
        assert_eq!((page.page, page.total_pages), (1, 1));
        assert_eq!(page.display_range(), (0, 0));
    }

    #[test]
    fn shrinking_source_clamps_page() {
        let mut list = ListController::<User>::new();
        list.set_source(twelve_users());
        list.set_page_size(5).unwrap();
        assert_eq!(list.set_page(3), 3);

        list.set_source(Arc::new(twelve_users()[..4].to_vec()));
        assert_eq!(list.view().page, 1);
    }

    #[test]
    fn unknown_filter_key_is_rejected() {
        let mut list = ListController::<User>::new();
        list.set_source(twelve_users());
        list.set_page(2);

        let err = list.set_filter("colour", FilterValue::is("red")).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert!(err.to_string().contains("role, status"));
        assert_eq!(list.view().page, 2);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut list = ListController::<User>::new();
        assert!(list.set_page_size(0).is_err());
        assert_eq!(list.view().page_size.get(), 10);
    }

    #[test]
    fn next_and_prev_stay_in_range() {
        let mut list = ListController::<User>::new();
        list.set_source(twelve_users());
        assert_eq!(list.prev_page(), 1);
        assert_eq!(list.next_page(), 2);
        assert_eq!(list.next_page(), 2);
    }

    // ── Properties ───────────────────────────────────────────────────

    fn arb_source() -> impl Strategy<Value = Vec<Arc<User>>> {
        prop::collection::vec(("[a-zA-Z]{1,8}", any::<bool>(), any::<bool>()), 0..60).prop_map(
            |rows| {
                rows.into_iter()
                    .enumerate()
                    .map(|(i, (name, admin, active))| {
                        user(
                            i64::try_from(i).unwrap_or_default(),
                            &name,
                            if admin { Role::Admin } else { Role::User },
                            if active {
                                AccountStatus::Active
                            } else {
                                AccountStatus::Disabled
                            },
                        )
                    })
                    .collect()
            },
        )
    }

    fn arb_view() -> impl Strategy<Value = ViewState> {
        (
            "[a-z]{0,2}",
            prop::option::of(prop_oneof![Just("admin"), Just("user")]),
            0usize..20,
            1usize..25,
        )
            .prop_map(|(term, role, page, size)| {
                let mut view = ViewState::for_keys(User::FILTER_KEYS);
                view.search_term = term;
                if let Some(role) = role {
                    view.filters.insert("role".into(), FilterValue::is(role));
                }
                view.page = page;
                view.page_size = PageSize::new(size).unwrap();
                view
            })
    }

    proptest! {
        #[test]
        fn page_never_exceeds_size_or_range(source in arb_source(), view in arb_view()) {
            let page = ListController::derive(&source, &view);
            prop_assert!(page.items.len() <= view.page_size.get());
            prop_assert!(page.page >= 1 && page.page <= page.total_pages);
            prop_assert!(page.range_end <= page.total_records);
        }

        #[test]
        fn derive_is_idempotent(source in arb_source(), view in arb_view()) {
            prop_assert_eq!(
                ListController::derive(&source, &view),
                ListController::derive(&source, &view)
            );
        }

        #[test]
        fn search_and_filter_reset_page(source in arb_source(), term in "[a-z]{0,3}", page in 1usize..10) {
            let mut list = ListController::<User>::new();
            list.set_source(Arc::new(source));
            list.set_page_size(5).unwrap();
            list.set_page(page);
            list.set_search_term(term);
            prop_assert_eq!(list.view().page, 1);

            list.set_page(page);
            list.set_filter("status", FilterValue::is("active")).unwrap();
            prop_assert_eq!(list.view().page, 1);
        }

        #[test]
        fn page_size_round_trip(source in arb_source(), view in arb_view()) {
            let mut twice = ListController::<User>::with_view(view.clone()).unwrap();
            twice.set_source(Arc::new(source.clone()));
            twice.set_page_size(20).unwrap();
            twice.set_page_size(10).unwrap();

            let mut once = ListController::<User>::with_view(view).unwrap();
            once.set_source(Arc::new(source));
            once.set_page_size(10).unwrap();

            prop_assert_eq!(twice.view().page_size, once.view().page_size);
            // The intermediate size may clamp the page, so only the size round-trips.
            let page = twice.visible_page();
            prop_assert!(page.page >= 1 && page.page <= page.total_pages);
            prop_assert!(page.items.len() <= 10);
        }
    }
}
