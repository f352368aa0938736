//! Search, category filter, recency sort and fixed-size pagination over an
//! already-fetched collection.
//!
//! One implementation serves every list view. A view describes its records
//! with a `ListSpec` (which fields are searchable, which field is the
//! category, which timestamp orders the list) and holds its own `ViewState`.

use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{SessionRecord, User};

/// Rows per page in the Users and Sessions views.
pub const DEFAULT_PAGE_SIZE: usize = 8;

/// Category filter value that lets every record through.
pub const ALL: &str = "all";

/// Search term, category filter and current page of one view.
///
/// Changing the term or the filter sends the view back to page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    search: String,
    filter: String,
    page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search: String::new(),
            filter: ALL.to_string(),
            page: 1,
        }
    }
}

impl ViewState {
    /// Build from request parameters. Absent values take their defaults.
    pub fn from_params(search: Option<String>, filter: Option<String>, page: Option<usize>) -> Self {
        let mut state = Self::default();
        if let Some(term) = search {
            state.set_search(term);
        }
        if let Some(filter) = filter.filter(|f| !f.trim().is_empty()) {
            state.set_filter(filter);
        }
        if let Some(page) = page {
            state.set_page(page);
        }
        state
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.page = 1;
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }
}

/// How a list view reads its records.
pub struct ListSpec<T> {
    pub search_fields: for<'a> fn(&'a T) -> Vec<Cow<'a, str>>,
    pub category: Option<for<'a> fn(&'a T) -> Cow<'a, str>>,
    pub recency: fn(&T) -> DateTime<Utc>,
    pub page_size: usize,
}

/// One page of a filtered, sorted collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    /// Records that survived the filters, across all pages.
    pub total: usize,
}

/// `max(1, ceil(total / page_size))`.
pub fn page_count(total: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    total.div_ceil(page_size).max(1)
}

/// True when any searchable field contains `term` (case-insensitive) and the
/// category filter is `all`, blank, or equal to the record's category.
pub fn matches<T>(item: &T, term: &str, filter: &str, spec: &ListSpec<T>) -> bool {
    let needle = term.to_lowercase();
    let matches_search = needle.is_empty()
        || (spec.search_fields)(item)
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));

    let filter = filter.trim();
    let matches_category = match spec.category {
        Some(category) if !filter.is_empty() && !filter.eq_ignore_ascii_case(ALL) => {
            category(item).eq_ignore_ascii_case(filter)
        }
        _ => true,
    };

    matches_search && matches_category
}

/// Matching records, newest first. Ties keep their input order.
pub fn filter_sorted<'a, T>(
    items: &'a [T],
    term: &str,
    filter: &str,
    spec: &ListSpec<T>,
) -> Vec<&'a T> {
    let mut filtered: Vec<&T> = items
        .iter()
        .filter(|item| matches(*item, term, filter, spec))
        .collect();
    filtered.sort_by(|a, b| (spec.recency)(b).cmp(&(spec.recency)(a)));
    filtered
}

/// Slice `items` into the requested page, clamping the page into `1..=page_count`.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total = items.len();
    let page_count = page_count(total, page_size);
    let page = page.clamp(1, page_count);

    let items = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        items,
        page,
        page_count,
        page_size,
        total,
    }
}

/// Filter, sort and paginate `items` for the given view state.
pub fn apply<T: Clone>(items: &[T], state: &ViewState, spec: &ListSpec<T>) -> Page<T> {
    let filtered: Vec<T> = filter_sorted(items, state.search(), state.filter(), spec)
        .into_iter()
        .cloned()
        .collect();
    paginate(filtered, state.page(), spec.page_size)
}

// ============================================================================
// Users view
// ============================================================================

/// A user with the number of sessions recorded against their phone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRow {
    #[serde(flatten)]
    pub user: User,
    pub session_count: usize,
}

pub fn user_rows(users: Vec<User>, sessions: &[SessionRecord]) -> Vec<UserRow> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for s in sessions {
        if let Some(phone) = s.session.user_phone.as_deref() {
            *counts.entry(phone).or_default() += 1;
        }
    }
    users
        .into_iter()
        .map(|user| {
            let session_count = counts.get(user.phone.as_str()).copied().unwrap_or(0);
            UserRow {
                user,
                session_count,
            }
        })
        .collect()
}

fn user_search_fields(row: &UserRow) -> Vec<Cow<'_, str>> {
    let mut fields = vec![
        Cow::Borrowed(row.user.name.as_str()),
        Cow::Borrowed(row.user.phone.as_str()),
    ];
    if let Some(email) = &row.user.email {
        fields.push(Cow::Borrowed(email.as_str()));
    }
    fields
}

fn user_recency(row: &UserRow) -> DateTime<Utc> {
    row.user.created_at
}

/// Users: search name, phone and email; no category; newest account first.
pub fn users_spec(page_size: usize) -> ListSpec<UserRow> {
    ListSpec {
        search_fields: user_search_fields,
        category: None,
        recency: user_recency,
        page_size,
    }
}

// ============================================================================
// Sessions view
// ============================================================================

fn session_search_fields(record: &SessionRecord) -> Vec<Cow<'_, str>> {
    let mut fields = vec![Cow::Owned(record.session.id.to_string())];
    if let Some(phone) = &record.session.user_phone {
        fields.push(Cow::Borrowed(phone.as_str()));
    }
    if let Some(user) = &record.user {
        fields.push(Cow::Borrowed(user.name.as_str()));
    }
    fields
}

fn session_status(record: &SessionRecord) -> Cow<'_, str> {
    Cow::Borrowed(record.session.status.as_str())
}

fn session_recency(record: &SessionRecord) -> DateTime<Utc> {
    record.session.start_time
}

/// Sessions: search id, phone and user name; filter on status; newest start first.
pub fn sessions_spec(page_size: usize) -> ListSpec<SessionRecord> {
    ListSpec {
        search_fields: session_search_fields,
        category: Some(session_status),
        recency: session_recency,
        page_size,
    }
}
