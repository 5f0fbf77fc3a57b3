//! List state: the loaded page, its sort rule and text filter.
//!
//! # Responsibility
//! - Store page entries keyed by store id, or by a client key while tentative.
//! - Rebuild wholesale on page fetch and expose single-entry edits to the engine.
//! - Derive the filtered view.
//!
//! # Invariants
//! - A tentative entry never carries a store id.
//! - Entries stay in sort order except while an optimistic edit is unsettled.
//! - A failed fetch keeps the previous entries.

use crate::config::{normalize_page_size, PriorityOrder};
use crate::list::estimator::{estimate_total, page_count};
use crate::model::task::{TaskId, TaskRecord};
use crate::store::PageResponse;
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use uuid::Uuid;

/// Identity of one list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKey {
    /// Acknowledged by the store.
    Persisted(TaskId),
    /// Pending create; client-local key only.
    Tentative(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub key: EntryKey,
    pub record: TaskRecord,
}

impl ListEntry {
    /// Entry for a store record. Records without id are treated as tentative.
    pub fn from_record(record: TaskRecord) -> Self {
        let key = match record.id {
            Some(id) => EntryKey::Persisted(id),
            None => EntryKey::Tentative(Uuid::new_v4()),
        };
        Self { key, record }
    }

    pub fn is_tentative(&self) -> bool {
        matches!(self.key, EntryKey::Tentative(_))
    }
}

/// Default ordering: newest first, then most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortRule {
    pub priority_order: PriorityOrder,
}

impl SortRule {
    pub fn compare(&self, left: &TaskRecord, right: &TaskRecord) -> Ordering {
        // Missing timestamps sort after every dated record.
        let by_created = match (left.created_at, right.created_at) {
            (Some(l), Some(r)) => r.cmp(&l),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_created.then_with(|| {
            self.priority_order
                .urgency_key(left.priority)
                .cmp(&self.priority_order.urgency_key(right.priority))
        })
    }
}

/// Case-insensitive literal match over the searchable record fields.
#[derive(Debug, Clone, Default)]
struct TextFilter {
    text: String,
    pattern: Option<Regex>,
}

impl TextFilter {
    fn new(text: &str) -> Self {
        let text = text.trim().to_string();
        let pattern = if text.is_empty() {
            None
        } else {
            RegexBuilder::new(&regex::escape(&text))
                .case_insensitive(true)
                .build()
                .ok()
        };
        Self { text, pattern }
    }

    fn matches(&self, record: &TaskRecord, priority_order: PriorityOrder) -> bool {
        if self.text.is_empty() {
            return true;
        }
        let created = record
            .created_at
            .map(|at| at.format("%Y-%m-%d").to_string());
        let fields = [
            Some(record.title.as_str()),
            record.description.as_deref(),
            Some(record.status.label()),
            Some(priority_order.label(record.priority)),
            created.as_deref(),
        ];
        let matched = fields
            .into_iter()
            .flatten()
            .any(|field| self.field_matches(field));
        matched
    }

    fn field_matches(&self, field: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.is_match(field),
            None => field.to_lowercase().contains(&self.text.to_lowercase()),
        }
    }
}

/// Paginated, sorted, filterable window of task records.
#[derive(Debug, Clone)]
pub struct ListState {
    entries: Vec<ListEntry>,
    page_index: u32,
    page_size: u32,
    total_estimate: u64,
    filter: TextFilter,
    sort_rule: SortRule,
    loading: bool,
    load_error: Option<String>,
}

impl PartialEq for ListState {
    /// Compares the observable state; the compiled filter is derived from its text.
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
            && self.page_index == other.page_index
            && self.page_size == other.page_size
            && self.total_estimate == other.total_estimate
            && self.filter.text == other.filter.text
            && self.sort_rule == other.sort_rule
            && self.loading == other.loading
            && self.load_error == other.load_error
    }
}

impl ListState {
    pub fn new(page_size: u32, sort_rule: SortRule) -> Self {
        Self {
            entries: Vec::new(),
            page_index: 0,
            page_size,
            total_estimate: 0,
            filter: TextFilter::default(),
            sort_rule,
            loading: false,
            load_error: None,
        }
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    /// All loaded records, ignoring the filter.
    pub fn items(&self) -> impl Iterator<Item = &TaskRecord> {
        self.entries.iter().map(|entry| &entry.record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_estimate(&self) -> u64 {
        self.total_estimate
    }

    pub fn page_count(&self) -> u64 {
        page_count(self.total_estimate, self.page_size)
    }

    pub fn has_next_page(&self) -> bool {
        u64::from(self.page_index) + 1 < self.page_count()
    }

    pub fn filter_text(&self) -> &str {
        &self.filter.text
    }

    pub fn sort_rule(&self) -> SortRule {
        self.sort_rule
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed fetch, cleared by the next successful one.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn get(&self, id: TaskId) -> Option<&TaskRecord> {
        self.position_of(EntryKey::Persisted(id))
            .map(|index| &self.entries[index].record)
    }

    /// Loaded records matching the filter, in list order.
    pub fn view(&self) -> Vec<&TaskRecord> {
        let priority_order = self.sort_rule.priority_order;
        self.items()
            .filter(|record| self.filter.matches(record, priority_order))
            .collect()
    }

    pub fn set_filter(&mut self, text: &str) {
        self.filter = TextFilter::new(text);
    }

    pub(crate) fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size;
    }

    pub(crate) fn mark_loading(&mut self) {
        self.loading = true;
    }

    pub(crate) fn mark_load_failed(&mut self, message: String) {
        self.loading = false;
        self.load_error = Some(message);
    }

    /// Replaces the window with a fetched page and recomputes the estimate.
    ///
    /// `page`/`size` echoes in the response override the requested cursor.
    pub(crate) fn replace_page(
        &mut self,
        requested_index: u32,
        requested_size: u32,
        response: PageResponse,
    ) {
        self.page_index = response.page.unwrap_or(requested_index);
        self.page_size = normalize_page_size(response.size.unwrap_or(requested_size));
        self.total_estimate = estimate_total(
            self.page_index,
            self.page_size,
            response.content.len(),
            response.total_elements,
        );
        self.entries = response
            .content
            .into_iter()
            .map(ListEntry::from_record)
            .collect();
        self.loading = false;
        self.load_error = None;
        self.resort();
    }

    pub(crate) fn position_of(&self, key: EntryKey) -> Option<usize> {
        self.entries.iter().position(|entry| entry.key == key)
    }

    pub(crate) fn record_mut(&mut self, index: usize) -> &mut TaskRecord {
        &mut self.entries[index].record
    }

    /// Appends a tentative entry and returns its client key.
    pub(crate) fn push_tentative(&mut self, record: TaskRecord) -> Uuid {
        let key = Uuid::new_v4();
        self.entries.push(ListEntry {
            key: EntryKey::Tentative(key),
            record,
        });
        key
    }

    pub(crate) fn replace_at(&mut self, index: usize, entry: ListEntry) {
        self.entries[index] = entry;
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> ListEntry {
        self.entries.remove(index)
    }

    pub(crate) fn increment_total(&mut self) {
        self.total_estimate = self.total_estimate.saturating_add(1);
    }

    pub(crate) fn decrement_total(&mut self) {
        self.total_estimate = self.total_estimate.saturating_sub(1);
    }

    /// Stable sort by the list's sort rule.
    pub(crate) fn resort(&mut self) {
        let rule = self.sort_rule;
        self.entries
            .sort_by(|left, right| rule.compare(&left.record, &right.record));
    }
}
