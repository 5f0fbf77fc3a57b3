//! Total-count inference for stores that omit `totalElements`.
//!
//! # Invariants
//! - A reported total is used verbatim.
//! - A short page is final: the total is exact.
//! - A full page claims exactly one more record, never more.

/// Returns the total record count to display for one fetched page.
pub fn estimate_total(
    page_index: u32,
    page_size: u32,
    received: usize,
    total_elements: Option<u64>,
) -> u64 {
    if let Some(total) = total_elements {
        return total;
    }

    let window_start = u64::from(page_index) * u64::from(page_size);
    let received = received as u64;
    if received < u64::from(page_size) {
        window_start + received
    } else {
        window_start + u64::from(page_size) + 1
    }
}

/// Number of pages needed to show `total` records.
pub fn page_count(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size))
}
