//! Page arithmetic for collection views.

/// Items per page served by the catalog.
pub const PAGE_SIZE: u64 = 10;

/// Total number of pages for a collection of `count` items.
pub fn total_pages(count: u64) -> u32 {
  u32::try_from(count.div_ceil(PAGE_SIZE)).unwrap_or(u32::MAX)
}

/// Pages shown around the current one: one before and one after, clipped to
/// `1..=total`.
pub fn page_window(current: u32, total: u32) -> Vec<u32> {
  const DELTA: u32 = 1;
  let start = current.saturating_sub(DELTA).max(1);
  let end = current.saturating_add(DELTA).min(total);
  (start..=end).collect()
}

/// Accept `page` only if it's a real page. Anything else is ignored by the
/// caller.
pub fn checked_page(page: u32, total: u32) -> Option<u32> {
  if page > 0 && page <= total {
    Some(page)
  } else {
    None
  }
}

/// Parse typed page input: digits without a leading zero.
pub fn parse_page_input(input: &str) -> Option<u32> {
  let mut chars = input.chars();
  match chars.next() {
    Some('1'..='9') if chars.all(|c| c.is_ascii_digit()) => input.parse().ok(),
    _ => None,
  }
}
