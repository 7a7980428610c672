//! Offset pagination over a materialized list.

use super::{PageRequest, Pagination};

/// Slice one page out of an already sorted list.
///
/// A page past the end is an empty slice.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> (Vec<T>, Pagination) {
    let total = items.len();
    let pagination = request.describe(total as u64);

    let start = usize::try_from(request.offset()).unwrap_or(usize::MAX).min(total);
    let end = start.saturating_add(request.limit as usize).min(total);

    let page = items.into_iter().skip(start).take(end - start).collect();
    (page, pagination)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn items() -> Vec<u32> {
        (1..=57).collect()
    }

    #[test]
    fn fifty_seven_rows_in_pages_of_twenty_five() {
        let (rows, p) = paginate(items(), PageRequest::new(Some(1), Some(25)));
        assert_eq!(rows.len(), 25);
        assert_eq!(rows[0], 1);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_more);

        let (rows, p) = paginate(items(), PageRequest::new(Some(3), Some(25)));
        assert_eq!(rows, (51..=57).collect::<Vec<_>>());
        assert!(!p.has_more);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let (rows, p) = paginate(items(), PageRequest::new(Some(4), Some(25)));
        assert!(rows.is_empty());
        assert_eq!(p.total_count, 57);
        assert_eq!(p.page, 4);
    }

    #[test]
    fn empty_list_has_no_pages() {
        let (rows, p) = paginate(Vec::<u32>::new(), PageRequest::default());
        assert!(rows.is_empty());
        assert_eq!(p.total_pages, 0);
    }
}
