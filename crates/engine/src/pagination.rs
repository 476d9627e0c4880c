//! Page and window arithmetic
//!
//! Pure functions over counts and ranks. Backends evaluate them inside one
//! snapshot; the leaderboard service uses them for its own bookkeeping.

use crate::types::Rank;

/// Inclusive 1-based rank interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankWindow {
    pub start: Rank,
    pub end: Rank,
}

impl RankWindow {
    /// `page_size` ranks starting at `start`
    pub fn starting_at(start: Rank, page_size: u64) -> Self {
        let start = start.max(1);
        Self {
            start,
            end: start.saturating_add(page_size.saturating_sub(1)),
        }
    }
}

/// `ceil(count / page_size)`; zero members means zero pages
pub fn total_pages(count: u64, page_size: u64) -> u64 {
    count.div_ceil(page_size)
}

/// Window for the requested page after clamping it into `[1, total_pages]`.
/// `None` when the board is empty.
pub fn leaders_window(count: u64, page: u64, page_size: u64) -> Option<RankWindow> {
    let pages = total_pages(count, page_size);
    if pages == 0 {
        return None;
    }
    let page = page.clamp(1, pages);
    let start = (page - 1).saturating_mul(page_size).saturating_add(1);
    Some(RankWindow::starting_at(start, page_size))
}

/// Window of `page_size` ranks with `rank` roughly centered.
///
/// Near the top the window is pinned to rank 1 and keeps its full size; near
/// the bottom it is not shifted up, so the backend returns fewer entries.
pub fn around_window(rank: Rank, page_size: u64) -> RankWindow {
    RankWindow::starting_at(rank.saturating_sub(page_size / 2), page_size)
}

/// Page holding absolute `position` and the 0-based offset within that page
pub fn page_position(position: Rank, page_size: u64) -> (u64, usize) {
    let page = position.div_ceil(page_size);
    let offset = (position.saturating_sub(1) % page_size) as usize;
    (page, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(4, 2), 2);
    }

    #[test]
    fn test_leaders_window_clamps_page() {
        assert_eq!(leaders_window(0, 1, 10), None);
        assert_eq!(
            leaders_window(25, 0, 10),
            Some(RankWindow { start: 1, end: 10 })
        );
        assert_eq!(
            leaders_window(25, 2, 10),
            Some(RankWindow { start: 11, end: 20 })
        );
        // Past the end clamps to the last page
        assert_eq!(
            leaders_window(25, 99, 10),
            Some(RankWindow { start: 21, end: 30 })
        );
    }

    #[test]
    fn test_around_window() {
        assert_eq!(around_window(1, 4), RankWindow { start: 1, end: 4 });
        assert_eq!(around_window(2, 4), RankWindow { start: 1, end: 4 });
        assert_eq!(around_window(10, 4), RankWindow { start: 8, end: 11 });
        assert_eq!(around_window(10, 5), RankWindow { start: 8, end: 12 });
        assert_eq!(around_window(3, 1), RankWindow { start: 3, end: 3 });
    }

    #[test]
    fn test_page_position() {
        assert_eq!(page_position(1, 2), (1, 0));
        assert_eq!(page_position(3, 2), (2, 0));
        assert_eq!(page_position(4, 2), (2, 1));
        assert_eq!(page_position(25, 10), (3, 4));
    }

    #[test]
    fn test_window_saturates_at_u64_max() {
        let window = RankWindow::starting_at(u64::MAX - 1, 10);
        assert_eq!(window.end, u64::MAX);
        assert_eq!(leaders_window(u64::MAX, u64::MAX, 2).map(|w| w.end), Some(u64::MAX));
    }
}
