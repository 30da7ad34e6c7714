//! Render-ready projection of the thread history
//!
//! Everything here is a pure function of its inputs: no locks, no I/O, no
//! failure modes. The controller calls into it with a snapshot of its state.

use invoice_types::{SidebarPosition, Thread, ThreadId};

/// One row of the history list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRow {
    pub id: ThreadId,
    pub display_name: String,
    pub created_at_label: String,
    pub is_active: bool,
    pub is_editing: bool,
}

/// What the list area should show besides (or instead of) rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStatus {
    /// First fetch still in flight
    Loading,
    /// Nothing was ever loaded and the last fetch failed
    Failed,
    /// The store has no threads yet
    Empty,
    /// Threads exist but none match the search query
    NoMatches,
    Ready,
}

impl ListStatus {
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            ListStatus::Loading => Some("Loading..."),
            ListStatus::Failed => Some("Failed to load"),
            ListStatus::Empty => Some("Empty history"),
            ListStatus::NoMatches => Some("No matches"),
            ListStatus::Ready => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadListView {
    pub rows: Vec<ThreadRow>,
    pub status: ListStatus,
    /// Inline banner for the most recent failed fetch
    pub error: Option<String>,
    /// Pending rename text for the row being edited
    pub edit_buffer: Option<String>,
}

/// Sidebar geometry exported to sibling layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarLayout {
    pub collapsed: bool,
    pub width: String,
    pub position: SidebarPosition,
}

impl SidebarLayout {
    pub const WIDTH_VARIABLE: &'static str = "--sidebar-width";

    pub fn css_variable(&self) -> (&'static str, &str) {
        (Self::WIDTH_VARIABLE, &self.width)
    }
}

/// Case-insensitive substring match on the committed name
///
/// An empty query matches every thread; unnamed threads never match
/// anything else.
pub fn matches_query(thread: &Thread, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    thread
        .name()
        .is_some_and(|name| name.to_lowercase().contains(&query.to_lowercase()))
}

/// Filtered rows in store order
pub fn project(
    threads: &[Thread],
    query: &str,
    active: Option<&ThreadId>,
    editing: Option<&ThreadId>,
) -> Vec<ThreadRow> {
    threads
        .iter()
        .filter(|thread| matches_query(thread, query))
        .map(|thread| ThreadRow {
            id: thread.id.clone(),
            display_name: thread.display_name().to_string(),
            created_at_label: thread.created_at_label(),
            is_active: active == Some(&thread.id),
            is_editing: editing == Some(&thread.id),
        })
        .collect()
}

pub fn list_status(
    rows: &[ThreadRow],
    total_threads: usize,
    loaded: bool,
    loading: bool,
    fetch_failed: bool,
) -> ListStatus {
    if !rows.is_empty() {
        ListStatus::Ready
    } else if !loaded && loading {
        ListStatus::Loading
    } else if !loaded && fetch_failed {
        ListStatus::Failed
    } else if total_threads == 0 {
        ListStatus::Empty
    } else {
        ListStatus::NoMatches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn thread(id: &str, name: Option<&str>) -> Thread {
        let created = Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap();
        let thread = Thread::new(id, created);
        match name {
            Some(name) => thread.with_name(name),
            None => thread,
        }
    }

    fn ids(rows: &[ThreadRow]) -> Vec<&str> {
        rows.iter().map(|row| row.id.as_str()).collect()
    }

    #[test]
    fn test_query_filters_case_insensitively() {
        let threads = vec![thread("1", Some("Acme Invoice")), thread("2", Some("Bolt Corp"))];

        let rows = project(&threads, "acme", None, None);
        assert_eq!(ids(&rows), vec!["1"]);
        assert_eq!(rows[0].display_name, "Acme Invoice");

        assert_eq!(ids(&project(&threads, "CORP", None, None)), vec!["2"]);
    }

    #[test]
    fn test_empty_query_keeps_everything_in_store_order() {
        let threads = vec![
            thread("b", Some("Zulu")),
            thread("a", None),
            thread("c", Some("Alpha")),
        ];

        let rows = project(&threads, "", None, None);
        assert_eq!(ids(&rows), vec!["b", "a", "c"]);
        assert_eq!(rows[1].display_name, "Untitled Invoice");
    }

    #[test]
    fn test_unnamed_threads_never_match_a_query() {
        let threads = vec![thread("1", None), thread("2", Some(""))];

        assert!(project(&threads, "untitled", None, None).is_empty());
        assert!(project(&threads, "u", None, None).is_empty());
    }

    #[test]
    fn test_active_and_editing_flags() {
        let threads = vec![thread("1", Some("One")), thread("2", Some("Two"))];
        let active = ThreadId::new("2");
        let editing = ThreadId::new("1");

        let rows = project(&threads, "", Some(&active), Some(&editing));
        assert_eq!(
            rows.iter().map(|r| (r.is_active, r.is_editing)).collect::<Vec<_>>(),
            vec![(false, true), (true, false)]
        );
        assert_eq!(rows[0].created_at_label, "Oct 14");
    }

    #[test]
    fn test_list_status_distinguishes_empty_from_no_matches() {
        let threads = vec![thread("1", Some("Acme"))];
        let no_rows = project(&threads, "zzz", None, None);

        assert_eq!(list_status(&no_rows, 1, true, false, false), ListStatus::NoMatches);
        assert_eq!(list_status(&[], 0, true, false, false), ListStatus::Empty);
        assert_eq!(list_status(&[], 0, false, true, false), ListStatus::Loading);
        assert_eq!(list_status(&[], 0, false, false, true), ListStatus::Failed);
        assert_eq!(ListStatus::NoMatches.placeholder(), Some("No matches"));
        assert_eq!(ListStatus::Empty.placeholder(), Some("Empty history"));
    }

    #[test]
    fn test_sidebar_css_variable() {
        let layout = SidebarLayout {
            collapsed: true,
            width: "4rem".to_string(),
            position: SidebarPosition::Left,
        };
        assert_eq!(layout.css_variable(), ("--sidebar-width", "4rem"));
    }
}
