// ABOUTME: Builds the line to pixel offset table from a laid-out rendered tree
// ABOUTME: Lines without a stamped node inherit the offset of the nearest line above

use parallax_core::RenderedSurface;
use parallax_events::preview::Event as PreviewEvent;
use parallax_logging::{PerfTimer, debug, trace};
use parallax_types::{AnchorTable, RefreshTrigger};
use std::collections::HashMap;

/// Build an anchor table for `line_count` source lines.
///
/// The first stamped node seen for a line decides its offset. Stamps that
/// are not line numbers, or that point past the last line, are ignored.
/// Offsets never decrease from one line to the next.
pub fn recompute(surface: &impl RenderedSurface, line_count: usize) -> AnchorTable {
    recompute_counted(surface, line_count).0
}

fn recompute_counted(surface: &impl RenderedSurface, line_count: usize) -> (AnchorTable, usize) {
    if line_count == 0 {
        return (AnchorTable::empty(), 0);
    }
    let _timer = PerfTimer::new("anchor_recompute");

    let mut first_offset: HashMap<usize, f32> = HashMap::new();
    for (stamp, top) in surface.stamped_offsets() {
        let Ok(line) = stamp.trim().parse::<usize>() else {
            trace!(stamp = %stamp, "Ignoring non-numeric line stamp");
            continue;
        };
        if (1..=line_count).contains(&line) {
            first_offset.entry(line).or_insert(top);
        }
    }

    let mut offsets = Vec::with_capacity(line_count);
    let mut last_known = 0.0_f32;
    for line in 1..=line_count {
        if let Some(top) = first_offset.get(&line) {
            last_known = top.max(last_known);
        }
        offsets.push(last_known);
    }

    (AnchorTable::from_offsets(offsets), first_offset.len())
}

/// Holds the current anchor table and rebuilds it on request
#[derive(Debug, Default)]
pub struct AnchorIndex {
    table: AnchorTable,
    anchored_lines: usize,
}

impl AnchorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &AnchorTable {
        &self.table
    }

    /// Number of lines that had a stamped node in the last rebuild.
    pub fn anchored_lines(&self) -> usize {
        self.anchored_lines
    }

    /// Rebuild from `surface` and describe what happened.
    pub fn refresh(
        &mut self,
        surface: &impl RenderedSurface,
        line_count: usize,
        trigger: Option<RefreshTrigger>,
    ) -> PreviewEvent {
        let (table, anchored_lines) = recompute_counted(surface, line_count);
        debug!(
            line_count,
            anchored_lines,
            trigger = ?trigger,
            "Anchors recomputed"
        );
        self.table = table;
        self.anchored_lines = anchored_lines;
        PreviewEvent::AnchorsRecomputed {
            trigger,
            line_count,
            anchored_lines,
        }
    }

    pub fn clear(&mut self) {
        self.table = AnchorTable::empty();
        self.anchored_lines = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stamps(Vec<(&'static str, f32)>);

    impl RenderedSurface for Stamps {
        fn stamped_offsets(&self) -> Vec<(String, f32)> {
            self.0.iter().map(|(s, top)| (s.to_string(), *top)).collect()
        }
    }

    #[test]
    fn test_carry_forward_and_default() {
        let surface = Stamps(vec![("2", 40.0), ("5", 120.0)]);
        let table = recompute(&surface, 6);
        assert_eq!(table.as_slice(), &[0.0, 40.0, 40.0, 40.0, 120.0, 120.0]);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let surface = Stamps(vec![("1", 0.0), ("3", 50.0), ("3", 90.0)]);
        let table = recompute(&surface, 3);
        assert_eq!(table.get(2), Some(50.0));
    }

    #[test]
    fn test_ignores_invalid_stamps() {
        let surface = Stamps(vec![("abc", 10.0), ("", 20.0), ("0", 30.0), ("9", 40.0), ("2", 15.0)]);
        let table = recompute(&surface, 3);
        assert_eq!(table.as_slice(), &[0.0, 15.0, 15.0]);
    }

    #[test]
    fn test_empty_document() {
        let surface = Stamps(vec![("1", 10.0)]);
        assert!(recompute(&surface, 0).is_empty());
    }

    #[test]
    fn test_offsets_never_decrease() {
        let surface = Stamps(vec![("1", 100.0), ("2", 20.0), ("3", 300.0)]);
        let table = recompute(&surface, 3);
        assert_eq!(table.as_slice(), &[100.0, 100.0, 300.0]);
    }

    #[test]
    fn test_large_document_mapping() {
        let surface = Stamps(vec![("1", 0.0), ("50", 2000.0)]);
        let table = recompute(&surface, 80);
        assert_eq!(table.len(), 80);
        assert!(table.iter().take(49).all(|offset| offset == 0.0));
        assert!(table.iter().skip(49).all(|offset| offset == 2000.0));
    }

    #[test]
    fn test_refresh_reports_event() {
        let mut index = AnchorIndex::new();
        let event = index.refresh(
            &Stamps(vec![("1", 0.0), ("3", 48.0)]),
            4,
            Some(RefreshTrigger::Resize),
        );
        assert_eq!(
            event,
            PreviewEvent::AnchorsRecomputed {
                trigger: Some(RefreshTrigger::Resize),
                line_count: 4,
                anchored_lines: 2,
            }
        );
        assert_eq!(index.table().len(), 4);

        index.clear();
        assert!(index.table().is_empty());
    }
}
