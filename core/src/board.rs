use crate::detection::{
    apply_filters_at, DetectionRecord, FilterCriteria, SelectionSet, SelectionSummary,
};
use chrono::{Local, NaiveDateTime};
use std::collections::HashSet;

/// Owned state of the detections view: the last fetched list, the criteria
/// applied to it, the rows currently displayed and the rows selected.
///
/// Every mutation leaves the selection a subset of the displayed,
/// image-bearing rows.
#[derive(Debug, Clone, Default)]
pub struct DetectionBoard {
    records: Vec<DetectionRecord>,
    criteria: FilterCriteria,
    displayed: Vec<DetectionRecord>,
    selection: SelectionSet,
}

impl DetectionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_criteria(criteria: FilterCriteria) -> Self {
        Self {
            criteria,
            ..Self::default()
        }
    }

    pub fn records(&self) -> &[DetectionRecord] {
        &self.records
    }

    pub fn displayed(&self) -> &[DetectionRecord] {
        &self.displayed
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Replaces the record list wholesale. The selection is cleared since the
    /// rendered rows may no longer exist.
    pub fn replace_records(&mut self, records: Vec<DetectionRecord>) -> SelectionSummary {
        self.replace_records_at(records, Local::now().naive_local())
    }

    pub fn replace_records_at(
        &mut self,
        records: Vec<DetectionRecord>,
        now: NaiveDateTime,
    ) -> SelectionSummary {
        self.records = records;
        self.displayed = apply_filters_at(&self.records, &self.criteria, now);
        self.selection.deselect_all()
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) -> SelectionSummary {
        self.set_criteria_at(criteria, Local::now().naive_local())
    }

    pub fn set_criteria_at(&mut self, criteria: FilterCriteria, now: NaiveDateTime) -> SelectionSummary {
        self.criteria = criteria;
        self.refilter_at(now)
    }

    /// Recomputes the displayed rows and prunes selections that fell out of view.
    pub fn refilter_at(&mut self, now: NaiveDateTime) -> SelectionSummary {
        self.displayed = apply_filters_at(&self.records, &self.criteria, now);
        let displayed = &self.displayed;
        self.selection.retain(|id| {
            displayed
                .iter()
                .any(|record| record.selection_key() == Some(id))
        });
        self.selection.summary()
    }

    /// Checks or unchecks one row. Ids that are not a displayed image-bearing
    /// row are ignored.
    pub fn toggle(&mut self, id: &str, checked: bool) -> SelectionSummary {
        if checked && !self.is_selectable(id) {
            return self.selection.summary();
        }
        self.selection.toggle(id, checked)
    }

    pub fn select_all(&mut self) -> SelectionSummary {
        let keys = self.displayed.iter().filter_map(DetectionRecord::selection_key);
        self.selection.select_all(keys)
    }

    pub fn deselect_all(&mut self) -> SelectionSummary {
        self.selection.deselect_all()
    }

    pub fn clear(&mut self) -> SelectionSummary {
        self.selection.deselect_all()
    }

    pub fn summary(&self) -> SelectionSummary {
        self.selection.summary()
    }

    /// Selected ids in display order, each once even when several displayed
    /// rows share an image file.
    pub fn selected_ids(&self) -> Vec<String> {
        let mut emitted = HashSet::new();
        self.displayed
            .iter()
            .filter_map(DetectionRecord::selection_key)
            .filter(|key| self.selection.contains(key) && emitted.insert(*key))
            .map(str::to_string)
            .collect()
    }

    fn is_selectable(&self, id: &str) -> bool {
        self.displayed
            .iter()
            .any(|record| record.selection_key() == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Direction;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn record(image: Option<&str>, speed_kmh: f64) -> DetectionRecord {
        DetectionRecord {
            timestamp: now(),
            object_type: "car".into(),
            object_color: "blue".into(),
            direction: Direction::R2L,
            speed_kmh,
            speed_mph: None,
            speed_limit: 50.0,
            is_violation: speed_kmh > 50.0,
            confidence: 0.8,
            image_file: image.map(str::to_string),
            has_image: image.is_some(),
        }
    }

    fn board() -> DetectionBoard {
        let mut board = DetectionBoard::new();
        board.replace_records_at(
            vec![
                record(Some("id1.jpg"), 40.0),
                record(Some("id2.jpg"), 60.0),
                record(None, 70.0),
                record(Some("id3.jpg"), 80.0),
            ],
            now(),
        );
        board
    }

    #[test]
    fn select_all_then_toggle_then_deselect() {
        let mut board = board();
        assert_eq!(board.select_all().count, 3);
        assert_eq!(board.toggle("id2.jpg", false).count, 2);
        assert_eq!(board.selected_ids(), vec!["id1.jpg", "id3.jpg"]);
        let summary = board.deselect_all();
        assert_eq!(summary.count, 0);
        assert!(!summary.bulk_enabled);
    }

    #[test]
    fn refresh_clears_selection() {
        let mut board = board();
        board.select_all();
        let summary = board.replace_records_at(vec![record(Some("id1.jpg"), 40.0)], now());
        assert_eq!(summary.count, 0);
        assert_eq!(board.displayed().len(), 1);
    }

    #[test]
    fn toggling_unknown_id_is_ignored() {
        let mut board = board();
        assert_eq!(board.toggle("missing.jpg", true).count, 0);
        assert_eq!(board.toggle("id1.jpg", true).count, 1);
    }

    #[test]
    fn narrowing_filters_prunes_hidden_selection() {
        let mut board = board();
        board.select_all();
        let summary = board.set_criteria_at(
            FilterCriteria {
                violations_only: true,
                ..Default::default()
            },
            now(),
        );
        assert_eq!(summary.count, 2);
        assert_eq!(board.selected_ids(), vec!["id2.jpg", "id3.jpg"]);
        assert_eq!(board.records().len(), 4);
        assert_eq!(board.displayed().len(), 3);
    }

    #[test]
    fn shared_image_file_is_listed_once() {
        let mut board = DetectionBoard::new();
        board.replace_records_at(
            vec![
                record(Some("a.jpg"), 40.0),
                record(Some("a.jpg"), 60.0),
                record(Some("b.jpg"), 70.0),
            ],
            now(),
        );
        let summary = board.select_all();
        assert_eq!(summary.count, 2);
        assert_eq!(board.selected_ids(), vec!["a.jpg", "b.jpg"]);
        assert_eq!(board.selected_ids().len(), board.summary().count);
    }

    #[test]
    fn week_filter_keeps_the_window_start_edge() {
        let mut board = board();
        let week_ago = now() - chrono::Duration::days(7);
        let mut edge = record(Some("edge.jpg"), 40.0);
        edge.timestamp = week_ago;
        let mut stale = record(Some("stale.jpg"), 40.0);
        stale.timestamp = week_ago - chrono::Duration::seconds(1);
        board.replace_records_at(vec![edge, stale], now());

        board.set_criteria_at(
            FilterCriteria {
                date_range: Some(crate::detection::DateRange::Week),
                ..Default::default()
            },
            now(),
        );
        board.select_all();
        assert_eq!(board.selected_ids(), vec!["edge.jpg"]);
    }

    #[test]
    fn clear_empties_selection() {
        let mut board = board();
        board.toggle("id3.jpg", true);
        assert_eq!(board.clear().count, 0);
        assert!(board.selection().is_empty());
    }
}
