// Type-ahead data provider backed by the patch database

use crate::patch::{PatchDatabase, PatchRecord};

pub const ROW_HEIGHT: f32 = 23.0;
pub const DISPLAYED_ROWS: usize = 12;

/// Keeps the latest search result so rows can be drawn and picked by index
#[derive(Debug, Default)]
pub struct PatchDbTypeAhead {
    last_search_result: Vec<PatchRecord>,
}

impl PatchDbTypeAhead {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a query; returns the indices of the results
    pub fn search_for(&mut self, db: &dyn PatchDatabase, query: &str) -> Vec<usize> {
        self.last_search_result = db.query_from_query_string(query);
        (0..self.last_search_result.len()).collect()
    }

    pub fn text_box_value_for_index(&self, idx: usize) -> String {
        match self.last_search_result.get(idx) {
            Some(record) => record.name.clone(),
            None => "<<ERROR>>".to_string(),
        }
    }

    pub fn record(&self, idx: usize) -> Option<&PatchRecord> {
        self.last_search_result.get(idx)
    }

    pub fn results(&self) -> &[PatchRecord] {
        &self.last_search_result
    }

    pub fn clear(&mut self) {
        self.last_search_result.clear();
    }

    pub fn row_height(&self) -> f32 {
        ROW_HEIGHT
    }

    pub fn displayed_rows(&self) -> usize {
        DISPLAYED_ROWS
    }
}
