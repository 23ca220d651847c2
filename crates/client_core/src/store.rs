use shared::domain::RecordId;

use crate::gateway::Resource;

/// Current snapshot of one collection. Always replaced wholesale after a
/// fetch; there is no merge path.
pub struct RecordStore<R: Resource> {
    records: Vec<R::Record>,
}

impl<R: Resource> Default for RecordStore<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<R: Resource> RecordStore<R> {
    pub fn replace(&mut self, records: Vec<R::Record>) {
        self.records = records;
    }

    pub fn records(&self) -> &[R::Record] {
        &self.records
    }

    pub fn snapshot(&self) -> Vec<R::Record> {
        self.records.clone()
    }

    pub fn find(&self, id: &RecordId) -> Option<&R::Record> {
        self.records
            .iter()
            .find(|record| R::record_id(record) == Some(id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
