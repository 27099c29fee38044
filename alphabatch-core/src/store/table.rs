use alphabatch_model::{AlphaId, ResultRecord};

/// In-memory result table with the ordering rules of the persisted file.
///
/// Rows are unique by `(alpha_id, formula)`. Unsubmitted rows always come
/// first once anything has been marked submitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    records: Vec<ResultRecord>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ResultRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.upsert(record);
        }
        table
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ResultRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends `record`, dropping any earlier row with the same key.
    /// Returns `true` when an earlier row was replaced.
    pub fn upsert(&mut self, record: ResultRecord) -> bool {
        let before = self.records.len();
        self.records.retain(|existing| !existing.same_key(&record));
        let replaced = self.records.len() != before;
        self.records.push(record);
        replaced
    }

    /// Flags every row of `alpha_id` as submitted and moves submitted rows
    /// behind unsubmitted ones, keeping relative order in each group.
    /// Returns the number of rows flagged.
    pub fn mark_submitted(&mut self, alpha_id: &AlphaId) -> usize {
        let mut marked = 0;
        for record in self.records.iter_mut().filter(|r| &r.alpha_id == alpha_id)
        {
            record.submitted = true;
            marked += 1;
        }

        let (unsubmitted, submitted): (Vec<_>, Vec<_>) = self
            .records
            .drain(..)
            .partition(|record| !record.submitted);
        self.records = unsubmitted;
        self.records.extend(submitted);
        marked
    }

    pub fn unsubmitted(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.iter().filter(|record| !record.submitted)
    }

    pub fn find(&self, alpha_id: &AlphaId) -> Option<&ResultRecord> {
        self.records.iter().find(|record| &record.alpha_id == alpha_id)
    }
}
