// ============================================================
// Layer 4 — Entity Tables
// ============================================================
// One arena per entity type (answers, questions, reviews):
// a growable, zero-based, ID-indexed table of token-index
// sequences plus an explicit "reserve next ID" operation.
//
// IDs are handed out monotonically with no gaps, in the order
// entities are encountered, so the table invariant is
//
//     len(table) == max assigned id + 1     (== next_id)
//
// verify() checks it and reports a TableInvariant error when a
// reserved ID was never filled.

use crate::domain::error::PipelineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTable {
    name: &'static str,
    rows: Vec<Vec<usize>>,
    next_id: usize,
}

impl EntityTable {
    pub fn new(name: &'static str) -> Self {
        Self { name, rows: Vec::new(), next_id: 0 }
    }

    /// Hand out the next ID without storing anything yet.
    pub fn reserve_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Reserve an ID and store the sequence under it.
    pub fn push(&mut self, sequence: Vec<usize>) -> usize {
        let id = self.reserve_id();
        self.rows.push(sequence);
        id
    }

    pub fn get(&self, id: usize) -> Option<&[usize]> {
        self.rows.get(id).map(|r| r.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Largest ID handed out so far
    pub fn max_id(&self) -> Option<usize> {
        self.next_id.checked_sub(1)
    }

    /// Check len(table) == max assigned id + 1.
    pub fn verify(&self) -> Result<(), PipelineError> {
        if self.rows.len() == self.max_id().map_or(0, |id| id + 1) {
            Ok(())
        } else {
            Err(PipelineError::TableInvariant {
                table: self.name,
                len: self.rows.len(),
                next_id: self.next_id,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_dense_ids() {
        let mut t = EntityTable::new("answers");
        assert_eq!(t.max_id(), None);
        assert_eq!(t.push(vec![4, 5]), 0);
        assert_eq!(t.push(vec![]), 1);
        assert_eq!(t.push(vec![6]), 2);
        assert_eq!(t.len(), 3);
        assert_eq!(t.max_id(), Some(2));
        assert_eq!(t.get(0), Some(&[4, 5][..]));
        assert_eq!(t.get(1), Some(&[][..]));
        assert!(t.verify().is_ok());
    }

    #[test]
    fn test_unfilled_reservation_breaks_invariant() {
        let mut t = EntityTable::new("reviews");
        t.push(vec![1]);
        t.reserve_id();
        let err = t.verify().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::TableInvariant { table: "reviews", len: 1, next_id: 2 }
        ));
    }
}
