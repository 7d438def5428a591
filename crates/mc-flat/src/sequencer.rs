//! Flattening of nested metadata lists into row sequences.
//!
//! Each nested relationship (type -> enums, parameter -> dimensions,
//! run -> parameters -> notes, ...) is walked with explicit cursors held in
//! the source object. Parents without children are skipped; no rows are
//! buffered.

use mc_core::{McError, McResult};

use crate::row::{FlatRow, RowSource, check_arity};

/// Position in a two-level list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairCursor {
    outer: usize,
    inner: usize,
}

impl PairCursor {
    /// Advance to the next (parent, child) index pair.
    ///
    /// Skips parents with no children. Returns `None` once the parent list
    /// is exhausted, and keeps returning `None` afterwards.
    pub fn next_pair<P>(
        &mut self,
        parents: &[P],
        child_count: impl Fn(&P) -> usize,
    ) -> Option<(usize, usize)> {
        while let Some(parent) = parents.get(self.outer) {
            if self.inner < child_count(parent) {
                let at = (self.outer, self.inner);
                self.inner += 1;
                return Some(at);
            }
            self.outer += 1;
            self.inner = 0;
        }
        None
    }
}

/// Position in a three-level list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TripleCursor {
    outer: usize,
    mid: usize,
    inner: usize,
}

impl TripleCursor {
    /// Advance to the next (parent, middle, leaf) index triple, skipping
    /// parents without middles and middles without leaves.
    pub fn next_triple<P, M>(
        &mut self,
        parents: &[P],
        mids: impl Fn(&P) -> &[M],
        leaf_count: impl Fn(&M) -> usize,
    ) -> Option<(usize, usize, usize)> {
        while let Some(parent) = parents.get(self.outer) {
            match mids(parent).get(self.mid) {
                Some(mid) if self.inner < leaf_count(mid) => {
                    let at = (self.outer, self.mid, self.inner);
                    self.inner += 1;
                    return Some(at);
                }
                Some(_) => {
                    self.mid += 1;
                    self.inner = 0;
                }
                None => {
                    self.outer += 1;
                    self.mid = 0;
                    self.inner = 0;
                }
            }
        }
        None
    }
}

fn past_end(table: &str, what: &str, index: usize) -> McError {
    McError::invariant(format!(
        "{}: {} cursor {} is past the end of its list",
        table, what, index
    ))
}

/// One row per list item.
pub struct ListRows<'a, P> {
    table: &'static str,
    columns: Vec<String>,
    items: &'a [P],
    pos: usize,
    make: fn(&P, &mut FlatRow),
    row: FlatRow,
}

impl<'a, P> ListRows<'a, P> {
    pub fn new(
        table: &'static str,
        columns: Vec<String>,
        items: &'a [P],
        make: fn(&P, &mut FlatRow),
    ) -> Self {
        Self {
            table,
            columns,
            items,
            pos: 0,
            make,
            row: FlatRow::new(),
        }
    }
}

impl<P> RowSource for ListRows<'_, P> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> McResult<Option<&[String]>> {
        let Some(item) = self.items.get(self.pos) else {
            return Ok(None);
        };
        self.pos += 1;
        self.row.clear();
        (self.make)(item, &mut self.row);
        check_arity(self.table, self.columns.len(), &self.row)?;
        Ok(Some(self.row.fields()))
    }
}

/// One row per (parent, child) pair.
pub struct PairRows<'a, P, C> {
    table: &'static str,
    columns: Vec<String>,
    parents: &'a [P],
    children: fn(&P) -> &[C],
    make: fn(&P, &C, &mut FlatRow),
    cursor: PairCursor,
    row: FlatRow,
}

impl<'a, P, C> PairRows<'a, P, C> {
    pub fn new(
        table: &'static str,
        columns: Vec<String>,
        parents: &'a [P],
        children: fn(&P) -> &[C],
        make: fn(&P, &C, &mut FlatRow),
    ) -> Self {
        Self {
            table,
            columns,
            parents,
            children,
            make,
            cursor: PairCursor::default(),
            row: FlatRow::new(),
        }
    }
}

impl<P, C> RowSource for PairRows<'_, P, C> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> McResult<Option<&[String]>> {
        let children = self.children;
        let Some((o, i)) = self.cursor.next_pair(self.parents, |p| children(p).len()) else {
            return Ok(None);
        };
        let parent = self
            .parents
            .get(o)
            .ok_or_else(|| past_end(self.table, "parent", o))?;
        let child = children(parent)
            .get(i)
            .ok_or_else(|| past_end(self.table, "child", i))?;

        self.row.clear();
        (self.make)(parent, child, &mut self.row);
        check_arity(self.table, self.columns.len(), &self.row)?;
        Ok(Some(self.row.fields()))
    }
}

/// One row per (parent, middle, leaf) triple.
pub struct TripleRows<'a, P, M, C> {
    table: &'static str,
    columns: Vec<String>,
    parents: &'a [P],
    mids: fn(&P) -> &[M],
    leaves: fn(&M) -> &[C],
    make: fn(&P, &M, &C, &mut FlatRow),
    cursor: TripleCursor,
    row: FlatRow,
}

impl<'a, P, M, C> TripleRows<'a, P, M, C> {
    pub fn new(
        table: &'static str,
        columns: Vec<String>,
        parents: &'a [P],
        mids: fn(&P) -> &[M],
        leaves: fn(&M) -> &[C],
        make: fn(&P, &M, &C, &mut FlatRow),
    ) -> Self {
        Self {
            table,
            columns,
            parents,
            mids,
            leaves,
            make,
            cursor: TripleCursor::default(),
            row: FlatRow::new(),
        }
    }
}

impl<P, M, C> RowSource for TripleRows<'_, P, M, C> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> McResult<Option<&[String]>> {
        let (mids, leaves) = (self.mids, self.leaves);
        let Some((o, m, i)) = self
            .cursor
            .next_triple(self.parents, mids, |mid| leaves(mid).len())
        else {
            return Ok(None);
        };
        let parent = self
            .parents
            .get(o)
            .ok_or_else(|| past_end(self.table, "parent", o))?;
        let mid = mids(parent)
            .get(m)
            .ok_or_else(|| past_end(self.table, "middle", m))?;
        let leaf = leaves(mid)
            .get(i)
            .ok_or_else(|| past_end(self.table, "leaf", i))?;

        self.row.clear();
        (self.make)(parent, mid, leaf, &mut self.row);
        check_arity(self.table, self.columns.len(), &self.row)?;
        Ok(Some(self.row.fields()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{collect_rows, column_names};

    struct Parent {
        id: i32,
        kids: Vec<Kid>,
    }

    struct Kid {
        name: &'static str,
        notes: Vec<&'static str>,
    }

    fn kid(name: &'static str, notes: &[&'static str]) -> Kid {
        Kid {
            name,
            notes: notes.to_vec(),
        }
    }

    fn pairs(parents: &[Parent]) -> Vec<Vec<String>> {
        let mut src = PairRows::new(
            "test",
            column_names(&["id", "name"]),
            parents,
            |p| p.kids.as_slice(),
            |p, k, row| {
                row.push(p.id);
                row.push_str(k.name);
            },
        );
        collect_rows(&mut src).unwrap()
    }

    #[test]
    fn pair_skips_empty_parents() {
        let parents = vec![
            Parent { id: 1, kids: vec![] },
            Parent {
                id: 2,
                kids: vec![kid("a", &[]), kid("b", &[])],
            },
            Parent { id: 3, kids: vec![] },
            Parent {
                id: 4,
                kids: vec![kid("c", &[])],
            },
            Parent { id: 5, kids: vec![] },
        ];
        let rows = pairs(&parents);
        assert_eq!(rows, vec![vec!["2", "a"], vec!["2", "b"], vec!["4", "c"]]);
    }

    #[test]
    fn pair_terminates_when_no_parent_has_children() {
        let parents = vec![Parent { id: 1, kids: vec![] }, Parent { id: 2, kids: vec![] }];
        assert!(pairs(&parents).is_empty());
        assert!(pairs(&[]).is_empty());
    }

    #[test]
    fn cursor_stays_exhausted() {
        let parents = vec![vec![1], vec![]];
        let mut cursor = PairCursor::default();
        assert_eq!(cursor.next_pair(&parents, Vec::len), Some((0, 0)));
        assert_eq!(cursor.next_pair(&parents, Vec::len), None);
        assert_eq!(cursor.next_pair(&parents, Vec::len), None);
    }

    #[test]
    fn triple_walks_three_levels() {
        let parents = vec![
            Parent {
                id: 1,
                kids: vec![kid("a", &[]), kid("b", &["x", "y"])],
            },
            Parent { id: 2, kids: vec![] },
            Parent {
                id: 3,
                kids: vec![kid("c", &["z"]), kid("d", &[])],
            },
        ];
        let mut src = TripleRows::new(
            "test",
            column_names(&["id", "name", "note"]),
            &parents,
            |p| p.kids.as_slice(),
            |k| k.notes.as_slice(),
            |p, k, n, row| {
                row.push(p.id);
                row.push_str(k.name);
                row.push_str(n);
            },
        );
        let rows = collect_rows(&mut src).unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["1", "b", "x"],
                vec!["1", "b", "y"],
                vec!["3", "c", "z"],
            ]
        );
    }

    #[test]
    fn arity_mismatch_is_an_error() {
        let items = vec![1, 2];
        let mut src = ListRows::new("test", column_names(&["a", "b"]), &items, |v, row| {
            row.push(*v)
        });
        assert!(matches!(
            src.next_row(),
            Err(McError::Arity {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }
}
