use crate::error::OpError;

/// Structural change to an ordered list of node ids
///
/// Positions address the list as it is when the operation (or, inside a
/// compound, each member) is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayOperation {
    Insert { pos: usize, value: String },
    Delete { pos: usize },
    /// `to` is interpreted after the element has been removed from `from`
    Move { value: String, from: usize, to: usize },
    /// Members applied left to right
    Compound(Vec<ArrayOperation>),
}

/// Target an [`ArrayOperation`] is applied to
pub trait ArrayAdapter {
    type Error;

    fn insert(&mut self, pos: usize, value: &str) -> Result<(), Self::Error>;

    fn delete(&mut self, pos: usize) -> Result<(), Self::Error>;

    fn move_item(&mut self, value: &str, from: usize, to: usize) -> Result<(), Self::Error>;
}

impl ArrayOperation {
    pub fn insert(pos: usize, value: impl Into<String>) -> Self {
        ArrayOperation::Insert {
            pos,
            value: value.into(),
        }
    }

    pub fn delete(pos: usize) -> Self {
        ArrayOperation::Delete { pos }
    }

    pub fn move_item(value: impl Into<String>, from: usize, to: usize) -> Self {
        ArrayOperation::Move {
            value: value.into(),
            from,
            to,
        }
    }

    pub fn apply<A: ArrayAdapter>(&self, adapter: &mut A) -> Result<(), A::Error> {
        match self {
            ArrayOperation::Insert { pos, value } => adapter.insert(*pos, value),
            ArrayOperation::Delete { pos } => adapter.delete(*pos),
            ArrayOperation::Move { value, from, to } => adapter.move_item(value, *from, *to),
            ArrayOperation::Compound(ops) => {
                for op in ops {
                    op.apply(adapter)?;
                }
                Ok(())
            }
        }
    }
}

/// Insert at `pos`, or append when `pos` is at or beyond the end
pub(crate) fn insert_or_append<T>(items: &mut Vec<T>, pos: usize, item: T) {
    if pos < items.len() {
        items.insert(pos, item);
    } else {
        items.push(item);
    }
}

impl ArrayAdapter for Vec<String> {
    type Error = OpError;

    fn insert(&mut self, pos: usize, value: &str) -> Result<(), OpError> {
        insert_or_append(self, pos, value.to_string());
        Ok(())
    }

    fn delete(&mut self, pos: usize) -> Result<(), OpError> {
        if pos >= self.len() {
            return Err(OpError::PositionOutOfRange {
                position: pos,
                len: self.len(),
            });
        }
        self.remove(pos);
        Ok(())
    }

    fn move_item(&mut self, _value: &str, from: usize, to: usize) -> Result<(), OpError> {
        if from >= self.len() {
            return Err(OpError::PositionOutOfRange {
                position: from,
                len: self.len(),
            });
        }
        let item = self.remove(from);
        insert_or_append(self, to, item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(ArrayOperation::insert(0, "x"), &["x", "a", "b", "c"])]
    #[case(ArrayOperation::insert(3, "x"), &["a", "b", "c", "x"])]
    #[case(ArrayOperation::insert(42, "x"), &["a", "b", "c", "x"])]
    #[case(ArrayOperation::delete(1), &["a", "c"])]
    #[case(ArrayOperation::move_item("a", 0, 2), &["b", "c", "a"])]
    #[case(ArrayOperation::move_item("c", 2, 0), &["c", "a", "b"])]
    #[case(ArrayOperation::move_item("a", 0, 9), &["b", "c", "a"])]
    fn test_apply_to_vec(#[case] op: ArrayOperation, #[case] expected: &[&str]) {
        let mut items = list(&["a", "b", "c"]);
        op.apply(&mut items).unwrap();
        assert_eq!(items, list(expected));
    }

    #[test]
    fn test_move_target_is_relative_to_shortened_list() {
        // Splice semantics: remove first, then insert at `to` in the n-1 list
        let mut items = list(&["a", "b", "c", "d"]);
        ArrayOperation::move_item("b", 1, 2).apply(&mut items).unwrap();
        assert_eq!(items, list(&["a", "c", "b", "d"]));
    }

    #[test]
    fn test_compound_applies_left_to_right() {
        let mut items = list(&["a"]);
        let op = ArrayOperation::Compound(vec![
            ArrayOperation::insert(1, "b"),
            ArrayOperation::insert(0, "c"),
            ArrayOperation::delete(1),
        ]);
        op.apply(&mut items).unwrap();
        assert_eq!(items, list(&["c", "b"]));
    }

    #[test]
    fn test_delete_out_of_range_fails() {
        let mut items = list(&["a"]);
        let err = ArrayOperation::delete(1).apply(&mut items).unwrap_err();
        assert_eq!(err, OpError::PositionOutOfRange { position: 1, len: 1 });
        assert_eq!(items, list(&["a"]));
    }
}
