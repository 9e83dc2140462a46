use crate::error::OpError;

/// Change to a node's text content, in character offsets
#[derive(Debug, Clone, PartialEq)]
pub enum TextOperation {
    Insert { pos: usize, text: String },
    Delete { pos: usize, len: usize },
    /// Members applied left to right
    Compound(Vec<TextOperation>),
}

/// Target a [`TextOperation`] is applied to
pub trait StringAdapter {
    type Error;

    fn insert(&mut self, pos: usize, text: &str) -> Result<(), Self::Error>;

    fn delete(&mut self, pos: usize, len: usize) -> Result<(), Self::Error>;

    /// Read the adapted string back
    fn get(&self) -> String;
}

impl TextOperation {
    pub fn insert(pos: usize, text: impl Into<String>) -> Self {
        TextOperation::Insert {
            pos,
            text: text.into(),
        }
    }

    pub fn delete(pos: usize, len: usize) -> Self {
        TextOperation::Delete { pos, len }
    }

    pub fn apply<A: StringAdapter>(&self, adapter: &mut A) -> Result<(), A::Error> {
        match self {
            TextOperation::Insert { pos, text } => adapter.insert(*pos, text),
            TextOperation::Delete { pos, len } => adapter.delete(*pos, *len),
            TextOperation::Compound(ops) => {
                for op in ops {
                    op.apply(adapter)?;
                }
                Ok(())
            }
        }
    }
}

/// Byte index of char offset `offset` in `text`, or `None` past the end
pub(crate) fn byte_index(text: &str, offset: usize) -> Option<usize> {
    if offset == 0 {
        return Some(0);
    }
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .nth(offset)
}

/// Splice `insert` into `text` at char `offset`, removing `remove` chars first
pub(crate) fn splice_chars(
    text: &mut String,
    offset: usize,
    remove: usize,
    insert: &str,
) -> Result<(), OpError> {
    let len = text.chars().count();
    let out_of_range = OpError::OffsetOutOfRange {
        offset: offset.saturating_add(remove),
        len,
    };
    let Some(until) = offset.checked_add(remove).filter(|&until| until <= len) else {
        return Err(out_of_range);
    };
    let start = byte_index(text, offset).ok_or(out_of_range.clone())?;
    let end = byte_index(text, until).ok_or(out_of_range)?;
    text.replace_range(start..end, insert);
    Ok(())
}

impl StringAdapter for String {
    type Error = OpError;

    fn insert(&mut self, pos: usize, text: &str) -> Result<(), OpError> {
        splice_chars(self, pos, 0, text)
    }

    fn delete(&mut self, pos: usize, len: usize) -> Result<(), OpError> {
        splice_chars(self, pos, len, "")
    }

    fn get(&self) -> String {
        self.clone()
    }
}
