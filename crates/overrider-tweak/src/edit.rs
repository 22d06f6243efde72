use overrider_common::SourceId;

/// Insertion of `inserted_text` at `insertion_offset` (a byte offset).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub insertion_offset: u32,
    pub inserted_text: String,
}

impl TextEdit {
    pub fn insert(insertion_offset: u32, inserted_text: impl Into<String>) -> Self {
        Self {
            insertion_offset,
            inserted_text: inserted_text.into(),
        }
    }
}

/// The edits a tweak wants applied to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    pub source: SourceId,
    pub edits: Vec<TextEdit>,
}

impl Effect {
    pub fn noop(source: SourceId) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    pub fn single(source: SourceId, edit: TextEdit) -> Self {
        Self {
            source,
            edits: vec![edit],
        }
    }

    pub fn is_noop(&self) -> bool {
        self.edits.iter().all(|e| e.inserted_text.is_empty())
    }

    /// Apply the edits to `text`, returning the new contents.
    ///
    /// Edits are applied back to front so earlier offsets stay valid. Offsets
    /// past the end or inside a UTF-8 sequence are a caller bug and panic.
    pub fn apply_to(&self, text: &str) -> String {
        let mut edits: Vec<&TextEdit> = self.edits.iter().collect();
        edits.sort_by_key(|e| std::cmp::Reverse(e.insertion_offset));

        let mut out = text.to_string();
        for edit in edits {
            out.insert_str(edit.insertion_offset as usize, &edit.inserted_text);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_single_insertion() {
        let effect = Effect::single(SourceId::DETACHED, TextEdit::insert(3, "XY"));
        assert_eq!(effect.apply_to("abcdef"), "abcXYdef");
    }

    #[test]
    fn test_apply_keeps_offsets_stable() {
        let effect = Effect {
            source: SourceId::DETACHED,
            edits: vec![TextEdit::insert(1, "-"), TextEdit::insert(4, "+")],
        };
        assert_eq!(effect.apply_to("abcdef"), "a-bcd+ef");
    }

    #[test]
    fn test_noop() {
        let effect = Effect::noop(SourceId::DETACHED);
        assert!(effect.is_noop());
        assert_eq!(effect.apply_to("class A {};"), "class A {};");
    }
}
