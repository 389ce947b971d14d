//! Method body instruction streams and the in-place mutation cursor.
//!
//! The host's module loader materializes each method body as a [`MethodBody`] -- a
//! linear, owned instruction stream -- and applies the mutated stream back to the live
//! method after patching. All rewrites go through [`Cursor`], which supports exactly
//! the operations the substitution engine needs: locate the next literal load,
//! overwrite an operand, insert instructions before the cursor, and remove the
//! instruction at the cursor.
//!
//! A cursor never revisits an instruction: seeking only moves forward, and insertions
//! land strictly before the current position.

use crate::assembly::{Instruction, Operand};

/// An owned, linear CIL instruction stream for one method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodBody {
    instructions: Vec<Instruction>,
}

impl MethodBody {
    /// Wrap an instruction stream.
    #[must_use]
    pub fn new(instructions: Vec<Instruction>) -> Self {
        MethodBody { instructions }
    }

    /// The instructions of this body, in stream order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions in this body.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether this body contains no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Whether any instruction in this body pushes a string literal.
    #[must_use]
    pub fn has_literal_load(&self) -> bool {
        self.instructions.iter().any(Instruction::is_literal_load)
    }

    /// Open a mutation cursor positioned before the first instruction.
    pub fn cursor(&mut self) -> Cursor<'_> {
        Cursor {
            body: self,
            index: 0,
        }
    }
}

/// Forward-only mutation cursor over a [`MethodBody`].
///
/// The cursor index always refers to the "current" instruction. [`Cursor::seek_literal`]
/// advances to the next literal load at or after the current position;
/// [`Cursor::insert_before`] shifts the current position right so the cursor keeps
/// pointing at the same instruction; [`Cursor::remove`] leaves the cursor on whatever
/// followed the removed instruction.
#[derive(Debug)]
pub struct Cursor<'a> {
    body: &'a mut MethodBody,
    index: usize,
}

impl Cursor<'_> {
    /// Current position in the stream.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The instructions of the underlying body, in stream order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.body.instructions
    }

    /// The instruction at the cursor, if the cursor is within the stream.
    #[must_use]
    pub fn current(&self) -> Option<&Instruction> {
        self.body.instructions.get(self.index)
    }

    /// Advance past the current instruction.
    pub fn advance(&mut self) {
        if self.index < self.body.instructions.len() {
            self.index += 1;
        }
    }

    /// Move the cursor to the next literal load at or after the current position.
    ///
    /// Returns `false` when the rest of the stream holds no literal load; the cursor is
    /// then positioned past the end.
    pub fn seek_literal(&mut self) -> bool {
        while self.index < self.body.instructions.len() {
            if self.body.instructions[self.index].is_literal_load() {
                return true;
            }
            self.index += 1;
        }
        false
    }

    /// Overwrite the operand of the instruction at the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is past the end of the stream.
    pub fn set_operand(&mut self, operand: Operand) {
        self.body.instructions[self.index].operand = operand;
    }

    /// Insert instructions immediately before the cursor.
    ///
    /// The cursor keeps pointing at the same instruction it pointed at before the
    /// insertion, so inserted instructions are never revisited.
    pub fn insert_before(&mut self, instructions: impl IntoIterator<Item = Instruction>) {
        let mut inserted = 0;
        for (offset, instruction) in instructions.into_iter().enumerate() {
            self.body.instructions.insert(self.index + offset, instruction);
            inserted += 1;
        }
        self.index += inserted;
    }

    /// Remove the instruction at the cursor, leaving the cursor on its successor.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is past the end of the stream.
    pub fn remove(&mut self) -> Instruction {
        self.body.instructions.remove(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MethodSig;

    fn body() -> MethodBody {
        MethodBody::new(vec![
            Instruction::nop(),
            Instruction::ldstr("first"),
            Instruction::call(MethodSig::new("T", "M", 1, false)),
            Instruction::ldstr("second"),
            Instruction::ret(),
        ])
    }

    #[test]
    fn seek_finds_each_literal_once() {
        let mut body = body();
        let mut cursor = body.cursor();
        let mut found = Vec::new();
        while cursor.seek_literal() {
            found.push(cursor.current().unwrap().literal().unwrap().to_string());
            cursor.advance();
        }
        assert_eq!(found, ["first", "second"]);
    }

    #[test]
    fn insert_before_keeps_cursor_on_current() {
        let mut body = body();
        let mut cursor = body.cursor();
        assert!(cursor.seek_literal());
        cursor.insert_before(vec![Instruction::ldstr("key"), Instruction::nop()]);
        assert_eq!(cursor.current().unwrap().literal(), Some("first"));
        // Removal leaves the cursor on the successor of the removed instruction.
        let removed = cursor.remove();
        assert_eq!(removed.literal(), Some("first"));
        assert!(cursor.current().unwrap().is_call());
    }

    #[test]
    fn inserted_literals_are_not_revisited() {
        let mut body = body();
        let mut cursor = body.cursor();
        assert!(cursor.seek_literal());
        cursor.insert_before(vec![Instruction::ldstr("key")]);
        cursor.remove();
        // Continue the scan: the inserted "key" literal lies behind the cursor.
        assert!(cursor.seek_literal());
        assert_eq!(cursor.current().unwrap().literal(), Some("second"));
        cursor.advance();
        assert!(!cursor.seek_literal());
    }

    #[test]
    fn operand_overwrite_is_in_place() {
        let mut body = body();
        let mut cursor = body.cursor();
        assert!(cursor.seek_literal());
        cursor.set_operand(Operand::Literal("replaced".into()));
        cursor.advance();
        assert_eq!(body.instructions()[1].literal(), Some("replaced"));
        assert_eq!(body.len(), 5);
    }

    #[test]
    fn has_literal_load_scans_whole_body() {
        assert!(body().has_literal_load());
        let mut plain = MethodBody::new(vec![Instruction::nop(), Instruction::ret()]);
        assert!(!plain.has_literal_load());
        assert!(!plain.cursor().seek_literal());
    }
}
