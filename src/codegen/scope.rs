//! The compile-time virtual stack: bookkeeping that mirrors the machine
//! stack without ever running it, used to decide operand widths and offsets
//! during emission.

use crate::ast::PrimitiveType;
use crate::codegen::asm::InstructionSize;

/// One named binding on the virtual stack.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub offset: usize,
    pub type_: PrimitiveType,
    pub sub_type: Option<PrimitiveType>,
    pub word_size: InstructionSize,
    /// Total bytes of the logical item backing a `str` variable (data +
    /// pointer + length). `None` for scalar variables.
    pub str_total_size: Option<usize>,
}

/// Tracks `stack_size`, `item_sizes`, `padding`, `variables`, `scopes`,
/// `label_count` and `loop_end_labels` in lock-step behind a single
/// push/pop entry point so these can't drift apart.
#[derive(Default)]
pub struct StackState {
    pub stack_size: usize,
    item_sizes: Vec<usize>,
    padding: Vec<usize>,
    pub variables: Vec<Variable>,
    scopes: Vec<usize>,
    label_count: usize,
    loop_end_labels: Vec<String>,
}

impl StackState {
    pub fn new() -> Self {
        Self {
            scopes: vec![0],
            ..Default::default()
        }
    }

    /// Reserves `size` bytes, 2-byte aligning first when `size > 1` and the
    /// current offset is odd. Returns the padding applied and the offset of
    /// the reserved item (i.e. the new `stack_size`).
    pub fn reserve(&mut self, size: usize) -> (usize, usize) {
        let pad = if size > 1 && self.stack_size % 2 != 0 { 1 } else { 0 };
        self.stack_size += pad;
        self.stack_size += size;
        self.item_sizes.push(size);
        self.padding.push(pad);
        (pad, self.stack_size)
    }

    /// Reserves space for one chunk of a compound value without the
    /// alignment step `reserve` applies — see the open question on
    /// `push_stack_complex` in DESIGN.md. Each chunk is tracked as its own
    /// item_sizes entry until [`Self::collapse_top_items`] folds them into
    /// the one logical item the rest of codegen expects to see.
    pub fn reserve_complex(&mut self, chunk_size: usize) -> usize {
        self.stack_size += chunk_size;
        self.item_sizes.push(chunk_size);
        self.padding.push(0);
        self.stack_size
    }

    /// Folds the last however-many `item_sizes` entries whose sizes sum to
    /// `total` into a single logical item, so a later `pop` removes the
    /// whole compound value in one step.
    pub fn collapse_top_items(&mut self, total: usize) {
        let mut sum = 0;
        let mut count = 0;
        while sum < total {
            sum += self.item_sizes[self.item_sizes.len() - 1 - count];
            count += 1;
        }
        debug_assert_eq!(sum, total, "compound chunk sizes must sum exactly to the logical item size");
        self.item_sizes.truncate(self.item_sizes.len() - count);
        self.padding.truncate(self.padding.len() - count);
        self.item_sizes.push(total);
        self.padding.push(0);
    }

    /// Drops the top variable and its backing stack item without emitting
    /// any instructions — used by `gen_for`'s single-item loop-variable
    /// teardown (see DESIGN.md open questions).
    pub fn pop_one_variable(&mut self) {
        self.variables.pop();
        let size = self.item_sizes.pop().expect("item_sizes/variables diverged");
        let pad = self.padding.pop().expect("padding/variables diverged");
        self.stack_size -= size + pad;
    }

    pub fn find_variable_in_current_scope(&self, name: &str) -> bool {
        let floor = *self.scopes.last().unwrap_or(&0);
        self.variables[floor..].iter().any(|v| v.name == name)
    }

    /// Pops the top logical item, returning its pre-pop offset and size so
    /// the caller can emit the right-sized `mov` before the stack shrinks.
    pub fn pop(&mut self) -> (usize, usize) {
        let offset = self.stack_size;
        let size = self.item_sizes.pop().expect("codegen stack underflow");
        let pad = self.padding.pop().expect("codegen stack underflow");
        self.stack_size -= size + pad;
        (offset, size)
    }

    pub fn top_size(&self) -> usize {
        *self.item_sizes.last().expect("codegen stack is empty")
    }

    pub fn create_label(&mut self, tag: &str) -> String {
        self.label_count += 1;
        format!(".lbl{tag}{}", self.label_count)
    }

    pub fn begin_scope(&mut self) {
        self.scopes.push(self.variables.len());
    }

    /// Returns the total bytes (including padding) the closing scope's
    /// locals occupied, so the caller can fold it into a single `sub`-free
    /// decrement of `stack_size`.
    pub fn end_scope(&mut self) -> usize {
        let floor = self.scopes.pop().expect("scope stack underflow");
        let pop_count = self.variables.len() - floor;
        let mut freed = 0;
        for _ in 0..pop_count {
            self.variables.pop();
            let size = self.item_sizes.pop().expect("item_sizes/variables diverged");
            let pad = self.padding.pop().expect("padding/variables diverged");
            freed += size + pad;
        }
        self.stack_size -= freed;
        freed
    }

    pub fn push_loop_end(&mut self, label: String) {
        self.loop_end_labels.push(label);
    }

    pub fn pop_loop_end(&mut self) {
        self.loop_end_labels.pop();
    }

    pub fn current_loop_end(&self) -> Option<&str> {
        self.loop_end_labels.last().map(String::as_str)
    }

    pub fn find_variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().rev().find(|v| v.name == name)
    }

    pub fn declare(&mut self, variable: Variable) {
        self.variables.push(variable);
    }
}
