//! CIL instruction model: opcodes, stack effects, and mutable method bodies.
//!
//! This module provides the instruction-level substrate for literal substitution.
//! It deliberately stops short of a disassembler: the host loads method bodies and
//! exposes them as linear [`MethodBody`] streams; this crate classifies instructions
//! ([`op_spec`]), simulates stack depth ([`Instruction::net_stack_delta`]), and mutates
//! streams through the [`Cursor`] rewrite operations.
//!
//! # Key Types
//! - [`Instruction`] - A decoded CIL instruction with operand
//! - [`MethodBody`] / [`Cursor`] - Owned instruction stream and its mutation cursor
//! - [`FlowType`] / [`StackEffect`] - Control flow and stack classifications

mod body;
mod instruction;
pub mod opcodes;

pub use body::{Cursor, MethodBody};
pub use instruction::{
    op_spec, CallShape, FlowType, Instruction, OpSpec, Operand, StackBehavior, StackEffect,
};
