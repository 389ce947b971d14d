//! CIL instruction representation and per-opcode stack-effect classification.
//!
//! This module defines the instruction model the patch engine operates on. A method body
//! is a linear stream of [`Instruction`] values handed over by the host's module loader;
//! the engine never decodes raw bytes itself. Each instruction carries its opcode, an
//! optional [`Operand`], a [`FlowType`] describing how it affects control flow, and a
//! display mnemonic.
//!
//! The stack-effect model ([`op_spec`]) maps every opcode to a [`StackEffect`]:
//! a fixed pop/push pair, the [`StackEffect::ClearsStack`] sentinel (instructions that
//! empty the evaluation stack, and unknown opcodes -- both make any depth simulation
//! bail out), or [`StackEffect::Signature`] for call-like instructions whose pop count
//! comes from the operand's declared parameter count.
//!
//! # Key Types
//! - [`Instruction`] - One position in a method's instruction stream
//! - [`Operand`] - Literal text, resolved call target, indirect call shape, or opaque payload
//! - [`FlowType`] - Control flow classification
//! - [`StackBehavior`] / [`StackEffect`] - Stack depth effects

use std::fmt;

use strum::Display;

use crate::assembly::opcodes::*;
use crate::metadata::MethodSig;

/// Parameter/return shape of an indirect (`calli`) target.
///
/// An indirect call's stack effect is computable from its declared shape even though the
/// concrete target method can never be statically attributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallShape {
    /// Declared parameter count
    pub param_count: u32,
    /// Whether the target declares a return value
    pub has_return: bool,
}

/// Operand of a decoded instruction.
///
/// Only the payloads the patch engine cares about are structured: string literals
/// (the rewrite targets) and call targets (consumed by usage resolution). Everything
/// else is carried opaquely so the stream stays round-trippable.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand present
    None,
    /// String literal pushed by `ldstr`
    Literal(String),
    /// Resolved target of `call`, `callvirt` or `newobj`
    Method(MethodSig),
    /// Declared shape of a `calli` target (the target itself is unresolvable)
    Indirect(CallShape),
    /// Numeric payload (constants, local/argument indices)
    Int(i64),
    /// Branch displacement; this crate never follows branches
    Target(i32),
}

/// How an instruction affects control flow.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    /// Normal execution continues to next instruction
    Sequential,
    /// Conditional branch to another location
    ConditionalBranch,
    /// Always branches to another location
    UnconditionalBranch,
    /// Call to another method, falls through after returning
    Call,
    /// Returns from current method
    Return,
    /// Multi-way branch (switch statement)
    Switch,
    /// Exception throwing
    Throw,
    /// End of finally/filter block
    EndFinally,
    /// Leave protected region (try/catch/finally)
    Leave,
}

impl FlowType {
    /// Whether execution continues at the next instruction in the stream.
    ///
    /// Usage resolution only walks across instructions for which this holds; every
    /// other flow type terminates straight-line analysis.
    #[must_use]
    pub fn falls_through(&self) -> bool {
        matches!(self, FlowType::Sequential | FlowType::Call)
    }
}

/// Fixed stack effect of an ordinary (non-call) instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackBehavior {
    /// Number of items popped from the stack
    pub pops: u8,
    /// Number of items pushed onto the stack
    pub pushes: u8,
}

impl StackBehavior {
    /// Net effect on stack depth (pushes minus pops).
    #[must_use]
    pub fn net(&self) -> i32 {
        i32::from(self.pushes) - i32::from(self.pops)
    }
}

/// Stack-effect classification of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackEffect {
    /// Fixed pop/push counts from the opcode table
    Fixed(StackBehavior),
    /// Empties the evaluation stack; any depth simulation must treat this as an
    /// instant resolution failure. Unknown opcodes classify here as well.
    ClearsStack,
    /// Call-like: pop count is the operand signature's parameter count, push count
    /// is 1 iff a value is produced
    Signature,
}

/// Flow and stack classification of one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpSpec {
    /// Control flow classification
    pub flow: FlowType,
    /// Stack effect classification
    pub effect: StackEffect,
}

const fn fixed(pops: u8, pushes: u8) -> StackEffect {
    StackEffect::Fixed(StackBehavior { pops, pushes })
}

const fn seq(pops: u8, pushes: u8) -> OpSpec {
    OpSpec {
        flow: FlowType::Sequential,
        effect: fixed(pops, pushes),
    }
}

/// Look up the flow/stack classification of an opcode (ECMA-335 III).
///
/// `prefix` is `0` for single-byte opcodes and [`FE_PREFIX`] for two-byte ones.
/// Unknown encodings classify as sequential [`StackEffect::ClearsStack`], which makes
/// every depth simulation bail out rather than mis-track the stack.
#[must_use]
pub fn op_spec(prefix: u8, opcode: u8) -> OpSpec {
    if prefix == FE_PREFIX {
        return match opcode {
            0x00 => seq(0, 1),                   // arglist
            0x01..=0x05 => seq(2, 1),            // ceq, cgt[.un], clt[.un]
            0x06 => seq(0, 1),                   // ldftn
            0x07 => seq(1, 1),                   // ldvirtftn
            0x09 | 0x0A | 0x0C | 0x0D => seq(0, 1), // ldarg, ldarga, ldloc, ldloca
            0x0B | 0x0E => seq(1, 0),            // starg, stloc
            0x0F => seq(1, 1),                   // localloc
            0x11 => OpSpec {
                flow: FlowType::EndFinally,
                effect: StackEffect::ClearsStack,
            }, // endfilter
            0x12..=0x14 | 0x16 | 0x1E => seq(0, 0), // unaligned., volatile., tail., constrained., readonly.
            0x15 => seq(1, 0),                   // initobj
            0x17 | 0x18 => seq(3, 0),            // cpblk, initblk
            0x1A => OpSpec {
                flow: FlowType::Throw,
                effect: fixed(0, 0),
            }, // rethrow
            0x1C => seq(0, 1),                   // sizeof
            0x1D => seq(1, 1),                   // refanytype
            _ => OpSpec {
                flow: FlowType::Sequential,
                effect: StackEffect::ClearsStack,
            },
        };
    }

    match opcode {
        0x00 | 0x01 => seq(0, 0),          // nop, break
        0x02..=0x09 => seq(0, 1),          // ldarg.0-3, ldloc.0-3
        0x0A..=0x0D => seq(1, 0),          // stloc.0-3
        0x0E | 0x0F | 0x11 | 0x12 => seq(0, 1), // ldarg.s, ldarga.s, ldloc.s, ldloca.s
        0x10 | 0x13 => seq(1, 0),          // starg.s, stloc.s
        0x14..=0x23 => seq(0, 1),          // ldnull, ldc.*
        0x25 => seq(1, 2),                 // dup
        0x26 => seq(1, 0),                 // pop
        JMP => OpSpec {
            flow: FlowType::UnconditionalBranch,
            effect: fixed(0, 0),
        },
        CALL | CALLI | CALLVIRT | NEWOBJ => OpSpec {
            flow: FlowType::Call,
            effect: StackEffect::Signature,
        },
        RET => OpSpec {
            flow: FlowType::Return,
            effect: StackEffect::ClearsStack,
        },
        BR_S | BR => OpSpec {
            flow: FlowType::UnconditionalBranch,
            effect: fixed(0, 0),
        },
        BRFALSE_S | BRTRUE_S | BRFALSE | BRTRUE => OpSpec {
            flow: FlowType::ConditionalBranch,
            effect: fixed(1, 0),
        },
        0x2E..=0x37 | 0x3B..=0x44 => OpSpec {
            flow: FlowType::ConditionalBranch,
            effect: fixed(2, 0),
        }, // beq..blt.un (short and long)
        SWITCH => OpSpec {
            flow: FlowType::Switch,
            effect: fixed(1, 0),
        },
        0x46..=0x50 => seq(1, 1),          // ldind.*
        0x51..=0x57 => seq(2, 0),          // stind.*
        0x58..=0x64 => seq(2, 1),          // add..shr.un
        0x65 | 0x66 => seq(1, 1),          // neg, not
        0x67..=0x6E | 0x76 => seq(1, 1),   // conv.*
        0x70 => seq(2, 0),                 // cpobj
        0x71 => seq(1, 1),                 // ldobj
        LDSTR => seq(0, 1),
        0x74 | 0x75 | 0x79 => seq(1, 1),   // castclass, isinst, unbox
        THROW => OpSpec {
            flow: FlowType::Throw,
            effect: fixed(1, 0),
        },
        0x7B | 0x7C => seq(1, 1),          // ldfld, ldflda
        0x7D => seq(2, 0),                 // stfld
        0x7E | 0x7F => seq(0, 1),          // ldsfld, ldsflda
        0x80 => seq(1, 0),                 // stsfld
        0x81 => seq(2, 0),                 // stobj
        0x82..=0x8B => seq(1, 1),          // conv.ovf.* (unsigned forms)
        0x8C | 0x8D | 0x8E => seq(1, 1),   // box, newarr, ldlen
        0x8F => seq(2, 1),                 // ldelema
        0x90..=0x9A | 0xA3 => seq(2, 1),   // ldelem.*
        0x9B..=0xA2 | 0xA4 => seq(3, 0),   // stelem.*
        0xA5 => seq(1, 1),                 // unbox.any
        0xB3..=0xBA | 0xC3 | 0xD1..=0xD5 | 0xE0 => seq(1, 1), // conv.ovf.*, ckfinite, conv.u*
        0xC2 | 0xC6 => seq(1, 1),          // refanyval, mkrefany
        0xD0 => seq(0, 1),                 // ldtoken
        0xD6..=0xDB => seq(2, 1),          // add.ovf..sub.ovf.un
        ENDFINALLY => OpSpec {
            flow: FlowType::EndFinally,
            effect: StackEffect::ClearsStack,
        },
        LEAVE | LEAVE_S => OpSpec {
            flow: FlowType::Leave,
            effect: StackEffect::ClearsStack,
        },
        0xDF => seq(2, 0),                 // stind.i
        _ => OpSpec {
            flow: FlowType::Sequential,
            effect: StackEffect::ClearsStack,
        },
    }
}

/// One position in a method's linear instruction stream.
///
/// Instructions are immutable once read; the substitution engine mutates a stream only
/// through the explicit rewrite operations on [`crate::assembly::Cursor`].
#[derive(Clone, PartialEq)]
pub struct Instruction {
    /// Primary opcode byte
    pub opcode: u8,
    /// Prefix byte (0 if no prefix)
    pub prefix: u8,
    /// Human-readable mnemonic (e.g. "ldstr", "callvirt")
    pub mnemonic: &'static str,
    /// The operand data for this instruction
    pub operand: Operand,
}

impl Instruction {
    /// Build an instruction from raw opcode bytes, an operand and a display mnemonic.
    #[must_use]
    pub fn raw(prefix: u8, opcode: u8, operand: Operand, mnemonic: &'static str) -> Self {
        Instruction {
            opcode,
            prefix,
            mnemonic,
            operand,
        }
    }

    /// `ldstr` -- push a string literal.
    #[must_use]
    pub fn ldstr(literal: impl Into<String>) -> Self {
        Instruction::raw(0, LDSTR, Operand::Literal(literal.into()), "ldstr")
    }

    /// `call` -- direct call to a resolved method.
    #[must_use]
    pub fn call(target: MethodSig) -> Self {
        Instruction::raw(0, CALL, Operand::Method(target), "call")
    }

    /// `callvirt` -- virtual call to a resolved method.
    #[must_use]
    pub fn callvirt(target: MethodSig) -> Self {
        Instruction::raw(0, CALLVIRT, Operand::Method(target), "callvirt")
    }

    /// `newobj` -- object construction through a resolved constructor.
    #[must_use]
    pub fn newobj(ctor: MethodSig) -> Self {
        Instruction::raw(0, NEWOBJ, Operand::Method(ctor), "newobj")
    }

    /// `calli` -- indirect call through a computed address with a declared shape.
    #[must_use]
    pub fn calli(shape: CallShape) -> Self {
        Instruction::raw(0, CALLI, Operand::Indirect(shape), "calli")
    }

    /// `nop`.
    #[must_use]
    pub fn nop() -> Self {
        Instruction::raw(0, NOP, Operand::None, "nop")
    }

    /// `ret`.
    #[must_use]
    pub fn ret() -> Self {
        Instruction::raw(0, RET, Operand::None, "ret")
    }

    /// `pop` -- discard the top of the stack.
    #[must_use]
    pub fn pop() -> Self {
        Instruction::raw(0, POP, Operand::None, "pop")
    }

    /// `dup` -- duplicate the top of the stack.
    #[must_use]
    pub fn dup() -> Self {
        Instruction::raw(0, DUP, Operand::None, "dup")
    }

    /// `ldnull`.
    #[must_use]
    pub fn ldnull() -> Self {
        Instruction::raw(0, LDNULL, Operand::None, "ldnull")
    }

    /// `ldc.i4` -- push a 32-bit integer constant.
    #[must_use]
    pub fn ldc_i4(value: i32) -> Self {
        Instruction::raw(0, LDC_I4, Operand::Int(i64::from(value)), "ldc.i4")
    }

    /// `ldloc.s` -- push a local variable.
    #[must_use]
    pub fn ldloc(index: u16) -> Self {
        Instruction::raw(0, LDLOC_S, Operand::Int(i64::from(index)), "ldloc.s")
    }

    /// `stloc.s` -- store the top of the stack into a local variable.
    #[must_use]
    pub fn stloc(index: u16) -> Self {
        Instruction::raw(0, STLOC_S, Operand::Int(i64::from(index)), "stloc.s")
    }

    /// `ldarg.s` -- push an argument.
    #[must_use]
    pub fn ldarg(index: u16) -> Self {
        Instruction::raw(0, LDARG_S, Operand::Int(i64::from(index)), "ldarg.s")
    }

    /// `br.s` -- unconditional short branch.
    #[must_use]
    pub fn br_s(displacement: i32) -> Self {
        Instruction::raw(0, BR_S, Operand::Target(displacement), "br.s")
    }

    /// `brtrue.s` -- conditional short branch.
    #[must_use]
    pub fn brtrue_s(displacement: i32) -> Self {
        Instruction::raw(0, BRTRUE_S, Operand::Target(displacement), "brtrue.s")
    }

    /// `brfalse.s` -- conditional short branch.
    #[must_use]
    pub fn brfalse_s(displacement: i32) -> Self {
        Instruction::raw(0, BRFALSE_S, Operand::Target(displacement), "brfalse.s")
    }

    /// `throw`.
    #[must_use]
    pub fn throw() -> Self {
        Instruction::raw(0, THROW, Operand::None, "throw")
    }

    /// Flow/stack classification of this instruction's opcode.
    #[must_use]
    pub fn spec(&self) -> OpSpec {
        op_spec(self.prefix, self.opcode)
    }

    /// Control flow classification.
    #[must_use]
    pub fn flow(&self) -> FlowType {
        self.spec().flow
    }

    /// Whether this instruction pushes a string literal.
    #[must_use]
    pub fn is_literal_load(&self) -> bool {
        self.prefix == 0 && self.opcode == LDSTR && matches!(self.operand, Operand::Literal(_))
    }

    /// The string literal pushed by this instruction, if it is a literal load.
    #[must_use]
    pub fn literal(&self) -> Option<&str> {
        if self.prefix == 0 && self.opcode == LDSTR {
            match &self.operand {
                Operand::Literal(text) => Some(text),
                _ => None,
            }
        } else {
            None
        }
    }

    /// Whether this is a call-like instruction (`call`, `callvirt`, `newobj`, `calli`).
    #[must_use]
    pub fn is_call(&self) -> bool {
        self.prefix == 0 && matches!(self.opcode, CALL | CALLVIRT | NEWOBJ | CALLI)
    }

    /// Pop/push counts of a call-like instruction, derived from its operand.
    ///
    /// Pops equal the declared parameter count. Pushes are 1 iff the target produces a
    /// value -- a declared return value for calls, the constructed instance for `newobj`.
    /// Returns `None` for non-call instructions or call instructions with a missing
    /// operand.
    #[must_use]
    pub fn call_stack_shape(&self) -> Option<(u32, u32)> {
        if !self.is_call() {
            return None;
        }
        match &self.operand {
            Operand::Method(sig) => {
                let pushes = if self.opcode == NEWOBJ || sig.has_return {
                    1
                } else {
                    0
                };
                Some((sig.param_count, pushes))
            }
            Operand::Indirect(shape) => {
                Some((shape.param_count, u32::from(shape.has_return)))
            }
            _ => None,
        }
    }

    /// Net stack-depth delta of this instruction (pushes minus pops).
    ///
    /// Returns `None` for the clears-stack sentinel, which callers simulating depth must
    /// treat as an instant resolution failure. Call-like instructions derive their delta
    /// from the operand signature; a call with a missing operand is also `None`.
    #[must_use]
    pub fn net_stack_delta(&self) -> Option<i32> {
        match self.spec().effect {
            StackEffect::Fixed(behavior) => Some(behavior.net()),
            StackEffect::ClearsStack => None,
            StackEffect::Signature => {
                let (pops, pushes) = self.call_stack_shape()?;
                Some(pushes as i32 - pops as i32)
            }
        }
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix != 0 {
            write!(f, "{:02X}:", self.prefix)?;
        }
        write!(f, "{:02X} - {:<12}", self.opcode, self.mnemonic)?;
        match &self.operand {
            Operand::None => {}
            Operand::Literal(text) => write!(f, " \"{text}\"")?,
            Operand::Method(sig) => write!(f, " {}::{}", sig.declaring_type, sig.name)?,
            Operand::Indirect(shape) => write!(
                f,
                " sig({} args{})",
                shape.param_count,
                if shape.has_return { " -> value" } else { "" }
            )?,
            Operand::Int(value) => write!(f, " {value}")?,
            Operand::Target(disp) => write!(f, " -> {disp:+}")?,
        }
        let flow = self.flow();
        if flow != FlowType::Sequential {
            write!(f, " | {flow}")?;
        }
        Ok(())
    }
}
