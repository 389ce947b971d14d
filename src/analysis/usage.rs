//! Usage resolution: which call consumes a pushed literal.
//!
//! Given the position of a literal load inside a method body, [`find_consuming_call`]
//! walks the straight-line span that follows it, simulating evaluation-stack depth with
//! the per-opcode stack-effect model, until it reaches the call that pops the literal
//! as one of its arguments. This is an abstract depth simulation, not data flow: it is
//! exact for the dominant shape (literal pushed directly into a call's argument list in
//! straight-line code) and deliberately answers "unknown" for everything else.
//!
//! "Unknown" (`None`) is not an error. Site filters that gate on the consumer must
//! treat it conservatively and admit the site.

use crate::assembly::{FlowType, Instruction, Operand, StackEffect};
use crate::metadata::MethodSig;

/// Find the call that consumes the literal pushed at `literal_index`.
///
/// The literal is modeled as one value already sitting on an otherwise empty stack.
/// Walking forward from the next instruction:
///
/// - any control flow other than falling through (branches, returns, throws, switch,
///   leave) ends resolution with `None` -- branch targets are never followed;
/// - a direct or constructor call first pops its declared parameters; when that drains
///   the simulated stack the call is the consumer and its signature is returned,
///   otherwise its produced value (if any) is pushed back and the walk continues;
/// - an indirect call applies the same arithmetic from its declared shape, but when it
///   turns out to be the consumer the result is `None`: an indirect consumer can never
///   be attributed to a concrete signature;
/// - an ordinary instruction whose pops drain the stack means the literal was consumed
///   by something other than a call (stored to a local, compared, discarded) and there
///   is no usage to report;
/// - the clears-stack sentinel and the end of the stream also yield `None`.
#[must_use]
pub fn find_consuming_call(instructions: &[Instruction], literal_index: usize) -> Option<MethodSig> {
    debug_assert!(
        instructions
            .get(literal_index)
            .is_some_and(Instruction::is_literal_load),
        "usage resolution must start at a literal load"
    );

    let mut depth: i32 = 1;
    for instruction in instructions.iter().skip(literal_index + 1) {
        let spec = instruction.spec();
        if !spec.flow.falls_through() {
            return None;
        }

        if instruction.is_call() {
            let (pops, pushes) = instruction.call_stack_shape()?;
            depth -= i32::try_from(pops).ok()?;
            if depth <= 0 {
                return match &instruction.operand {
                    Operand::Method(sig) => Some(sig.clone()),
                    // calli: stack shape is known, the target is not.
                    _ => None,
                };
            }
            depth += i32::try_from(pushes).ok()?;
            continue;
        }

        match spec.effect {
            StackEffect::Fixed(behavior) => {
                depth -= i32::from(behavior.pops);
                if depth <= 0 {
                    return None;
                }
                depth += i32::from(behavior.pushes);
            }
            StackEffect::ClearsStack => return None,
            // Call-like effect on a non-call opcode cannot occur.
            StackEffect::Signature => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::CallShape;

    fn show() -> MethodSig {
        MethodSig::new("Host.UI.Dialog", "Show", 1, false)
    }

    fn concat() -> MethodSig {
        MethodSig::new("System.String", "Concat", 2, true)
    }

    #[test]
    fn literal_followed_by_single_arg_call() {
        let body = [Instruction::ldstr("Hello"), Instruction::call(show())];
        assert_eq!(find_consuming_call(&body, 0), Some(show()));
    }

    #[test]
    fn intervening_pushes_feed_the_same_call() {
        // "Hello" + local -> Concat(2 args) consumes both.
        let body = [
            Instruction::ldstr("Hello"),
            Instruction::ldloc(0),
            Instruction::call(concat()),
        ];
        assert_eq!(find_consuming_call(&body, 0), Some(concat()));
    }

    #[test]
    fn call_return_value_flows_into_later_consumer() {
        // Concat produces a value above the literal; Show then consumes the result,
        // and the literal is attributed to Show's argument list.
        let body = [
            Instruction::ldstr("Hello"),
            Instruction::ldloc(0),
            Instruction::ldloc(1),
            Instruction::call(concat()),
            Instruction::call(MethodSig::new("Host.UI.Dialog", "Show", 2, false)),
        ];
        assert_eq!(
            find_consuming_call(&body, 0),
            Some(MethodSig::new("Host.UI.Dialog", "Show", 2, false))
        );
    }

    #[test]
    fn constructor_call_is_a_consumer() {
        let ctor = MethodSig::new("Host.UI.Tooltip", ".ctor", 1, false);
        let body = [Instruction::ldstr("tip"), Instruction::newobj(ctor.clone())];
        assert_eq!(find_consuming_call(&body, 0), Some(ctor));
    }

    #[test]
    fn branch_between_literal_and_call_is_unknown() {
        let body = [
            Instruction::ldstr("Hello"),
            Instruction::brtrue_s(1),
            Instruction::call(show()),
        ];
        assert_eq!(find_consuming_call(&body, 0), None);
    }

    #[test]
    fn return_and_throw_are_unknown() {
        let ret = [Instruction::ldstr("Hello"), Instruction::ret()];
        assert_eq!(find_consuming_call(&ret, 0), None);
        let throw = [Instruction::ldstr("Hello"), Instruction::throw()];
        assert_eq!(find_consuming_call(&throw, 0), None);
    }

    #[test]
    fn indirect_consumer_is_unknown() {
        let body = [
            Instruction::ldstr("Hello"),
            Instruction::calli(CallShape {
                param_count: 1,
                has_return: false,
            }),
        ];
        assert_eq!(find_consuming_call(&body, 0), None);
    }

    #[test]
    fn indirect_non_consumer_is_walked_through() {
        // calli consumes only values pushed above the literal, then Show consumes it.
        let body = [
            Instruction::ldstr("Hello"),
            Instruction::ldloc(0),
            Instruction::calli(CallShape {
                param_count: 1,
                has_return: false,
            }),
            Instruction::call(show()),
        ];
        assert_eq!(find_consuming_call(&body, 0), Some(show()));
    }

    #[test]
    fn store_to_local_is_unknown() {
        let body = [
            Instruction::ldstr("Hello"),
            Instruction::stloc(0),
            Instruction::ldloc(0),
            Instruction::call(show()),
        ];
        assert_eq!(find_consuming_call(&body, 0), None);
    }

    #[test]
    fn stream_end_is_unknown() {
        let body = [Instruction::ldstr("Hello"), Instruction::nop()];
        assert_eq!(find_consuming_call(&body, 0), None);
    }

    #[test]
    fn deeper_literal_not_consumed_by_small_call() {
        // Show takes the topmost value only; the literal below it survives, and the
        // stream then ends without a consumer for it.
        let body = [
            Instruction::ldstr("Hello"),
            Instruction::ldloc(0),
            Instruction::call(show()),
        ];
        assert_eq!(find_consuming_call(&body, 0), None);
    }

    #[test]
    fn resolution_is_deterministic() {
        let body = [
            Instruction::ldstr("Hello"),
            Instruction::ldloc(0),
            Instruction::call(concat()),
        ];
        let first = find_consuming_call(&body, 0);
        for _ in 0..4 {
            assert_eq!(find_consuming_call(&body, 0), first);
        }
    }
}
