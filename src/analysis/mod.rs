//! Instruction-stream analysis.
//!
//! Currently one analysis: usage resolution, the abstract stack simulation that
//! attributes a pushed literal to the call consuming it.

mod usage;

pub use usage::find_consuming_call;
