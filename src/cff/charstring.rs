//! Finds the subroutines a charstring depends on.
//!
//! Subroutine numbers are ordinary operands, so they can be computed by
//! arithmetic and their position on the stack depends on whether the glyph
//! starts with a width. Hint masks have a length that depends on the number of
//! stem hints declared before them. We therefore walk the charstring with a
//! real arguments stack, but without drawing anything.

use crate::cff::argstack::ArgumentsStack;
use crate::stream::Reader;
use crate::{Error, Result};
use log::trace;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;

/// The maximum nesting of subroutine calls.
const STACK_LIMIT: u8 = 10;
/// The number of slots for `put` and `get`.
const TRANSIENT_LEN: usize = 32;

const TWO_BYTE_OPERATOR_MARK: u8 = 12;

mod operator {
    pub const HORIZONTAL_STEM: u8 = 1;
    pub const VERTICAL_STEM: u8 = 3;
    pub const VERTICAL_MOVE_TO: u8 = 4;
    pub const LINE_TO: u8 = 5;
    pub const HORIZONTAL_LINE_TO: u8 = 6;
    pub const VERTICAL_LINE_TO: u8 = 7;
    pub const CURVE_TO: u8 = 8;
    pub const CALL_LOCAL_SUBROUTINE: u8 = 10;
    pub const RETURN: u8 = 11;
    pub const ENDCHAR: u8 = 14;
    pub const HORIZONTAL_STEM_HINT_MASK: u8 = 18;
    pub const HINT_MASK: u8 = 19;
    pub const COUNTER_MASK: u8 = 20;
    pub const MOVE_TO: u8 = 21;
    pub const HORIZONTAL_MOVE_TO: u8 = 22;
    pub const VERTICAL_STEM_HINT_MASK: u8 = 23;
    pub const CURVE_LINE: u8 = 24;
    pub const LINE_CURVE: u8 = 25;
    pub const VV_CURVE_TO: u8 = 26;
    pub const HH_CURVE_TO: u8 = 27;
    pub const SHORT_INT: u8 = 28;
    pub const CALL_GLOBAL_SUBROUTINE: u8 = 29;
    pub const VH_CURVE_TO: u8 = 30;
    pub const HV_CURVE_TO: u8 = 31;
    pub const FIXED_16_16: u8 = 255;

    // Two-byte operators.
    pub const AND: u8 = 3;
    pub const OR: u8 = 4;
    pub const NOT: u8 = 5;
    pub const ABS: u8 = 9;
    pub const ADD: u8 = 10;
    pub const SUB: u8 = 11;
    pub const DIV: u8 = 12;
    pub const NEG: u8 = 14;
    pub const EQ: u8 = 15;
    pub const DROP: u8 = 18;
    pub const PUT: u8 = 20;
    pub const GET: u8 = 21;
    pub const IFELSE: u8 = 22;
    pub const RANDOM: u8 = 23;
    pub const MUL: u8 = 24;
    pub const SQRT: u8 = 26;
    pub const DUP: u8 = 27;
    pub const EXCH: u8 = 28;
    pub const INDEX: u8 = 29;
    pub const ROLL: u8 = 30;
    pub const HFLEX: u8 = 34;
    pub const FLEX: u8 = 35;
    pub const HFLEX1: u8 = 36;
    pub const FLEX1: u8 = 37;
}

/// How the execution of a charstring ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// The data ran out.
    End,
    /// A subroutine returned.
    Return,
    /// The glyph is finished.
    EndChar,
}

/// Which subroutine INDEX a call refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Subrs {
    Local,
    Global,
}

/// Walks charstrings and collects the subroutines they call.
pub struct Tracer<'a> {
    local_subrs: &'a [Vec<u8>],
    local_bias: i32,
    global_subrs: &'a [Vec<u8>],
    global_bias: i32,
    stack: ArgumentsStack,
    transient: [f64; TRANSIENT_LEN],
    hint_count: usize,
    width_parsed: bool,
    /// Subroutines that are currently being executed.
    active: FxHashSet<(Subrs, usize)>,
    depth: u8,
    /// Local subroutines called by any traced glyph.
    pub used_local: BTreeSet<usize>,
    /// Global subroutines called by any traced glyph.
    pub used_global: BTreeSet<usize>,
}

impl<'a> Tracer<'a> {
    pub fn new(local_subrs: &'a [Vec<u8>], global_subrs: &'a [Vec<u8>]) -> Self {
        Self {
            local_subrs,
            local_bias: calc_subroutine_bias(local_subrs.len()),
            global_subrs,
            global_bias: calc_subroutine_bias(global_subrs.len()),
            stack: ArgumentsStack::new(),
            transient: [0.0; TRANSIENT_LEN],
            hint_count: 0,
            width_parsed: false,
            active: FxHashSet::default(),
            depth: 0,
            used_local: BTreeSet::new(),
            used_global: BTreeSet::new(),
        }
    }

    /// Trace the charstring of a single glyph.
    ///
    /// Returns the standard codes of the base and accent character if the glyph
    /// is an accented character built with the `seac` form of `endchar`.
    pub fn trace(&mut self, charstring: &[u8]) -> Result<Option<[u8; 2]>> {
        self.stack.clear();
        self.transient = [0.0; TRANSIENT_LEN];
        self.hint_count = 0;
        self.width_parsed = false;
        self.active.clear();
        self.depth = 0;

        let mut seac = None;
        self.execute(charstring, &mut seac)?;
        Ok(seac)
    }

    fn execute(&mut self, code: &[u8], seac: &mut Option<[u8; 2]>) -> Result<Flow> {
        let mut r = Reader::new(code);

        while !r.at_end() {
            let op = r.read::<u8>().ok_or(Error::MissingData)?;
            match op {
                operator::HORIZONTAL_STEM
                | operator::VERTICAL_STEM
                | operator::HORIZONTAL_STEM_HINT_MASK
                | operator::VERTICAL_STEM_HINT_MASK => {
                    self.count_hints();
                }
                operator::HINT_MASK | operator::COUNTER_MASK => {
                    // The stack may hold the arguments of an implicit `vstem`.
                    self.count_hints();
                    let len = self.hint_count.div_ceil(8);
                    r.skip_bytes(len).ok_or(Error::MissingData)?;
                }
                operator::MOVE_TO => {
                    self.handle_width(self.stack.len() > 2);
                    self.stack.clear();
                }
                operator::HORIZONTAL_MOVE_TO | operator::VERTICAL_MOVE_TO => {
                    self.handle_width(self.stack.len() > 1);
                    self.stack.clear();
                }
                operator::LINE_TO
                | operator::HORIZONTAL_LINE_TO
                | operator::VERTICAL_LINE_TO
                | operator::CURVE_TO
                | operator::CURVE_LINE
                | operator::LINE_CURVE
                | operator::VV_CURVE_TO
                | operator::HH_CURVE_TO
                | operator::VH_CURVE_TO
                | operator::HV_CURVE_TO => {
                    self.stack.clear();
                }
                operator::CALL_LOCAL_SUBROUTINE => {
                    if self.call(Subrs::Local, seac)? == Flow::EndChar {
                        return Ok(Flow::EndChar);
                    }
                }
                operator::CALL_GLOBAL_SUBROUTINE => {
                    if self.call(Subrs::Global, seac)? == Flow::EndChar {
                        return Ok(Flow::EndChar);
                    }
                }
                operator::RETURN => return Ok(Flow::Return),
                operator::ENDCHAR => {
                    self.handle_width(self.stack.len() % 2 == 1);
                    if self.stack.len() == 4 {
                        let achar = self.stack.pop()?;
                        let bchar = self.stack.pop()?;
                        *seac = Some([to_code(bchar)?, to_code(achar)?]);
                    }
                    self.stack.clear();
                    return Ok(Flow::EndChar);
                }
                TWO_BYTE_OPERATOR_MARK => {
                    let op2 = r.read::<u8>().ok_or(Error::MissingData)?;
                    self.execute_escape(op2)?;
                }
                operator::SHORT_INT => {
                    let n = r.read::<i16>().ok_or(Error::MissingData)?;
                    self.stack.push(f64::from(n))?;
                }
                32..=246 => {
                    self.stack.push(f64::from(i32::from(op) - 139))?;
                }
                247..=250 => {
                    let b1 = r.read::<u8>().ok_or(Error::MissingData)?;
                    let n = (i32::from(op) - 247) * 256 + i32::from(b1) + 108;
                    self.stack.push(f64::from(n))?;
                }
                251..=254 => {
                    let b1 = r.read::<u8>().ok_or(Error::MissingData)?;
                    let n = -(i32::from(op) - 251) * 256 - i32::from(b1) - 108;
                    self.stack.push(f64::from(n))?;
                }
                operator::FIXED_16_16 => {
                    let n = r.read::<i32>().ok_or(Error::MissingData)?;
                    self.stack.push(f64::from(n) / 65536.0)?;
                }
                _ => {
                    // Reserved.
                    trace!("skipping reserved charstring operator {op}");
                    self.stack.clear();
                }
            }
        }

        Ok(Flow::End)
    }

    fn execute_escape(&mut self, op: u8) -> Result<()> {
        let stack = &mut self.stack;
        match op {
            operator::AND => {
                let (a, b) = pop2(stack)?;
                stack.push(bool_to_f64(a != 0.0 && b != 0.0))?;
            }
            operator::OR => {
                let (a, b) = pop2(stack)?;
                stack.push(bool_to_f64(a != 0.0 || b != 0.0))?;
            }
            operator::NOT => {
                let a = stack.pop()?;
                stack.push(bool_to_f64(a == 0.0))?;
            }
            operator::ABS => {
                let a = stack.pop()?;
                stack.push(a.abs())?;
            }
            operator::ADD => {
                let (a, b) = pop2(stack)?;
                stack.push(a + b)?;
            }
            operator::SUB => {
                let (a, b) = pop2(stack)?;
                stack.push(a - b)?;
            }
            operator::DIV => {
                let (a, b) = pop2(stack)?;
                stack.push(if b == 0.0 { 0.0 } else { a / b })?;
            }
            operator::NEG => {
                let a = stack.pop()?;
                stack.push(-a)?;
            }
            operator::EQ => {
                let (a, b) = pop2(stack)?;
                stack.push(bool_to_f64(a == b))?;
            }
            operator::DROP => {
                stack.pop()?;
            }
            operator::PUT => {
                let (value, i) = pop2(stack)?;
                let slot = self.transient.get_mut(to_index(i)?).ok_or(Error::MalformedFont)?;
                *slot = value;
            }
            operator::GET => {
                let i = stack.pop()?;
                let value = *self.transient.get(to_index(i)?).ok_or(Error::MalformedFont)?;
                stack.push(value)?;
            }
            operator::IFELSE => {
                let (v1, v2) = pop2(stack)?;
                let (s1, s2) = pop2(stack)?;
                stack.push(if v1 <= v2 { s1 } else { s2 })?;
            }
            operator::RANDOM => {
                // Any value in (0, 1] will do, as long as it is reproducible.
                stack.push(0.5)?;
            }
            operator::MUL => {
                let (a, b) = pop2(stack)?;
                stack.push(a * b)?;
            }
            operator::SQRT => {
                let a = stack.pop()?;
                stack.push(a.max(0.0).sqrt())?;
            }
            operator::DUP => {
                let a = stack.peek(0)?;
                stack.push(a)?;
            }
            operator::EXCH => {
                let (a, b) = pop2(stack)?;
                stack.push(b)?;
                stack.push(a)?;
            }
            operator::INDEX => {
                let i = stack.pop()?;
                // Negative indices copy the top element.
                let depth = if i < 0.0 { 0 } else { to_index(i)? };
                let value = stack.peek(depth)?;
                stack.push(value)?;
            }
            operator::ROLL => {
                let (n, j) = pop2(stack)?;
                stack.roll(to_index(n)?, to_i32(j)? as isize)?;
            }
            operator::HFLEX | operator::FLEX | operator::HFLEX1 | operator::FLEX1 => {
                stack.clear();
            }
            _ => {
                trace!("skipping charstring operator 12 {op}");
                stack.clear();
            }
        }

        Ok(())
    }

    fn call(&mut self, kind: Subrs, seac: &mut Option<[u8; 2]>) -> Result<Flow> {
        let (subrs, bias) = match kind {
            Subrs::Local => (self.local_subrs, self.local_bias),
            Subrs::Global => (self.global_subrs, self.global_bias),
        };

        let operand = to_i32(self.stack.pop()?)?;
        let biased = operand.checked_add(bias).ok_or(Error::InvalidSubroutine(operand))?;
        let index = usize::try_from(biased)
            .ok()
            .filter(|&i| i < subrs.len())
            .ok_or(Error::InvalidSubroutine(biased))?;

        if self.depth >= STACK_LIMIT || !self.active.insert((kind, index)) {
            return Err(Error::MalformedFont);
        }

        trace!("calling {kind:?} subroutine {index}");
        match kind {
            Subrs::Local => self.used_local.insert(index),
            Subrs::Global => self.used_global.insert(index),
        };

        self.depth += 1;
        let flow = self.execute(&subrs[index], seac)?;
        self.depth -= 1;
        self.active.remove(&(kind, index));

        Ok(flow)
    }

    /// Count the stem hints on the stack.
    fn count_hints(&mut self) {
        self.handle_width(self.stack.len() % 2 == 1);
        self.hint_count += self.stack.len() / 2;
        self.stack.clear();
    }

    /// The first stack-clearing operator of a glyph may be preceded by the
    /// advance width, which is recognised by an extra operand.
    fn handle_width(&mut self, has_width: bool) {
        if !self.width_parsed && has_width {
            self.stack.shift();
        }
        self.width_parsed = true;
    }
}

/// The bias that is added to subroutine operands in an INDEX with `len`
/// entries.
pub fn calc_subroutine_bias(len: usize) -> i32 {
    if len < 1240 {
        107
    } else if len < 33900 {
        1131
    } else {
        32768
    }
}

fn pop2(stack: &mut ArgumentsStack) -> Result<(f64, f64)> {
    let b = stack.pop()?;
    let a = stack.pop()?;
    Ok((a, b))
}

fn bool_to_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn to_i32(n: f64) -> Result<i32> {
    if n.is_finite() && n >= f64::from(i32::MIN) && n <= f64::from(i32::MAX) {
        Ok(n as i32)
    } else {
        Err(Error::MalformedFont)
    }
}

fn to_index(n: f64) -> Result<usize> {
    usize::try_from(to_i32(n)?).map_err(|_| Error::MalformedFont)
}

fn to_code(n: f64) -> Result<u8> {
    u8::try_from(to_i32(n)?).map_err(|_| Error::MalformedFont)
}
