//! Decoding of sheet formula bytecode.
//!
//! A formula is an `S` integer byte length followed by marker bytes in
//! postfix order, ending with the end-of-formula marker. Fixed arity
//! operators pop their operands from a stack. Variable arity functions are
//! written prefix: the function marker, each operand terminated by a
//! separator (or the list end after the last one), the function marker
//! again and a `u16` operand count.
//!
//! Function calls are decoded with an explicit frame stack rather than by
//! recursion, so nesting depth is bounded by [`Config::max_formula_depth`].
//!
//! [`Config::max_formula_depth`]: crate::config::Config::max_formula_depth

use std::io::{Read, Seek};

use byyte::ByteReader;

use crate::error::{Error, Result};
use crate::formula::{CellBlock, CellRef, Formula, SheetRef};
use crate::opcode::{self, Arity, Symbol, marker};
use crate::session::Session;

/// A variable arity call whose operands are still being read.
struct Call {
    marker: u8,
    symbol: Symbol,
}

#[derive(Default)]
struct Frame {
    call: Option<Call>,
    operands: Vec<Formula>,
    stack: Vec<Formula>,
}

impl Frame {
    fn call(marker: u8, symbol: Symbol) -> Self {
        Frame {
            call: Some(Call { marker, symbol }),
            ..Frame::default()
        }
    }
}

fn read_cell_ref<R: Read>(reader: &mut R) -> Result<CellRef> {
    let row = SheetRef::from_raw(reader.read_u16()?);
    let column = SheetRef::from_raw(reader.read_u16()?);
    Ok(CellRef { row, column })
}

fn read_literal<R: Read>(reader: &mut R, symbol: Symbol) -> Result<Formula> {
    Ok(match symbol {
        Symbol::IntLiteral => Formula::Int(reader.read_u16()?),
        Symbol::FloatLiteral => Formula::Float(reader.read_f64()?),
        Symbol::StringLiteral => {
            let length = reader.read_u8()?;
            Formula::String(reader.read_latin1(length.into())?)
        }
        Symbol::VariableRef => Formula::Variable(reader.read_u32()?),
        Symbol::CellRef => Formula::CellRef(read_cell_ref(reader)?),
        Symbol::CellBlock => {
            let first = read_cell_ref(reader)?;
            let last = read_cell_ref(reader)?;
            Formula::CellBlock(CellBlock { first, last })
        }
        other => {
            return Err(Error::Other(format!("{} is not a literal", other.name())));
        }
    })
}

/// Reads marker bytes up to `end` and rebuilds the expression tree.
fn read_body<R: Read + Seek>(reader: &mut R, session: &Session, end: u64) -> Result<Formula> {
    let max_depth = session.config().max_formula_depth;
    let mut current = Frame::default();
    let mut parents: Vec<Frame> = Vec::new();

    loop {
        let at = reader.stream_position()?;
        if at >= end {
            return Err(Error::Parse(format!(
                "formula runs past its length at {at:#x} without an end marker"
            )));
        }
        let code = reader.read_u8()?;
        let opcode = opcode::lookup(code);
        let symbol = opcode.symbol;

        if symbol == Symbol::Unknown {
            return Err(Error::Parse(format!(
                "unknown formula marker {code:#04x} at {at:#x}"
            )));
        }

        if symbol.is_literal() {
            current.stack.push(read_literal(reader, symbol)?);
            continue;
        }

        if symbol.is_terminator() {
            let Some(call) = current.call.as_ref() else {
                if code != marker::END {
                    return Err(Error::Parse(format!(
                        "{} at {at:#x} outside a function call",
                        symbol.name()
                    )));
                }
                if current.stack.len() != 1 {
                    return Err(Error::Parse(format!(
                        "formula leaves {} values instead of one",
                        current.stack.len()
                    )));
                }
                return current
                    .stack
                    .pop()
                    .ok_or_else(|| Error::Other("formula stack emptied".to_owned()));
            };

            if code == marker::END {
                return Err(Error::Parse(format!(
                    "formula ends inside {} at {at:#x}",
                    call.symbol.name()
                )));
            }
            match current.stack.len() {
                1 => current.operands.extend(current.stack.pop()),
                0 if code == marker::LIST_END && current.operands.is_empty() => {}
                n => {
                    return Err(Error::Parse(format!(
                        "operand {} of {} leaves {n} values",
                        current.operands.len() + 1,
                        call.symbol.name()
                    )));
                }
            }
            if code == marker::SEPARATOR {
                continue;
            }

            let restated = reader.read_u8()?;
            if restated != call.marker {
                return Err(Error::Parse(format!(
                    "{} operand list closed by marker {restated:#04x}",
                    call.symbol.name()
                )));
            }
            let count = reader.read_u16()?;
            if usize::from(count) != current.operands.len() {
                return Err(Error::Parse(format!(
                    "{} declares {count} operands but has {}",
                    call.symbol.name(),
                    current.operands.len()
                )));
            }

            let symbol = call.symbol;
            let parent = parents
                .pop()
                .ok_or_else(|| Error::Other("function call without enclosing frame".to_owned()))?;
            let finished = std::mem::replace(&mut current, parent);
            current
                .stack
                .push(Formula::operation(symbol, finished.operands));
            continue;
        }

        match opcode.arity {
            Arity::Fixed(count) => {
                let count = usize::from(count);
                if current.stack.len() < count {
                    return Err(Error::Parse(format!(
                        "{} at {at:#x} needs {count} operands, stack holds {}",
                        symbol.name(),
                        current.stack.len()
                    )));
                }
                let operands = current.stack.split_off(current.stack.len() - count);
                current.stack.push(Formula::operation(symbol, operands));
            }
            Arity::Variable => {
                if parents.len() >= max_depth {
                    return Err(Error::Parse(format!(
                        "function calls nested deeper than {max_depth} at {at:#x}"
                    )));
                }
                parents.push(std::mem::replace(&mut current, Frame::call(code, symbol)));
            }
        }
    }
}

pub fn decode_formula<R: Read + Seek>(reader: &mut R, session: &mut Session) -> Result<Formula> {
    let length = u64::from(reader.read_s()?);
    let start = reader.stream_position()?;
    let end = start + length;

    let formula = read_body(reader, session, end)?;

    let at = reader.stream_position()?;
    if at != end {
        return Err(Error::Parse(format!(
            "formula at {start:#x} declares {length} bytes but holds {}",
            at - start
        )));
    }
    tracing::trace!(offset = start, length, "decoded formula");
    Ok(formula)
}

/// Reads an `X` integer count followed by that many formulas.
pub fn decode_formula_list<R: Read + Seek>(
    reader: &mut R,
    session: &mut Session,
) -> Result<Vec<Formula>> {
    let count = reader.read_x()?;
    let mut formulas = Vec::new();
    for _ in 0..count {
        formulas.push(decode_formula(reader, session)?);
    }
    tracing::debug!(count, "decoded formula list");
    Ok(formulas)
}
