//! Encoding of formula trees back into sheet bytecode.

use std::io::Write;

use byyte::ByteWriter;

use crate::error::{Error, Result};
use crate::formula::{CellRef, Formula, SheetRef};
use crate::opcode::{Arity, Symbol, marker};

/// Largest body an `S` integer can frame.
const MAX_FORMULA_LENGTH: usize = 0x1fff;

fn write_sheet_ref(out: &mut Vec<u8>, coordinate: SheetRef) -> Result<()> {
    let raw = coordinate.to_raw().ok_or_else(|| {
        Error::Generate(format!(
            "cell offset {} outside {}..={}",
            coordinate.offset,
            SheetRef::MIN_OFFSET,
            SheetRef::MAX_OFFSET
        ))
    })?;
    out.write_u16(raw)?;
    Ok(())
}

fn write_cell_ref(out: &mut Vec<u8>, cell: &CellRef) -> Result<()> {
    write_sheet_ref(out, cell.row)?;
    write_sheet_ref(out, cell.column)
}

fn write_node(out: &mut Vec<u8>, node: &Formula) -> Result<()> {
    match node {
        Formula::Int(value) => {
            out.write_u8(marker::INT)?;
            out.write_u16(*value)?;
        }
        Formula::Float(value) => {
            out.write_u8(marker::FLOAT)?;
            out.write_f64(*value)?;
        }
        Formula::String(value) => {
            let length = u8::try_from(value.chars().count()).map_err(|_| {
                Error::Generate(format!("string literal of {} characters", value.len()))
            })?;
            out.write_u8(marker::STRING)?;
            out.write_u8(length)?;
            out.write_latin1(value)?;
        }
        Formula::Variable(index) => {
            out.write_u8(marker::VARIABLE)?;
            out.write_u32(*index)?;
        }
        Formula::CellRef(cell) => {
            out.write_u8(marker::CELL_REF)?;
            write_cell_ref(out, cell)?;
        }
        Formula::CellBlock(block) => {
            out.write_u8(marker::CELL_BLOCK)?;
            write_cell_ref(out, &block.first)?;
            write_cell_ref(out, &block.last)?;
        }
        Formula::Operation { symbol, operands } => write_operation(out, *symbol, operands)?,
    }
    Ok(())
}

fn write_operation(out: &mut Vec<u8>, symbol: Symbol, operands: &[Formula]) -> Result<()> {
    let opcode = match symbol.opcode() {
        Some(opcode) if symbol.is_operation() => opcode,
        _ => {
            return Err(Error::Generate(format!(
                "{} cannot own operands",
                symbol.name()
            )));
        }
    };
    let code = symbol
        .marker()
        .ok_or_else(|| Error::Other(format!("{} has no marker", symbol.name())))?;

    match opcode.arity {
        Arity::Fixed(count) => {
            if operands.len() != usize::from(count) {
                return Err(Error::Generate(format!(
                    "{} takes {count} operands, got {}",
                    opcode.name,
                    operands.len()
                )));
            }
            for operand in operands {
                write_node(out, operand)?;
            }
            out.write_u8(code)?;
        }
        Arity::Variable => {
            let count = u16::try_from(operands.len()).map_err(|_| {
                Error::Generate(format!("{} with {} operands", opcode.name, operands.len()))
            })?;
            out.write_u8(code)?;
            for (i, operand) in operands.iter().enumerate() {
                if i > 0 {
                    out.write_u8(marker::SEPARATOR)?;
                }
                write_node(out, operand)?;
            }
            out.write_u8(marker::LIST_END)?;
            out.write_u8(code)?;
            out.write_u16(count)?;
        }
    }
    Ok(())
}

/// Writes `formula` framed by its `S` integer length.
pub fn encode_formula<W: Write>(out: &mut W, formula: &Formula) -> Result<()> {
    let mut body = Vec::new();
    write_node(&mut body, formula)?;
    body.write_u8(marker::END)?;

    if body.len() > MAX_FORMULA_LENGTH {
        return Err(Error::Generate(format!(
            "formula of {} bytes exceeds {MAX_FORMULA_LENGTH}",
            body.len()
        )));
    }
    out.write_s(body.len() as u16)?;
    out.write_all(&body)?;
    Ok(())
}

/// Writes an `X` integer count followed by each framed formula.
pub fn encode_formula_list<W: Write>(out: &mut W, formulas: &[Formula]) -> Result<()> {
    let count = u32::try_from(formulas.len())
        .map_err(|_| Error::Generate(format!("{} formulas", formulas.len())))?;
    out.write_x(count)?;
    for formula in formulas {
        encode_formula(out, formula)?;
    }
    Ok(())
}
