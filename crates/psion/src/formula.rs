//! Sheet formula expression trees.

use crate::opcode::Symbol;

/// One coordinate of a cell reference.
///
/// On the wire this is a `u16`: bit 15 marks an absolute coordinate and the
/// low 15 bits hold the offset, two's complement when relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SheetRef {
    pub offset: i16,
    pub absolute: bool,
}

impl SheetRef {
    pub const MIN_OFFSET: i16 = -0x4000;
    pub const MAX_OFFSET: i16 = 0x3fff;

    pub fn absolute(offset: i16) -> Self {
        SheetRef {
            offset,
            absolute: true,
        }
    }

    pub fn relative(offset: i16) -> Self {
        SheetRef {
            offset,
            absolute: false,
        }
    }

    pub(crate) fn from_raw(raw: u16) -> Self {
        SheetRef {
            offset: ((raw << 1) as i16) >> 1,
            absolute: raw & 0x8000 != 0,
        }
    }

    pub(crate) fn to_raw(self) -> Option<u16> {
        if !(Self::MIN_OFFSET..=Self::MAX_OFFSET).contains(&self.offset) {
            return None;
        }
        let flag = if self.absolute { 0x8000 } else { 0 };
        Some(flag | (self.offset as u16 & 0x7fff))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellRef {
    pub row: SheetRef,
    pub column: SheetRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellBlock {
    pub first: CellRef,
    pub last: CellRef,
}

/// A decoded formula. Operation nodes own their operands in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    Int(u16),
    Float(f64),
    String(String),
    Variable(u32),
    CellRef(CellRef),
    CellBlock(CellBlock),
    Operation {
        symbol: Symbol,
        operands: Vec<Formula>,
    },
}

impl Formula {
    pub fn operation(symbol: Symbol, operands: Vec<Formula>) -> Self {
        Formula::Operation { symbol, operands }
    }

    pub fn symbol(&self) -> Symbol {
        match self {
            Formula::Int(_) => Symbol::IntLiteral,
            Formula::Float(_) => Symbol::FloatLiteral,
            Formula::String(_) => Symbol::StringLiteral,
            Formula::Variable(_) => Symbol::VariableRef,
            Formula::CellRef(_) => Symbol::CellRef,
            Formula::CellBlock(_) => Symbol::CellBlock,
            Formula::Operation { symbol, .. } => *symbol,
        }
    }

    pub fn operands(&self) -> &[Formula] {
        match self {
            Formula::Operation { operands, .. } => operands,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_ref_raw() {
        assert_eq!(SheetRef::from_raw(0x8005), SheetRef::absolute(5));
        assert_eq!(SheetRef::from_raw(0x7fff), SheetRef::relative(-1));
        assert_eq!(SheetRef::relative(-1).to_raw(), Some(0x7fff));
        assert_eq!(SheetRef::absolute(3).to_raw(), Some(0x8003));
        assert_eq!(SheetRef::relative(0x4000).to_raw(), None);
    }

    #[test]
    fn test_symbol_of_nodes() {
        let node = Formula::operation(Symbol::Add, vec![Formula::Int(1), Formula::Float(2.5)]);
        assert_eq!(node.symbol(), Symbol::Add);
        assert_eq!(node.operands()[1].symbol(), Symbol::FloatLiteral);
        assert!(Formula::Int(1).operands().is_empty());
    }
}
