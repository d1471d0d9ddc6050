//! Sheet formula opcode table.
//!
//! Every marker byte maps to a symbol and an operand count. The numbering is
//! part of the file format; bytes that are not listed decode as
//! [`Symbol::Unknown`].

/// Number of operands an opcode takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(u8),
    /// Operands are listed inline and followed by an explicit count.
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub symbol: Symbol,
    pub name: &'static str,
    pub arity: Arity,
}

impl Opcode {
    const UNKNOWN: Opcode = Opcode {
        symbol: Symbol::Unknown,
        name: "unknown",
        arity: Arity::Fixed(0),
    };
}

pub mod marker {
    pub const END: u8 = 0x13;
    pub const FLOAT: u8 = 0x14;
    pub const INT: u8 = 0x15;
    pub const VARIABLE: u8 = 0x16;
    pub const STRING: u8 = 0x17;
    pub const CELL_REF: u8 = 0x18;
    pub const CELL_BLOCK: u8 = 0x19;
    pub const SEPARATOR: u8 = 0x1b;
    pub const LIST_END: u8 = 0x1c;
}

macro_rules! opcodes {
    ($($marker:expr => $symbol:ident, $name:literal, $arity:expr;)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Symbol {
            Unknown,
            $($symbol,)*
        }

        const ENTRIES: &[(u8, Symbol, &str, Arity)] = &[
            $(($marker, Symbol::$symbol, $name, $arity),)*
        ];
    };
}

use Arity::{Fixed, Variable};

opcodes! {
    0x01 => Lt, "<", Fixed(2);
    0x02 => Le, "<=", Fixed(2);
    0x03 => Gt, ">", Fixed(2);
    0x04 => Ge, ">=", Fixed(2);
    0x05 => Ne, "<>", Fixed(2);
    0x06 => Eq, "=", Fixed(2);
    0x07 => Add, "+", Fixed(2);
    0x08 => Sub, "-", Fixed(2);
    0x09 => Mul, "*", Fixed(2);
    0x0a => Div, "/", Fixed(2);
    0x0b => Pow, "^", Fixed(2);
    0x0c => Plus, "+", Fixed(1);
    0x0d => Minus, "-", Fixed(1);
    0x0e => Not, "NOT", Fixed(1);
    0x0f => And, "AND", Fixed(2);
    0x10 => Or, "OR", Fixed(2);
    0x11 => Concat, "&", Fixed(2);
    0x12 => Parens, "()", Fixed(1);
    marker::END => EndOfFormula, "end of formula", Fixed(0);
    marker::FLOAT => FloatLiteral, "float", Fixed(0);
    marker::INT => IntLiteral, "integer", Fixed(0);
    marker::VARIABLE => VariableRef, "variable", Fixed(0);
    marker::STRING => StringLiteral, "string", Fixed(0);
    marker::CELL_REF => CellRef, "cell reference", Fixed(0);
    marker::CELL_BLOCK => CellBlock, "cell block", Fixed(0);
    marker::SEPARATOR => OperandSeparator, "operand separator", Fixed(0);
    marker::LIST_END => OperandListEnd, "operand list end", Fixed(0);

    0x20 => False, "FALSE", Fixed(0);
    0x21 => If, "IF", Fixed(3);
    0x22 => True, "TRUE", Fixed(0);
    0x23 => Cell, "CELL", Fixed(2);
    0x24 => ErrorType, "ERRORTYPE", Fixed(0);
    0x25 => IsBlank, "ISBLANK", Fixed(1);
    0x26 => IsErr, "ISERR", Fixed(1);
    0x27 => IsError, "ISERROR", Fixed(1);
    0x28 => IsLogical, "ISLOGICAL", Fixed(1);
    0x29 => IsNa, "ISNA", Fixed(1);
    0x2a => IsNonText, "ISNONTEXT", Fixed(1);
    0x2b => IsNumber, "ISNUMBER", Fixed(1);
    0x2c => IsText, "ISTEXT", Fixed(1);
    0x2d => Na, "NA", Fixed(0);
    0x2e => Type, "TYPE", Fixed(1);

    0x2f => Date, "DATE", Fixed(3);
    0x30 => DateValue, "DATEVALUE", Fixed(1);
    0x31 => Day, "DAY", Fixed(1);
    0x32 => Hour, "HOUR", Fixed(1);
    0x33 => Minute, "MINUTE", Fixed(1);
    0x34 => Month, "MONTH", Fixed(1);
    0x35 => Now, "NOW", Fixed(0);
    0x36 => Second, "SECOND", Fixed(1);
    0x37 => Today, "TODAY", Fixed(0);
    0x38 => Time, "TIME", Fixed(3);
    0x39 => TimeValue, "TIMEVALUE", Fixed(1);
    0x3a => Weekday, "WEEKDAY", Fixed(1);
    0x3b => Year, "YEAR", Fixed(1);

    0x3c => Abs, "ABS", Fixed(1);
    0x3d => Acos, "ACOS", Fixed(1);
    0x3e => Asin, "ASIN", Fixed(1);
    0x3f => Atan, "ATAN", Fixed(1);
    0x40 => Atan2, "ATAN2", Fixed(2);
    0x41 => Cos, "COS", Fixed(1);
    0x42 => Degrees, "DEGREES", Fixed(1);
    0x43 => Exp, "EXP", Fixed(1);
    0x44 => Fact, "FACT", Fixed(1);
    0x45 => Int, "INT", Fixed(1);
    0x46 => Ln, "LN", Fixed(1);
    0x47 => Log10, "LOG10", Fixed(1);
    0x48 => Mod, "MOD", Fixed(2);
    0x49 => Pi, "PI", Fixed(0);
    0x4a => Radians, "RADIANS", Fixed(1);
    0x4b => Rand, "RAND", Fixed(0);
    0x4c => Round, "ROUND", Fixed(2);
    0x4d => Sign, "SIGN", Fixed(1);
    0x4e => Sin, "SIN", Fixed(1);
    0x4f => Sqrt, "SQRT", Fixed(1);
    0x50 => SumProduct, "SUMPRODUCT", Variable;
    0x51 => Tan, "TAN", Fixed(1);
    0x52 => Trunc, "TRUNC", Fixed(1);

    0x53 => Cterm, "CTERM", Fixed(3);
    0x54 => Ddb, "DDB", Fixed(4);
    0x55 => Fv, "FV", Fixed(3);
    0x56 => Irr, "IRR", Variable;
    0x57 => Npv, "NPV", Fixed(2);
    0x58 => Pmt, "PMT", Fixed(3);
    0x59 => Pv, "PV", Fixed(3);
    0x5a => Rate, "RATE", Fixed(3);
    0x5b => Sln, "SLN", Fixed(3);
    0x5c => Syd, "SYD", Fixed(4);
    0x5d => Term, "TERM", Fixed(3);

    0x5e => Choose, "CHOOSE", Variable;
    0x5f => Columns, "COLUMNS", Fixed(1);
    0x60 => Hlookup, "HLOOKUP", Fixed(3);
    0x61 => Index, "INDEX", Fixed(3);
    0x62 => Rows, "ROWS", Fixed(1);
    0x63 => Vlookup, "VLOOKUP", Fixed(3);

    0x64 => Char, "CHAR", Fixed(1);
    0x65 => Code, "CODE", Fixed(1);
    0x66 => Exact, "EXACT", Fixed(2);
    0x67 => Find, "FIND", Fixed(3);
    0x68 => Left, "LEFT", Fixed(2);
    0x69 => Len, "LEN", Fixed(1);
    0x6a => Lower, "LOWER", Fixed(1);
    0x6b => Mid, "MID", Fixed(3);
    0x6c => Proper, "PROPER", Fixed(1);
    0x6d => Replace, "REPLACE", Fixed(4);
    0x6e => Rept, "REPT", Fixed(2);
    0x6f => Right, "RIGHT", Fixed(2);
    0x70 => Str, "STRING", Fixed(2);
    0x71 => T, "T", Fixed(1);
    0x72 => Trim, "TRIM", Fixed(1);
    0x73 => Upper, "UPPER", Fixed(1);
    0x74 => Value, "VALUE", Fixed(1);

    0x75 => Average, "AVERAGE", Variable;
    0x76 => Count, "COUNT", Variable;
    0x77 => CountA, "COUNTA", Variable;
    0x78 => Max, "MAX", Variable;
    0x79 => Min, "MIN", Variable;
    0x7a => Std, "STD", Variable;
    0x7b => Stdp, "STDP", Variable;
    0x7c => Sum, "SUM", Variable;
    0x7d => SumSq, "SUMSQ", Variable;
    0x7e => Var, "VAR", Variable;
    0x7f => Varp, "VARP", Variable;
}

const fn build_table() -> [Opcode; 256] {
    let mut table = [Opcode::UNKNOWN; 256];
    let mut i = 0;
    while i < ENTRIES.len() {
        let (marker, symbol, name, arity) = ENTRIES[i];
        table[marker as usize] = Opcode {
            symbol,
            name,
            arity,
        };
        i += 1;
    }
    table
}

pub static OPCODES: [Opcode; 256] = build_table();

pub fn lookup(marker: u8) -> &'static Opcode {
    &OPCODES[usize::from(marker)]
}

impl Symbol {
    /// The marker byte for this symbol, `None` for [`Symbol::Unknown`].
    pub fn marker(self) -> Option<u8> {
        ENTRIES
            .iter()
            .find(|(_, symbol, _, _)| *symbol == self)
            .map(|(marker, _, _, _)| *marker)
    }

    pub fn opcode(self) -> Option<&'static Opcode> {
        self.marker().map(lookup)
    }

    pub fn name(self) -> &'static str {
        self.opcode().map_or(Opcode::UNKNOWN.name, |opcode| opcode.name)
    }

    /// Literal leaves carry a payload instead of operands.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            Symbol::FloatLiteral
                | Symbol::IntLiteral
                | Symbol::VariableRef
                | Symbol::StringLiteral
                | Symbol::CellRef
                | Symbol::CellBlock
        )
    }

    /// Markers that end an operand or the whole formula.
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            Symbol::EndOfFormula | Symbol::OperandSeparator | Symbol::OperandListEnd
        )
    }

    /// Operators and functions, the symbols that own operands.
    pub fn is_operation(self) -> bool {
        !(self == Symbol::Unknown || self.is_literal() || self.is_terminator())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_entries() {
        assert_eq!(lookup(0x07).symbol, Symbol::Add);
        assert_eq!(lookup(0x07).arity, Fixed(2));
        assert_eq!(lookup(0x0d).symbol, Symbol::Minus);
        assert_eq!(lookup(0x0d).arity, Fixed(1));
        assert_eq!(lookup(0x7c).symbol, Symbol::Sum);
        assert_eq!(lookup(0x7c).arity, Variable);
        assert_eq!(lookup(marker::END).symbol, Symbol::EndOfFormula);
    }

    #[test]
    fn test_unassigned_bytes_are_unknown() {
        for marker in [0x00, 0x1a, 0x1d, 0x1e, 0x1f, 0x80, 0xff] {
            assert_eq!(lookup(marker).symbol, Symbol::Unknown, "marker {marker:#04x}");
        }
    }

    #[test]
    fn test_markers_are_unique_and_reversible() {
        let mut seen = [false; 256];
        for (marker, symbol, _, _) in ENTRIES {
            assert!(!seen[usize::from(*marker)], "marker {marker:#04x} listed twice");
            seen[usize::from(*marker)] = true;
            assert_eq!(symbol.marker(), Some(*marker));
        }
        assert_eq!(Symbol::Unknown.marker(), None);
    }

    #[test]
    fn test_symbol_classes() {
        assert!(Symbol::IntLiteral.is_literal());
        assert!(Symbol::OperandListEnd.is_terminator());
        assert!(Symbol::Sum.is_operation());
        assert!(Symbol::Pi.is_operation());
        assert!(!Symbol::CellBlock.is_operation());
        assert!(!Symbol::Unknown.is_operation());
        assert_eq!(Symbol::Sum.name(), "SUM");
        assert_eq!(Symbol::Unknown.name(), "unknown");
    }
}
