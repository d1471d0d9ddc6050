//! Codecs for the record formats inside Psion Series 5 (EPOC) documents.
//!
//! - [`reloc_buffer`]: output buffers whose offsets are resolved after layout.
//! - [`layout_list`]: paragraph and character layouts stored as tagged
//!   differences from a base layout, with [`style`] building on it.
//! - [`formula_reader`] and [`formula_writer`]: sheet formula bytecode.

pub mod config;
pub mod error;
pub mod formula;
pub mod formula_reader;
pub mod formula_writer;
pub mod layout;
pub mod layout_list;
pub mod opcode;
pub mod reloc_buffer;
pub mod session;
pub mod style;

pub use config::{Config, UnknownTagPolicy};
pub use error::{Error, Result};
pub use formula::{CellBlock, CellRef, Formula, SheetRef};
pub use formula_reader::{decode_formula, decode_formula_list};
pub use formula_writer::{encode_formula, encode_formula_list};
pub use opcode::{Arity, Symbol};
pub use reloc_buffer::{RelocBuffer, TargetId};
pub use session::{Session, Warning};
pub use style::{ParagraphFormat, Style, StyleSheet};
