//! Append-only byte buffer with symbolic, late-bound offsets.
//!
//! A buffer records two kinds of markers next to its bytes: *targets*, which
//! name the offset at which they were added, and *references*, which are
//! four placeholder bytes waiting for the offset of a target. Buffers can be
//! built independently and concatenated; markers are re-based as they move.
//! A final [`RelocBuffer::resolve`] patches every reference with the absolute
//! offset of its target, little-endian, the way a linker applies relocations.

use std::collections::HashMap;
use std::io;

use crate::error::{Error, Result};

/// Symbolic name for an offset inside a [`RelocBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u32);

/// Monotonic source of [`TargetId`]s, owned by a conversion session.
#[derive(Debug, Default)]
pub struct IdSequence {
    next: u32,
}

impl IdSequence {
    pub fn next_id(&mut self) -> TargetId {
        let id = TargetId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Marker {
    id: TargetId,
    offset: usize,
}

const PLACEHOLDER: [u8; 4] = [0; 4];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocBuffer {
    data: Vec<u8>,
    targets: Vec<Marker>,
    references: Vec<Marker>,
}

impl RelocBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// True when no reference is still waiting for a patch.
    pub fn is_resolved(&self) -> bool {
        self.references.is_empty()
    }

    pub fn get(&self, offset: usize) -> Result<u8> {
        self.data.get(offset).copied().ok_or_else(|| {
            Error::Other(format!(
                "offset {offset} out of bounds for buffer of {} bytes",
                self.data.len()
            ))
        })
    }

    /// Appends raw bytes.
    pub fn extend(&mut self, bytes: &[u8]) -> Result<()> {
        self.data
            .try_reserve(bytes.len())
            .map_err(|_| Error::OutOfMemory)?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Binds `id` to the current end of the buffer.
    ///
    /// Each id may be bound once per resolve cycle.
    pub fn add_target(&mut self, id: TargetId) {
        self.targets.push(Marker {
            id,
            offset: self.data.len(),
        });
    }

    /// Appends a four byte placeholder to be patched with the offset of `id`.
    pub fn add_reference(&mut self, id: TargetId) -> Result<()> {
        let offset = self.data.len();
        self.extend(&PLACEHOLDER)?;
        self.references.push(Marker { id, offset });
        Ok(())
    }

    /// Appends `extra`, shifting its markers by the current length.
    pub fn concat(&mut self, extra: &RelocBuffer) -> Result<()> {
        let base = self.data.len();
        self.targets
            .try_reserve(extra.targets.len())
            .map_err(|_| Error::OutOfMemory)?;
        self.references
            .try_reserve(extra.references.len())
            .map_err(|_| Error::OutOfMemory)?;
        self.extend(&extra.data)?;

        let rebase = |marker: &Marker| Marker {
            id: marker.id,
            offset: marker.offset + base,
        };
        self.targets.extend(extra.targets.iter().map(rebase));
        self.references.extend(extra.references.iter().map(rebase));
        Ok(())
    }

    /// Patches every reference with the offset of its target and clears
    /// both marker lists.
    ///
    /// Nothing is patched unless every reference can be satisfied.
    pub fn resolve(&mut self) -> Result<()> {
        let mut targets = HashMap::with_capacity(self.targets.len());
        for target in &self.targets {
            if targets.insert(target.id, target.offset).is_some() {
                return Err(Error::Other(format!(
                    "target {:?} declared more than once",
                    target.id
                )));
            }
        }

        let mut patches = Vec::with_capacity(self.references.len());
        for reference in &self.references {
            let offset = targets.get(&reference.id).ok_or_else(|| {
                Error::Parse(format!(
                    "reference at offset {} to undeclared target {:?}",
                    reference.offset, reference.id
                ))
            })?;
            let address = u32::try_from(*offset).map_err(|_| {
                Error::Generate(format!("target offset {offset} does not fit in 32 bits"))
            })?;
            patches.push((reference.offset, address));
        }

        for (at, address) in patches {
            self.data[at..at + 4].copy_from_slice(&address.to_le_bytes());
        }
        tracing::debug!(
            references = self.references.len(),
            targets = self.targets.len(),
            "resolved buffer"
        );
        self.targets.clear();
        self.references.clear();
        Ok(())
    }

    /// Copies `length` bytes starting at `offset` into a marker-free buffer.
    ///
    /// The range should already be resolved; its markers are not carried over.
    pub fn subbuffer(&self, offset: usize, length: usize) -> Result<RelocBuffer> {
        let end = offset
            .checked_add(length)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                Error::Other(format!(
                    "range {offset}+{length} out of bounds for buffer of {} bytes",
                    self.data.len()
                ))
            })?;
        let mut sub = RelocBuffer::new();
        sub.extend(&self.data[offset..end])?;
        Ok(sub)
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        if let Some(reference) = self.references.first() {
            return Err(Error::Parse(format!(
                "reference at offset {} is still unresolved",
                reference.offset
            )));
        }
        Ok(self.data)
    }

    pub fn write_to<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        if !self.is_resolved() {
            return Err(Error::Parse(
                "cannot write a buffer with unresolved references".to_owned(),
            ));
        }
        writer.write_all(&self.data)?;
        Ok(())
    }
}

impl io::Write for RelocBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data
            .try_reserve(buf.len())
            .map_err(|_| io::Error::from(io::ErrorKind::OutOfMemory))?;
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
