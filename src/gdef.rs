//! The [GDEF (Glyph Definition) table](https://docs.microsoft.com/en-us/typography/opentype/spec/gdef):
//! not positioned or substituted itself, but consumed to drive lookup-flag
//! glyph filtering (see `layout::GlyphFilter`).

use crate::GlyphId;
use crate::parser::{Stream, Offset16, Offset32, FromData};
use crate::classdef::ClassDefTable;
use crate::coverage::CoverageTable;
use crate::error::{Error, Result};

/// A [glyph class](https://docs.microsoft.com/en-us/typography/opentype/spec/gdef#glyph-class-definition-table).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[allow(missing_docs)]
pub enum GlyphClass {
    Base = 1,
    Ligature = 2,
    Mark = 3,
    Component = 4,
}

impl GlyphClass {
    fn from_raw(class: u16) -> Option<Self> {
        match class {
            1 => Some(GlyphClass::Base),
            2 => Some(GlyphClass::Ligature),
            3 => Some(GlyphClass::Mark),
            4 => Some(GlyphClass::Component),
            _ => None,
        }
    }
}

/// A parsed GDEF table.
#[derive(Clone, Copy)]
pub struct GdefTable<'a> {
    data: &'a [u8],
    glyph_class_def_offset: Option<Offset16>,
    mark_attach_class_def_offset: Option<Offset16>,
    mark_glyph_sets_def_offset: Option<Offset32>,
}

impl<'a> GdefTable<'a> {
    /// Parses a GDEF table from a byte window starting at the table's own
    /// header (`majorVersion`).
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let mut s = Stream::new(data);
        let major_version: u16 = s.read().ok_or(Error::Malformed)?;
        let minor_version: u16 = s.read().ok_or(Error::Malformed)?;
        if major_version != 1 {
            return Err(Error::UnsupportedVersion);
        }

        let glyph_class_def_offset: Option<Offset16> = s.read().ok_or(Error::Malformed)?;
        let mark_attach_class_def_offset: Option<Offset16> = {
            s.skip::<Offset16>(); // attachListOffset
            s.skip::<Offset16>(); // ligCaretListOffset
            s.read().ok_or(Error::Malformed)?
        };

        let mark_glyph_sets_def_offset = if minor_version >= 2 {
            s.read().ok_or(Error::Malformed)?
        } else {
            None
        };

        Ok(GdefTable {
            data,
            glyph_class_def_offset,
            mark_attach_class_def_offset,
            mark_glyph_sets_def_offset,
        })
    }

    fn class_def(&self, offset: Option<Offset16>) -> Option<ClassDefTable<'a>> {
        let data = self.data.get(offset?.to_usize()..)?;
        ClassDefTable::parse(data)
    }

    pub(crate) fn glyph_class_def(&self) -> Option<ClassDefTable<'a>> {
        self.class_def(self.glyph_class_def_offset)
    }

    pub(crate) fn mark_attach_class_def(&self) -> Option<ClassDefTable<'a>> {
        self.class_def(self.mark_attach_class_def_offset)
    }

    /// Returns glyph's class according to the
    /// [Glyph Class Definition Table](https://docs.microsoft.com/en-us/typography/opentype/spec/gdef#glyph-class-definition-table).
    pub fn glyph_class(&self, glyph_id: GlyphId) -> Option<GlyphClass> {
        GlyphClass::from_raw(self.glyph_class_def()?.get(glyph_id).0)
    }

    /// Returns glyph's mark attachment class, or 0 if unset.
    pub fn glyph_mark_attachment_class(&self, glyph_id: GlyphId) -> u16 {
        self.mark_attach_class_def().map(|t| t.get(glyph_id).0).unwrap_or(0)
    }

    /// The mark glyph set coverage at `set_index`, if the table has a
    /// [Mark Glyph Sets Table](https://docs.microsoft.com/en-us/typography/opentype/spec/gdef#mark-glyph-sets-table)
    /// (version ≥ 1.2) and `set_index` is in range.
    pub(crate) fn mark_glyph_set(&self, set_index: u16) -> Option<CoverageTable<'a>> {
        let data = self.data.get(self.mark_glyph_sets_def_offset?.to_usize()..)?;
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        if format != 1 {
            return None;
        }
        let offsets = s.read_array16::<Offset32>()?;
        let offset = offsets.get(set_index)?;
        CoverageTable::parse(data.get(offset.to_usize()..)?)
    }

    /// Checks whether `glyph_id` is a member of any mark glyph set (or of
    /// `set_index` specifically, if given).
    ///
    /// Returns `false` when the table has no Mark Glyph Sets Table.
    pub fn is_mark_glyph(&self, glyph_id: GlyphId, set_index: Option<u16>) -> bool {
        if self.mark_glyph_sets_def_offset.is_none() {
            return false;
        }

        if let Some(set_index) = set_index {
            return self.mark_glyph_set(set_index).map(|t| t.contains(glyph_id)).unwrap_or(false);
        }

        let mut i = 0;
        while let Some(set) = self.mark_glyph_set(i) {
            if set.contains(glyph_id) {
                return true;
            }
            i += 1;
        }
        false
    }
}

impl core::fmt::Debug for GdefTable<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "GdefTable()")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be16(v: u16) -> [u8; 2] { v.to_be_bytes() }

    #[test]
    fn glyph_class_lookup() {
        let mut data = std::vec::Vec::new();
        data.extend_from_slice(&be16(1)); // majorVersion
        data.extend_from_slice(&be16(0)); // minorVersion
        data.extend_from_slice(&be16(12)); // glyphClassDefOffset
        data.extend_from_slice(&be16(0)); // attachListOffset (null)
        data.extend_from_slice(&be16(0)); // ligCaretListOffset (null)
        data.extend_from_slice(&be16(0)); // markAttachClassDefOffset (null)

        // ClassDef format 1: start=5, classes=[1, 3]
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(5));
        data.extend_from_slice(&be16(2));
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(3));

        let table = GdefTable::parse(&data).unwrap();
        assert_eq!(table.glyph_class(GlyphId(5)), Some(GlyphClass::Base));
        assert_eq!(table.glyph_class(GlyphId(6)), Some(GlyphClass::Mark));
        assert_eq!(table.glyph_class(GlyphId(7)), None);
    }

    #[test]
    fn unsupported_version() {
        let data = [0x00, 0x02, 0x00, 0x00];
        assert_eq!(GdefTable::parse(&data), Err(Error::UnsupportedVersion));
    }
}
