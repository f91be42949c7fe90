//! End-to-end tests against fully assembled GPOS/GSUB tables, exercising
//! `parse` → `resolve_lookups` → `position_glyphs`/`substitute_glyphs` as a
//! whole rather than individual subtable decoders (see `src/*.rs` for the
//! unit-level tests of those).
//!
//! The teacher crate's integration tests (`tests/tests.rs`) read real `.ttf`
//! fixture files from `tests/fonts/`; this crate only ever sees GPOS/GSUB/GDEF
//! byte windows handed in by a host, so the fixtures here are hand-assembled
//! tables built the same way the unit tests build subtables, just wired up
//! through a full ScriptList/FeatureList/LookupList.

use otl_engine::{FeatureSet, GdefTable, GlyphId, GposTable, GsubTable, Tag};

fn be16(v: u16) -> [u8; 2] {
    v.to_be_bytes()
}

fn patch_u16(data: &mut Vec<u8>, at: usize, v: u16) {
    let bytes = v.to_be_bytes();
    data[at] = bytes[0];
    data[at + 1] = bytes[1];
}

/// One script (`latn`), one optional feature (`kern`) activating lookup 0,
/// a type-1 Single positioning lookup (format 1, xAdvance-only, matching
/// the fixture from the OpenType spec's scenario 3).
fn build_gpos_kern() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&be16(1)); // majorVersion
    data.extend_from_slice(&be16(0)); // minorVersion
    data.extend_from_slice(&be16(0)); // scriptListOffset (patched)
    data.extend_from_slice(&be16(0)); // featureListOffset (patched)
    data.extend_from_slice(&be16(0)); // lookupListOffset (patched)

    let script_list_start = data.len();
    data.extend_from_slice(&be16(1)); // scriptCount
    data.extend_from_slice(b"latn");
    data.extend_from_slice(&be16(8)); // -> ScriptTable at script_list_start+8

    // ScriptTable
    data.extend_from_slice(&be16(4)); // defaultLangSysOffset -> +4
    data.extend_from_slice(&be16(0)); // langSysCount

    // DefaultLangSys: no required feature, one optional feature (index 0)
    data.extend_from_slice(&be16(0)); // lookupOrder (reserved)
    data.extend_from_slice(&be16(0xFFFF)); // requiredFeatureIndex: none
    data.extend_from_slice(&be16(1)); // featureIndexCount
    data.extend_from_slice(&be16(0)); // featureIndices[0]

    let feature_list_start = data.len();
    data.extend_from_slice(&be16(1)); // featureCount
    data.extend_from_slice(b"kern");
    data.extend_from_slice(&be16(8)); // -> FeatureTable

    data.extend_from_slice(&be16(0)); // featureParamsOffset
    data.extend_from_slice(&be16(1)); // lookupIndexCount
    data.extend_from_slice(&be16(0)); // lookupListIndices[0]

    let lookup_list_start = data.len();
    data.extend_from_slice(&be16(1)); // lookupCount
    data.extend_from_slice(&be16(4)); // -> LookupTable

    data.extend_from_slice(&be16(1)); // lookupType: Single
    data.extend_from_slice(&be16(0)); // lookupFlag
    data.extend_from_slice(&be16(1)); // subTableCount
    data.extend_from_slice(&be16(8)); // -> subtable

    // SinglePos format 1: xAdvance = -16 on glyph 0x41
    data.extend_from_slice(&be16(1)); // format
    data.extend_from_slice(&be16(8)); // coverage offset
    data.extend_from_slice(&be16(0x0004)); // valueFormat: xAdvance
    data.extend_from_slice(&(-16i16).to_be_bytes());
    data.extend_from_slice(&be16(1)); // coverage format 1
    data.extend_from_slice(&be16(1)); // glyphCount
    data.extend_from_slice(&be16(0x41));

    patch_u16(&mut data, 4, script_list_start as u16);
    patch_u16(&mut data, 6, feature_list_start as u16);
    patch_u16(&mut data, 8, lookup_list_start as u16);
    data
}

#[test]
fn gpos_positions_only_when_feature_enabled() {
    let data = build_gpos_kern();
    let table = GposTable::parse(&data).unwrap();

    let glyphs = [GlyphId(0x41)];

    let enabled = FeatureSet {
        script: Tag::from_bytes(b"latn"),
        language: Tag::DEFAULT_LANGUAGE,
        features: &[Tag::from_bytes(b"kern")],
    };
    let result = otl_engine::position_glyphs(&table, &glyphs, &enabled, None);
    assert_eq!(result.get(&0).unwrap().x_advance, -16);

    let disabled = FeatureSet {
        script: Tag::from_bytes(b"latn"),
        language: Tag::DEFAULT_LANGUAGE,
        features: &[],
    };
    let result = otl_engine::position_glyphs(&table, &glyphs, &disabled, None);
    assert!(result.is_empty());

    let unknown_script = FeatureSet {
        script: Tag::from_bytes(b"grek"),
        language: Tag::DEFAULT_LANGUAGE,
        features: &[Tag::from_bytes(b"kern")],
    };
    let result = otl_engine::position_glyphs(&table, &glyphs, &unknown_script, None);
    assert!(result.is_empty());
}

/// One script (`latn`), one optional feature (`liga`) activating lookup 0,
/// a type-4 Ligature lookup: `f` + `i` -> `fi` (matching the OpenType spec's
/// scenario 5, same byte layout as the ligature unit test in `src/gsub.rs`).
fn build_gsub_liga() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&be16(1));
    data.extend_from_slice(&be16(0));
    data.extend_from_slice(&be16(0));
    data.extend_from_slice(&be16(0));
    data.extend_from_slice(&be16(0));

    let script_list_start = data.len();
    data.extend_from_slice(&be16(1));
    data.extend_from_slice(b"latn");
    data.extend_from_slice(&be16(8));

    data.extend_from_slice(&be16(4));
    data.extend_from_slice(&be16(0));

    data.extend_from_slice(&be16(0));
    data.extend_from_slice(&be16(0xFFFF));
    data.extend_from_slice(&be16(1));
    data.extend_from_slice(&be16(0));

    let feature_list_start = data.len();
    data.extend_from_slice(&be16(1));
    data.extend_from_slice(b"liga");
    data.extend_from_slice(&be16(8));

    data.extend_from_slice(&be16(0));
    data.extend_from_slice(&be16(1));
    data.extend_from_slice(&be16(0));

    let lookup_list_start = data.len();
    data.extend_from_slice(&be16(1));
    data.extend_from_slice(&be16(4));

    data.extend_from_slice(&be16(4)); // lookupType: Ligature
    data.extend_from_slice(&be16(0));
    data.extend_from_slice(&be16(1));
    data.extend_from_slice(&be16(8));

    // LigatureSubstFormat1, same layout as src/gsub.rs's ligature_fi test
    data.extend_from_slice(&be16(1));
    data.extend_from_slice(&be16(8));
    data.extend_from_slice(&be16(1));
    data.extend_from_slice(&be16(14));

    data.extend_from_slice(&be16(1));
    data.extend_from_slice(&be16(1));
    data.extend_from_slice(&be16(0x66)); // 'f'

    data.extend_from_slice(&be16(1));
    data.extend_from_slice(&be16(4));

    data.extend_from_slice(&be16(0xFB01)); // fi ligature glyph
    data.extend_from_slice(&be16(2));
    data.extend_from_slice(&be16(0x69)); // 'i'

    patch_u16(&mut data, 4, script_list_start as u16);
    patch_u16(&mut data, 6, feature_list_start as u16);
    patch_u16(&mut data, 8, lookup_list_start as u16);
    data
}

#[test]
fn gsub_substitutes_ligature_end_to_end() {
    let data = build_gsub_liga();
    let table = GsubTable::parse(&data).unwrap();

    let feature_set = FeatureSet {
        script: Tag::from_bytes(b"latn"),
        language: Tag::DEFAULT_LANGUAGE,
        features: &[Tag::from_bytes(b"liga")],
    };

    let input = [GlyphId(0x66), GlyphId(0x69), GlyphId(0x78)];
    let out = otl_engine::substitute_glyphs(&table, &input, &feature_set, None);
    assert_eq!(out, std::vec![GlyphId(0xFB01), GlyphId(0x78)]);

    // No 'liga' feature enabled: sequence passes through unchanged.
    let no_liga = FeatureSet {
        script: Tag::from_bytes(b"latn"),
        language: Tag::DEFAULT_LANGUAGE,
        features: &[],
    };
    let out = otl_engine::substitute_glyphs(&table, &input, &no_liga, None);
    assert_eq!(out, input);

    // No GDEF is fine: type-4 ligature matching degrades to "skip nothing".
    let gdef: Option<&GdefTable> = None;
    let out = otl_engine::substitute_glyphs(&table, &input, &feature_set, gdef);
    assert_eq!(out, std::vec![GlyphId(0xFB01), GlyphId(0x78)]);
}

#[test]
fn gpos_parse_rejects_garbage() {
    assert!(GposTable::parse(&[0x00, 0x02, 0x00, 0x00]).is_err());
}
