//! Shared MO byte builder for the integration tests.

/// Serializes `pairs` into a complete MO catalog image. Originals are
/// sorted byte-wise first, as the format requires for binary search.
pub fn mo_bytes(pairs: &[(Vec<u8>, Vec<u8>)], big_endian: bool) -> Vec<u8> {
    let mut sorted: Vec<(Vec<u8>, Vec<u8>)> = pairs.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let count = sorted.len() as u32;
    let originals_offset = 20u32;
    let translations_offset = originals_offset + count * 8;
    let mut data_offset = translations_offset + count * 8;

    let put = |out: &mut Vec<u8>, value: u32| {
        if big_endian {
            out.extend_from_slice(&value.to_be_bytes());
        } else {
            out.extend_from_slice(&value.to_le_bytes());
        }
    };

    let mut out = Vec::new();
    if big_endian {
        out.extend_from_slice(&[0x95, 0x04, 0x12, 0xde]);
    } else {
        out.extend_from_slice(&[0xde, 0x12, 0x04, 0x95]);
    }
    put(&mut out, 0); // revision
    put(&mut out, count);
    put(&mut out, originals_offset);
    put(&mut out, translations_offset);

    let mut strings = Vec::new();
    let mut original_entries = Vec::new();
    let mut translation_entries = Vec::new();
    for (original, _) in &sorted {
        original_entries.push((original.len() as u32, data_offset));
        strings.extend_from_slice(original);
        data_offset += original.len() as u32;
    }
    for (_, translation) in &sorted {
        translation_entries.push((translation.len() as u32, data_offset));
        strings.extend_from_slice(translation);
        data_offset += translation.len() as u32;
    }

    for (length, offset) in original_entries.into_iter().chain(translation_entries) {
        put(&mut out, length);
        put(&mut out, offset);
    }
    out.extend_from_slice(&strings);
    out
}

/// A metadata entry (empty msgid) carrying the given plural rule.
pub fn metadata_pair(plural_forms: &str) -> (Vec<u8>, Vec<u8>) {
    (
        Vec::new(),
        format!(
            "Content-Type: text/plain; charset=UTF-8\nPlural-Forms: {plural_forms}\n"
        )
        .into_bytes(),
    )
}
