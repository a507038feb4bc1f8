/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use base64::{
    alphabet,
    engine::{general_purpose::GeneralPurpose, DecodePaddingMode, GeneralPurposeConfig},
    Engine,
};

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decodes base64 data, ignoring any byte outside the alphabet.
///
/// Decoding stops at the first `=`. A dangling sextet that cannot produce a
/// full octet is discarded.
pub fn decode_base64(bytes: &[u8]) -> Vec<u8> {
    let mut clean = bytes
        .iter()
        .copied()
        .take_while(|&ch| ch != b'=')
        .filter(|&ch| ch.is_ascii_alphanumeric() || ch == b'+' || ch == b'/')
        .collect::<Vec<_>>();

    if clean.len() % 4 == 1 {
        clean.pop();
    }

    LENIENT.decode(&clean).unwrap_or_default()
}
