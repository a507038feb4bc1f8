/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use crate::Mechanism;

use super::TransferEncoding;

/// Raw octets per encoded line.
pub const LINE_OCTETS: usize = 45;

/// Packs and unpacks uuencoded data.
///
/// Encoding produces the packed lines only, without the `begin`/`end`
/// envelope. Decoding accepts either form.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuEncode;

#[inline(always)]
fn uu_char(value: u8) -> u8 {
    match value & 0x3f {
        0 => b'`',
        value => value + b' ',
    }
}

#[inline(always)]
fn uu_value(ch: u8) -> u8 {
    ch.wrapping_sub(b' ') & 0x3f
}

impl TransferEncoding for UuEncode {
    fn mechanism(&self) -> Mechanism {
        Mechanism::UuEncode
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        let mut result = Vec::with_capacity(data.len() * 4 / 3 + data.len() / LINE_OCTETS * 2 + 4);

        for line in data.chunks(LINE_OCTETS) {
            result.push(line.len() as u8 + b' ');

            for group in line.chunks(3) {
                let a = group[0];
                let b = group.get(1).copied().unwrap_or(0);
                let c = group.get(2).copied().unwrap_or(0);

                result.push(uu_char(a >> 2));
                result.push(uu_char((a << 4) | (b >> 4)));
                if group.len() > 1 {
                    result.push(uu_char((b << 2) | (c >> 6)));
                } else {
                    result.push(b'`');
                }
                if group.len() > 2 {
                    result.push(uu_char(c));
                } else {
                    result.push(b'`');
                }
            }

            result.push(b'\n');
        }

        result
    }

    fn decode(&self, data: &[u8]) -> Vec<u8> {
        let mut result = Vec::with_capacity(data.len() * 3 / 4);

        for line in data.split(|&ch| ch == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            if line.starts_with(b"begin ") {
                continue;
            } else if line == b"end" {
                break;
            }

            let Some((&len_char, mut encoded)) = line.split_first() else {
                continue;
            };
            let mut remaining = uu_value(len_char) as usize;

            while remaining > 0 {
                let mut quad = [0u8; 4];
                for (value, &ch) in quad.iter_mut().zip(encoded.iter()) {
                    *value = uu_value(ch);
                }
                encoded = encoded.get(4..).unwrap_or_default();

                let hunk = [
                    (quad[0] << 2) | (quad[1] >> 4),
                    (quad[1] << 4) | (quad[2] >> 2),
                    (quad[2] << 6) | quad[3],
                ];
                let take = remaining.min(3);
                result.extend_from_slice(&hunk[..take]);
                remaining -= take;
            }
        }

        result
    }

    fn cost(&self, _data: &[u8]) -> f64 {
        4.0 / 3.0 + 2.0 / LINE_OCTETS as f64
    }
}
