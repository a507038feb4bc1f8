/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

pub mod base64;
pub mod charsets;
pub mod encoded_word;
pub mod hex;
pub mod quoted_printable;
