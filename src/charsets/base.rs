/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use super::CharsetCodec;

/// The identity codec, used for every charset without specific rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseCodec;

impl CharsetCodec for BaseCodec {}
