/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

pub mod address;
pub mod context;
pub mod error;
pub mod fold;
pub mod header;
pub mod parameters;
pub mod registry;
