// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query operations, grouped by entity.

pub mod catalogs;
pub mod contacts;
pub mod conversations;
pub mod events;
pub mod listings;
pub mod messages;
