// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog selection and WhatsApp product dispatch.
//!
//! The dispatcher turns an intent (or, failing that, a deterministic parse of
//! the raw message) into a concrete search, resolves the candidates against
//! the provider catalogs, sends the product message, and remembers what was
//! sent so "otras opciones" can exclude it later. Errors never reach the
//! reply path: the orchestrator logs them and moves on.

pub mod dispatcher;

pub use dispatcher::CatalogDispatcher;
