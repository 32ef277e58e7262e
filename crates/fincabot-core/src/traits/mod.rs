// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits for the external collaborators of the pipeline.
//!
//! Each trait is a capability contract: the pipeline never assumes anything
//! about the implementation behind it, and every call can fail.

pub mod generation;
pub mod knowledge;
pub mod transport;

pub use generation::TextGenerator;
pub use knowledge::KnowledgeSearch;
pub use transport::WhatsAppTransport;
