// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for state database entities.

pub mod preferences;
pub mod runs;
