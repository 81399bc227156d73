// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

pub mod gas;
pub mod gateway;
pub mod nonce;
pub mod provider;
