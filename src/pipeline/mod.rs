/* This file is part of dimcore.
 *
 * Copyright (C) 2020-2026 dimcore contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Message pipeline (DIMP): Messenger send/receive, Packer readiness
//! gating, Processor dispatch, the Facebook identity facade, and
//! EntityChecker rate limiting (spec §4.4).

pub mod compat;
pub mod entity_checker;
pub mod facebook;
pub mod messenger;
pub mod packer;
pub mod processor;

pub use messenger::{Messenger, ReceiveOutcome, SendOutcome};
