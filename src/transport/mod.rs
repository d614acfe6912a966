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

//! Concurrent transport (STARTREK, spec §4.5-§4.7): the connection state
//! machine, the Dock's receive/send halls, the Porter that mediates
//! between a byte-channel and the message pipeline, the Hub that owns
//! Channels, and the client-side self-healing ActiveConnection driver.

pub mod active_connection;
pub mod channel;
pub mod dock;
pub mod hub;
pub mod porter;
pub mod state;

pub use active_connection::{ActiveConnection, AppState, ConnectionDriver};
pub use channel::ByteChannel;
pub use dock::Dock;
pub use hub::{ChannelFactory, ChannelPool, Hub};
pub use porter::{Porter, PorterDelegate};
pub use state::{ConnectionState, ConnectionStateMachine};

/// The timing constants spec §4.5-§4.7 name as literals, grouped the way
/// the teacher's `net::settings::Settings` groups its own timeouts: a
/// plain struct with a `Default` impl, overridable by the embedding
/// application and never read from environment or files by this crate.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub t_expire: f64,
    pub t_long: f64,
    pub entry_expires: f64,
    pub finished_retention: f64,
    pub t_retry: f64,
    pub purge_interval: f64,
    pub active_expired: f64,
    pub active_retry: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            t_expire: state::T_EXPIRE,
            t_long: state::T_LONG,
            entry_expires: dock::arrival::ENTRY_EXPIRES,
            finished_retention: dock::arrival::FINISHED_RETENTION,
            t_retry: dock::departure::T_RETRY,
            purge_interval: dock::PURGE_INTERVAL,
            active_expired: active_connection::EXPIRED,
            active_retry: active_connection::RETRY,
        }
    }
}
