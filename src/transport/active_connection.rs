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

//! ActiveConnection: the client-side self-healing driver (spec §4.7). A
//! `ConnectionDriver` holds at most one live Channel and re-dials through
//! the Hub once its retry clock fires; `ActiveConnection` wraps it with
//! the background-tick cadence the embedder's loop follows.

use std::sync::{Arc, Weak};

use super::{channel::ByteChannel, hub::ChannelFactory, hub::Hub};

/// A freshly-opened socket that hasn't left "opening" by this deadline
/// is torn down and retried.
pub const EXPIRED: f64 = 128.0;
/// Minimum gap between dial attempts once the channel is gone.
pub const RETRY: f64 = 32.0;

/// Application lifecycle state the embedder reports each tick; only
/// affects the tick cadence `ActiveConnection::poll_interval` suggests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Foreground,
    Background,
}

/// Holds at most one Channel and the timers that govern replacing it.
/// `tick` is the whole state transition described in spec §4.7; it is
/// deliberately synchronous apart from the dial itself so tests can drive
/// it with a fake clock.
pub struct ConnectionDriver {
    channel: Option<Arc<dyn ByteChannel>>,
    expires_at: Option<f64>,
    gone_since: Option<f64>,
}

impl Default for ConnectionDriver {
    fn default() -> Self {
        Self { channel: None, expires_at: None, gone_since: None }
    }
}

impl ConnectionDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(&self) -> Option<Weak<dyn ByteChannel>> {
        self.channel.as_ref().map(Arc::downgrade)
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    /// One tick of the driver. `remote`/`local` identify the peer this
    /// connection dials; `hub` is the shared owner of live Channels.
    pub async fn tick<F: ChannelFactory>(&mut self, now: f64, remote: &str, local: Option<&str>, hub: &Hub<F>) {
        if let Some(channel) = self.channel.clone() {
            if channel.is_alive() {
                self.expires_at = None;
                return
            }
            if !channel.is_alive() || self.expires_at.is_some_and(|t| now >= t) {
                log::debug!(target: "dimcore::transport::active_connection", "evicting dead/expired channel to {remote}");
                self.channel = None;
                self.expires_at = None;
                self.gone_since = Some(now);
            }
            return
        }

        if self.gone_since.map_or(true, |t| now - t >= RETRY) {
            match hub.open(remote, local).await {
                Ok(channel) => {
                    self.channel = Some(channel);
                    self.expires_at = Some(now + EXPIRED);
                }
                Err(e) => {
                    log::warn!(target: "dimcore::transport::active_connection", "dial to {remote} failed: {e}");
                    self.gone_since = Some(now);
                }
            }
        }
    }
}

/// The background task wrapper: picks the poll cadence spec §4.7
/// describes (1 Hz normally, 4 s while backgrounded) and owns the driver.
/// The embedder still drives the actual sleep/tick loop; this type only
/// carries the policy and the driver state a single connection needs.
pub struct ActiveConnection {
    pub driver: ConnectionDriver,
    remote: String,
    local: Option<String>,
}

impl ActiveConnection {
    pub fn new(remote: impl Into<String>, local: Option<String>) -> Self {
        Self { driver: ConnectionDriver::new(), remote: remote.into(), local }
    }

    pub fn poll_interval(app_state: AppState) -> f64 {
        match app_state {
            AppState::Foreground => 1.0,
            AppState::Background => 4.0,
        }
    }

    pub async fn tick<F: ChannelFactory>(&mut self, now: f64, hub: &Hub<F>) {
        self.driver.tick(now, &self.remote, self.local.as_deref(), hub).await;
    }
}
