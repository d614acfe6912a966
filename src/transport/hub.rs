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

//! Hub: the process-wide owner of Channels (spec §4.7). `open` returns a
//! cached Channel keyed by `(remote, local)`, creating one lazily through
//! a `ChannelFactory` hook (the socket connect/bind is outside this
//! crate's scope, per spec §1's "opaque transport" boundary).

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use super::channel::ByteChannel;
use crate::error::Result;

/// Creates the concrete socket behind a Channel. A "plain" in-memory test
/// double lives in `channel::test_support`; production embedders supply
/// their own (TCP, QUIC, ...).
#[async_trait]
pub trait ChannelFactory: Send + Sync {
    async fn connect(&self, remote: &str, local: Option<&str>) -> Result<Arc<dyn ByteChannel>>;
}

type PoolKey = (String, Option<String>);

/// Channels are exclusively owned here; Porters and Connections only ever
/// hold a `Weak` reference to one (spec §3's ownership summary).
#[derive(Default)]
pub struct ChannelPool {
    channels: Mutex<HashMap<PoolKey, Arc<dyn ByteChannel>>>,
}

impl ChannelPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cached Channel whose local address matches `local`, or whose
    /// cached local address is unset (spec §4.7: "or whose local is
    /// `None`").
    fn find(&self, remote: &str, local: Option<&str>) -> Option<Arc<dyn ByteChannel>> {
        let channels = self.channels.lock().unwrap();
        channels
            .iter()
            .find(|((r, l), _)| r == remote && (l.as_deref() == local || l.is_none()))
            .map(|(_, ch)| ch.clone())
    }

    fn insert(&self, remote: &str, local: Option<&str>, channel: Arc<dyn ByteChannel>) {
        self.channels.lock().unwrap().insert((remote.to_string(), local.map(str::to_string)), channel);
    }

    pub fn remove(&self, remote: &str, local: Option<&str>) -> Option<Arc<dyn ByteChannel>> {
        let removed = self.channels.lock().unwrap().remove(&(remote.to_string(), local.map(str::to_string)));
        if let Some(ch) = &removed {
            ch.close();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.channels.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct Hub<F: ChannelFactory> {
    pool: ChannelPool,
    factory: F,
}

impl<F: ChannelFactory> Hub<F> {
    pub fn new(factory: F) -> Self {
        Self { pool: ChannelPool::new(), factory }
    }

    /// Returns the cached Channel for `(remote, local)` if one exists,
    /// otherwise dials a new one through the factory and caches it.
    pub async fn open(&self, remote: &str, local: Option<&str>) -> Result<Arc<dyn ByteChannel>> {
        if let Some(channel) = self.pool.find(remote, local) {
            return Ok(channel)
        }
        let channel = self.factory.connect(remote, local).await?;
        self.pool.insert(remote, local, channel.clone());
        log::debug!(target: "dimcore::transport::hub", "opened channel to {remote}");
        Ok(channel)
    }

    pub fn close(&self, remote: &str, local: Option<&str>) {
        self.pool.remove(remote, local);
    }

    pub fn pool(&self) -> &ChannelPool {
        &self.pool
    }
}
