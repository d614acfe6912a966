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

//! ByteChannel: the transport-agnostic seam every Porter sends/receives
//! through. Concrete socket types (TCP, QUIC, an in-memory test double)
//! implement this trait; the pipeline above it never names a concrete
//! transport (spec §5's suspension-point list).

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait ByteChannel: Send + Sync {
    /// The underlying socket is connected and has not errored or closed.
    fn is_alive(&self) -> bool;

    /// A write attempted right now would not immediately fail (e.g. no
    /// backpressure signalled by the OS send buffer).
    fn is_writable(&self) -> bool;

    fn local_address(&self) -> Option<String>;
    fn remote_address(&self) -> String;

    /// Writes as much of `data` as the channel currently accepts,
    /// returning the number of bytes actually written. A short write
    /// (`< data.len()`) is not an error; the Porter resumes from the
    /// returned offset.
    async fn send(&self, data: &[u8]) -> Result<usize>;

    /// Blocks (suspends) until at least one chunk of inbound bytes is
    /// available.
    async fn receive(&self) -> Result<Vec<u8>>;

    fn close(&self);
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    };

    /// An in-memory loopback channel for exercising the Porter/Dock/state
    /// machine without a real socket.
    pub struct MemoryChannel {
        alive: AtomicBool,
        writable: AtomicBool,
        outbox: Mutex<Vec<u8>>,
        inbox: Mutex<Vec<Vec<u8>>>,
        max_write: usize,
    }

    impl MemoryChannel {
        pub fn new(max_write: usize) -> Self {
            Self {
                alive: AtomicBool::new(true),
                writable: AtomicBool::new(true),
                outbox: Mutex::new(Vec::new()),
                inbox: Mutex::new(Vec::new()),
                max_write,
            }
        }

        pub fn push_inbound(&self, data: Vec<u8>) {
            self.inbox.lock().unwrap().push(data);
        }

        pub fn drain_outbox(&self) -> Vec<u8> {
            std::mem::take(&mut self.outbox.lock().unwrap())
        }

        pub fn kill(&self) {
            self.alive.store(false, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ByteChannel for MemoryChannel {
        fn is_alive(&self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }

        fn is_writable(&self) -> bool {
            self.writable.load(Ordering::SeqCst)
        }

        fn local_address(&self) -> Option<String> {
            None
        }

        fn remote_address(&self) -> String {
            "memory".into()
        }

        async fn send(&self, data: &[u8]) -> Result<usize> {
            let n = data.len().min(self.max_write.max(1));
            self.outbox.lock().unwrap().extend_from_slice(&data[..n]);
            Ok(n)
        }

        async fn receive(&self) -> Result<Vec<u8>> {
            match self.inbox.lock().unwrap().pop() {
                Some(chunk) => Ok(chunk),
                None => Err(crate::error::Error::ChannelClosed),
            }
        }

        fn close(&self) {
            self.alive.store(false, Ordering::SeqCst);
        }
    }
}
