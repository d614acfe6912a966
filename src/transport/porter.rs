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

//! Porter: the per-connection data mover between a `ByteChannel` and the
//! Dock (spec §4.7). `process()` is driven serially by the embedder's
//! scheduler; the Porter never closes its channel itself — that's the
//! ConnectionStateMachine's call.

use std::sync::{Mutex, Weak};

use async_trait::async_trait;

use super::{
    channel::ByteChannel,
    dock::{Dock, DepartureOutcome, DepartureTask},
};
use crate::error::{Error, Result};

const PING: &[u8] = b"PING";
const PONG: &[u8] = b"PONG";
const NOOP: &[u8] = b"NOOP";

/// Degraded send priority heartbeats use, so a queued heartbeat never
/// jumps ahead of application traffic (spec §4.5).
pub const HEARTBEAT_PRIORITY: i32 = i32::MAX;

/// One parsed inbound unit: either a control frame the Porter consumes
/// itself, or application-layer data bound for the dock's `ArrivalHall`.
enum ParsedFrame {
    Ping,
    Pong,
    Noop,
    Data(super::dock::arrival::IncomingFragment),
}

/// The "plain" Porter variant from spec §6: no framing of its own, the
/// whole read is one Arrival, recognising only the 4-byte control
/// literals.
fn parse_plain(bytes: &[u8]) -> ParsedFrame {
    match bytes {
        PING => ParsedFrame::Ping,
        PONG => ParsedFrame::Pong,
        NOOP => ParsedFrame::Noop,
        other => ParsedFrame::Data(super::dock::arrival::IncomingFragment {
            sn: None,
            index: 0,
            total: 1,
            payload: other.to_vec(),
        }),
    }
}

#[async_trait]
pub trait PorterDelegate: Send + Sync {
    async fn on_porter_received(&self, remote: &str, payload: Vec<u8>);
    async fn on_porter_sent(&self, remote: &str, sn: u32);
    async fn on_porter_failed(&self, remote: &str, error: Error);
    async fn on_porter_error(&self, remote: &str, error: Error);
}

struct PartialSend {
    sn: u32,
    payload: Vec<u8>,
    offset: usize,
    is_important: bool,
}

pub struct Porter {
    remote: String,
    channel: Mutex<Weak<dyn ByteChannel>>,
    dock: Mutex<Dock>,
    partial: Mutex<Option<PartialSend>>,
}

impl Porter {
    pub fn new(remote: impl Into<String>, channel: Weak<dyn ByteChannel>) -> Self {
        Self { remote: remote.into(), channel: Mutex::new(channel), dock: Mutex::new(Dock::new()), partial: Mutex::new(None) }
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn set_channel(&self, channel: Weak<dyn ByteChannel>) {
        *self.channel.lock().unwrap() = channel;
    }

    /// Enqueues application bytes for delivery at `priority` (lower wins).
    pub fn send_data(&self, sn: u32, payload: Vec<u8>, priority: i32, max_tries: u32, is_important: bool) -> bool {
        self.dock.lock().unwrap().departure_hall.add_departure(sn, payload, priority, max_tries, is_important)
    }

    /// Queues a `PONG` acknowledgement at the degraded heartbeat
    /// priority; never surfaces to the application (spec §6).
    fn respond(&self, sn: u32, payload: &'static [u8]) {
        self.dock.lock().unwrap().departure_hall.add_departure(sn, payload.to_vec(), HEARTBEAT_PRIORITY, 1, false);
    }

    /// Runs one step of the send side. Returns `true` if the caller
    /// should invoke `process()` again immediately (work remains or was
    /// just dispatched), `false` if it should sleep until more work or
    /// more bytes arrive.
    pub async fn process(&self, now: f64, delegate: &dyn PorterDelegate) -> bool {
        let Some(channel) = self.channel.lock().unwrap().upgrade() else { return false };
        if !channel.is_writable() {
            return false
        }

        let task = {
            let mut partial = self.partial.lock().unwrap();
            if let Some(p) = partial.take() {
                Some(DepartureOutcome::Send(DepartureTask { sn: p.sn, payload: p.payload[p.offset..].to_vec(), is_important: p.is_important }))
            } else {
                drop(partial);
                self.dock.lock().unwrap().departure_hall.get_next_departure(now)
            }
        };

        match task {
            None => false,
            Some(DepartureOutcome::Failed(task)) => {
                delegate.on_porter_failed(&self.remote, Error::Timeout("Request timeout".into())).await;
                let _ = task;
                true
            }
            Some(DepartureOutcome::Send(task)) => {
                match channel.send(&task.payload).await {
                    Ok(n) if n < task.payload.len() => {
                        *self.partial.lock().unwrap() = Some(PartialSend {
                            sn: task.sn,
                            payload: task.payload[n..].to_vec(),
                            offset: 0,
                            is_important: task.is_important,
                        });
                        true
                    }
                    Ok(_) => {
                        if !task.is_important {
                            delegate.on_porter_sent(&self.remote, task.sn).await;
                        }
                        true
                    }
                    Err(e) => {
                        *self.partial.lock().unwrap() =
                            Some(PartialSend { sn: task.sn, payload: task.payload, offset: 0, is_important: task.is_important });
                        delegate.on_porter_error(&self.remote, e).await;
                        true
                    }
                }
            }
        }
    }

    /// Feeds one inbound read through control-frame handling, response
    /// matching, and dock reassembly. Returns the application payloads
    /// ready for `delegate.on_porter_received`; control frames and
    /// matched acks never appear here.
    pub fn check_arrival(&self, bytes: &[u8], now: f64) -> Vec<Vec<u8>> {
        match parse_plain(bytes) {
            ParsedFrame::Ping => {
                self.respond(0, PONG);
                Vec::new()
            }
            ParsedFrame::Pong | ParsedFrame::Noop => Vec::new(),
            ParsedFrame::Data(fragment) => {
                if let Some(sn) = fragment.sn {
                    if self.dock.lock().unwrap().departure_hall.check_response(sn).is_some() {
                        return Vec::new()
                    }
                }
                let assembled = self.dock.lock().unwrap().arrival_hall.receive(fragment, now);
                assembled.into_iter().collect()
            }
        }
    }

    /// Reads once from the channel and delivers any completed Arrivals to
    /// `delegate.on_porter_received`.
    pub async fn receive_once(&self, delegate: &dyn PorterDelegate, now: f64) -> Result<()> {
        let Some(channel) = self.channel.lock().unwrap().upgrade() else { return Err(Error::ChannelClosed) };
        let bytes = channel.receive().await?;
        for payload in self.check_arrival(&bytes, now) {
            delegate.on_porter_received(&self.remote, payload).await;
        }
        Ok(())
    }

    pub fn purge(&self, now: f64) -> Option<usize> {
        self.dock.lock().unwrap().try_purge(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::channel::test_support::MemoryChannel;
    use std::sync::{atomic::{AtomicUsize, Ordering}, Arc};

    #[derive(Default)]
    struct RecordingDelegate {
        received: Mutex<Vec<Vec<u8>>>,
        sent: AtomicUsize,
        failed: AtomicUsize,
    }

    #[async_trait]
    impl PorterDelegate for RecordingDelegate {
        async fn on_porter_received(&self, _remote: &str, payload: Vec<u8>) {
            self.received.lock().unwrap().push(payload);
        }
        async fn on_porter_sent(&self, _remote: &str, _sn: u32) {
            self.sent.fetch_add(1, Ordering::SeqCst);
        }
        async fn on_porter_failed(&self, _remote: &str, _error: Error) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        async fn on_porter_error(&self, _remote: &str, _error: Error) {}
    }

    #[test]
    fn ping_is_consumed_and_pong_is_queued_silently() {
        smol::block_on(async {
            let channel: Arc<dyn ByteChannel> = Arc::new(MemoryChannel::new(64));
            let porter = Porter::new("peer", Arc::downgrade(&channel));
            let delegate = RecordingDelegate::default();

            let delivered = porter.check_arrival(PING, 0.0);
            assert!(delivered.is_empty());

            assert!(porter.process(0.0, &delegate).await);
            assert_eq!(channel.drain_outbox(), PONG);
            assert!(delegate.received.lock().unwrap().is_empty());
        })
    }

    #[test]
    fn short_write_resumes_from_offset() {
        smol::block_on(async {
            let channel: Arc<dyn ByteChannel> = Arc::new(MemoryChannel::new(2));
            let porter = Porter::new("peer", Arc::downgrade(&channel));
            let delegate = RecordingDelegate::default();
            assert!(porter.send_data(1, b"hello".to_vec(), 0, 3, false));

            assert!(porter.process(0.0, &delegate).await);
            assert_eq!(channel.drain_outbox(), b"he");
            assert!(porter.process(0.0, &delegate).await);
            assert_eq!(channel.drain_outbox(), b"ll");
            assert!(porter.process(0.0, &delegate).await);
            assert_eq!(channel.drain_outbox(), b"o");
            assert_eq!(delegate.sent.load(Ordering::SeqCst), 1);
        })
    }

    #[test]
    fn important_ship_waits_silently_for_ack() {
        smol::block_on(async {
            let channel: Arc<dyn ByteChannel> = Arc::new(MemoryChannel::new(64));
            let porter = Porter::new("peer", Arc::downgrade(&channel));
            let delegate = RecordingDelegate::default();
            porter.send_data(5, b"important".to_vec(), 0, 3, true);
            assert!(porter.process(0.0, &delegate).await);
            assert_eq!(delegate.sent.load(Ordering::SeqCst), 0);
        })
    }

    #[test]
    fn timed_out_departure_reports_failure() {
        smol::block_on(async {
            let channel: Arc<dyn ByteChannel> = Arc::new(MemoryChannel::new(64));
            let porter = Porter::new("peer", Arc::downgrade(&channel));
            let delegate = RecordingDelegate::default();
            porter.send_data(1, b"once".to_vec(), 0, 1, false);
            assert!(porter.process(0.0, &delegate).await);
            assert!(porter.process(crate::transport::dock::departure::T_RETRY + 1.0, &delegate).await);
            assert_eq!(delegate.failed.load(Ordering::SeqCst), 1);
        })
    }

    #[test]
    fn dropped_channel_makes_process_sleep() {
        smol::block_on(async {
            let channel: Arc<dyn ByteChannel> = Arc::new(MemoryChannel::new(64));
            let porter = Porter::new("peer", Arc::downgrade(&channel));
            drop(channel);
            let delegate = RecordingDelegate::default();
            assert!(!porter.process(0.0, &delegate).await);
        })
    }
}
