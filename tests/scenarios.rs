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

//! End-to-end scenario tests spanning multiple modules (spec §8), the way
//! the teacher's `tests/network_transports.rs` exercises several `net`
//! components together instead of one unit at a time.

use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use dimcore::{
    crypto::PrivateKey,
    dkd::{content::Content, envelope::Envelope, instant::InstantMessage},
    error::{Error, Result},
    mkm::{
        document::{Document, DocumentType},
        meta::{Meta, MetaType},
        id::Identifier,
    },
    pipeline::{messenger::Messenger, messenger::SendOutcome},
    registry::{LocalUser, Registry},
    transport::{
        channel::{test_support::MemoryChannel, ByteChannel},
        hub::{ChannelFactory, Hub},
        porter::{Porter, PorterDelegate},
        state::{ConnectionState, ConnectionStateMachine, T_EXPIRE, T_LONG},
    },
};

fn identity(seed: &str) -> (PrivateKey, Identifier) {
    let sk = PrivateKey::generate_ecc();
    let meta = Meta::generate(MetaType::Mkm, &sk, Some(seed.to_string())).unwrap();
    (sk, Identifier::new(Some(seed.to_string()), meta.generate_address(0), None))
}

/// Scenario D — a send with no local Visa for the receiver suspends, and
/// re-drains once the Visa arrives.
#[test]
fn scenario_d_suspension_then_resume() {
    smol::block_on(async {
        let mut registry = Registry::new();
        let (alice_sign, alice) = identity("alice");
        registry.meta_factory.put(&alice, Meta::generate(MetaType::Mkm, &alice_sign, Some("alice".into())).unwrap());
        registry.add_local_user(LocalUser::new(alice.clone(), alice_sign, vec![]));

        let (bob_sign, bob) = identity("bob");
        let bob_meta = Meta::generate(MetaType::Mkm, &bob_sign, Some("bob".into())).unwrap();
        registry.meta_factory.put(&bob, bob_meta.clone());

        let mut messenger = Messenger::new();
        let sn = messenger.sn_generator.generate();
        let content = Content::new("text", sn);
        let envelope = Envelope::new(alice.clone(), bob.clone(), Some(1.0));
        let instant = InstantMessage::new(envelope, content);

        let outcome = messenger.send(instant, &registry).await;
        assert!(matches!(outcome, SendOutcome::Suspended(_)));
        assert_eq!(messenger.outbound_suspension.len(), 1);

        // Bob's Visa arrives.
        let bob_decrypt = PrivateKey::generate_rsa().unwrap();
        let visa_data = serde_json::json!({ "encrypt_key": bob_decrypt.public_key().to_map() }).to_string();
        let visa = Document::sign(bob.clone(), DocumentType::Visa, visa_data, 2.0, &bob_sign).unwrap();
        registry.document_factory.accept(&bob, visa, &bob_meta, 100.0);

        let mut queued = messenger.outbound_suspension.drain_ready(&bob);
        assert_eq!(queued.len(), 1);
        let outcome = messenger.send(queued.remove(0).item, &registry).await;
        assert!(matches!(outcome, SendOutcome::Ok(_)));
    })
}

/// Scenario F — a `ready` connection with a stale recv transitions to
/// `expired`, then to `maintaining` after a send, then back to `ready`
/// once a fresh recv (the peer's `PONG`) arrives.
#[test]
fn scenario_f_state_transitions_under_loss() {
    let mut fsm = ConnectionStateMachine::new(0.0);
    fsm.state = ConnectionState::Ready;

    let heartbeat = fsm.tick(T_EXPIRE + 1.0, true, true, Some(0.0), None);
    assert_eq!(fsm.state, ConnectionState::Expired);
    assert!(!heartbeat);

    let heartbeat = fsm.tick(T_EXPIRE + 2.0, true, true, Some(0.0), Some(T_EXPIRE + 1.9));
    assert_eq!(fsm.state, ConnectionState::Maintaining);
    assert!(heartbeat);

    fsm.tick(T_EXPIRE + 3.0, true, true, Some(T_EXPIRE + 2.5), Some(T_EXPIRE + 1.9));
    assert_eq!(fsm.state, ConnectionState::Ready);

    // Sanity: a connection starved of both send and recv past T_LONG
    // while maintaining is fatal, never silently lingers.
    let mut stuck = ConnectionStateMachine::new(0.0);
    stuck.state = ConnectionState::Maintaining;
    stuck.tick(T_LONG + 1.0, true, true, Some(0.0), Some(0.0));
    assert_eq!(stuck.state, ConnectionState::Error);
}

#[derive(Default)]
struct RecordingDelegate {
    received: Mutex<Vec<Vec<u8>>>,
    sent: AtomicUsize,
}

#[async_trait]
impl PorterDelegate for RecordingDelegate {
    async fn on_porter_received(&self, _remote: &str, payload: Vec<u8>) {
        self.received.lock().unwrap().push(payload);
    }
    async fn on_porter_sent(&self, _remote: &str, _sn: u32) {
        self.sent.fetch_add(1, Ordering::SeqCst);
    }
    async fn on_porter_failed(&self, _remote: &str, _error: Error) {}
    async fn on_porter_error(&self, _remote: &str, _error: Error) {}
}

struct MemoryFactory;

#[async_trait]
impl ChannelFactory for MemoryFactory {
    async fn connect(&self, _remote: &str, _local: Option<&str>) -> Result<Arc<dyn ByteChannel>> {
        Ok(Arc::new(MemoryChannel::new(1024)))
    }
}

/// A Porter dials its peer through a Hub, sends application bytes end to
/// end, and the peer's Porter delivers them via `on_porter_received`.
#[test]
fn porter_hub_end_to_end_delivery() {
    smol::block_on(async {
        let hub = Hub::new(MemoryFactory);
        let channel = hub.open("peer", None).await.unwrap();
        let weak = Arc::downgrade(&channel);

        let porter = Porter::new("peer", weak);
        let delegate = RecordingDelegate::default();

        porter.send_data(1, b"hello from alice".to_vec(), 0, 3, false);
        assert!(porter.process(0.0, &delegate).await);
        assert_eq!(delegate.sent.load(Ordering::SeqCst), 1);

        let on_wire = channel.drain_outbox();
        assert_eq!(on_wire, b"hello from alice");

        // Simulate the bytes arriving at the peer's Porter.
        let peer_channel: Arc<dyn ByteChannel> = Arc::new(MemoryChannel::new(1024));
        let peer_porter = Porter::new("alice", Arc::downgrade(&peer_channel));
        let delivered = peer_porter.check_arrival(&on_wire, 0.0);
        assert_eq!(delivered, vec![on_wire]);
    })
}
