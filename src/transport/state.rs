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

//! ConnectionStateMachine: six states driven by a 1 Hz tick (spec §4.5).
//! The machine itself never touches a channel; the caller feeds it
//! `alive`/`channel_open`/last-activity timestamps each tick and gets
//! back whether to emit a heartbeat.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Init,
    Preparing,
    Ready,
    Expired,
    Maintaining,
    Error,
}

pub const T_EXPIRE: f64 = 16.0;
pub const T_LONG: f64 = 8.0 * T_EXPIRE;

pub struct ConnectionStateMachine {
    pub state: ConnectionState,
    entered_at: f64,
    error_entered_at: Option<f64>,
}

impl ConnectionStateMachine {
    pub fn new(now: f64) -> Self {
        Self { state: ConnectionState::Init, entered_at: now, error_entered_at: None }
    }

    fn transition(&mut self, to: ConnectionState, now: f64) {
        if to == ConnectionState::Error {
            self.error_entered_at = Some(now);
        }
        log::debug!(target: "dimcore::transport", "connection {:?} -> {:?}", self.state, to);
        self.state = to;
        self.entered_at = now;
    }

    /// Advances the machine one tick and returns `true` iff the caller
    /// should write a heartbeat (only in the `Maintaining` state).
    pub fn tick(&mut self, now: f64, alive: bool, channel_open: bool, last_recv_at: Option<f64>, last_send_at: Option<f64>) -> bool {
        match self.state {
            ConnectionState::Init => {
                if channel_open {
                    self.transition(ConnectionState::Preparing, now);
                }
            }
            ConnectionState::Preparing => {
                if alive {
                    self.transition(ConnectionState::Ready, now);
                } else if !channel_open {
                    self.transition(ConnectionState::Init, now);
                }
            }
            ConnectionState::Ready => {
                if !alive {
                    self.transition(ConnectionState::Error, now);
                } else if last_recv_at.map_or(true, |t| now - t > T_EXPIRE) {
                    self.transition(ConnectionState::Expired, now);
                }
            }
            ConnectionState::Expired => {
                if !alive || last_recv_at.map_or(true, |t| now - t > T_LONG) {
                    self.transition(ConnectionState::Error, now);
                } else if last_send_at.map_or(false, |t| now - t <= T_EXPIRE) {
                    self.transition(ConnectionState::Maintaining, now);
                }
            }
            ConnectionState::Maintaining => {
                if !alive || last_recv_at.map_or(true, |t| now - t > T_LONG) {
                    self.transition(ConnectionState::Error, now);
                } else if last_recv_at.map_or(false, |t| now - t <= T_EXPIRE) {
                    self.transition(ConnectionState::Ready, now);
                } else if last_send_at.map_or(true, |t| now - t > T_EXPIRE) {
                    self.transition(ConnectionState::Expired, now);
                }
            }
            ConnectionState::Error => {
                if alive {
                    if let (Some(entered), Some(recv)) = (self.error_entered_at, last_recv_at) {
                        if recv > entered {
                            self.transition(ConnectionState::Init, now);
                        }
                    }
                }
            }
        }
        self.state == ConnectionState::Maintaining
    }

    pub fn time_in_state(&self, now: f64) -> f64 {
        now - self.entered_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progresses_init_to_ready() {
        let mut fsm = ConnectionStateMachine::new(0.0);
        assert_eq!(fsm.state, ConnectionState::Init);
        fsm.tick(1.0, false, true, None, None);
        assert_eq!(fsm.state, ConnectionState::Preparing);
        fsm.tick(2.0, true, true, Some(2.0), None);
        assert_eq!(fsm.state, ConnectionState::Ready);
    }

    #[test]
    fn ready_expires_after_t_expire_without_recv() {
        let mut fsm = ConnectionStateMachine::new(0.0);
        fsm.state = ConnectionState::Ready;
        fsm.tick(T_EXPIRE + 1.0, true, true, Some(0.0), None);
        assert_eq!(fsm.state, ConnectionState::Expired);
    }

    #[test]
    fn expired_to_maintaining_on_recent_send() {
        let mut fsm = ConnectionStateMachine::new(0.0);
        fsm.state = ConnectionState::Expired;
        let sent_heartbeat = fsm.tick(20.0, true, true, Some(0.0), Some(19.0));
        assert_eq!(fsm.state, ConnectionState::Maintaining);
        assert!(sent_heartbeat);
    }

    #[test]
    fn maintaining_to_ready_on_fresh_recv() {
        let mut fsm = ConnectionStateMachine::new(0.0);
        fsm.state = ConnectionState::Maintaining;
        fsm.tick(20.0, true, true, Some(19.0), Some(19.0));
        assert_eq!(fsm.state, ConnectionState::Ready);
    }

    #[test]
    fn dead_channel_always_errors() {
        for state in [ConnectionState::Ready, ConnectionState::Expired, ConnectionState::Maintaining] {
            let mut fsm = ConnectionStateMachine::new(0.0);
            fsm.state = state;
            fsm.tick(10.0, false, true, Some(0.0), None);
            assert_eq!(fsm.state, ConnectionState::Error);
        }
    }

    #[test]
    fn error_recovers_to_init_after_activity() {
        let mut fsm = ConnectionStateMachine::new(0.0);
        fsm.state = ConnectionState::Error;
        fsm.error_entered_at = Some(5.0);
        fsm.tick(10.0, true, true, Some(4.0), None);
        assert_eq!(fsm.state, ConnectionState::Error);
        fsm.tick(11.0, true, true, Some(6.0), None);
        assert_eq!(fsm.state, ConnectionState::Init);
    }
}
