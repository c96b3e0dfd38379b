use std::collections::VecDeque;

use altair101_i8080::PortHandler;

use crate::control::PlayerCommand;

/// IN: sense toggles.
pub const SENSE_PORT: u8 = 0xFF;
/// IN: serial status, 88-2SIO style.
pub const SERIAL_STATUS_PORT: u8 = 0x10;
/// IN: received byte. OUT: console byte.
pub const SERIAL_DATA_PORT: u8 = 0x11;
/// OUT: play track number.
pub const PLAYER_TRACK_PORT: u8 = 0x0A;
/// OUT: loop track number.
pub const PLAYER_LOOP_PORT: u8 = 0x0B;

pub const SERIAL_RX_READY: u8 = 0x01;
pub const SERIAL_TX_EMPTY: u8 = 0x02;

/// Output produced by a running program, handed to collaborators by the
/// controller after each instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortEvent {
    Console(u8),
    Player(PlayerCommand),
}

/// The Altair 101 port map.
#[derive(Clone, Debug, Default)]
pub struct PanelPorts {
    sense: u8,
    rx: VecDeque<u8>,
    events: Vec<PortEvent>,
}

impl PanelPorts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_sense(&mut self, sense: u8) {
        self.sense = sense;
    }

    pub fn sense(&self) -> u8 {
        self.sense
    }

    /// Queue bytes arriving on the serial line.
    pub fn receive(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    pub fn has_input(&self) -> bool {
        !self.rx.is_empty()
    }

    pub fn next_input(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    pub fn clear_input(&mut self) {
        self.rx.clear();
    }

    pub fn take_events(&mut self) -> Vec<PortEvent> {
        std::mem::take(&mut self.events)
    }
}

impl PortHandler for PanelPorts {
    fn port_in(&mut self, port: u8) -> u8 {
        match port {
            SENSE_PORT => self.sense,
            SERIAL_STATUS_PORT => {
                let mut status = SERIAL_TX_EMPTY;
                if self.has_input() {
                    status |= SERIAL_RX_READY;
                }
                status
            }
            SERIAL_DATA_PORT => self.next_input().unwrap_or(0),
            _ => {
                log::debug!("IN from unmapped port 0x{:02X}", port);
                0
            }
        }
    }

    fn port_out(&mut self, port: u8, value: u8) {
        let event = match port {
            SERIAL_DATA_PORT => PortEvent::Console(value),
            PLAYER_TRACK_PORT => PortEvent::Player(PlayerCommand::PlayTrack(u16::from(value))),
            PLAYER_LOOP_PORT => PortEvent::Player(PlayerCommand::LoopTrack(value)),
            _ => {
                log::debug!("OUT 0x{:02X} to unmapped port 0x{:02X}", value, port);
                return;
            }
        };
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sense_and_unmapped_reads() {
        let mut ports = PanelPorts::new();
        ports.set_sense(0x81);
        assert_eq!(ports.port_in(SENSE_PORT), 0x81);
        assert_eq!(ports.port_in(0x42), 0);
    }

    #[test]
    fn serial_status_tracks_queue() {
        let mut ports = PanelPorts::new();
        assert_eq!(ports.port_in(SERIAL_STATUS_PORT), SERIAL_TX_EMPTY);
        ports.receive(b"hi");
        assert_eq!(
            ports.port_in(SERIAL_STATUS_PORT),
            SERIAL_TX_EMPTY | SERIAL_RX_READY
        );
        assert_eq!(ports.port_in(SERIAL_DATA_PORT), b'h');
        assert_eq!(ports.port_in(SERIAL_DATA_PORT), b'i');
        assert_eq!(ports.port_in(SERIAL_STATUS_PORT), SERIAL_TX_EMPTY);
    }

    #[test]
    fn outputs_become_events() {
        let mut ports = PanelPorts::new();
        ports.port_out(SERIAL_DATA_PORT, b'A');
        ports.port_out(PLAYER_TRACK_PORT, 3);
        ports.port_out(PLAYER_LOOP_PORT, 4);
        ports.port_out(0x77, 1);
        assert_eq!(
            ports.take_events(),
            vec![
                PortEvent::Console(b'A'),
                PortEvent::Player(PlayerCommand::PlayTrack(3)),
                PortEvent::Player(PlayerCommand::LoopTrack(4)),
            ]
        );
        assert!(ports.take_events().is_empty());
    }
}
