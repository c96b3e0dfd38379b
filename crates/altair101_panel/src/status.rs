use altair101_common::Lights;
use altair101_i8080::StatusByte;

use crate::control::ProgramState;

/// Bus and CPU state that ends up on the panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelSnapshot {
    pub state: ProgramState,
    pub status: StatusByte,
    pub address: u16,
    pub data: u8,
    pub inte: bool,
}

/// Projects machine state onto the indicator lights and remembers what was
/// last sent to the display, so unchanged frames are not re-sent.
#[derive(Clone, Debug, Default)]
pub struct StatusEncoder {
    published: Option<Lights>,
}

impl StatusEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode(snapshot: &PanelSnapshot) -> Lights {
        if snapshot.state == ProgramState::LightsOff {
            return Lights::OFF;
        }
        Lights {
            status: snapshot.status.bits(),
            address: snapshot.address,
            data: snapshot.data,
            wait: !snapshot.state.is_running() && !snapshot.state.is_hold(),
            hlda: snapshot.state.is_hold(),
            inte: snapshot.inte,
        }
    }

    /// Encode `snapshot`; returns the lights only if they differ from the
    /// last published frame.
    pub fn publish(&mut self, snapshot: &PanelSnapshot) -> Option<Lights> {
        let lights = Self::encode(snapshot);
        if self.published == Some(lights) {
            return None;
        }
        self.published = Some(lights);
        Some(lights)
    }
}
