//! Devices the panel talks to but does not emulate.
//!
//! Each trait is a narrow command sink. The default implementations only
//! log, which is what the terminal build uses.

use anyhow::Result;

use altair101_common::Lights;

use crate::control::{ClockCommand, PlayerCommand, SoundEffect, Volume};

pub trait Player {
    fn command(&mut self, command: PlayerCommand) -> Result<()>;
    fn sound_effect(&mut self, effect: SoundEffect) -> Result<()>;
    fn volume(&mut self, volume: Volume) -> Result<()>;
}

pub trait RealTimeClock {
    fn command(&mut self, command: ClockCommand) -> Result<()>;
}

/// Whatever shows the status, address and data rows.
pub trait LightsDevice {
    fn render(&mut self, lights: &Lights) -> Result<()>;
}

/// Character output of a running program.
pub trait Console {
    fn write_byte(&mut self, byte: u8) -> Result<()>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LogPlayer;

impl Player for LogPlayer {
    fn command(&mut self, command: PlayerCommand) -> Result<()> {
        log::info!("player: {:?}", command);
        Ok(())
    }

    fn sound_effect(&mut self, effect: SoundEffect) -> Result<()> {
        log::info!("player sound effect: {:?}", effect);
        Ok(())
    }

    fn volume(&mut self, volume: Volume) -> Result<()> {
        log::info!("player volume {:?}", volume);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LogClock;

impl RealTimeClock for LogClock {
    fn command(&mut self, command: ClockCommand) -> Result<()> {
        log::info!("clock: {:?}", command);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LogLights;

impl LightsDevice for LogLights {
    fn render(&mut self, lights: &Lights) -> Result<()> {
        let [status, data, lo, hi] = lights.frame();
        log::trace!(
            "lights: status {:08b} address {:08b}{:08b} data {:08b}",
            status,
            hi,
            lo,
            data
        );
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LogConsole;

impl Console for LogConsole {
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        log::info!("console: 0x{:02X} {:?}", byte, byte as char);
        Ok(())
    }
}

/// Everything the controller reports to, boxed so frontends can plug in
/// their own devices.
pub struct Collaborators {
    pub player: Box<dyn Player>,
    pub clock: Box<dyn RealTimeClock>,
    pub lights: Box<dyn LightsDevice>,
    pub console: Box<dyn Console>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            player: Box::new(LogPlayer),
            clock: Box::new(LogClock),
            lights: Box::new(LogLights),
            console: Box::new(LogConsole),
        }
    }
}

/// Log and drop a collaborator failure; the machine keeps running.
pub(crate) fn report(what: &str, result: Result<()>) {
    if let Err(err) = result {
        log::warn!("{what} failed: {err:#}");
    }
}
