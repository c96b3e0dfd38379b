use crate::switch::{Switch, Toggle};
use crate::Lights;

/// Contract between a frontend (terminal, hardware bridge) and an emulated
/// front panel machine.
///
/// The frontend forwards raw switch and toggle changes as they happen and
/// calls `update` once per loop iteration to get the lights back.
pub trait App {
    fn init(&mut self);
    fn update(&mut self, lights: &mut Lights);
    fn handle_switch_event(&mut self, switch: Switch, is_down: bool);
    fn handle_toggle_event(&mut self, toggle: Toggle, is_on: bool);
    fn handle_serial_input(&mut self, bytes: &[u8]);
    fn should_exit(&self) -> bool;
    fn exit(&mut self);

    fn title(&self) -> String;
}
