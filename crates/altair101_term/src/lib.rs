use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

use anyhow::Result;
use typed_builder::TypedBuilder;

use altair101_common::app::App;
use altair101_common::{Lights, Switch, Toggle};

/// One keystroke worth of panel input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Switch(Switch),
    /// Flip address toggle A0..A15.
    FlipAddress(u8),
    Quit,
}

/// Map a typed character to a panel key.
///
/// Lower case letters are the control switches, upper case their
/// counterpart on the same lever; hex digits flip the address toggle with
/// that bit number.
pub fn map_key(c: char) -> Option<Key> {
    let key = match c {
        'r' => Key::Switch(Switch::Run),
        'h' => Key::Switch(Switch::Stop),
        's' => Key::Switch(Switch::Step),
        'S' => Key::Switch(Switch::StepDown),
        'x' => Key::Switch(Switch::Examine),
        'X' => Key::Switch(Switch::ExamineNext),
        'p' => Key::Switch(Switch::Deposit),
        'P' => Key::Switch(Switch::DepositNext),
        'R' => Key::Switch(Switch::Reset),
        'C' => Key::Switch(Switch::Clear),
        'v' => Key::Switch(Switch::Protect),
        'V' => Key::Switch(Switch::Unprotect),
        'k' => Key::Switch(Switch::Aux1Up),
        'K' => Key::Switch(Switch::Aux1Down),
        'm' => Key::Switch(Switch::Aux2Up),
        'M' => Key::Switch(Switch::Aux2Down),
        'q' => Key::Quit,
        '0'..='9' | 'a'..='f' => Key::FlipAddress(c.to_digit(16)? as u8),
        _ => return None,
    };
    Some(key)
}

/// A line read from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Keys(Vec<Key>),
    /// Bytes for the serial port, typed as `:text`.
    Serial(Vec<u8>),
}

pub fn parse_line(line: &str) -> Input {
    match line.strip_prefix(':') {
        Some(text) => {
            let mut bytes = text.as_bytes().to_vec();
            bytes.push(b'\r');
            Input::Serial(bytes)
        }
        None => Input::Keys(line.chars().filter_map(map_key).collect()),
    }
}

/// Text rendering of the light rows, most significant bit first.
pub fn render_lights(lights: &Lights) -> String {
    let row = |value: u32, width: u32| -> String {
        (0..width)
            .rev()
            .map(|bit| if value >> bit & 1 == 1 { '*' } else { '.' })
            .collect()
    };
    let flag = |on: bool, name: &str| {
        if on {
            name.to_string()
        } else {
            "-".repeat(name.len())
        }
    };
    format!(
        "STATUS {}  {} {} {}\nADDR   {}  {:04X}\nDATA   {}  {:02X}",
        row(u32::from(lights.status), 8),
        flag(lights.wait, "WAIT"),
        flag(lights.hlda, "HLDA"),
        flag(lights.inte, "INTE"),
        row(u32::from(lights.address), 16),
        lights.address,
        row(u32::from(lights.data), 8),
        lights.data,
    )
}

#[derive(TypedBuilder)]
pub struct TerminalInitInfo {
    pub title: String,
    /// Pause between updates while the panel is idle.
    #[builder(default = Duration::from_millis(10))]
    pub idle_sleep: Duration,
    /// Print the light rows whenever they change.
    #[builder(default = true)]
    pub render: bool,
}

/// Drives an [`App`] from line-buffered stdin and prints its lights.
pub struct TerminalContext {
    address_toggles: u16,
    lights: Lights,
    shown: Option<Lights>,
    render: bool,
    quit: bool,
}

impl TerminalContext {
    fn new(render: bool) -> Self {
        Self {
            address_toggles: 0,
            lights: Lights::OFF,
            shown: None,
            render,
            quit: false,
        }
    }

    pub fn run(info: TerminalInitInfo, mut app: impl App) -> Result<()> {
        let TerminalInitInfo {
            title,
            idle_sleep,
            render,
        } = info;
        let input = spawn_stdin_reader();
        let mut context = TerminalContext::new(render);
        let stdout = std::io::stdout();

        println!("{title}");
        println!("keys: r run, h stop, s step, x/X examine, p/P deposit, R reset, C clear, 0-f toggles, :text serial, q quit");
        app.init();
        loop {
            let line = match input.try_recv() {
                Ok(line) => Some(line),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => {
                    log::info!("stdin closed");
                    context.quit = true;
                    None
                }
            };
            if !context.turn(&mut app, line, &mut stdout.lock())? {
                break;
            }
            if context.lights.is_idle() {
                std::thread::sleep(idle_sleep);
            }
        }
        Ok(())
    }

    /// One loop iteration. Returns `false` once the app has been told to
    /// exit; `exit` is called exactly once.
    fn turn(
        &mut self,
        app: &mut impl App,
        line: Option<String>,
        out: &mut impl Write,
    ) -> Result<bool> {
        if let Some(line) = line {
            self.feed(app, parse_line(&line));
        }
        if self.quit || app.should_exit() {
            app.exit();
            return Ok(false);
        }

        app.update(&mut self.lights);

        if self.render && self.shown != Some(self.lights) {
            writeln!(out, "{}", render_lights(&self.lights))?;
            out.flush()?;
            self.shown = Some(self.lights);
        }
        Ok(true)
    }

    fn feed(&mut self, app: &mut impl App, input: Input) {
        match input {
            Input::Serial(bytes) => app.handle_serial_input(&bytes),
            Input::Keys(keys) => {
                for key in keys {
                    if self.quit {
                        break;
                    }
                    self.press(app, key);
                }
            }
        }
    }

    fn press(&mut self, app: &mut impl App, key: Key) {
        match key {
            Key::Switch(switch) => {
                app.handle_switch_event(switch, true);
                app.handle_switch_event(switch, false);
            }
            Key::FlipAddress(bit) => {
                self.address_toggles ^= 1 << bit;
                let is_on = self.address_toggles & (1 << bit) != 0;
                app.handle_toggle_event(Toggle::Address(bit), is_on);
            }
            Key::Quit => self.quit = true,
        }
    }
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
