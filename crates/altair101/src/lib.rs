use anyhow::{Context, Result};

use altair101_common::app::App;
use altair101_i8080::TargetProfile;
use altair101_panel::{Altair101, Altair101App, Collaborators, MachineConfig};
use altair101_term::{TerminalContext, TerminalInitInfo};

/// What to put in memory before the panel comes up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    None,
    /// One of the built-in programs, by number.
    Builtin(u8),
    /// A raw image loaded at address 0.
    Image(Vec<u8>),
}

pub fn build_machine(profile: TargetProfile, program: &Program) -> Result<Altair101> {
    let config = MachineConfig::builder().profile(profile).build();
    let mut machine = Altair101::new(config, Collaborators::default())?;
    match program {
        Program::None => {}
        Program::Builtin(number) => machine
            .load_builtin(*number)
            .with_context(|| format!("loading built-in program {number}"))?,
        Program::Image(bytes) => machine.load_image(0, bytes)?,
    }
    Ok(machine)
}

pub fn run(profile: TargetProfile, program: Program) -> Result<()> {
    let app = Altair101App::new(build_machine(profile, &program)?);
    let init_info = TerminalInitInfo::builder().title(app.title()).build();
    TerminalContext::run(init_info, app)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use altair101_panel::ProgramState;

    #[test]
    fn image_lands_at_zero() {
        let machine =
            build_machine(TargetProfile::Mega, &Program::Image(vec![0x3E, 0x2A, 0x76])).unwrap();
        assert_eq!(machine.memory().read(1), 0x2A);
        assert_eq!(machine.state(), ProgramState::Wait);
    }

    #[test]
    fn oversized_image_is_an_error() {
        let image = Program::Image(vec![0; 65]);
        assert!(build_machine(TargetProfile::Nano, &image).is_err());
    }
}
