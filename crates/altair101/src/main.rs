use anyhow::{Context, Result};

use altair101::Program;
use altair101_i8080::TargetProfile;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let profile: TargetProfile = match args.next() {
        Some(name) => name.parse()?,
        None => TargetProfile::default(),
    };

    let program = match args.next() {
        None => Program::None,
        Some(arg) => match arg.parse::<u8>() {
            Ok(number) => {
                log::info!("Loading built-in program {number}");
                Program::Builtin(number)
            }
            Err(_) => {
                log::info!("Loading program image: '{arg}'");
                Program::Image(std::fs::read(&arg).with_context(|| format!("reading {arg}"))?)
            }
        },
    };

    altair101::run(profile, program)
}
