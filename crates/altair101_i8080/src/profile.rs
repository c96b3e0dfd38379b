use std::fmt;
use std::str::FromStr;

use anyhow::bail;

/// Board the emulator is sized for. Smaller boards get less memory and
/// fewer timer slots; only the Due has the headroom to throttle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TargetProfile {
    Nano,
    Mega1k,
    Mega,
    #[default]
    Due,
}

impl TargetProfile {
    pub const ALL: [TargetProfile; 4] = [
        TargetProfile::Nano,
        TargetProfile::Mega1k,
        TargetProfile::Mega,
        TargetProfile::Due,
    ];

    pub const fn memory_size(self) -> usize {
        match self {
            TargetProfile::Nano => 64,
            TargetProfile::Mega1k => 1024,
            TargetProfile::Mega => 2048,
            TargetProfile::Due => 0x10000,
        }
    }

    pub const fn max_timers(self) -> usize {
        match self {
            TargetProfile::Due => 13,
            _ => 9,
        }
    }

    pub const fn throttle(self) -> bool {
        matches!(self, TargetProfile::Due)
    }

    pub const fn name(self) -> &'static str {
        match self {
            TargetProfile::Nano => "nano",
            TargetProfile::Mega1k => "mega1k",
            TargetProfile::Mega => "mega",
            TargetProfile::Due => "due",
        }
    }
}

impl fmt::Display for TargetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match Self::ALL.into_iter().find(|p| p.name() == lower) {
            Some(profile) => Ok(profile),
            None => bail!("unknown profile '{s}' (expected nano, mega1k, mega or due)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TargetProfile;

    #[test]
    fn parses_names() {
        assert_eq!("nano".parse::<TargetProfile>().unwrap(), TargetProfile::Nano);
        assert_eq!("DUE".parse::<TargetProfile>().unwrap(), TargetProfile::Due);
        assert!("uno".parse::<TargetProfile>().is_err());
    }

    #[test]
    fn board_limits() {
        assert_eq!(TargetProfile::Nano.memory_size(), 64);
        assert_eq!(TargetProfile::Mega1k.memory_size(), 1024);
        assert_eq!(TargetProfile::Mega.max_timers(), 9);
        assert_eq!(TargetProfile::Due.max_timers(), 13);
        assert!(TargetProfile::Due.throttle());
        assert!(!TargetProfile::Mega.throttle());
    }
}
