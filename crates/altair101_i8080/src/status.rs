use bitflags::bitflags;

bitflags! {
    /// Machine cycle status bits as shown on the panel's STATUS row.
    ///
    /// `WO` is active low: the bit is set while the processor is *not*
    /// writing, and cleared for memory write, stack write and output cycles.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct StatusByte: u8 {
        const MEMR = 0x80;
        const INP = 0x40;
        const M1 = 0x20;
        const OUT = 0x10;
        const HLTA = 0x08;
        const STACK = 0x04;
        const WO = 0x02;
        const INT = 0x01;
    }
}

impl StatusByte {
    /// Bits that describe the current machine cycle. HLTA and INT outlive it.
    pub const CYCLE: StatusByte = StatusByte::MEMR
        .union(StatusByte::INP)
        .union(StatusByte::M1)
        .union(StatusByte::OUT)
        .union(StatusByte::STACK)
        .union(StatusByte::WO);

    /// Status of an idle bus: nothing is being written.
    pub const IDLE: StatusByte = StatusByte::WO;

    /// Replace the machine cycle bits, keeping HLTA and INT.
    #[inline]
    pub fn begin_cycle(&mut self, cycle: StatusByte) {
        *self = self.difference(StatusByte::CYCLE).union(cycle);
    }

    #[inline]
    pub fn is_writing(self) -> bool {
        !self.contains(StatusByte::WO)
    }
}

#[cfg(test)]
mod tests {
    use super::StatusByte;

    #[test]
    fn write_output_is_inverted() {
        let mut status = StatusByte::IDLE;
        assert!(!status.is_writing());
        assert_eq!(status.bits(), 0x02);
        status.begin_cycle(StatusByte::STACK);
        assert!(status.is_writing());
        assert!(!status.contains(StatusByte::WO));
    }

    #[test]
    fn new_cycle_keeps_halt_and_interrupt() {
        let mut status = StatusByte::HLTA | StatusByte::INT | StatusByte::INP;
        status.begin_cycle(StatusByte::MEMR | StatusByte::M1 | StatusByte::WO);
        assert_eq!(
            status,
            StatusByte::HLTA | StatusByte::INT | StatusByte::MEMR | StatusByte::M1 | StatusByte::WO
        );
    }
}
