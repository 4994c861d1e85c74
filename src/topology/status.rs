bitflags::bitflags! {
    /// Per-component status bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ComponentStatus: u8 {
        /// Component is part of the current selection.
        const SELECTED = 0b0000_0001;
        /// Component is hidden from display.
        const HIDDEN = 0b0000_0010;
        /// Component may not be edited.
        const LOCKED = 0b0000_0100;
        /// Component was involved in a failed operation or repaired by validation.
        const DAMAGED = 0b0000_1000;
        /// Scratch mark used by multi-pass algorithms.
        const MARKED = 0b0001_0000;
    }
}
