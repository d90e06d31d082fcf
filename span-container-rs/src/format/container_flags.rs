use bitflags::bitflags;

bitflags! {
    /// Flags stored in a container header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContainerFlags: u8 {
        /// Marks the empty container that terminates a file.
        const EOF = 0x01;
    }
}
