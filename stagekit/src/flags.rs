//! Stage and canvas flag sets.

use bitflags::bitflags;

bitflags! {
    /// Behaviour flags carried by a stage.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StageFlags: u32 {
        /// The protected main stage. Its name cannot change and the bit is
        /// stripped from every public creation path.
        const MAIN = 1 << 0;
        /// Never persisted.
        const EPHEMERAL = 1 << 1;
        /// The canvas mixes audio.
        const MIX_AUDIO = 1 << 2;
    }
}

bitflags! {
    /// Flags handed to a [`CanvasFactory`](crate::media::CanvasFactory).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CanvasFlags: u32 {
        /// Enable audio mixing on the canvas.
        const MIX_AUDIO = 1 << 0;
        /// The canvas should not be persisted by its own machinery.
        const EPHEMERAL = 1 << 1;
    }
}

impl StageFlags {
    /// Returns these flags with [`StageFlags::MAIN`] cleared.
    #[must_use]
    pub fn without_main(self) -> Self {
        self - Self::MAIN
    }

    /// Decodes a persisted integer, ignoring unknown and out-of-range bits.
    #[must_use]
    pub fn from_stored(value: i64) -> Self {
        Self::from_bits_truncate(u32::try_from(value).unwrap_or(0))
    }
}

impl From<StageFlags> for CanvasFlags {
    fn from(flags: StageFlags) -> Self {
        let mut canvas = Self::empty();
        if flags.contains(StageFlags::MIX_AUDIO) {
            canvas |= Self::MIX_AUDIO;
        }
        if flags.contains(StageFlags::EPHEMERAL) {
            canvas |= Self::EPHEMERAL;
        }
        canvas
    }
}
