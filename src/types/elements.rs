//! Optional pack elements.

use std::fmt;

bitflags::bitflags! {
    /// Optional elements a Default-topology pack may carry.
    ///
    /// Bit positions are fixed; they do not follow declaration order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AdditionalElements: u8 {
        /// Full body with a skeleton.
        const RIGGED_BODY = 0b0000_0001;
        /// Eyes, teeth, eyelashes and the fluid/occlusion shells.
        const COMPONENTS = 0b0000_0010;
        /// Expression blend shapes.
        const BLEND_SHAPES = 0b0000_0100;
        /// Textures for the back of the head.
        const BACK_HEAD_TEXTURE = 0b0000_1000;
    }
}

/// Display names, one per flag.
const DISPLAY_NAMES: [(AdditionalElements, &str); 4] = [
    (AdditionalElements::RIGGED_BODY, "Rigged Body"),
    (AdditionalElements::COMPONENTS, "Eye & Teeth"),
    (AdditionalElements::BLEND_SHAPES, "Expression BlendShapes"),
    (AdditionalElements::BACK_HEAD_TEXTURE, "Back Head Textures"),
];

impl AdditionalElements {
    /// Human readable name of a single flag. `None` for empty or combined sets.
    pub fn display_name(&self) -> Option<&'static str> {
        DISPLAY_NAMES
            .iter()
            .find(|(flag, _)| flag == self)
            .map(|(_, name)| *name)
    }

    /// Display names of every flag set, in bit order.
    pub fn display_names(&self) -> Vec<&'static str> {
        DISPLAY_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl fmt::Display for AdditionalElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "None");
        }
        write!(f, "{}", self.display_names().join(", "))
    }
}
