//! Foreach kernel signature bits.

use std::fmt;

/// The implicit arguments a foreach kernel consumes, as exported in the
/// kernel metadata.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub struct ForEachSignature(u32);

impl ForEachSignature {
    /// No implicit arguments.
    pub const EMPTY: Self = Self(0);
    /// Reads one element of an input allocation.
    pub const IN: Self = Self(0x01);
    /// Returns one element of the output allocation.
    pub const OUT: Self = Self(0x02);
    /// Takes an opaque user-data pointer.
    pub const USR_DATA: Self = Self(0x04);
    /// Takes the x coordinate.
    pub const X: Self = Self(0x08);
    /// Takes the y coordinate.
    pub const Y: Self = Self(0x10);
    /// Marks a foreach-style kernel, as opposed to a legacy root function.
    pub const KERNEL: Self = Self(0x20);
    /// Takes the z coordinate.
    pub const Z: Self = Self(0x40);
    /// Takes the kernel context.
    pub const CTXT: Self = Self(0x80);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if `self` contains all flags in `other`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if `self` shares any flag with `other`.
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` if no flags are set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether the wrapper must compute the linear invocation index.
    pub fn needs_index(self) -> bool {
        self.intersects(Self::IN | Self::OUT | Self::X | Self::Y | Self::Z)
    }
}

impl std::ops::BitOr for ForEachSignature {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ForEachSignature {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ForEachSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(ForEachSignature, &str); 8] = [
            (ForEachSignature::IN, "in"),
            (ForEachSignature::OUT, "out"),
            (ForEachSignature::USR_DATA, "usrdata"),
            (ForEachSignature::X, "x"),
            (ForEachSignature::Y, "y"),
            (ForEachSignature::KERNEL, "kernel"),
            (ForEachSignature::Z, "z"),
            (ForEachSignature::CTXT, "ctxt"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|&(_, name)| name)
            .collect();
        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}
