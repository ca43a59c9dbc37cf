use serde_derive::{Deserialize, Serialize};
use std::fmt;

pub type Hash256 = ethereum_types::H256;

/// A slot number. Newtype over `u64` so it can't be confused with an epoch or a validator index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot(u64);

/// An epoch number. Newtype over `u64`, same rationale as `Slot`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epoch(u64);

macro_rules! impl_common {
    ($ty: ident) => {
        impl $ty {
            pub const fn new(n: u64) -> Self {
                $ty(n)
            }

            pub const fn as_u64(&self) -> u64 {
                self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == 0
            }
        }

        impl From<u64> for $ty {
            fn from(n: u64) -> Self {
                $ty(n)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

impl_common!(Slot);
impl_common!(Epoch);
