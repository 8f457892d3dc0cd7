//! Operation classes.
//!
//! The closed set of micro-op categories a functional unit can declare.
//! Names match the host simulator's class names, so pool files written
//! for it (`"IntAlu"`, `"SimdFloatMultAcc"`, ...) parse unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

macro_rules! op_classes {
    ($($(#[$doc:meta])* $name:ident),+ $(,)?) => {
        /// A category of micro-operation used to match work to capable units.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub enum OpClass {
            $($(#[$doc])* $name,)+
        }

        impl OpClass {
            /// Every class, in index order.
            pub const ALL: &'static [OpClass] = &[$(OpClass::$name,)+];

            /// Number of classes; the length of any dense per-class table.
            pub const COUNT: usize = Self::ALL.len();

            /// The class name as written in pool files.
            pub fn name(self) -> &'static str {
                match self {
                    $(OpClass::$name => stringify!($name),)+
                }
            }
        }
    };
}

op_classes! {
    /// Integer ALU.
    IntAlu,
    IntMult,
    IntDiv,
    FloatAdd,
    FloatCmp,
    FloatCvt,
    FloatMult,
    FloatMultAcc,
    FloatDiv,
    FloatMisc,
    FloatSqrt,
    SimdAdd,
    SimdAddAcc,
    SimdAlu,
    SimdCmp,
    SimdCvt,
    SimdMisc,
    SimdMult,
    SimdMultAcc,
    SimdMatMultAcc,
    SimdShift,
    SimdShiftAcc,
    SimdDiv,
    SimdSqrt,
    SimdFloatAdd,
    SimdFloatAlu,
    SimdFloatCmp,
    SimdFloatCvt,
    SimdFloatDiv,
    SimdFloatMisc,
    SimdFloatMult,
    SimdFloatMultAcc,
    SimdFloatMatMultAcc,
    SimdFloatSqrt,
    SimdReduceAdd,
    SimdReduceAlu,
    SimdReduceCmp,
    SimdFloatReduceAdd,
    SimdFloatReduceCmp,
    SimdAes,
    SimdAesMix,
    SimdSha1Hash,
    SimdSha1Hash2,
    SimdSha256Hash,
    SimdSha256Hash2,
    SimdShaSigma2,
    SimdShaSigma3,
    /// Predicate (mask) register ALU.
    SimdPredAlu,
    /// Integer load.
    MemRead,
    /// Integer store.
    MemWrite,
    FloatMemRead,
    FloatMemWrite,
    /// Internal processor register access.
    IprAccess,
    InstPrefetch,
}

impl OpClass {
    /// Dense index in `0..OpClass::COUNT`.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for OpClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OpClass {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OpClass::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| ConfigError::ParseOpClass { name: s.into() })
    }
}
