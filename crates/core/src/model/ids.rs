use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an ID from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the underlying u64 value
            #[must_use]
            pub const fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self::new)
                    .map_err(|_| ParseIdError {
                        kind: stringify!($name),
                    })
            }
        }
    };
}

numeric_id!(
    /// Unique identifier for a tryout package
    PackageId
);
numeric_id!(
    /// Unique identifier for a timed block inside a package
    BlockId
);
numeric_id!(
    /// Unique identifier for a question in the question bank
    QuestionId
);
numeric_id!(
    /// Identifier of one answer option, unique within its question
    OptionId
);
