//! Canonical data model for the universal trace protocol

/// Implements `Display` and `FromStr` for a closed wire enum that exposes
/// `ALL` and `as_str`.
macro_rules! impl_wire_name {
    ($ty:ident, $label:literal) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        format!(
                            "Invalid {}: {}. Must be one of: {}",
                            $label,
                            s,
                            Self::ALL
                                .iter()
                                .map(|v| v.as_str())
                                .collect::<Vec<_>>()
                                .join(", ")
                        )
                    })
            }
        }
    };
}

mod batch;
mod legacy;
mod protocol;
mod session;
pub mod timestamp;
mod trace;

pub use batch::*;
pub use legacy::*;
pub use protocol::*;
pub use session::*;
pub use trace::*;

/// Free-form key-value map carried by traces and sessions
pub type Attributes = serde_json::Map<String, serde_json::Value>;
