//! Community water source tracking with issue reports, repair logs, and a
//! vendor marketplace paid through M-Pesa STK push.

/// Declares a `u64` newtype identifier that serializes as a bare number.
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

pub mod accounts;
pub mod config;
pub mod error;
pub mod forms;
pub mod http;
pub mod marketplace;
pub mod notifications;
pub mod payments;
pub mod registry;
pub mod reports;
pub mod store;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;
