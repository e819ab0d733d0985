//! RAID5 address-translation, I/O and reconstruction engine.
#![allow(clippy::cargo_common_metadata)]

pub mod device;
pub mod layout;
pub mod metrics;
pub mod retention;
