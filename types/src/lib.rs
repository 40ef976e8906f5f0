//! Common types shared by the liftoff engine and its hosts.

pub mod crash;
