//! Sample views shared by the demo binary and its tests.

pub mod app;
