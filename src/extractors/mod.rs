// src/extractors/mod.rs
pub mod cell;
pub mod company;
pub mod industry;
pub mod locator;
pub mod normalizer;
pub mod period;
pub mod row;
pub mod section;
pub mod selection;
