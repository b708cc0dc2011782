//! Colony AI - colony planning and mission dispatch for a colonization game faction

pub mod ai;
pub mod core;
pub mod game;
pub mod rules;
