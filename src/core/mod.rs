//! Core synthesis logic: config, naming, the resource graph, resolution,
//! rendering, assets and diffing.

pub mod assets;
pub mod definition;
pub mod environment;
pub mod graph;
pub mod intrinsic;
pub mod naming;
pub mod parser;
pub mod planner;
pub mod resolver;
pub mod state;
pub mod synth;
pub mod types;
