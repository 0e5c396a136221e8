extern crate cfg_if;
extern crate clap;
extern crate rand;
extern crate rand_xoshiro;
extern crate rayon;

pub mod automorphism;
pub mod cli;
pub mod count_table;
pub mod decompose;
pub mod engine;
pub mod error;
pub mod graph;
pub mod indexer;
pub mod io;
pub mod partition;
pub mod rcm;
pub mod template;
pub mod union_find;
pub mod util;
