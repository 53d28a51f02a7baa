//! Core build pipeline for kbsite.
//!
//! Sources content files into a node store, derives the category, page, and
//! troubleshooter graph from them, registers routes and redirects, and
//! writes the result to an output directory (see [`pipeline::build_site`]).

pub mod assembler;
pub mod diff;
pub mod graph;
pub mod icons;
pub mod links;
pub mod pipeline;
pub mod registrar;
pub mod source;
pub mod troubleshooter;
