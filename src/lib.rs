//! Editing engine for capillary-electrophoresis sequencing traces.
//!
//! A [`Trace`] keeps four co-indexed views of one read (per-channel signal
//! curves, per-base sample locations, per-base quality scores and the called
//! sequence) consistent under structural edits: cutting a region out
//! ([`Trace::take`]), splicing one in ([`Trace::insert`]), trimming either
//! end and reversing orientation. Rendering, file parsing and interaction
//! belong to the hosting viewer; this crate only owns the data and its edit
//! semantics.

pub mod alphabet;
pub mod sequence;
pub mod trace;

pub use crate::{alphabet::NucleotideAlphabet, sequence::Sequence, trace::Trace};
