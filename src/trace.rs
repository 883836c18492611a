use std::collections::HashMap;

use anyhow::{Result, anyhow};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::serde_as;

use crate::{alphabet::NucleotideAlphabet, sequence::Sequence};

/// One capillary-electrophoresis read: per-channel intensity curves aligned
/// to a called base sequence, with a sample location and a quality score per
/// base, plus free-form metadata from the instrument.
///
/// The channel curves, base locations, base scores and sequence are
/// co-indexed; every edit updates all of them before returning. Edits are
/// expressed in base indices and resolved to raw sample indices through the
/// derived midpoint boundaries in `shift_base_locations`, which are
/// recomputed after every change to `base_locations`.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde_as(as = "Vec<(_, _)>")]
    channels: HashMap<u8, Vec<i32>>,
    base_locations: Vec<i32>,
    shift_base_locations: Vec<i32>,
    base_scores: Vec<i32>,
    sequence: Sequence,
    metadata: HashMap<String, Value>,
}

impl Trace {
    /// Builds a trace from the parallel arrays a format loader supplies.
    pub fn new(
        channels: HashMap<u8, Vec<i32>>,
        base_locations: Vec<i32>,
        base_scores: Vec<i32>,
        sequence: Sequence,
        metadata: HashMap<String, Value>,
    ) -> Self {
        let mut ret = Self {
            channels,
            base_locations,
            shift_base_locations: vec![],
            base_scores,
            sequence,
            metadata,
        };
        ret.compute_shift_base_locations();
        ret
    }

    #[inline(always)]
    pub fn channels(&self) -> &HashMap<u8, Vec<i32>> {
        &self.channels
    }

    #[inline(always)]
    pub fn base_locations(&self) -> &[i32] {
        &self.base_locations
    }

    #[inline(always)]
    pub fn shift_base_locations(&self) -> &[i32] {
        &self.shift_base_locations
    }

    #[inline(always)]
    pub fn base_scores(&self) -> &[i32] {
        &self.base_scores
    }

    #[inline(always)]
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    #[inline(always)]
    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    /// Total sample count, 0 when no channels are present.
    pub fn length(&self) -> usize {
        self.channels.values().next().map_or(0, Vec::len)
    }

    /// Channel symbols present, in sorted order.
    pub fn bases_available(&self) -> Vec<u8> {
        self.channels.keys().copied().sorted().collect()
    }

    /// The curve recorded for one channel symbol, empty if absent.
    pub fn data(&self, base: u8) -> &[i32] {
        self.channels.get(&base).map(Vec::as_slice).unwrap_or_default()
    }

    /// Metadata keys, in sorted order.
    pub fn metadata_keys(&self) -> Vec<&str> {
        self.metadata.keys().map(String::as_str).sorted().collect()
    }

    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// The structural validity gate: channel `A` present and non-empty, at
    /// least one called base, and locations co-indexed with the sequence.
    pub fn is_valid(&self) -> bool {
        match self.channels.get(&b'A') {
            Some(curve) if !curve.is_empty() => {}
            _ => return false,
        }
        if self.base_locations.is_empty() {
            return false;
        }
        self.base_locations.len() == self.sequence.len()
    }

    /// A new trace in reverse-complement orientation.
    ///
    /// Each curve is reversed in sample order and re-keyed under its
    /// complement symbol; locations and scores reverse in order only, since
    /// the reversed curves carry the matching reversed sample order; the
    /// call sequence becomes its reverse-complement. The receiver is left
    /// untouched.
    pub fn reverse(&self) -> Trace {
        let mut channels = HashMap::with_capacity(self.channels.len());
        for (&base, curve) in &self.channels {
            let mut curve = curve.clone();
            curve.reverse();
            channels.insert(NucleotideAlphabet::complement(base), curve);
        }

        let mut base_locations = self.base_locations.clone();
        base_locations.reverse();

        let mut base_scores = self.base_scores.clone();
        base_scores.reverse();

        Trace::new(
            channels,
            base_locations,
            base_scores,
            self.sequence.reverse_complement(),
            self.metadata.clone(),
        )
    }

    /// Cuts the base-index range `[start, start + len)` out of the receiver
    /// and returns it as an independently owned trace carrying a copy of the
    /// receiver's metadata.
    ///
    /// Out-of-range arguments are clamped, never rejected: a negative
    /// `start` becomes 0, and a range reaching the end of the bases shrinks
    /// to `count - 1 - start`, so asking for more than exists degrades to
    /// taking what is available. The end clamp stops one base short of the
    /// tail; `trim_right` counts on that.
    ///
    /// Returns `None`, mutating nothing, when the receiver fails
    /// [`is_valid`](Self::is_valid).
    pub fn take(&mut self, start: isize, len: isize) -> Option<Trace> {
        if !self.is_valid() {
            return None;
        }

        let count = self.base_locations.len() as isize;
        let start = start.clamp(0, count - 1);
        let mut len = len;
        if start.saturating_add(len) >= count {
            len = count - 1 - start;
        }
        let len = len.max(0);

        let start = start as usize;
        let len = len as usize;

        // Cut on the midpoint boundaries, not on the bases' own samples, so
        // the retained neighbours keep every sample that belongs to them.
        let trace_start = self.shift_base_locations[start] as usize;
        let trace_end = self.shift_base_locations[start + len] as usize;
        log::debug!(
            "take: bases [{start}, {}) -> samples [{trace_start}, {trace_end})",
            start + len
        );

        let mut channels = HashMap::with_capacity(self.channels.len());
        for (&base, curve) in self.channels.iter_mut() {
            channels.insert(base, curve.drain(trace_start..trace_end).collect());
        }

        let base_locations = self.base_locations[start..start + len]
            .iter()
            .map(|loc| loc - trace_start as i32)
            .collect();

        let removed = (trace_end - trace_start) as i32;
        for loc in self.base_locations.iter_mut().skip(start + len) {
            *loc -= removed;
        }
        self.base_locations.drain(start..start + len);

        let base_scores = self.base_scores.drain(start..start + len).collect();

        let sequence = self.sequence.subseq(start, len);
        self.sequence.remove(start, len);

        self.compute_shift_base_locations();

        Some(Trace::new(
            channels,
            base_locations,
            base_scores,
            sequence,
            self.metadata.clone(),
        ))
    }

    /// Splices `other` into the receiver at base index `pos`, in place.
    ///
    /// The incoming samples land on the midpoint boundary before base `pos`,
    /// the same cut line `take` uses, and the retained locations move up by
    /// exactly the incoming sample count, so a slice taken out and
    /// re-inserted at the same index restores the receiver.
    ///
    /// Fails before touching any state when `other` carries no bases, when
    /// `pos` is not a valid base index, or when a receiver channel has no
    /// counterpart in `other`; splicing through any of those would leave the
    /// parallel arrays desynchronized with no way back. Channels present
    /// only in `other` contribute nothing.
    pub fn insert(&mut self, pos: usize, other: &Trace) -> Result<()> {
        if other.base_locations.is_empty() {
            return Err(anyhow!("refusing to insert a trace without called bases"));
        }
        if pos >= self.base_locations.len() {
            return Err(anyhow!(
                "insert position {pos} outside the {} called bases",
                self.base_locations.len()
            ));
        }
        for &base in self.channels.keys() {
            if !other.channels.contains_key(&base) {
                return Err(anyhow!(
                    "incoming trace is missing channel {}",
                    base as char
                ));
            }
        }

        let trace_start = self.shift_base_locations[pos] as usize;
        let grown = other.length() as i32;
        log::debug!(
            "insert: {} bases at base {pos} -> sample {trace_start}",
            other.base_locations.len()
        );

        for (base, curve) in self.channels.iter_mut() {
            curve.splice(
                trace_start..trace_start,
                other.channels[base].iter().copied(),
            );
        }

        for loc in self.base_locations.iter_mut().skip(pos) {
            *loc += grown;
        }
        self.base_locations.splice(
            pos..pos,
            other.base_locations.iter().map(|loc| loc + trace_start as i32),
        );

        self.base_scores
            .splice(pos..pos, other.base_scores.iter().copied());

        self.sequence.insert(pos, &other.sequence);

        self.compute_shift_base_locations();

        Ok(())
    }

    /// Discards the first `size` called bases.
    pub fn trim_left(&mut self, size: isize) {
        let _ = self.take(0, size);
    }

    /// Discards trailing called bases by taking to the end of the read; the
    /// end clamp in [`take`](Self::take) keeps the final base in place, so
    /// the cut covers `size - 1` bases before it.
    pub fn trim_right(&mut self, size: isize) {
        let count = self.base_locations.len() as isize;
        let _ = self.take(count - size, count);
    }

    /// Midpoint boundary before each base: `shift[0]` is the first base's
    /// own location, and `shift[i]` halves the gap back to base `i - 1`.
    /// Must run after every change to `base_locations`.
    fn compute_shift_base_locations(&mut self) {
        let mut shift = Vec::with_capacity(self.base_locations.len());
        if let Some(&first) = self.base_locations.first() {
            shift.push(first);
        }
        shift.extend(
            self.base_locations
                .iter()
                .tuple_windows()
                .map(|(&prev, &cur)| cur - (cur - prev) / 2),
        );
        self.shift_base_locations = shift;
    }
}
