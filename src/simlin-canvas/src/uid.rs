// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::HashMap;

use crate::common::Result;
use crate::datamodel::{EdgeId, NodeId};
use crate::model_err;

/// Allocates node and edge ids for a single graph model.
///
/// Ids are `n<k>` and `e<k>` with `k` counting up from the seed.  A candidate
/// that is already in use (for example because the host inserted an element
/// with an id of its own) is skipped, so allocation never collides.
#[derive(Clone, Debug)]
pub struct IdAllocator {
    next_node: u64,
    next_edge: u64,
}

impl IdAllocator {
    pub fn new(seed: u64) -> Self {
        Self {
            next_node: seed,
            next_edge: seed,
        }
    }

    pub fn alloc_node(&mut self, in_use: impl Fn(&NodeId) -> bool) -> NodeId {
        loop {
            let id = NodeId::new(format!("n{}", self.next_node));
            self.next_node += 1;
            if !in_use(&id) {
                return id;
            }
        }
    }

    pub fn alloc_edge(&mut self, in_use: impl Fn(&EdgeId) -> bool) -> EdgeId {
        loop {
            let id = EdgeId::new(format!("e{}", self.next_edge));
            self.next_edge += 1;
            if !in_use(&id) {
                return id;
            }
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(1)
    }
}

const ALPHABET_LEN: usize = 26;
/// A..Z followed by AA..ZZ.
pub const LABEL_COUNT: usize = ALPHABET_LEN + ALPHABET_LEN * ALPHABET_LEN;

/// The `index`th label of the A, B, .., Z, AA, AB, .., ZZ sequence.
pub fn label_at(index: usize) -> String {
    let letter = |i: usize| char::from(b'A' + i as u8);
    if index < ALPHABET_LEN {
        letter(index).to_string()
    } else {
        let i = (index - ALPHABET_LEN) % (ALPHABET_LEN * ALPHABET_LEN);
        let mut label = String::with_capacity(2);
        label.push(letter(i / ALPHABET_LEN));
        label.push(letter(i % ALPHABET_LEN));
        label
    }
}

/// Hands out human-readable node labels that are unique among the labels
/// currently in use.
///
/// The cursor only moves forward, so a released label is not handed out
/// again until the sequence wraps around.  `next` fails once every label in
/// the sequence is live.  Hosts may insert several nodes with the same
/// label, so each live label counts its holders and stays live until the
/// last one releases it.
#[derive(Clone, Debug, Default)]
pub struct LabelSequence {
    live: HashMap<String, usize>,
    cursor: usize,
}

impl LabelSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> Result<String> {
        for step in 0..LABEL_COUNT {
            let index = (self.cursor + step) % LABEL_COUNT;
            let label = label_at(index);
            if !self.live.contains_key(&label) {
                self.cursor = index + 1;
                self.live.insert(label.clone(), 1);
                return Ok(label);
            }
        }

        model_err!(
            LabelsExhausted,
            format!("all {LABEL_COUNT} labels are in use")
        )
    }

    /// Marks an externally chosen label as live.  Returns false if it
    /// already was.
    pub fn reserve(&mut self, label: &str) -> bool {
        let holders = self.live.entry(label.to_string()).or_insert(0);
        *holders += 1;
        *holders == 1
    }

    /// Drops one holder of `label`.
    pub fn release(&mut self, label: &str) {
        if let Some(holders) = self.live.get_mut(label) {
            *holders -= 1;
            if *holders == 0 {
                self.live.remove(label);
            }
        }
    }

    pub fn is_live(&self, label: &str) -> bool {
        self.live.contains_key(label)
    }
}
