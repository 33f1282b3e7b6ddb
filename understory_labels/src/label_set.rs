// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Label sets: the labels one style produced for one tile.

use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::Label;

/// Identifier of a style layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleId(pub u32);

/// Process-unique identifier of a [`LabelSet`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LabelSetId(u32);

impl LabelSetId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Weak reference to a label inside a [`LabelSet`].
///
/// Handles never keep a set alive. A handle whose set is no longer among the
/// collected tiles simply fails to resolve.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LabelHandle {
    set: LabelSetId,
    index: u32,
}

impl LabelHandle {
    pub(crate) fn new(set: LabelSetId, index: usize) -> Self {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "label sets hold far fewer than u32::MAX labels"
        )]
        let index = index as u32;
        Self { set, index }
    }

    /// Set the label belongs to.
    pub const fn set(self) -> LabelSetId {
        self.set
    }

    /// Position in the set.
    pub const fn index(self) -> usize {
        self.index as usize
    }
}

/// The labels produced by one style for one tile.
#[derive(Debug)]
pub struct LabelSet {
    id: LabelSetId,
    style: StyleId,
    labels: Vec<Label>,
}

impl LabelSet {
    /// An empty set for `style`.
    pub fn new(style: StyleId) -> Self {
        Self {
            id: LabelSetId::next(),
            style,
            labels: Vec::new(),
        }
    }

    /// This set's identifier.
    pub fn id(&self) -> LabelSetId {
        self.id
    }

    /// The style that produced the set.
    pub fn style(&self) -> StyleId {
        self.style
    }

    /// Append a label and return its handle.
    pub fn push(&mut self, label: Label) -> LabelHandle {
        let handle = self.handle(self.labels.len());
        self.labels.push(label);
        handle
    }

    /// Handle for the label at `index`.
    pub fn handle(&self, index: usize) -> LabelHandle {
        LabelHandle::new(self.id, index)
    }

    /// The label behind `handle`, if it belongs to this set.
    pub fn get(&self, handle: LabelHandle) -> Option<&Label> {
        if handle.set != self.id {
            return None;
        }
        self.labels.get(handle.index())
    }

    /// Mutable access to the label behind `handle`.
    pub fn get_mut(&mut self, handle: LabelHandle) -> Option<&mut Label> {
        if handle.set != self.id {
            return None;
        }
        self.labels.get_mut(handle.index())
    }

    /// Link `child` to `parent`. Returns false if `child` is not in this set.
    ///
    /// The parent may live in any set; see [`Label::set_parent`].
    pub fn set_parent(
        &mut self,
        child: LabelHandle,
        parent: LabelHandle,
        inherit_visibility: bool,
        inherit_position: bool,
    ) -> bool {
        match self.get_mut(child) {
            Some(label) => {
                label.set_parent(parent, inherit_visibility, inherit_position);
                true
            }
            None => false,
        }
    }

    /// All labels in insertion order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Mutable labels in insertion order.
    pub fn labels_mut(&mut self) -> &mut [Label] {
        &mut self.labels
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Kill every label, e.g. when the style is removed.
    pub fn retire(&mut self) {
        for label in &mut self.labels {
            label.kill();
        }
    }
}
