//! Session basket.
//!
//! A [`Basket`] is a plain value: handlers load it from the session store,
//! mutate it and hand it back for persistence. Lines are unique per
//! [`BasketKey`]; adding an existing combination bumps its count instead of
//! appending a second line.

pub mod form;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifies one selectable variant of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct BasketKey {
    pub product: i32,
    pub color: Option<i32>,
    pub size: Option<i32>,
}

impl BasketKey {
    pub fn new(product: i32, color: Option<i32>, size: Option<i32>) -> Self {
        Self {
            product,
            color,
            size,
        }
    }

    /// Form suffix `<product>_<color>_<size>` with empty segments for `None`.
    pub fn form_suffix(&self) -> String {
        let segment = |id: Option<i32>| id.map(|id| id.to_string()).unwrap_or_default();
        format!(
            "{}_{}_{}",
            self.product,
            segment(self.color),
            segment(self.size)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BasketLine {
    pub product: i32,
    pub color: Option<i32>,
    pub size: Option<i32>,
    pub count: u32,
}

impl BasketLine {
    pub fn key(&self) -> BasketKey {
        BasketKey::new(self.product, self.color, self.size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Basket {
    lines: Vec<BasketLine>,
}

impl Basket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[BasketLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, key: &BasketKey) -> Option<&BasketLine> {
        self.lines.iter().find(|line| line.key() == *key)
    }

    /// Add one unit of `key`, returning the line's new count.
    pub fn add(&mut self, key: BasketKey) -> u32 {
        if let Some(line) = self.lines.iter_mut().find(|line| line.key() == key) {
            line.count = line.count.saturating_add(1);
            return line.count;
        }
        self.lines.push(BasketLine {
            product: key.product,
            color: key.color,
            size: key.size,
            count: 1,
        });
        1
    }

    /// Apply new counts. A count of zero or less drops the line; keys without
    /// a matching line are ignored. When a key is repeated the last count wins.
    pub fn update<I>(&mut self, changes: I)
    where
        I: IntoIterator<Item = (BasketKey, i64)>,
    {
        let changes: HashMap<BasketKey, i64> = changes.into_iter().collect();
        if changes.is_empty() {
            return;
        }
        self.lines
            .retain_mut(|line| match changes.get(&line.key()).copied() {
                Some(count) if count > 0 => {
                    line.count = u32::try_from(count).unwrap_or(u32::MAX);
                    true
                }
                Some(_) => false,
                None => true,
            });
    }

    /// Drop the line for `key`. Returns whether a line was removed.
    pub fn remove(&mut self, key: &BasketKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.key() != *key);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Keep only lines passing `keep`; returns the keys of dropped lines.
    pub fn retain_lines<F>(&mut self, mut keep: F) -> Vec<BasketKey>
    where
        F: FnMut(&BasketLine) -> bool,
    {
        let mut dropped = Vec::new();
        self.lines.retain(|line| {
            let kept = keep(line);
            if !kept {
                dropped.push(line.key());
            }
            kept
        });
        dropped
    }

    pub fn product_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.lines.iter().map(|line| line.product).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn color_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.lines.iter().filter_map(|line| line.color).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn size_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.lines.iter().filter_map(|line| line.size).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

impl FromIterator<BasketLine> for Basket {
    fn from_iter<T: IntoIterator<Item = BasketLine>>(iter: T) -> Self {
        let mut basket = Basket::new();
        for line in iter {
            match basket.lines.iter_mut().find(|l| l.key() == line.key()) {
                Some(existing) => existing.count = existing.count.saturating_add(line.count),
                None if line.count > 0 => basket.lines.push(line),
                None => {}
            }
        }
        basket
    }
}
