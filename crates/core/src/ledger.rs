//! Per-stage manual ordering of deal ids.
//!
//! The ledger is the only place manual order lives; the entity store knows
//! nothing about it. Invariants maintained by every mutation here:
//! - every stage has a sequence (possibly empty),
//! - an id appears at most once across all sequences.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::ids::DealId;
use crate::stage::Stage;
use crate::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLedger {
    columns: BTreeMap<Stage, Vec<DealId>>,
}

impl Default for OrderLedger {
    fn default() -> Self {
        Self::empty()
    }
}

impl OrderLedger {
    /// A ledger with an empty sequence for every stage.
    pub fn empty() -> Self {
        Self {
            columns: Stage::ALL.into_iter().map(|stage| (stage, Vec::new())).collect(),
        }
    }

    pub fn sequence(&self, stage: Stage) -> &[DealId] {
        self.columns.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stages in display order with their sequences.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &[DealId])> + '_ {
        self.columns.iter().map(|(stage, ids)| (*stage, ids.as_slice()))
    }

    pub fn stage_of(&self, deal_id: DealId) -> Option<Stage> {
        self.iter()
            .find(|(_, ids)| ids.contains(&deal_id))
            .map(|(stage, _)| stage)
    }

    pub fn contains(&self, deal_id: DealId) -> bool {
        self.stage_of(deal_id).is_some()
    }

    /// Total number of ids across all stages.
    pub fn len(&self) -> usize {
        self.columns.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn column_mut(&mut self, stage: Stage) -> &mut Vec<DealId> {
        self.columns.entry(stage).or_default()
    }

    /// True when dropping `deal_id` before `before` (or at the end) in `stage`
    /// would leave the sequence unchanged.
    pub fn is_in_place(&self, stage: Stage, deal_id: DealId, before: Option<DealId>) -> bool {
        let seq = self.sequence(stage);
        let Some(pos) = seq.iter().position(|id| *id == deal_id) else {
            return false;
        };
        match before {
            Some(anchor) if anchor == deal_id => true,
            Some(anchor) => seq.get(pos + 1) == Some(&anchor),
            None => pos + 1 == seq.len(),
        }
    }

    /// Move `deal_id` to sit immediately before `before`, or to the end.
    /// Returns `Ok(false)` when the deal is already in that position.
    pub fn move_within_stage(
        &mut self,
        stage: Stage,
        deal_id: DealId,
        before: Option<DealId>,
    ) -> Result<bool, CoreError> {
        let seq = self.sequence(stage);
        if !seq.contains(&deal_id) {
            return Err(CoreError::NotInStage { deal_id, stage });
        }
        if let Some(anchor) = before {
            if !seq.contains(&anchor) {
                return Err(CoreError::UnknownAnchor { anchor, stage });
            }
        }
        if self.is_in_place(stage, deal_id, before) {
            return Ok(false);
        }

        let column = self.column_mut(stage);
        column.retain(|id| *id != deal_id);
        insert_before(column, deal_id, before);
        Ok(true)
    }

    /// Move `deal_id` out of `from` and into `to`, before `before` or at the end.
    /// Returns `Ok(false)` only for a same-stage move that changes nothing.
    pub fn move_across_stage(
        &mut self,
        deal_id: DealId,
        from: Stage,
        to: Stage,
        before: Option<DealId>,
    ) -> Result<bool, CoreError> {
        if from == to {
            return self.move_within_stage(from, deal_id, before);
        }
        if !self.sequence(from).contains(&deal_id) {
            return Err(CoreError::NotInStage { deal_id, stage: from });
        }
        if let Some(anchor) = before {
            if !self.sequence(to).contains(&anchor) {
                return Err(CoreError::UnknownAnchor { anchor, stage: to });
            }
        }

        for column in self.columns.values_mut() {
            column.retain(|id| *id != deal_id);
        }
        insert_before(self.column_mut(to), deal_id, before);
        Ok(true)
    }

    /// Serialize to the persisted record layout: stage name -> ordered id strings.
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string(&self.columns).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Decode a persisted record.
    ///
    /// The record must be a JSON object. Inside it decoding is lenient:
    /// unknown stage keys and unparsable ids are skipped, and an id that
    /// repeats keeps its first occurrence in display order.
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| CoreError::Serialization(e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(CoreError::InvalidData("ledger record is not an object".into()));
        };

        let mut known: BTreeMap<Stage, &Vec<Value>> = BTreeMap::new();
        for (key, value) in &map {
            let (Ok(stage), Value::Array(items)) = (Stage::parse(key), value) else {
                continue;
            };
            known.insert(stage, items);
        }

        let mut ledger = Self::empty();
        let mut seen = HashSet::new();
        for (stage, items) in known {
            let column = ledger.column_mut(stage);
            for item in items {
                let Some(Ok(deal_id)) = item.as_str().map(str::parse::<DealId>) else {
                    continue;
                };
                if seen.insert(deal_id) {
                    column.push(deal_id);
                }
            }
        }
        Ok(ledger)
    }
}

fn insert_before(column: &mut Vec<DealId>, deal_id: DealId, before: Option<DealId>) {
    let at = before
        .and_then(|anchor| column.iter().position(|id| *id == anchor))
        .unwrap_or(column.len());
    column.insert(at, deal_id);
}
