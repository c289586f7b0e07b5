use crate::core::resolver::{matching_items, selector_key};
use crate::domain::model::{BoqItem, SourceRule};
use crate::domain::ports::CategoryHierarchy;
use std::collections::{BTreeMap, HashMap};

/// 單一規則的扣減結果
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDeduction {
    pub deducted_amount: f64,
    pub affected_item_ids: Vec<String>,
}

/// 單一明細的累計扣減
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemDeduction {
    pub original: f64,
    pub deducted: f64,
}

/// 按規則鍵計算扣減金額。沒有任何符合明細的規則直接略過。
pub fn calculate_deductions<H: CategoryHierarchy + ?Sized>(
    items: &[BoqItem],
    rules: &[SourceRule],
    hierarchy: &H,
) -> BTreeMap<String, RuleDeduction> {
    let mut deductions = BTreeMap::new();

    for rule in rules {
        let key = selector_key(&rule.selector);
        let matched = matching_items(items, &rule.selector, hierarchy);
        if matched.is_empty() {
            tracing::debug!("Deduction rule {} matches no items, skipping", key);
            continue;
        }

        let total_cost: f64 = matched.iter().map(|i| i.total_commercial_work_cost).sum();
        let deducted_amount = total_cost * rule.percentage / 100.0;

        tracing::debug!(
            "Rule {}: {} item(s), base {:.2}, deducting {:.2} ({}%)",
            key,
            matched.len(),
            total_cost,
            deducted_amount,
            rule.percentage
        );

        deductions.insert(
            key,
            RuleDeduction {
                deducted_amount,
                affected_item_ids: matched.iter().map(|i| i.id.clone()).collect(),
            },
        );
    }

    deductions
}

/// 把每條規則的扣減金額按成本比例分攤到明細上，多條規則的扣減會累加。
///
/// 若規則涵蓋的明細成本總和為 0，改為平均分攤。
pub fn apply_deductions(
    items: &[BoqItem],
    deductions: &BTreeMap<String, RuleDeduction>,
) -> HashMap<String, ItemDeduction> {
    let mut by_item: HashMap<String, ItemDeduction> = items
        .iter()
        .map(|item| {
            (
                item.id.clone(),
                ItemDeduction {
                    original: item.total_commercial_work_cost,
                    deducted: 0.0,
                },
            )
        })
        .collect();

    for (key, bucket) in deductions {
        if bucket.affected_item_ids.is_empty() {
            continue;
        }

        let bucket_total: f64 = bucket
            .affected_item_ids
            .iter()
            .filter_map(|id| by_item.get(id))
            .map(|d| d.original)
            .sum();

        if bucket_total == 0.0 {
            tracing::debug!("Rule {} has zero base cost, splitting equally", key);
        }

        let count = bucket.affected_item_ids.len() as f64;
        for id in &bucket.affected_item_ids {
            if let Some(entry) = by_item.get_mut(id) {
                let share = if bucket_total == 0.0 {
                    bucket.deducted_amount / count
                } else {
                    bucket.deducted_amount * entry.original / bucket_total
                };
                entry.deducted += share;
            }
        }
    }

    by_item
}
