use crate::core::resolver::matches_rule;
use crate::domain::model::{BoqItem, TargetCost};
use crate::domain::ports::CategoryHierarchy;
use std::collections::HashMap;

/// 把扣減總額按成本比例分配到目標類別的明細。
///
/// 同時符合多個目標的明細只計一次；目標明細成本總和為 0 時平均分配。
/// 不在目標集合內的明細一律為 0。
pub fn calculate_additions<H: CategoryHierarchy + ?Sized>(
    items: &[BoqItem],
    targets: &[TargetCost],
    total_deduction: f64,
    hierarchy: &H,
) -> HashMap<String, f64> {
    let mut additions: HashMap<String, f64> =
        items.iter().map(|item| (item.id.clone(), 0.0)).collect();

    if total_deduction == 0.0 || targets.is_empty() {
        return additions;
    }

    let target_items: Vec<&BoqItem> = items
        .iter()
        .filter(|item| {
            targets
                .iter()
                .any(|target| matches_rule(item, &target.selector, hierarchy))
        })
        .collect();

    if target_items.is_empty() {
        tracing::debug!("No items match the target categories");
        return additions;
    }

    let target_total: f64 = target_items
        .iter()
        .map(|item| item.total_commercial_work_cost)
        .sum();
    let count = target_items.len() as f64;

    if target_total == 0.0 {
        tracing::debug!(
            "Target items have zero cost, splitting {:.2} equally across {} item(s)",
            total_deduction,
            target_items.len()
        );
    }

    for item in target_items {
        let share = if target_total == 0.0 {
            total_deduction / count
        } else {
            total_deduction * item.total_commercial_work_cost / target_total
        };
        additions.insert(item.id.clone(), share);
    }

    additions
}
