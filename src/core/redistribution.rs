use crate::core::addition::calculate_additions;
use crate::core::deduction::{apply_deductions, calculate_deductions};
use crate::domain::model::{
    BoqItem, RedistributionOutcome, RedistributionResult, SourceRule, TargetCost,
};
use crate::domain::ports::CategoryHierarchy;

/// 扣減總額與增加總額之差小於此值即視為平衡
pub const BALANCE_TOLERANCE: f64 = 0.01;

/// 執行完整的重新分配：扣減 → 分攤 → 增加 → 組裝結果。
///
/// 純函式，不會失敗；結果順序與 `items` 相同。目標集合無法吸收扣減額時
/// `is_balanced` 為 `false`，由呼叫端決定是否接受。
pub fn calculate_redistribution<H: CategoryHierarchy + ?Sized>(
    items: &[BoqItem],
    rules: &[SourceRule],
    targets: &[TargetCost],
    hierarchy: &H,
) -> RedistributionOutcome {
    let deductions = calculate_deductions(items, rules, hierarchy);
    let applied = apply_deductions(items, &deductions);

    let total_deducted: f64 = items
        .iter()
        .filter_map(|item| applied.get(&item.id))
        .map(|d| d.deducted)
        .sum();

    let additions = calculate_additions(items, targets, total_deducted, hierarchy);
    let total_added: f64 = items
        .iter()
        .filter_map(|item| additions.get(&item.id))
        .sum();

    let results: Vec<RedistributionResult> = items
        .iter()
        .map(|item| {
            let original = item.total_commercial_work_cost;
            let deducted = applied.get(&item.id).map(|d| d.deducted).unwrap_or(0.0);
            let added = additions.get(&item.id).copied().unwrap_or(0.0);
            RedistributionResult {
                boq_item_id: item.id.clone(),
                original_work_cost: original,
                deducted_amount: deducted,
                added_amount: added,
                final_work_cost: original - deducted + added,
            }
        })
        .collect();

    let is_balanced = (total_deducted - total_added).abs() < BALANCE_TOLERANCE;

    if is_balanced {
        tracing::debug!(
            "Redistributed {:.2} across {} item(s)",
            total_deducted,
            results.len()
        );
    } else {
        tracing::warn!(
            "Redistribution is unbalanced: deducted {:.2}, added {:.2}",
            total_deducted,
            total_added
        );
    }

    RedistributionOutcome {
        results,
        total_deducted,
        total_added,
        is_balanced,
    }
}
