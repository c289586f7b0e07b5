use crate::domain::model::{BoqItem, ClientPosition, PositionRedistribution, RedistributionResult};
use std::collections::HashMap;

fn unit_price(total: f64, quantity: f64) -> f64 {
    if quantity > 0.0 {
        total / quantity
    } else {
        0.0
    }
}

/// 依 `client_position_id` 彙總每筆明細的重新分配結果，順序與 `positions` 相同。
///
/// 沒有明細的項次仍會輸出（總額為 0）；不屬於任何已知項次的明細會被忽略。
pub fn aggregate_by_position(
    items: &[BoqItem],
    results: &[RedistributionResult],
    positions: &[ClientPosition],
) -> Vec<PositionRedistribution> {
    let results_by_item: HashMap<&str, &RedistributionResult> = results
        .iter()
        .map(|r| (r.boq_item_id.as_str(), r))
        .collect();

    // (material, work_before, work_after)
    let mut totals: HashMap<&str, (f64, f64, f64)> = HashMap::new();
    for item in items {
        let entry = totals
            .entry(item.client_position_id.as_str())
            .or_insert((0.0, 0.0, 0.0));
        entry.0 += item.total_commercial_material_cost;
        match results_by_item.get(item.id.as_str()) {
            Some(result) => {
                entry.1 += result.original_work_cost;
                entry.2 += result.final_work_cost;
            }
            None => {
                entry.1 += item.total_commercial_work_cost;
                entry.2 += item.total_commercial_work_cost;
            }
        }
    }

    let unknown = totals
        .keys()
        .filter(|id| !positions.iter().any(|p| p.id == **id))
        .count();
    if unknown > 0 {
        tracing::debug!("{} position id(s) in items have no matching position", unknown);
    }

    positions
        .iter()
        .map(|position| {
            let (material, before, after) = totals
                .get(position.id.as_str())
                .copied()
                .unwrap_or((0.0, 0.0, 0.0));
            PositionRedistribution {
                position_id: position.id.clone(),
                position_number: position.position_number.clone(),
                work_name: position.work_name.clone(),
                quantity: position.quantity,
                total_material: material,
                total_work_before: before,
                total_work_after: after,
                material_unit_price: unit_price(material, position.quantity),
                work_unit_price_before: unit_price(before, position.quantity),
                work_unit_price_after: unit_price(after, position.quantity),
            }
        })
        .collect()
}
