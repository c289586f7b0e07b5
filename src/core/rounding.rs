//! 單價取整與誤差補償。
//!
//! 匯出與顯示的單價必須是 [`ROUNDING_STEP`] 的倍數。逐項取整會讓加權總額偏離
//! 真實總額，因此取整後再用最大餘數法把誤差補回到個別項目上：在修正方向上
//! 被捨去最多的項目先修正，每個項目最多修正一個級距。

use crate::domain::model::{PositionPriceRow, PositionRedistribution, RoundedRow};
use std::collections::BTreeMap;

/// 預設取整級距（貨幣單位）
pub const ROUNDING_STEP: f64 = 5.0;

/// 總誤差低於此值時不做補償
pub const MIN_COMPENSATED_ERROR: f64 = 1.0;

/// 取整到最接近的 `step` 倍數；小於半個級距（以及負數、非有限值）取為 0
pub fn round_to_step(value: f64, step: f64) -> f64 {
    if !value.is_finite() || value < step / 2.0 {
        return 0.0;
    }
    (value / step).round() * step
}

/// 單次取整過程中的暫存項目
#[derive(Debug, Clone, PartialEq)]
pub struct RoundingItem {
    pub index: usize,
    pub original_price: f64,
    pub rounded_price: f64,
    /// `(rounded_price - original_price) * quantity`
    pub error: f64,
    /// 取整時捨去的部分，以級距為單位：`(original_price - rounded_price) / step`
    pub fractional_part: f64,
    pub quantity: f64,
}

impl RoundingItem {
    pub fn new(index: usize, original_price: f64, quantity: f64, step: f64) -> Self {
        let original_price = if original_price.is_finite() {
            original_price
        } else {
            0.0
        };
        let quantity = if quantity.is_finite() { quantity } else { 0.0 };
        let rounded_price = round_to_step(original_price, step);
        Self {
            index,
            original_price,
            rounded_price,
            error: (rounded_price - original_price) * quantity,
            fractional_part: (original_price - rounded_price) / step,
            quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compensation {
    /// 項目索引 → 修正後的取整單價；不在表中的項目維持原取整值
    pub adjustments: BTreeMap<usize, f64>,
    /// 補償後仍未修正的誤差（帶正負號）
    pub residual_error: f64,
}

/// 以貪婪的最大餘數法補償總誤差。
///
/// `total_error` 為正代表取整後總額偏高，修正方向為向下；此時排序鍵取
/// `-fractional_part`，讓被進位最多的項目先向下修正。
///
/// 排序鍵是 `fractional_part * direction`，不是單純的 `fractional_part` 遞減。
pub fn compensate_error(items: &[RoundingItem], total_error: f64, step: f64) -> Compensation {
    if total_error.abs() < MIN_COMPENSATED_ERROR {
        return Compensation {
            adjustments: BTreeMap::new(),
            residual_error: total_error,
        };
    }

    let direction = -total_error.signum();
    let mut ordered: Vec<&RoundingItem> = items.iter().collect();
    ordered.sort_by(|a, b| {
        (b.fractional_part * direction).total_cmp(&(a.fractional_part * direction))
    });

    let mut adjustments = BTreeMap::new();
    let mut remaining = total_error.abs();

    for item in ordered {
        if remaining < step {
            break;
        }
        if item.quantity <= 0.0 {
            continue;
        }

        let max_adjustment = (remaining / (item.quantity * step)).floor() * step;
        if max_adjustment < step {
            continue;
        }

        let adjusted = item.rounded_price + direction * step;
        if adjusted < 0.0 {
            continue;
        }

        adjustments.insert(item.index, adjusted);
        remaining -= step * item.quantity;
    }

    tracing::trace!(
        "Compensated {} item(s), residual error {:.2}",
        adjustments.len(),
        remaining
    );

    Compensation {
        adjustments,
        residual_error: remaining * -direction,
    }
}

/// 對一組 `(單價, 數量)` 取整並補償，回傳與輸入同序的取整單價
pub fn round_series(prices: &[(f64, f64)], step: f64) -> Vec<f64> {
    let items: Vec<RoundingItem> = prices
        .iter()
        .enumerate()
        .map(|(index, &(price, quantity))| RoundingItem::new(index, price, quantity, step))
        .collect();

    let total_error: f64 = items.iter().map(|i| i.error).sum();
    let compensation = compensate_error(&items, total_error, step);

    items
        .iter()
        .map(|item| {
            compensation
                .adjustments
                .get(&item.index)
                .copied()
                .unwrap_or(item.rounded_price)
        })
        .collect()
}

/// 可被取整的單價列：材料與工作單價各自為獨立的補償池
pub trait UnitPriceRow {
    fn quantity(&self) -> f64;
    fn material_unit_price(&self) -> f64;
    fn work_unit_price(&self) -> f64;
}

impl UnitPriceRow for PositionPriceRow {
    fn quantity(&self) -> f64 {
        self.quantity
    }

    fn material_unit_price(&self) -> f64 {
        self.material_unit_price
    }

    fn work_unit_price(&self) -> f64 {
        self.work_unit_price
    }
}

impl UnitPriceRow for PositionRedistribution {
    fn quantity(&self) -> f64 {
        self.quantity
    }

    fn material_unit_price(&self) -> f64 {
        self.material_unit_price
    }

    fn work_unit_price(&self) -> f64 {
        self.work_unit_price_after
    }
}

pub fn smart_round_rows<R: UnitPriceRow + Clone>(rows: &[R], step: f64) -> Vec<RoundedRow<R>> {
    let materials: Vec<(f64, f64)> = rows
        .iter()
        .map(|r| (r.material_unit_price(), r.quantity()))
        .collect();
    let works: Vec<(f64, f64)> = rows
        .iter()
        .map(|r| (r.work_unit_price(), r.quantity()))
        .collect();

    let rounded_materials = round_series(&materials, step);
    let rounded_works = round_series(&works, step);

    rows.iter()
        .zip(rounded_materials)
        .zip(rounded_works)
        .map(|((row, material), work)| RoundedRow {
            row: row.clone(),
            rounded_material_unit_price: material,
            rounded_work_unit_price: work,
        })
        .collect()
}

pub fn smart_round_positions(rows: &[PositionPriceRow]) -> Vec<RoundedRow<PositionPriceRow>> {
    smart_round_rows(rows, ROUNDING_STEP)
}

pub fn smart_round_results(
    rows: &[PositionRedistribution],
) -> Vec<RoundedRow<PositionRedistribution>> {
    smart_round_rows(rows, ROUNDING_STEP)
}
