use crate::domain::model::{BoqItem, CategorySelector};
use crate::domain::ports::CategoryHierarchy;

/// 判斷明細是否屬於選擇器指向的類別。
///
/// 細項層級直接比對 id；類別層級透過 `hierarchy` 找上層類別。
/// 沒有細項類別或查不到映射的明細一律視為不符合。
pub fn matches_rule<H: CategoryHierarchy + ?Sized>(
    item: &BoqItem,
    selector: &CategorySelector,
    hierarchy: &H,
) -> bool {
    let Some(detail_id) = item.detail_cost_category_id.as_deref() else {
        return false;
    };

    match selector {
        CategorySelector::Detail {
            detail_cost_category_id,
        } => detail_id == detail_cost_category_id,
        CategorySelector::Category { category_id } => {
            hierarchy.parent_of(detail_id) == Some(category_id.as_str())
        }
    }
}

/// 選擇器在規則表中的鍵：細項為原 id，類別為 `cat_` + id
pub fn selector_key(selector: &CategorySelector) -> String {
    selector.key()
}

/// 回傳符合選擇器的明細，保持輸入順序
pub fn matching_items<'a, H: CategoryHierarchy + ?Sized>(
    items: &'a [BoqItem],
    selector: &CategorySelector,
    hierarchy: &H,
) -> Vec<&'a BoqItem> {
    items
        .iter()
        .filter(|item| matches_rule(item, selector, hierarchy))
        .collect()
}
