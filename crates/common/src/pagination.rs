//! 分页结果
//!
//! `total_pages_count`、`has_next`、`has_previous` 均由存储字段推导，不做冗余存储。

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// 分页结果
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Paginated<T> {
    /// 匹配条件的总条数
    pub total_items_count: u64,
    /// 每页条数，0 表示单页容纳全部
    pub page_size: u64,
    /// 页码（从 0 开始）
    pub page_index: u64,
    /// 当前页数据
    pub items: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total_items_count: u64, page_size: u64, page_index: u64) -> Self {
        Self {
            total_items_count,
            page_size,
            page_index,
            items,
        }
    }

    /// 空结果
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, 0, 0)
    }

    /// 总页数
    ///
    /// `page_size == 0` 时固定为 1 页。
    pub fn total_pages_count(&self) -> u64 {
        if self.page_size == 0 {
            return 1;
        }
        self.total_items_count.div_ceil(self.page_size)
    }

    /// 是否存在下一页
    pub fn has_next(&self) -> bool {
        self.page_index + 1 < self.total_pages_count()
    }

    /// 是否存在上一页
    pub fn has_previous(&self) -> bool {
        self.page_index > 0
    }

    /// 转换元素类型，分页信息保持不变
    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        F: FnMut(T) -> U,
    {
        Paginated {
            total_items_count: self.total_items_count,
            page_size: self.page_size,
            page_index: self.page_index,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Serialize> Serialize for Paginated<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Paginated", 7)?;
        state.serialize_field("total_items_count", &self.total_items_count)?;
        state.serialize_field("page_size", &self.page_size)?;
        state.serialize_field("total_pages_count", &self.total_pages_count())?;
        state.serialize_field("page_index", &self.page_index)?;
        state.serialize_field("next", &self.has_next())?;
        state.serialize_field("previous", &self.has_previous())?;
        state.serialize_field("items", &self.items)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(total: u64, size: u64, index: u64) -> Paginated<u64> {
        let start = size * index;
        let end = if size == 0 { total } else { (start + size).min(total) };
        Paginated::new((start.min(total)..end).collect(), total, size, index)
    }

    #[test]
    fn test_first_of_three_pages() {
        let p = page(25, 10, 0);
        assert_eq!(p.items.len(), 10);
        assert_eq!(p.total_pages_count(), 3);
        assert!(p.has_next());
        assert!(!p.has_previous());
    }

    #[test]
    fn test_last_partial_page() {
        let p = page(25, 10, 2);
        assert_eq!(p.items.len(), 5);
        assert!(!p.has_next());
        assert!(p.has_previous());
    }

    #[test]
    fn test_exact_multiple() {
        let p = page(20, 10, 1);
        assert_eq!(p.total_pages_count(), 2);
        assert!(!p.has_next());
    }

    #[test]
    fn test_zero_page_size_is_single_page() {
        let p = page(7, 0, 0);
        assert_eq!(p.total_pages_count(), 1);
        assert_eq!(p.items.len(), 7);
        assert!(!p.has_next());
        assert!(!p.has_previous());
    }

    #[test]
    fn test_empty_result() {
        let p: Paginated<u64> = Paginated::empty();
        assert_eq!(p.total_pages_count(), 1);
        assert!(!p.has_next());
    }

    #[test]
    fn test_ceil_property() {
        for total in 0..40u64 {
            for size in 1..12u64 {
                let p: Paginated<u64> = Paginated::new(Vec::new(), total, size, 0);
                let expected = (total + size - 1) / size;
                assert_eq!(p.total_pages_count(), expected, "total={total} size={size}");
            }
        }
    }

    #[test]
    fn test_map_keeps_metadata() {
        let p = page(25, 10, 1).map(|n| n.to_string());
        assert_eq!(p.items.first().map(String::as_str), Some("10"));
        assert_eq!(p.page_index, 1);
        assert_eq!(p.total_items_count, 25);
    }

    #[test]
    fn test_serialized_shape_includes_derived_fields() {
        let json = serde_json::to_value(page(25, 10, 0)).unwrap();
        assert_eq!(json["total_pages_count"], 3);
        assert_eq!(json["next"], true);
        assert_eq!(json["previous"], false);

        let back: Paginated<u64> = serde_json::from_value(json).unwrap();
        assert_eq!(back.total_items_count, 25);
        assert_eq!(back.items.len(), 10);
    }
}
