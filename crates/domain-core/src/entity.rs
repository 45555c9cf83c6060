//! 实体基础 trait

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// 实体 trait
///
/// 每条持久化记录都有一个创建后不再变化的标识以及软删除标记。
/// 实体通过 serde 映射为存储行，导航属性不参与映射。
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// 存储表名
    const TABLE: &'static str;

    fn id(&self) -> Uuid;

    fn is_deleted(&self) -> bool;
}

/// 将实体映射为存储行
pub fn to_row<T: Entity>(entity: &T) -> shop_errors::AppResult<serde_json::Value> {
    Ok(serde_json::to_value(entity)?)
}

/// 将存储行映射为实体
pub fn from_row<T: Entity>(row: serde_json::Value) -> shop_errors::AppResult<T> {
    Ok(serde_json::from_value(row)?)
}
