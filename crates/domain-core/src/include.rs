//! 导航属性预加载
//!
//! 一个 [`Include`] 描述一条导航路径：从哪张关联表取数据、如何与父实体关联、
//! 如何写回父实体的导航字段。嵌套路径通过 `*_with` 构造函数声明，
//! 子级预加载在写回之前作用于关联实体。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use shop_errors::AppResult;
use uuid::Uuid;

use crate::{Entity, from_row};

/// 预加载所需的关联表数据，按表名索引
#[derive(Debug, Default, Clone)]
pub struct RelatedRows {
    tables: HashMap<&'static str, Vec<Value>>,
}

impl RelatedRows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: &'static str, rows: Vec<Value>) {
        self.tables.insert(table, rows);
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn rows(&self, table: &str) -> &[Value] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    fn decode<R: Entity>(&self) -> AppResult<Vec<R>> {
        self.rows(R::TABLE)
            .iter()
            .cloned()
            .map(from_row::<R>)
            .collect()
    }
}

type LoadFn<T> = dyn Fn(&mut [T], &RelatedRows) -> AppResult<()> + Send + Sync;

/// 导航路径预加载
pub struct Include<T> {
    path: String,
    tables: Vec<&'static str>,
    load: Arc<LoadFn<T>>,
}

impl<T> Clone for Include<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            tables: self.tables.clone(),
            load: Arc::clone(&self.load),
        }
    }
}

impl<T> fmt::Debug for Include<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Include")
            .field("path", &self.path)
            .field("tables", &self.tables)
            .finish()
    }
}

impl<T: 'static> Include<T> {
    /// 多对一导航（如 Product → Category）
    pub fn reference<R, K, A>(path: &str, foreign_key: K, assign: A) -> Self
    where
        R: Entity,
        K: Fn(&T) -> Uuid + Send + Sync + 'static,
        A: Fn(&mut T, Option<R>) + Send + Sync + 'static,
    {
        Self::reference_with(path, foreign_key, assign, Vec::new())
    }

    /// 多对一导航，并对关联实体继续预加载
    pub fn reference_with<R, K, A>(
        path: &str,
        foreign_key: K,
        assign: A,
        nested: Vec<Include<R>>,
    ) -> Self
    where
        R: Entity,
        K: Fn(&T) -> Uuid + Send + Sync + 'static,
        A: Fn(&mut T, Option<R>) + Send + Sync + 'static,
    {
        let tables = collect_tables(R::TABLE, &nested);
        let path = nested_path(path, &nested);

        Self {
            path,
            tables,
            load: Arc::new(move |parents: &mut [T], related: &RelatedRows| {
                let mut targets = related.decode::<R>()?;
                for include in &nested {
                    include.load(&mut targets, related)?;
                }
                let by_id: HashMap<Uuid, R> = targets.into_iter().map(|r| (r.id(), r)).collect();

                for parent in parents.iter_mut() {
                    let target = by_id.get(&foreign_key(parent)).cloned();
                    assign(parent, target);
                }
                Ok(())
            }),
        }
    }
}

impl<T: Entity> Include<T> {
    /// 一对多导航（如 Order → OrderItems），`foreign_key` 取子实体指向父实体的外键
    pub fn collection<R, K, A>(path: &str, foreign_key: K, assign: A) -> Self
    where
        R: Entity,
        K: Fn(&R) -> Uuid + Send + Sync + 'static,
        A: Fn(&mut T, Vec<R>) + Send + Sync + 'static,
    {
        Self::collection_with(path, foreign_key, assign, Vec::new())
    }

    /// 一对多导航，并对子实体继续预加载
    pub fn collection_with<R, K, A>(
        path: &str,
        foreign_key: K,
        assign: A,
        nested: Vec<Include<R>>,
    ) -> Self
    where
        R: Entity,
        K: Fn(&R) -> Uuid + Send + Sync + 'static,
        A: Fn(&mut T, Vec<R>) + Send + Sync + 'static,
    {
        let tables = collect_tables(R::TABLE, &nested);
        let path = nested_path(path, &nested);

        Self {
            path,
            tables,
            load: Arc::new(move |parents: &mut [T], related: &RelatedRows| {
                let mut children = related.decode::<R>()?;
                for include in &nested {
                    include.load(&mut children, related)?;
                }
                let mut grouped: HashMap<Uuid, Vec<R>> = HashMap::new();
                for child in children {
                    grouped.entry(foreign_key(&child)).or_default().push(child);
                }

                for parent in parents.iter_mut() {
                    let items = grouped.get(&parent.id()).cloned().unwrap_or_default();
                    assign(parent, items);
                }
                Ok(())
            }),
        }
    }
}

impl<T> Include<T> {
    /// 导航路径（嵌套路径以 `.` 连接）
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 本路径及其嵌套路径需要读取的关联表
    pub fn tables(&self) -> &[&'static str] {
        &self.tables
    }

    /// 对一批父实体执行预加载
    pub fn load(&self, parents: &mut [T], related: &RelatedRows) -> AppResult<()> {
        (self.load)(parents, related)
    }
}

fn collect_tables<R>(own: &'static str, nested: &[Include<R>]) -> Vec<&'static str> {
    let mut tables = vec![own];
    for table in nested.iter().flat_map(|i| i.tables().iter().copied()) {
        if !tables.contains(&table) {
            tables.push(table);
        }
    }
    tables
}

fn nested_path<R>(path: &str, nested: &[Include<R>]) -> String {
    if nested.is_empty() {
        return path.to_string();
    }
    let children: Vec<&str> = nested.iter().map(Include::path).collect();
    format!("{}.{}", path, children.join("|"))
}
