//! 方法结果缓存：对 `name()`、`fields()` 这类纯函数的结果做记忆化。
//!
//! 缓存键由数据源身份（名称、schema、方言与引号）、方法名和参数的 JSON 序列化
//! 经过哈希函数得到，切换数据源或 schema 时自然不会命中旧结果。

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::Serialize;

use crate::flavor::Flavor;

/// 缓存键哈希函数。
pub type CacheHasher = Arc<dyn Fn(&str) -> String + Send + Sync>;
/// 写入过滤器：返回 `false` 时结果不进入缓存。
pub type CacheFilter = Arc<dyn Fn(&str, &str, &CachedValue) -> bool + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    Text(String),
    List(Vec<String>),
}

impl CachedValue {
    pub fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::List(items) => items.join(", "),
        }
    }

    pub fn into_list(self) -> Vec<String> {
        match self {
            Self::Text(s) => vec![s],
            Self::List(items) => items,
        }
    }
}

/// 参与缓存键计算的数据源身份。
#[derive(Debug, Clone, Serialize)]
pub struct CacheIdentity<'a> {
    pub source: &'a str,
    pub schema: Option<&'a str>,
    pub flavor: Flavor,
    pub quotes: (char, char),
}

fn default_hasher() -> CacheHasher {
    Arc::new(|input: &str| {
        let mut h = DefaultHasher::new();
        input.hash(&mut h);
        format!("{:016x}", h.finish())
    })
}

#[derive(Clone)]
pub struct MethodCache {
    enabled: bool,
    entries: HashMap<String, HashMap<String, CachedValue>>,
    hasher: CacheHasher,
    filter: Option<CacheFilter>,
}

impl Default for MethodCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MethodCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodCache")
            .field("enabled", &self.enabled)
            .field("len", &self.len())
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

impl MethodCache {
    pub fn new() -> Self {
        Self {
            enabled: true,
            entries: HashMap::new(),
            hasher: default_hasher(),
            filter: None,
        }
    }

    /// 替换缓存键哈希函数，已有条目会被清空。
    pub fn with_hasher(mut self, hasher: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.hasher = Arc::new(hasher);
        self.entries.clear();
        self
    }

    pub fn with_filter(
        mut self,
        filter: impl Fn(&str, &str, &CachedValue) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// 计算缓存键；参数无法序列化时返回 `None`（此次调用不缓存）。
    pub fn key<A: Serialize + ?Sized>(
        &self,
        identity: &CacheIdentity<'_>,
        method: &str,
        args: &A,
    ) -> Option<String> {
        let payload = serde_json::to_string(&(identity, method, args)).ok()?;
        Some((self.hasher)(&payload))
    }

    pub fn get(&self, method: &str, key: &str) -> Option<&CachedValue> {
        if !self.enabled {
            return None;
        }
        self.entries.get(method)?.get(key)
    }

    /// 写入结果，返回是否真正写入（被禁用或被过滤器拒绝时为 `false`）。
    pub fn put(&mut self, method: &str, key: String, value: CachedValue) -> bool {
        if !self.enabled {
            return false;
        }
        if let Some(filter) = &self.filter
            && !filter(method, &key, &value)
        {
            return false;
        }
        self.entries
            .entry(method.to_string())
            .or_default()
            .insert(key, value);
        true
    }

    pub fn flush(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
