//! 数据源：方言、配置、转义器与方法缓存的持有者。
//!
//! SQL 生成相关的方法分散在各模块的 `impl DboSource` 中（`quote`、`formatter`、
//! `conditions`、`fields`、`statement`、`association`、`migration`）。
//!
//! `DboSource` 内部用 `RefCell` 保存缓存，不是 `Sync`；多线程共享时由调用方加锁，
//! 或每个线程各持有一个实例。

use std::cell::RefCell;

use serde::Serialize;

use crate::flavor::{Flavor, default_flavor};
use crate::formatter::{Escaper, FlavorEscaper};
use crate::method_cache::{CacheIdentity, CachedValue, MethodCache};

/// 数据源配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceConfig {
    /// 数据源名称，参与缓存键计算。
    pub name: String,
    pub flavor: Flavor,
    /// 数据库 schema（如 PostgreSQL 的 `public`），用于完整表名。
    pub schema_name: Option<String>,
    /// 表名前缀。
    pub prefix: String,
    pub cache_methods: bool,
    /// 虚拟字段别名中模型别名与字段名之间的分隔符。
    pub virtual_field_separator: String,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            flavor: default_flavor(),
            schema_name: None,
            prefix: String::new(),
            cache_methods: true,
            virtual_field_separator: "__".to_string(),
        }
    }
}

impl DataSourceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    pub fn schema_name(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn cache_methods(mut self, enabled: bool) -> Self {
        self.cache_methods = enabled;
        self
    }

    pub fn virtual_field_separator(mut self, sep: impl Into<String>) -> Self {
        self.virtual_field_separator = sep.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct DboSource {
    config: DataSourceConfig,
    escaper: Option<Box<dyn Escaper>>,
    cache: RefCell<MethodCache>,
}

impl Default for DboSource {
    fn default() -> Self {
        Self::new(DataSourceConfig::default())
    }
}

impl DboSource {
    pub fn new(config: DataSourceConfig) -> Self {
        let cache = MethodCache::new().enabled(config.cache_methods);
        Self {
            config,
            escaper: None,
            cache: RefCell::new(cache),
        }
    }

    /// 使用指定方言与默认配置创建数据源。
    pub fn with_flavor(flavor: Flavor) -> Self {
        Self::new(DataSourceConfig::default().flavor(flavor))
    }

    /// 使用执行层提供的转义函数代替方言默认转义。
    pub fn with_escaper(mut self, escaper: impl Escaper + 'static) -> Self {
        self.escaper = Some(Box::new(escaper));
        self
    }

    /// 替换方法缓存（自定义哈希或过滤器），启用状态沿用配置。
    pub fn with_method_cache(self, cache: MethodCache) -> Self {
        let enabled = self.config.cache_methods;
        self.cache.replace(cache.enabled(enabled));
        self
    }

    pub fn config(&self) -> &DataSourceConfig {
        &self.config
    }

    pub fn flavor(&self) -> Flavor {
        self.config.flavor
    }

    /// 切换方言，返回旧值。
    pub fn set_flavor(&mut self, flavor: Flavor) -> Flavor {
        std::mem::replace(&mut self.config.flavor, flavor)
    }

    /// 切换 schema，返回旧值。
    pub fn set_schema_name(&mut self, schema: Option<String>) -> Option<String> {
        std::mem::replace(&mut self.config.schema_name, schema)
    }

    pub fn set_cache_methods(&mut self, enabled: bool) {
        self.config.cache_methods = enabled;
        self.cache.borrow_mut().set_enabled(enabled);
    }

    pub fn flush_method_cache(&self) {
        self.cache.borrow_mut().flush();
    }

    pub fn method_cache_len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub(crate) fn escape(&self, raw: &str) -> String {
        match &self.escaper {
            Some(escaper) => escaper.escape(raw),
            None => FlavorEscaper::new(self.flavor()).escape(raw),
        }
    }

    pub(crate) fn separator(&self) -> &str {
        &self.config.virtual_field_separator
    }

    fn identity(&self) -> CacheIdentity<'_> {
        let flavor = self.flavor();
        CacheIdentity {
            source: &self.config.name,
            schema: self.config.schema_name.as_deref(),
            flavor,
            quotes: (flavor.start_quote(), flavor.end_quote()),
        }
    }

    /// 先查缓存，未命中时计算并写入。计算过程中不持有缓存借用，允许递归调用。
    pub(crate) fn cache_method<A: Serialize + ?Sized>(
        &self,
        method: &'static str,
        args: &A,
        compute: impl FnOnce() -> CachedValue,
    ) -> CachedValue {
        let key = {
            let cache = self.cache.borrow();
            if !cache.is_enabled() {
                None
            } else {
                cache.key(&self.identity(), method, args)
            }
        };

        let Some(key) = key else {
            return compute();
        };

        if let Some(hit) = self.cache.borrow().get(method, &key).cloned() {
            tracing::trace!(method, key = %key, "method cache hit");
            return hit;
        }

        let value = compute();
        let stored = self.cache.borrow_mut().put(method, key, value.clone());
        tracing::trace!(method, stored, "method cache miss");
        value
    }
}
