//! 工具服务侧：工具 trait、注册表、执行器与员工数据库工具

pub mod db;
pub mod employees;
pub mod executor;
pub mod registry;
pub mod schema;

pub use db::Database;
pub use employees::{ExecuteSqlTool, ListEmployeesTool, SalaryForTool};
pub use executor::ToolExecutor;
pub use registry::{Tool, ToolRegistry};

use crate::config::ToolsSection;

/// 注册 sql: 命名空间下的全部工具（目录顺序即注册顺序）
pub fn build_registry(db: Database, cfg: &ToolsSection) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(ListEmployeesTool::new(db.clone(), cfg.row_limit));
    registry.register(SalaryForTool::new(db.clone()));
    registry.register(ExecuteSqlTool::new(db));
    registry
}

/// 由配置构建带超时的执行器
pub fn build_executor(db: Database, cfg: &ToolsSection) -> ToolExecutor {
    ToolExecutor::new(build_registry(db, cfg), cfg.tool_timeout_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names() {
        let db = Database::open_in_memory().unwrap();
        let executor = build_executor(db, &ToolsSection::default());
        assert_eq!(
            executor.tool_names(),
            vec!["sql:listEmployees", "sql:salaryFor", "sql:executeSQL"]
        );
        let descriptors = executor.descriptors();
        assert_eq!(descriptors[1].input_schema["required"][0], "name");
        assert_eq!(descriptors[2].input_schema["required"][0], "query");
    }
}
