//! 员工数据库工具（sql: 命名空间）
//!
//! - sql:listEmployees：员工列表，每人附最新一条薪资
//! - sql:salaryFor：按姓名模糊查找一名员工的最新薪资
//! - sql:executeSQL：执行单条只读 SQL；SQL 本身的错误以文本返回，便于模型自行修正

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::ChatError;
use crate::tools::schema::{input_schema, parse_args};
use crate::tools::{Database, Tool};

/// executeSQL 单次最多返回的行数
pub const MAX_QUERY_ROWS: usize = 1000;

/// 员工 + 最新薪资；薪资缺失时为 0 / 0 / EUR
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeSalary {
    pub emp_no: i64,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub salary: i64,
    pub bonus: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
}

impl EmployeeSalary {
    /// 列顺序：emp_no, first_name, last_name, salary, bonus, currency, from_date, to_date
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let first_name: String = row.get(1)?;
        let last_name: String = row.get(2)?;
        Ok(Self {
            emp_no: row.get(0)?,
            full_name: format!("{} {}", first_name, last_name),
            first_name,
            last_name,
            salary: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
            bonus: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
            currency: row
                .get::<_, Option<String>>(5)?
                .unwrap_or_else(|| "EUR".to_string()),
            from_date: row.get(6)?,
            to_date: row.get(7)?,
        })
    }

    /// 列表视图不带薪资期间
    fn without_period(mut self) -> Self {
        self.from_date = None;
        self.to_date = None;
        self
    }
}

const EMPLOYEE_WITH_LATEST_SALARY: &str = "
SELECT e.emp_no, e.first_name, e.last_name, s.salary, s.bonus, s.currency, s.from_date, s.to_date
FROM employees e
LEFT JOIN salaries s ON s.rowid = (
    SELECT rowid FROM salaries WHERE emp_no = e.emp_no ORDER BY to_date DESC LIMIT 1
)";

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("serialization failed: {}", e))
}

/// 列出员工及其最新薪资
pub struct ListEmployeesTool {
    db: Database,
    row_limit: usize,
}

impl ListEmployeesTool {
    pub fn new(db: Database, row_limit: usize) -> Self {
        Self { db, row_limit }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListEmployeesArgs {}

#[async_trait]
impl Tool for ListEmployeesTool {
    fn name(&self) -> &str {
        "sql:listEmployees"
    }

    fn description(&self) -> &str {
        "List employees together with their most recent salary, bonus and currency."
    }

    fn parameters_schema(&self) -> Value {
        input_schema::<ListEmployeesArgs>()
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let _: ListEmployeesArgs = parse_args(args)?;
        let limit = self.row_limit as i64;
        let employees = self
            .db
            .with_conn(move |conn| {
                let sql = format!("{} ORDER BY e.emp_no LIMIT ?1", EMPLOYEE_WITH_LATEST_SALARY);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![limit], |row| {
                        EmployeeSalary::from_row(row).map(EmployeeSalary::without_period)
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(|e| e.to_string())?;

        tracing::debug!(count = employees.len(), "listEmployees");
        to_pretty_json(&employees)
    }
}

/// 按姓名查询薪资
pub struct SalaryForTool {
    db: Database,
}

impl SalaryForTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SalaryForArgs {
    /// Full employee name, e.g. "Janez Novak"
    pub name: String,
}

/// 首个词为名，其余为姓（可为空）
fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

#[async_trait]
impl Tool for SalaryForTool {
    fn name(&self) -> &str {
        "sql:salaryFor"
    }

    fn description(&self) -> &str {
        "Look up the most recent salary of one employee by name."
    }

    fn parameters_schema(&self) -> Value {
        input_schema::<SalaryForArgs>()
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let args: SalaryForArgs = parse_args(args)?;
        if args.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        let (first, last) = split_name(&args.name);

        let found = self
            .db
            .with_conn(move |conn| {
                let sql = format!(
                    "{} WHERE e.first_name LIKE ?1 AND e.last_name LIKE ?2 ORDER BY e.emp_no LIMIT 1",
                    EMPLOYEE_WITH_LATEST_SALARY
                );
                let employee = conn
                    .query_row(
                        &sql,
                        params![format!("%{}%", first), format!("%{}%", last)],
                        EmployeeSalary::from_row,
                    )
                    .optional()?;
                Ok(employee)
            })
            .await
            .map_err(|e| e.to_string())?;

        match found {
            Some(employee) => to_pretty_json(&employee),
            None => Ok(format!("Employee \"{}\" was not found in the database.", args.name)),
        }
    }
}

/// 执行任意单条只读 SQL
pub struct ExecuteSqlTool {
    db: Database,
}

impl ExecuteSqlTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecuteSqlArgs {
    /// A single read-only SQL statement (SQLite dialect)
    pub query: String,
}

enum QueryOutcome {
    Rows { rows: Vec<Value>, truncated: bool },
    SqlError(String),
    NotReadOnly,
}

/// 分号之后仍有非空白、非注释内容即视为多条语句（忽略引号内与注释内的分号）
fn has_trailing_statement(sql: &str) -> bool {
    let chars: Vec<char> = sql.chars().collect();
    let mut i = 0;
    let mut after_semicolon = false;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' | '`' => {
                if after_semicolon {
                    return true;
                }
                i += 1;
                while i < chars.len() {
                    if chars[i] == c {
                        // 连续两个引号为转义
                        if chars.get(i + 1) == Some(&c) {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 1;
            }
            ';' => after_semicolon = true,
            c if c.is_whitespace() => {}
            _ => {
                if after_semicolon {
                    return true;
                }
            }
        }
        i += 1;
    }
    false
}

/// 可放行的首关键字；ATTACH、BEGIN、PRAGMA 等虽被 SQLite 视为只读，但会改动连接状态
const QUERY_KEYWORDS: &[&str] = &["SELECT", "WITH", "VALUES", "EXPLAIN"];

/// 跳过空白与注释后的第一个关键字（大写）
fn leading_keyword(sql: &str) -> String {
    let mut rest = sql;
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.find('\n').map_or("", |i| &after[i..]);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.find("*/").map_or("", |i| &after[i + 2..]);
        } else {
            break;
        }
    }
    rest.chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase()
}

fn is_query(sql: &str) -> bool {
    QUERY_KEYWORDS.contains(&leading_keyword(sql).as_str())
}

fn value_ref_to_json(value: rusqlite::types::ValueRef<'_>) -> Value {
    use rusqlite::types::ValueRef;
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<blob {} bytes>", bytes.len())),
    }
}

fn run_read_only(conn: &Connection, query: &str) -> QueryOutcome {
    let mut stmt = match conn.prepare(query) {
        Ok(stmt) => stmt,
        Err(e) => return QueryOutcome::SqlError(e.to_string()),
    };
    if !stmt.readonly() {
        return QueryOutcome::NotReadOnly;
    }
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = match stmt.query([]) {
        Ok(rows) => rows,
        Err(e) => return QueryOutcome::SqlError(e.to_string()),
    };

    let mut out = Vec::new();
    loop {
        match rows.next() {
            Ok(Some(row)) => {
                if out.len() >= MAX_QUERY_ROWS {
                    return QueryOutcome::Rows { rows: out, truncated: true };
                }
                let mut obj = Map::with_capacity(columns.len());
                for (idx, name) in columns.iter().enumerate() {
                    match row.get_ref(idx) {
                        Ok(v) => {
                            obj.insert(name.clone(), value_ref_to_json(v));
                        }
                        Err(e) => return QueryOutcome::SqlError(e.to_string()),
                    }
                }
                out.push(Value::Object(obj));
            }
            Ok(None) => break,
            Err(e) => return QueryOutcome::SqlError(e.to_string()),
        }
    }
    QueryOutcome::Rows { rows: out, truncated: false }
}

#[async_trait]
impl Tool for ExecuteSqlTool {
    fn name(&self) -> &str {
        "sql:executeSQL"
    }

    fn description(&self) -> &str {
        "Execute one read-only SQL query against the employees database and return the rows as JSON. \
         Tables: employees(emp_no, first_name, last_name, birth_date, gender, hire_date), \
         salaries(emp_no, salary, bonus, currency, from_date, to_date)."
    }

    fn parameters_schema(&self) -> Value {
        input_schema::<ExecuteSqlArgs>()
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let args: ExecuteSqlArgs = parse_args(args)?;
        let query = args.query.trim().to_string();
        if query.is_empty() {
            return Err("query must not be empty".to_string());
        }
        if has_trailing_statement(&query) {
            return Err("only a single SQL statement is allowed".to_string());
        }
        if !is_query(&query) {
            return Err("only read-only statements are allowed (SELECT / WITH / VALUES / EXPLAIN)".to_string());
        }

        let outcome = self
            .db
            .with_conn(move |conn| Ok::<_, ChatError>(run_read_only(conn, &query)))
            .await
            .map_err(|e| e.to_string())?;

        match outcome {
            QueryOutcome::Rows { rows, truncated } => {
                if truncated {
                    tracing::warn!(limit = MAX_QUERY_ROWS, "executeSQL result truncated");
                }
                to_pretty_json(&rows)
            }
            QueryOutcome::SqlError(message) => {
                tracing::warn!(error = %message, "executeSQL failed");
                Ok(format!("SQL error: {}", message))
            }
            QueryOutcome::NotReadOnly => Err("only read-only statements are allowed".to_string()),
        }
    }
}
