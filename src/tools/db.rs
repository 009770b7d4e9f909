//! 员工数据库句柄
//!
//! Database 显式持有一个 rusqlite::Connection（Mutex 保护），由各工具共享；
//! 所有访问通过 with_conn 在阻塞线程池中执行，不阻塞 tokio 工作线程。

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::limits::Limit;
use rusqlite::{params, Connection};

use crate::core::ChatError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
    emp_no      INTEGER PRIMARY KEY,
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL,
    birth_date  TEXT,
    gender      TEXT,
    hire_date   TEXT
);

CREATE TABLE IF NOT EXISTS salaries (
    emp_no      INTEGER NOT NULL,
    salary      INTEGER NOT NULL,
    bonus       INTEGER NOT NULL DEFAULT 0,
    currency    TEXT NOT NULL DEFAULT 'EUR',
    from_date   TEXT NOT NULL,
    to_date     TEXT NOT NULL,
    PRIMARY KEY (emp_no, from_date),
    FOREIGN KEY (emp_no) REFERENCES employees(emp_no)
);

CREATE INDEX IF NOT EXISTS idx_salaries_emp_to ON salaries(emp_no, to_date);
"#;

/// (emp_no, first_name, last_name, birth_date, gender, hire_date)
const DEMO_EMPLOYEES: &[(i64, &str, &str, &str, &str, &str)] = &[
    (10001, "Janez", "Novak", "1985-03-12", "M", "2015-06-01"),
    (10002, "Maja", "Kovač", "1990-11-02", "F", "2018-01-15"),
    (10003, "Luka", "Horvat", "1979-07-23", "M", "2010-09-01"),
    (10004, "Ana", "Krajnc", "1993-02-08", "F", "2021-04-12"),
    (10005, "Marko", "Zupan", "1988-05-30", "M", "2016-10-03"),
];

/// (emp_no, salary, bonus, currency, from_date, to_date)
const DEMO_SALARIES: &[(i64, i64, i64, &str, &str, &str)] = &[
    (10001, 3200, 300, "EUR", "2015-06-01", "2019-12-31"),
    (10001, 4100, 500, "EUR", "2020-01-01", "9999-01-01"),
    (10002, 3600, 250, "EUR", "2018-01-15", "9999-01-01"),
    (10003, 5200, 800, "EUR", "2010-09-01", "2017-12-31"),
    (10003, 6100, 1000, "EUR", "2018-01-01", "9999-01-01"),
    (10004, 2900, 0, "EUR", "2021-04-12", "9999-01-01"),
];

/// 共享的数据库句柄；Clone 只复制 Arc
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ChatError> {
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, ChatError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        // 禁止 ATTACH：连接只面向单个库文件
        let _ = conn.set_limit(Limit::SQLITE_LIMIT_ATTACHED, 0);
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// 在阻塞线程池中以独占方式使用连接
    pub async fn with_conn<T, F>(&self, f: F) -> Result<T, ChatError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, ChatError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| ChatError::Database("connection mutex poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| ChatError::Database(format!("blocking task failed: {}", e)))?
    }

    pub async fn init_schema(&self) -> Result<(), ChatError> {
        self.with_conn(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
    }

    /// 建表并在 employees 为空时写入演示数据；返回写入的员工数（已有数据时为 0）
    pub async fn seed_demo(&self) -> Result<usize, ChatError> {
        self.init_schema().await?;
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM employees", [], |row| row.get(0))?;
            if count > 0 {
                return Ok(0);
            }
            let tx = conn.unchecked_transaction()?;
            for (emp_no, first, last, birth, gender, hired) in DEMO_EMPLOYEES {
                tx.execute(
                    "INSERT INTO employees (emp_no, first_name, last_name, birth_date, gender, hire_date)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![emp_no, first, last, birth, gender, hired],
                )?;
            }
            for (emp_no, salary, bonus, currency, from, to) in DEMO_SALARIES {
                tx.execute(
                    "INSERT INTO salaries (emp_no, salary, bonus, currency, from_date, to_date)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![emp_no, salary, bonus, currency, from, to],
                )?;
            }
            tx.commit()?;
            Ok(DEMO_EMPLOYEES.len())
        })
        .await
    }
}
