use connectors::sql::{base::adapter::SqlAdapter, sqlite::adapter::SqliteAdapter};
use engine_core::{config::EngineConfig, engine::QueryEngine, repository::catalog::Catalog};
use model::{core::value::Value, records::row::Record};
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;

pub const SHOP_CONN: &str = "shop";

const SHOP_DDL: [&str; 2] = [
    "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, city TEXT NOT NULL)",
    "CREATE TABLE orders (
        id INTEGER PRIMARY KEY,
        customer_id INTEGER NOT NULL REFERENCES customers (id),
        status TEXT NOT NULL,
        amount REAL NOT NULL,
        created_at TEXT NOT NULL
    )",
];

const SHOP_DATA: [&str; 2] = [
    "INSERT INTO customers (id, name, city) VALUES
        (1, 'Ann', 'Berlin'), (2, 'Bob', 'Paris'), (3, 'Cid', 'Berlin')",
    "INSERT INTO orders (id, customer_id, status, amount, created_at) VALUES
        (1, 1, 'paid', 120.0, '2024-01-05'),
        (2, 1, 'new', 15.5, '2024-02-01'),
        (3, 2, 'paid', 80.0, '2024-02-10'),
        (4, 3, 'cancelled', 42.0, '2024-03-01'),
        (5, 3, 'paid', 300.0, '2024-03-15')",
];

/// A seeded SQLite shop database that lives as long as the value.
pub struct ShopDb {
    _dir: TempDir,
    pub path: PathBuf,
}

impl ShopDb {
    pub async fn create() -> ShopDb {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("shop.db");
        let adapter = SqliteAdapter::connect(&path.display().to_string())
            .await
            .expect("open sqlite");
        for sql in SHOP_DDL.iter().chain(SHOP_DATA.iter()) {
            adapter.query(sql, &[]).await.expect("seed shop database");
        }
        ShopDb { _dir: dir, path }
    }

    /// Catalog with the shop connection and every test model.
    pub fn catalog(&self) -> Catalog {
        let text = json!({
            "connections": [
                {"id": SHOP_CONN, "kind": "sqlite", "database": self.path.display().to_string()}
            ],
            "models": [
                {
                    "id": "paid-orders",
                    "code": "orders.paid",
                    "conn_id": SHOP_CONN,
                    "tables": [{"table": "orders", "is_main": true}, {"table": "customers"}],
                    "fields": [
                        {"table": "orders", "column": "id"},
                        {"table": "customers", "column": "name", "show_title": "customer"},
                        {"table": "orders", "column": "amount"}
                    ],
                    "joins": [{
                        "id": "1", "parent_id": "0", "join_type": "left",
                        "table": "orders", "column": "customer_id",
                        "join_table": "customers", "join_column": "id"
                    }],
                    "wheres": [{
                        "table": "orders", "column": "status", "operator2": "=",
                        "value1": "paid", "param_key": "status"
                    }],
                    "orders": [{"table": "orders", "column": "amount", "direction": "desc"}],
                    "limit": {"page": 1, "limit": 2}
                },
                {
                    "id": "orders-by-city",
                    "conn_id": SHOP_CONN,
                    "tables": [{"table": "orders", "is_main": true}],
                    "fields": [
                        {"table": "customers", "column": "city"},
                        {"table": "orders", "column": "id", "agg_func": "COUNT", "show_title": "orders"}
                    ],
                    "joins": [{
                        "id": "1", "parent_id": "0", "join_type": "INNER",
                        "table": "orders", "column": "customer_id",
                        "join_table": "customers", "join_column": "id"
                    }],
                    "wheres": [{
                        "table": "orders", "column": "status", "operator2": "in",
                        "value1": "paid, new", "param_key": "statuses"
                    }],
                    "groups": [{"table": "customers", "column": "city"}],
                    "orders": [{"table": "customers", "column": "city"}]
                },
                {
                    "id": "orders-in-range",
                    "conn_id": SHOP_CONN,
                    "tables": [{"table": "orders", "is_main": true}],
                    "fields": [{"table": "orders", "column": "id"}],
                    "wheres": [
                        {
                            "table": "orders", "column": "amount", "operator2": "between",
                            "value1": "0", "value2": "1000", "param_key": "amount"
                        },
                        {
                            "operator1": "and", "table": "orders", "column": "created_at",
                            "operator2": "like", "value1": "2024", "param_key": "month"
                        }
                    ],
                    "orders": [{"table": "orders", "column": "id"}]
                },
                {
                    "id": "berlin-spend",
                    "kind": 1,
                    "conn_id": SHOP_CONN,
                    "sql": "SELECT c.name, o.amount FROM orders o JOIN customers c ON c.id = o.customer_id WHERE c.city = :city AND o.amount >= :min ORDER BY o.amount"
                },
                {
                    "id": "name-search",
                    "kind": 1,
                    "conn_id": SHOP_CONN,
                    "sql": "SELECT name FROM customers WHERE name LIKE '%:fragment%' ORDER BY id"
                },
                {
                    "id": "sneaky",
                    "kind": 1,
                    "conn_id": SHOP_CONN,
                    "sql": "SELECT 1; DROP TABLE orders"
                },
                {
                    "id": "cyclic",
                    "conn_id": SHOP_CONN,
                    "tables": [{"table": "orders", "is_main": true}],
                    "joins": [
                        {"id": "1", "parent_id": "2", "table": "orders", "join_table": "customers"},
                        {"id": "2", "parent_id": "1", "table": "customers", "join_table": "orders"}
                    ]
                },
                {
                    "id": "detached",
                    "conn_id": "warehouse",
                    "tables": [{"table": "orders", "is_main": true}]
                }
            ]
        })
        .to_string();
        Catalog::from_json(&text).expect("valid test catalog")
    }

    pub fn engine(&self) -> QueryEngine {
        QueryEngine::from_catalog(self.catalog(), &EngineConfig::default())
    }
}

pub fn column(rows: &[Record], name: &str) -> Vec<Value> {
    rows.iter().map(|row| row.get_value(name)).collect()
}

pub fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|v| Value::Int(*v)).collect()
}

pub fn texts(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}
