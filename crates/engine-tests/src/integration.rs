#[cfg(test)]
mod tests {
    use crate::utils::{SHOP_CONN, ShopDb, column, ints, texts};
    use engine_core::error::EngineError;
    use model::{
        core::{params::Params, value::Value},
        metadata::rows::ListFilter,
    };
    use planner::error::{CompileError, UnsafeReason};
    use tracing_test::traced_test;

    fn params(json: &str) -> Params {
        Params::from_json(json).expect("valid params")
    }

    // Scenario: metadata model with a join, a parameterized filter, ordering and a page window.
    // Expected Outcome: the configured literal filters, rows come back in column order.
    #[traced_test]
    #[tokio::test]
    async fn metadata_model_runs_with_literal_filter() {
        let db = ShopDb::create().await;
        let engine = db.engine();

        let rows = engine.run("paid-orders", &Params::new()).await.unwrap();
        assert_eq!(column(&rows, "id"), ints(&[5, 1]));
        assert_eq!(column(&rows, "customer"), texts(&["Cid", "Ann"]));
        assert_eq!(
            rows[0].columns().collect::<Vec<_>>(),
            vec!["id", "customer", "amount"]
        );
        assert_eq!(rows[0].get_value("amount"), Value::Float(300.0));
    }

    // Scenario: caller params override the filter literal and the page window.
    #[traced_test]
    #[tokio::test]
    async fn params_override_filter_and_page() {
        let db = ShopDb::create().await;
        let engine = db.engine();

        let rows = engine
            .run("paid-orders", &params(r#"{"status":"new"}"#))
            .await
            .unwrap();
        assert_eq!(column(&rows, "id"), ints(&[2]));

        let rows = engine
            .run("paid-orders", &params(r#"{"page":2}"#))
            .await
            .unwrap();
        assert_eq!(column(&rows, "id"), ints(&[3]));

        let rows = engine
            .run("paid-orders", &params(r#"{"limit":5}"#))
            .await
            .unwrap();
        assert_eq!(column(&rows, "id"), ints(&[5, 1, 3]));
    }

    // Scenario: count and list see every matching row regardless of the page window.
    #[traced_test]
    #[tokio::test]
    async fn count_and_list_ignore_page_window() {
        let db = ShopDb::create().await;
        let engine = db.engine();

        assert_eq!(engine.count("paid-orders", &Params::new()).await.unwrap(), 3);

        let page = engine.list("paid-orders", &Params::new()).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(column(&page.rows, "id"), ints(&[5, 1]));

        let page = engine
            .list("paid-orders", &params(r#"{"status":"cancelled"}"#))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(column(&page.rows, "customer"), texts(&["Cid"]));
    }

    // Scenario: a model looked up by code with caller filters on a joined table and a numeric column.
    // Expected Outcome: filters narrow both the page and the total; stored filters still apply.
    #[traced_test]
    #[tokio::test]
    async fn list_by_code_with_caller_filters() {
        let db = ShopDb::create().await;
        let engine = db.engine();

        assert_eq!(
            engine.model_id_for_code("orders.paid").await.unwrap(),
            "paid-orders"
        );

        let berlin = [ListFilter::new("customers", "city", "=", "Berlin")];
        let page = engine
            .list_by_code("orders.paid", &Params::new(), &berlin)
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(column(&page.rows, "id"), ints(&[5, 1]));

        let big = [
            ListFilter::new("customers", "city", "=", "Berlin"),
            ListFilter::new("orders", "amount", ">=", "200"),
        ];
        let page = engine
            .list_filtered("paid-orders", &params(r#"{"limit":10}"#), &big)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(column(&page.rows, "customer"), texts(&["Cid"]));

        let err = engine
            .list_by_code("orders.unknown", &Params::new(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ModelCodeNotFound(_)));
    }

    // Scenario: grouped aggregate with an IN filter, first from the literal list then from a list param.
    #[traced_test]
    #[tokio::test]
    async fn grouped_model_with_in_filter() {
        let db = ShopDb::create().await;
        let engine = db.engine();

        let rows = engine.run("orders-by-city", &Params::new()).await.unwrap();
        assert_eq!(column(&rows, "city"), texts(&["Berlin", "Paris"]));
        assert_eq!(column(&rows, "orders"), ints(&[3, 1]));

        let rows = engine
            .run("orders-by-city", &params(r#"{"statuses":["paid"]}"#))
            .await
            .unwrap();
        assert_eq!(column(&rows, "orders"), ints(&[2, 1]));

        let compiled = engine
            .compile("orders-by-city", &Params::new())
            .await
            .unwrap();
        assert_eq!(
            compiled.sql,
            r#"SELECT "customers"."city", COUNT("orders"."id") AS "orders" FROM "orders" INNER JOIN "customers" ON "orders"."customer_id" = "customers"."id" WHERE "orders"."status" IN (?, ?) GROUP BY "customers"."city" ORDER BY "customers"."city" ASC"#
        );
        assert_eq!(compiled.args, texts(&["paid", "new"]));
    }

    // Scenario: BETWEEN takes a range param, LIKE wraps its value in wildcards.
    #[traced_test]
    #[tokio::test]
    async fn range_and_like_params() {
        let db = ShopDb::create().await;
        let engine = db.engine();

        let rows = engine
            .run("orders-in-range", &params(r#"{"amount":{"min":50,"max":150}}"#))
            .await
            .unwrap();
        assert_eq!(column(&rows, "id"), ints(&[1, 3]));

        let rows = engine
            .run("orders-in-range", &params(r#"{"month":"2024-02"}"#))
            .await
            .unwrap();
        assert_eq!(column(&rows, "id"), ints(&[2, 3]));

        let rows = engine
            .run(
                "orders-in-range",
                &params(r#"{"amount":{"max":100},"month":"-03-"}"#),
            )
            .await
            .unwrap();
        assert_eq!(column(&rows, "id"), ints(&[4]));
    }

    // Scenario: raw SQL with named placeholders keeps the parameter's scalar type.
    #[traced_test]
    #[tokio::test]
    async fn raw_sql_binds_named_placeholders() {
        let db = ShopDb::create().await;
        let engine = db.engine();
        let p = params(r#"{"city":"Berlin","min":100}"#);

        let compiled = engine.compile("berlin-spend", &p).await.unwrap();
        assert_eq!(
            compiled.args,
            vec![Value::from("Berlin"), Value::Int(100)]
        );

        let rows = engine.run("berlin-spend", &p).await.unwrap();
        assert_eq!(column(&rows, "name"), texts(&["Ann", "Cid"]));
        assert_eq!(engine.count("berlin-spend", &p).await.unwrap(), 2);
    }

    // Scenario: a placeholder inside a string literal is bound through concatenation.
    #[traced_test]
    #[tokio::test]
    async fn raw_sql_placeholder_inside_literal() {
        let db = ShopDb::create().await;
        let engine = db.engine();

        let compiled = engine
            .compile("name-search", &params(r#"{"fragment":"o"}"#))
            .await
            .unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT name FROM customers WHERE name LIKE ('%' || ? || '%') ORDER BY id"
        );

        let rows = engine
            .run("name-search", &params(r#"{"fragment":"o"}"#))
            .await
            .unwrap();
        assert_eq!(column(&rows, "name"), texts(&["Bob"]));

        let rows = engine.run("name-search", &Params::new()).await.unwrap();
        assert!(rows.is_empty());
    }

    // Scenario: stored SQL with a second statement never reaches the database.
    #[traced_test]
    #[tokio::test]
    async fn unsafe_raw_sql_is_rejected() {
        let db = ShopDb::create().await;
        let engine = db.engine();

        let err = engine.run("sneaky", &Params::new()).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Compile(CompileError::UnsafeSql {
                reason: UnsafeReason::MultipleStatements
            })
        ));
        assert_eq!(engine.count("paid-orders", &Params::new()).await.unwrap(), 3);
    }

    // Scenario: configuration problems surface as typed errors.
    #[traced_test]
    #[tokio::test]
    async fn configuration_errors() {
        let db = ShopDb::create().await;
        let engine = db.engine();

        let err = engine.run("cyclic", &Params::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::Compile(CompileError::JoinCycle(_))));

        let err = engine.run("no-such-model", &Params::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::ModelNotFound(_)));

        let err = engine.run("detached", &Params::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::ConnectionNotFound(id) if id == "warehouse"));
    }

    // Scenario: the registry reuses one handle and reopens after invalidation.
    #[traced_test]
    #[tokio::test]
    async fn registry_reuses_and_reopens_handles() {
        let db = ShopDb::create().await;
        let engine = db.engine();

        let params_a = Params::new();
        let params_b = Params::new();
        let (a, b) = futures::join!(
            engine.run("paid-orders", &params_a),
            engine.count("orders-by-city", &params_b),
        );
        assert_eq!(a.unwrap().len(), 2);
        assert_eq!(b.unwrap(), 2);
        assert_eq!(engine.metrics().connections_opened, 1);

        engine.registry().invalidate(SHOP_CONN).await;
        engine.run("paid-orders", &Params::new()).await.unwrap();
        assert_eq!(engine.metrics().connections_opened, 2);

        engine.shutdown().await;
        assert!(engine.registry().cached_ids().await.is_empty());
    }

    // Scenario: execute and execute_count run caller SQL directly.
    #[traced_test]
    #[tokio::test]
    async fn direct_execute() {
        let db = ShopDb::create().await;
        let engine = db.engine();

        let rows = engine
            .execute(
                SHOP_CONN,
                "SELECT name FROM customers WHERE city = ? ORDER BY name",
                &[Value::from("Berlin")],
            )
            .await
            .unwrap();
        assert_eq!(column(&rows, "name"), texts(&["Ann", "Cid"]));

        let total = engine
            .execute_count(SHOP_CONN, "SELECT * FROM orders WHERE amount > ?", &[Value::Int(50)])
            .await
            .unwrap();
        assert_eq!(total, 3);

        let err = engine
            .execute(SHOP_CONN, "SELECT * FROM missing_table", &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing_table"));
    }
}

#[cfg(test)]
mod server_tests {
    use crate::{mysql_url, pg_url};
    use connectors::sql::base::adapter::SqlAdapter;
    use engine_core::{
        config::EngineConfig,
        engine::QueryEngine,
        registry::DriverFactory,
        repository::catalog::Catalog,
    };
    use model::{
        core::params::Params,
        execution::connection::ConnectionConfig,
        metadata::{
            model::{Model, ModelData},
            rows::{ColumnRef, Condition, Field, Limit, Table},
        },
    };
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn engine(conn: ConnectionConfig) -> QueryEngine {
        let mut data = ModelData::new(Model {
            id: "mq-users".into(),
            conn_id: conn.id.clone(),
            ..Default::default()
        });
        data.tables = vec![Table {
            table: "mq_users".into(),
            is_main: true,
            ..Default::default()
        }];
        data.fields = vec![Field {
            source: ColumnRef::new("mq_users", "id"),
            ..Default::default()
        }];
        data.wheres = vec![
            Condition::new(ColumnRef::new("mq_users", "id"), "IN", "1,2,3").with_param("ids"),
            Condition::new(ColumnRef::new("mq_users", "status"), "=", "active"),
        ];
        data.limit = Some(Limit { page: 1, limit: 10 });

        let catalog = Arc::new(Catalog::default().with_connection(conn).with_model(data));
        QueryEngine::new(
            Arc::clone(&catalog) as _,
            catalog,
            Arc::new(DriverFactory),
            &EngineConfig::default(),
        )
    }

    async fn seed(engine: &QueryEngine, conn_id: &str, statements: &[&str]) {
        let handle = engine.registry().resolve(conn_id).await.unwrap();
        for sql in statements {
            handle.query(sql, &[]).await.unwrap();
        }
    }

    // Scenario: string arguments are coerced to the integer parameter types PostgreSQL infers.
    #[ignore = "requires a PostgreSQL server at METAQUERY_TEST_PG_URL"]
    #[traced_test]
    #[tokio::test]
    async fn postgres_typed_parameters() {
        let engine = engine(ConnectionConfig {
            id: "pg".into(),
            kind: "postgres".into(),
            dsn: pg_url(),
            ..Default::default()
        });
        seed(
            &engine,
            "pg",
            &[
                "DROP TABLE IF EXISTS mq_users",
                "CREATE TABLE mq_users (id INT PRIMARY KEY, status TEXT NOT NULL)",
                "INSERT INTO mq_users VALUES (1, 'active'), (2, 'active'), (3, 'banned'), (4, 'active')",
            ],
        )
        .await;

        let rows = engine.run("mq-users", &Params::new()).await.unwrap();
        assert_eq!(rows.len(), 2);

        let p = Params::from_json(r#"{"ids":[2,3,4]}"#).unwrap();
        assert_eq!(engine.count("mq-users", &p).await.unwrap(), 2);
        engine.shutdown().await;
    }

    #[ignore = "requires a MySQL server at METAQUERY_TEST_MYSQL_URL"]
    #[traced_test]
    #[tokio::test]
    async fn mysql_model_round_trip() {
        let engine = engine(ConnectionConfig {
            id: "my".into(),
            kind: "mysql".into(),
            dsn: mysql_url(),
            ..Default::default()
        });
        seed(
            &engine,
            "my",
            &[
                "DROP TABLE IF EXISTS mq_users",
                "CREATE TABLE mq_users (id INT PRIMARY KEY, status VARCHAR(16) NOT NULL)",
                "INSERT INTO mq_users VALUES (1, 'active'), (2, 'banned'), (3, 'active')",
            ],
        )
        .await;

        let page = engine.list("mq-users", &Params::new()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.rows.len(), 2);
        engine.shutdown().await;
    }
}
