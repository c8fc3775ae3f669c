use model::{
    core::{params::Params, value::Value},
    metadata::{
        model::{ModelData, ModelKind},
        rows::ListFilter,
    },
};
use tracing::debug;

use crate::{
    error::CompileError,
    query::{
        clause::{
            ConditionClause,
            condition::merge_filters, FromClause, GroupByClause, JoinClause, LimitClause, OrderByClause,
            SelectClause,
        },
        dialect::Dialect,
        raw::RawStatement,
        renderer::{Render, Renderer},
    },
    safety,
};

/// A validated statement ready to execute. Placeholders are always `?`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub sql: String,
    pub args: Vec<Value>,
}

/// Turns assembled model metadata into a single parameterized statement.
pub struct StatementCompiler<'a> {
    dialect: &'a dyn Dialect,
    filters: &'a [ListFilter],
}

impl<'a> StatementCompiler<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            dialect,
            filters: &[],
        }
    }

    /// Caller filters ANDed onto the WHERE rows of metadata-built models.
    /// Raw-SQL models ignore them.
    pub fn with_filters(mut self, filters: &'a [ListFilter]) -> Self {
        self.filters = filters;
        self
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    pub fn compile(
        &self,
        data: &ModelData,
        params: &Params,
    ) -> Result<CompiledStatement, CompileError> {
        self.compile_with(data, params, true)
    }

    /// Same statement without its LIMIT clause, used to count every matching row.
    pub fn compile_unpaged(
        &self,
        data: &ModelData,
        params: &Params,
    ) -> Result<CompiledStatement, CompileError> {
        self.compile_with(data, params, false)
    }

    fn compile_with(
        &self,
        data: &ModelData,
        params: &Params,
        paged: bool,
    ) -> Result<CompiledStatement, CompileError> {
        let mut renderer = Renderer::new(self.dialect);
        match data.model.kind {
            ModelKind::RawSql => {
                let content = data
                    .sql
                    .as_ref()
                    .map(|s| s.content.as_str())
                    .filter(|c| !c.trim().is_empty())
                    .ok_or_else(|| CompileError::EmptyRawSql(data.model.id.clone()))?;
                RawStatement { content, params }.render(&mut renderer)?;
            }
            ModelKind::Metadata => {
                let wheres = merge_filters(&data.wheres, self.filters)?;
                let clauses: [&dyn Render; 7] = [
                    &SelectClause { fields: &data.fields },
                    &FromClause { data },
                    &JoinClause { joins: &data.joins },
                    &ConditionClause::filter(&wheres, params),
                    &GroupByClause { groups: &data.groups },
                    &ConditionClause::having(&data.havings, params),
                    &OrderByClause { orders: &data.orders },
                ];
                for clause in clauses {
                    clause.render(&mut renderer)?;
                }
                if paged {
                    LimitClause {
                        limit: data.limit.as_ref(),
                        params,
                    }
                    .render(&mut renderer)?;
                }
            }
        }

        let (sql, args) = renderer.finish();
        safety::validate(&sql)?;

        debug!(
            model_id = %data.model.id,
            dialect = %self.dialect.name(),
            args = args.len(),
            "Compiled statement: {sql}"
        );
        Ok(CompiledStatement { sql, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::UnsafeReason,
        query::dialect::{MySql, Postgres},
    };
    use model::metadata::{
        model::Model,
        rows::{
            ColumnRef, Condition, Field, Group, Join, Limit, ListFilter, Order, RawSql, Table,
        },
    };

    fn orders_model() -> ModelData {
        let mut data = ModelData::new(Model {
            id: "m-orders".into(),
            conn_id: "c-1".into(),
            ..Default::default()
        });
        data.tables = vec![Table {
            schema: String::new(),
            table: "orders".into(),
            is_main: true,
        }];
        data.fields = vec![
            Field {
                source: ColumnRef::new("orders", "status"),
                ..Default::default()
            },
            Field {
                source: ColumnRef::new("orders", "id"),
                agg_func: "COUNT".into(),
                show_title: "total".into(),
            },
        ];
        data.joins = vec![Join {
            id: "1".into(),
            parent_id: "0".into(),
            join_type: "LEFT".into(),
            table: "orders".into(),
            column: "customer_id".into(),
            join_table: "customers".into(),
            join_column: "id".into(),
            ..Default::default()
        }];
        data.wheres = vec![
            Condition::new(ColumnRef::new("orders", "status"), "=", "paid").with_param("status"),
            Condition::new(ColumnRef::new("customers", "name"), "LIKE", "a"),
        ];
        data.groups = vec![Group {
            source: ColumnRef::new("orders", "status"),
        }];
        data.havings = vec![Condition::new(
            ColumnRef::new("orders", "id").with_func("COUNT"),
            ">",
            "1",
        )];
        data.orders = vec![Order {
            source: ColumnRef::new("orders", "status"),
            direction: "desc".into(),
        }];
        data.limit = Some(Limit { page: 2, limit: 20 });
        data
    }

    #[test]
    fn test_metadata_clause_order() {
        let params = Params::new().with("status", "shipped");
        let compiled = StatementCompiler::new(&MySql)
            .compile(&orders_model(), &params)
            .unwrap();

        assert_eq!(
            compiled.sql,
            "SELECT `orders`.`status`, COUNT(`orders`.`id`) AS `total` FROM `orders` \
             LEFT JOIN `customers` ON `orders`.`customer_id` = `customers`.`id` \
             WHERE `orders`.`status` = ? AND `customers`.`name` LIKE ? \
             GROUP BY `orders`.`status` HAVING COUNT(`orders`.`id`) > ? \
             ORDER BY `orders`.`status` DESC LIMIT 20 OFFSET 20"
        );
        assert_eq!(
            compiled.args,
            vec![
                Value::String("shipped".into()),
                Value::String("%a%".into()),
                Value::String("1".into()),
            ]
        );
    }

    #[test]
    fn test_filters_join_the_where_clause() {
        let filters = [ListFilter::new("customers", "country", "=", "NL")];
        let compiled = StatementCompiler::new(&MySql)
            .with_filters(&filters)
            .compile(&orders_model(), &Params::new())
            .unwrap();

        assert!(compiled.sql.contains(
            "WHERE (`orders`.`status` = ? AND `customers`.`name` LIKE ?) \
             AND `customers`.`country` = ? GROUP BY"
        ));
        assert_eq!(compiled.args[2], Value::String("NL".into()));
        assert_eq!(compiled.args[3], Value::String("1".into()));

        let raw = raw_model(Some("SELECT * FROM users"));
        let compiled = StatementCompiler::new(&MySql)
            .with_filters(&filters)
            .compile(&raw, &Params::new())
            .unwrap();
        assert_eq!(compiled.sql, "SELECT * FROM users");
    }

    #[test]
    fn test_unpaged_drops_only_limit() {
        let compiler = StatementCompiler::new(&MySql);
        let data = orders_model();
        let paged = compiler.compile(&data, &Params::new()).unwrap();
        let unpaged = compiler.compile_unpaged(&data, &Params::new()).unwrap();
        assert_eq!(format!("{} LIMIT 20 OFFSET 20", unpaged.sql), paged.sql);
        assert_eq!(unpaged.args, paged.args);
    }

    #[test]
    fn test_compilation_is_idempotent() {
        let compiler = StatementCompiler::new(&Postgres);
        let data = orders_model();
        let params = Params::from_json(r#"{"status":"new","page":3}"#).unwrap();
        assert_eq!(
            compiler.compile(&data, &params).unwrap(),
            compiler.compile(&data, &params).unwrap()
        );
    }

    #[test]
    fn test_minimal_model() {
        let mut data = ModelData::default();
        data.tables = vec![Table {
            schema: "crm".into(),
            table: "leads".into(),
            is_main: false,
        }];
        let compiled = StatementCompiler::new(&Postgres)
            .compile(&data, &Params::new())
            .unwrap();
        assert_eq!(compiled.sql, r#"SELECT * FROM "crm"."leads""#);
        assert!(compiled.args.is_empty());
    }

    fn raw_model(content: Option<&str>) -> ModelData {
        let mut data = ModelData::new(Model {
            id: "m-raw".into(),
            kind: model::metadata::model::ModelKind::RawSql,
            ..Default::default()
        });
        data.sql = content.map(|c| RawSql { content: c.into() });
        data
    }

    #[test]
    fn test_raw_sql_path() {
        let params = Params::new().with("status", "active");
        let compiled = StatementCompiler::new(&MySql)
            .compile(
                &raw_model(Some("SELECT * FROM users WHERE status = :status")),
                &params,
            )
            .unwrap();
        assert_eq!(compiled.sql, "SELECT * FROM users WHERE status = ?");
        assert_eq!(compiled.args, vec![Value::String("active".into())]);
    }

    #[test]
    fn test_empty_raw_sql() {
        let compiler = StatementCompiler::new(&MySql);
        for data in [raw_model(None), raw_model(Some("   "))] {
            assert_eq!(
                compiler.compile(&data, &Params::new()),
                Err(CompileError::EmptyRawSql("m-raw".into()))
            );
        }
    }

    #[test]
    fn test_raw_sql_is_validated() {
        let err = StatementCompiler::new(&MySql)
            .compile(
                &raw_model(Some("SELECT * FROM t; TRUNCATE t")),
                &Params::new(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::UnsafeSql {
                reason: UnsafeReason::MultipleStatements
            }
        );
    }

    #[test]
    fn test_no_tables() {
        let err = StatementCompiler::new(&MySql)
            .compile(&ModelData::default(), &Params::new())
            .unwrap_err();
        assert!(err.is_configuration_error());
    }
}
