use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::defaults::AUTO_INCREMENT;
use crate::dialect::Dialect;
use crate::error::{IntrospectError, Step};
use crate::introspect::{relations_from_rows, DialectDriver, RawColumn, RawTable};
use crate::result;
use crate::schema::{Column, Index, IntrospectionResult, Relation, Table};

/// Options that control how introspection runs.
#[derive(Debug, Clone)]
pub struct IntrospectOptions {
    /// Maximum number of tables fetched at once; 1 fetches sequentially.
    pub concurrency: usize,
    /// Keep reserved schemas in `list_schemas`.
    pub include_reserved_schemas: bool,
}

impl Default for IntrospectOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            include_reserved_schemas: false,
        }
    }
}

/// Dialect-independent driver of an introspection run.
///
/// All catalog access goes through the injected [`DialectDriver`]. A run either
/// returns a complete result or the first query failure.
#[derive(Clone)]
pub struct Connector {
    driver: Arc<dyn DialectDriver>,
    options: IntrospectOptions,
}

impl Connector {
    pub fn new(driver: Arc<dyn DialectDriver>) -> Self {
        Self::with_options(driver, IntrospectOptions::default())
    }

    pub fn with_options(driver: Arc<dyn DialectDriver>, options: IntrospectOptions) -> Self {
        Connector { driver, options }
    }

    pub fn dialect(&self) -> Dialect {
        self.driver.dialect()
    }

    /// List user-facing schemas; reserved ones are dropped unless asked for.
    pub async fn list_schemas(&self) -> Result<Vec<String>, IntrospectError> {
        let schemas = self
            .driver
            .list_schemas()
            .await
            .map_err(|e| IntrospectError::query(Step::Schemas, None, e))?;

        if self.options.include_reserved_schemas {
            return Ok(schemas);
        }

        Ok(schemas
            .into_iter()
            .filter(|s| !self.driver.is_reserved_schema(s))
            .collect())
    }

    /// Introspect every table of `schema`.
    pub async fn introspect(&self, schema: &str) -> Result<IntrospectionResult, IntrospectError> {
        let mut raw_tables = self
            .driver
            .list_tables(schema)
            .await
            .map_err(|e| IntrospectError::query(Step::Tables, None, e))?;
        raw_tables.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::debug!(
            "Introspecting {} tables in {}.{} (concurrency {})",
            raw_tables.len(),
            self.driver.dialect(),
            schema,
            self.options.concurrency
        );

        let fetched = if self.options.concurrency > 1 && raw_tables.len() > 1 {
            self.fetch_parallel(schema, raw_tables).await?
        } else {
            let mut fetched = Vec::with_capacity(raw_tables.len());
            for raw in raw_tables {
                fetched.push(fetch_table(self.driver.as_ref(), schema, raw).await?);
            }
            fetched
        };

        let enums = self
            .driver
            .list_enums(schema)
            .await
            .map_err(|e| IntrospectError::query(Step::Enums, None, e))?;

        let mut tables = Vec::with_capacity(fetched.len());
        let mut relations = Vec::new();
        for (table, table_relations) in fetched {
            tables.push(table);
            relations.extend(table_relations);
        }

        let assembled = result::assemble(self.driver.dialect(), schema, tables, relations, enums);
        let finalized = self.driver.finalize(assembled);

        for (table, column) in finalized.partial_columns() {
            tracing::warn!(
                "Column {}.{} has an unmapped type '{}': {}",
                table,
                column.name,
                column.raw_type,
                column.type_error.as_deref().unwrap_or("unknown type")
            );
        }
        tracing::info!(
            "Introspected {} tables and {} relations in {}",
            finalized.tables.len(),
            finalized.relations.len(),
            schema
        );

        Ok(finalized)
    }

    /// Fetch tables on a bounded pool of tasks.
    ///
    /// Each task owns the table it builds; results are slotted back by their
    /// position in the sorted listing. The first failure aborts the rest.
    async fn fetch_parallel(
        &self,
        schema: &str,
        raw_tables: Vec<RawTable>,
    ) -> Result<Vec<(Table, Vec<Relation>)>, IntrospectError> {
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency));
        let mut workers = JoinSet::new();
        let total = raw_tables.len();

        for (slot, raw) in raw_tables.into_iter().enumerate() {
            let driver = Arc::clone(&self.driver);
            let semaphore = Arc::clone(&semaphore);
            let schema = schema.to_string();
            workers.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| IntrospectError::Worker(e.to_string()))?;
                let fetched = fetch_table(driver.as_ref(), &schema, raw).await?;
                Ok::<_, IntrospectError>((slot, fetched))
            });
        }

        let mut slots: Vec<Option<(Table, Vec<Relation>)>> = (0..total).map(|_| None).collect();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok((slot, fetched))) => slots[slot] = Some(fetched),
                Ok(Err(e)) => {
                    workers.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    workers.abort_all();
                    return Err(IntrospectError::Worker(e.to_string()));
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

/// Fetch and assemble one table plus the foreign keys declared on it.
async fn fetch_table(
    driver: &dyn DialectDriver,
    schema: &str,
    raw: RawTable,
) -> Result<(Table, Vec<Relation>), IntrospectError> {
    let table = raw.name.as_str();
    tracing::debug!("Fetching {}.{}", schema, table);

    let raw_columns = driver
        .list_columns(schema, table)
        .await
        .map_err(|e| IntrospectError::query(Step::Columns, Some(table), e))?;

    let indices = driver
        .list_indices(schema, table)
        .await
        .map_err(|e| IntrospectError::query(Step::Indices, Some(table), e))?;

    let mut comments = Vec::with_capacity(raw_columns.len());
    for column in &raw_columns {
        let comment = driver
            .column_comment(schema, table, &column.name)
            .await
            .map_err(|e| IntrospectError::query(Step::Comments, Some(table), e))?;
        comments.push(comment);
    }

    let raw_relations = driver
        .list_relations(schema, table)
        .await
        .map_err(|e| IntrospectError::query(Step::Relations, Some(table), e))?;

    let columns = raw_columns
        .into_iter()
        .zip(comments)
        .map(|(column, comment)| build_column(driver, column, comment, &indices))
        .collect();

    Ok((
        Table {
            name: raw.name,
            comment: raw.comment,
            columns,
            indices,
        },
        relations_from_rows(raw_relations),
    ))
}

/// Map a raw catalog column through the driver's type mapper and default
/// normalizer. Unmapped types are kept with their diagnostic.
pub fn build_column(
    driver: &dyn DialectDriver,
    raw: RawColumn,
    comment: Option<String>,
    indices: &[Index],
) -> Column {
    let is_primary_key = indices
        .iter()
        .any(|i| i.is_primary_key && i.fields.iter().any(|f| *f == raw.name));
    let is_unique = indices
        .iter()
        .any(|i| (i.unique || i.is_primary_key) && i.fields.len() == 1 && i.fields[0] == raw.name);

    let mapped = driver.map_type(&raw.data_type, &raw.name, is_primary_key);
    let default = if raw.is_identity {
        Some(AUTO_INCREMENT.to_string())
    } else {
        driver.normalize_default(raw.column_default.as_deref())
    };

    Column {
        name: raw.name,
        raw_type: raw.data_type,
        udt_name: raw.udt_name,
        type_id: mapped.identifier,
        type_comment: mapped.comment,
        type_error: mapped.error,
        is_nullable: raw.is_nullable,
        default,
        comment,
        is_primary_key,
        is_unique,
        enum_name: None,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::introspect::RawRelation;
    use crate::schema::{Cardinality, EnumType, TypeId};
    use crate::testutil::{raw_column, raw_index_column, FakeDriver};

    fn shop() -> FakeDriver {
        let mut fake = FakeDriver::default();
        fake.schemas = vec![
            "information_schema".to_string(),
            "pg_catalog".to_string(),
            "pg_toast".to_string(),
            "public".to_string(),
            "sales".to_string(),
        ];

        let mut id = raw_column("id", 1, "integer");
        id.is_nullable = false;
        id.column_default = Some("nextval('users_id_seq'::regclass)".to_string());
        let mut email = raw_column("email", 2, "character varying");
        email.is_nullable = false;
        let mut status = raw_column("status", 3, "USER-DEFINED");
        status.udt_name = "user_status".to_string();
        status.column_default = Some("'active'::user_status".to_string());
        let mut created = raw_column("created_at", 4, "timestamp with time zone");
        created.column_default = Some("now()".to_string());
        fake.add_table(
            "users",
            vec![id, email, status, created, raw_column("search", 5, "tsvector")],
        );
        fake.comments.insert(
            ("users".to_string(), "email".to_string()),
            "Login address".to_string(),
        );
        fake.index_rows.insert(
            "users".to_string(),
            vec![
                raw_index_column("users", "users_pkey", "id", 1, true, true),
                raw_index_column("users", "users_email_key", "email", 1, true, false),
            ],
        );

        let mut order_id = raw_column("id", 1, "uuid");
        order_id.is_nullable = false;
        let mut number = raw_column("number", 2, "text");
        number.column_default = Some("'A-000'::text".to_string());
        fake.add_table(
            "orders",
            vec![
                order_id,
                raw_column("user_id", 2, "integer"),
                number,
                raw_column("total", 4, "numeric"),
            ],
        );
        // Composite unique index declared as (number, user_id); rows arrive in
        // attribute order.
        fake.index_rows.insert(
            "orders".to_string(),
            vec![
                raw_index_column("orders", "orders_pkey", "id", 1, true, true),
                raw_index_column("orders", "orders_user_number_key", "user_id", 2, true, false),
                raw_index_column("orders", "orders_user_number_key", "number", 1, true, false),
            ],
        );
        fake.relations.insert(
            "orders".to_string(),
            vec![RawRelation {
                constraint_name: "orders_user_id_fkey".to_string(),
                source_table: "orders".to_string(),
                source_column: "user_id".to_string(),
                target_schema: "public".to_string(),
                target_table: "users".to_string(),
                target_column: "id".to_string(),
                position: 1,
            }],
        );

        fake.add_table("audit_log", vec![raw_column("entry", 1, "jsonb")]);

        fake.enums = vec![EnumType {
            name: "user_status".to_string(),
            values: vec!["active".to_string(), "disabled".to_string()],
        }];
        fake
    }

    fn connector(fake: FakeDriver, concurrency: usize) -> Connector {
        Connector::with_options(
            Arc::new(fake),
            IntrospectOptions {
                concurrency,
                ..IntrospectOptions::default()
            },
        )
    }

    #[tokio::test]
    async fn test_list_schemas_filters_reserved() {
        let connector = connector(shop(), 1);
        assert_eq!(connector.dialect(), Dialect::Postgres);
        let schemas = connector.list_schemas().await.unwrap();
        assert_eq!(schemas, vec!["public", "sales"]);
        assert!(schemas.iter().all(|s| !s.starts_with("pg_")));
    }

    #[tokio::test]
    async fn test_list_schemas_can_include_reserved() {
        let connector = Connector::with_options(
            Arc::new(shop()),
            IntrospectOptions {
                include_reserved_schemas: true,
                ..IntrospectOptions::default()
            },
        );
        assert_eq!(connector.list_schemas().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_introspect_assembles_tables() {
        let result = connector(shop(), 1).introspect("public").await.unwrap();

        let names: Vec<_> = result.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["audit_log", "orders", "users"]);

        let users = result.table("users").unwrap();
        let id = users.column("id").unwrap();
        assert_eq!(id.type_id, Some(TypeId::Int));
        assert!(id.is_primary_key);
        assert!(id.is_unique);
        assert_eq!(id.default.as_deref(), Some(AUTO_INCREMENT));

        let email = users.column("email").unwrap();
        assert_eq!(email.type_id, Some(TypeId::String));
        assert!(email.is_unique);
        assert!(!email.is_primary_key);
        assert_eq!(email.comment.as_deref(), Some("Login address"));

        let created = users.column("created_at").unwrap();
        assert_eq!(created.type_id, Some(TypeId::DateTime));
        assert_eq!(created.default, None);

        let orders = result.table("orders").unwrap();
        assert_eq!(orders.column("id").unwrap().type_id, Some(TypeId::Uuid));
        assert_eq!(orders.column("number").unwrap().default.as_deref(), Some("A-000"));
        // Part of a composite unique index only.
        assert!(!orders.column("number").unwrap().is_unique);
    }

    #[tokio::test]
    async fn test_composite_index_order_matches_catalog() {
        let result = connector(shop(), 1).introspect("public").await.unwrap();
        let orders = result.table("orders").unwrap();
        let index = orders
            .indices
            .iter()
            .find(|i| i.name == "orders_user_number_key")
            .unwrap();
        assert_eq!(index.fields, vec!["number", "user_id"]);
        assert!(index.unique);
        assert!(!index.is_primary_key);
    }

    #[tokio::test]
    async fn test_unmapped_column_is_kept() {
        let result = connector(shop(), 1).introspect("public").await.unwrap();
        let users = result.table("users").unwrap();
        assert_eq!(users.columns.len(), 5);

        let search = users.column("search").unwrap();
        assert!(search.is_partial());
        assert_eq!(search.type_id, None);
        assert_eq!(
            search.type_error.as_deref(),
            Some("Not able to handle type 'tsvector'")
        );

        let partial: Vec<_> = result
            .partial_columns()
            .map(|(t, c)| format!("{t}.{}", c.name))
            .collect();
        assert_eq!(partial, vec!["users.search"]);
    }

    #[tokio::test]
    async fn test_enum_columns_harmonized() {
        let result = connector(shop(), 1).introspect("public").await.unwrap();
        let status = result.table("users").unwrap().column("status").unwrap();
        assert_eq!(status.type_id, Some(TypeId::String));
        assert_eq!(status.enum_name.as_deref(), Some("user_status"));
        assert_eq!(status.default.as_deref(), Some("active"));
        assert_eq!(result.enums.len(), 1);
    }

    #[tokio::test]
    async fn test_relations_collected() {
        let result = connector(shop(), 1).introspect("public").await.unwrap();
        assert_eq!(result.relations.len(), 1);
        let rel = &result.relations[0];
        assert_eq!(rel.source_table, "orders");
        assert_eq!(rel.source_column, "user_id");
        assert_eq!(rel.target_table, "users");
        assert_eq!(rel.target_column, "id");
        assert_eq!(rel.cardinality, Cardinality::ManyToOne);
    }

    #[tokio::test]
    async fn test_expression_unique_index_does_not_mark_column() {
        let mut fake = shop();
        let mut tenant = raw_column("tenant_id", 1, "integer");
        tenant.is_nullable = false;
        fake.add_table("accounts", vec![tenant, raw_column("email", 2, "text")]);
        // UNIQUE (tenant_id, lower(email)): the expression key has no column.
        let mut expression =
            raw_index_column("accounts", "accounts_tenant_email_key", "", 2, true, false);
        expression.column_name = None;
        fake.index_rows.insert(
            "accounts".to_string(),
            vec![
                raw_index_column(
                    "accounts",
                    "accounts_tenant_email_key",
                    "tenant_id",
                    1,
                    true,
                    false,
                ),
                expression,
            ],
        );
        fake.relations.insert(
            "accounts".to_string(),
            vec![RawRelation {
                constraint_name: "accounts_tenant_id_fkey".to_string(),
                source_table: "accounts".to_string(),
                source_column: "tenant_id".to_string(),
                target_schema: "public".to_string(),
                target_table: "users".to_string(),
                target_column: "id".to_string(),
                position: 1,
            }],
        );

        let result = connector(fake, 1).introspect("public").await.unwrap();
        let accounts = result.table("accounts").unwrap();
        assert!(accounts.indices.is_empty());
        assert!(!accounts.column("tenant_id").unwrap().is_unique);
        let rel = result
            .relations
            .iter()
            .find(|r| r.name == "accounts_tenant_id_fkey")
            .unwrap();
        assert_eq!(rel.cardinality, Cardinality::ManyToOne);
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let sequential = connector(shop(), 1).introspect("public").await.unwrap();

        let mut slow = shop();
        // Finish in reverse alphabetical order.
        slow.delays
            .insert("audit_log".to_string(), Duration::from_millis(40));
        slow.delays.insert("orders".to_string(), Duration::from_millis(20));
        let parallel = connector(slow, 4).introspect("public").await.unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(
            serde_json::to_string(&sequential).unwrap(),
            serde_json::to_string(&parallel).unwrap()
        );
    }

    #[tokio::test]
    async fn test_query_failure_aborts_run() {
        let mut fake = shop();
        fake.fail_on = Some((Step::Indices, "orders".to_string()));
        let err = connector(fake, 1).introspect("public").await.unwrap_err();
        assert_eq!(err.table(), Some("orders"));
        assert!(matches!(
            err,
            IntrospectError::QueryFailure {
                step: Step::Indices,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_parallel_failure_surfaces_first_error() {
        let mut fake = shop();
        fake.fail_on = Some((Step::Comments, "users".to_string()));
        fake.delays
            .insert("audit_log".to_string(), Duration::from_millis(200));
        let err = connector(fake, 3).introspect("public").await.unwrap_err();
        assert_eq!(err.table(), Some("users"));
        assert!(err.to_string().starts_with("comment query failed for table 'users'"));
    }

    #[test]
    fn test_build_column_identity_default() {
        let fake = FakeDriver::default();
        let mut raw = raw_column("id", 1, "bigint");
        raw.is_identity = true;
        let column = build_column(&fake, raw, None, &[]);
        assert_eq!(column.default.as_deref(), Some(AUTO_INCREMENT));
        assert_eq!(column.type_id, Some(TypeId::Int));
    }

    #[test]
    fn test_build_column_text_primary_key_is_id() {
        let fake = FakeDriver::default();
        let indices = vec![Index {
            name: "codes_pkey".to_string(),
            table_name: "codes".to_string(),
            fields: vec!["code".to_string()],
            unique: true,
            is_primary_key: true,
        }];
        let column = build_column(&fake, raw_column("code", 1, "text"), None, &indices);
        assert_eq!(column.type_id, Some(TypeId::Id));
        assert!(column.is_primary_key);
    }
}
