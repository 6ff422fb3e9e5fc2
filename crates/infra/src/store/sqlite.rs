//! SQLite-backed catalog store.
//!
//! The store exposes the synchronous [`CatalogStore`] API over async sqlx by
//! driving an owned current-thread runtime. Every call opens one connection
//! for its duration (no pooling); multi-row writes run in one transaction
//! and roll back entirely on failure.
//!
//! Every value is bound as a statement parameter. The only text ever
//! assembled at runtime is the shape of the membership query, built from the
//! closed set of predicates.

use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Connection, Row, SqliteConnection};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use shopfeed_catalog::{
    CatalogStore, Collection, Condition, ConditionSet, Item, ItemFilter, Predicate, ProductOption, Relation,
    StoreError, StoreResult, Variable, parse_tags,
};
use shopfeed_core::{CollectionId, Handle, ItemId, OptionId, Price};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        handle           TEXT NOT NULL UNIQUE,
        title            TEXT NOT NULL,
        price            TEXT NOT NULL,
        description      TEXT NOT NULL DEFAULT '',
        vendor           TEXT NOT NULL DEFAULT '',
        sku              TEXT NOT NULL DEFAULT '',
        tags             TEXT NOT NULL DEFAULT '',
        url              TEXT NOT NULL DEFAULT '',
        image_url        TEXT NOT NULL DEFAULT '',
        age_group        TEXT NOT NULL DEFAULT '',
        color            TEXT NOT NULL DEFAULT '',
        product_category TEXT NOT NULL DEFAULT '',
        gender           TEXT NOT NULL DEFAULT '',
        updated_at       TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS collections (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        handle     TEXT NOT NULL UNIQUE,
        title      TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS collection_conditions (
        collection_id INTEGER NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
        position      INTEGER NOT NULL,
        variable      TEXT NOT NULL,
        relation      TEXT NOT NULL,
        value         TEXT NOT NULL,
        PRIMARY KEY (collection_id, position)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS items_collections (
        item_id       INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
        collection_id INTEGER NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
        position      INTEGER NOT NULL,
        PRIMARY KEY (item_id, collection_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS options (
        id     INTEGER PRIMARY KEY AUTOINCREMENT,
        handle TEXT NOT NULL,
        title  TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attributes (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        option_id INTEGER NOT NULL REFERENCES options(id) ON DELETE CASCADE,
        position  INTEGER NOT NULL,
        title     TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS options_items (
        option_id INTEGER NOT NULL REFERENCES options(id) ON DELETE CASCADE,
        item_id   INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
        position  INTEGER NOT NULL,
        PRIMARY KEY (option_id, item_id)
    )
    "#,
];

const ITEM_COLUMNS: &str = "id, handle, title, price, description, vendor, sku, tags, url, image_url, \
                            age_group, color, product_category, gender";

const UPSERT_ITEM: &str = r#"
    INSERT INTO items (handle, title, price, description, vendor, sku, tags, url, image_url,
                       age_group, color, product_category, gender, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
    ON CONFLICT(handle) DO UPDATE SET
        title = excluded.title,
        price = excluded.price,
        description = excluded.description,
        vendor = excluded.vendor,
        sku = excluded.sku,
        tags = excluded.tags,
        url = excluded.url,
        image_url = excluded.image_url,
        age_group = excluded.age_group,
        color = excluded.color,
        product_category = excluded.product_category,
        gender = excluded.gender,
        updated_at = excluded.updated_at
    RETURNING id
"#;

/// Attach the failing operation and statement to a sqlx error.
trait StatementContext<T> {
    fn during(self, operation: &'static str, statement: &str) -> StoreResult<T>;
}

impl<T> StatementContext<T> for Result<T, sqlx::Error> {
    fn during(self, operation: &'static str, statement: &str) -> StoreResult<T> {
        self.map_err(|e| StoreError::statement(operation, statement.trim(), e))
    }
}

/// SQLite catalog store.
#[derive(Debug)]
pub struct SqliteCatalogStore {
    runtime: Runtime,
    options: SqliteConnectOptions,
}

impl SqliteCatalogStore {
    /// Open (creating if missing) the database at `database_url`, e.g.
    /// `sqlite://shopfeed.db`, and make sure the schema exists.
    pub fn open(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StoreError::connection("open", e))?
            .create_if_missing(true)
            .foreign_keys(true);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::connection("open", e))?;

        let store = Self { runtime, options };
        store.ensure_schema()?;
        info!(database_url, "catalog store opened");
        Ok(store)
    }

    /// Create every catalog table that does not exist yet.
    pub fn ensure_schema(&self) -> StoreResult<()> {
        self.runtime.block_on(async {
            let mut conn = self.connect("ensure_schema").await?;
            for statement in SCHEMA {
                sqlx::query(statement)
                    .execute(&mut conn)
                    .await
                    .during("ensure_schema", statement)?;
            }
            Ok(())
        })
    }

    async fn connect(&self, operation: &'static str) -> StoreResult<SqliteConnection> {
        SqliteConnection::connect_with(&self.options)
            .await
            .map_err(|e| StoreError::connection(operation, e))
    }
}

fn item_from_row(row: &SqliteRow) -> Result<Item, sqlx::Error> {
    let handle: String = row.try_get("handle")?;
    let title: String = row.try_get("title")?;
    let price: String = row.try_get("price")?;
    let tags: String = row.try_get("tags")?;

    let mut item = Item::with_handle(Handle::new(handle), title);
    item.assign_id(ItemId::from_raw(row.try_get("id")?));
    item.price = price.parse::<Price>().map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    item.description = row.try_get("description")?;
    item.vendor = row.try_get("vendor")?;
    item.sku = row.try_get("sku")?;
    item.tags = parse_tags(&tags);
    item.url = row.try_get("url")?;
    item.image_url = row.try_get("image_url")?;
    item.age_group = row.try_get("age_group")?;
    item.color = row.try_get("color")?;
    item.product_category = row.try_get("product_category")?;
    item.gender = row.try_get("gender")?;
    Ok(item)
}

async fn upsert_item(conn: &mut SqliteConnection, item: &mut Item) -> StoreResult<ItemId> {
    let id: i64 = sqlx::query_scalar(UPSERT_ITEM)
        .bind(item.handle().as_str())
        .bind(&item.title)
        .bind(item.price.amount().to_string())
        .bind(&item.description)
        .bind(&item.vendor)
        .bind(&item.sku)
        .bind(item.tags_string())
        .bind(&item.url)
        .bind(&item.image_url)
        .bind(&item.age_group)
        .bind(&item.color)
        .bind(&item.product_category)
        .bind(&item.gender)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
        .during("save_item", UPSERT_ITEM)?;

    let id = ItemId::from_raw(id);
    item.assign_id(id);
    debug!(item = %item.handle(), %id, "item saved");
    Ok(id)
}

async fn item_id(conn: &mut SqliteConnection, operation: &'static str, handle: &Handle) -> StoreResult<i64> {
    const STATEMENT: &str = "SELECT id FROM items WHERE handle = ?1";
    sqlx::query_scalar(STATEMENT)
        .bind(handle.as_str())
        .fetch_optional(&mut *conn)
        .await
        .during(operation, STATEMENT)?
        .ok_or_else(|| StoreError::not_found(operation, format!("item '{handle}'")))
}

async fn load_option(conn: &mut SqliteConnection, operation: &'static str, id: i64) -> StoreResult<ProductOption> {
    const OPTION: &str = "SELECT title FROM options WHERE id = ?1";
    const ATTRIBUTES: &str = "SELECT title FROM attributes WHERE option_id = ?1 ORDER BY position";

    let title: String = sqlx::query_scalar(OPTION)
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .during(operation, OPTION)?;
    let attributes: Vec<String> = sqlx::query_scalar(ATTRIBUTES)
        .bind(id)
        .fetch_all(&mut *conn)
        .await
        .during(operation, ATTRIBUTES)?;
    Ok(ProductOption::new(title, attributes).with_id(OptionId::from_raw(id)))
}

/// Id of a stored option identical to `option`, inserting it when none is.
async fn find_or_insert_option(
    conn: &mut SqliteConnection,
    operation: &'static str,
    option: &ProductOption,
) -> StoreResult<OptionId> {
    const CANDIDATES: &str = "SELECT id FROM options WHERE handle = ?1 ORDER BY id";
    const INSERT_OPTION: &str = "INSERT INTO options (handle, title) VALUES (?1, ?2) RETURNING id";
    const INSERT_ATTRIBUTE: &str = "INSERT INTO attributes (option_id, position, title) VALUES (?1, ?2, ?3)";

    let candidates: Vec<i64> = sqlx::query_scalar(CANDIDATES)
        .bind(option.handle().as_str())
        .fetch_all(&mut *conn)
        .await
        .during(operation, CANDIDATES)?;
    for id in candidates {
        if load_option(conn, operation, id).await?.is_identical(option) {
            debug!(option = %option.handle(), id, "identical option already stored");
            return Ok(OptionId::from_raw(id));
        }
    }

    let id: i64 = sqlx::query_scalar(INSERT_OPTION)
        .bind(option.handle().as_str())
        .bind(option.title())
        .fetch_one(&mut *conn)
        .await
        .during(operation, INSERT_OPTION)?;
    for (position, attribute) in option.attributes().iter().enumerate() {
        sqlx::query(INSERT_ATTRIBUTE)
            .bind(id)
            .bind(position as i64)
            .bind(attribute)
            .execute(&mut *conn)
            .await
            .during(operation, INSERT_ATTRIBUTE)?;
    }
    debug!(option = %option.handle(), id, "option saved");
    Ok(OptionId::from_raw(id))
}

/// Membership query for a filter. Only the predicate shapes are spliced in;
/// their values are bound in order.
fn membership_query(filter: &ItemFilter) -> String {
    let mut sql = String::from("SELECT handle FROM items WHERE 1 = 1");
    for (index, predicate) in filter.predicates().iter().enumerate() {
        let n = index + 1;
        let clause = match predicate {
            Predicate::HasTag(_) => format!(" AND instr(', ' || tags || ', ', ', ' || ?{n} || ', ') > 0"),
            Predicate::LacksTag(_) => format!(" AND instr(', ' || tags || ', ', ', ' || ?{n} || ', ') = 0"),
            Predicate::TitleContains(_) => format!(" AND instr(title, ?{n}) > 0"),
            Predicate::TitleLacks(_) => format!(" AND instr(title, ?{n}) = 0"),
            Predicate::VendorContains(_) => format!(" AND instr(vendor, ?{n}) > 0"),
        };
        sql.push_str(&clause);
    }
    sql.push_str(" ORDER BY id");
    sql
}

impl CatalogStore for SqliteCatalogStore {
    fn get_item(&self, handle: &Handle) -> StoreResult<Option<Item>> {
        let statement = format!("SELECT {ITEM_COLUMNS} FROM items WHERE handle = ?1");
        self.runtime.block_on(async {
            let mut conn = self.connect("get_item").await?;
            let row = sqlx::query(&statement)
                .bind(handle.as_str())
                .fetch_optional(&mut conn)
                .await
                .during("get_item", &statement)?;
            row.as_ref().map(item_from_row).transpose().during("get_item", &statement)
        })
    }

    fn list_item_handles(&self) -> StoreResult<Vec<Handle>> {
        const STATEMENT: &str = "SELECT handle FROM items ORDER BY id";
        self.runtime.block_on(async {
            let mut conn = self.connect("list_item_handles").await?;
            let handles: Vec<String> = sqlx::query_scalar(STATEMENT)
                .fetch_all(&mut conn)
                .await
                .during("list_item_handles", STATEMENT)?;
            Ok(handles.into_iter().map(Handle::new).collect())
        })
    }

    fn save_item(&self, item: &mut Item) -> StoreResult<ItemId> {
        self.runtime.block_on(async {
            let mut conn = self.connect("save_item").await?;
            upsert_item(&mut conn, item).await
        })
    }

    fn save_items(&self, items: &mut [Item]) -> StoreResult<Vec<ItemId>> {
        self.runtime.block_on(async {
            let mut conn = self.connect("save_items").await?;
            let mut tx = conn.begin().await.during("save_items", "BEGIN")?;
            let mut ids = Vec::with_capacity(items.len());
            for item in items.iter_mut() {
                ids.push(upsert_item(&mut tx, item).await?);
            }
            tx.commit().await.during("save_items", "COMMIT")?;
            info!(items = ids.len(), "items saved");
            Ok(ids)
        })
    }

    fn select_item_handles(&self, filter: &ItemFilter) -> StoreResult<Vec<Handle>> {
        let statement = membership_query(filter);
        self.runtime.block_on(async {
            let mut conn = self.connect("select_item_handles").await?;
            let mut query = sqlx::query_scalar::<_, String>(&statement);
            for predicate in filter.predicates() {
                query = query.bind(predicate.value());
            }
            let handles = query
                .fetch_all(&mut conn)
                .await
                .during("select_item_handles", &statement)?;
            Ok(handles.into_iter().map(Handle::new).collect())
        })
    }

    fn list_collection_handles(&self) -> StoreResult<Vec<Handle>> {
        const STATEMENT: &str = "SELECT handle FROM collections ORDER BY id";
        self.runtime.block_on(async {
            let mut conn = self.connect("list_collection_handles").await?;
            let handles: Vec<String> = sqlx::query_scalar(STATEMENT)
                .fetch_all(&mut conn)
                .await
                .during("list_collection_handles", STATEMENT)?;
            Ok(handles.into_iter().map(Handle::new).collect())
        })
    }

    fn get_collection(&self, handle: &Handle) -> StoreResult<Collection> {
        const COLLECTION: &str = "SELECT id, title FROM collections WHERE handle = ?1";
        const CONDITIONS: &str =
            "SELECT variable, relation, value FROM collection_conditions WHERE collection_id = ?1 ORDER BY position";
        let members = format!(
            "SELECT {} FROM items i JOIN items_collections ic ON ic.item_id = i.id \
             WHERE ic.collection_id = ?1 ORDER BY ic.position",
            ITEM_COLUMNS
                .split(", ")
                .map(|c| format!("i.{c}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let op = "get_collection";

        self.runtime.block_on(async {
            let mut conn = self.connect(op).await?;
            let row = sqlx::query(COLLECTION)
                .bind(handle.as_str())
                .fetch_optional(&mut conn)
                .await
                .during(op, COLLECTION)?
                .ok_or_else(|| StoreError::not_found(op, format!("collection '{handle}'")))?;
            let id: i64 = row.try_get("id").during(op, COLLECTION)?;
            let title: String = row.try_get("title").during(op, COLLECTION)?;

            let rows = sqlx::query(CONDITIONS)
                .bind(id)
                .fetch_all(&mut conn)
                .await
                .during(op, CONDITIONS)?;
            let mut conditions = Vec::with_capacity(rows.len());
            for row in &rows {
                let variable: String = row.try_get("variable").during(op, CONDITIONS)?;
                let relation: String = row.try_get("relation").during(op, CONDITIONS)?;
                let value: String = row.try_get("value").during(op, CONDITIONS)?;
                let condition = Variable::parse(&variable)
                    .and_then(|v| Relation::parse(&relation).map(|r| Condition::new(v, r, value)))
                    .map_err(|e| StoreError::statement(op, CONDITIONS, e))?;
                conditions.push(condition);
            }

            let rows = sqlx::query(&members)
                .bind(id)
                .fetch_all(&mut conn)
                .await
                .during(op, &members)?;
            let items = rows
                .iter()
                .map(item_from_row)
                .collect::<Result<Vec<_>, _>>()
                .during(op, &members)?;

            Ok(Collection::restore(
                CollectionId::from_raw(id),
                handle.clone(),
                title,
                ConditionSet::new(conditions),
                items,
            ))
        })
    }

    fn save_collection(&self, collection: &mut Collection) -> StoreResult<CollectionId> {
        const UPSERT: &str = r#"
            INSERT INTO collections (handle, title, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(handle) DO UPDATE SET title = excluded.title, updated_at = excluded.updated_at
            RETURNING id
        "#;
        const CLEAR_CONDITIONS: &str = "DELETE FROM collection_conditions WHERE collection_id = ?1";
        const INSERT_CONDITION: &str = "INSERT INTO collection_conditions \
             (collection_id, position, variable, relation, value) VALUES (?1, ?2, ?3, ?4, ?5)";
        const CLEAR_MEMBERS: &str = "DELETE FROM items_collections WHERE collection_id = ?1";
        const INSERT_MEMBER: &str =
            "INSERT INTO items_collections (item_id, collection_id, position) VALUES (?1, ?2, ?3)";
        let op = "save_collection";

        self.runtime.block_on(async {
            let mut conn = self.connect(op).await?;
            let mut tx = conn.begin().await.during(op, "BEGIN")?;

            let id: i64 = sqlx::query_scalar(UPSERT)
                .bind(collection.handle().as_str())
                .bind(collection.title())
                .bind(Utc::now())
                .fetch_one(&mut *tx)
                .await
                .during(op, UPSERT)?;

            sqlx::query(CLEAR_CONDITIONS)
                .bind(id)
                .execute(&mut *tx)
                .await
                .during(op, CLEAR_CONDITIONS)?;
            for (position, condition) in collection.conditions().conditions().iter().enumerate() {
                sqlx::query(INSERT_CONDITION)
                    .bind(id)
                    .bind(position as i64)
                    .bind(condition.variable().token())
                    .bind(condition.relation().token())
                    .bind(condition.value())
                    .execute(&mut *tx)
                    .await
                    .during(op, INSERT_CONDITION)?;
            }

            sqlx::query(CLEAR_MEMBERS)
                .bind(id)
                .execute(&mut *tx)
                .await
                .during(op, CLEAR_MEMBERS)?;
            for (position, item) in collection.items_mut().iter_mut().enumerate() {
                let item_id = upsert_item(&mut tx, item).await?;
                sqlx::query(INSERT_MEMBER)
                    .bind(item_id.as_raw())
                    .bind(id)
                    .bind(position as i64)
                    .execute(&mut *tx)
                    .await
                    .during(op, INSERT_MEMBER)?;
            }

            tx.commit().await.during(op, "COMMIT")?;
            let id = CollectionId::from_raw(id);
            collection.assign_id(id);
            info!(collection = %collection.handle(), members = collection.len(), "collection saved");
            Ok(id)
        })
    }

    fn save_option(&self, option: &ProductOption) -> StoreResult<OptionId> {
        self.runtime.block_on(async {
            let mut conn = self.connect("save_option").await?;
            let mut tx = conn.begin().await.during("save_option", "BEGIN")?;
            let id = find_or_insert_option(&mut tx, "save_option", option).await?;
            tx.commit().await.during("save_option", "COMMIT")?;
            Ok(id)
        })
    }

    fn associate_option(&self, item: &Handle, option: &ProductOption) -> StoreResult<()> {
        const LINKED: &str = "SELECT COUNT(*) FROM options_items WHERE option_id = ?1 AND item_id = ?2";
        const NEXT_POSITION: &str = "SELECT COALESCE(MAX(position) + 1, 0) FROM options_items WHERE item_id = ?1";
        const LINK: &str = "INSERT INTO options_items (option_id, item_id, position) VALUES (?1, ?2, ?3)";
        let op = "associate_option";

        self.runtime.block_on(async {
            let mut conn = self.connect(op).await?;
            let mut tx = conn.begin().await.during(op, "BEGIN")?;
            let item_id = item_id(&mut tx, op, item).await?;
            let option_id = find_or_insert_option(&mut tx, op, option).await?;

            let linked: i64 = sqlx::query_scalar(LINKED)
                .bind(option_id.as_raw())
                .bind(item_id)
                .fetch_one(&mut *tx)
                .await
                .during(op, LINKED)?;
            if linked > 0 {
                debug!(%item, option = %option.handle(), "option already associated");
            } else {
                let position: i64 = sqlx::query_scalar(NEXT_POSITION)
                    .bind(item_id)
                    .fetch_one(&mut *tx)
                    .await
                    .during(op, NEXT_POSITION)?;
                sqlx::query(LINK)
                    .bind(option_id.as_raw())
                    .bind(item_id)
                    .bind(position)
                    .execute(&mut *tx)
                    .await
                    .during(op, LINK)?;
                debug!(%item, option = %option.handle(), "option associated");
            }
            tx.commit().await.during(op, "COMMIT")?;
            Ok(())
        })
    }

    fn item_options(&self, item: &Handle) -> StoreResult<Vec<ProductOption>> {
        const STATEMENT: &str = "SELECT oi.option_id FROM options_items oi JOIN items i ON i.id = oi.item_id \
                                 WHERE i.handle = ?1 ORDER BY oi.position";
        self.runtime.block_on(async {
            let mut conn = self.connect("item_options").await?;
            let ids: Vec<i64> = sqlx::query_scalar(STATEMENT)
                .bind(item.as_str())
                .fetch_all(&mut conn)
                .await
                .during("item_options", STATEMENT)?;
            let mut options = Vec::with_capacity(ids.len());
            for id in ids {
                options.push(load_option(&mut conn, "item_options", id).await?);
            }
            Ok(options)
        })
    }

    fn wipe(&self) -> StoreResult<()> {
        const TABLES: [&str; 7] = [
            "options_items",
            "attributes",
            "options",
            "items_collections",
            "collection_conditions",
            "collections",
            "items",
        ];
        self.runtime.block_on(async {
            let mut conn = self.connect("wipe").await?;
            let mut tx = conn.begin().await.during("wipe", "BEGIN")?;
            for table in TABLES {
                let statement = format!("DELETE FROM {table}");
                sqlx::query(&statement)
                    .execute(&mut *tx)
                    .await
                    .during("wipe", &statement)?;
            }
            tx.commit().await.during("wipe", "COMMIT")?;
            info!("catalog wiped");
            Ok(())
        })
    }
}
