// Copyright (C) 2024-2025 Fred Clausen and the ratatui project contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask - project automation for the PEP report workspace
//!
//! `cargo test` runs everything against in-memory `SQLite`. The `MySQL`
//! backend is validated on demand only:
//!
//! - `cargo xtask test-mariadb` starts a throwaway `MariaDB` container and
//!   runs the ignored backend validation tests of `pep-report-persistence`
//!   against it, most importantly the unique index on report codes.
//! - `cargo xtask verify-migrations` applies both migration sets and fails
//!   if the resulting schemas differ.
//!
//! Containers are removed when the command ends, whether it passed or not.

#![deny(
    clippy::pedantic,
    //clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::collections::{BTreeMap, BTreeSet};
use std::thread::sleep;
use std::time::Duration;
use std::{io, process::Output};

use cargo_metadata::MetadataCommand;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{Result, eyre::Context, eyre::eyre};
use diesel::sql_types::{Integer, Text};
use diesel::{Connection, MysqlConnection, QueryableByName, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use duct::cmd;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

const PERSISTENCE_PACKAGE: &str = "pep-report-persistence";
const SQLITE_MIGRATIONS: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations");
const MYSQL_MIGRATIONS: EmbeddedMigrations =
    embed_migrations!("../crates/persistence/migrations_mysql");

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    match args.run() {
        Ok(()) => (),
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn run(self) -> Result<()> {
        self.command.run()
    }

    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Run CI checks (lint, build, test)
    CI,

    /// Build the project
    #[command(visible_alias = "b")]
    Build,

    /// Run cargo check
    #[command(visible_alias = "c")]
    Check,

    /// Lint formatting, clippy, and docs
    #[command(visible_alias = "l")]
    Lint,

    /// Run clippy on the project
    #[command(visible_alias = "cl")]
    LintClippy,

    /// Check documentation for errors and warnings
    #[command(visible_alias = "d")]
    LintDocs,

    /// Check for formatting issues in the project
    #[command(visible_alias = "lf")]
    LintFormatting,

    /// Fix formatting issues in the project
    #[command(visible_alias = "fmt")]
    FixFormatting,

    /// Run lib and doc tests
    #[command(visible_alias = "t")]
    Test,

    /// Run `MariaDB` backend validation tests
    #[command(visible_alias = "tm")]
    TestMariadb,

    /// Verify schema parity between `SQLite` and `MySQL` migrations
    #[command(visible_alias = "vm")]
    VerifyMigrations,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => ci(),
            Self::Build => build(),
            Self::Check => check(),
            Self::Lint => lint(),
            Self::LintClippy => lint_clippy(),
            Self::LintDocs => lint_docs(),
            Self::LintFormatting => lint_format(),
            Self::FixFormatting => fix_format(),
            Self::Test => test(),
            Self::TestMariadb => test_mariadb(),
            Self::VerifyMigrations => verify_migrations(),
        }
    }
}

/// Run CI checks (lint, build, test). Backend checks need Docker and are
/// run separately.
fn ci() -> Result<()> {
    lint()?;
    build()?;
    test()?;
    Ok(())
}

/// Build the project
fn build() -> Result<()> {
    run_cargo(vec!["build", "--all-targets", "--all-features"])
}

/// Run cargo check
fn check() -> Result<()> {
    run_cargo(vec!["check", "--all-targets", "--all-features"])
}

/// Lint formatting, clippy, and docs
fn lint() -> Result<()> {
    lint_format()?;
    lint_clippy()?;
    lint_docs()?;
    Ok(())
}

/// Run clippy on the project
fn lint_clippy() -> Result<()> {
    run_cargo(vec![
        "clippy",
        "--all-targets",
        "--all-features",
        "--tests",
        "--benches",
        "--",
        "-D",
        "warnings",
    ])
}

/// Check that docs build without warnings for every workspace member
fn lint_docs() -> Result<()> {
    let meta = MetadataCommand::new()
        .exec()
        .wrap_err("failed to get cargo metadata")?;
    for package in meta.workspace_default_packages() {
        cmd!("cargo", "doc", "--no-deps", "--package", package.name.as_str())
            .env("RUSTDOCFLAGS", "-D warnings")
            .run_with_trace()?;
    }
    Ok(())
}

/// Lint formatting issues in the project
fn lint_format() -> Result<()> {
    run_cargo(vec!["fmt", "--all", "--check"])
}

/// Fix formatting issues in the project
fn fix_format() -> Result<()> {
    run_cargo(vec!["fmt", "--all"])
}

/// Run lib and doc tests for the workspace's default packages
fn test() -> Result<()> {
    run_cargo(vec!["test", "--all-targets", "--all-features"])?;
    run_cargo(vec!["test", "--doc", "--all-features"])?;
    Ok(())
}

/// Run a cargo subcommand with the default toolchain
fn run_cargo(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args).run_with_trace()?;
    Ok(())
}

/// A throwaway `MariaDB` 11 container, removed on drop.
struct MariadbContainer {
    name: &'static str,
    database: &'static str,
    user: &'static str,
    password: &'static str,
    port: &'static str,
}

impl MariadbContainer {
    /// Seconds to wait for the server to accept connections.
    const READY_TIMEOUT_SECS: u32 = 30;

    /// Starts the container and waits until it accepts connections.
    fn start(
        name: &'static str,
        database: &'static str,
        password: &'static str,
        port: &'static str,
    ) -> Result<Self> {
        tracing::info!("Checking Docker availability");
        cmd!("docker", "--version")
            .run_with_trace()
            .wrap_err("Docker is not available. Please install Docker.")?;

        let container: Self = Self {
            name,
            database,
            user: "pep_report",
            password,
            port,
        };
        container.remove();

        tracing::info!("Starting MariaDB container: {}", name);
        cmd!(
            "docker",
            "run",
            "--name",
            name,
            "-e",
            format!("MARIADB_DATABASE={database}"),
            "-e",
            format!("MARIADB_USER={}", container.user),
            "-e",
            format!("MARIADB_PASSWORD={password}"),
            "-e",
            "MARIADB_ROOT_PASSWORD=root_password",
            "-p",
            format!("{port}:3306"),
            "-d",
            "mariadb:11"
        )
        .run_with_trace()
        .wrap_err("Failed to start MariaDB container")?;

        container.wait_ready()?;
        Ok(container)
    }

    fn wait_ready(&self) -> Result<()> {
        tracing::info!("Waiting for MariaDB to be ready...");
        for attempt in 1..=Self::READY_TIMEOUT_SECS {
            sleep(Duration::from_secs(1));
            tracing::debug!(
                "Connection attempt {}/{}",
                attempt,
                Self::READY_TIMEOUT_SECS
            );
            let probe = cmd!(
                "docker",
                "exec",
                self.name,
                "mariadb",
                "-u",
                self.user,
                format!("-p{}", self.password),
                "-e",
                "SELECT 1"
            )
            .stdout_null()
            .stderr_null()
            .run();
            if probe.is_ok() {
                tracing::info!("MariaDB is ready");
                return Ok(());
            }
        }
        Err(eyre!("MariaDB did not become ready within timeout"))
    }

    fn url(&self) -> String {
        format!(
            "mysql://{}:{}@127.0.0.1:{}/{}",
            self.user, self.password, self.port, self.database
        )
    }

    fn remove(&self) {
        let _ = cmd!("docker", "stop", self.name)
            .stdout_null()
            .stderr_null()
            .run();
        let _ = cmd!("docker", "rm", self.name)
            .stdout_null()
            .stderr_null()
            .run();
    }
}

impl Drop for MariadbContainer {
    fn drop(&mut self) {
        tracing::info!("Removing MariaDB container {}", self.name);
        self.remove();
    }
}

/// Run `MariaDB` backend validation tests
///
/// Starts a `MariaDB` container on port 3307, then runs the ignored
/// `backend_validation_tests` of `pep-report-persistence` with
/// `DATABASE_URL` and `PEP_REPORT_TEST_BACKEND=mariadb` set. The tests cover
/// migrations, the report code unique index, foreign keys and rollback.
///
/// Requires Docker and the `MySQL` client libraries.
fn test_mariadb() -> Result<()> {
    tracing::info!("Starting MariaDB backend validation");
    let container: MariadbContainer = MariadbContainer::start(
        "pep-report-test-mariadb",
        "pep_report_test",
        "test_password",
        "3307",
    )?;

    tracing::info!("Running MariaDB backend validation tests");
    cmd!(
        "cargo",
        "test",
        "--package",
        PERSISTENCE_PACKAGE,
        "backend_validation_tests",
        "--",
        "--ignored",
        "--test-threads=1"
    )
    .env("DATABASE_URL", container.url())
    .env("PEP_REPORT_TEST_BACKEND", "mariadb")
    .run_with_trace()
    .wrap_err("MariaDB backend validation tests failed")?;

    tracing::info!("MariaDB backend validation completed successfully");
    Ok(())
}

/// Verify schema parity between `SQLite` and `MySQL` migrations
///
/// Applies `migrations/` to an in-memory `SQLite` database and
/// `migrations_mysql/` to a `MariaDB` container on port 3308, introspects
/// both and fails on any difference in tables, columns, keys, unique
/// constraints or indexes. `MySQL` may carry extra single-column indexes on
/// foreign key columns, which `InnoDB` creates on its own.
fn verify_migrations() -> Result<()> {
    tracing::info!("Starting schema parity verification");
    let container: MariadbContainer = MariadbContainer::start(
        "pep-report-verify-migrations",
        "pep_report_verify",
        "verify_password",
        "3308",
    )?;

    tracing::info!("Applying SQLite migrations");
    let mut sqlite_conn = SqliteConnection::establish(":memory:")
        .wrap_err("Failed to create SQLite in-memory database")?;
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut sqlite_conn)
        .wrap_err("Failed to enable foreign keys on SQLite")?;
    sqlite_conn
        .run_pending_migrations(SQLITE_MIGRATIONS)
        .map_err(|e| eyre!("Failed to apply SQLite migrations: {e}"))?;

    tracing::info!("Applying MySQL migrations");
    let mut mysql_conn =
        MysqlConnection::establish(&container.url()).wrap_err("Failed to connect to MariaDB")?;
    mysql_conn
        .run_pending_migrations(MYSQL_MIGRATIONS)
        .map_err(|e| eyre!("Failed to apply MySQL migrations: {e}"))?;

    let sqlite_schema: Schema = introspect_sqlite_schema(&mut sqlite_conn)?;
    let mysql_schema: Schema = introspect_mysql_schema(&mut mysql_conn, container.database)?;
    compare_schemas(&sqlite_schema, &mysql_schema)?;

    tracing::info!("Schema parity verification passed");
    Ok(())
}

/// Normalized schema representation
#[derive(Debug, Default)]
struct Schema {
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Default)]
struct Table {
    /// Column name to (normalized type, nullable).
    columns: BTreeMap<String, (String, bool)>,
    primary_keys: BTreeSet<String>,
    /// (column, referenced table, referenced column).
    foreign_keys: BTreeSet<(String, String, String)>,
    unique_constraints: BTreeSet<Vec<String>>,
    indexes: BTreeSet<Vec<String>>,
}

#[derive(QueryableByName)]
struct NameRow {
    #[diesel(sql_type = Text)]
    name: String,
}

fn introspect_sqlite_schema(conn: &mut SqliteConnection) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct ColumnRow {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        r#type: String,
        #[diesel(sql_type = Integer)]
        notnull: i32,
        #[diesel(sql_type = Integer)]
        pk: i32,
    }

    #[derive(QueryableByName)]
    struct ForeignKeyRow {
        #[diesel(sql_type = Text)]
        table: String,
        #[diesel(sql_type = Text)]
        from: String,
        #[diesel(sql_type = Text)]
        to: String,
    }

    #[derive(QueryableByName)]
    struct IndexRow {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        origin: String,
    }

    let mut schema: Schema = Schema::default();
    let tables: Vec<NameRow> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' \
         AND name != '__diesel_schema_migrations' ORDER BY name",
    )
    .load(conn)
    .wrap_err("Failed to query SQLite tables")?;

    for table in tables {
        let mut info: Table = Table::default();

        let columns: Vec<ColumnRow> = diesel::sql_query(format!("PRAGMA table_info({})", table.name))
            .load(conn)
            .wrap_err_with(|| format!("Failed to get columns for table {}", table.name))?;
        for col in columns {
            if col.pk > 0 {
                info.primary_keys.insert(col.name.clone());
            }
            info.columns
                .insert(col.name, (normalize_sqlite_type(&col.r#type), col.notnull == 0));
        }

        let fks: Vec<ForeignKeyRow> =
            diesel::sql_query(format!("PRAGMA foreign_key_list({})", table.name))
                .load(conn)
                .wrap_err_with(|| format!("Failed to get foreign keys for table {}", table.name))?;
        for fk in fks {
            info.foreign_keys.insert((fk.from, fk.table, fk.to));
        }

        let indexes: Vec<IndexRow> = diesel::sql_query(format!("PRAGMA index_list({})", table.name))
            .load(conn)
            .wrap_err_with(|| format!("Failed to get indexes for table {}", table.name))?;
        for idx in indexes {
            let columns: Vec<String> = diesel::sql_query(format!("PRAGMA index_info({})", idx.name))
                .load::<NameRow>(conn)
                .wrap_err_with(|| format!("Failed to get index columns for {}", idx.name))?
                .into_iter()
                .map(|c| c.name)
                .collect();
            match idx.origin.as_str() {
                "u" => {
                    info.unique_constraints.insert(columns);
                }
                "c" => {
                    info.indexes.insert(columns);
                }
                _ => {}
            }
        }

        schema.tables.insert(table.name, info);
    }

    Ok(schema)
}

fn introspect_mysql_schema(conn: &mut MysqlConnection, database: &str) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct ColumnRow {
        #[diesel(sql_type = Text)]
        column_name: String,
        #[diesel(sql_type = Text)]
        data_type: String,
        #[diesel(sql_type = Text)]
        is_nullable: String,
        #[diesel(sql_type = Text)]
        column_key: String,
    }

    #[derive(QueryableByName)]
    #[allow(clippy::struct_field_names)]
    struct ForeignKeyRow {
        #[diesel(sql_type = Text)]
        column_name: String,
        #[diesel(sql_type = Text)]
        referenced_table_name: String,
        #[diesel(sql_type = Text)]
        referenced_column_name: String,
    }

    #[derive(QueryableByName)]
    struct IndexRow {
        #[diesel(sql_type = Text)]
        index_name: String,
        #[diesel(sql_type = Text)]
        column_name: String,
        #[diesel(sql_type = Integer)]
        non_unique: i32,
    }

    let mut schema: Schema = Schema::default();
    let tables: Vec<NameRow> = diesel::sql_query(
        "SELECT table_name AS name FROM information_schema.tables WHERE table_schema = ? \
         AND table_name != '__diesel_schema_migrations' ORDER BY table_name",
    )
    .bind::<Text, _>(database)
    .load(conn)
    .wrap_err("Failed to query MySQL tables")?;

    for table in tables {
        let mut info: Table = Table::default();

        let columns: Vec<ColumnRow> = diesel::sql_query(
            "SELECT column_name, data_type, is_nullable, column_key FROM information_schema.columns \
             WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position",
        )
        .bind::<Text, _>(database)
        .bind::<Text, _>(&table.name)
        .load(conn)
        .wrap_err_with(|| format!("Failed to get columns for table {}", table.name))?;
        for col in columns {
            if col.column_key == "PRI" {
                info.primary_keys.insert(col.column_name.clone());
            }
            info.columns.insert(
                col.column_name,
                (normalize_mysql_type(&col.data_type), col.is_nullable == "YES"),
            );
        }

        let fks: Vec<ForeignKeyRow> = diesel::sql_query(
            "SELECT column_name, referenced_table_name, referenced_column_name \
             FROM information_schema.key_column_usage \
             WHERE table_schema = ? AND table_name = ? AND referenced_table_name IS NOT NULL",
        )
        .bind::<Text, _>(database)
        .bind::<Text, _>(&table.name)
        .load(conn)
        .wrap_err_with(|| format!("Failed to get foreign keys for table {}", table.name))?;
        for fk in fks {
            info.foreign_keys.insert((
                fk.column_name,
                fk.referenced_table_name,
                fk.referenced_column_name,
            ));
        }

        let rows: Vec<IndexRow> = diesel::sql_query(
            "SELECT index_name, column_name, non_unique FROM information_schema.statistics \
             WHERE table_schema = ? AND table_name = ? AND index_name != 'PRIMARY' \
             ORDER BY index_name, seq_in_index",
        )
        .bind::<Text, _>(database)
        .bind::<Text, _>(&table.name)
        .load(conn)
        .wrap_err_with(|| format!("Failed to get indexes for table {}", table.name))?;

        let mut by_name: BTreeMap<String, (bool, Vec<String>)> = BTreeMap::new();
        for row in rows {
            by_name
                .entry(row.index_name)
                .or_insert_with(|| (row.non_unique == 0, Vec::new()))
                .1
                .push(row.column_name);
        }
        for (unique, columns) in by_name.into_values() {
            if unique {
                info.unique_constraints.insert(columns);
            } else {
                info.indexes.insert(columns);
            }
        }

        schema.tables.insert(table.name, info);
    }

    Ok(schema)
}

fn normalize_sqlite_type(sqlite_type: &str) -> String {
    let upper = sqlite_type.to_uppercase();
    let normalized: &str = if upper.contains("INT") {
        "integer"
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        "real"
    } else if upper.contains("BLOB") {
        "blob"
    } else {
        "text"
    };
    normalized.to_string()
}

fn normalize_mysql_type(mysql_type: &str) -> String {
    let normalized: &str = match mysql_type.to_uppercase().as_str() {
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => "integer",
        "DECIMAL" | "NUMERIC" | "FLOAT" | "DOUBLE" | "REAL" => "real",
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => "blob",
        _ => "text",
    };
    normalized.to_string()
}

/// Compare schemas and fail on the first mismatch
fn compare_schemas(sqlite: &Schema, mysql: &Schema) -> Result<()> {
    let sqlite_tables: BTreeSet<&String> = sqlite.tables.keys().collect();
    let mysql_tables: BTreeSet<&String> = mysql.tables.keys().collect();
    if sqlite_tables != mysql_tables {
        return Err(eyre!(
            "Schema parity check FAILED: tables only in SQLite {:?}, only in MySQL {:?}",
            sqlite_tables.difference(&mysql_tables).collect::<Vec<_>>(),
            mysql_tables.difference(&sqlite_tables).collect::<Vec<_>>()
        ));
    }

    for (name, sqlite_table) in &sqlite.tables {
        let Some(mysql_table) = mysql.tables.get(name) else {
            continue;
        };

        if sqlite_table.columns != mysql_table.columns {
            return Err(eyre!(
                "Schema parity check FAILED: columns differ in table '{name}'\n  SQLite: {:?}\n  MySQL: {:?}",
                sqlite_table.columns,
                mysql_table.columns
            ));
        }
        if sqlite_table.primary_keys != mysql_table.primary_keys {
            return Err(eyre!(
                "Schema parity check FAILED: primary keys differ in table '{name}'"
            ));
        }
        if sqlite_table.foreign_keys != mysql_table.foreign_keys {
            return Err(eyre!(
                "Schema parity check FAILED: foreign keys differ in table '{name}'\n  SQLite: {:?}\n  MySQL: {:?}",
                sqlite_table.foreign_keys,
                mysql_table.foreign_keys
            ));
        }
        if sqlite_table.unique_constraints != mysql_table.unique_constraints {
            return Err(eyre!(
                "Schema parity check FAILED: unique constraints differ in table '{name}'\n  SQLite: {:?}\n  MySQL: {:?}",
                sqlite_table.unique_constraints,
                mysql_table.unique_constraints
            ));
        }

        if let Some(missing) = sqlite_table
            .indexes
            .difference(&mysql_table.indexes)
            .next()
        {
            return Err(eyre!(
                "Schema parity check FAILED: index on {missing:?} missing in MySQL table '{name}'"
            ));
        }
        let fk_columns: BTreeSet<&String> =
            mysql_table.foreign_keys.iter().map(|fk| &fk.0).collect();
        for extra in mysql_table.indexes.difference(&sqlite_table.indexes) {
            let is_fk_index: bool = extra.len() == 1 && fk_columns.contains(&extra[0]);
            if !is_fk_index {
                return Err(eyre!(
                    "Schema parity check FAILED: unexpected index on {extra:?} in MySQL table '{name}'"
                ));
            }
        }
    }

    Ok(())
}

/// An extension trait for `duct::Expression` that logs the command being run
/// before running it.
trait ExpressionExt {
    /// Run the command and log the command being run
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}
