//! Built-in probe groups.
//!
//! All data is static or derived deterministically from the case index, so a
//! given group always yields the same sequence and reports stay comparable
//! across runs.

use crate::errors::ConfigError;
use crate::model::{ExpectedBehavior, TestCase};

use ExpectedBehavior::{Blocked, Error, SafeExecution, Success};

/// Selects every group, in catalog order.
pub const PRESET_ALL: &str = "all";
/// Smoke subset: basic, create, insert, select, cleanup.
pub const PRESET_QUICK: &str = "quick";
const QUICK_GROUPS: &[&str] = &["basic", "create", "insert", "select", "cleanup"];

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: String,
    pub title: String,
    pub cases: Vec<TestCase>,
    /// Cases from this index on run with at least `min_concurrency` workers;
    /// the ones before it run alone first.
    pub setup_len: usize,
    pub min_concurrency: Option<usize>,
}

/// A contiguous slice of the selection that shares one dispatch width.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub cases: Vec<TestCase>,
    pub min_concurrency: Option<usize>,
}

impl Batch {
    pub fn concurrency(&self, requested: usize) -> usize {
        self.min_concurrency.map_or(requested, |floor| requested.max(floor))
    }
}

impl Group {
    /// Tags every case with this group and fills in `category` where the case has none.
    pub fn new(key: &str, title: &str, category: &str, cases: Vec<TestCase>) -> Self {
        let cases = cases
            .into_iter()
            .map(|mut tc| {
                tc.group = Some(key.to_string());
                if tc.category.is_none() {
                    tc.category = Some(category.to_string());
                }
                tc
            })
            .collect();
        Self {
            key: key.to_string(),
            title: title.to_string(),
            cases,
            setup_len: 0,
            min_concurrency: None,
        }
    }

    /// Runs everything after the first `setup_len` cases on at least `workers` workers.
    pub fn concurrent_after(mut self, setup_len: usize, workers: usize) -> Self {
        self.setup_len = setup_len.min(self.cases.len());
        self.min_concurrency = Some(workers);
        self
    }

    fn batches(&self) -> Vec<Batch> {
        match self.min_concurrency {
            None => vec![Batch {
                cases: self.cases.clone(),
                min_concurrency: None,
            }],
            Some(floor) => {
                let (setup, body) = self.cases.split_at(self.setup_len);
                let mut out = Vec::with_capacity(2);
                if !setup.is_empty() {
                    out.push(Batch {
                        cases: setup.to_vec(),
                        min_concurrency: None,
                    });
                }
                out.push(Batch {
                    cases: body.to_vec(),
                    min_concurrency: Some(floor),
                });
                out
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    groups: Vec<Group>,
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            groups: vec![
                basic_commands(),
                table_creation(),
                data_insertion(),
                data_selection(),
                joins(),
                data_updates(),
                data_deletion(),
                index_queries(),
                explain_and_describe(),
                injection_attempts(),
                malformed_sql(),
                boundary_values(),
                concurrency_probes(),
                http_api(),
                cleanup(),
                security_probes(),
                performance(),
            ],
        }
    }

    /// Appends a group after the built-in ones. A group with an existing key replaces it.
    pub fn with_group(mut self, group: Group) -> Self {
        if let Some(existing) = self.groups.iter_mut().find(|g| g.key == group.key) {
            *existing = group;
        } else {
            self.groups.push(group);
        }
        self
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, key: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn all_cases(&self) -> Vec<TestCase> {
        self.groups.iter().flat_map(|g| g.cases.iter().cloned()).collect()
    }

    /// Resolves group keys (or the `all` / `quick` presets) into one ordered case list.
    ///
    /// Groups are emitted in the order requested; an empty selection means `all`.
    pub fn cases_for(&self, keys: &[String]) -> Result<Vec<TestCase>, ConfigError> {
        Ok(self
            .resolve(keys)?
            .into_iter()
            .flat_map(|g| g.cases.iter().cloned())
            .collect())
    }

    /// Same selection as [`Catalog::cases_for`], cut where the dispatch width changes.
    ///
    /// Neighbouring groups without a concurrency floor share one batch.
    pub fn batches_for(&self, keys: &[String]) -> Result<Vec<Batch>, ConfigError> {
        let mut out: Vec<Batch> = Vec::new();
        for g in self.resolve(keys)? {
            for b in g.batches() {
                if b.cases.is_empty() {
                    continue;
                }
                let merge = b.min_concurrency.is_none()
                    && out.last().is_some_and(|last| last.min_concurrency.is_none());
                if !merge {
                    out.push(b);
                } else if let Some(last) = out.last_mut() {
                    last.cases.extend(b.cases);
                }
            }
        }
        Ok(out)
    }

    fn resolve(&self, keys: &[String]) -> Result<Vec<&Group>, ConfigError> {
        if keys.is_empty() || keys.iter().any(|k| k == PRESET_ALL) {
            return Ok(self.groups.iter().collect());
        }

        let mut out = Vec::new();
        for key in keys {
            if key == PRESET_QUICK {
                out.extend(QUICK_GROUPS.iter().filter_map(|q| self.group(q)));
                continue;
            }
            let g = self.group(key).ok_or_else(|| {
                let known: Vec<&str> = self.groups.iter().map(|g| g.key.as_str()).collect();
                ConfigError(format!(
                    "unknown test group '{}' (known: {}, {}, {})",
                    key,
                    known.join(", "),
                    PRESET_ALL,
                    PRESET_QUICK
                ))
            })?;
            out.push(g);
        }
        Ok(out)
    }
}

fn case(name: &str, sql: &str, expected: ExpectedBehavior) -> TestCase {
    TestCase::new(name, sql, expected)
}

/// Deterministic stand-in for random test data.
fn spread(i: usize, modulus: usize) -> usize {
    (i.wrapping_mul(7919).wrapping_add(13)) % modulus
}

fn basic_commands() -> Group {
    Group::new(
        "basic",
        "Basic commands",
        "COMMAND",
        vec![
            case("help", "HELP;", Success),
            case("show tables", "SHOW TABLES;", Success),
            case("show tables without semicolon", "SHOW TABLES", Success),
            case("help without semicolon", "HELP", Success),
        ],
    )
}

fn table_creation() -> Group {
    Group::new(
        "create",
        "Table creation",
        "DDL",
        vec![
            case(
                "create simple table",
                "CREATE TABLE simple_table (id INTEGER, name CHAR);",
                Success,
            ),
            case(
                "create complex table",
                "CREATE TABLE complex_table (id INTEGER, name CHAR, age INTEGER, salary FLOAT, score DOUBLE, active CHAR);",
                Success,
            ),
            case(
                "create test_table1",
                "CREATE TABLE test_table1 (student_id INTEGER, student_name CHAR, grade FLOAT);",
                Success,
            ),
            case(
                "create test_table2",
                "CREATE TABLE test_table2 (course_id INTEGER, course_name CHAR, credits INTEGER);",
                Success,
            ),
            case("empty table name", "CREATE TABLE () (id INTEGER);", Error),
            case(
                "overlong table name",
                &format!("CREATE TABLE {} (id INTEGER);", "a".repeat(100)),
                Error,
            )
            .describe("identifier far beyond any sane length limit"),
            case("duplicate table name", "CREATE TABLE simple_table (id INTEGER);", Error),
            case("no column definitions", "CREATE TABLE empty_table ();", Error),
            case(
                "invalid column type",
                "CREATE TABLE invalid_table (id INVALID_TYPE);",
                Error,
            ),
        ],
    )
}

fn data_insertion() -> Group {
    let bulk: Vec<String> = (0..100)
        .map(|i| {
            let grade = 60.0 + spread(i, 4000) as f64 / 100.0;
            format!("({}, 'Student{}', {:.2})", i + 100, i, grade)
        })
        .collect();

    Group::new(
        "insert",
        "Data insertion",
        "INSERT",
        vec![
            case("insert simple row", r#"INSERT INTO simple_table VALUES (1, "Alice");"#, Success),
            case(
                "insert complex row",
                r#"INSERT INTO complex_table VALUES (1, "John Doe", 25, 50000.5, 95.7, "Y");"#,
                Success,
            ),
            case(
                "insert multiple rows",
                r#"INSERT INTO test_table1 VALUES (1, "Student1", 85.5), (2, "Student2", 92.0);"#,
                Success,
            ),
            case(
                "insert with column list",
                r#"INSERT INTO simple_table (id, name) VALUES (2, "Bob");"#,
                Success,
            ),
            case(
                "insert overlong string",
                &format!(r#"INSERT INTO simple_table VALUES (3, "{}");"#, "x".repeat(100)),
                Error,
            ),
            case("insert type mismatch", r#"INSERT INTO simple_table VALUES ("abc", 123);"#, Error),
            case("insert column count mismatch", "INSERT INTO simple_table VALUES (4);", Error),
            case("insert empty string", r#"INSERT INTO simple_table VALUES (5, "");"#, Success),
            case(
                "insert into missing table",
                r#"INSERT INTO non_existent VALUES (1, "test");"#,
                Error,
            ),
            case(
                "bulk insert 100 rows",
                &format!("INSERT INTO test_table1 VALUES {};", bulk.join(", ")),
                Success,
            ),
        ],
    )
}

fn data_selection() -> Group {
    Group::new(
        "select",
        "Data selection",
        "SELECT",
        vec![
            case("select all", "SELECT * FROM simple_table;", Success),
            case("select columns", "SELECT id, name FROM simple_table;", Success),
            case("select where equal", "SELECT * FROM simple_table WHERE id = 1;", Success),
            case("select range", "SELECT * FROM test_table1 WHERE grade > 90;", Success),
            case(
                "select string match",
                r#"SELECT * FROM simple_table WHERE name = "Alice";"#,
                Success,
            ),
            case(
                "select multiple conditions",
                "SELECT * FROM test_table1 WHERE student_id > 50 AND grade < 90;",
                Success,
            ),
            case("select order by", "SELECT * FROM test_table1 ORDER BY grade DESC;", Success),
            case("select limit", "SELECT * FROM test_table1 LIMIT 5;", Success),
            case("count", "SELECT COUNT(*) FROM test_table1;", Success),
            case("sum", "SELECT SUM(grade) FROM test_table1;", Success),
            case("avg", "SELECT AVG(grade) FROM test_table1;", Success),
            case("max", "SELECT MAX(grade) FROM test_table1;", Success),
            case("min", "SELECT MIN(grade) FROM test_table1;", Success),
        ],
    )
}

fn joins() -> Group {
    Group::new(
        "join",
        "Join queries",
        "SELECT",
        vec![
            case(
                "join setup mathematics",
                "INSERT INTO test_table2 VALUES (1, 'Mathematics', 4);",
                Success,
            )
            .with_category("INSERT"),
            case("join setup physics", "INSERT INTO test_table2 VALUES (2, 'Physics', 3);", Success)
                .with_category("INSERT"),
            case(
                "join setup chemistry",
                "INSERT INTO test_table2 VALUES (3, 'Chemistry', 3);",
                Success,
            )
            .with_category("INSERT"),
            case(
                "inner join",
                "SELECT t1.student_name, t2.course_name FROM test_table1 t1 JOIN test_table2 t2 ON t1.student_id = t2.course_id;",
                Success,
            ),
            case(
                "left join",
                "SELECT t1.student_name, t2.course_name FROM test_table1 t1 LEFT JOIN test_table2 t2 ON t1.student_id = t2.course_id;",
                Success,
            ),
        ],
    )
}

fn data_updates() -> Group {
    Group::new(
        "update",
        "Data updates",
        "UPDATE",
        vec![
            case(
                "update single row",
                "UPDATE simple_table SET name = 'Updated Alice' WHERE id = 1;",
                Success,
            ),
            case(
                "update batch",
                "UPDATE test_table1 SET grade = grade + 5 WHERE grade < 80;",
                Success,
            ),
            case("update all rows", "UPDATE simple_table SET name = 'Everyone';", Success),
            case(
                "update conditional",
                "UPDATE test_table1 SET student_name = 'Top Student' WHERE grade > 95;",
                Success,
            ),
            case("update missing table", r#"UPDATE non_existent SET col = "value";"#, Error),
            case(
                "update missing column",
                r#"UPDATE simple_table SET non_existent = "value";"#,
                Error,
            ),
            case(
                "update type mismatch",
                r#"UPDATE simple_table SET id = "not_a_number";"#,
                Error,
            ),
        ],
    )
}

fn data_deletion() -> Group {
    Group::new(
        "delete",
        "Data deletion",
        "DELETE",
        vec![
            case("delete conditional", "DELETE FROM test_table1 WHERE grade < 70;", Success),
            case("delete single row", "DELETE FROM simple_table WHERE id = 2;", Success),
            case("delete range", "DELETE FROM test_table1 WHERE student_id > 150;", Success),
            case("delete missing table", "DELETE FROM non_existent WHERE id = 1;", Error),
            case(
                "delete invalid where",
                "DELETE FROM simple_table WHERE non_existent = 1;",
                Error,
            ),
        ],
    )
}

fn index_queries() -> Group {
    Group::new(
        "index",
        "Index-backed queries",
        "INDEX_QUERY",
        vec![
            case("index point lookup", "SELECT * FROM test_table1 WHERE student_id = 1;", Success),
            case("index range scan", "SELECT * FROM test_table1 WHERE student_id > 50;", Success),
            case(
                "index with extra predicate",
                "SELECT * FROM test_table1 WHERE student_id = 1 AND grade > 80;",
                Success,
            ),
        ],
    )
}

fn explain_and_describe() -> Group {
    let mut cases = vec![
        case("explain simple", "EXPLAIN SELECT * FROM simple_table;", Success),
        case(
            "explain filtered sort",
            "EXPLAIN SELECT * FROM test_table1 WHERE grade > 85 ORDER BY student_id;",
            Success,
        ),
        case(
            "explain join",
            "EXPLAIN SELECT t1.*, t2.* FROM test_table1 t1 JOIN test_table2 t2 ON t1.student_id = t2.course_id;",
            Success,
        ),
    ];
    for table in ["simple_table", "complex_table", "test_table1", "test_table2"] {
        cases.push(case(&format!("describe {}", table), &format!("DESCRIBE {};", table), Success));
        cases.push(case(&format!("desc {}", table), &format!("DESC {};", table), Success));
    }
    Group::new("explain", "Explain and describe", "EXPLAIN", cases)
}

fn injection_attempts() -> Group {
    Group::new(
        "injection",
        "Injection attempts",
        "SECURITY",
        vec![
            case(
                "quote injection with drop",
                "SELECT * FROM simple_table WHERE name = 'Alice'; DROP TABLE simple_table; --';",
                Blocked,
            ),
            case(
                "union injection",
                "SELECT * FROM simple_table WHERE id = 1 UNION SELECT * FROM test_table1;",
                Blocked,
            ),
            case(
                "comment injection",
                "SELECT * FROM simple_table WHERE id = 1 /* comment */ AND name = 'test';",
                SafeExecution,
            ),
            case(
                "stacked delete",
                "SELECT * FROM simple_table; DELETE FROM simple_table;",
                Blocked,
            ),
        ],
    )
}

fn malformed_sql() -> Group {
    Group::new(
        "malformed",
        "Malformed SQL",
        "MALFORMED",
        vec![
            case("missing semicolon", "SELECT * FROM simple_table", Success)
                .describe("the target tolerates a missing terminator"),
            case("misspelled keyword", "SELCT * FROM simple_table;", Error),
            case("misspelled from", "SELECT * FORM simple_table;", Error),
            case("missing from", "SELECT *;", Error),
            case("empty statement", "", Error),
            case("semicolon only", ";", Error),
            case("incomplete create", "CREATE TABLE", Error),
            case("incomplete insert", "INSERT INTO", Error),
            case("incomplete select", "SELECT", Error),
            case(
                "invalid characters",
                "SELECT * FROM simple_table WHERE id = 1 @#$%^&*();",
                Error,
            ),
        ],
    )
}

fn boundary_values() -> Group {
    Group::new(
        "boundary",
        "Boundary values",
        "BOUNDARY",
        vec![
            case(
                "create boundary table",
                "CREATE TABLE boundary_test (int_col INTEGER, char_col CHAR(10), float_col FLOAT, double_col DOUBLE);",
                Success,
            )
            .with_category("DDL"),
            case(
                "max integer",
                "INSERT INTO boundary_test VALUES (2147483647, 'max', 1.0, 1.0);",
                Success,
            ),
            case(
                "min integer",
                "INSERT INTO boundary_test VALUES (-2147483648, 'min', 1.0, 1.0);",
                Success,
            ),
            case("zero values", "INSERT INTO boundary_test VALUES (0, '', 0.0, 0.0);", Success),
            case(
                "full width char",
                &format!("INSERT INTO boundary_test VALUES (1, '{}', 1.0, 1.0);", "x".repeat(10)),
                Success,
            ),
            case(
                "non-ascii characters",
                "INSERT INTO boundary_test VALUES (2, 'áéíóú', 1.0, 1.0);",
                Success,
            ),
            case(
                "large floats",
                "INSERT INTO boundary_test VALUES (3, 'big', 999999.999, 999999999.999999);",
                Success,
            ),
            case(
                "tiny floats",
                "INSERT INTO boundary_test VALUES (4, 'small', 0.000001, 0.000000000001);",
                Success,
            ),
        ],
    )
}

pub const CONCURRENT_WRITERS: usize = 5;
pub const INSERTS_PER_WRITER: usize = 20;

fn concurrency_probes() -> Group {
    let mut cases = vec![case(
        "create concurrent table",
        "CREATE TABLE concurrent_test (id INTEGER, thread_id INTEGER, timestamp CHAR(20));",
        Success,
    )
    .with_category("DDL")];

    // interleave writers so round-robin workers each get a mix of them
    for i in 0..INSERTS_PER_WRITER {
        for writer in 0..CONCURRENT_WRITERS {
            cases.push(
                case(
                    &format!("concurrent insert w{} #{}", writer, i),
                    &format!(
                        "INSERT INTO concurrent_test VALUES ({}, {}, 't{}_{}');",
                        i, writer, writer, i
                    ),
                    Success,
                )
                .describe("visible effects may interleave with other writers"),
            );
        }
    }

    Group::new("concurrency", "Concurrent inserts", "CONCURRENT_INSERT", cases)
        .concurrent_after(1, CONCURRENT_WRITERS)
}

fn http_api() -> Group {
    Group::new(
        "http",
        "HTTP encoding",
        "HTTP",
        vec![
            case(
                "url encoding",
                "SELECT * FROM simple_table WHERE name = 'Alice & Bob';",
                Success,
            ),
            case(
                "unicode like pattern",
                "SELECT * FROM simple_table WHERE name LIKE '%特殊字符%';",
                Success,
            ),
            case(
                "multi-line statements",
                "SELECT * FROM simple_table;\nSELECT COUNT(*) FROM test_table1;",
                Success,
            ),
        ],
    )
}

fn cleanup() -> Group {
    let tables = [
        "boundary_test",
        "concurrent_test",
        "simple_table",
        "complex_table",
        "test_table1",
        "test_table2",
    ];
    Group::new(
        "cleanup",
        "Cleanup",
        "DDL",
        tables
            .iter()
            .map(|t| case(&format!("drop {}", t), &format!("DROP TABLE {};", t), Success))
            .collect(),
    )
}

fn security_probes() -> Group {
    let setup = |name: &str, sql: &str| case(name, sql, Success).with_category("DDL");
    let probe = |name: &str, sql: &str, expected: ExpectedBehavior, desc: &str| {
        case(name, sql, expected).describe(desc)
    };

    Group::new(
        "security",
        "Security and leakage probes",
        "SECURITY",
        vec![
            setup(
                "security setup table",
                "CREATE TABLE security_test_users (id INTEGER, name CHAR, email CHAR, role CHAR);",
            ),
            setup(
                "security setup row 1",
                "INSERT INTO security_test_users VALUES (1, 'admin', 'admin@test.com', 'administrator');",
            ),
            setup(
                "security setup row 2",
                "INSERT INTO security_test_users VALUES (2, 'user1', 'user1@test.com', 'user');",
            ),
            setup(
                "security setup row 3",
                "INSERT INTO security_test_users VALUES (3, 'guest', 'guest@test.com', 'guest');",
            ),
            probe(
                "classic or injection",
                "SELECT * FROM users WHERE id = 1 OR 1=1;",
                Error,
                "bypass the WHERE clause with OR 1=1",
            ),
            probe(
                "union-based injection",
                "SELECT name FROM users UNION SELECT password FROM admin;",
                Error,
                "pull extra columns through UNION",
            ),
            probe(
                "comment injection",
                "SELECT * FROM users WHERE name = 'admin'--';",
                Error,
                "truncate trailing conditions with a comment",
            ),
            probe(
                "stacked queries",
                "SELECT * FROM users; DROP TABLE users;",
                Error,
                "run a second destructive statement",
            ),
            probe(
                "time-based blind injection",
                "SELECT * FROM users WHERE id = 1 AND (SELECT COUNT(*) FROM users) > 0;",
                SafeExecution,
                "subquery probe used for blind injection",
            ),
            probe(
                "special characters",
                "SELECT * FROM test WHERE name = 'test'; DELETE FROM test; --';",
                Error,
                "semicolon and delete embedded in a literal",
            ),
            probe(
                "null byte injection",
                "SELECT * FROM users WHERE name = 'admin'\\0';",
                Error,
                "escaped null byte inside a literal",
            ),
            probe(
                "function injection",
                "SELECT * FROM users WHERE id = LOAD_FILE('/etc/passwd');",
                Error,
                "call a filesystem function",
            ),
            probe(
                "hex encoding",
                "SELECT * FROM users WHERE name = 0x61646D696E;",
                SafeExecution,
                "hex-encoded literal",
            ),
            probe(
                "buffer overflow attempt",
                &format!("SELECT * FROM users WHERE name = '{}';", "A".repeat(10_000)),
                Error,
                "very long literal",
            ),
            probe(
                "information schema access",
                "SELECT * FROM information_schema.tables;",
                Error,
                "read system catalog tables",
            ),
            probe(
                "error-based disclosure",
                "SELECT * FROM non_existent_table_xyz123;",
                Error,
                "learn internals from error messages",
            ),
            probe(
                "version disclosure",
                "SELECT VERSION();",
                Error,
                "read the server version",
            ),
            probe(
                "sensitive row scan",
                "SELECT * FROM security_test_users;",
                SafeExecution,
                "table holds an 'admin' row, so a leak is reported",
            ),
            setup("security cleanup", "DROP TABLE security_test_users;"),
        ],
    )
}

const SELECT_REPEATS: usize = 5;
const INDEX_REPEATS: usize = 10;

fn performance() -> Group {
    let ddl = |name: &str, sql: &str| case(name, sql, Success).with_category("DDL");
    let mut cases = vec![
        ddl(
            "perf create small",
            "CREATE TABLE perf_small (id INTEGER, name CHAR(32), value FLOAT, category INTEGER);",
        ),
        ddl(
            "perf create medium",
            "CREATE TABLE perf_medium (id INTEGER, title CHAR(64), content CHAR(128), score DOUBLE, created_at CHAR(20));",
        ),
        ddl(
            "perf create large",
            "CREATE TABLE perf_large (student_id INTEGER, student_name CHAR(64), course_id INTEGER, course_name CHAR(64), grade FLOAT, semester CHAR(16));",
        ),
        ddl(
            "perf create index table",
            "CREATE TABLE perf_index_test (pk_id INTEGER, indexed_col INTEGER, search_field CHAR(32), data_payload CHAR(100));",
        ),
    ];

    // (label, table, total rows, batch size)
    let inserts = [
        ("small single-row insert", "perf_small", 100, 1),
        ("small batch insert", "perf_small", 1000, 50),
        ("medium batch insert", "perf_medium", 500, 25),
        ("large batch insert", "perf_large", 1000, 100),
    ];
    let mut id_offset = 1000;
    for (label, table, total, batch) in inserts {
        for (n, start) in (0..total).step_by(batch).enumerate() {
            let end = (start + batch).min(total);
            let rows: Vec<String> = (start..end).map(|i| perf_row(table, id_offset + i)).collect();
            cases.push(
                case(
                    &format!("{} #{}", label, n + 1),
                    &format!("INSERT INTO {} VALUES {};", table, rows.join(", ")),
                    Success,
                )
                .with_category("INSERT"),
            );
        }
        id_offset += total;
    }

    let selects = [
        ("scan small", "SELECT * FROM perf_small;"),
        ("filter small", "SELECT * FROM perf_small WHERE category = 5;"),
        ("aggregate small", "SELECT COUNT(*), AVG(value), MAX(value) FROM perf_small;"),
        ("scan medium", "SELECT * FROM perf_medium;"),
        ("filter medium", "SELECT * FROM perf_medium WHERE score > 80;"),
        ("sort medium", "SELECT * FROM perf_medium ORDER BY score DESC;"),
        (
            "compound filter large",
            "SELECT * FROM perf_large WHERE grade > 85 AND course_id < 50;",
        ),
        (
            "join large medium",
            "SELECT p1.student_name, p2.title FROM perf_large p1 JOIN perf_medium p2 ON p1.student_id = p2.id LIMIT 100;",
        ),
    ];
    for (label, sql) in selects {
        for n in 1..=SELECT_REPEATS {
            cases.push(case(&format!("{} #{}", label, n), sql, Success).with_category("SELECT"));
        }
    }

    let updates = [
        ("update single row", "UPDATE perf_small SET value = 999.99 WHERE id = 1001;"),
        ("update batch", "UPDATE perf_small SET category = 99 WHERE category <= 5;"),
        ("update conditional", "UPDATE perf_medium SET score = score * 1.1 WHERE score < 70;"),
        ("update full table", "UPDATE perf_small SET name = CONCAT(name, '_updated');"),
    ];
    for (label, sql) in updates {
        cases.push(case(&format!("perf {}", label), sql, Success).with_category("UPDATE"));
    }

    for (n, start) in (0..1000).step_by(100).enumerate() {
        let rows: Vec<String> = (start..start + 100).map(|i| perf_row("perf_index_test", i)).collect();
        cases.push(
            case(
                &format!("index fill #{}", n + 1),
                &format!("INSERT INTO perf_index_test VALUES {};", rows.join(", ")),
                Success,
            )
            .with_category("INSERT"),
        );
    }

    let index_queries = [
        ("index equality", "SELECT * FROM perf_index_test WHERE pk_id = 500;"),
        (
            "index between",
            "SELECT * FROM perf_index_test WHERE pk_id BETWEEN 100 AND 200;",
        ),
        (
            "non-indexed column",
            "SELECT * FROM perf_index_test WHERE search_field = 'search_050';",
        ),
        (
            "index compound",
            "SELECT * FROM perf_index_test WHERE pk_id > 500 AND indexed_col < 100;",
        ),
    ];
    for (label, sql) in index_queries {
        for n in 1..=INDEX_REPEATS {
            cases.push(case(&format!("{} #{}", label, n), sql, Success).with_category("INDEX_QUERY"));
        }
    }

    for table in ["perf_small", "perf_medium", "perf_large", "perf_index_test"] {
        cases.push(ddl(&format!("perf drop {}", table), &format!("DROP TABLE {};", table)));
    }

    Group::new("performance", "Performance benchmark", "PERFORMANCE", cases)
}

fn perf_row(table: &str, i: usize) -> String {
    const COURSES: &[&str] = &[
        "Math",
        "Physics",
        "Chemistry",
        "Biology",
        "History",
        "English",
        "Computer Science",
    ];
    const SEMESTERS: &[&str] = &["2023Fall", "2024Spring", "2024Fall"];

    match table {
        "perf_small" => format!(
            "({}, 'item_{:06}', {:.2}, {})",
            i,
            i,
            spread(i, 100_000) as f64 / 100.0,
            spread(i, 10) + 1
        ),
        "perf_medium" => format!(
            "({}, 'Title_{:06}_{:x}', 'Content_{:x}', {:.3}, '2024-01-{:02}')",
            i,
            i,
            spread(i, 1 << 20),
            spread(i + 1, 1 << 24),
            spread(i, 100_000) as f64 / 1000.0,
            (i % 28) + 1
        ),
        "perf_large" => format!(
            "({}, 'Student_{:x}', {}, '{}', {:.2}, '{}')",
            i,
            spread(i, 1 << 20),
            spread(i, 100) + 1,
            COURSES[spread(i, COURSES.len())],
            60.0 + spread(i, 4000) as f64 / 100.0,
            SEMESTERS[spread(i, SEMESTERS.len())]
        ),
        _ => format!(
            "({}, {}, 'search_{:03}', 'payload_{:x}')",
            i,
            i % 1000,
            i % 100,
            spread(i, 1 << 24)
        ),
    }
}
