//! End-to-end apply/revert lifecycle through the public API.

use dep_migrate::{
    ColumnDef, MemoryDriver, Migration, MigrationOptions, Phase, ScriptDriver, TableUnit,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn blog_units<D: dep_migrate::SchemaDriver + 'static>() -> Vec<TableUnit<D>> {
    vec![
        TableUnit::new("users", |m: &mut Migration<D>| {
            m.create_table(
                "users",
                &[
                    ColumnDef::new("id", "bigint").not_null(),
                    ColumnDef::new("email", "text").not_null(),
                ],
                None,
            )?;
            m.add_primary_key("users", &cols(&["id"]))?;
            m.create_index("users", &cols(&["email"]), true)
        }),
        TableUnit::new("posts", |m: &mut Migration<D>| {
            m.create_table(
                "posts",
                &[
                    ColumnDef::new("id", "bigint").not_null(),
                    ColumnDef::new("user_id", "bigint").not_null(),
                    ColumnDef::new("title", "text").not_null(),
                ],
                None,
            )?;
            m.add_primary_key("posts", &cols(&["id"]))?;
            m.add_foreign_key(
                "posts",
                &cols(&["user_id"]),
                "users",
                &cols(&["id"]),
                Some("CASCADE"),
                None,
            )
        }),
        TableUnit::new("comments", |m: &mut Migration<D>| {
            m.create_table(
                "comments",
                &[
                    ColumnDef::new("id", "bigint").not_null(),
                    ColumnDef::new("post_id", "bigint").not_null(),
                    ColumnDef::new("body", "text").not_null(),
                ],
                None,
            )?;
            m.add_primary_key("comments", &cols(&["id"]))?;
            m.add_foreign_key(
                "comments",
                &cols(&["post_id"]),
                "posts",
                &cols(&["id"]),
                Some("CASCADE"),
                None,
            )
        }),
    ]
}

#[test]
fn full_lifecycle_over_memory_driver() {
    init_tracing();
    let mut migration = Migration::new(MemoryDriver::new(), blog_units()).unwrap();
    assert_eq!(migration.phase(), Phase::NotStarted);

    let up = migration.up().unwrap();
    assert_eq!(up.direction, "up");
    assert_eq!(up.table_order, vec!["users", "posts", "comments"]);
    assert!(migration.driver().has_table("comments"));

    let down = migration.down().unwrap();
    assert_eq!(down.direction, "down");
    assert_eq!(down.table_order, vec!["comments", "posts", "users"]);
    assert_eq!(migration.phase(), Phase::Downed);
    assert!(!migration.driver().has_table("users"));
}

#[test]
fn apply_pass_renders_reviewable_script() {
    let options = MigrationOptions::from_yaml("table_options: WITH (fillfactor = 90)").unwrap();
    let mut migration = Migration::new(ScriptDriver::new(), blog_units())
        .unwrap()
        .with_options(options)
        .unwrap();
    migration.up().unwrap();

    let script = migration.into_driver().script();
    let create_users = script.find("CREATE TABLE \"users\"").unwrap();
    let create_posts = script.find("CREATE TABLE \"posts\"").unwrap();
    let fk_posts = script.find("\"posts_user_id_fkey\"").unwrap();

    // Referenced tables are created before the constraints that need them.
    assert!(create_users < fk_posts);
    assert!(create_posts < fk_posts);
    assert!(script.contains("WITH (fillfactor = 90)"));
    assert!(script.contains("CREATE UNIQUE INDEX \"users_email_idx\""));
}

#[test]
fn revert_pass_scripts_drops_in_dependency_order() {
    // Revert against a previously applied schema: seed the virtual
    // catalog instead of running up() first.
    let driver = ScriptDriver::new()
        .with_table("users")
        .with_table("posts")
        .with_table("comments")
        .with_foreign_key("posts", "users")
        .with_foreign_key("comments", "posts");

    let mut migration = Migration::new(driver, blog_units()).unwrap();
    migration.down().unwrap();

    let script = migration.into_driver().script();
    assert_eq!(
        script,
        "DROP TABLE \"comments\";\nDROP TABLE \"posts\";\nDROP TABLE \"users\";\n"
    );
}

#[test]
fn teardown_survives_partially_applied_schema() {
    // Only users exists; posts and comments were never created.
    let driver = MemoryDriver::new().with_table("users");
    let mut migration = Migration::new(driver, blog_units()).unwrap();

    migration.down().unwrap();
    assert_eq!(migration.drop_order(), &["users"]);
    assert!(migration.is_deleted("posts"));
    assert!(migration.is_deleted("comments"));
}
