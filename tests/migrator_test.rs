use confmig::codec::{DocumentCodec, TomlCodec};
use confmig::document::{Block, Category};
use confmig::rules::helpers::replace;
use confmig::rules::{
    Decline, MigrationContext, MigrationOutcome, Registry, Replacement, Rule, SchemaVersion,
};
use confmig::{Migrator, apply_migrations};
use std::sync::Arc;

fn builtin() -> Migrator {
    Migrator::new(Arc::new(Registry::with_builtin()))
}

fn plugin_names(output: &[u8]) -> Vec<String> {
    TomlCodec::new()
        .parse(output)
        .expect("Failed to parse migrated output")
        .blocks()
        .map(Block::plugin_name)
        .collect()
}

const UP_TO_DATE: &str = r#"[agent]
  interval = "10s"

# Read metrics about cpu usage
[[inputs.cpu]]
  percpu = true

[[inputs.diskio]]

[[outputs.influxdb]]
  urls = ["http://localhost:8086"]
"#;

#[test]
fn test_up_to_date_document_is_returned_verbatim() {
    let result = builtin().migrate(UP_TO_DATE.as_bytes()).unwrap();

    assert_eq!(result.applied, 0);
    assert_eq!(result.output, UP_TO_DATE.as_bytes());
    assert!(result.report.is_empty());
}

#[test]
fn test_string_valued_string_to_number_is_left_alone() {
    let input = "[[outputs.wavefront]]\n  string_to_number = \"test_key\"\n";
    let (output, applied) = apply_migrations(input.as_bytes()).unwrap();

    assert_eq!(applied, 0);
    assert_eq!(output, input.as_bytes());
}

#[test]
fn test_declined_rule_is_reported() {
    let input = "[[outputs.wavefront]]\n  string_to_number = \"test_key\"\n";
    let result = builtin().migrate(input.as_bytes()).unwrap();

    assert_eq!(result.report.declined.len(), 1);
    let declined = &result.report.declined[0];
    assert_eq!(declined.rule, "string_to_number");
    assert_eq!(declined.plugin, "outputs.wavefront");
    assert_eq!(declined.line, 1);
}

const SPLIT: &str = r#"[agent]
  interval = "10s"

[[inputs.cpu]]
  percpu = true

[[outputs.wavefront]]
  url = "https://wavefront.example.com"
  [outputs.wavefront.string_to_number.status]
    up = 1
    down = 0

# end of file
"#;

#[test]
fn test_split_places_successors_where_the_block_was() {
    let result = builtin().migrate(SPLIT.as_bytes()).unwrap();
    assert_eq!(result.applied, 1);

    assert_eq!(
        plugin_names(&result.output),
        vec!["inputs.cpu", "outputs.wavefront", "processors.enum"]
    );

    // everything before the migrated block is untouched
    let text = String::from_utf8(result.output.clone()).unwrap();
    let prefix = &SPLIT[..SPLIT.find("[[outputs.wavefront]]").unwrap()];
    assert!(text.starts_with(prefix));
    assert!(text.ends_with("\n# end of file\n"));
    assert!(!text.contains("string_to_number"));

    let applied = &result.report.applied[0];
    assert_eq!(applied.plugin, "outputs.wavefront");
    assert_eq!(applied.successors, vec!["outputs.wavefront", "processors.enum"]);
}

#[test]
fn test_migration_is_idempotent() {
    let migrator = builtin();
    let first = migrator.migrate(SPLIT.as_bytes()).unwrap();
    let second = migrator.migrate(&first.output).unwrap();

    assert_eq!(second.applied, 0);
    assert_eq!(second.output, first.output);
}

#[test]
fn test_relative_order_of_blocks_is_kept() {
    let input = "[[inputs.io]]\n\n[[inputs.cpu]]\n\n[[inputs.tcp_listener]]\n  service_address = \":8094\"\n\n[[inputs.mem]]\n";
    let result = builtin().migrate(input.as_bytes()).unwrap();

    assert_eq!(result.applied, 2);
    assert_eq!(
        plugin_names(&result.output),
        vec!["inputs.diskio", "inputs.cpu", "inputs.socket_listener", "inputs.mem"]
    );
}

#[test]
fn test_malformed_input_aborts() {
    let err = builtin().migrate(b"[[inputs.io]\n").unwrap_err();
    assert!(matches!(err, confmig::MigrateError::Parse { .. }));
}

#[test]
fn test_merge_absorbs_sibling_and_counts_once() {
    let input = r#"[[aggregators.basicstats]]
  period = "10s"
  stats = ["count"]

[[inputs.cpu]]

[[aggregators.minmax]]
  period = "10s"
"#;
    let result = builtin().migrate(input.as_bytes()).unwrap();

    assert_eq!(result.applied, 1);
    assert_eq!(
        plugin_names(&result.output),
        vec!["inputs.cpu", "aggregators.basicstats"]
    );
    assert_eq!(result.report.applied[0].absorbed, vec!["aggregators.basicstats"]);

    // the absorbed block does not leave a blank line at the top
    assert!(result.output.starts_with(b"[[inputs.cpu]]\n"));
}

const DECLINED_IN_BETWEEN: &str = r#"[[inputs.io]]

[[inputs.tcp_listener]]
  service_address = ":8094"
  allowed_pending_messages = 10000

[[outputs.influxdb]]
  url = "http://localhost:8086"
"#;

#[test]
fn test_declined_block_is_kept_verbatim_next_to_migrated_ones() {
    let result = builtin().migrate(DECLINED_IN_BETWEEN.as_bytes()).unwrap();
    assert_eq!(result.applied, 2);

    let text = String::from_utf8(result.output).unwrap();
    let declined = "[[inputs.tcp_listener]]\n  service_address = \":8094\"\n  allowed_pending_messages = 10000\n";
    assert!(text.contains(declined), "declined block changed:\n{}", text);
    assert_eq!(result.report.declined[0].plugin, "inputs.tcp_listener");
    assert_eq!(
        plugin_names(text.as_bytes()),
        vec!["inputs.diskio", "inputs.tcp_listener", "outputs.influxdb"]
    );
}

#[test]
fn test_merge_and_rename_are_idempotent() {
    let migrator = builtin();
    for input in [
        include_str!("testcases/aggregators_minmax/merge/telegraf.conf"),
        include_str!("testcases/inputs_httpjson/headers/telegraf.conf"),
    ] {
        let first = migrator.migrate(input.as_bytes()).unwrap();
        assert_eq!(first.applied, 1);

        let second = migrator.migrate(&first.output).unwrap();
        assert_eq!(second.applied, 0);
        assert_eq!(second.output, first.output);
    }
}

const SPREAD: &str = r#"[[inputs.httpjson]]
  servers = ["http://a"]

[[inputs.cpu]]

[inputs.httpjson.headers]
  X = "y"
"#;

#[test]
fn test_plugin_with_a_detached_sub_table_is_not_migrated() {
    let result = builtin().migrate(SPREAD.as_bytes()).unwrap();

    assert_eq!(result.applied, 0);
    assert_eq!(result.output, SPREAD.as_bytes());
    let declined = &result.report.declined[0];
    assert_eq!(declined.plugin, "inputs.httpjson");
    assert!(declined.reason.contains("spread over the document"));
}

#[test]
fn test_fragmented_block_is_not_absorbed() {
    let input = r#"[[aggregators.basicstats]]
  period = "10s"

[[inputs.cpu]]

[aggregators.basicstats.tagpass]
  cpu = ["cpu0"]

[[aggregators.minmax]]
  period = "10s"
  [aggregators.minmax.tagpass]
    cpu = ["cpu0"]
"#;
    let result = builtin().migrate(input.as_bytes()).unwrap();

    assert_eq!(result.applied, 0);
    assert_eq!(result.output, input.as_bytes());
    assert!(result.report.declined[0].reason.contains("cannot absorb"));
}

#[test]
fn test_plugins_under_a_bare_section_pass_through() {
    let input = b"[inputs]\n  io = [{ devices = [\"sda\"] }]\n";
    let result = builtin().migrate(input).unwrap();

    assert_eq!(result.applied, 0);
    assert_eq!(result.output, input);
}

#[test]
fn test_crlf_input_keeps_crlf_line_endings() {
    let input = "[[inputs.io]]\r\n  devices = [\"sda\"]\r\n\r\n[[inputs.cpu]]\r\n";
    let result = builtin().migrate(input.as_bytes()).unwrap();
    assert_eq!(result.applied, 1);

    let text = String::from_utf8(result.output).unwrap();
    assert!(text.starts_with("[[inputs.diskio]]\r\n"));
    assert!(!text.replace("\r\n", "").contains('\n'), "mixed line endings: {:?}", text);
}

// Rules used to exercise the executor itself

fn keep(_block: &Block, _ctx: &MigrationContext<'_>) -> Result<MigrationOutcome, Decline> {
    Ok(MigrationOutcome::Unchanged)
}

fn to_new(block: &Block, _ctx: &MigrationContext<'_>) -> Result<MigrationOutcome, Decline> {
    Ok(replace(block.successor("new")))
}

fn absorb_self(block: &Block, ctx: &MigrationContext<'_>) -> Result<MigrationOutcome, Decline> {
    Ok(Replacement::single(block.successor("new"))
        .absorb(ctx.current_id())
        .into())
}

fn absorb_first(block: &Block, _ctx: &MigrationContext<'_>) -> Result<MigrationOutcome, Decline> {
    Ok(Replacement::single(block.successor("merged")).absorb(0).into())
}

fn drop_block(_block: &Block, _ctx: &MigrationContext<'_>) -> Result<MigrationOutcome, Decline> {
    Ok(Replacement::new(Vec::new()).into())
}

fn migrator_with(rules: &[(&str, Rule)]) -> Migrator {
    let mut registry = Registry::new();
    for (type_name, rule) in rules {
        registry.register(Category::Input, type_name, *rule);
    }
    Migrator::new(Arc::new(registry))
}

#[test]
fn test_unchanged_falls_through_to_next_candidate() {
    let migrator = migrator_with(&[("old", Rule::new("keep", keep)), ("old", Rule::new("to_new", to_new))]);
    let result = migrator.migrate(b"[[inputs.old]]\n  a = 1\n").unwrap();

    assert_eq!(result.applied, 1);
    assert_eq!(plugin_names(&result.output), vec!["inputs.new"]);
    assert_eq!(result.report.applied[0].rule, "to_new");
}

#[test]
fn test_first_replacement_wins() {
    let migrator = migrator_with(&[
        ("old", Rule::new("to_new", to_new)),
        ("old", Rule::new("drop", drop_block)),
    ]);
    let result = migrator.migrate(b"[[inputs.old]]\n").unwrap();

    assert_eq!(result.applied, 1);
    assert_eq!(plugin_names(&result.output), vec!["inputs.new"]);
}

#[test]
fn test_block_can_be_replaced_by_nothing() {
    let migrator = migrator_with(&[("old", Rule::new("drop", drop_block))]);
    let result = migrator.migrate(b"[[inputs.cpu]]\n\n[[inputs.old]]\n").unwrap();

    assert_eq!(result.applied, 1);
    assert_eq!(plugin_names(&result.output), vec!["inputs.cpu"]);
}

#[test]
fn test_absorbing_itself_is_not_applicable() {
    let migrator = migrator_with(&[("old", Rule::new("absorb_self", absorb_self))]);
    let input = b"[[inputs.old]]\n";
    let result = migrator.migrate(input).unwrap();

    assert_eq!(result.applied, 0);
    assert_eq!(result.output, input);
    assert_eq!(result.report.declined.len(), 1);
}

#[test]
fn test_absorbing_a_replaced_block_is_not_applicable() {
    let migrator = migrator_with(&[
        ("old", Rule::new("to_new", to_new)),
        ("other", Rule::new("absorb_first", absorb_first)),
    ]);
    let result = migrator.migrate(b"[[inputs.old]]\n\n[[inputs.other]]\n").unwrap();

    assert_eq!(result.applied, 1);
    assert_eq!(plugin_names(&result.output), vec!["inputs.new", "inputs.other"]);
    assert_eq!(result.report.declined[0].rule, "absorb_first");
}

#[test]
fn test_rules_newer_than_target_are_skipped() {
    let rule = Rule::new("to_new", to_new).since(SchemaVersion::new(1, 30, 0));
    let input = b"[[inputs.old]]\n";

    let older = migrator_with(&[("old", rule)]).with_target_version(SchemaVersion::new(1, 20, 0));
    assert_eq!(older.migrate(input).unwrap().applied, 0);

    let newer = migrator_with(&[("old", rule)]).with_target_version(SchemaVersion::new(1, 30, 0));
    assert_eq!(newer.migrate(input).unwrap().applied, 1);
}

#[test]
fn test_unknown_plugin_types_pass_through() {
    let input = b"[[inputs.does_not_exist]]\n  foo = \"bar\"\n";
    let result = builtin().migrate(input).unwrap();

    assert_eq!(result.applied, 0);
    assert_eq!(result.output, input);
}

#[test]
fn test_report_serializes_to_json() {
    let result = builtin().migrate(b"[[inputs.io]]\n").unwrap();
    let json = serde_json::to_value(&result.report).unwrap();

    assert_eq!(json["applied"][0]["rule"], "rename_to_diskio");
    assert_eq!(json["applied"][0]["successors"][0], "inputs.diskio");
}
