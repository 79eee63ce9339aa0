use confmig::codec::{DocumentCodec, TomlCodec};
use confmig::document::builder::{BlockBuilder, DocumentBuilder};
use confmig::document::{Category, Segment};
use confmig::error::MigrateError;

const SAMPLE: &str = r#"# Global tags can be specified here
[global_tags]
  dc = "us-east-1"

[agent]
  interval = "10s"

###############################################################################
#                            INPUT PLUGINS                                    #
###############################################################################

[[inputs.cpu]]
  percpu = true
  # no per-core totals
  totalcpu = true

[[inputs.http]]
  urls = [
    "http://localhost/[[inputs.fake]]",
  ]
  body = '''
[[inputs.not_a_header]]
'''
  [inputs.http.headers]
    Accept = "application/json"

# dangling comment
"#;

#[test]
fn test_parse_then_serialize_is_byte_identical() {
    let codec = TomlCodec::new();
    let document = codec.parse(SAMPLE.as_bytes()).expect("Failed to parse sample");
    let bytes = codec.serialize(&document).expect("Failed to serialize sample");

    assert_eq!(String::from_utf8(bytes).unwrap(), SAMPLE);
}

#[test]
fn test_parse_finds_plugin_blocks_only() {
    let document = TomlCodec::new().parse(SAMPLE.as_bytes()).unwrap();
    let blocks: Vec<_> = document.blocks().collect();

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].plugin_name(), "inputs.cpu");
    assert_eq!(blocks[0].line(), 12);
    assert_eq!(blocks[0].option("totalcpu").and_then(|v| v.as_bool()), Some(true));

    // strings and arrays that look like headers stay inside the block
    assert_eq!(blocks[1].plugin_name(), "inputs.http");
    let headers = blocks[1].option("headers").and_then(|v| v.as_table()).unwrap();
    assert_eq!(headers.get("Accept").and_then(|v| v.as_str()), Some("application/json"));
    assert!(blocks[1].raw().unwrap().contains("[[inputs.not_a_header]]"));
}

#[test]
fn test_trailing_comments_belong_to_the_following_text() {
    let document = TomlCodec::new().parse(SAMPLE.as_bytes()).unwrap();

    let http = document.blocks().nth(1).unwrap();
    assert!(http.raw().unwrap().ends_with("Accept = \"application/json\"\n"));

    match document.segments().last() {
        Some(Segment::Text(text)) => assert_eq!(text, "\n# dangling comment\n"),
        other => panic!("expected trailing text, got {:?}", other),
    }
}

#[test]
fn test_legacy_single_table_header_is_a_block() {
    let input = "[inputs.mem]\n\n[[inputs.cpu]]\n  percpu = false\n";
    let document = TomlCodec::new().parse(input.as_bytes()).unwrap();
    let names: Vec<_> = document.blocks().map(|b| b.plugin_name()).collect();

    assert_eq!(names, vec!["inputs.mem", "inputs.cpu"]);
}

#[test]
fn test_empty_document() {
    let codec = TomlCodec::new();
    let document = codec.parse(b"").unwrap();

    assert_eq!(document.block_count(), 0);
    assert!(codec.serialize(&document).unwrap().is_empty());
}

#[test]
fn test_malformed_document_is_a_parse_error() {
    let input = "[[inputs.cpu]]\n  percpu = true\n  percpu = false\n";
    let err = TomlCodec::new().parse(input.as_bytes()).unwrap_err();

    match err {
        MigrateError::Parse { line, .. } => assert!(line >= 1, "line {}", line),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_invalid_utf8_is_rejected() {
    let err = TomlCodec::new().parse(&[0x5b, 0xff, 0xfe, 0x5d]).unwrap_err();
    assert!(matches!(err, MigrateError::InvalidUtf8(_)));
}

#[test]
fn test_synthesized_block_is_rendered_and_loads_again() {
    let document = DocumentBuilder::new()
        .text("# disks\n")
        .plugin(Category::Input, "diskio")
        .option("skip_serial_number", true)
        .build()
        .build();

    let codec = TomlCodec::new();
    let bytes = codec.serialize(&document).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(text, "# disks\n[[inputs.diskio]]\n  skip_serial_number = true\n");

    let reloaded = codec.parse(text.as_bytes()).unwrap();
    let block = reloaded.blocks().next().unwrap();
    assert_eq!(block.plugin_name(), "inputs.diskio");
    assert_eq!(block.options(), document.blocks().next().unwrap().options());
}

#[test]
fn test_nested_tables_render_under_the_plugin_header() {
    let mut mapping = toml::Table::new();
    mapping.insert("field".into(), "status".into());
    let mut values = toml::Table::new();
    values.insert("up".into(), toml::Value::Integer(1));
    mapping.insert("value_mappings".into(), toml::Value::Table(values));

    let block = BlockBuilder::new(Category::Processor, "enum")
        .option("mapping", vec![toml::Value::Table(mapping)])
        .build();
    let document = DocumentBuilder::new()
        .block(block.clone())
        .block(block.clone())
        .build();

    let codec = TomlCodec::new();
    let text = String::from_utf8(codec.serialize(&document).unwrap()).unwrap();
    assert!(text.contains("[[processors.enum.mapping]]"));
    assert!(text.contains("\n\n[[processors.enum]]\n"), "blocks not separated:\n{}", text);

    let reloaded = codec.parse(text.as_bytes()).unwrap();
    assert_eq!(reloaded.block_count(), 2);
    for reloaded_block in reloaded.blocks() {
        assert_eq!(reloaded_block.options(), block.options());
    }
}

const SPREAD: &str = r#"[[inputs.httpjson]]
  servers = ["http://a"]

[[inputs.cpu]]

[inputs.httpjson.headers]
  X = "y"
"#;

#[test]
fn test_sub_table_after_another_block_marks_the_plugin_fragmented() {
    let document = TomlCodec::new().parse(SPREAD.as_bytes()).unwrap();
    let blocks: Vec<_> = document.blocks().collect();

    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].is_fragmented());
    assert!(!blocks[1].is_fragmented());

    // options are taken from the whole document, headers included
    let headers = blocks[0].option("headers").and_then(|v| v.as_table()).unwrap();
    assert_eq!(headers.get("X").and_then(|v| v.as_str()), Some("y"));
}

#[test]
fn test_plugins_under_a_bare_section_are_not_blocks() {
    let input = "[inputs]\n  io = [{ devices = [\"sda\"] }]\n";
    let document = TomlCodec::new().parse(input.as_bytes()).unwrap();

    assert_eq!(document.block_count(), 0);
}

#[test]
fn test_synthesized_blocks_follow_crlf_line_endings() {
    let document = DocumentBuilder::new()
        .text("# disks\r\n")
        .plugin(Category::Input, "diskio")
        .option("skip_serial_number", true)
        .build()
        .plugin(Category::Input, "mem")
        .build()
        .build();

    let bytes = TomlCodec::new().serialize(&document).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(
        text,
        "# disks\r\n[[inputs.diskio]]\r\n  skip_serial_number = true\r\n\r\n[[inputs.mem]]\r\n"
    );
}
