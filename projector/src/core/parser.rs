//! Lenient decoder for instruction payloads.
//!
//! A payload is free text containing tag-wrapped blocks:
//!
//! ```text
//! <file action="createFile" path="src/App.tsx">
//! export default function App() {}
//! </file>
//! <step action="runCommand">npm install</step>
//! ```
//!
//! The tag name is free; the `action` attribute selects the block kind. Tags
//! without an `action` attribute are container markup. Parsing never fails:
//! blocks that cannot be decoded are dropped and the rest of the payload is
//! still returned, because the upstream generator is not always well-formed.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::{Action, Operation};

static OPEN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([A-Za-z][\w:.-]*)((?:\s[^<>]*?)?)\s*>").unwrap());

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static CLOSE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</([A-Za-z][\w:.-]*)\s*>").unwrap());

static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][\w:.-]*(?:\s[^<>]*)?/?>").unwrap());

const CREATE_FILE: &str = "createFile";
const RUN_COMMAND: &str = "runCommand";

/// Decode `payload` into operations in document order, all `Pending`.
///
/// Skipped silently: blocks with an unknown `action`, `createFile` blocks
/// without a `path`, self-closing blocks, and blocks whose closing tag never
/// appears before the next block opens (the text of an unterminated block is
/// dropped up to the next block).
pub fn parse(payload: &str) -> Vec<Operation> {
    let mut ops = Vec::new();
    let mut text_start = Some(0);
    let mut search_from = 0;

    while let Some(caps) = OPEN_TAG_RE.captures_at(payload, search_from) {
        let (Some(open), Some(tag)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let raw_attrs = caps.get(2).map_or("", |m| m.as_str());
        let attrs = parse_attributes(raw_attrs);

        let Some(action) = attribute(&attrs, "action") else {
            search_from = open.end();
            continue;
        };

        if let Some(start) = text_start.take() {
            push_comment(&mut ops, &payload[start..open.start()]);
        }

        // A self-closing block has no body to decode.
        if raw_attrs.trim_end().ends_with('/') {
            text_start = Some(open.end());
            search_from = open.end();
            continue;
        }

        let next_block = next_block_start(payload, open.end());
        match find_closing(payload, tag.as_str(), open.end()) {
            Some((close_start, close_end))
                if next_block.is_none_or(|next| close_start < next) =>
            {
                let body = &payload[open.end()..close_start];
                if let Some(decoded) = decode_block(action, &attrs, body) {
                    ops.push(Operation::pending(decoded));
                }
                text_start = Some(close_end);
                search_from = close_end;
            }
            // Unterminated: its text is dropped up to the next block.
            _ => search_from = next_block.unwrap_or(payload.len()),
        }
    }

    if let Some(start) = text_start {
        push_comment(&mut ops, &payload[start..]);
    }
    ops
}

/// Byte range of the first `</tag>` (whitespace allowed before `>`) at or
/// after `from`.
fn find_closing(payload: &str, tag: &str, from: usize) -> Option<(usize, usize)> {
    CLOSE_TAG_RE
        .captures_iter(&payload[from..])
        .find(|caps| &caps[1] == tag)
        .and_then(|caps| caps.get(0))
        .map(|m| (from + m.start(), from + m.end()))
}

/// Start of the next opening tag at or after `from` whose `action` is one the
/// parser decodes. Other tags carrying an `action` attribute (an HTML
/// `<form action=..>` inside a file, say) are body text.
fn next_block_start(payload: &str, from: usize) -> Option<usize> {
    OPEN_TAG_RE
        .captures_iter(&payload[from..])
        .find(|caps| {
            let attrs = parse_attributes(caps.get(2).map_or("", |m| m.as_str()));
            matches!(attribute(&attrs, "action"), Some(CREATE_FILE | RUN_COMMAND))
        })
        .and_then(|caps| caps.get(0))
        .map(|m| from + m.start())
}

fn decode_block(action: &str, attrs: &[(String, String)], body: &str) -> Option<Action> {
    match action {
        CREATE_FILE => {
            let path = attribute(attrs, "path")?.trim();
            if path.is_empty() {
                return None;
            }
            Some(Action::CreateFile {
                path: path.to_string(),
                content: strip_wrapper_lines(body).to_string(),
            })
        }
        RUN_COMMAND => {
            let command = body.trim();
            if command.is_empty() {
                return None;
            }
            Some(Action::RunCommand {
                command: command.to_string(),
            })
        }
        _ => None,
    }
}

fn push_comment(ops: &mut Vec<Operation>, text: &str) {
    let stripped = MARKUP_RE.replace_all(text, "");
    let text = stripped.trim();
    if text.is_empty() {
        return;
    }
    ops.push(Operation::pending(Action::Comment {
        text: text.to_string(),
    }));
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(raw)
        .map(|caps| {
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            (caps[1].to_string(), value.to_string())
        })
        .collect()
}

fn attribute<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Remove the single line break that follows the opening tag and the single
/// line break (plus closing-tag indentation) that precedes the closing tag.
///
/// Everything else, including indentation of the first content line and any
/// further blank lines, is preserved byte for byte.
fn strip_wrapper_lines(body: &str) -> &str {
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);
    match body.rfind('\n') {
        Some(idx) if body[idx + 1..].chars().all(|c| c == ' ' || c == '\t') => {
            let head = &body[..idx];
            head.strip_suffix('\r').unwrap_or(head)
        }
        _ => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::OperationStatus;

    fn create(path: &str, content: &str) -> Action {
        Action::CreateFile {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    fn actions(payload: &str) -> Vec<Action> {
        parse(payload).into_iter().map(|op| op.action).collect()
    }

    #[test]
    fn parses_single_create_file_block() {
        let ops = parse(r#"<file action="createFile" path="/index.html"><html></html></file>"#);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].action, create("/index.html", "<html></html>"));
        assert_eq!(ops[0].status, OperationStatus::Pending);
    }

    #[test]
    fn reparse_yields_equal_operations() {
        let payload = "Setting up.\n<a action=\"createFile\" path=\"a.txt\">A</a>\n<b action=\"runCommand\">npm i</b>";
        assert_eq!(parse(payload), parse(payload));
    }

    #[test]
    fn preserves_indentation_and_strips_only_wrapper_lines() {
        let payload = "<file action=\"createFile\" path=\"src/App.tsx\">\n  const a = 1;\n\n    nested();\n  </file>";
        assert_eq!(
            actions(payload),
            vec![create("src/App.tsx", "  const a = 1;\n\n    nested();")]
        );
    }

    #[test]
    fn keeps_trailing_text_that_is_not_a_wrapper_line() {
        let payload = "<f action=\"createFile\" path=\"a\">\r\nline\r\n\r\n</f>";
        assert_eq!(actions(payload), vec![create("a", "line\r\n")]);
    }

    #[test]
    fn run_command_is_trimmed() {
        let payload = "<step action='runCommand'>\n  npm run dev\n</step>";
        assert_eq!(
            actions(payload),
            vec![Action::RunCommand {
                command: "npm run dev".to_string()
            }]
        );
    }

    #[test]
    fn unknown_actions_and_missing_paths_are_skipped() {
        let payload = concat!(
            "<x action=\"deleteFile\" path=\"a\">gone</x>",
            "<y action=\"createFile\">no path</y>",
            "<z action=\"createFile\" path=\"b\">kept</z>",
        );
        assert_eq!(actions(payload), vec![create("b", "kept")]);
    }

    #[test]
    fn unterminated_block_is_dropped_and_later_blocks_survive() {
        let payload = concat!(
            "<file action=\"createFile\" path=\"broken.ts\">partial",
            "<cmd action=\"runCommand\">ls</cmd>",
        );
        assert_eq!(
            actions(payload),
            vec![Action::RunCommand {
                command: "ls".to_string()
            }]
        );
    }

    #[test]
    fn unterminated_block_ends_where_same_tag_block_opens() {
        let payload = concat!(
            "<boltAction action=\"createFile\" path=\"broken.ts\">partial\n",
            "<boltAction action=\"createFile\" path=\"ok.ts\">fine</boltAction>",
        );
        assert_eq!(actions(payload), vec![create("ok.ts", "fine")]);
    }

    #[test]
    fn self_closing_block_is_skipped() {
        let payload = concat!(
            "<boltAction action=\"runCommand\"/>\n",
            "<boltAction action=\"createFile\" path=\"a.ts\">a</boltAction>",
            "<boltAction action=\"runCommand\">npm test</boltAction>",
        );
        assert_eq!(
            actions(payload),
            vec![
                create("a.ts", "a"),
                Action::RunCommand {
                    command: "npm test".to_string()
                },
            ]
        );
    }

    #[test]
    fn closing_tag_may_carry_whitespace() {
        let payload = "<boltAction action=\"createFile\" path=\"a.ts\">a</boltAction >tail";
        assert_eq!(
            actions(payload),
            vec![
                create("a.ts", "a"),
                Action::Comment {
                    text: "tail".to_string()
                },
            ]
        );
    }

    #[test]
    fn html_action_attributes_inside_files_are_content() {
        let payload = concat!(
            "<boltAction action=\"createFile\" path=\"index.html\">",
            "<form action=\"/submit\"></form>",
            "</boltAction>",
        );
        assert_eq!(
            actions(payload),
            vec![create("index.html", "<form action=\"/submit\"></form>")]
        );
    }

    #[test]
    fn free_text_between_blocks_becomes_comments() {
        let payload = concat!(
            "<artifact id=\"site\" title=\"Site\">\n",
            "Creating the entry point.\n",
            "<file action=\"createFile\" path=\"index.html\">x</file>\n",
            "</artifact>\n",
            "Run the dev server next.",
        );
        assert_eq!(
            actions(payload),
            vec![
                Action::Comment {
                    text: "Creating the entry point.".to_string()
                },
                create("index.html", "x"),
                Action::Comment {
                    text: "Run the dev server next.".to_string()
                },
            ]
        );
    }

    #[test]
    fn empty_and_plain_payloads() {
        assert!(parse("").is_empty());
        assert!(parse("   \n<artifact>\n</artifact>\n").is_empty());
        assert_eq!(
            actions("just words"),
            vec![Action::Comment {
                text: "just words".to_string()
            }]
        );
    }
}
