//! Identifier helpers shared by the renamer and the binding renderer.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;

static LEADING_INVALID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^a-zA-Z$_])").expect("valid regex"));

static NON_IDENTIFIER_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9$]+").expect("valid regex"));

static SAFE_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[_a-zA-Z$][_a-zA-Z$0-9]*$").expect("valid regex"));

/// Relative prefixes, `/index` plus short extensions, and `+ N modules` suffixes.
static READABLE_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.+/|(/index)?\.([a-zA-Z0-9]{1,4})($|\s|\?)|\s*\+\s*\d+\s*modules")
        .expect("valid regex")
});

/// Words that cannot follow a `.` in a property access.
static RESERVED_PROPERTY_WORDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
        "do", "else", "export", "extends", "finally", "for", "function", "if", "import", "in",
        "instanceof", "new", "return", "super", "switch", "this", "throw", "try", "typeof", "var",
        "void", "while", "with", "enum", "implements", "interface", "let", "package", "private",
        "protected", "public", "static", "yield", "await", "null", "true", "false",
    ]
    .into_iter()
    .collect()
});

/// Names the renamer never hands out: keywords, module-system globals and
/// common host globals.
pub const RESERVED_NAMES: &[&str] = &[
    // keywords
    "abstract", "arguments", "async", "await", "boolean", "break", "byte", "case", "catch",
    "char", "class", "const", "continue", "debugger", "default", "delete", "do", "double",
    "else", "enum", "eval", "export", "extends", "false", "final", "finally", "float", "for",
    "function", "goto", "if", "implements", "import", "in", "instanceof", "int", "interface",
    "let", "long", "native", "new", "null", "package", "private", "protected", "public",
    "return", "short", "static", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "true", "try", "typeof", "var", "void", "volatile", "while", "with", "yield",
    // module systems
    "module", "__dirname", "__filename", "exports", "require", "define",
    // language globals
    "Array", "Date", "hasOwnProperty", "Infinity", "isFinite", "isNaN", "isPrototypeOf",
    "length", "Math", "NaN", "name", "Number", "Object", "prototype", "String", "Symbol",
    "toString", "undefined", "valueOf",
    // host globals
    "alert", "all", "anchor", "anchors", "area", "assign", "blur", "button", "checkbox",
    "clearInterval", "clearTimeout", "clientInformation", "close", "closed", "confirm",
    "constructor", "crypto", "decodeURI", "decodeURIComponent", "defaultStatus", "document",
    "element", "elements", "embed", "embeds", "encodeURI", "encodeURIComponent", "escape",
    "event", "fileUpload", "focus", "form", "forms", "frame", "innerHeight", "innerWidth",
    "layer", "layers", "link", "location", "mimeTypes", "navigate", "navigator", "frames",
    "frameRate", "hidden", "history", "image", "images", "offscreenBuffering", "open",
    "opener", "option", "outerHeight", "outerWidth", "packages", "pageXOffset", "pageYOffset",
    "parent", "parseFloat", "parseInt", "password", "pkcs11", "plugin", "prompt",
    "propertyIsEnum", "radio", "reset", "screenX", "screenY", "scroll", "secure", "select",
    "self", "setInterval", "setTimeout", "status", "submit", "taint", "text", "textarea", "top",
    "unescape", "untaint", "window",
    // host events
    "onblur", "onclick", "onerror", "onfocus", "onkeydown", "onkeypress", "onkeyup",
    "onmouseover", "onload", "onmouseup", "onmousedown", "onsubmit",
];

/// Turn arbitrary text into something usable as a binding name.
///
/// A leading character that cannot start an identifier gets an `_` prefix,
/// then every run of non-alphanumeric characters collapses into one `_`.
pub fn to_identifier(text: &str) -> String {
    let prefixed = LEADING_INVALID.replace(text, "_$1");
    NON_IDENTIFIER_RUN.replace_all(&prefixed, "_").into_owned()
}

/// Whether `name` can be used as a plain binding name.
pub fn is_identifier(name: &str) -> bool {
    SAFE_IDENTIFIER.is_match(name) && !RESERVED_PROPERTY_WORDS.contains(name)
}

/// Strip path noise from a readable module identity before it feeds names.
pub fn clean_readable(readable: &str) -> String {
    READABLE_NOISE.replace_all(readable, "").into_owned()
}

/// Render `properties` as a chain of member accesses.
pub fn property_access<S: AsRef<str>>(properties: &[S]) -> String {
    let mut out = String::new();
    for property in properties {
        let property = property.as_ref();
        if is_array_index(property) {
            out.push('[');
            out.push_str(property);
            out.push(']');
        } else if is_identifier(property) {
            out.push('.');
            out.push_str(property);
        } else {
            out.push('[');
            out.push_str(&serde_json::Value::from(property).to_string());
            out.push(']');
        }
    }
    out
}

/// Wrap `text` into a block comment that cannot terminate early.
pub fn to_comment(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    format!("/* {} */", text.replace("*/", "* /"))
}

fn is_array_index(property: &str) -> bool {
    match property.as_bytes() {
        [] => false,
        [b'0'] => true,
        [first, rest @ ..] => {
            first.is_ascii_digit() && *first != b'0' && rest.iter().all(u8::is_ascii_digit)
        }
    }
}
