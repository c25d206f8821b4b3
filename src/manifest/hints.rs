//! Hints attached to common YAML mistakes, matched against the lowercased
//! parser message.

pub(crate) const YAML_HINTS: [(&str, &str); 6] = [
    (
        "did not find expected '-'",
        "Start list items with '-' and ensure proper indentation.",
    ),
    (
        "expected ':'",
        "Ensure each key is followed by ':' separating key and value.",
    ),
    (
        "mapping values are not allowed",
        "Check for a stray ':' or add quotes around values where needed.",
    ),
    (
        "found character that cannot start any token",
        "Remove stray characters and ensure indentation uses spaces (no tabs).",
    ),
    (
        "unknown field",
        "Check the key against the Kumikifile schema; unknown keys are rejected.",
    ),
    (
        "missing field",
        "Every manifest needs `kumiki_version` and `projects`; every project needs a `name`.",
    ),
];
