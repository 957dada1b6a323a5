// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort static discovery of third-party imports.
//!
//! Scans `import x` / `from x import y` lines. Relative and standard-library
//! imports are skipped and well-known import names are mapped to the
//! distribution that provides them. Anything unusual is simply ignored.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static IMPORT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*import[ \t]+([A-Za-z_][\w.]*(?:[ \t]+as[ \t]+\w+)?(?:[ \t]*,[ \t]*[A-Za-z_][\w.]*(?:[ \t]+as[ \t]+\w+)?)*)")
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static FROM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*from[ \t]+([A-Za-z_][\w.]*)[ \t]+import\b")
        .expect("constant regex pattern is valid")
});

/// Import names whose distribution is named differently.
const DISTRIBUTION_NAMES: &[(&str, &str)] = &[
    ("Crypto", "pycryptodome"),
    ("Levenshtein", "python-Levenshtein"),
    ("MySQLdb", "mysqlclient"),
    ("OpenSSL", "pyOpenSSL"),
    ("PIL", "Pillow"),
    ("attr", "attrs"),
    ("bs4", "beautifulsoup4"),
    ("cv2", "opencv-python"),
    ("dateutil", "python-dateutil"),
    ("docx", "python-docx"),
    ("dotenv", "python-dotenv"),
    ("fitz", "PyMuPDF"),
    ("gi", "PyGObject"),
    ("jwt", "PyJWT"),
    ("magic", "python-magic"),
    ("pptx", "python-pptx"),
    ("psycopg2", "psycopg2-binary"),
    ("serial", "pyserial"),
    ("skimage", "scikit-image"),
    ("sklearn", "scikit-learn"),
    ("telegram", "python-telegram-bot"),
    ("usb", "pyusb"),
    ("wx", "wxPython"),
    ("yaml", "PyYAML"),
    ("zmq", "pyzmq"),
];

const STDLIB: &[&str] = &[
    "__future__", "abc", "argparse", "array", "ast", "asyncio", "atexit", "base64", "binascii",
    "bisect", "builtins", "bz2", "calendar", "cmath", "cmd", "codecs", "collections", "colorsys",
    "concurrent", "configparser", "contextlib", "contextvars", "copy", "copyreg", "csv", "ctypes",
    "curses", "dataclasses", "datetime", "dbm", "decimal", "difflib", "dis", "doctest", "email",
    "encodings", "enum", "errno", "faulthandler", "fcntl", "filecmp", "fileinput", "fnmatch",
    "fractions", "ftplib", "functools", "gc", "getopt", "getpass", "gettext", "glob", "graphlib",
    "grp", "gzip", "hashlib", "heapq", "hmac", "html", "http", "imaplib", "importlib", "inspect",
    "io", "ipaddress", "itertools", "json", "keyword", "linecache", "locale", "logging", "lzma",
    "mailbox", "marshal", "math", "mimetypes", "mmap", "multiprocessing", "netrc", "numbers",
    "operator", "optparse", "os", "pathlib", "pdb", "pickle", "pkgutil", "platform", "plistlib",
    "poplib", "posix", "pprint", "profile", "pstats", "pty", "pwd", "py_compile", "queue",
    "quopri", "random", "re", "readline", "reprlib", "resource", "runpy", "sched", "secrets",
    "select", "selectors", "shelve", "shlex", "shutil", "signal", "site", "smtplib", "socket",
    "socketserver", "sqlite3", "ssl", "stat", "statistics", "string", "stringprep", "struct",
    "subprocess", "sys", "sysconfig", "syslog", "tarfile", "tempfile", "termios", "textwrap",
    "threading", "time", "timeit", "tkinter", "token", "tokenize", "tomllib", "trace",
    "traceback", "tracemalloc", "tty", "turtle", "types", "typing", "unicodedata", "unittest",
    "urllib", "uuid", "venv", "warnings", "wave", "weakref", "webbrowser", "wsgiref", "xml",
    "xmlrpc", "zipapp", "zipfile", "zipimport", "zlib", "zoneinfo",
];

/// Distribution names for the third-party modules a script imports, in
/// first-seen order without duplicates.
pub fn discover_packages(script: &str) -> Vec<String> {
    let mut modules: Vec<(usize, &str)> = Vec::new();
    for caps in IMPORT_LINE.captures_iter(script) {
        if let Some(list) = caps.get(1) {
            for item in list.as_str().split(',') {
                if let Some(name) = item.split_whitespace().next() {
                    modules.push((list.start(), name));
                }
            }
        }
    }
    for caps in FROM_LINE.captures_iter(script) {
        if let Some(name) = caps.get(1) {
            modules.push((name.start(), name.as_str()));
        }
    }
    modules.sort_by_key(|(pos, _)| *pos);

    let mut seen = HashSet::new();
    modules
        .into_iter()
        .filter_map(|(_, module)| module.split('.').next())
        .filter(|top| !top.is_empty() && !is_stdlib(top))
        .map(distribution_name)
        .filter(|dist| seen.insert(dist.clone()))
        .collect()
}

pub fn is_stdlib(module: &str) -> bool {
    STDLIB.binary_search(&module).is_ok()
}

fn distribution_name(module: &str) -> String {
    DISTRIBUTION_NAMES
        .iter()
        .find(|(import, _)| *import == module)
        .map(|(_, dist)| dist.to_string())
        .unwrap_or_else(|| module.to_string())
}

#[cfg(test)]
#[path = "discover_tests.rs"]
mod tests;
