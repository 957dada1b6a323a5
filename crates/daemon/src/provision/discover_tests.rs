// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn stdlib_table_is_sorted() {
    let mut sorted = STDLIB.to_vec();
    sorted.sort_unstable();
    assert_eq!(sorted, STDLIB);
}

#[yare::parameterized(
    plain = { "import requests\n", &["requests"] },
    aliased = { "import numpy as np\n", &["numpy"] },
    comma_list = { "import os, requests, yaml\n", &["requests", "PyYAML"] },
    dotted = { "import google.cloud.storage\n", &["google"] },
    from_import = { "from bs4 import BeautifulSoup\n", &["beautifulsoup4"] },
    mapped = { "import cv2\nfrom PIL import Image\n", &["opencv-python", "Pillow"] },
    indented = { "def f():\n    import pandas\n", &["pandas"] },
    relative_skipped = { "from . import util\nfrom .models import X\n", &[] },
    stdlib_skipped = { "import json\nfrom collections import deque\nimport os.path\n", &[] },
    deduplicated = { "import requests\nfrom requests import get\n", &["requests"] },
)]
fn discovers(script: &str, expected: &[&str]) {
    assert_eq!(discover_packages(script), expected);
}

#[test]
fn preserves_source_order() {
    let script = "from flask import Flask\nimport redis\nimport aiohttp\n";
    assert_eq!(discover_packages(script), vec!["flask", "redis", "aiohttp"]);
}

#[test]
fn ignores_import_inside_strings_mid_line() {
    let script = "print('please import antigravity later')\n";
    assert!(discover_packages(script).is_empty());
}
