// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_json_content(records: usize) -> String {
    let mut content = String::from("[\n");
    for i in 0..records {
        content.push_str(&format!(
            "  {{\n    \"id\": {i},\n    \"name\": \"record-{i}\",\n    \"tags\": [\"a\", \"b\", \"c\"],\n    \"meta\": {{\"created\": \"2024-01-15T12:00:00Z\", \"owner\": {{\"uid\": {i}}}}}\n  }}"
        ));
        content.push_str(if i + 1 == records { "\n" } else { ",\n" });
    }
    content.push(']');
    content
}

#[allow(dead_code)]
pub fn generate_markdown_content(sections: usize) -> String {
    let base = "# Title\n\n## Section\n\nParagraph with some content.\n\n```rust\nfn example() {\n    println!(\"Hello\");\n}\n```\n\n### Detail\n\n> # quoted\n\n";
    base.repeat(sections)
}

#[allow(dead_code)]
pub fn generate_log_content(lines: usize) -> String {
    (0..lines)
        .map(|i| {
            format!(
                "2024-01-15 12:00:{:02} INFO worker (pid {i}, uid 7) handled {{\"path\": \"/api/{i}\", \"status\": 200}}\n",
                i % 60
            )
        })
        .collect()
}

#[allow(dead_code)]
pub fn generate_garbage(len: usize) -> String {
    "\u{1}\u{2} ".repeat(len)
}
