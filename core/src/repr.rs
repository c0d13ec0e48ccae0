//! Canonical string forms of a resource: query/body encodings, a `curl`
//! command line, and an approximate raw HTTP request.

use std::fmt::Write;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::resource::HttpResource;
use crate::types::{FileParameter, Parameter};

/// Characters escaped in keys and values. `%` stays as-is because incoming
/// parameters may already be encoded.
const PARAM_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'%');

/// Multipart boundary shown in `http_repr`. Display only.
pub const MULTIPART_BOUNDARY: &str = "------------------------boundarystring";

const SNIPPED_FILE: &str = "/* snip file content snip */";

pub fn quote(s: &str) -> String {
    utf8_percent_encode(s, PARAM_ESCAPE).to_string()
}

/// `k=v&flag&k2=v2`, every key and value quoted.
pub fn encode_params(params: &[Parameter]) -> String {
    let mut out = String::new();
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(&quote(&param.key));
        if let Some(value) = &param.value {
            out.push('=');
            out.push_str(&quote(value));
        }
    }
    out
}

/// Upload fields rendered as `key=filename`; content never appears.
pub fn encode_files(files: &[FileParameter]) -> String {
    files
        .iter()
        .map(|f| format!("{}={}", quote(&f.key), quote(f.filename())))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn encode_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> String {
    keys.into_iter().map(quote).collect::<Vec<_>>().join("&")
}

/// Escape `s` for use inside a double-quoted shell word.
pub fn shell_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '"' | '$' | '!' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub(crate) fn curl(resource: &HttpResource) -> String {
    let mut out = format!("curl \"{}\"", shell_escape(resource.url()));
    if !resource.referer().is_empty() {
        let _ = write!(out, " -e \"{}\"", shell_escape(resource.referer()));
    }
    if !resource.file_params().is_empty() {
        for param in resource.post_params() {
            let field = format!("{}={}", param.key, param.value.as_deref().unwrap_or_default());
            let _ = write!(out, " -F \"{}\"", shell_escape(&field));
        }
        for file in resource.file_params() {
            let field = format!("{}=@your_local_file;filename={}", file.key, file.filename());
            let _ = write!(out, " -F \"{}\"", shell_escape(&field));
        }
    } else if !resource.post_params().is_empty() {
        let _ = write!(out, " -d \"{}\"", shell_escape(resource.encoded_data()));
    }
    out
}

pub(crate) fn http_wire(resource: &HttpResource) -> String {
    let mut out = format!(
        "{} /{} HTTP/1.1\nHost: {}\n",
        resource.method(),
        request_target(resource.url()),
        resource.path_model().host_header()
    );
    if !resource.referer().is_empty() {
        let _ = writeln!(out, "Referer: {}", resource.referer());
    }
    if !resource.file_params().is_empty() {
        let _ = write!(out, "Content-Type: multipart/form-data; boundary={MULTIPART_BOUNDARY}\n\n");
        for param in resource.post_params() {
            let _ = write!(
                out,
                "{MULTIPART_BOUNDARY}\nContent-Disposition: form-data; name=\"{}\"\n\n{}\n",
                param.key,
                param.value.as_deref().unwrap_or_default()
            );
        }
        for file in resource.file_params() {
            let _ = write!(
                out,
                "{MULTIPART_BOUNDARY}\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\n\n{SNIPPED_FILE}\n",
                file.key,
                file.filename()
            );
        }
        let _ = writeln!(out, "{MULTIPART_BOUNDARY}--");
    } else if !resource.post_params().is_empty() {
        out.push_str("Content-Type: application/x-www-form-urlencoded\n");
        let _ = write!(out, "\n{}", resource.encoded_data());
    }
    out
}

/// The part of `url` after `scheme://host/`.
fn request_target(url: &str) -> &str {
    match url.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map_or("", |(_, target)| target),
        None => url.trim_start_matches('/'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_leaves_percent_and_unreserved_alone() {
        assert_eq!(quote("a-b_c.d%20"), "a-b_c.d%20");
        assert_eq!(quote("a b&c=d/e"), "a%20b%26c%3Dd%2Fe");
        assert_eq!(quote("caf\u{e9}"), "caf%C3%A9");
    }

    #[test]
    fn encode_params_emits_bare_key_for_flags() {
        let params = vec![Parameter::new("id", "1 2"), Parameter::flag("debug")];
        assert_eq!(encode_params(&params), "id=1%202&debug");
        assert_eq!(encode_params(&[]), "");
    }

    #[test]
    fn encode_files_uses_filename_not_content() {
        let files = vec![FileParameter::new("upload", "cv.pdf", b"%PDF".to_vec())];
        assert_eq!(encode_files(&files), "upload=cv.pdf");
    }

    #[test]
    fn encode_keys_joins_quoted_keys() {
        assert_eq!(encode_keys(["a", "b c"]), "a&b%20c");
    }

    #[test]
    fn shell_escape_prefixes_special_characters() {
        assert_eq!(shell_escape(r#"a\b"c$d!e`f"#), r#"a\\b\"c\$d\!e\`f"#);
        assert_eq!(shell_escape("plain"), "plain");
    }

    #[test]
    fn request_target_strips_origin() {
        assert_eq!(request_target("http://h/a/b?x=1"), "a/b?x=1");
        assert_eq!(request_target("http://h"), "");
        assert_eq!(request_target("/a/b"), "a/b");
    }
}
