//! Host, port, and file/directory decomposition of a resource path.

use url::Url;

/// The pieces of a base path that crawlers walk up and down.
///
/// Built once from the query-stripped path. Directory helpers work on the
/// full path string (scheme and host included) so their results compare
/// directly against other resources' URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathModel {
    path: String,
    hostname: String,
    host_header: String,
    port: u16,
    file_path: String,
}

impl PathModel {
    pub fn new(path: &str) -> Self {
        let (hostname, host_header, port) = match Url::parse(path) {
            Ok(url) => {
                let hostname = url.host_str().unwrap_or_default().to_string();
                let default_port = if url.scheme() == "https" { 443 } else { 80 };
                let host_header = match url.port() {
                    Some(port) => format!("{hostname}:{port}"),
                    None => hostname.clone(),
                };
                (hostname, host_header, url.port().unwrap_or(default_port))
            }
            Err(_) => (String::new(), String::new(), 80),
        };

        Self {
            path: path.to_string(),
            hostname,
            host_header,
            port,
            file_path: file_path_of(path).to_string(),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Value for a `Host` header: the hostname, plus the port when the path
    /// spelled one out.
    pub fn host_header(&self) -> &str {
        &self.host_header
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Path component only: no scheme, authority, query, or fragment.
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn is_root(&self) -> bool {
        self.file_path == "/"
    }

    /// Last segment of the file path; empty for a directory.
    pub fn file_name(&self) -> &str {
        match self.file_path.rfind('/') {
            Some(pos) => &self.file_path[pos + 1..],
            None => &self.file_path,
        }
    }

    /// Extension of `file_name` without the dot.
    pub fn file_extension(&self) -> &str {
        let name = self.file_name();
        let stem_start = name.len() - name.trim_start_matches('.').len();
        match name[stem_start..].rfind('.') {
            Some(pos) => &name[stem_start + pos + 1..],
            None => "",
        }
    }

    pub fn directory_name(&self) -> String {
        if self.file_name().is_empty() {
            self.path.clone()
        } else {
            format!("{}/", dirname(&self.path))
        }
    }

    pub fn parent_directory(&self) -> String {
        if !self.file_name().is_empty() {
            format!("{}/", dirname(&self.path))
        } else if self.is_root() {
            self.path.clone()
        } else {
            format!("{}/", dirname(dirname(&self.path)))
        }
    }
}

fn file_path_of(path: &str) -> &str {
    let rest = match path.find("://") {
        Some(pos) => {
            let after_scheme = &path[pos + 3..];
            match after_scheme.find('/') {
                Some(slash) => &after_scheme[slash..],
                None => "",
            }
        }
        None => path,
    };
    let end = rest.find(|c: char| c == '?' || c == '#').unwrap_or(rest.len());
    &rest[..end]
}

/// Everything before the last `/`, with trailing slashes dropped unless the
/// result is made only of slashes.
fn dirname(path: &str) -> &str {
    let head = match path.rfind('/') {
        Some(pos) => &path[..=pos],
        None => return "",
    };
    if head.bytes().all(|b| b == b'/') {
        head
    } else {
        head.trim_end_matches('/')
    }
}
